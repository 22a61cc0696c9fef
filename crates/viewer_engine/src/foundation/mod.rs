//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and operations
//! - Worker threads
//! - Logging utilities

pub mod math;
pub mod workers;
pub mod logging;
