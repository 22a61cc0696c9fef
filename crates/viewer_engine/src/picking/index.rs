//! Registry of identifier colours
//!
//! Colours are drawn uniformly at random from the 24-bit space, rejecting
//! collisions and the two reserved colours. Random allocation keeps
//! neighbouring objects visually distinct in debug dumps of the identifier
//! pass; the seed is configurable so runs are reproducible.

use crate::picking::{PickColor, PickingError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::hash::Hash;

/// Number of assignable colours (24-bit space minus black and white)
pub const CAPACITY: usize = (1 << 24) - 2;

/// Bijection between identifier colours and objects
#[derive(Debug)]
pub struct PickingIndex<T> {
    by_color: HashMap<PickColor, T>,
    by_object: HashMap<T, PickColor>,
    rng: StdRng,
    warn_threshold: usize,
    warned: bool,
}

impl<T: Copy + Eq + Hash + std::fmt::Debug> PickingIndex<T> {
    /// Create an empty registry
    ///
    /// A warning is logged the first time the registry grows past
    /// `warn_threshold` entries.
    pub fn new(seed: u64, warn_threshold: usize) -> Self {
        Self {
            by_color: HashMap::new(),
            by_object: HashMap::new(),
            rng: StdRng::seed_from_u64(seed),
            warn_threshold,
            warned: false,
        }
    }

    /// Number of registered objects
    pub fn len(&self) -> usize {
        self.by_color.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.by_color.is_empty()
    }

    /// Assign a colour to `object`
    ///
    /// Registering an object twice returns its existing colour.
    pub fn register(&mut self, object: T) -> Result<PickColor, PickingError> {
        if let Some(color) = self.by_object.get(&object) {
            return Ok(*color);
        }
        if self.by_color.len() >= CAPACITY {
            return Err(PickingError::RegistryExhausted);
        }

        let color = loop {
            let candidate = PickColor::from_u32(self.rng.gen_range(0..1 << 24));
            if !candidate.is_reserved() && !self.by_color.contains_key(&candidate) {
                break candidate;
            }
        };

        self.by_color.insert(color, object);
        self.by_object.insert(object, color);

        if !self.warned && self.by_color.len() > self.warn_threshold {
            self.warned = true;
            log::warn!(
                "picking registry holds {} objects (threshold {})",
                self.by_color.len(),
                self.warn_threshold
            );
        }
        Ok(color)
    }

    /// Object drawn in `color`; reserved and unknown colours are a miss
    pub fn resolve(&self, color: PickColor) -> Option<T> {
        self.by_color.get(&color).copied()
    }

    /// Colour assigned to `object`
    pub fn color_of(&self, object: T) -> Option<PickColor> {
        self.by_object.get(&object).copied()
    }

    /// Release a colour so it can be reassigned
    pub fn unregister(&mut self, color: PickColor) -> Option<T> {
        let object = self.by_color.remove(&color)?;
        self.by_object.remove(&object);
        Some(object)
    }

    /// Release the colour held by `object`
    pub fn unregister_object(&mut self, object: T) -> Option<PickColor> {
        let color = self.by_object.remove(&object)?;
        self.by_color.remove(&color);
        Some(color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_registrations_are_distinct_and_non_reserved() {
        let mut index = PickingIndex::new(7, usize::MAX);
        let colors: Vec<PickColor> = (0..5000u32).map(|i| index.register(i).unwrap()).collect();

        let unique: HashSet<_> = colors.iter().collect();
        assert_eq!(unique.len(), colors.len());
        assert!(colors.iter().all(|c| !c.is_reserved()));
        assert_eq!(index.len(), 5000);
    }

    #[test]
    fn test_resolve_laws() {
        let mut index = PickingIndex::new(1, usize::MAX);
        let a = index.register("a").unwrap();
        let b = index.register("b").unwrap();

        assert_eq!(index.resolve(a), Some("a"));
        assert_eq!(index.resolve(b), Some("b"));
        assert_eq!(index.resolve(PickColor::BLACK), None);
        assert_eq!(index.resolve(PickColor::WHITE), None);

        let unused = (1..0xff_ffffu32)
            .map(PickColor::from_u32)
            .find(|c| *c != a && *c != b)
            .unwrap();
        assert_eq!(index.resolve(unused), None);
    }

    #[test]
    fn test_register_is_idempotent_per_object() {
        let mut index = PickingIndex::new(3, usize::MAX);
        let first = index.register(42).unwrap();
        assert_eq!(index.register(42).unwrap(), first);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_seed_makes_allocation_reproducible() {
        let mut a = PickingIndex::new(99, usize::MAX);
        let mut b = PickingIndex::new(99, usize::MAX);
        for i in 0..10 {
            assert_eq!(a.register(i).unwrap(), b.register(i).unwrap());
        }
    }

    #[test]
    fn test_unregister_releases_both_directions() {
        let mut index = PickingIndex::new(5, usize::MAX);
        let a = index.register(1).unwrap();
        let b = index.register(2).unwrap();

        assert_eq!(index.unregister(a), Some(1));
        assert_eq!(index.resolve(a), None);
        assert_eq!(index.color_of(1), None);

        assert_eq!(index.unregister_object(2), Some(b));
        assert!(index.is_empty());
        assert_eq!(index.unregister(b), None);
    }
}
