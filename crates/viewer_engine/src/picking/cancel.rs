//! Cancellation of blocking selection calls

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};

/// Wakes and aborts a blocked `start_selection*` call
///
/// Tokens are created by the picking service so they share its condition
/// variable. Cloning gives another handle to the same token.
#[derive(Debug, Clone)]
pub struct CancelToken {
    inner: Arc<TokenInner>,
}

#[derive(Debug)]
struct TokenInner {
    cancelled: AtomicBool,
    waker: Arc<dyn Waker>,
}

/// Something a cancelled token must wake
pub(crate) trait Waker: Send + Sync + std::fmt::Debug {
    fn wake(&self);
}

/// Lock + condition variable pair, woken by locking then notifying
#[derive(Debug)]
pub(crate) struct CondvarWaker<S> {
    pub(crate) state: Arc<(Mutex<S>, Condvar)>,
}

impl<S: Send + std::fmt::Debug> Waker for CondvarWaker<S> {
    fn wake(&self) {
        let (lock, condvar) = &*self.state;
        // Taking the lock orders the flag store before the waiter's re-check
        drop(lock.lock().unwrap_or_else(PoisonError::into_inner));
        condvar.notify_all();
    }
}

impl CancelToken {
    pub(crate) fn new(waker: Arc<dyn Waker>) -> Self {
        Self {
            inner: Arc::new(TokenInner {
                cancelled: AtomicBool::new(false),
                waker,
            }),
        }
    }

    /// Cancel and wake the waiting call
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.waker.wake();
    }

    /// Whether `cancel` has been called
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }
}
