//! Single-slot hand-off between the render thread and the poller

use std::sync::{Mutex, PoisonError};

/// One-frame mailbox
///
/// The producer checks [`Mailbox::is_pending`] and skips producing while a
/// frame is unread, so production and consumption alternate. `publish`
/// itself still overwrites, and reports when it did.
#[derive(Debug)]
pub struct Mailbox<T> {
    slot: Mutex<Option<T>>,
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Mailbox<T> {
    /// Empty mailbox
    pub fn new() -> Self {
        Self { slot: Mutex::new(None) }
    }

    /// Store a frame; returns `true` if an unread frame was replaced
    pub fn publish(&self, frame: T) -> bool {
        let replaced = self.lock().replace(frame).is_some();
        if replaced {
            log::warn!("picking frame overwritten before it was consumed");
        }
        replaced
    }

    /// Take the pending frame, leaving the slot empty
    pub fn take(&self) -> Option<T> {
        self.lock().take()
    }

    /// Whether a frame is waiting
    pub fn is_pending(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_take_empties_slot() {
        let mailbox = Mailbox::new();
        assert_eq!(mailbox.take(), None::<u32>);

        assert!(!mailbox.publish(1));
        assert!(mailbox.is_pending());
        assert_eq!(mailbox.take(), Some(1));
        assert!(!mailbox.is_pending());
    }

    #[test]
    fn test_publish_is_last_write_wins() {
        let mailbox = Mailbox::new();
        mailbox.publish("first");
        assert!(mailbox.publish("second"));
        assert_eq!(mailbox.take(), Some("second"));
        assert_eq!(mailbox.take(), None);
    }

    #[test]
    fn test_cross_thread_handoff() {
        let mailbox = Arc::new(Mailbox::new());
        let producer = {
            let mailbox = Arc::clone(&mailbox);
            thread::spawn(move || {
                let mut sent = 0;
                while sent < 100 {
                    if !mailbox.is_pending() {
                        mailbox.publish(sent);
                        sent += 1;
                    }
                    thread::yield_now();
                }
            })
        };

        let mut received = Vec::new();
        while received.len() < 100 {
            if let Some(frame) = mailbox.take() {
                received.push(frame);
            }
            thread::yield_now();
        }
        producer.join().unwrap();

        // Strict alternation: nothing lost, nothing reordered
        assert_eq!(received, (0..100).collect::<Vec<_>>());
    }
}
