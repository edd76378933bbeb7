use std::fmt;

use parking_lot::Mutex;

type Cancel = Box<dyn FnOnce() + Send>;

/// Handle returned by [`Atom::watch`](super::Atom::watch).
///
/// Dropping the handle keeps the listener registered; call
/// [`unsubscribe`](Self::unsubscribe) to remove it.
pub struct Subscription {
    cancel: Mutex<Option<Cancel>>,
}

impl Subscription {
    pub(crate) fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Mutex::new(Some(Box::new(cancel))),
        }
    }

    /// Removes the listener. Calling this more than once is a no-op.
    pub fn unsubscribe(&self) {
        // Take first so the lock is not held while the atom is locked.
        let cancel = self.cancel.lock().take();
        if let Some(cancel) = cancel {
            cancel();
        }
    }

    pub fn is_active(&self) -> bool {
        self.cancel.lock().is_some()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
