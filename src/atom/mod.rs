//! Observable, thread-safe holders for immutable values.
//!
//! An atom always holds a value (there is no uninitialized state), can be
//! read synchronously from any thread, and notifies listeners on the thread
//! that performed the update, with no redispatch. A new listener is called
//! with the current value before [`Atom::watch`] returns.
//!
//! # Architecture
//!
//! ```text
//! AtomicCache<V> ──view()──► AtomView<V>  (read-only)
//!       │
//!       └── map(f) ──► Mapped<_, V, F>   (derived, hash-deduplicated)
//! ```

mod cache;
mod map;
mod subscription;

use std::hash::Hash;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

pub use cache::{AtomView, AtomicCache};
pub use map::Mapped;
pub use subscription::Subscription;

/// Callback invoked with every distinct value of an atom.
pub type Listener<V> = Arc<dyn Fn(&V) + Send + Sync + 'static>;

/// Read side of an atom.
pub trait Atom<V>: Send + Sync {
    /// Current value. Waits at most for an in-progress update to finish.
    fn value(&self) -> V;

    /// Registers `listener` and calls it with the current value before
    /// returning. Later calls happen on whichever thread updates the atom.
    fn watch(&self, listener: Listener<V>) -> Subscription;
}

/// Write side of an atom.
pub trait MutableAtom<V>: Atom<V> {
    /// Atomically replaces the value with `change(current)` when
    /// `only_if(current)` holds and the result differs from the current
    /// value. Listeners run inside the same critical section.
    ///
    /// Returns `true` when the value was replaced.
    fn update_if<C, P>(&self, change: C, only_if: P) -> bool
    where
        C: FnOnce(&V) -> V,
        P: FnOnce(&V) -> bool;

    fn update<C>(&self, change: C) -> bool
    where
        C: FnOnce(&V) -> V,
    {
        self.update_if(change, |_| true)
    }
}

/// Conveniences available on every atom.
pub trait AtomExt<V>: Atom<V> {
    /// Derived read-only atom. The transform is re-run on every read;
    /// listeners only hear about values whose hash changed.
    fn map<B, F>(self, transform: F) -> Mapped<Self, V, F>
    where
        Self: Sized,
        F: Fn(&V) -> B + Send + Sync + 'static,
        B: Hash,
    {
        Mapped::new(self, transform)
    }

    /// [`Atom::watch`] taking a plain closure.
    fn watch_fn<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&V) + Send + Sync + 'static,
    {
        self.watch(Arc::new(listener))
    }

    /// Mirrors the atom into a `tokio::sync::watch` channel for async
    /// consumers. The channel stops receiving values once the returned
    /// subscription is cancelled.
    fn channel(&self) -> (watch::Receiver<V>, Subscription)
    where
        V: Clone + PartialEq + Send + Sync + 'static,
    {
        let (sender, receiver) = watch::channel(self.value());
        let subscription = self.watch_fn(move |value: &V| {
            sender.send_if_modified(|current| {
                if current == value {
                    return false;
                }
                *current = value.clone();
                true
            });
        });
        (receiver, subscription)
    }

    /// Blocks the calling thread until the value satisfies `predicate`,
    /// returning that value, or `None` after `timeout`.
    ///
    /// Never call this from a listener or from the writer thread of a
    /// store: the update it waits for could then never run.
    fn block_until<P>(&self, predicate: P, timeout: Duration) -> Option<V>
    where
        P: Fn(&V) -> bool + Send + Sync + 'static,
        V: Clone + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        let subscription = self.watch_fn(move |value: &V| {
            if predicate(value) {
                let _ = sender.send(value.clone());
            }
        });
        let found = receiver.recv_timeout(timeout).ok();
        subscription.unsubscribe();
        found
    }
}

impl<V, A: Atom<V> + ?Sized> AtomExt<V> for A {}
