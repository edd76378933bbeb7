use std::cell::RefCell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::ReentrantMutex;

use super::{Atom, Listener, MutableAtom, Subscription};

/// Thread-safe, observable holder of an immutable value.
///
/// Every operation takes one re-entrant lock, so a listener may read,
/// watch or unsubscribe from the atom it is being notified by. The
/// listener list is copy-on-write: registrations made during a
/// notification take effect from the next update.
///
/// Listeners run on the thread that called `watch` for the first
/// notification, and on the updating thread after that.
///
/// The closures passed to `read`, and the `change` and `only_if` closures
/// of `update_if`, run while the value is borrowed. They must not write to
/// the same atom; doing so panics.
///
/// Cloning yields another handle to the same atom.
pub struct AtomicCache<V> {
    inner: Arc<Inner<V>>,
}

struct Inner<V> {
    cell: ReentrantMutex<RefCell<Cell<V>>>,
    next_id: AtomicU64,
}

struct Cell<V> {
    value: V,
    listeners: Arc<Vec<(u64, Listener<V>)>>,
}

impl<V> AtomicCache<V>
where
    V: Clone + PartialEq + Send + 'static,
{
    pub fn new(initial: V) -> Self {
        Self {
            inner: Arc::new(Inner {
                cell: ReentrantMutex::new(RefCell::new(Cell {
                    value: initial,
                    listeners: Arc::new(Vec::new()),
                })),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Runs `f` against the current value without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(&V) -> R) -> R {
        let guard = self.inner.cell.lock();
        let cell = guard.borrow();
        f(&cell.value)
    }

    /// Read-only handle to this atom.
    pub fn view(&self) -> AtomView<V> {
        AtomView {
            cache: self.clone(),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.cell.lock().borrow().listeners.len()
    }
}

impl<V> Inner<V> {
    fn remove(&self, id: u64) {
        let guard = self.cell.lock();
        let mut cell = guard.borrow_mut();
        Arc::make_mut(&mut cell.listeners).retain(|(listener_id, _)| *listener_id != id);
    }
}

impl<V> Atom<V> for AtomicCache<V>
where
    V: Clone + PartialEq + Send + 'static,
{
    fn value(&self) -> V {
        self.read(V::clone)
    }

    fn watch(&self, listener: Listener<V>) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let guard = self.inner.cell.lock();
        let current = {
            let mut cell = guard.borrow_mut();
            Arc::make_mut(&mut cell.listeners).push((id, Arc::clone(&listener)));
            cell.value.clone()
        };
        notify(&listener, &current);
        drop(guard);

        let inner: Weak<Inner<V>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.remove(id);
            }
        })
    }
}

impl<V> MutableAtom<V> for AtomicCache<V>
where
    V: Clone + PartialEq + Send + 'static,
{
    fn update_if<C, P>(&self, change: C, only_if: P) -> bool
    where
        C: FnOnce(&V) -> V,
        P: FnOnce(&V) -> bool,
    {
        let guard = self.inner.cell.lock();
        let (next, listeners) = {
            let cell = guard.borrow();
            if !only_if(&cell.value) {
                return false;
            }
            let next = change(&cell.value);
            if next == cell.value {
                return false;
            }
            (next, Arc::clone(&cell.listeners))
        };
        guard.borrow_mut().value = next.clone();

        // No RefCell borrow is alive here; listeners may re-enter the atom.
        for (_, listener) in listeners.iter() {
            notify(listener, &next);
        }
        true
    }
}

impl<V> Clone for AtomicCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

fn notify<V>(listener: &Listener<V>, value: &V) {
    if let Err(payload) = catch_unwind(AssertUnwindSafe(|| listener(value))) {
        tracing::error!(
            "atom listener panicked: {}",
            crate::panic::describe(&*payload)
        );
    }
}

/// Read-only handle to an [`AtomicCache`].
///
/// This is what a store hands out to observers: it can be read and
/// watched, but offers no way to change the value.
pub struct AtomView<V> {
    cache: AtomicCache<V>,
}

impl<V> AtomView<V>
where
    V: Clone + PartialEq + Send + 'static,
{
    pub fn read<R>(&self, f: impl FnOnce(&V) -> R) -> R {
        self.cache.read(f)
    }
}

impl<V> Atom<V> for AtomView<V>
where
    V: Clone + PartialEq + Send + 'static,
{
    fn value(&self) -> V {
        self.cache.value()
    }

    fn watch(&self, listener: Listener<V>) -> Subscription {
        self.cache.watch(listener)
    }
}

impl<V> Clone for AtomView<V> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::AtomExt;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    fn recorder<V: Clone + Send + 'static>() -> (Arc<Mutex<Vec<V>>>, Listener<V>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, Arc::new(move |value: &V| sink.lock().push(value.clone())))
    }

    #[test]
    fn watch_calls_listener_with_current_value_before_returning() {
        let atom = AtomicCache::new(7);
        let (seen, listener) = recorder();

        let _subscription = atom.watch(listener);

        assert_eq!(*seen.lock(), vec![7]);
    }

    #[test]
    fn equal_update_does_not_notify() {
        let atom = AtomicCache::new("same".to_string());
        let (seen, listener) = recorder();
        let _subscription = atom.watch(listener);

        let replaced = atom.update(|value| value.clone());

        assert!(!replaced);
        assert_eq!(seen.lock().len(), 1);
    }

    #[test]
    fn only_if_false_skips_change() {
        let atom = AtomicCache::new(1);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let replaced = atom.update_if(
            move |value| {
                counter.fetch_add(1, Ordering::SeqCst);
                value + 1
            },
            |value| *value > 10,
        );

        assert!(!replaced);
        assert_eq!(atom.value(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn notifications_follow_update_order() {
        let atom = AtomicCache::new(0);
        let (seen, listener) = recorder();
        let _subscription = atom.watch(listener);

        for _ in 0..5 {
            atom.update(|value| value + 1);
        }

        assert_eq!(*seen.lock(), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn panicking_listener_does_not_skip_others() {
        let atom = AtomicCache::new(0);
        let _bad = atom.watch_fn(|value: &i32| {
            if *value > 0 {
                panic!("bad observer");
            }
        });
        let (seen, listener) = recorder();
        let _good = atom.watch(listener);

        assert!(atom.update(|value| value + 1));

        assert_eq!(atom.value(), 1);
        assert_eq!(*seen.lock(), vec![0, 1]);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let atom = AtomicCache::new(0);
        let (seen, listener) = recorder();
        let subscription = atom.watch(listener);

        subscription.unsubscribe();
        subscription.unsubscribe();
        atom.update(|value| value + 1);

        assert!(!subscription.is_active());
        assert_eq!(atom.listener_count(), 0);
        assert_eq!(*seen.lock(), vec![0]);
    }

    #[test]
    fn listener_can_read_atom_while_notified() {
        let atom = AtomicCache::new(0);
        let reader = atom.clone();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _subscription = atom.watch_fn(move |_: &i32| sink.lock().push(reader.value()));

        atom.update(|value| value + 3);

        assert_eq!(*seen.lock(), vec![0, 3]);
    }

    #[test]
    fn listener_registered_during_notification_sees_current_value() {
        let atom = AtomicCache::new(0);
        let registrar = atom.clone();
        let late = Arc::new(Mutex::new(Vec::new()));
        let late_sink = Arc::clone(&late);
        let registered = Arc::new(Mutex::new(Vec::new()));
        let holder = Arc::clone(&registered);

        let _subscription = atom.watch_fn(move |value: &i32| {
            if *value == 1 {
                let sink = Arc::clone(&late_sink);
                holder
                    .lock()
                    .push(registrar.watch_fn(move |value: &i32| sink.lock().push(*value)));
            }
        });

        atom.update(|_| 1);
        atom.update(|_| 2);

        assert_eq!(*late.lock(), vec![1, 2]);
    }

    #[test]
    fn listener_runs_on_watching_then_updating_thread() {
        let atom = AtomicCache::new(0);
        let threads = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&threads);
        let _subscription = thread::Builder::new()
            .name("watcher".into())
            .spawn({
                let atom = atom.clone();
                move || {
                    atom.watch_fn(move |_: &i32| {
                        sink.lock().push(thread::current().name().map(str::to_owned));
                    })
                }
            })
            .expect("spawn watcher")
            .join()
            .expect("watcher thread");

        thread::Builder::new()
            .name("updater".into())
            .spawn({
                let atom = atom.clone();
                move || atom.update(|value| value + 1)
            })
            .expect("spawn updater")
            .join()
            .expect("updater thread");

        assert_eq!(
            *threads.lock(),
            vec![Some("watcher".to_string()), Some("updater".to_string())]
        );
    }

    #[test]
    fn concurrent_updates_are_not_lost() {
        let atom = AtomicCache::new(0u32);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let atom = atom.clone();
                thread::spawn(move || {
                    for _ in 0..250 {
                        atom.update(|value| value + 1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("updater thread");
        }

        assert_eq!(atom.value(), 2000);
    }

    #[test]
    fn view_reads_and_watches_underlying_atom() {
        let atom = AtomicCache::new(vec![1]);
        let view = atom.view();
        let (seen, listener) = recorder();
        let _subscription = view.watch(listener);

        atom.update(|items| {
            let mut items = items.clone();
            items.push(2);
            items
        });

        assert_eq!(view.value(), vec![1, 2]);
        assert_eq!(view.read(Vec::len), 2);
        assert_eq!(seen.lock().len(), 2);
    }
}
