use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{Atom, Listener, Subscription};

/// Read-only atom derived from another one through a transform.
///
/// The derived value is not cached: [`Atom::value`] runs the transform on
/// every call. Listeners are only called when the hash of the transformed
/// value differs from the last one they received.
pub struct Mapped<A, V, F> {
    base: A,
    transform: Arc<F>,
    _source: PhantomData<fn(&V)>,
}

impl<A, V, F> Mapped<A, V, F> {
    pub(crate) fn new(base: A, transform: F) -> Self {
        Self {
            base,
            transform: Arc::new(transform),
            _source: PhantomData,
        }
    }
}

impl<A, V, B, F> Atom<B> for Mapped<A, V, F>
where
    A: Atom<V>,
    V: 'static,
    B: Hash + 'static,
    F: Fn(&V) -> B + Send + Sync + 'static,
{
    fn value(&self) -> B {
        (self.transform)(&self.base.value())
    }

    fn watch(&self, listener: Listener<B>) -> Subscription {
        let transform = Arc::clone(&self.transform);
        let previous = Mutex::new(None::<u64>);
        self.base.watch(Arc::new(move |value: &V| {
            let derived = transform(value);
            let hash = hash_of(&derived);
            {
                let mut previous = previous.lock();
                if *previous == Some(hash) {
                    return;
                }
                *previous = Some(hash);
            }
            listener(&derived);
        }))
    }
}

impl<A: Clone, V, F> Clone for Mapped<A, V, F> {
    fn clone(&self) -> Self {
        Self {
            base: self.base.clone(),
            transform: Arc::clone(&self.transform),
            _source: PhantomData,
        }
    }
}

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}
