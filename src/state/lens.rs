use std::fmt;
use std::sync::Arc;

use super::GrState;

type Getter<S, A> = Arc<dyn Fn(&S) -> A + Send + Sync>;
type Setter<S, A> = Arc<dyn Fn(S, A) -> S + Send + Sync>;

/// Addresses one part `A` inside an immutable whole `S`.
///
/// `get` reads the part, `set` returns a new whole with the part
/// replaced. Lenses nest with [`compose`](Self::compose).
pub struct Lens<S, A> {
    get: Getter<S, A>,
    set: Setter<S, A>,
}

/// A lens onto an optional [`GrState`] slot. `None` means the value was
/// never requested.
pub type Slot<S, E, V> = Lens<S, Option<GrState<E, V>>>;

impl<S: 'static, A: 'static> Lens<S, A> {
    pub fn new(
        get: impl Fn(&S) -> A + Send + Sync + 'static,
        set: impl Fn(S, A) -> S + Send + Sync + 'static,
    ) -> Self {
        Self {
            get: Arc::new(get),
            set: Arc::new(set),
        }
    }

    pub fn get(&self, whole: &S) -> A {
        (self.get)(whole)
    }

    pub fn set(&self, whole: S, part: A) -> S {
        (self.set)(whole, part)
    }

    pub fn modify(&self, whole: S, f: impl FnOnce(A) -> A) -> S {
        let part = f(self.get(&whole));
        self.set(whole, part)
    }

    /// Lens from `S` through `A` into `B`.
    pub fn compose<B: 'static>(&self, inner: Lens<A, B>) -> Lens<S, B> {
        let outer_get = Arc::clone(&self.get);
        let outer = self.clone();
        let inner_get = Arc::clone(&inner.get);
        Lens::new(
            move |whole: &S| inner_get(&outer_get(whole)),
            move |whole: S, part: B| outer.modify(whole, |middle| inner.set(middle, part)),
        )
    }
}

impl<S, A> Clone for Lens<S, A> {
    fn clone(&self) -> Self {
        Self {
            get: Arc::clone(&self.get),
            set: Arc::clone(&self.set),
        }
    }
}

impl<S, A> fmt::Debug for Lens<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Lens")
    }
}
