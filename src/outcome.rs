//! Extra combinators for `Result` used by blocking operations.
//!
//! `Ok` is a success and `Err` a failure; `map`, `map_err` and `and_then`
//! come from std. Everything here is pure and total.

use crate::state::{GrState, Update};

pub trait ResultExt<V, E> {
    /// Turns a failure into a success.
    fn recover(self, f: impl FnOnce(E) -> V) -> Result<V, E>;

    /// Collapses both cases into one value.
    fn fold<R>(self, on_err: impl FnOnce(E) -> R, on_ok: impl FnOnce(V) -> R) -> R;

    /// `Ok(v)` becomes settled content, `Err(e)` a failed load.
    fn into_state(self) -> GrState<E, V>;

    /// Refresh status for this outcome: nothing on success, the failure
    /// otherwise.
    fn into_update(self) -> Option<Update<E>>;
}

impl<V, E> ResultExt<V, E> for Result<V, E> {
    fn recover(self, f: impl FnOnce(E) -> V) -> Result<V, E> {
        Ok(self.unwrap_or_else(f))
    }

    fn fold<R>(self, on_err: impl FnOnce(E) -> R, on_ok: impl FnOnce(V) -> R) -> R {
        match self {
            Ok(value) => on_ok(value),
            Err(error) => on_err(error),
        }
    }

    fn into_state(self) -> GrState<E, V> {
        match self {
            Ok(value) => GrState::content(value),
            Err(error) => GrState::Failure(error),
        }
    }

    fn into_update(self) -> Option<Update<E>> {
        self.err().map(Update::Failure)
    }
}
