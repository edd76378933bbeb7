//! Loading state machine and slot addressing.
//!
//! [`GrState`] describes a value that has to be fetched and may later be
//! refreshed; [`Lens`] points at one such value inside the whole
//! application state so the load protocol can read and replace it.

mod grstate;
mod lens;

pub use grstate::{GrState, Update};
pub use lens::{Lens, Slot};
