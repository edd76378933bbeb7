//! # mechanicum
//!
//! A single-process, single-writer state core: an observable immutable
//! value container, a message dispatch engine that funnels every state
//! mutation through one writer thread, and a loading protocol for values
//! that must be fetched by blocking work.
//!
//! ## Architecture
//!
//! ```text
//!   callers ── send(msg) ──► Store mailbox (bounded, try_send)
//!                                   │
//!                                   ▼
//!                     ┌──────────────────────────────┐
//!                     │ writer thread (LocalSet)     │
//!                     │  one unit per message        │
//!                     │  Program::update(ctx, msg)   │
//!                     └──────┬───────────────▲───────┘
//!                            │ ctx.worker()  │ resume
//!                            ▼               │
//!                     ┌──────────────────────┴───────┐
//!                     │ blocking pool (Worker jobs)  │
//!                     └──────────────────────────────┘
//!                            │
//!         ctx.update() ──► AtomicCache ──► listeners (same thread)
//! ```
//!
//! Values that must be fetched live in [`GrState`] slots addressed by a
//! [`Lens`]; [`load`] and [`load_or_update`] only commit a result when the
//! slot is still in the transitional state they put it in, so a slow
//! response never overwrites newer state.
//!
//! ## Example
//! ```rust
//! use mechanicum::config::DispatchConfig;
//! use mechanicum::{AtomExt, Context, Program, Store};
//! use std::time::Duration;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! enum Msg {
//!     Add(u32),
//! }
//!
//! struct Counter;
//!
//! impl Program for Counter {
//!     type State = u32;
//!     type Msg = Msg;
//!
//!     async fn update(&self, ctx: Context<Self>, msg: Msg) -> anyhow::Result<()> {
//!         let Msg::Add(n) = msg;
//!         let sum = ctx.worker(move |_| n * 2).await?;
//!         ctx.update(|total| total + sum);
//!         Ok(())
//!     }
//! }
//!
//! let store = Store::start(Counter, 0, &DispatchConfig::default())?;
//! store.send(Msg::Add(21));
//! let total = store.state().block_until(|total: &u32| *total == 42, Duration::from_secs(5));
//! assert_eq!(total, Some(42));
//! # Ok::<(), mechanicum::DispatchError>(())
//! ```

pub mod app;
pub mod atom;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod load;
pub mod logging;
pub mod outcome;
pub mod state;

mod panic;

pub use atom::{Atom, AtomExt, AtomView, AtomicCache, Listener, Mapped, MutableAtom, Subscription};
pub use dispatch::{
    Context, DirectAction, DispatchError, Envelope, Program, Store, Worker, WorkerError,
};
pub use error::{ApiError, Retryable};
pub use load::{load, load_flag, load_or_update};
pub use outcome::ResultExt;
pub use state::{GrState, Lens, Slot, Update};
