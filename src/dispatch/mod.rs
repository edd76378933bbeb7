//! Single-writer message dispatch.
//!
//! A [`Store`] owns the state atom and a bounded mailbox. One dedicated
//! thread drains the mailbox and runs each message as its own unit on a
//! tokio `LocalSet`. A unit can only suspend inside
//! [`Context::worker`], which hands blocking work to the runtime's
//! blocking pool; while it waits, the writer picks up further messages.
//! Everything a unit does to the state happens on the writer thread, so
//! state transitions are totally ordered.
//!
//! ```text
//!   Submitted ──try_send──► Accepted ──► Running ──► Completed
//!       └─────(full)──────► Rejected          └────► Failed (logged)
//! ```

mod context;
mod envelope;
mod error;
mod store;
mod worker;

use std::fmt::Debug;
use std::future::Future;

pub use context::Context;
pub use envelope::{DirectAction, Envelope};
pub use error::{DispatchError, WorkerError};
pub use store::Store;
pub use worker::Worker;

/// Application logic driven by a [`Store`].
///
/// The implementing type holds whatever the update function needs from the
/// outside world (directories, clients, settings). It is shared by every
/// unit and only ever borrowed.
pub trait Program: Send + Sync + Sized + 'static {
    type State: Clone + PartialEq + Send + 'static;
    type Msg: Clone + Debug + PartialEq + Send + Sync + 'static;

    /// Handles one message. Errors and panics are logged by the store and
    /// never reach other units.
    fn update(&self, ctx: Context<Self>, msg: Self::Msg)
        -> impl Future<Output = anyhow::Result<()>>;
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::atom::AtomExt;
    use crate::config::DispatchConfig;

    const WAIT: Duration = Duration::from_secs(5);

    #[derive(Debug, Clone, PartialEq)]
    enum Msg {
        Push(u32),
        SlowPush(u32),
    }

    struct Recorder {
        units: Arc<AtomicUsize>,
    }

    impl Program for Recorder {
        type State = Vec<u32>;
        type Msg = Msg;

        async fn update(&self, ctx: Context<Self>, msg: Msg) -> anyhow::Result<()> {
            self.units.fetch_add(1, Ordering::SeqCst);
            let value = match msg {
                Msg::Push(value) => value,
                Msg::SlowPush(value) => {
                    ctx.worker(move |_| {
                        std::thread::sleep(Duration::from_millis(150));
                        value
                    })
                    .await?
                }
            };
            ctx.update(|items| {
                let mut items = items.clone();
                items.push(value);
                items
            });
            Ok(())
        }
    }

    fn start() -> (Store<Recorder>, Arc<AtomicUsize>) {
        let units = Arc::new(AtomicUsize::new(0));
        let program = Recorder {
            units: Arc::clone(&units),
        };
        let store = Store::start(program, Vec::new(), &DispatchConfig::default())
            .expect("store starts");
        (store, units)
    }

    #[test]
    fn messages_apply_in_submission_order() {
        let (store, _) = start();

        for value in 0..10 {
            store.send(Msg::Push(value));
        }

        let items = store.state().block_until(|items: &Vec<u32>| items.len() == 10, WAIT);
        assert_eq!(items, Some((0..10).collect::<Vec<_>>()));
    }

    #[test]
    fn blocked_unit_does_not_hold_up_the_writer() {
        let (store, units) = start();

        store.send(Msg::SlowPush(1));
        store.send(Msg::Push(2));

        let items = store.state().block_until(|items: &Vec<u32>| items.len() == 2, WAIT);
        assert_eq!(items, Some(vec![2, 1]));
        assert_eq!(units.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let config = DispatchConfig {
            mailbox_capacity: 0,
            ..DispatchConfig::default()
        };
        let program = Recorder {
            units: Arc::new(AtomicUsize::new(0)),
        };

        let result = Store::start(program, Vec::new(), &config);

        assert!(matches!(result, Err(DispatchError::InvalidConfig { .. })));
    }

    #[test]
    fn context_carries_its_origin() {
        let (store, _) = start();
        let seen = Arc::new(parking_lot::Mutex::new(None));
        let sink = Arc::clone(&seen);

        store
            .run_on_state_thread("inspect origin", move |ctx| {
                let sink = Arc::clone(&sink);
                async move {
                    *sink.lock() = Some(format!("{:?}", ctx.origin()));
                    ctx.update(|items| vec![items.len() as u32]);
                    Ok(())
                }
            })
            .expect("mailbox has room");

        store.state().block_until(|items: &Vec<u32>| !items.is_empty(), WAIT);
        assert_eq!(seen.lock().as_deref(), Some("RunOnStateThread(inspect origin)"));
    }
}
