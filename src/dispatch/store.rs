use std::borrow::Cow;
use std::future::Future;
use std::hash::Hash;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Weak};
use std::thread;

use futures_util::FutureExt;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::LocalSet;
use tracing::Instrument;

use crate::atom::{Atom, AtomExt, AtomView, AtomicCache, Subscription};
use crate::config::DispatchConfig;

use super::{Context, DirectAction, DispatchError, Envelope, Program};

pub(crate) struct Shared<P: Program> {
    pub(crate) program: P,
    pub(crate) state: AtomicCache<P::State>,
    mailbox: mpsc::Sender<Envelope<P>>,
    capacity: usize,
}

impl<P: Program> Shared<P> {
    pub(crate) fn submit(&self, envelope: Envelope<P>) -> Result<(), DispatchError> {
        self.mailbox.try_send(envelope).map_err(|error| match error {
            TrySendError::Full(envelope) => DispatchError::MailboxFull {
                capacity: self.capacity,
                message: format!("{envelope:?}"),
            },
            TrySendError::Closed(envelope) => DispatchError::Closed {
                message: format!("{envelope:?}"),
            },
        })
    }
}

/// Owner of the application state and entry point for messages.
///
/// Every mutation happens on one dedicated writer thread, one processing
/// unit per message. Handles are cheap to clone; the writer thread exits
/// once every handle and every running unit is gone.
pub struct Store<P: Program> {
    shared: Arc<Shared<P>>,
}

impl<P: Program> Store<P> {
    /// Spawns the writer thread and its blocking pool.
    pub fn start(program: P, initial: P::State, config: &DispatchConfig) -> Result<Self, DispatchError> {
        config.validate().map_err(|error| DispatchError::InvalidConfig {
            message: error.to_string(),
        })?;

        let runtime = Builder::new_current_thread()
            .enable_time()
            .max_blocking_threads(config.worker_threads)
            .thread_name(format!("{}-worker", config.thread_name))
            .build()?;

        let (sender, receiver) = mpsc::channel(config.mailbox_capacity);
        let shared = Arc::new(Shared {
            program,
            state: AtomicCache::new(initial),
            mailbox: sender,
            capacity: config.mailbox_capacity,
        });

        let writer = Arc::downgrade(&shared);
        thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || writer_loop(runtime, receiver, writer))?;

        tracing::debug!(
            capacity = config.mailbox_capacity,
            workers = config.worker_threads,
            "state writer started"
        );
        Ok(Self { shared })
    }

    /// Read-only view of the whole state.
    pub fn state(&self) -> AtomView<P::State> {
        self.shared.state.view()
    }

    pub fn value(&self) -> P::State {
        self.shared.state.value()
    }

    /// Observes one projection of the state. `listener` runs right away
    /// with the current projection, then on the writer thread whenever the
    /// projection's hash changes.
    pub fn watch<B, F, L>(&self, projection: F, listener: L) -> Subscription
    where
        B: Hash + 'static,
        F: Fn(&P::State) -> B + Send + Sync + 'static,
        L: Fn(&B) + Send + Sync + 'static,
    {
        self.state().map(projection).watch_fn(listener)
    }

    /// Fire-and-forget submission. A rejected message is logged and
    /// dropped.
    pub fn send(&self, msg: P::Msg) {
        if let Err(error) = self.try_send(msg) {
            tracing::warn!(%error, "message rejected");
        }
    }

    pub fn try_send(&self, msg: P::Msg) -> Result<(), DispatchError> {
        self.dispatch(Envelope::Msg(msg))
    }

    pub fn dispatch(&self, envelope: Envelope<P>) -> Result<(), DispatchError> {
        self.shared.submit(envelope)
    }

    /// Runs `action` on the writer thread, serialized with every other
    /// message, without going through [`Program::update`].
    pub fn run_on_state_thread<F, Fut>(
        &self,
        label: impl Into<Cow<'static, str>>,
        action: F,
    ) -> Result<(), DispatchError>
    where
        F: Fn(Context<P>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + 'static,
    {
        self.dispatch(DirectAction::new(label, action).into())
    }
}

impl<P: Program> Clone for Store<P> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

fn writer_loop<P: Program>(
    runtime: Runtime,
    mut mailbox: mpsc::Receiver<Envelope<P>>,
    shared: Weak<Shared<P>>,
) {
    let local = LocalSet::new();
    local.block_on(&runtime, async move {
        while let Some(envelope) = mailbox.recv().await {
            let Some(owner) = shared.upgrade() else {
                tracing::debug!(origin = ?envelope, "store dropped, discarding message");
                continue;
            };
            tokio::task::spawn_local(run_unit(owner, envelope));
            // Let the new unit run up to its first suspension before the
            // next message is taken.
            tokio::task::yield_now().await;
        }
    });
    runtime.block_on(local);
    tracing::debug!("state writer stopped");
}

async fn run_unit<P: Program>(shared: Arc<Shared<P>>, envelope: Envelope<P>) {
    let span = tracing::debug_span!("unit", origin = ?envelope);
    let ctx = Context::new(Arc::clone(&shared), envelope.clone());
    let unit = async {
        match envelope {
            Envelope::Msg(msg) => shared.program.update(ctx, msg).await,
            Envelope::RunOnStateThread(action) => action.run(ctx).await,
        }
    };

    let outcome = AssertUnwindSafe(unit.instrument(span.clone()))
        .catch_unwind()
        .await;

    span.in_scope(|| match outcome {
        Ok(Ok(())) => tracing::trace!("unit completed"),
        Ok(Err(error)) => tracing::error!(error = %format!("{error:#}"), "unit failed"),
        Err(payload) => tracing::error!(
            panic = %crate::panic::describe(&*payload),
            "unit panicked"
        ),
    });
}
