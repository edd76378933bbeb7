use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::Arc;

use crate::atom::{Atom, MutableAtom};
use crate::error::Retryable;
use crate::state::Lens;

use super::store::Shared;
use super::{DispatchError, Envelope, Program, Worker, WorkerError};

/// Handle given to one processing unit.
///
/// It is the only way to change the state, and it only exists on the
/// writer thread: `Context` is neither `Send` nor `Sync`. It also carries
/// the envelope that started the unit, so failures can be paired with it
/// for a retry.
pub struct Context<P: Program> {
    shared: Arc<Shared<P>>,
    origin: Envelope<P>,
    _writer_only: PhantomData<Rc<()>>,
}

impl<P: Program> Context<P> {
    pub(crate) fn new(shared: Arc<Shared<P>>, origin: Envelope<P>) -> Self {
        Self {
            shared,
            origin,
            _writer_only: PhantomData,
        }
    }

    /// The program this unit belongs to.
    pub fn program(&self) -> &P {
        &self.shared.program
    }

    pub fn value(&self) -> P::State {
        self.shared.state.value()
    }

    pub fn read<R>(&self, f: impl FnOnce(&P::State) -> R) -> R {
        self.shared.state.read(f)
    }

    pub fn update(&self, change: impl FnOnce(&P::State) -> P::State) -> bool {
        self.shared.state.update(change)
    }

    pub fn update_if(
        &self,
        change: impl FnOnce(&P::State) -> P::State,
        only_if: impl FnOnce(&P::State) -> bool,
    ) -> bool {
        self.shared.state.update_if(change, only_if)
    }

    /// Replaces the part of the state addressed by `lens`.
    pub fn set<A: 'static>(&self, lens: &Lens<P::State, A>, part: A) -> bool {
        self.update(|state| lens.set(state.clone(), part))
    }

    /// [`set`](Self::set), applied only while `only_if` holds for the
    /// current part.
    pub fn set_if<A: 'static>(
        &self,
        lens: &Lens<P::State, A>,
        part: A,
        only_if: impl FnOnce(&A) -> bool,
    ) -> bool {
        self.update_if(
            |state| lens.set(state.clone(), part),
            |state| only_if(&lens.get(state)),
        )
    }

    /// Envelope that started this unit.
    pub fn origin(&self) -> &Envelope<P> {
        &self.origin
    }

    pub fn retryable<E>(&self, error: E) -> Retryable<P, E> {
        Retryable::new(self.origin.clone(), error)
    }

    /// Queues another message behind the ones already in the mailbox.
    pub fn send(&self, msg: P::Msg) -> Result<(), DispatchError> {
        self.shared.submit(Envelope::Msg(msg))
    }

    /// Runs `job` on the blocking pool and resumes this unit on the writer
    /// thread once it finishes. The writer keeps processing other messages
    /// in the meantime.
    pub async fn worker<T, F>(&self, job: F) -> Result<T, WorkerError>
    where
        F: FnOnce(&Worker) -> T + Send + 'static,
        T: Send + 'static,
    {
        tokio::task::spawn_blocking(move || job(&Worker::new()))
            .await
            .map_err(WorkerError::from)
    }
}

impl<P: Program> Clone for Context<P> {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.shared), self.origin.clone())
    }
}
