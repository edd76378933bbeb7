use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use futures_util::future::{FutureExt, LocalBoxFuture};

use super::{Context, Program};

type Action<P> = dyn Fn(Context<P>) -> LocalBoxFuture<'static, anyhow::Result<()>> + Send + Sync;

/// A message as it travels through the mailbox.
pub enum Envelope<P: Program> {
    /// Handled by [`Program::update`].
    Msg(P::Msg),
    /// Runs a closure on the writer thread, bypassing the program's
    /// update function.
    RunOnStateThread(DirectAction<P>),
}

/// Closure submitted with [`Envelope::RunOnStateThread`].
///
/// The closure is `Fn` so the envelope can be cloned and dispatched
/// again on retry.
pub struct DirectAction<P: Program> {
    label: Cow<'static, str>,
    run: Arc<Action<P>>,
}

impl<P: Program> DirectAction<P> {
    pub fn new<F, Fut>(label: impl Into<Cow<'static, str>>, action: F) -> Self
    where
        F: Fn(Context<P>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + 'static,
    {
        Self {
            label: label.into(),
            run: Arc::new(move |ctx: Context<P>| action(ctx).boxed_local()),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn run(&self, ctx: Context<P>) -> LocalBoxFuture<'static, anyhow::Result<()>> {
        (self.run)(ctx)
    }
}

impl<P: Program> Clone for DirectAction<P> {
    fn clone(&self) -> Self {
        Self {
            label: self.label.clone(),
            run: Arc::clone(&self.run),
        }
    }
}

impl<P: Program> PartialEq for DirectAction<P> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.run), Arc::as_ptr(&other.run))
    }
}

impl<P: Program> Hash for DirectAction<P> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.label.hash(state);
        (Arc::as_ptr(&self.run) as *const () as usize).hash(state);
    }
}

impl<P: Program> fmt::Debug for DirectAction<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DirectAction").field(&self.label).finish()
    }
}

impl<P: Program> Clone for Envelope<P> {
    fn clone(&self) -> Self {
        match self {
            Envelope::Msg(msg) => Envelope::Msg(msg.clone()),
            Envelope::RunOnStateThread(action) => Envelope::RunOnStateThread(action.clone()),
        }
    }
}

impl<P: Program> PartialEq for Envelope<P> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Envelope::Msg(a), Envelope::Msg(b)) => a == b,
            (Envelope::RunOnStateThread(a), Envelope::RunOnStateThread(b)) => a == b,
            _ => false,
        }
    }
}

impl<P: Program> Eq for Envelope<P> where P::Msg: Eq {}

impl<P: Program> Hash for Envelope<P>
where
    P::Msg: Hash,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Envelope::Msg(msg) => msg.hash(state),
            Envelope::RunOnStateThread(action) => action.hash(state),
        }
    }
}

impl<P: Program> fmt::Debug for Envelope<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Envelope::Msg(msg) => fmt::Debug::fmt(msg, f),
            Envelope::RunOnStateThread(action) => {
                write!(f, "RunOnStateThread({})", action.label())
            }
        }
    }
}

impl<P: Program> From<DirectAction<P>> for Envelope<P> {
    fn from(action: DirectAction<P>) -> Self {
        Envelope::RunOnStateThread(action)
    }
}
