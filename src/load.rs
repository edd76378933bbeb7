//! Race-safe loading of [`GrState`] slots.
//!
//! Each entry point moves the slot into a transitional state on the writer
//! thread, runs the fetch on the worker pool, and commits the outcome only
//! if the slot is still in that transitional state. Anything that changed
//! the slot in between wins; the late result is dropped.

use crate::dispatch::{Context, Program, Worker, WorkerError};
use crate::error::Retryable;
use crate::outcome::ResultExt;
use crate::state::{GrState, Lens, Slot, Update};

/// Loads a value from scratch.
///
/// A slot that is already `Loading` is left alone. Otherwise it becomes
/// `Loading`, `fetch` runs on a worker, and the slot becomes `Content` or
/// `Failure`, the failure carrying the message that started this unit.
pub async fn load<P, E, V, F>(ctx: &Context<P>, slot: &Slot<P::State, Retryable<P, E>, V>, fetch: F)
where
    P: Program,
    E: From<WorkerError> + Send + 'static,
    V: Send + 'static,
    F: FnOnce(&Worker) -> Result<V, E> + Send + 'static,
{
    let started = ctx.update_if(
        |state| slot.set(state.clone(), Some(GrState::Loading)),
        |state| !is_loading(&slot.get(state)),
    );
    if !started {
        tracing::debug!("load skipped, fetch already in flight");
        return;
    }
    reload(ctx, slot, fetch).await;
}

/// Loads a value, or refreshes it while keeping the current one visible.
///
/// Absent and failed slots are loaded as with [`load`]. Settled content is
/// marked as refreshing; a successful refresh replaces the value, a failed
/// one keeps it and records the failure in [`Update::Failure`]. A slot that
/// is loading or refreshing is left alone.
pub async fn load_or_update<P, E, V, F>(
    ctx: &Context<P>,
    slot: &Slot<P::State, Retryable<P, E>, V>,
    fetch: F,
) where
    P: Program,
    E: From<WorkerError> + Send + 'static,
    V: Send + 'static,
    F: FnOnce(&Worker) -> Result<V, E> + Send + 'static,
{
    let current = ctx.read(|state| slot.get(state));
    match current {
        None | Some(GrState::Failure(_)) => {
            let started = ctx.update_if(
                |state| slot.set(state.clone(), Some(GrState::Loading)),
                |state| matches!(slot.get(state), None | Some(GrState::Failure(_))),
            );
            if started {
                reload(ctx, slot, fetch).await;
            }
        }
        Some(GrState::Content { update, .. }) if !is_running(&update) => {
            let started = ctx.update_if(
                |state| {
                    slot.modify(state.clone(), |current| {
                        current.map(|content| content.with_update(Some(Update::Loading)))
                    })
                },
                |state| matches!(slot.get(state), Some(GrState::Content { update, .. }) if !is_running(&update)),
            );
            if started {
                refresh(ctx, slot, fetch).await;
            }
        }
        Some(_) => tracing::debug!("load_or_update skipped, fetch already in flight"),
    }
}

/// Runs `job` on a worker while `flag` is raised.
///
/// Returns `None` without running anything when the flag is already
/// raised, which means another job guarded by it is in flight.
pub async fn load_flag<P, T, F>(
    ctx: &Context<P>,
    flag: &Lens<P::State, bool>,
    job: F,
) -> Option<Result<T, WorkerError>>
where
    P: Program,
    T: Send + 'static,
    F: FnOnce(&Worker) -> T + Send + 'static,
{
    if !ctx.set_if(flag, true, |raised| !raised) {
        return None;
    }
    let outcome = ctx.worker(job).await;
    ctx.set(flag, false);
    Some(outcome)
}

async fn reload<P, E, V, F>(ctx: &Context<P>, slot: &Slot<P::State, Retryable<P, E>, V>, fetch: F)
where
    P: Program,
    E: From<WorkerError> + Send + 'static,
    V: Send + 'static,
    F: FnOnce(&Worker) -> Result<V, E> + Send + 'static,
{
    let result = fetch_on_worker(ctx, fetch).await;
    let committed = ctx.update_if(
        |state| slot.set(state.clone(), Some(result.into_state())),
        |state| is_loading(&slot.get(state)),
    );
    if !committed {
        tracing::debug!("discarding load result, slot changed while fetching");
    }
}

async fn refresh<P, E, V, F>(ctx: &Context<P>, slot: &Slot<P::State, Retryable<P, E>, V>, fetch: F)
where
    P: Program,
    E: From<WorkerError> + Send + 'static,
    V: Send + 'static,
    F: FnOnce(&Worker) -> Result<V, E> + Send + 'static,
{
    let result = fetch_on_worker(ctx, fetch).await;
    let committed = ctx.update_if(
        |state| {
            slot.modify(state.clone(), |current| {
                current.map(|content| content.settle_refresh(result))
            })
        },
        |state| slot.get(state).is_some_and(|current| current.is_update_running()),
    );
    if !committed {
        tracing::debug!("discarding refresh result, slot changed while fetching");
    }
}

async fn fetch_on_worker<P, E, V, F>(ctx: &Context<P>, fetch: F) -> Result<V, Retryable<P, E>>
where
    P: Program,
    E: From<WorkerError> + Send + 'static,
    V: Send + 'static,
    F: FnOnce(&Worker) -> Result<V, E> + Send + 'static,
{
    let outcome = match ctx.worker(fetch).await {
        Ok(result) => result,
        Err(error) => Err(E::from(error)),
    };
    outcome.map_err(|error| ctx.retryable(error))
}

fn is_loading<E, V>(slot: &Option<GrState<E, V>>) -> bool {
    matches!(slot, Some(GrState::Loading))
}

fn is_running<E>(update: &Option<Update<E>>) -> bool {
    update.as_ref().is_some_and(Update::is_running)
}
