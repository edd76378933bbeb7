//! Shared test program and helpers.

#![allow(dead_code, unused_imports)]

use mechanicum::config::DispatchConfig;
use mechanicum::{
    load, load_flag, load_or_update, ApiError, AtomExt, Context, GrState, Lens, Program,
    Retryable, Slot, Store,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Upper bound for every wait in the integration tests.
pub const WAIT: Duration = Duration::from_secs(5);

pub type TestError = Retryable<TestProgram, ApiError>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TestMsg {
    /// `load` into `item`; the fetch sleeps `delay_ms` then returns `outcome`.
    Load {
        delay_ms: u64,
        outcome: Result<String, ApiError>,
    },
    /// `load_or_update` into `item`.
    Refresh {
        delay_ms: u64,
        outcome: Result<String, ApiError>,
    },
    /// Runs a `delay_ms` job guarded by the `busy` flag, then bumps the counter.
    Flagged { delay_ms: u64 },
    /// Sets `item` to settled content.
    Seed(String),
    Bump,
    Reset,
    Fail,
    Panic,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TestState {
    pub item: Option<GrState<TestError, String>>,
    pub counter: u32,
    pub busy: bool,
}

impl TestState {
    pub fn item() -> Slot<TestState, TestError, String> {
        Lens::new(
            |state: &TestState| state.item.clone(),
            |state, item| TestState { item, ..state },
        )
    }

    pub fn busy() -> Lens<TestState, bool> {
        Lens::new(
            |state: &TestState| state.busy,
            |state, busy| TestState { busy, ..state },
        )
    }
}

/// Program whose fetches are simulated with sleeps. `fetches` counts how
/// many blocking jobs actually ran.
pub struct TestProgram {
    pub fetches: Arc<AtomicUsize>,
}

impl TestProgram {
    fn fetch(
        &self,
        delay_ms: u64,
        outcome: Result<String, ApiError>,
    ) -> impl FnOnce(&mechanicum::Worker) -> Result<String, ApiError> + Send + 'static {
        let fetches = Arc::clone(&self.fetches);
        move |_| {
            fetches.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(delay_ms));
            outcome
        }
    }
}

impl Program for TestProgram {
    type State = TestState;
    type Msg = TestMsg;

    async fn update(&self, ctx: Context<Self>, msg: TestMsg) -> anyhow::Result<()> {
        match msg {
            TestMsg::Load { delay_ms, outcome } => {
                load(&ctx, &TestState::item(), self.fetch(delay_ms, outcome)).await;
            }
            TestMsg::Refresh { delay_ms, outcome } => {
                load_or_update(&ctx, &TestState::item(), self.fetch(delay_ms, outcome)).await;
            }
            TestMsg::Flagged { delay_ms } => {
                let job = self.fetch(delay_ms, Ok(String::new()));
                if let Some(outcome) = load_flag(&ctx, &TestState::busy(), job).await {
                    outcome??;
                    ctx.update(|state| TestState {
                        counter: state.counter + 1,
                        ..state.clone()
                    });
                }
            }
            TestMsg::Seed(value) => {
                ctx.set(&TestState::item(), Some(GrState::content(value)));
            }
            TestMsg::Bump => {
                ctx.update(|state| TestState {
                    counter: state.counter + 1,
                    ..state.clone()
                });
            }
            TestMsg::Reset => {
                ctx.set(&TestState::item(), None);
            }
            TestMsg::Fail => anyhow::bail!("unit failed on purpose"),
            TestMsg::Panic => panic!("unit panicked on purpose"),
        }
        Ok(())
    }
}

/// Starts a store over an empty `TestState`.
pub fn start(capacity: usize) -> (Store<TestProgram>, Arc<AtomicUsize>) {
    let fetches = Arc::new(AtomicUsize::new(0));
    let program = TestProgram {
        fetches: Arc::clone(&fetches),
    };
    let config = DispatchConfig {
        mailbox_capacity: capacity,
        ..DispatchConfig::default()
    };
    let store = Store::start(program, TestState::default(), &config).expect("store starts");
    (store, fetches)
}

/// Blocks until `predicate` holds for the state, failing the test after [`WAIT`].
pub fn wait_for(
    store: &Store<TestProgram>,
    predicate: impl Fn(&TestState) -> bool + Send + Sync + 'static,
) -> TestState {
    store
        .state()
        .block_until(predicate, WAIT)
        .expect("state reached in time")
}

pub fn service_error(message: &str) -> ApiError {
    ApiError::Service {
        message: message.to_string(),
    }
}
