//! Shared fixtures and helpers for pool scenarios.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use rstest::fixture;
use scw_converge::test_support::FakePoolApi;
use scw_converge::{Poller, Region, RegionalId};
use tokio::runtime::{Builder, Runtime};

#[derive(Clone, Debug)]
pub enum PoolOutcome {
    Ready { ready_nodes: usize },
    Deleted,
    Failure { message: String, timed_out: bool },
}

#[derive(Clone, Debug)]
pub struct PoolContext {
    pub api: Arc<FakePoolApi>,
    pub outcome: Rc<RefCell<Option<PoolOutcome>>>,
}

#[fixture]
pub fn pool_context() -> PoolContext {
    PoolContext {
        api: Arc::new(FakePoolApi::new()),
        outcome: Rc::new(RefCell::new(None)),
    }
}

pub fn pool_id() -> RegionalId {
    RegionalId::new(Region::new("fr-par"), "pool-1")
}

pub fn poller() -> Poller {
    Poller::new(Duration::from_secs(60), Duration::from_secs(5))
}

/// Current-thread runtime with a paused clock so waits complete instantly.
pub fn paused_runtime() -> Runtime {
    Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap_or_else(|err| panic!("runtime should build: {err}"))
}
