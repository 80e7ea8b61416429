//! Shared fixtures and helpers for reverse DNS scenarios.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use rstest::fixture;
use scw_converge::Poller;
use scw_converge::test_support::{FakeInstanceApi, ScriptedResolver};
use tokio::runtime::{Builder, Runtime};

#[derive(Clone, Debug)]
pub enum ReverseOutcome {
    Success,
    Failure(String),
}

#[derive(Clone, Debug)]
pub struct ReverseDnsContext {
    pub api: Arc<FakeInstanceApi>,
    pub resolver: Arc<ScriptedResolver>,
    pub outcome: Rc<RefCell<Option<ReverseOutcome>>>,
}

#[fixture]
pub fn reverse_dns_context() -> ReverseDnsContext {
    ReverseDnsContext {
        api: Arc::new(FakeInstanceApi::new()),
        resolver: Arc::new(ScriptedResolver::new()),
        outcome: Rc::new(RefCell::new(None)),
    }
}

pub fn poller() -> Poller {
    Poller::new(Duration::from_secs(30), Duration::from_secs(5))
}

/// Current-thread runtime with a paused clock so waits complete instantly.
pub fn paused_runtime() -> Runtime {
    Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap_or_else(|err| panic!("runtime should build: {err}"))
}
