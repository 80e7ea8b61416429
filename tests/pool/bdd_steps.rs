//! BDD step definitions for pool behaviour.

use rstest_bdd_macros::{given, then, when};
use scw_converge::ScalewayApiError;
use scw_converge::pool::{self, PoolError};

use super::test_helpers::{PoolContext, PoolOutcome, paused_runtime, pool_id, poller};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

fn failure(err: &PoolError) -> PoolOutcome {
    PoolOutcome::Failure {
        message: err.to_string(),
        timed_out: err.is_timeout(),
    }
}

#[given("a pool reporting \"{first}\" then \"{second}\" then \"{third}\" with {nodes:u32} nodes")]
fn pool_reporting(
    pool_context: PoolContext,
    first: String,
    second: String,
    third: String,
    nodes: u32,
) -> PoolContext {
    let names: Vec<String> = (1..=nodes).map(|index| format!("node-{index}")).collect();
    for (status, node_status) in [
        (first.trim(), "creating"),
        (second.trim(), "registering"),
        (third.trim(), "ready"),
    ] {
        pool_context.api.push_pool(status, nodes);
        let listing: Vec<(&str, &str)> = names
            .iter()
            .map(|name| (name.as_str(), node_status))
            .collect();
        pool_context.api.push_nodes(&listing);
    }
    pool_context
}

#[given("a ready pool with a node stuck in \"{status}\"")]
fn pool_with_stuck_node(pool_context: PoolContext, status: String) -> PoolContext {
    pool_context.api.push_pool("ready", 1);
    pool_context
        .api
        .push_nodes(&[("node-1", "ready"), ("node-2", status.trim())]);
    pool_context
}

#[given("a pool that disappears after {reads:u32} read")]
fn pool_disappears(pool_context: PoolContext, reads: u32) -> PoolContext {
    for _ in 0..reads {
        pool_context.api.push_pool("deleting", 1);
    }
    pool_context.api.push_nodes(&[("node-1", "deleting")]);
    pool_context.api.push_pool_error(ScalewayApiError::Http {
        status: 404,
        message: String::from("pool not found"),
    });
    pool_context
}

#[when("I wait for the pool to be ready")]
fn wait_for_ready(pool_context: PoolContext) -> PoolContext {
    let result = paused_runtime().block_on(pool::wait_for_pool_ready(
        pool_context.api.as_ref(),
        &pool_id(),
        &poller(),
    ));
    let outcome = match result {
        Ok(snapshot) => PoolOutcome::Ready {
            ready_nodes: snapshot.ready_nodes(),
        },
        Err(err) => failure(&err),
    };
    pool_context.outcome.replace(Some(outcome));
    pool_context
}

#[when("I delete the pool and wait")]
fn delete_and_wait(pool_context: PoolContext) -> PoolContext {
    let result = paused_runtime().block_on(pool::delete_pool(
        pool_context.api.as_ref(),
        &pool_id(),
        Some(&poller()),
    ));
    let outcome = match result {
        Ok(()) => PoolOutcome::Deleted,
        Err(err) => failure(&err),
    };
    pool_context.outcome.replace(Some(outcome));
    pool_context
}

#[then("the wait succeeds with {nodes:u32} ready nodes")]
fn wait_succeeds(pool_context: &PoolContext, nodes: u32) -> Result<(), StepError> {
    match pool_context.outcome.borrow().as_ref() {
        Some(PoolOutcome::Ready { ready_nodes })
            if u32::try_from(*ready_nodes).ok() == Some(nodes) =>
        {
            Ok(())
        }
        other => Err(StepError::Assertion(format!(
            "expected {nodes} ready nodes, got {other:?}"
        ))),
    }
}

#[then("the pool was read {reads:u32} times")]
fn pool_read_count(pool_context: &PoolContext, reads: u32) -> Result<(), StepError> {
    let actual = pool_context.api.pool_reads();
    if actual == reads {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {reads} pool reads, got {actual}"
        )))
    }
}

#[then("the wait times out mentioning \"{needle}\"")]
fn wait_times_out(pool_context: &PoolContext, needle: String) -> Result<(), StepError> {
    match pool_context.outcome.borrow().as_ref() {
        Some(PoolOutcome::Failure {
            message,
            timed_out: true,
        }) if message.contains(needle.trim()) => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected timeout mentioning {needle}, got {other:?}"
        ))),
    }
}

#[then("the deletion succeeds")]
fn deletion_succeeds(pool_context: &PoolContext) -> Result<(), StepError> {
    match pool_context.outcome.borrow().as_ref() {
        Some(PoolOutcome::Deleted) if pool_context.api.deletions() == 1 => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected a single deletion, got {other:?}"
        ))),
    }
}
