//! BDD scenarios for Kapsule pool readiness.

use rstest_bdd_macros::scenario;

use super::test_helpers::{PoolContext, pool_context};

#[scenario(
    path = "tests/features/pool.feature",
    name = "Pool becomes ready after scaling"
)]
fn scenario_pool_ready_after_scaling(pool_context: PoolContext) {
    let _ = pool_context;
}

#[scenario(
    path = "tests/features/pool.feature",
    name = "Lingering node keeps the pool from converging"
)]
fn scenario_pool_lingering_node(pool_context: PoolContext) {
    let _ = pool_context;
}

#[scenario(path = "tests/features/pool.feature", name = "Deleted pool is waited out")]
fn scenario_pool_deleted(pool_context: PoolContext) {
    let _ = pool_context;
}
