//! Kapsule pool readiness and the operations that wait on it.
//!
//! A pool is ready once its own status is `ready` and every node it owns is
//! `ready` too. Resizing and deleting only return after the API has applied
//! the change when asked to wait.

mod status;

use std::fmt;

use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::converge::{Condition, ConvergeError, Poller, Verdict};
use crate::scaleway::{PoolApi, RegionalId, ScalewayApiError};

pub use status::{NodeStatus, PoolStatus};

/// One node as observed during a poll.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NodeSnapshot {
    /// Node identifier.
    pub id: String,
    /// Node name.
    pub name: String,
    /// Parsed node status.
    pub status: NodeStatus,
}

/// A pool and its nodes as observed during a poll.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PoolSnapshot {
    /// Pool identifier.
    pub id: RegionalId,
    /// Pool name.
    pub name: String,
    /// Parsed pool status.
    pub status: PoolStatus,
    /// Requested number of nodes.
    pub size: u32,
    /// Nodes currently attached to the pool.
    pub nodes: Vec<NodeSnapshot>,
}

impl PoolSnapshot {
    /// Number of nodes reporting `ready`.
    #[must_use]
    pub fn ready_nodes(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| node.status == NodeStatus::Ready)
            .count()
    }
}

impl fmt::Display for PoolSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pool {} {} (size {}, {}/{} nodes ready)",
            self.id,
            self.status,
            self.size,
            self.ready_nodes(),
            self.nodes.len()
        )?;
        for node in &self.nodes {
            write!(f, "; {} {}", node.name, node.status)?;
        }
        Ok(())
    }
}

/// Presence of a pool while waiting for its deletion.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PoolPresence {
    /// The pool still exists.
    Present(PoolSnapshot),
    /// The API reports the pool as not found.
    Gone,
}

impl fmt::Display for PoolPresence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present(snapshot) => fmt::Display::fmt(snapshot, f),
            Self::Gone => f.write_str("pool gone"),
        }
    }
}

/// Holds once the pool and all of its nodes are `ready`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PoolReady {
    id: RegionalId,
}

impl PoolReady {
    /// Builds the condition for pool `id`.
    #[must_use]
    pub const fn new(id: RegionalId) -> Self {
        Self { id }
    }
}

impl Condition<PoolSnapshot> for PoolReady {
    fn describe(&self) -> String {
        format!("pool {} and its nodes ready", self.id)
    }

    fn evaluate(&self, state: &PoolSnapshot) -> Verdict {
        if matches!(state.status, PoolStatus::Deleting | PoolStatus::Deleted) {
            return Verdict::Failed(format!("pool is {}", state.status));
        }
        if let Some(node) = state
            .nodes
            .iter()
            .find(|node| node.status == NodeStatus::CreationError)
        {
            return Verdict::Failed(format!("node {} failed to create", node.name));
        }
        if state.status != PoolStatus::Ready {
            return Verdict::Pending;
        }
        let expected = usize::try_from(state.size).unwrap_or(usize::MAX);
        if state.nodes.len() < expected {
            return Verdict::Pending;
        }
        if state.ready_nodes() == state.nodes.len() {
            Verdict::Satisfied
        } else {
            Verdict::Pending
        }
    }
}

/// Holds once the pool can no longer be read.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PoolGone {
    id: RegionalId,
}

impl PoolGone {
    /// Builds the condition for pool `id`.
    #[must_use]
    pub const fn new(id: RegionalId) -> Self {
        Self { id }
    }
}

impl Condition<PoolPresence> for PoolGone {
    fn describe(&self) -> String {
        format!("pool {} deleted", self.id)
    }

    fn evaluate(&self, state: &PoolPresence) -> Verdict {
        match state {
            PoolPresence::Gone => Verdict::Satisfied,
            PoolPresence::Present(snapshot) if snapshot.status == PoolStatus::Deleted => {
                Verdict::Satisfied
            }
            PoolPresence::Present(_) => Verdict::Pending,
        }
    }
}

/// Errors raised by the pool operations.
#[derive(Debug, Error)]
pub enum PoolError {
    /// A Kubernetes API call failed.
    #[error(transparent)]
    Api(#[from] ScalewayApiError),
    /// The wait for the pool did not converge.
    #[error(transparent)]
    Wait(#[from] ConvergeError),
}

impl PoolError {
    /// Returns `true` when a wait ran out of time.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Wait(err) if err.is_timeout())
    }
}

/// Reads a pool and its nodes in one snapshot.
///
/// # Errors
///
/// Returns the API error of whichever call failed.
pub async fn fetch_snapshot<A>(api: &A, id: &RegionalId) -> Result<PoolSnapshot, ScalewayApiError>
where
    A: PoolApi + ?Sized,
{
    let pool = api.get_pool(&id.region, &id.id).await?;
    let nodes = api.list_pool_nodes(&id.region, &id.id).await?;
    Ok(PoolSnapshot {
        id: id.clone(),
        name: pool.name,
        status: PoolStatus::parse(&pool.status),
        size: pool.size,
        nodes: nodes
            .into_iter()
            .map(|node| NodeSnapshot {
                status: NodeStatus::parse(&node.status),
                id: node.id,
                name: node.name,
            })
            .collect(),
    })
}

async fn fetch_presence<A>(api: &A, id: &RegionalId) -> Result<PoolPresence, ScalewayApiError>
where
    A: PoolApi + ?Sized,
{
    match fetch_snapshot(api, id).await {
        Ok(snapshot) => Ok(PoolPresence::Present(snapshot)),
        Err(err) if err.is_not_found() => Ok(PoolPresence::Gone),
        Err(err) => Err(err),
    }
}

/// Reads a pool. Returns `Ok(None)` when it does not exist.
///
/// # Errors
///
/// Returns [`PoolError::Api`] for API failures other than not-found.
pub async fn read_pool<A>(api: &A, id: &RegionalId) -> Result<Option<PoolSnapshot>, PoolError>
where
    A: PoolApi + ?Sized,
{
    match fetch_presence(api, id).await? {
        PoolPresence::Present(snapshot) => Ok(Some(snapshot)),
        PoolPresence::Gone => Ok(None),
    }
}

/// Waits until the pool and all of its nodes are ready.
///
/// # Errors
///
/// Returns [`PoolError::Wait`] when the pool does not become ready before
/// the poller's deadline, reaches a terminal state, cannot be read, or the
/// wait is cancelled.
#[instrument(skip_all, fields(pool = %id))]
pub async fn wait_for_pool_ready<A>(
    api: &A,
    id: &RegionalId,
    poller: &Poller,
) -> Result<PoolSnapshot, PoolError>
where
    A: PoolApi + ?Sized,
{
    let snapshot = poller
        .converge(&PoolReady::new(id.clone()), move || fetch_snapshot(api, id))
        .await?;
    info!(nodes = snapshot.nodes.len(), "pool ready");
    Ok(snapshot)
}

/// Requests a new pool size. With `wait`, returns once the pool and its
/// nodes are ready again; otherwise returns the pool as read right after the
/// request.
///
/// # Errors
///
/// Returns [`PoolError::Api`] when the resize is rejected and
/// [`PoolError::Wait`] when the wait does not converge.
#[instrument(skip_all, fields(pool = %id, size = size))]
pub async fn resize_pool<A>(
    api: &A,
    id: &RegionalId,
    size: u32,
    wait: Option<&Poller>,
) -> Result<PoolSnapshot, PoolError>
where
    A: PoolApi + ?Sized,
{
    api.update_pool_size(&id.region, &id.id, size).await?;
    debug!("resize accepted");
    match wait {
        Some(poller) => wait_for_pool_ready(api, id, poller).await,
        None => Ok(fetch_snapshot(api, id).await?),
    }
}

/// Requests pool deletion. With `wait`, returns once the pool can no longer
/// be read.
///
/// # Errors
///
/// Returns [`PoolError::Api`] when the deletion is rejected and
/// [`PoolError::Wait`] when the wait does not converge.
#[instrument(skip_all, fields(pool = %id))]
pub async fn delete_pool<A>(api: &A, id: &RegionalId, wait: Option<&Poller>) -> Result<(), PoolError>
where
    A: PoolApi + ?Sized,
{
    api.delete_pool(&id.region, &id.id).await?;
    debug!("deletion accepted");
    if let Some(poller) = wait {
        poller
            .converge(&PoolGone::new(id.clone()), move || fetch_presence(api, id))
            .await?;
        info!("pool deleted");
    }
    Ok(())
}
