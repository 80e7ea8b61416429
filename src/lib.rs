//! Convergence waits for Scaleway resources.
//!
//! Scaleway accepts changes before it applies them. This crate provides a
//! generic, deadline-bounded [`Poller`] that re-reads a remote resource until
//! a [`Condition`] holds, plus two instantiations built on a minimal REST
//! client: reverse DNS for flexible IPs (gated on forward resolution) and
//! Kapsule pool/node readiness.

pub mod config;
pub mod converge;
pub mod logging;
pub mod pool;
pub mod reverse_dns;
pub mod scaleway;
pub mod test_support;

pub use config::{ConfigError, ScalewayConfig};
pub use converge::{
    Classify, Condition, ConvergeError, ErrorClass, Interval, PollFailure, PollOutcome, Poller,
    Predicate, Verdict,
};
pub use pool::{
    NodeSnapshot, NodeStatus, PoolError, PoolGone, PoolPresence, PoolReady, PoolSnapshot,
    PoolStatus,
};
pub use reverse_dns::{
    ResolveError, ResolvedAddresses, ResolvesTo, Resolve, ReverseDnsError, ReverseDnsRecord,
    SystemResolver,
};
pub use scaleway::{
    InstanceIpApi, LocalityError, PoolApi, Region, RegionalId, ScalewayApiError, ScalewayClient,
    Zone, ZonedId,
};
