//! Reverse DNS for flexible IPs, gated on forward resolution.
//!
//! Scaleway ignores or rejects a reverse that does not resolve back to the
//! IP, so the resource operations poll DNS first and fail with a clear
//! diagnostic instead of an opaque API error.

mod resource;

use std::fmt;
use std::future::Future;
use std::net::IpAddr;
use std::pin::Pin;

use thiserror::Error;

use crate::converge::{Classify, Condition, ErrorClass, PollOutcome, Poller, Verdict};

pub use resource::{
    ReverseDnsError, ReverseDnsRecord, check_reverse, create, delete, read, update,
};

/// Future returned by [`Resolve::lookup`].
pub type ResolveFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<IpAddr>, ResolveError>> + Send + 'a>>;

/// Forward DNS resolution.
pub trait Resolve {
    /// Resolves `name` to its addresses.
    fn lookup<'a>(&'a self, name: &'a str) -> ResolveFuture<'a>;
}

/// Resolver backed by the operating system via `tokio::net::lookup_host`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemResolver;

impl Resolve for SystemResolver {
    fn lookup<'a>(&'a self, name: &'a str) -> ResolveFuture<'a> {
        Box::pin(async move {
            let resolved = tokio::net::lookup_host((name, 0))
                .await
                .map_err(|err| ResolveError::new(name, err.to_string()))?;
            let mut addresses: Vec<IpAddr> = resolved.map(|socket| socket.ip()).collect();
            addresses.sort_unstable();
            addresses.dedup();
            Ok(addresses)
        })
    }
}

/// Raised when a name cannot be resolved.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("cannot resolve {name}: {message}")]
pub struct ResolveError {
    /// Name being resolved.
    pub name: String,
    /// Resolver message.
    pub message: String,
}

impl ResolveError {
    /// Builds an error for `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl Classify for ResolveError {
    // NXDOMAIN right after a record is created usually means it has not
    // propagated yet.
    fn class(&self) -> ErrorClass {
        ErrorClass::Transient
    }
}

/// Addresses a name resolved to on one attempt.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolvedAddresses {
    /// Name that was resolved.
    pub name: String,
    /// Addresses returned by the resolver.
    pub addresses: Vec<IpAddr>,
}

impl fmt::Display for ResolvedAddresses {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.addresses.is_empty() {
            return write!(f, "{} resolves to nothing", self.name);
        }
        let rendered: Vec<String> = self.addresses.iter().map(ToString::to_string).collect();
        write!(f, "{} resolves to {}", self.name, rendered.join(", "))
    }
}

/// Holds once `name` resolves to a set containing `address`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolvesTo {
    name: String,
    address: IpAddr,
}

impl ResolvesTo {
    /// Builds the condition for `name` → `address`.
    #[must_use]
    pub fn new(name: impl Into<String>, address: IpAddr) -> Self {
        Self {
            name: name.into(),
            address,
        }
    }
}

impl Condition<ResolvedAddresses> for ResolvesTo {
    fn describe(&self) -> String {
        format!("reverse {} resolving to {}", self.name, self.address)
    }

    fn evaluate(&self, state: &ResolvedAddresses) -> Verdict {
        if state.addresses.contains(&self.address) {
            Verdict::Satisfied
        } else {
            Verdict::Pending
        }
    }
}

/// Polls DNS until `name` resolves to `address`.
pub async fn wait_for_reverse_resolution<R>(
    resolver: &R,
    name: &str,
    address: IpAddr,
    poller: &Poller,
) -> PollOutcome<ResolvedAddresses, ResolveError>
where
    R: Resolve + ?Sized,
{
    let condition = ResolvesTo::new(name, address);
    poller
        .poll(&condition, move || async move {
            let addresses = resolver.lookup(name).await?;
            Ok(ResolvedAddresses {
                name: name.to_owned(),
                addresses,
            })
        })
        .await
}
