//! Create, read, update, and delete for the reverse DNS of a flexible IP.

use std::fmt;
use std::net::IpAddr;

use shell_escape::unix::escape;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::converge::{Condition, ConvergeError, Poller};
use crate::scaleway::{
    FlexibleIp, InstanceIpApi, LocalityError, ScalewayApiError, Zone, ZonedId, expand_id,
};

use super::{Resolve, ResolvedAddresses, ResolvesTo, wait_for_reverse_resolution};

/// Reverse DNS state of one flexible IP.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReverseDnsRecord {
    /// Zoned identifier of the IP (`fr-par-1/<uuid>`).
    pub id: ZonedId,
    /// Public address of the IP.
    pub address: IpAddr,
    /// Configured reverse, `None` when unset.
    pub reverse: Option<String>,
}

impl ReverseDnsRecord {
    fn from_ip(zone: &Zone, ip: FlexibleIp) -> Self {
        Self {
            id: ZonedId::new(zone.clone(), ip.id),
            address: ip.address,
            reverse: ip.reverse,
        }
    }
}

impl fmt::Display for ReverseDnsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} reverse={}",
            self.id,
            self.address,
            self.reverse.as_deref().unwrap_or("<unset>")
        )
    }
}

/// Errors raised by the reverse DNS operations.
#[derive(Debug, Error)]
pub enum ReverseDnsError {
    /// The reverse never resolved to the IP within the wait budget.
    #[error(
        "your reverse must resolve. Ensure the command `{command}` matches your IP address {address}: {cause}"
    )]
    Unresolved {
        /// `dig` invocation the user can run to investigate.
        command: String,
        /// Address the reverse must resolve to.
        address: IpAddr,
        /// Underlying convergence failure.
        #[source]
        cause: ConvergeError,
    },
    /// The resolution check was aborted before the deadline.
    #[error("reverse DNS check aborted: {0}")]
    Check(#[source] ConvergeError),
    /// The IP disappeared between the update and the final read.
    #[error("ip {0} disappeared while updating its reverse")]
    Vanished(ZonedId),
    /// The IP identifier could not be parsed.
    #[error(transparent)]
    Locality(#[from] LocalityError),
    /// The Instance API call failed.
    #[error(transparent)]
    Api(#[from] ScalewayApiError),
}

impl ReverseDnsError {
    /// Returns `true` when the failure is a resolution timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Unresolved { .. })
    }
}

fn desired_reverse(reverse: Option<&str>) -> Option<&str> {
    reverse.map(str::trim).filter(|value| !value.is_empty())
}

/// Polls DNS until `name` resolves to `address`, turning a timeout into the
/// actionable `dig` diagnostic.
///
/// # Errors
///
/// Returns [`ReverseDnsError::Unresolved`] on timeout and
/// [`ReverseDnsError::Check`] when the wait is cancelled.
pub async fn check_reverse<R>(
    resolver: &R,
    poller: &Poller,
    name: &str,
    address: IpAddr,
) -> Result<ResolvedAddresses, ReverseDnsError>
where
    R: Resolve + ?Sized,
{
    let condition = ResolvesTo::new(name, address).describe();
    wait_for_reverse_resolution(resolver, name, address, poller)
        .await
        .into_result(&condition)
        .map_err(|cause| {
            if cause.is_timeout() {
                ReverseDnsError::Unresolved {
                    command: format!("dig +short {}", escape(name.into())),
                    address,
                    cause,
                }
            } else {
                ReverseDnsError::Check(cause)
            }
        })
}

/// Looks up the IP (by identifier or address), gates `reverse` on DNS
/// resolution, sets it, and returns the resulting record.
///
/// A blank or absent `reverse` leaves the IP untouched.
///
/// # Errors
///
/// Returns [`ReverseDnsError::Unresolved`] when the reverse never resolves to
/// the IP, and [`ReverseDnsError::Api`] when an Instance API call fails.
#[instrument(skip_all, fields(zone = %zone, ip = %ip))]
pub async fn create<A, R>(
    api: &A,
    resolver: &R,
    poller: &Poller,
    zone: &Zone,
    ip: &str,
    reverse: Option<&str>,
) -> Result<ReverseDnsRecord, ReverseDnsError>
where
    A: InstanceIpApi + ?Sized,
    R: Resolve + ?Sized,
{
    let flexible = api.get_ip(zone, expand_id(ip)?).await?;
    let id = ZonedId::new(zone.clone(), flexible.id.as_str());

    if let Some(name) = desired_reverse(reverse) {
        debug!(%id, reverse = name, "updating ip reverse");
        check_reverse(resolver, poller, name, flexible.address).await?;
        api.set_ip_reverse(zone, &flexible.id, Some(name)).await?;
    }

    read(api, &id)
        .await?
        .ok_or(ReverseDnsError::Vanished(id))
}

/// Reads the reverse DNS of an IP. Returns `Ok(None)` when the IP is gone.
///
/// # Errors
///
/// Returns [`ReverseDnsError::Api`] for API failures other than not-found.
pub async fn read<A>(api: &A, id: &ZonedId) -> Result<Option<ReverseDnsRecord>, ReverseDnsError>
where
    A: InstanceIpApi + ?Sized,
{
    match api.get_ip(&id.zone, &id.id).await {
        Ok(ip) => Ok(Some(ReverseDnsRecord::from_ip(&id.zone, ip))),
        Err(err) if err.is_not_found() => {
            debug!(%id, "ip no longer exists");
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

/// Moves the reverse of an existing IP to `reverse`, clearing it when
/// `reverse` is blank or absent. Nothing is sent when the value is unchanged.
///
/// # Errors
///
/// Returns [`ReverseDnsError::Unresolved`] when a new reverse never resolves
/// to the IP, and [`ReverseDnsError::Api`] when an Instance API call fails.
#[instrument(skip_all, fields(id = %id))]
pub async fn update<A, R>(
    api: &A,
    resolver: &R,
    poller: &Poller,
    id: &ZonedId,
    reverse: Option<&str>,
) -> Result<ReverseDnsRecord, ReverseDnsError>
where
    A: InstanceIpApi + ?Sized,
    R: Resolve + ?Sized,
{
    let current = api.get_ip(&id.zone, &id.id).await?;
    let desired = desired_reverse(reverse);

    if current.reverse.as_deref() == desired {
        debug!("reverse unchanged");
        return Ok(ReverseDnsRecord::from_ip(&id.zone, current));
    }

    if let Some(name) = desired {
        debug!(reverse = name, "updating ip reverse");
        check_reverse(resolver, poller, name, current.address).await?;
    } else {
        debug!("clearing ip reverse");
    }
    api.set_ip_reverse(&id.zone, &current.id, desired).await?;

    read(api, id)
        .await?
        .ok_or_else(|| ReverseDnsError::Vanished(id.clone()))
}

/// Clears the reverse of an IP. An IP that no longer exists has nothing left
/// to clear.
///
/// # Errors
///
/// Returns [`ReverseDnsError::Api`] for API failures other than not-found.
#[instrument(skip_all, fields(id = %id))]
pub async fn delete<A>(api: &A, id: &ZonedId) -> Result<(), ReverseDnsError>
where
    A: InstanceIpApi + ?Sized,
{
    match api.set_ip_reverse(&id.zone, &id.id, None).await {
        Ok(_) => Ok(()),
        Err(err) if err.is_not_found() => Ok(()),
        Err(err) => Err(err.into()),
    }
}
