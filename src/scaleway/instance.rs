//! Flexible IP calls on the Instance API.

use std::fmt;
use std::net::IpAddr;

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::{ApiFuture, ScalewayClient, Zone};

/// Flexible IP as returned by `GET /instance/v1/zones/{zone}/ips/{ip}`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct FlexibleIp {
    /// IP identifier (UUID).
    pub id: String,
    /// Public address.
    pub address: IpAddr,
    /// Reverse DNS currently configured, if any.
    #[serde(default)]
    pub reverse: Option<String>,
}

impl fmt::Display for FlexibleIp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ip {} ({}) reverse {}",
            self.id,
            self.address,
            self.reverse.as_deref().unwrap_or("<unset>")
        )
    }
}

#[derive(Deserialize)]
struct IpEnvelope {
    ip: FlexibleIp,
}

#[derive(Serialize)]
struct UpdateReverseRequest<'a> {
    // Serialised even when `None`: `"reverse": null` clears the record.
    reverse: Option<&'a str>,
}

/// Instance API calls used by the reverse-DNS resource.
pub trait InstanceIpApi {
    /// Fetches a flexible IP by identifier or by address.
    fn get_ip<'a>(&'a self, zone: &'a Zone, ip: &'a str) -> ApiFuture<'a, FlexibleIp>;

    /// Sets (`Some`) or clears (`None`) the reverse DNS of an IP.
    fn set_ip_reverse<'a>(
        &'a self,
        zone: &'a Zone,
        ip_id: &'a str,
        reverse: Option<&'a str>,
    ) -> ApiFuture<'a, FlexibleIp>;
}

fn ip_path(zone: &Zone, ip: &str) -> String {
    format!("/instance/v1/zones/{zone}/ips/{ip}")
}

impl InstanceIpApi for ScalewayClient {
    fn get_ip<'a>(&'a self, zone: &'a Zone, ip: &'a str) -> ApiFuture<'a, FlexibleIp> {
        Box::pin(async move {
            let envelope: IpEnvelope = self
                .send(self.request(Method::GET, &ip_path(zone, ip)))
                .await?;
            Ok(envelope.ip)
        })
    }

    fn set_ip_reverse<'a>(
        &'a self,
        zone: &'a Zone,
        ip_id: &'a str,
        reverse: Option<&'a str>,
    ) -> ApiFuture<'a, FlexibleIp> {
        Box::pin(async move {
            let request = self
                .request(Method::PATCH, &ip_path(zone, ip_id))
                .json(&UpdateReverseRequest { reverse });
            let envelope: IpEnvelope = self.send(request).await?;
            Ok(envelope.ip)
        })
    }
}
