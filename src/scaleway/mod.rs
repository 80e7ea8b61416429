//! Minimal Scaleway REST client for the Instance and Kubernetes APIs.
//!
//! Only the handful of calls the convergence waits need are implemented.
//! Every call goes through [`ScalewayClient::send`], which authenticates the
//! request and turns non-success answers into a classified
//! [`ScalewayApiError`].

mod error;
mod instance;
mod k8s;
mod types;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ScalewayConfig;

pub use error::ScalewayApiError;
pub use instance::{FlexibleIp, InstanceIpApi};
pub use k8s::{NodeRecord, PoolApi, PoolRecord};
pub use types::{LocalityError, Region, RegionalId, Zone, ZonedId, expand_id};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const AUTH_HEADER: &str = "X-Auth-Token";

/// Future returned by Scaleway API calls.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ScalewayApiError>> + Send + 'a>>;

/// HTTP client bound to one API endpoint and secret key.
#[derive(Clone, Debug)]
pub struct ScalewayClient {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl ScalewayClient {
    /// Builds a client against `base_url` (for example
    /// `https://api.scaleway.com`).
    ///
    /// # Errors
    ///
    /// Returns [`ScalewayApiError::Transport`] when the HTTP client cannot be
    /// initialised (for example when no TLS backend is available).
    pub fn new(
        base_url: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Result<Self, ScalewayApiError> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|err| ScalewayApiError::transport(&err))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            secret_key: secret_key.into(),
        })
    }

    /// Builds a client from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ScalewayApiError::Transport`] when the HTTP client cannot be
    /// initialised.
    pub fn from_config(config: &ScalewayConfig) -> Result<Self, ScalewayApiError> {
        Self::new(&config.api_url, &config.secret_key)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{path}", self.base_url);
        debug!(%method, %url, "scaleway request");
        self.http
            .request(method, url)
            .header(AUTH_HEADER, &self.secret_key)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ScalewayApiError> {
        let response = request
            .send()
            .await
            .map_err(|err| ScalewayApiError::transport(&err))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|err| ScalewayApiError::transport(&err))?;

        if (200..300).contains(&status) {
            return serde_json::from_slice(&body).map_err(|err| ScalewayApiError::decode(&err));
        }
        Err(ScalewayApiError::from_response(status, &body))
    }
}
