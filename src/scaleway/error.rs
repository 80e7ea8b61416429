//! Error type for Scaleway API calls.

use serde::Deserialize;
use thiserror::Error;

use crate::converge::{Classify, ErrorClass};

/// Errors raised by the Scaleway API client.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ScalewayApiError {
    /// The API answered with a non-success status.
    #[error("scaleway api returned {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the error body, or the raw body.
        message: String,
    },
    /// The request never produced a response (connect, TLS, timeout).
    #[error("request to scaleway failed: {message}")]
    Transport {
        /// Message from the HTTP client.
        message: String,
    },
    /// The response body did not match the expected shape.
    #[error("unexpected scaleway response: {message}")]
    Decode {
        /// Decoder message.
        message: String,
    },
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

impl ScalewayApiError {
    /// Builds an [`ScalewayApiError::Http`] from a status and response body.
    #[must_use]
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<ApiErrorBody>(body)
            .ok()
            .and_then(|parsed| match (parsed.message, parsed.kind) {
                (Some(message), Some(kind)) => Some(format!("{message} ({kind})")),
                (Some(message), None) => Some(message),
                (None, kind) => kind,
            })
            .unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_owned());
        Self::Http { status, message }
    }

    pub(crate) fn transport(err: &reqwest::Error) -> Self {
        Self::Transport {
            message: err.to_string(),
        }
    }

    pub(crate) fn decode(err: &serde_json::Error) -> Self {
        Self::Decode {
            message: err.to_string(),
        }
    }

    /// Returns `true` when the error means the resource is gone.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.class() == ErrorClass::NotFound
    }
}

impl Classify for ScalewayApiError {
    fn class(&self) -> ErrorClass {
        match self {
            // The Instance API answers 403 for IPs that have been deleted.
            Self::Http {
                status: 403 | 404, ..
            } => ErrorClass::NotFound,
            Self::Http {
                status: 408 | 425 | 429 | 500..=599,
                ..
            }
            | Self::Transport { .. } => ErrorClass::Transient,
            Self::Http { .. } | Self::Decode { .. } => ErrorClass::Permanent,
        }
    }
}
