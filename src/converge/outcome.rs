//! Poll outcomes, query error classification, and caller-facing errors.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// How a failed remote read should be treated by the poller.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    /// Network blip, throttling, 5xx, or a value that has not propagated
    /// yet. Polling continues.
    Transient,
    /// The resource does not exist (or the API pretends it does not, as the
    /// Instance API does with 403 for deleted IPs).
    NotFound,
    /// Anything else: bad request, denied, undecodable body.
    Permanent,
}

impl ErrorClass {
    /// Returns `true` when the poller should keep going after this error.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Transient)
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Transient => "transient",
            Self::NotFound => "not found",
            Self::Permanent => "permanent",
        };
        f.write_str(label)
    }
}

/// Implemented by remote-read errors so the poller can decide whether to
/// retry without knowing anything about the transport.
pub trait Classify {
    /// Classifies this error.
    fn class(&self) -> ErrorClass;
}

/// Why a poll ended in [`PollOutcome::Failed`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PollFailure<E> {
    /// The query returned a not-found or permanent error.
    Query(E),
    /// The condition observed a state that can never converge.
    Terminal(String),
    /// The enclosing operation was cancelled.
    Cancelled,
}

/// Tri-state result of a convergence wait.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PollOutcome<S, E> {
    /// The condition held for `state`, observed on attempt `attempts`.
    Satisfied {
        /// First state for which the condition held.
        state: S,
        /// Number of queries issued, including the satisfying one.
        attempts: u32,
    },
    /// The deadline elapsed before the condition held.
    TimedOut {
        /// Last successfully observed state, if any query succeeded.
        last: Option<S>,
        /// Number of queries issued.
        attempts: u32,
        /// Time spent polling.
        waited: Duration,
    },
    /// The poll was aborted before the deadline.
    Failed {
        /// Reason for aborting.
        failure: PollFailure<E>,
        /// Last successfully observed state, if any query succeeded.
        last: Option<S>,
        /// Number of queries issued.
        attempts: u32,
    },
}

impl<S, E> PollOutcome<S, E> {
    /// Number of queries issued before the poll returned.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Satisfied { attempts, .. }
            | Self::TimedOut { attempts, .. }
            | Self::Failed { attempts, .. } => *attempts,
        }
    }

    /// Returns `true` when the deadline elapsed without convergence.
    #[must_use]
    pub const fn is_timed_out(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }

    /// Returns `true` when the condition held.
    #[must_use]
    pub const fn is_satisfied(&self) -> bool {
        matches!(self, Self::Satisfied { .. })
    }

    /// The satisfying state or, for the other outcomes, the last observed
    /// one.
    #[must_use]
    pub const fn last_state(&self) -> Option<&S> {
        match self {
            Self::Satisfied { state, .. } => Some(state),
            Self::TimedOut { last, .. } | Self::Failed { last, .. } => last.as_ref(),
        }
    }

    /// Converts the outcome into a `Result`, rendering diagnostics for the
    /// condition named `condition`.
    ///
    /// # Errors
    ///
    /// Returns [`ConvergeError::Timeout`] when the deadline elapsed,
    /// [`ConvergeError::Terminal`] when the condition reported a terminal
    /// state, [`ConvergeError::Query`] when the query failed permanently, and
    /// [`ConvergeError::Cancelled`] when the wait was aborted.
    pub fn into_result(self, condition: &str) -> Result<S, ConvergeError>
    where
        S: fmt::Display,
        E: fmt::Display + Classify,
    {
        match self {
            Self::Satisfied { state, .. } => Ok(state),
            Self::TimedOut {
                last,
                attempts,
                waited,
            } => Err(ConvergeError::Timeout {
                condition: condition.to_owned(),
                waited,
                attempts,
                last_observed: render_last(last.as_ref()),
            }),
            Self::Failed { failure, last, .. } => Err(match failure {
                PollFailure::Query(err) => ConvergeError::Query {
                    condition: condition.to_owned(),
                    class: err.class(),
                    message: err.to_string(),
                },
                PollFailure::Terminal(reason) => ConvergeError::Terminal {
                    condition: condition.to_owned(),
                    reason,
                    last_observed: render_last(last.as_ref()),
                },
                PollFailure::Cancelled => ConvergeError::Cancelled {
                    condition: condition.to_owned(),
                },
            }),
        }
    }
}

fn render_last<S: fmt::Display>(last: Option<&S>) -> String {
    last.map_or_else(|| String::from("nothing observed"), ToString::to_string)
}

/// Caller-facing convergence failure.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ConvergeError {
    /// The condition never held before the deadline.
    #[error(
        "{condition} did not converge within {waited:?} ({attempts} attempts); last observed: {last_observed}"
    )]
    Timeout {
        /// Name of the condition being waited on.
        condition: String,
        /// Time spent polling.
        waited: Duration,
        /// Number of queries issued.
        attempts: u32,
        /// Rendering of the last observed state.
        last_observed: String,
    },
    /// The resource reached a state from which it cannot converge.
    #[error("{condition} cannot converge: {reason}; last observed: {last_observed}")]
    Terminal {
        /// Name of the condition being waited on.
        condition: String,
        /// Reason reported by the condition.
        reason: String,
        /// Rendering of the last observed state.
        last_observed: String,
    },
    /// The remote read failed with a non-retryable error.
    #[error("query for {condition} failed ({class}): {message}")]
    Query {
        /// Name of the condition being waited on.
        condition: String,
        /// Classification reported by the remote-read adapter.
        class: ErrorClass,
        /// Error message from the remote-read adapter.
        message: String,
    },
    /// The enclosing operation was cancelled mid-wait.
    #[error("wait for {condition} was cancelled")]
    Cancelled {
        /// Name of the condition being waited on.
        condition: String,
    },
}

impl ConvergeError {
    /// Returns `true` for [`ConvergeError::Timeout`].
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
