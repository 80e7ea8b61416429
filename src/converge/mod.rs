//! Deadline-bounded convergence polling.
//!
//! Scaleway create/update calls return once a change is *accepted*, not once
//! it is *applied*. [`Poller`] re-reads the remote resource until a
//! [`Condition`] holds, the condition reports a terminal state, a
//! non-retryable error comes back, the deadline elapses, or the enclosing
//! operation is cancelled. It spawns nothing and keeps no state beyond the
//! call.

mod condition;
mod outcome;

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub use condition::{Condition, Predicate, Verdict};
pub use outcome::{Classify, ConvergeError, ErrorClass, PollFailure, PollOutcome};

/// Shortest pause between two queries, whatever the interval says.
pub const MIN_DELAY: Duration = Duration::from_millis(1);

// Stand-in deadline for waits too long to represent as an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Delay between two consecutive queries.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Interval {
    /// Constant delay.
    Fixed(Duration),
    /// Delay starting at `initial`, multiplied by `factor` after each
    /// pending attempt and capped at `max`. A factor below 1 counts as 1.
    Backoff {
        /// First delay.
        initial: Duration,
        /// Upper bound for the delay.
        max: Duration,
        /// Growth factor applied after each attempt.
        factor: u32,
    },
}

impl Interval {
    fn first(&self) -> Duration {
        let delay = match self {
            Self::Fixed(delay) => *delay,
            Self::Backoff { initial, .. } => *initial,
        };
        delay.max(MIN_DELAY)
    }

    fn next(&self, current: Duration) -> Duration {
        let delay = match self {
            Self::Fixed(delay) => *delay,
            Self::Backoff { max, factor, .. } => {
                current.saturating_mul((*factor).max(1)).min(*max)
            }
        };
        delay.max(MIN_DELAY)
    }
}

/// Polls a remote read until a condition converges or the wait is given up.
#[derive(Clone, Debug)]
pub struct Poller {
    max_wait: Duration,
    interval: Interval,
    cancel: Option<CancellationToken>,
}

impl Poller {
    /// Builds a poller with a fixed interval.
    #[must_use]
    pub const fn new(max_wait: Duration, interval: Duration) -> Self {
        Self {
            max_wait,
            interval: Interval::Fixed(interval),
            cancel: None,
        }
    }

    /// Replaces the maximum wait.
    #[must_use]
    pub const fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Replaces the polling interval.
    #[must_use]
    pub const fn with_interval(mut self, interval: Interval) -> Self {
        self.interval = interval;
        self
    }

    /// Ties the poller to the enclosing operation's cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Maximum time the poller waits for convergence.
    #[must_use]
    pub const fn max_wait(&self) -> Duration {
        self.max_wait
    }

    /// Configured polling interval.
    #[must_use]
    pub const fn interval(&self) -> Interval {
        self.interval
    }

    /// Polls `query` until `condition` converges.
    ///
    /// Transient query errors count as "not yet". Not-found and permanent
    /// errors end the poll on the attempt that produced them. The final query
    /// is issued at or before the deadline; the call returns at most one
    /// query round trip after it. Pauses never drop below [`MIN_DELAY`], and a
    /// wait too long to represent is treated as practically unbounded.
    pub async fn poll<S, E, C, Q, Fut>(&self, condition: &C, mut query: Q) -> PollOutcome<S, E>
    where
        C: Condition<S> + ?Sized,
        E: Classify + fmt::Display,
        Q: FnMut() -> Fut,
        Fut: Future<Output = Result<S, E>>,
    {
        let name = condition.describe();
        let cancel = self.cancel.clone().unwrap_or_default();
        let started = Instant::now();
        let deadline = started
            .checked_add(self.max_wait)
            .unwrap_or_else(|| started + FAR_FUTURE);
        let mut delay = self.interval.first();
        let mut attempts: u32 = 0;
        let mut last: Option<S> = None;

        loop {
            let result = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!(condition = %name, attempts, "poll cancelled during query");
                    return PollOutcome::Failed { failure: PollFailure::Cancelled, last, attempts };
                }
                result = query() => result,
            };
            attempts = attempts.saturating_add(1);

            match result {
                Ok(state) => match condition.evaluate(&state) {
                    Verdict::Satisfied => {
                        info!(condition = %name, attempts, "condition converged");
                        return PollOutcome::Satisfied { state, attempts };
                    }
                    Verdict::Failed(reason) => {
                        warn!(condition = %name, attempts, %reason, "condition reached a terminal state");
                        return PollOutcome::Failed {
                            failure: PollFailure::Terminal(reason),
                            last: Some(state),
                            attempts,
                        };
                    }
                    Verdict::Pending => {
                        debug!(condition = %name, attempts, "condition pending");
                        last = Some(state);
                    }
                },
                Err(err) if err.class().is_retryable() => {
                    debug!(condition = %name, attempts, error = %err, "transient query error");
                }
                Err(err) => {
                    warn!(condition = %name, attempts, error = %err, class = %err.class(), "query failed");
                    return PollOutcome::Failed {
                        failure: PollFailure::Query(err),
                        last,
                        attempts,
                    };
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return Self::timed_out(&name, last, attempts, started);
            }

            let pause = delay.min(deadline.saturating_duration_since(now));
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!(condition = %name, attempts, "poll cancelled while sleeping");
                    return PollOutcome::Failed { failure: PollFailure::Cancelled, last, attempts };
                }
                () = sleep(pause) => {}
            }

            if Instant::now() >= deadline {
                return Self::timed_out(&name, last, attempts, started);
            }
            delay = self.interval.next(delay);
        }
    }

    /// Polls and converts the outcome into a `Result` carrying diagnostics.
    ///
    /// # Errors
    ///
    /// Returns [`ConvergeError`] for every outcome other than
    /// [`PollOutcome::Satisfied`].
    pub async fn converge<S, E, C, Q, Fut>(&self, condition: &C, query: Q) -> Result<S, ConvergeError>
    where
        S: fmt::Display,
        C: Condition<S> + ?Sized,
        E: Classify + fmt::Display,
        Q: FnMut() -> Fut,
        Fut: Future<Output = Result<S, E>>,
    {
        self.poll(condition, query)
            .await
            .into_result(&condition.describe())
    }

    fn timed_out<S, E>(
        name: &str,
        last: Option<S>,
        attempts: u32,
        started: Instant,
    ) -> PollOutcome<S, E> {
        let waited = started.elapsed();
        warn!(condition = %name, attempts, ?waited, "condition did not converge before the deadline");
        PollOutcome::TimedOut {
            last,
            attempts,
            waited,
        }
    }
}
