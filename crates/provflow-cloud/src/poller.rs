//! Reconciliation poller
//!
//! Repeatedly fetches a resource until its status classifies as terminal, the
//! deadline passes, or the cancellation token fires. The interval is fixed;
//! these waits last minutes, so there is no backoff.

use crate::action::Operation;
use crate::error::{ApiError, PollError, ReconcileError, Result};
use crate::provider::ResourceKind;
use crate::status::{Classification, Classify};
use provflow_config::WaitSettings;
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

/// Consecutive transient fetch failures tolerated by default
pub const DEFAULT_MAX_TRANSIENT_RETRIES: u32 = 3;

/// Per-operation polling parameters
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Fixed delay between the end of one fetch and the start of the next
    pub interval: Duration,

    /// Hard upper bound on time spent polling; `None` polls until cancelled
    pub deadline: Option<Duration>,

    /// Fires on external cancellation (caller deadline, shutdown)
    pub cancel: CancellationToken,

    /// Consecutive transient fetch errors retried before giving up
    pub max_transient_retries: u32,
}

impl PollConfig {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
            cancel: CancellationToken::new(),
            max_transient_retries: DEFAULT_MAX_TRANSIENT_RETRIES,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_max_transient_retries(mut self, retries: u32) -> Self {
        self.max_transient_retries = retries;
        self
    }

    /// Build the config for `operation` on kind `K` from loaded settings.
    ///
    /// Deadlines resolve as kind override, global setting, then the kind's
    /// built-in default.
    pub fn for_kind<K: ResourceKind>(
        settings: &WaitSettings,
        operation: Operation,
        cancel: CancellationToken,
    ) -> Result<Self> {
        settings.validate()?;
        let fallback = operation.default_timeout::<K>();
        let deadline = match operation {
            Operation::Create | Operation::Await => {
                Some(settings.create_timeout(K::NAME, fallback))
            }
            Operation::Update => Some(settings.update_timeout(K::NAME, fallback)),
            Operation::Delete => settings.delete_timeout(K::NAME, fallback),
            Operation::Read => None,
        };

        let config = Self {
            interval: settings.poll_interval(),
            deadline,
            cancel,
            max_transient_retries: settings.max_transient_retries,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(ReconcileError::InvalidConfig(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        if self.deadline.is_some_and(|d| d.is_zero()) {
            return Err(ReconcileError::InvalidConfig(
                "poll deadline must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result of one poll run
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome<S> {
    /// Ready predicate matched; carries the snapshot that matched
    Ready(S),
    /// Failure predicate matched; carries the remote diagnostic
    Failed(String),
    /// The object does not exist
    Gone,
    /// Deadline elapsed while still in progress
    TimedOut,
    /// Cancellation token fired
    Cancelled,
}

impl<S> PollOutcome<S> {
    pub fn name(&self) -> &'static str {
        match self {
            PollOutcome::Ready(_) => "ready",
            PollOutcome::Failed(_) => "failed",
            PollOutcome::Gone => "gone",
            PollOutcome::TimedOut => "timed out",
            PollOutcome::Cancelled => "cancelled",
        }
    }
}

/// Polls one resource. Holds no state between runs, so independent
/// resources can be polled concurrently with separate pollers.
#[derive(Debug)]
pub struct Poller<'a> {
    config: &'a PollConfig,
    label: String,
}

impl<'a> Poller<'a> {
    pub fn new(config: &'a PollConfig) -> Self {
        Self {
            config,
            label: String::from("resource"),
        }
    }

    /// Name used in log lines (e.g. "vpc 'vpc-01'")
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Poll until terminal, deadline or cancellation.
    ///
    /// A `NotFound` fetch error classifies as [`PollOutcome::Gone`]. Transient
    /// errors are retried after one interval, up to
    /// [`PollConfig::max_transient_retries`] in a row; any other fetch error
    /// is returned immediately. No fetch starts at or after the deadline, and
    /// cancellation or the deadline abandon an in-flight fetch.
    pub async fn run<S, F, Fut, C>(
        &self,
        mut fetch: F,
        classifier: &C,
    ) -> std::result::Result<PollOutcome<S>, PollError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<S, ApiError>>,
        C: Classify<S> + ?Sized,
    {
        let config = self.config;
        let started = Instant::now();
        // a deadline past the end of the clock never expires
        let deadline_at = config.deadline.and_then(|d| started.checked_add(d));
        let mut attempt: u32 = 0;
        let mut transient_failures: u32 = 0;

        loop {
            if config.cancel.is_cancelled() {
                tracing::warn!("Polling {} cancelled", self.label);
                return Ok(PollOutcome::Cancelled);
            }
            if deadline_at.is_some_and(|at| Instant::now() >= at) {
                tracing::warn!(
                    "Polling {} timed out after {:?} ({} fetches)",
                    self.label,
                    started.elapsed(),
                    attempt
                );
                return Ok(PollOutcome::TimedOut);
            }

            attempt += 1;
            let fetched = tokio::select! {
                biased;
                _ = config.cancel.cancelled() => {
                    tracing::warn!("Polling {} cancelled during fetch {}", self.label, attempt);
                    return Ok(PollOutcome::Cancelled);
                }
                _ = sleep_until_deadline(deadline_at) => {
                    tracing::warn!(
                        "Polling {} timed out during fetch {} after {:?}",
                        self.label,
                        attempt,
                        started.elapsed()
                    );
                    return Ok(PollOutcome::TimedOut);
                }
                result = fetch() => result,
            };

            match fetched {
                Ok(snapshot) => {
                    transient_failures = 0;
                    match classifier.classify(&snapshot) {
                        Classification::Ready => {
                            tracing::debug!("{} ready after {} fetches", self.label, attempt);
                            return Ok(PollOutcome::Ready(snapshot));
                        }
                        Classification::Failed(reason) => {
                            tracing::debug!("{} failed: {}", self.label, reason);
                            return Ok(PollOutcome::Failed(reason));
                        }
                        Classification::Absent => {
                            tracing::debug!("{} reported absent", self.label);
                            return Ok(PollOutcome::Gone);
                        }
                        Classification::InProgress => {
                            tracing::debug!("{} still in progress (fetch {})", self.label, attempt);
                        }
                    }
                }
                Err(e) if e.is_not_found() => {
                    tracing::debug!("{} not found: {}", self.label, e);
                    return Ok(PollOutcome::Gone);
                }
                Err(e) if e.is_transient() => {
                    transient_failures += 1;
                    if transient_failures > config.max_transient_retries {
                        return Err(PollError::TransientExhausted {
                            attempts: transient_failures,
                            source: e,
                        });
                    }
                    tracing::warn!(
                        "Fetching {} failed ({}/{}), retrying: {}",
                        self.label,
                        transient_failures,
                        config.max_transient_retries,
                        e
                    );
                }
                Err(e) => return Err(PollError::Rejected(e)),
            }

            let wake_at = match (Instant::now().checked_add(config.interval), deadline_at) {
                (Some(next), Some(at)) => Some(next.min(at)),
                (next, at) => next.or(at),
            };
            tokio::select! {
                biased;
                _ = config.cancel.cancelled() => {
                    tracing::warn!("Polling {} cancelled while waiting", self.label);
                    return Ok(PollOutcome::Cancelled);
                }
                _ = sleep_until_deadline(wake_at) => {}
            }
        }
    }
}

async fn sleep_until_deadline(deadline_at: Option<Instant>) {
    match deadline_at {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}
