//! Resource lifecycle driver
//!
//! Wraps one resource kind's create/update/delete calls with the
//! [`Poller`] and maps each [`PollOutcome`] onto the caller's result.

use crate::action::Operation;
use crate::error::{ApiError, PollError, ReconcileError, Result};
use crate::poller::{PollConfig, PollOutcome, Poller};
use crate::provider::{ResourceApi, ResourceKind, ResourceSpec};
use crate::state::{ResourceHandle, Snapshot};
use crate::status::{Phase, StatePredicates, StatusVocabulary};
use provflow_config::WaitSettings;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Whether a mutating call waits for the remote to settle
#[derive(Debug, Clone)]
pub enum WaitPolicy {
    /// Poll until terminal, deadline or cancellation
    Wait(PollConfig),
    /// Return as soon as the remote accepts the call
    FireAndForget,
}

/// Result of a create
#[derive(Debug, Clone, PartialEq)]
pub struct Provisioned<St> {
    pub handle: ResourceHandle,
    /// Ready snapshot; `None` when the caller did not wait
    pub snapshot: Option<Snapshot<St>>,
}

/// Lifecycle driver for resource kind `K` backed by the remote API `A`
pub struct LifecycleDriver<K, A> {
    api: Arc<A>,
    _kind: PhantomData<fn() -> K>,
}

impl<K, A> Clone for LifecycleDriver<K, A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            _kind: PhantomData,
        }
    }
}

impl<K, A> LifecycleDriver<K, A>
where
    K: ResourceKind,
    A: ResourceApi<K>,
{
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            _kind: PhantomData,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Predicate set used while waiting on `operation`.
    ///
    /// Deletes classify with [`StatusVocabulary::delete_phase`] and never
    /// match ready, so an object that still exists keeps the poller waiting
    /// even if its vocabulary overrides the delete phase to ready.
    pub fn predicates(operation: Operation) -> StatePredicates<Snapshot<K::Status>> {
        let deleting = operation == Operation::Delete;
        let phase: fn(K::Status) -> Phase = if deleting {
            <K::Status as StatusVocabulary>::delete_phase
        } else {
            <K::Status as StatusVocabulary>::phase
        };
        StatePredicates::new(
            move |s: &Snapshot<K::Status>| !deleting && phase(s.status) == Phase::Ready,
            move |s: &Snapshot<K::Status>| {
                (phase(s.status) == Phase::Failed).then(|| s.failure_reason())
            },
            move |s: &Snapshot<K::Status>| phase(s.status) == Phase::Absent,
        )
    }

    /// Poll config for `operation` from loaded settings
    pub fn poll_config(
        settings: &WaitSettings,
        operation: Operation,
        cancel: CancellationToken,
    ) -> Result<PollConfig> {
        PollConfig::for_kind::<K>(settings, operation, cancel)
    }

    /// Create a resource, optionally waiting until it is ready.
    ///
    /// On timeout or cancellation the returned error still carries the
    /// handle: the remote is likely still provisioning. On a terminal failure
    /// the failed object may still exist and need an explicit delete.
    pub async fn create(
        &self,
        spec: &ResourceSpec,
        policy: &WaitPolicy,
    ) -> Result<Provisioned<K::Status>> {
        tracing::info!("Creating {}: {}", K::NAME, spec.name);

        let handle = self
            .api
            .create(spec)
            .await
            .map_err(|source| api_error::<K>(Operation::Create, source))?;

        if handle.is_empty() {
            return Err(api_error::<K>(
                Operation::Create,
                ApiError::Rejected("remote returned an empty id".to_string()),
            ));
        }

        tracing::info!("{} {} accepted with id {}", K::NAME, spec.name, handle);

        let snapshot = match policy {
            WaitPolicy::FireAndForget => None,
            WaitPolicy::Wait(config) => {
                Some(self.wait_ready(&handle, config, Operation::Create).await?)
            }
        };

        Ok(Provisioned { handle, snapshot })
    }

    /// Wait for an existing resource to become ready.
    ///
    /// Used to resume after an earlier create or update timed out.
    pub async fn await_ready(
        &self,
        handle: &ResourceHandle,
        config: &PollConfig,
    ) -> Result<Snapshot<K::Status>> {
        if handle.is_empty() {
            return Err(ReconcileError::NotFound {
                kind: K::NAME,
                handle: handle.clone(),
            });
        }
        self.wait_ready(handle, config, Operation::Await).await
    }

    /// Update a resource, optionally waiting until it settles
    pub async fn update(
        &self,
        handle: &ResourceHandle,
        changes: &serde_json::Value,
        policy: &WaitPolicy,
    ) -> Result<Option<Snapshot<K::Status>>> {
        if handle.is_empty() {
            return Err(ReconcileError::NotFound {
                kind: K::NAME,
                handle: handle.clone(),
            });
        }

        tracing::info!("Updating {} {}", K::NAME, handle);

        match self.api.update(handle, changes).await {
            Ok(()) => {}
            Err(ApiError::NotFound(_)) => {
                return Err(ReconcileError::NotFound {
                    kind: K::NAME,
                    handle: handle.clone(),
                });
            }
            Err(source) => return Err(api_error::<K>(Operation::Update, source)),
        }

        match policy {
            WaitPolicy::FireAndForget => Ok(None),
            WaitPolicy::Wait(config) => self
                .wait_ready(handle, config, Operation::Update)
                .await
                .map(Some),
        }
    }

    /// Delete a resource. Idempotent: an object that is already gone counts
    /// as deleted.
    ///
    /// The handle is cleared once deletion is confirmed. A fire-and-forget
    /// delete leaves it set; the next [`Self::read`] clears it.
    pub async fn delete(&self, handle: &mut ResourceHandle, policy: &WaitPolicy) -> Result<()> {
        if handle.is_empty() {
            tracing::debug!("{} has no id, nothing to delete", K::NAME);
            return Ok(());
        }

        tracing::info!("Deleting {} {}", K::NAME, handle);

        match self.api.delete(handle).await {
            Ok(()) => {}
            Err(ApiError::NotFound(_)) => {
                tracing::info!("{} {} already gone", K::NAME, handle);
                handle.clear();
                return Ok(());
            }
            Err(source) => return Err(api_error::<K>(Operation::Delete, source)),
        }

        let WaitPolicy::Wait(config) = policy else {
            return Ok(());
        };

        config.validate()?;
        let started = Instant::now();
        let predicates = Self::predicates(Operation::Delete);
        let api = &*self.api;
        let id: &ResourceHandle = handle;
        let outcome = Poller::new(config)
            .with_label(format!("{} '{}'", K::NAME, id))
            .run(move || api.get(id), &predicates)
            .await
            .map_err(|e| poll_error::<K>(id, Operation::Delete, e))?;

        match outcome {
            PollOutcome::Gone => {
                tracing::info!("{} {} deleted", K::NAME, handle);
                handle.clear();
                Ok(())
            }
            // delete predicates never classify ready; an existing object is not deleted
            PollOutcome::Ready(snapshot) => Err(ReconcileError::TerminalFailure {
                kind: K::NAME,
                handle: handle.clone(),
                operation: Operation::Delete,
                reason: format!("remote still reports '{}'", snapshot.status),
            }),
            PollOutcome::Failed(reason) => Err(ReconcileError::TerminalFailure {
                kind: K::NAME,
                handle: handle.clone(),
                operation: Operation::Delete,
                reason,
            }),
            PollOutcome::TimedOut => Err(ReconcileError::Timeout {
                kind: K::NAME,
                handle: handle.clone(),
                operation: Operation::Delete,
                waited: started.elapsed(),
            }),
            PollOutcome::Cancelled => Err(ReconcileError::Cancelled {
                kind: K::NAME,
                handle: handle.clone(),
                operation: Operation::Delete,
            }),
        }
    }

    /// Single fetch for a refresh cycle.
    ///
    /// Returns `Ok(None)` and clears the handle when the object is absent.
    /// Transport and auth errors are returned with the handle untouched so a
    /// later read can retry.
    pub async fn read(&self, handle: &mut ResourceHandle) -> Result<Option<Snapshot<K::Status>>> {
        if handle.is_empty() {
            return Ok(None);
        }

        match self.api.get(handle).await {
            Ok(snapshot) if snapshot.phase() == Phase::Absent => {
                tracing::info!(
                    "{} {} reported {}, clearing local id",
                    K::NAME,
                    handle,
                    snapshot.status
                );
                handle.clear();
                Ok(None)
            }
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(ApiError::NotFound(_)) => {
                tracing::info!("{} {} not found, clearing local id", K::NAME, handle);
                handle.clear();
                Ok(None)
            }
            Err(source) if source.is_transient() => Err(ReconcileError::Transport {
                kind: K::NAME,
                handle: handle.clone(),
                attempts: 1,
                source,
            }),
            Err(source) => Err(api_error::<K>(Operation::Read, source)),
        }
    }

    async fn wait_ready(
        &self,
        handle: &ResourceHandle,
        config: &PollConfig,
        operation: Operation,
    ) -> Result<Snapshot<K::Status>> {
        config.validate()?;
        let started = Instant::now();
        let predicates = Self::predicates(operation);
        let api = &*self.api;
        let outcome = Poller::new(config)
            .with_label(format!("{} '{}'", K::NAME, handle))
            .run(move || api.get(handle), &predicates)
            .await
            .map_err(|e| poll_error::<K>(handle, operation, e))?;

        match outcome {
            PollOutcome::Ready(snapshot) => {
                tracing::info!(
                    "{} {} is {} after {:?}",
                    K::NAME,
                    handle,
                    snapshot.status,
                    started.elapsed()
                );
                Ok(snapshot)
            }
            PollOutcome::Failed(reason) => {
                tracing::warn!("{} {} failed during {}: {}", K::NAME, handle, operation, reason);
                Err(ReconcileError::TerminalFailure {
                    kind: K::NAME,
                    handle: handle.clone(),
                    operation,
                    reason,
                })
            }
            PollOutcome::Gone if operation == Operation::Await => Err(ReconcileError::NotFound {
                kind: K::NAME,
                handle: handle.clone(),
            }),
            PollOutcome::Gone => Err(ReconcileError::Disappeared {
                kind: K::NAME,
                handle: handle.clone(),
                operation,
            }),
            PollOutcome::TimedOut => Err(ReconcileError::Timeout {
                kind: K::NAME,
                handle: handle.clone(),
                operation,
                waited: started.elapsed(),
            }),
            PollOutcome::Cancelled => Err(ReconcileError::Cancelled {
                kind: K::NAME,
                handle: handle.clone(),
                operation,
            }),
        }
    }
}

fn api_error<K: ResourceKind>(operation: Operation, source: ApiError) -> ReconcileError {
    ReconcileError::Api {
        kind: K::NAME,
        operation,
        source,
    }
}

fn poll_error<K: ResourceKind>(
    handle: &ResourceHandle,
    operation: Operation,
    error: PollError,
) -> ReconcileError {
    match error {
        PollError::TransientExhausted { attempts, source } => ReconcileError::Transport {
            kind: K::NAME,
            handle: handle.clone(),
            attempts,
            source,
        },
        PollError::Rejected(source) => api_error::<K>(operation, source),
    }
}
