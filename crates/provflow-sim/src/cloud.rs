//! Simulated control plane
//!
//! Objects advance one scripted status per fetch. Creates and updates follow
//! their script and then stay on its last status; a delete plays the delete
//! script and then the object is purged (fetches return `NotFound`).

use crate::error::{Result, SimError};
use async_trait::async_trait;
use provflow_cloud::{
    ApiError, ApiResult, Phase, ResourceApi, ResourceHandle, ResourceKind, ResourceSpec, Snapshot,
    StatusVocabulary,
};
use std::collections::{HashMap, VecDeque};
use std::marker::PhantomData;
use std::time::Duration;
use tokio::sync::Mutex;

/// Fault applied to the next fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// The fetch fails with this error
    Error(ApiError),
    /// The fetch never completes
    Hang,
}

/// A mutating call received by the simulator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create(String),
    Update(ResourceHandle),
    Delete(ResourceHandle),
}

struct SimObject<St> {
    script: Vec<St>,
    cursor: usize,
    deleting: bool,
    attributes: HashMap<String, serde_json::Value>,
}

impl<St: StatusVocabulary> SimObject<St> {
    fn play(&mut self, script: Vec<St>) {
        self.script = script;
        self.cursor = 0;
    }

    /// Next status, or `None` once a delete script has run out
    fn advance(&mut self) -> Option<St> {
        let status = match self.script.get(self.cursor) {
            Some(status) => *status,
            None if self.deleting => return None,
            None => *self.script.last()?,
        };
        self.cursor += 1;
        Some(status)
    }
}

struct CloudState<St> {
    next_id: u64,
    objects: HashMap<ResourceHandle, SimObject<St>>,
    fetches: HashMap<ResourceHandle, u32>,
    faults: VecDeque<Fault>,
    create_rejections: VecDeque<String>,
    calls: Vec<Call>,
}

/// In-memory [`ResourceApi`] for resource kind `K`
pub struct SimulatedCloud<K: ResourceKind> {
    state: Mutex<CloudState<K::Status>>,
    create_script: Vec<K::Status>,
    update_script: Vec<K::Status>,
    delete_script: Vec<K::Status>,
    failure_message: Option<String>,
    latency: Duration,
    _kind: PhantomData<fn() -> K>,
}

impl<K: ResourceKind> SimulatedCloud<K> {
    /// Simulator whose created objects play `create_script`
    pub fn new(create_script: impl IntoIterator<Item = K::Status>) -> Result<Self> {
        let create_script: Vec<_> = create_script.into_iter().collect();
        if create_script.is_empty() {
            return Err(SimError::EmptyScript(K::NAME));
        }

        Ok(Self {
            state: Mutex::new(CloudState {
                next_id: 1,
                objects: HashMap::new(),
                fetches: HashMap::new(),
                faults: VecDeque::new(),
                create_rejections: VecDeque::new(),
                calls: Vec::new(),
            }),
            create_script,
            update_script: Vec::new(),
            delete_script: Vec::new(),
            failure_message: None,
            latency: Duration::ZERO,
            _kind: PhantomData,
        })
    }

    /// Script played after an update; empty keeps the current status
    pub fn with_update_statuses(mut self, script: impl IntoIterator<Item = K::Status>) -> Self {
        self.update_script = script.into_iter().collect();
        self
    }

    /// Script played after a delete, before the object is purged
    pub fn with_delete_statuses(mut self, script: impl IntoIterator<Item = K::Status>) -> Self {
        self.delete_script = script.into_iter().collect();
        self
    }

    /// Message attached to snapshots whose status is a failure
    pub fn with_failure_message(mut self, message: impl Into<String>) -> Self {
        self.failure_message = Some(message.into());
        self
    }

    /// Delay applied to every call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Queue faults for the following fetches, in order
    pub async fn inject(&self, faults: impl IntoIterator<Item = Fault>) {
        self.state.lock().await.faults.extend(faults);
    }

    /// Reject the next create call
    pub async fn reject_next_create(&self, reason: impl Into<String>) {
        self.state
            .lock()
            .await
            .create_rejections
            .push_back(reason.into());
    }

    /// Number of fetches issued against `handle`, including failed ones
    pub async fn fetch_count(&self, handle: &ResourceHandle) -> u32 {
        self.state
            .lock()
            .await
            .fetches
            .get(handle)
            .copied()
            .unwrap_or(0)
    }

    /// Every mutating call received, in order
    pub async fn calls(&self) -> Vec<Call> {
        self.state.lock().await.calls.clone()
    }

    /// Whether the simulator still holds an object for `handle`
    pub async fn exists(&self, handle: &ResourceHandle) -> bool {
        self.state.lock().await.objects.contains_key(handle)
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn not_found(handle: &ResourceHandle) -> ApiError {
        ApiError::NotFound(format!("{} '{}'", K::NAME, handle))
    }
}

#[async_trait]
impl<K: ResourceKind> ResourceApi<K> for SimulatedCloud<K> {
    async fn create(&self, spec: &ResourceSpec) -> ApiResult<ResourceHandle> {
        self.delay().await;
        let mut state = self.state.lock().await;
        state.calls.push(Call::Create(spec.name.clone()));

        if let Some(reason) = state.create_rejections.pop_front() {
            tracing::debug!("sim: rejecting create of {} {}", K::NAME, spec.name);
            return Err(ApiError::Rejected(reason));
        }

        let handle = ResourceHandle::new(format!("{}-{:06}", K::NAME, state.next_id));
        state.next_id += 1;

        let mut attributes = HashMap::new();
        attributes.insert("name".to_string(), serde_json::json!(spec.name));
        if let Some(config) = spec.config.as_object() {
            attributes.extend(config.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        state.objects.insert(
            handle.clone(),
            SimObject {
                script: self.create_script.clone(),
                cursor: 0,
                deleting: false,
                attributes,
            },
        );

        tracing::debug!("sim: created {}", handle);
        Ok(handle)
    }

    async fn get(&self, handle: &ResourceHandle) -> ApiResult<Snapshot<K::Status>> {
        self.delay().await;
        let mut state = self.state.lock().await;
        *state.fetches.entry(handle.clone()).or_insert(0) += 1;

        match state.faults.pop_front() {
            Some(Fault::Error(error)) => {
                tracing::debug!("sim: fetch of {} fails: {}", handle, error);
                return Err(error);
            }
            Some(Fault::Hang) => {
                tracing::debug!("sim: fetch of {} hangs", handle);
                drop(state);
                return std::future::pending().await;
            }
            None => {}
        }

        let Some(object) = state.objects.get_mut(handle) else {
            return Err(Self::not_found(handle));
        };

        let Some(status) = object.advance() else {
            state.objects.remove(handle);
            tracing::debug!("sim: {} purged", handle);
            return Err(Self::not_found(handle));
        };

        let mut snapshot = Snapshot::new(handle.clone(), status);
        snapshot.attributes = object.attributes.clone();
        if status.phase() == Phase::Failed {
            if let Some(message) = &self.failure_message {
                snapshot = snapshot.with_message(message.clone());
            }
        }
        Ok(snapshot)
    }

    async fn update(&self, handle: &ResourceHandle, changes: &serde_json::Value) -> ApiResult<()> {
        self.delay().await;
        let mut state = self.state.lock().await;
        state.calls.push(Call::Update(handle.clone()));

        let object = match state.objects.get_mut(handle) {
            Some(object) if !object.deleting => object,
            _ => return Err(Self::not_found(handle)),
        };

        if let Some(changes) = changes.as_object() {
            object
                .attributes
                .extend(changes.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        if !self.update_script.is_empty() {
            object.play(self.update_script.clone());
        }
        Ok(())
    }

    async fn delete(&self, handle: &ResourceHandle) -> ApiResult<()> {
        self.delay().await;
        let mut state = self.state.lock().await;
        state.calls.push(Call::Delete(handle.clone()));

        let Some(object) = state.objects.get_mut(handle) else {
            return Err(Self::not_found(handle));
        };

        // a repeated delete while one is in flight is accepted as-is
        if !object.deleting {
            object.deleting = true;
            object.play(self.delete_script.clone());
        }
        Ok(())
    }
}
