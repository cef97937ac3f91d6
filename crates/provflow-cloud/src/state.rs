//! Remote identity and fetched state

use crate::status::{Phase, StatusVocabulary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque identity assigned by the remote system on creation.
///
/// Set once when the remote create call returns and never changed after
/// that; the driver clears it (leaves it empty) once deletion or absence is
/// confirmed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceHandle(String);

impl ResourceHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.0.clear();
    }
}

impl std::fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceHandle {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ResourceHandle {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Current-state record returned by a fetch
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<St> {
    /// Remote identity
    pub id: ResourceHandle,

    /// Reported status
    pub status: St,

    /// Diagnostic accompanying the status (failure reason etc.)
    pub status_message: Option<String>,

    /// Resource attributes (endpoint, CIDR, size, ...)
    pub attributes: HashMap<String, serde_json::Value>,

    /// When the remote last changed this object
    pub updated_at: DateTime<Utc>,
}

impl<St: StatusVocabulary> Snapshot<St> {
    pub fn new(id: impl Into<ResourceHandle>, status: St) -> Self {
        Self {
            id: id.into(),
            status,
            status_message: None,
            attributes: HashMap::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.status_message = Some(message.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = updated_at;
        self
    }

    pub fn get_attribute<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.attributes
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn phase(&self) -> Phase {
        self.status.phase()
    }

    /// Diagnostic to surface when this snapshot is a terminal failure.
    ///
    /// The remote message is passed through verbatim when present.
    pub fn failure_reason(&self) -> String {
        match &self.status_message {
            Some(message) if !message.is_empty() => message.clone(),
            _ => format!("remote reported status '{}'", self.status),
        }
    }
}
