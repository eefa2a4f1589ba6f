//! Deployable identities and state snapshots.

use crate::{PublishState, RunState, ServerHandle};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A value in a deployable's open `options` map.
///
/// The schema is server-type specific, so any JSON value is accepted and
/// re-encoded unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Null,
    Bool(bool),
    Integer(i64),
    /// Integers above `i64::MAX`.
    UInt(u64),
    Float(f64),
    String(String),
    Array(Vec<OptionValue>),
    Map(BTreeMap<String, OptionValue>),
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for OptionValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for OptionValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

/// A deployable unit within a server's scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployableReference {
    /// Human-readable name.
    pub label: String,
    /// Server-scoped location; not globally unique.
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<BTreeMap<String, OptionValue>>,
}

impl DeployableReference {
    pub fn new(label: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            path: path.into(),
            options: None,
        }
    }

    /// Add one option entry.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.options
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn option(&self, key: &str) -> Option<&OptionValue> {
        self.options.as_ref()?.get(key)
    }
}

/// Tracking key of a deployable: `(server id, path)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployableKey {
    pub server_id: String,
    pub path: String,
}

impl DeployableKey {
    pub fn new(server_id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            server_id: server_id.into(),
            path: path.into(),
        }
    }

    /// Reject keys with an empty component.
    pub fn validate(&self) -> Result<(), InvalidIdentity> {
        if self.server_id.is_empty() {
            return Err(InvalidIdentity::EmptyServerId);
        }
        if self.path.is_empty() {
            return Err(InvalidIdentity::EmptyPath(self.server_id.clone()));
        }
        Ok(())
    }
}

impl fmt::Display for DeployableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.server_id, self.path)
    }
}

/// Snapshot of one deployable's status on one server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployableState {
    pub server: ServerHandle,
    pub reference: DeployableReference,
    pub state: RunState,
    pub publish_state: PublishState,
}

impl DeployableState {
    pub fn new(
        server: ServerHandle,
        reference: DeployableReference,
        state: RunState,
        publish_state: PublishState,
    ) -> Self {
        Self {
            server,
            reference,
            state,
            publish_state,
        }
    }

    pub fn key(&self) -> DeployableKey {
        DeployableKey::new(&self.server.id, &self.reference.path)
    }

    pub fn server_id(&self) -> &str {
        &self.server.id
    }

    pub fn path(&self) -> &str {
        &self.reference.path
    }

    /// The tracking key, if both components are non-empty.
    pub fn validated_key(&self) -> Result<DeployableKey, InvalidIdentity> {
        let key = self.key();
        key.validate()?;
        Ok(key)
    }
}

/// A write carried identity fields that cannot form a tracking key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidIdentity {
    #[error("server id cannot be empty")]
    EmptyServerId,
    #[error("deployable path cannot be empty (server {0})")]
    EmptyPath(String),
    #[error("deployable {path} reports server {found}, expected {expected}")]
    ServerMismatch {
        expected: String,
        found: String,
        path: String,
    },
}
