//! Transitions detected by the store and the events built from them.

use rsp_core::{DeployableKey, DeployableState};
use serde::Serialize;

/// What changed between two snapshots of the same deployable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Only the lifecycle code differs.
    StateChanged,
    /// Only the publish code differs.
    PublishStateChanged,
    Both,
}

impl ChangeKind {
    /// Classify a pair of snapshots; `None` when neither code differs.
    pub fn between(previous: &DeployableState, current: &DeployableState) -> Option<Self> {
        let state = previous.state != current.state;
        let publish = previous.publish_state != current.publish_state;
        match (state, publish) {
            (true, true) => Some(Self::Both),
            (true, false) => Some(Self::StateChanged),
            (false, true) => Some(Self::PublishStateChanged),
            (false, false) => None,
        }
    }
}

/// Raw outcome of a store write that was not an exact duplicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// `None` when the key was not tracked before.
    pub previous: Option<DeployableState>,
    pub current: DeployableState,
}

impl Transition {
    /// Turn the transition into an event, dropping writes that left both
    /// status codes untouched (e.g. a relabelled deployable).
    pub fn into_event(self) -> Option<DeployableEvent> {
        match self.previous {
            None => Some(DeployableEvent::Added {
                current: self.current,
            }),
            Some(previous) => {
                let kind = ChangeKind::between(&previous, &self.current)?;
                Some(DeployableEvent::Changed {
                    kind,
                    previous,
                    current: self.current,
                })
            }
        }
    }
}

/// Event delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DeployableEvent {
    /// First report for a key.
    Added { current: DeployableState },
    Changed {
        kind: ChangeKind,
        previous: DeployableState,
        current: DeployableState,
    },
    /// The deployable is no longer tracked.
    Removed {
        #[serde(rename = "lastKnown")]
        last_known: DeployableState,
    },
}

impl DeployableEvent {
    /// Newest snapshot carried by the event.
    pub fn snapshot(&self) -> &DeployableState {
        match self {
            Self::Added { current } | Self::Changed { current, .. } => current,
            Self::Removed { last_known } => last_known,
        }
    }

    pub fn key(&self) -> DeployableKey {
        self.snapshot().key()
    }

    pub fn server_id(&self) -> &str {
        self.snapshot().server_id()
    }

    pub fn change_kind(&self) -> Option<ChangeKind> {
        match self {
            Self::Changed { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
