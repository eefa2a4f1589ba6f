//! Lifecycle and publish status codes.
//!
//! Both enumerations travel as plain integers. Any code outside the known set
//! decodes to `Unknown`, which re-encodes as its canonical code.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a deployable (the `state` field).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum RunState {
    #[default]
    Unknown,
    Starting,
    Started,
    Stopping,
    Stopped,
}

impl RunState {
    pub const fn code(self) -> i64 {
        match self {
            Self::Unknown => 0,
            Self::Starting => 1,
            Self::Started => 2,
            Self::Stopping => 3,
            Self::Stopped => 4,
        }
    }

    pub const fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Starting,
            2 => Self::Started,
            3 => Self::Stopping,
            4 => Self::Stopped,
            _ => Self::Unknown,
        }
    }
}

impl From<i64> for RunState {
    fn from(code: i64) -> Self {
        Self::from_code(code)
    }
}

impl From<RunState> for i64 {
    fn from(state: RunState) -> Self {
        state.code()
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unknown => "unknown",
            Self::Starting => "starting",
            Self::Started => "started",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Synchronization status between local content and the server (the
/// `publishState` field).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum PublishState {
    /// In sync; nothing to publish.
    None,
    /// Needs an incremental publish.
    Incremental,
    /// Needs a full publish.
    Full,
    /// Added locally, not yet on the server.
    Add,
    /// Removed locally, still on the server.
    Remove,
    #[default]
    Unknown,
}

impl PublishState {
    pub const fn code(self) -> i64 {
        match self {
            Self::None => 1,
            Self::Incremental => 2,
            Self::Full => 3,
            Self::Add => 4,
            Self::Remove => 5,
            Self::Unknown => 6,
        }
    }

    pub const fn from_code(code: i64) -> Self {
        match code {
            1 => Self::None,
            2 => Self::Incremental,
            3 => Self::Full,
            4 => Self::Add,
            5 => Self::Remove,
            _ => Self::Unknown,
        }
    }
}

impl From<i64> for PublishState {
    fn from(code: i64) -> Self {
        Self::from_code(code)
    }
}

impl From<PublishState> for i64 {
    fn from(state: PublishState) -> Self {
        state.code()
    }
}

impl fmt::Display for PublishState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Incremental => "incremental",
            Self::Full => "full",
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}
