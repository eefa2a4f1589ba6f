//! Notifications pushed by the management service.
//!
//! One tagged message type covers everything the client consumes; the
//! transport that carries it is not part of this crate.

use crate::{DeployableState, PublishState, RunState, ServerHandle};
use serde::{Deserialize, Serialize};

/// Whole-server snapshot including every deployable the server knows about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerState {
    pub server: ServerHandle,
    pub state: RunState,
    pub publish_state: PublishState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_mode: Option<String>,
    #[serde(default)]
    pub deployable_states: Vec<DeployableState>,
}

/// Messages received from the management service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// Latest status of one deployable.
    DeployableStateChanged(DeployableState),
    /// A deployable was un-deployed.
    DeployableRemoved {
        #[serde(rename = "serverId")]
        server_id: String,
        path: String,
    },
    /// Full status of a server and its deployables.
    ServerStateChanged(ServerState),
    /// The server handle was dropped.
    ServerRemoved { id: String },
}

impl Notification {
    /// Id of the server this notification concerns.
    pub fn server_id(&self) -> &str {
        match self {
            Self::DeployableStateChanged(state) => state.server_id(),
            Self::DeployableRemoved { server_id, .. } => server_id,
            Self::ServerStateChanged(state) => state.server.id(),
            Self::ServerRemoved { id } => id,
        }
    }
}
