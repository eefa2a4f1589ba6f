//! Server identities.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Static descriptor of a server runtime kind (e.g. WildFly, Tomcat).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerType {
    /// Stable identifier of the runtime kind.
    pub id: String,
    /// Display label.
    pub visible_name: String,
    pub description: String,
}

impl ServerType {
    pub fn new(
        id: impl Into<String>,
        visible_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            visible_name: visible_name.into(),
            description: description.into(),
        }
    }
}

/// One managed server instance.
///
/// Two handles are equal when their ids are equal; the type is a shared
/// descriptor and takes no part in identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerHandle {
    /// Unique within the managing process.
    pub id: String,
    #[serde(rename = "type")]
    pub server_type: ServerType,
}

impl ServerHandle {
    pub fn new(id: impl Into<String>, server_type: ServerType) -> Self {
        Self {
            id: id.into(),
            server_type,
        }
    }

    /// The server id.
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl PartialEq for ServerHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ServerHandle {}

impl Hash for ServerHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for ServerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.server_type.id)
    }
}
