//! Core types for deployable state in the remote server protocol.
//!
//! This crate provides the wire primitives: server and deployable identities,
//! the two status enumerations, and the notifications a management service
//! pushes to its clients. Tracking and reconciliation live in `rsp-client`.

mod deployable;
mod notification;
mod server;
mod status;

pub use deployable::{
    DeployableKey, DeployableReference, DeployableState, InvalidIdentity, OptionValue,
};
pub use notification::{Notification, ServerState};
pub use server::{ServerHandle, ServerType};
pub use status::{PublishState, RunState};
