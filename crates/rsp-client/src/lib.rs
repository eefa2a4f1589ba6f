//! Client-side tracking of deployable state.
//!
//! The [`Reconciler`] owns the only writable [`StateStore`] and applies
//! [`Notification`](rsp_core::Notification)s one at a time, dispatching each
//! detected transition to subscribers before the next notification is touched.
//! Readers get a [`StoreView`] that hands out copies. Several notification
//! sources can share one reconciler through the async intake queue.

mod error;
mod event;
mod intake;
mod reconciler;
mod store;
mod subscribers;

pub use error::ClientError;
pub use event::{ChangeKind, DeployableEvent, Transition};
pub use intake::{IntakeConfig, IntakeSender, spawn};
pub use reconciler::Reconciler;
pub use store::{StateStore, StoreView};
pub use subscribers::{Subscribers, SubscriptionId};
