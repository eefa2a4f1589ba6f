//! Single intake queue in front of a [`Reconciler`].
//!
//! Any number of sources hold an [`IntakeSender`]; one task drains the queue
//! and applies notifications strictly in arrival order.

use crate::{ClientError, Reconciler};
use futures_util::{Stream, StreamExt};
use rsp_core::Notification;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const DEFAULT_CAPACITY: usize = 256;

/// Intake queue settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    /// Notifications buffered before senders wait.
    pub capacity: usize,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Cloneable handle for feeding notifications to the intake task.
#[derive(Debug, Clone)]
pub struct IntakeSender {
    tx: mpsc::Sender<Notification>,
}

impl IntakeSender {
    /// Queue a notification, waiting for room if the queue is full.
    pub async fn send(&self, notification: Notification) -> Result<(), ClientError> {
        self.tx
            .send(notification)
            .await
            .map_err(|_| ClientError::IntakeClosed)
    }

    /// Queue a notification without waiting.
    pub fn try_send(&self, notification: Notification) -> Result<(), ClientError> {
        self.tx.try_send(notification).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => ClientError::IntakeFull,
            mpsc::error::TrySendError::Closed(_) => ClientError::IntakeClosed,
        })
    }

    /// Queue every item of `stream` in order. Returns how many were queued.
    pub async fn forward<S>(&self, stream: S) -> Result<usize, ClientError>
    where
        S: Stream<Item = Notification>,
    {
        let mut stream = std::pin::pin!(stream);
        let mut count = 0;
        while let Some(notification) = stream.next().await {
            self.send(notification).await?;
            count += 1;
        }
        Ok(count)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Move `reconciler` onto a task that drains a new intake queue.
///
/// The task finishes once every sender is dropped and returns the reconciler.
/// Take [`Reconciler::view`] and [`Reconciler::subscribers`] handles before
/// calling this.
pub fn spawn(
    reconciler: Reconciler,
    config: &IntakeConfig,
) -> (IntakeSender, JoinHandle<Reconciler>) {
    let (tx, rx) = mpsc::channel(config.capacity.max(1));
    let handle = tokio::spawn(run(reconciler, rx));
    (IntakeSender { tx }, handle)
}

async fn run(mut reconciler: Reconciler, mut rx: mpsc::Receiver<Notification>) -> Reconciler {
    debug!("intake started");
    let mut applied = 0usize;
    while let Some(notification) = rx.recv().await {
        let server = notification.server_id().to_string();
        match reconciler.apply(notification) {
            Ok(_) => applied += 1,
            Err(e) => warn!(%server, "rejected notification: {}", e),
        }
    }
    debug!(applied, "intake closed");
    reconciler
}
