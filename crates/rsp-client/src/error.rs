use rsp_core::InvalidIdentity;

/// Errors surfaced by the client layer.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    InvalidIdentity(#[from] InvalidIdentity),
    #[error("intake queue is closed")]
    IntakeClosed,
    #[error("intake queue is full")]
    IntakeFull,
}
