//! # Sync Engine Error Types
//!
//! One error type for the reconciler, the pusher and the queue processors.
//! Severity is the caller's business: both queue processors catch errors
//! per item so one bad row never blocks its batch, and only delivery
//! failures graduate to the retry queue — a mapping or payload error will
//! not get better by retrying.

use thiserror::Error;

use bridge_core::CoreError;
use bridge_db::DbError;

/// Errors raised by the reconciliation and delivery engine.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Domain failure (unmapped room, malformed payload field).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Storage failure.
    #[error(transparent)]
    Db(#[from] DbError),

    /// No channel_settings row exists for the configured channel.
    #[error("Channel settings not found for '{0}'")]
    ChannelSettingsMissing(String),

    /// The channel manager rejected the push or was unreachable.
    ///
    /// Carries the remote error body when one was returned, so operators
    /// see the upstream reason, not just a status code.
    #[error("Channel API error ({kind}): {message}")]
    DeliveryFailed {
        /// Update kind being delivered ("INVENTORY", "RATES", ...).
        kind: String,
        /// HTTP status, when the remote answered at all.
        status: Option<u16>,
        /// Remote error body, or the transport error text.
        message: String,
    },

    /// Configuration rejected at startup.
    #[error("Invalid sync configuration: {0}")]
    InvalidConfig(String),
}

impl SyncError {
    /// Whether a later re-attempt of the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::DeliveryFailed { .. })
    }
}

/// Result type for sync engine operations.
pub type SyncResult<T> = Result<T, SyncError>;
