//! # Domain Error Types
//!
//! Errors raised by pure domain logic. Transport and storage failures have
//! their own types in bridge-sync and bridge-db.
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impls)
//! 2. Include context in error messages (room code, field name)
//! 3. Errors are enum variants, never bare Strings

use thiserror::Error;

/// Domain-level errors.
///
/// Callers decide severity: an unmapped room code is fatal when building an
/// outbound update but merely skippable during inbound reconciliation.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No room mapping row matches the given local id or external code.
    #[error("Room mapping not found for {0}")]
    MappingNotFound(String),

    /// A payload field could not be coerced to its expected shape.
    ///
    /// Malformed numeric or boolean input fails the single update it belongs
    /// to rather than silently producing NaN or a default.
    #[error("Invalid payload field '{field}': {reason}")]
    InvalidPayload { field: String, reason: String },
}

impl CoreError {
    /// Creates an InvalidPayload error.
    pub fn invalid_payload(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InvalidPayload {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
