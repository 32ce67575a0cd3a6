//! Error types for ledger access and record validation

use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the remote ledger boundary.
///
/// A `Timeout` is always distinguishable from an `Upstream` failure so
/// the HTTP layer can report `"timeout"` vs `"fetch_failed"` to the
/// dashboard.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Ledger call exceeded the {limit:?} bound")]
    Timeout { limit: Duration },

    #[error("Ledger request failed: {reason}")]
    Upstream { reason: String },

    #[error("Ledger returned a malformed payload: {reason}")]
    MalformedPayload { reason: String },
}

impl LedgerError {
    pub fn upstream(reason: impl Into<String>) -> Self {
        Self::Upstream {
            reason: reason.into(),
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedPayload {
            reason: reason.into(),
        }
    }

    /// True for calls that exceeded their time bound.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Errors for records the caller supplied in an unusable shape.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ValidationError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self::RequiredFieldMissing {
            field: field.into(),
        }
    }

    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
