//! The module contains the errors the ledger engine can throw.
//!
//! [`Validation`] is raised before any persistence call and never mutates the
//! store. [`Persistence`] wraps a failure reported by the persistence
//! collaborator; the store may already hold an optimistic change when it is
//! raised (see the coordinator docs for the acknowledged gaps).
//!
//! [`Validation`]: LedgerError::Validation
//! [`Persistence`]: LedgerError::Persistence
use thiserror::Error;

use crate::bill::BillId;

/// Failure reported by the persistence collaborator (network or backend).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("persistence error: {0}")]
pub struct PersistenceError(pub String);

/// Ledger engine custom errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("invalid delete scope: {0}")]
    InvalidScope(String),
    #[error("operation already in flight for bill {0}")]
    Busy(BillId),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl PartialEq for LedgerError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::InvalidScope(a), Self::InvalidScope(b)) => a == b,
            (Self::Busy(a), Self::Busy(b)) => a == b,
            (Self::Persistence(a), Self::Persistence(b)) => a == b,
            _ => false,
        }
    }
}
