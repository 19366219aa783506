//! Error type for domain-level failures.
//!
//! Everything here is a local, recoverable error: it is raised before
//! any network call and produces no side effects.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// Input was not a well-formed 0x-prefixed account address.
    #[error("invalid account address: {0:?}")]
    InvalidAddress(String),

    /// A required clinical field was left empty.
    #[error("{0} must not be empty")]
    MissingField(&'static str),

    /// A patient update was submitted with no fields at all.
    #[error("patient update carries no fields")]
    EmptyUpdate,

    /// A patient update field collides with a reserved key or is blank.
    #[error("patient update field name {0:?} is not allowed")]
    ReservedUpdateField(String),

    /// A content identifier was empty or contained whitespace.
    #[error("content identifier {0:?} is malformed")]
    InvalidCid(String),

    /// A second mutating operation was triggered while one is running.
    #[error("another operation is already in flight")]
    OperationInFlight,
}
