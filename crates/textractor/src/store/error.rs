//! Job record store error types.

use thiserror::Error;

/// Errors from job record store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backing service rejected or failed the request.
    #[error("{0}")]
    Request(String),

    /// A stored item could not be mapped to a job record.
    #[error("Malformed job record '{job_id}': {reason}")]
    MalformedItem { job_id: String, reason: String },

    /// The in-memory store lock was poisoned.
    #[error("Job record store lock poisoned")]
    LockPoisoned,
}
