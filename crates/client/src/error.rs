//! Shared error type for attempt-service clients.

use thiserror::Error;

/// Errors surfaced by [`AttemptClient`](crate::AttemptClient) implementations.
///
/// The engine treats every variant as transient except where the call site is
/// itself terminal (initialization); retry policy is the caller's decision,
/// never the client's.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("request failed with status {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),

    #[error("not found")]
    NotFound,

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("service unavailable")]
    Unavailable,
}
