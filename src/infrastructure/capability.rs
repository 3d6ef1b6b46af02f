//! Shared plumbing for remote model calls: timeouts and transient/permanent
//! classification of provider errors.

use std::future::Future;
use std::time::Duration;

use crate::domain::DomainError;

const TRANSIENT_MARKERS: &[&str] = &[
    "429",
    "rate limit",
    "rate_limit",
    "too many requests",
    "timeout",
    "timed out",
    "connection",
    "overloaded",
    "temporarily unavailable",
    "service unavailable",
    "bad gateway",
    "internal server error",
    "502",
    "503",
    "504",
];

/// Maps a provider error message onto a capability error, flagging rate limits,
/// timeouts, connection problems and 5xx responses as transient.
pub fn classify(context: &str, message: impl std::fmt::Display) -> DomainError {
    let message = format!("{context}: {message}");
    let lowered = message.to_lowercase();

    if TRANSIENT_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        DomainError::transient(message)
    } else {
        DomainError::permanent(message)
    }
}

/// Bounds a remote call; running out of time is a transient failure.
pub async fn with_timeout<T, F>(context: &str, timeout: Duration, fut: F) -> Result<T, DomainError>
where
    F: Future<Output = Result<T, DomainError>>,
{
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| DomainError::transient(format!("{context}: timed out after {timeout:?}")))?
}
