//! Provider error types.

use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use thiserror::Error;

/// Errors surfaced to callers of the provider crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("provider unavailable during {operation}: {reason}")]
    Unavailable {
        operation: &'static str,
        reason: String,
    },
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Outcome of a single provider call, before retry policy is applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// Throttling, timeouts, and other conditions worth retrying.
    #[error("{0}")]
    Transient(String),

    #[error("{0}")]
    Fatal(String),
}

impl SourceError {
    pub fn is_transient(&self) -> bool {
        matches!(self, SourceError::Transient(_))
    }
}

/// Error codes the cloud APIs use for throttling and brief outages.
const TRANSIENT_CODES: &[&str] = &[
    "RequestLimitExceeded",
    "Throttling",
    "ThrottlingException",
    "TooManyRequestsException",
    "ServiceUnavailable",
    "Unavailable",
    "InternalError",
];

/// Classify a failed API call from its error code.
///
/// `transport` marks failures that never produced a response (timeouts,
/// dispatch failures); those are always retried.
pub(crate) fn classify(code: Option<&str>, transport: bool, message: String) -> SourceError {
    if transport || code.is_some_and(|c| TRANSIENT_CODES.contains(&c)) {
        SourceError::Transient(message)
    } else {
        SourceError::Fatal(message)
    }
}

/// Classify an SDK failure. Both AWS clients share the same error type.
pub(crate) fn classify_sdk_error<E, R>(error: &SdkError<E, R>) -> SourceError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let transport = matches!(
        error,
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_)
    );
    classify(
        error.code(),
        transport,
        DisplayErrorContext(error).to_string(),
    )
}
