//! Handler error types.
//!
//! Every variant becomes the `Reason` of a failed response; nothing here
//! escapes the handler as a fault.

use thiserror::Error;

use hashfleet_core::FleetError;
use hashfleet_provider::ProviderError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HandlerError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Fleet(#[from] FleetError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

pub type HandlerResult<T> = Result<T, HandlerError>;
