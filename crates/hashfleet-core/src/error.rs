//! Fleet resolution error types.

use thiserror::Error;

/// Errors raised while parsing, resolving, or sizing a fleet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FleetError {
    #[error("invalid instance type specification: {0}")]
    InvalidSpec(String),

    #[error("no instance types available in {region} for specification '{spec}'")]
    NoInstancesAvailable { region: String, spec: String },

    #[error("invalid hashrate target: {0}")]
    InvalidTarget(String),

    #[error("invalid instance type catalogue: {0}")]
    InvalidCatalogue(String),
}

pub type FleetResult<T> = Result<T, FleetError>;
