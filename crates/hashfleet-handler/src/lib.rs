//! hashfleet-handler — lifecycle handling for the fleet's two custom resources.
//!
//! The **instance filter** resolves an instance-type specification against
//! the catalogue and live regional offerings, answering with the ordered
//! override list and a comma-joined name list. The **capacity** resource
//! turns a hashrate target into the mining group's desired capacity and
//! applies it.
//!
//! Both answer every event with exactly one [`HandlerResponse`]: success
//! with a stable physical id, or `FAILED` with a reason.

pub mod error;
pub mod event;
pub mod handler;

pub use error::{HandlerError, HandlerResult};
pub use event::{
    CapacityData, CapacityProperties, FailedResponse, HandlerResponse, InstanceFilterData,
    InstanceFilterProperties, NumberOrString, RequestType, ResourceEvent, ResponseData,
    SuccessResponse,
};
pub use handler::{FleetHandler, ResourceKind};
