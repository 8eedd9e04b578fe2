//! Custom-resource wire format: lifecycle events in, responses out.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

use hashfleet_core::{CatalogueEntry, FleetResolution, ResolvedOverride};

use crate::error::{HandlerError, HandlerResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

/// A lifecycle event delivered by the orchestrating stack.
///
/// `ResourceProperties` stays untyped until the request type says it is
/// needed; a delete must succeed even when the properties no longer parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceEvent {
    pub request_type: RequestType,
    #[serde(default)]
    pub resource_properties: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_resource_properties: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logical_resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
}

impl ResourceEvent {
    pub fn new(request_type: RequestType, resource_properties: serde_json::Value) -> Self {
        Self {
            request_type,
            resource_properties,
            old_resource_properties: None,
            stack_id: None,
            request_id: None,
            logical_resource_id: None,
            physical_resource_id: None,
            resource_type: None,
        }
    }

    pub fn from_json(raw: &str) -> HandlerResult<Self> {
        serde_json::from_str(raw)
            .map_err(|e| HandlerError::InvalidRequest(format!("malformed event: {e}")))
    }

    /// Deserialize `ResourceProperties` into the handler's property type.
    pub fn properties<P: serde::de::DeserializeOwned>(&self) -> HandlerResult<P> {
        P::deserialize(&self.resource_properties).map_err(|e| {
            HandlerError::InvalidRequest(format!("malformed ResourceProperties: {e}"))
        })
    }

    /// Identifier reported back to the stack.
    ///
    /// Reuses the id the stack already knows for this resource; on create,
    /// derives one from the stack and logical ids so retried deliveries and
    /// later updates all see the same value. Without either, the request id
    /// is hashed instead, which is unique per delivery.
    pub fn physical_resource_id(&self, prefix: &str) -> String {
        if let Some(id) = self.physical_resource_id.as_deref().filter(|id| !id.is_empty()) {
            return id.to_string();
        }

        let mut hasher = Sha256::new();
        match (self.stack_id.as_deref(), self.logical_resource_id.as_deref()) {
            (None, None) => {
                warn!(
                    request_id = self.request_id.as_deref().unwrap_or("-"),
                    "event has neither StackId nor LogicalResourceId; physical id derived from RequestId"
                );
                hasher.update(b"request/");
                hasher.update(self.request_id.as_deref().unwrap_or_default().as_bytes());
            }
            (stack_id, logical_id) => {
                hasher.update(stack_id.unwrap_or_default().as_bytes());
                hasher.update(b"/");
                hasher.update(logical_id.unwrap_or_default().as_bytes());
            }
        }
        let digest = hex::encode(hasher.finalize());
        format!("{prefix}-{}", &digest[..16])
    }
}

/// Properties of the instance-filter resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstanceFilterProperties {
    pub instance_types_wanted: String,
    pub instance_types_attributes: Vec<CatalogueEntry>,
}

/// A number the stack may send as either a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberOrString {
    Number(f64),
    Text(String),
}

/// Properties of the capacity (ASG updater) resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CapacityProperties {
    pub asg_name: String,
    /// Hashrate target.
    pub desired_capacity: NumberOrString,
    /// The instance filter's `InstanceTypeAttributes`: a JSON string, or the
    /// array itself.
    pub instance_filter: serde_json::Value,
}

impl CapacityProperties {
    pub fn resolution(&self) -> HandlerResult<FleetResolution> {
        let parsed = match &self.instance_filter {
            serde_json::Value::String(raw) => serde_json::from_str(raw),
            other => FleetResolution::deserialize(other),
        };
        parsed.map_err(|e| HandlerError::InvalidRequest(format!("malformed InstanceFilter: {e}")))
    }
}

/// `Data` of a successful instance-filter response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstanceFilterData {
    pub instance_type_attributes: Vec<ResolvedOverride>,
    pub instance_type_names: String,
}

impl From<&FleetResolution> for InstanceFilterData {
    fn from(resolution: &FleetResolution) -> Self {
        Self {
            instance_type_attributes: resolution.overrides().to_vec(),
            instance_type_names: resolution.names_joined(),
        }
    }
}

/// `Data` of a successful capacity response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CapacityData {
    pub asg_name: String,
    pub desired_capacity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseData {
    InstanceFilter(InstanceFilterData),
    Capacity(CapacityData),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailedStatus {
    #[serde(rename = "FAILED")]
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SuccessResponse {
    pub physical_resource_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FailedResponse {
    pub status: FailedStatus,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,
}

/// The only two ways a handler invocation ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HandlerResponse {
    Failed(FailedResponse),
    Success(SuccessResponse),
}

impl HandlerResponse {
    pub fn success(physical_resource_id: String, data: Option<ResponseData>) -> Self {
        HandlerResponse::Success(SuccessResponse {
            physical_resource_id,
            data,
        })
    }

    pub fn failed(reason: impl Into<String>, physical_resource_id: Option<String>) -> Self {
        HandlerResponse::Failed(FailedResponse {
            status: FailedStatus::Failed,
            reason: reason.into(),
            physical_resource_id,
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, HandlerResponse::Success(_))
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            HandlerResponse::Failed(f) => Some(&f.reason),
            HandlerResponse::Success(_) => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
