//! Lifecycle handlers for the two custom resources.
//!
//! ```text
//! Create | Update ─▶ instance filter: parse spec ─▶ select ─▶ probe ─▶ resolve
//!                 ─▶ capacity:        parse target ─▶ size ─▶ set desired capacity
//! Delete          ─▶ success, nothing to tear down
//! ```
//!
//! Create and update run the same pipeline, so a redelivered event yields
//! the same response. Every error ends as a `Failed` response.

use tracing::{Instrument, info, info_span, warn};

use hashfleet_core::{
    CapacityRequest, Catalogue, FleetError, FleetResolution, MatchRule, parse_spec, parse_target,
    render_spec, resolve, select,
};
use hashfleet_provider::{AvailabilityProber, CapacityApplier};

use crate::error::{HandlerError, HandlerResult};
use crate::event::{
    CapacityData, CapacityProperties, HandlerResponse, InstanceFilterData,
    InstanceFilterProperties, NumberOrString, RequestType, ResourceEvent, ResponseData,
};

/// Which custom resource an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    InstanceFilter,
    Capacity,
}

impl ResourceKind {
    pub fn id_prefix(self) -> &'static str {
        match self {
            ResourceKind::InstanceFilter => "instance-filter",
            ResourceKind::Capacity => "asg-updater",
        }
    }
}

/// Handles instance-filter and capacity events for one region.
pub struct FleetHandler {
    region: String,
    prober: AvailabilityProber,
    applier: CapacityApplier,
}

impl FleetHandler {
    pub fn new(
        region: impl Into<String>,
        prober: AvailabilityProber,
        applier: CapacityApplier,
    ) -> Self {
        Self {
            region: region.into(),
            prober,
            applier,
        }
    }

    /// Dispatch one event. Never fails; errors become `Failed` responses.
    pub async fn handle(&self, kind: ResourceKind, event: &ResourceEvent) -> HandlerResponse {
        let span = info_span!(
            "custom_resource",
            ?kind,
            request_type = ?event.request_type,
            request_id = event.request_id.as_deref().unwrap_or("-"),
            logical_resource_id = event.logical_resource_id.as_deref().unwrap_or("-"),
            region = %self.region,
        );
        self.dispatch(kind, event).instrument(span).await
    }

    pub async fn handle_instance_filter(&self, event: &ResourceEvent) -> HandlerResponse {
        self.handle(ResourceKind::InstanceFilter, event).await
    }

    pub async fn handle_capacity(&self, event: &ResourceEvent) -> HandlerResponse {
        self.handle(ResourceKind::Capacity, event).await
    }

    async fn dispatch(&self, kind: ResourceKind, event: &ResourceEvent) -> HandlerResponse {
        let physical_id = event.physical_resource_id(kind.id_prefix());

        let result = match (event.request_type, kind) {
            (RequestType::Delete, _) => {
                info!(%physical_id, "delete: nothing to tear down");
                return HandlerResponse::success(physical_id, None);
            }
            (RequestType::Create | RequestType::Update, ResourceKind::InstanceFilter) => self
                .instance_filter(event)
                .await
                .map(ResponseData::InstanceFilter),
            (RequestType::Create | RequestType::Update, ResourceKind::Capacity) => {
                self.capacity(event).await.map(ResponseData::Capacity)
            }
        };

        match result {
            Ok(data) => HandlerResponse::success(physical_id, Some(data)),
            Err(e) => {
                warn!(%physical_id, error = %e, "custom resource failed");
                HandlerResponse::failed(e.to_string(), Some(physical_id))
            }
        }
    }

    async fn instance_filter(&self, event: &ResourceEvent) -> HandlerResult<InstanceFilterData> {
        let props: InstanceFilterProperties = event.properties()?;
        let resolution = self.resolve_fleet(&props).await?;

        info!(
            instance_types = %resolution.names_joined(),
            count = resolution.len(),
            "instance filter resolved"
        );
        Ok(InstanceFilterData::from(&resolution))
    }

    /// Spec string and catalogue to the ordered override list.
    pub async fn resolve_fleet(
        &self,
        props: &InstanceFilterProperties,
    ) -> HandlerResult<FleetResolution> {
        let rules = parse_spec(&props.instance_types_wanted)?;
        let catalogue = Catalogue::from_entries(props.instance_types_attributes.clone())?;
        self.resolve_with_catalogue(&rules, &catalogue).await
    }

    /// Rules and catalogue to the ordered override list, probing live offerings.
    pub async fn resolve_with_catalogue(
        &self,
        rules: &[MatchRule],
        catalogue: &Catalogue,
    ) -> HandlerResult<FleetResolution> {
        let names: Vec<&str> = select(rules, catalogue, &self.region)
            .into_iter()
            .map(|c| c.name.as_str())
            .collect();
        if names.is_empty() {
            return Err(FleetError::NoInstancesAvailable {
                region: self.region.clone(),
                spec: render_spec(rules),
            }
            .into());
        }

        let offerings = self.prober.offerings_for(&self.region, &names).await?;
        Ok(resolve(rules, catalogue, &self.region, &offerings)?)
    }

    async fn capacity(&self, event: &ResourceEvent) -> HandlerResult<CapacityData> {
        let props: CapacityProperties = event.properties()?;
        if props.asg_name.trim().is_empty() {
            return Err(HandlerError::InvalidRequest("AsgName is empty".to_string()));
        }

        let target = match &props.desired_capacity {
            NumberOrString::Number(n) => *n,
            NumberOrString::Text(raw) => parse_target(raw)?,
        };
        let request = CapacityRequest {
            target_hashrate: target,
            resolution: props.resolution()?,
        };
        let sized = request.size()?;

        self.applier
            .apply(&props.asg_name, sized.desired_capacity)
            .await?;

        Ok(CapacityData {
            asg_name: props.asg_name,
            desired_capacity: sized.desired_capacity.to_string(),
        })
    }
}
