//! Provider seams.
//!
//! The prober and the capacity applier only talk to these traits. The AWS
//! implementations live in `ec2` and `autoscaling`; `memory` holds in-process
//! versions for tests and offline runs.

use async_trait::async_trait;

use hashfleet_core::Offering;

use crate::error::SourceError;

/// One page of an offerings listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OfferingsPage {
    pub offerings: Vec<Offering>,
    /// Present when more pages follow.
    pub next_token: Option<String>,
}

/// Lists which instance types are purchasable in a region.
#[async_trait]
pub trait OfferingsSource: Send + Sync {
    /// Fetch one page of offerings for `names` in `region`.
    async fn offerings_page(
        &self,
        region: &str,
        names: &[String],
        next_token: Option<String>,
    ) -> Result<OfferingsPage, SourceError>;
}

/// Sets the desired capacity of a named autoscaling group.
#[async_trait]
pub trait ScalingGroup: Send + Sync {
    async fn set_desired_capacity(&self, group: &str, capacity: u32) -> Result<(), SourceError>;
}
