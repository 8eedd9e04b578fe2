//! Capacity sizing — hashrate target to desired capacity.
//!
//! Desired capacity is expressed in weighted-capacity units, not instances.
//! The catalogue calibrates each type's weight in hashrate units, so the
//! desired capacity is the target rounded up; the group's allocation
//! strategy decides which overrides to launch.
//!
//! ```text
//! desired = ceil(max(target, 0))
//! ```

use tracing::debug;

use crate::error::{FleetError, FleetResult};
use crate::types::{CapacityResult, FleetResolution};

/// Largest desired capacity the autoscaling API accepts (a signed 32-bit field).
pub const MAX_DESIRED_CAPACITY: u32 = i32::MAX as u32;

/// A hashrate target bound to the fleet it will run on.
#[derive(Debug, Clone, PartialEq)]
pub struct CapacityRequest {
    pub target_hashrate: f64,
    pub resolution: FleetResolution,
}

impl CapacityRequest {
    pub fn size(&self) -> FleetResult<CapacityResult> {
        size(self.target_hashrate, &self.resolution)
    }
}

/// Compute desired capacity for a hashrate target.
pub fn size(target_hashrate: f64, resolution: &FleetResolution) -> FleetResult<CapacityResult> {
    if !target_hashrate.is_finite() {
        return Err(FleetError::InvalidTarget(format!(
            "{target_hashrate} is not a finite number"
        )));
    }
    if target_hashrate < 0.0 {
        return Err(FleetError::InvalidTarget(format!(
            "{target_hashrate} is negative"
        )));
    }

    let desired = target_hashrate.ceil().max(0.0);
    if desired > f64::from(MAX_DESIRED_CAPACITY) {
        return Err(FleetError::InvalidTarget(format!(
            "{target_hashrate} exceeds the maximum desired capacity {MAX_DESIRED_CAPACITY}"
        )));
    }
    let desired_capacity = desired as u32;

    // Smallest instance count that can satisfy the target, for the logs only.
    let min_instances = resolution
        .max_weight()
        .filter(|w| *w > 0)
        .map(|w| desired_capacity.div_ceil(w));
    debug!(
        target_hashrate,
        desired_capacity,
        overrides = resolution.len(),
        ?min_instances,
        "capacity sized"
    );

    Ok(CapacityResult { desired_capacity })
}

/// Parse the stack's `DesiredCapacity` string.
pub fn parse_target(raw: &str) -> FleetResult<f64> {
    let trimmed = raw.trim();
    let value = trimmed
        .parse::<f64>()
        .map_err(|_| FleetError::InvalidTarget(format!("'{raw}' is not a number")))?;
    if !value.is_finite() {
        return Err(FleetError::InvalidTarget(format!(
            "'{raw}' is not a finite number"
        )));
    }
    Ok(value)
}
