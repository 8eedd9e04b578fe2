//! hashfleet-provider — cloud provider access for fleet resolution.
//!
//! # Components
//!
//! - **`prober`** — regional instance-type offerings, pagination drained
//! - **`autoscaling`** — desired-capacity updates for the mining group
//! - **`retry`** — bounded exponential backoff and the overall time budget
//! - **`source`** — the seams; `ec2` and `autoscaling` implement them over the AWS SDK
//! - **`memory`** — in-process implementations for tests and offline runs
//!
//! Retry policy lives in [`RetryPolicy`] only; the SDK clients are built
//! with their own retries disabled.

pub mod autoscaling;
pub mod ec2;
pub mod error;
pub mod memory;
pub mod prober;
pub mod retry;
pub mod source;

pub use autoscaling::{AsgScalingGroup, CapacityApplier};
pub use ec2::Ec2OfferingsSource;
pub use error::{ProviderError, ProviderResult, SourceError};
pub use memory::{InMemoryOfferings, RecordingScalingGroup};
pub use prober::{AvailabilityProber, MAX_FILTER_VALUES};
pub use retry::RetryPolicy;
pub use source::{OfferingsPage, OfferingsSource, ScalingGroup};

use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};

/// Shared SDK configuration for `region`, credentials from the environment.
pub async fn load_aws_config(region: &str) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .retry_config(RetryConfig::disabled())
        .load()
        .await
}
