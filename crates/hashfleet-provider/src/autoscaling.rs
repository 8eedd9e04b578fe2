//! Autoscaling group capacity — the applier and its AWS implementation.

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_autoscaling::Client;
use tracing::info;

use crate::error::{ProviderResult, SourceError, classify_sdk_error};
use crate::retry::RetryPolicy;
use crate::source::ScalingGroup;

const OPERATION: &str = "SetDesiredCapacity";

/// Applies desired capacity with `autoscaling:SetDesiredCapacity`.
#[derive(Debug, Clone)]
pub struct AsgScalingGroup {
    client: Client,
}

impl AsgScalingGroup {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &aws_config::SdkConfig) -> Self {
        Self::new(Client::new(config))
    }
}

#[async_trait]
impl ScalingGroup for AsgScalingGroup {
    async fn set_desired_capacity(&self, group: &str, capacity: u32) -> Result<(), SourceError> {
        let capacity = i32::try_from(capacity).map_err(|_| {
            SourceError::Fatal(format!("desired capacity {capacity} exceeds the API limit"))
        })?;

        self.client
            .set_desired_capacity()
            .auto_scaling_group_name(group)
            .desired_capacity(capacity)
            // Applied immediately, regardless of scaling cooldowns.
            .honor_cooldown(false)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))?;
        Ok(())
    }
}

/// Sets a group's desired capacity under the retry policy.
pub struct CapacityApplier {
    group: Arc<dyn ScalingGroup>,
    policy: RetryPolicy,
}

impl CapacityApplier {
    pub fn new(group: Arc<dyn ScalingGroup>, policy: RetryPolicy) -> Self {
        Self { group, policy }
    }

    pub async fn apply(&self, group_name: &str, capacity: u32) -> ProviderResult<()> {
        self.policy
            .within_timeout(
                OPERATION,
                self.policy.call(OPERATION, || {
                    self.group.set_desired_capacity(group_name, capacity)
                }),
            )
            .await?;
        info!(group = group_name, capacity, "desired capacity applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::ProviderError;
    use crate::memory::RecordingScalingGroup;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            initial_interval: Duration::from_millis(10),
            max_attempts: 3,
            ..RetryPolicy::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn applies_capacity() {
        let group = Arc::new(RecordingScalingGroup::new());
        let applier = CapacityApplier::new(group.clone(), policy());

        applier.apply("miner-asg", 1000).await.unwrap();
        assert_eq!(group.applied(), vec![("miner-asg".to_string(), 1000)]);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_throttled_updates() {
        let group = Arc::new(
            RecordingScalingGroup::new().fail_at(0, SourceError::Transient("Throttling".into())),
        );
        let applier = CapacityApplier::new(group.clone(), policy());

        applier.apply("miner-asg", 10).await.unwrap();
        assert_eq!(group.calls(), 2);
        assert_eq!(group.applied().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_group_is_unavailable() {
        let group = Arc::new(
            RecordingScalingGroup::new()
                .fail_at(0, SourceError::Fatal("ValidationError: group not found".into())),
        );
        let applier = CapacityApplier::new(group.clone(), policy());

        let err = applier.apply("missing", 10).await.unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable { operation: OPERATION, .. }));
        assert!(group.applied().is_empty());
    }
}
