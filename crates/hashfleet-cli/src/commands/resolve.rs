use std::path::Path;
use std::sync::Arc;

use hashfleet_core::{Catalogue, FleetResolution, parse_spec, parse_target, size};
use hashfleet_handler::FleetHandler;
use hashfleet_provider::{
    AvailabilityProber, CapacityApplier, Ec2OfferingsSource, InMemoryOfferings, OfferingsSource,
    RecordingScalingGroup, load_aws_config,
};

use super::Context;

/// What `hashfleet resolve` prints.
pub struct Preview {
    pub resolution: FleetResolution,
    pub desired_capacity: Option<u32>,
}

pub async fn run(
    ctx: &Context,
    spec: &str,
    catalogue: Option<&Path>,
    hashrate: Option<&str>,
    offline: bool,
) -> anyhow::Result<()> {
    let preview = preview(ctx, spec, catalogue, hashrate, offline).await?;
    let resolution = &preview.resolution;

    println!(
        "{} instance types in {}{}:",
        resolution.len(),
        ctx.region,
        if offline { " (offline)" } else { "" }
    );
    for o in resolution.overrides() {
        let template = o
            .launch_template
            .as_ref()
            .map(|t| format!("  {t}"))
            .unwrap_or_default();
        println!("  {:<16} {:>5}{template}", o.instance_type, o.weighted_capacity);
    }
    println!("  InstanceTypeNames: {}", resolution.names_joined());

    if let (Some(raw), Some(desired)) = (hashrate, preview.desired_capacity) {
        println!("  DesiredCapacity for {}: {desired}", raw.trim());
    }
    Ok(())
}

/// Resolve `spec` and optionally size for `hashrate`. Offline, every
/// catalogue type counts as offered in the region.
pub async fn preview(
    ctx: &Context,
    spec: &str,
    catalogue: Option<&Path>,
    hashrate: Option<&str>,
    offline: bool,
) -> anyhow::Result<Preview> {
    let catalogue = match catalogue {
        Some(path) => Catalogue::from_file(path)?,
        None => Catalogue::builtin()?,
    };
    let rules = parse_spec(spec)?;

    let source: Arc<dyn OfferingsSource> = if offline {
        Arc::new(
            InMemoryOfferings::new().offer(&ctx.region, catalogue.iter().map(|c| c.name.clone())),
        )
    } else {
        Arc::new(Ec2OfferingsSource::from_config(
            &load_aws_config(&ctx.region).await,
        ))
    };
    let handler = FleetHandler::new(
        ctx.region.clone(),
        AvailabilityProber::new(source, ctx.policy.clone()),
        CapacityApplier::new(Arc::new(RecordingScalingGroup::new()), ctx.policy.clone()),
    );

    let resolution = handler.resolve_with_catalogue(&rules, &catalogue).await?;
    let desired_capacity = match hashrate {
        Some(raw) => Some(size(parse_target(raw)?, &resolution)?.desired_capacity),
        None => None,
    };

    Ok(Preview {
        resolution,
        desired_capacity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashfleet_provider::RetryPolicy;
    use std::fs;

    fn ctx(region: &str) -> Context {
        Context {
            region: region.to_string(),
            policy: RetryPolicy::default(),
        }
    }

    #[tokio::test]
    async fn test_offline_offers_whole_catalogue() {
        let preview = preview(&ctx("us-east-1"), "*", None, None, true).await.unwrap();

        assert_eq!(preview.resolution.len(), Catalogue::builtin().unwrap().len());
        assert_eq!(preview.resolution.names()[0], "p4d.24xlarge");
        assert_eq!(preview.desired_capacity, None);
    }

    #[tokio::test]
    async fn test_offline_still_applies_regional_exclusions() {
        let preview = preview(&ctx("eu-central-1"), "g4ad.*", None, None, true)
            .await
            .unwrap();

        assert_eq!(preview.resolution.names(), vec!["g4ad.xlarge", "g4ad.2xlarge"]);
    }

    #[tokio::test]
    async fn test_hashrate_is_sized() {
        let preview = preview(&ctx("eu-central-1"), "g5.xlarge,g4dn.xlarge", None, Some("99.2"), true)
            .await
            .unwrap();

        assert_eq!(preview.resolution.names(), vec!["g5.xlarge", "g4dn.xlarge"]);
        assert_eq!(preview.desired_capacity, Some(100));
    }

    #[tokio::test]
    async fn test_negative_hashrate_is_error() {
        let result = preview(&ctx("eu-central-1"), "*", None, Some("-5"), true).await;
        assert!(result.unwrap_err().to_string().contains("invalid hashrate target"));
    }

    #[tokio::test]
    async fn test_catalogue_file_replaces_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalogue.toml");
        fs::write(
            &path,
            "[[instance_type]]\nname = \"x1.large\"\nweighted_capacity = 7\n",
        )
        .unwrap();

        let preview = preview(&ctx("us-east-1"), "*", Some(path.as_path()), Some("10"), true)
            .await
            .unwrap();
        assert_eq!(preview.resolution.names(), vec!["x1.large"]);
        assert_eq!(preview.desired_capacity, Some(10));
    }
}
