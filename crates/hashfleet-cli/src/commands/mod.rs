pub mod filter;
pub mod resolve;
pub mod size;

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use hashfleet_handler::{FleetHandler, HandlerResponse, ResourceEvent};
use hashfleet_provider::{
    AsgScalingGroup, AvailabilityProber, CapacityApplier, Ec2OfferingsSource, RecordingScalingGroup,
    RetryPolicy, ScalingGroup, load_aws_config,
};

/// Settings shared by every subcommand.
pub struct Context {
    pub region: String,
    pub policy: RetryPolicy,
}

/// An event that does not parse is answered with a failed response, not an
/// error exit.
pub enum Input {
    Event(ResourceEvent),
    Rejected(HandlerResponse),
}

pub fn read_event(path: Option<&Path>) -> anyhow::Result<Input> {
    let raw = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading event from {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading event from stdin")?;
            buf
        }
    };

    Ok(match ResourceEvent::from_json(&raw) {
        Ok(event) => Input::Event(event),
        Err(e) => Input::Rejected(HandlerResponse::failed(e.to_string(), None)),
    })
}

pub fn print_response(response: &HandlerResponse) -> anyhow::Result<()> {
    println!("{}", response.to_json()?);
    Ok(())
}

/// Handler backed by the live provider APIs. With `dry_run`, capacity
/// changes are logged rather than applied.
pub async fn live_handler(ctx: &Context, dry_run: bool) -> FleetHandler {
    let config = load_aws_config(&ctx.region).await;
    let group: Arc<dyn ScalingGroup> = if dry_run {
        Arc::new(RecordingScalingGroup::new())
    } else {
        Arc::new(AsgScalingGroup::from_config(&config))
    };

    FleetHandler::new(
        ctx.region.clone(),
        AvailabilityProber::new(
            Arc::new(Ec2OfferingsSource::from_config(&config)),
            ctx.policy.clone(),
        ),
        CapacityApplier::new(group, ctx.policy.clone()),
    )
}
