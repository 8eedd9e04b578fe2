//! EC2-backed offerings source.

use async_trait::async_trait;
use aws_sdk_ec2::Client;
use aws_sdk_ec2::types::{Filter, LocationType};

use hashfleet_core::Offering;

use crate::error::{SourceError, classify_sdk_error};
use crate::source::{OfferingsPage, OfferingsSource};

/// Largest page `DescribeInstanceTypeOfferings` will return.
const PAGE_SIZE: i32 = 1000;

/// Lists offerings with `ec2:DescribeInstanceTypeOfferings`.
#[derive(Debug, Clone)]
pub struct Ec2OfferingsSource {
    client: Client,
}

impl Ec2OfferingsSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &aws_config::SdkConfig) -> Self {
        Self::new(Client::new(config))
    }
}

#[async_trait]
impl OfferingsSource for Ec2OfferingsSource {
    async fn offerings_page(
        &self,
        region: &str,
        names: &[String],
        next_token: Option<String>,
    ) -> Result<OfferingsPage, SourceError> {
        let output = self
            .client
            .describe_instance_type_offerings()
            .location_type(LocationType::Region)
            .filters(Filter::builder().name("location").values(region).build())
            .filters(
                Filter::builder()
                    .name("instance-type")
                    .set_values(Some(names.to_vec()))
                    .build(),
            )
            .max_results(PAGE_SIZE)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))?;

        let offerings = output
            .instance_type_offerings()
            .iter()
            .filter_map(|o| {
                let instance_type = o.instance_type()?.as_str();
                let location = o.location().unwrap_or(region);
                Some(Offering::new(instance_type, location))
            })
            .collect();

        Ok(OfferingsPage {
            offerings,
            next_token: output.next_token().map(str::to_owned),
        })
    }
}
