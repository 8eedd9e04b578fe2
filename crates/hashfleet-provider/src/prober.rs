//! Availability prober — which candidate types are on offer in a region.
//!
//! Sends the candidate names as an `instance-type` filter so only the types
//! of interest come back, in batches small enough for the filter limit, and
//! drains pagination before returning. A type that is simply not offered is
//! absent from the result; only provider failures are errors.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use hashfleet_core::Offering;

use crate::error::{ProviderError, ProviderResult};
use crate::retry::RetryPolicy;
use crate::source::OfferingsSource;

const OPERATION: &str = "DescribeInstanceTypeOfferings";

/// Filter values accepted per request.
pub const MAX_FILTER_VALUES: usize = 100;

/// Upper bound on pages per batch; a provider that keeps handing out tokens
/// past this is treated as broken.
const MAX_PAGES: usize = 100;

pub struct AvailabilityProber {
    source: Arc<dyn OfferingsSource>,
    policy: RetryPolicy,
}

impl AvailabilityProber {
    pub fn new(source: Arc<dyn OfferingsSource>, policy: RetryPolicy) -> Self {
        Self { source, policy }
    }

    /// The complete set of offerings for `names` in `region`.
    pub async fn offerings_for(
        &self,
        region: &str,
        names: &[&str],
    ) -> ProviderResult<HashSet<Offering>> {
        let mut unique: Vec<String> = Vec::with_capacity(names.len());
        for name in names {
            if !unique.iter().any(|n| n == name) {
                unique.push((*name).to_string());
            }
        }
        if unique.is_empty() {
            return Ok(HashSet::new());
        }

        let offerings = self
            .policy
            .within_timeout(OPERATION, self.drain(region, &unique))
            .await?;

        info!(
            region,
            requested = unique.len(),
            offered = offerings.len(),
            "probed instance type offerings"
        );
        Ok(offerings)
    }

    async fn drain(&self, region: &str, names: &[String]) -> ProviderResult<HashSet<Offering>> {
        let mut offerings = HashSet::new();

        for batch in names.chunks(MAX_FILTER_VALUES) {
            let mut next_token: Option<String> = None;
            let mut pages = 0usize;

            loop {
                let page = self
                    .policy
                    .call(OPERATION, || {
                        self.source.offerings_page(region, batch, next_token.clone())
                    })
                    .await?;
                pages += 1;

                offerings.extend(page.offerings.into_iter().filter(|o| o.region == region));

                match page.next_token {
                    Some(token) if !token.is_empty() => {
                        if pages >= MAX_PAGES {
                            return Err(ProviderError::Unavailable {
                                operation: OPERATION,
                                reason: format!("pagination did not finish after {pages} pages"),
                            });
                        }
                        next_token = Some(token);
                    }
                    _ => break,
                }
            }

            debug!(region, batch = batch.len(), pages, "offerings batch drained");
        }

        Ok(offerings)
    }
}
