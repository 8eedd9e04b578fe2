//! Fleet resolution — turns rules, catalogue and live offerings into the
//! ordered override list of the autoscaling group.
//!
//! # Algorithm
//!
//! ```text
//! working = {}
//! for rule in includes (in order):  working ∪= catalogue matching rule
//! for rule in excludes (in order):  working −= catalogue matching rule
//! drop candidates excluded in region by the catalogue
//! drop candidates without a live offering in region
//! sort by weighted capacity, descending (stable on catalogue order)
//! empty → NoInstancesAvailable
//! ```
//!
//! Exclusions run after every include, so `-p4d.*` removes p4d even when a
//! later `*` would have added it back.

use std::collections::HashSet;

use tracing::debug;

use crate::catalogue::{CandidateType, Catalogue};
use crate::error::{FleetError, FleetResult};
use crate::pattern::{MatchRule, render_spec};
use crate::types::{FleetResolution, Offering};

/// Apply rules and catalogue-level regional exclusions.
///
/// This is everything except the live-offering filter and the ordering; the
/// result is the set of names worth asking the provider about. Catalogue
/// order is preserved.
pub fn select<'a>(
    rules: &[MatchRule],
    catalogue: &'a Catalogue,
    region: &str,
) -> Vec<&'a CandidateType> {
    let mut selected = vec![false; catalogue.len()];

    for rule in rules.iter().filter(|r| !r.is_exclude()) {
        for (i, candidate) in catalogue.iter().enumerate() {
            if rule.matches(&candidate.name) {
                selected[i] = true;
            }
        }
    }

    for rule in rules.iter().filter(|r| r.is_exclude()) {
        for (i, candidate) in catalogue.iter().enumerate() {
            if selected[i] && rule.matches(&candidate.name) {
                debug!(instance_type = %candidate.name, rule = %rule, "excluded by rule");
                selected[i] = false;
            }
        }
    }

    catalogue
        .iter()
        .zip(selected)
        .filter(|(_, keep)| *keep)
        .map(|(candidate, _)| candidate)
        .filter(|candidate| {
            let excluded = candidate.is_excluded_in(region);
            if excluded {
                debug!(instance_type = %candidate.name, region, "excluded in region by catalogue");
            }
            !excluded
        })
        .collect()
}

/// Resolve the final override list.
pub fn resolve(
    rules: &[MatchRule],
    catalogue: &Catalogue,
    region: &str,
    offerings: &HashSet<Offering>,
) -> FleetResult<FleetResolution> {
    let offered: HashSet<&str> = offerings
        .iter()
        .filter(|o| o.region == region)
        .map(|o| o.instance_type.as_str())
        .collect();

    let mut candidates: Vec<&CandidateType> = select(rules, catalogue, region)
        .into_iter()
        .filter(|candidate| {
            let available = offered.contains(candidate.name.as_str());
            if !available {
                debug!(instance_type = %candidate.name, region, "not offered in region");
            }
            available
        })
        .collect();

    if candidates.is_empty() {
        return Err(FleetError::NoInstancesAvailable {
            region: region.to_string(),
            spec: render_spec(rules),
        });
    }

    candidates.sort_by(|a, b| b.weighted_capacity.cmp(&a.weighted_capacity));

    let resolution = FleetResolution::new(
        candidates
            .into_iter()
            .map(CandidateType::to_override)
            .collect(),
    );
    debug!(
        region,
        count = resolution.len(),
        names = %resolution.names_joined(),
        "fleet resolved"
    );
    Ok(resolution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::parse_spec;

    fn candidate(name: &str, weight: u32, excluded: &[&str]) -> CandidateType {
        CandidateType::new(name, weight, excluded.iter().copied(), None).unwrap()
    }

    /// The three-type catalogue from the eu-central-1 scenario.
    fn small_catalogue() -> Catalogue {
        Catalogue::new(vec![
            candidate("g4dn.xlarge", 25, &[]),
            candidate("g5.xlarge", 56, &[]),
            candidate("p4d.24xlarge", 999, &["eu-central-1"]),
        ])
        .unwrap()
    }

    fn offerings(region: &str, names: &[&str]) -> HashSet<Offering> {
        names.iter().map(|n| Offering::new(*n, region)).collect()
    }

    fn resolve_spec(
        spec: &str,
        catalogue: &Catalogue,
        region: &str,
        offered: &HashSet<Offering>,
    ) -> FleetResult<FleetResolution> {
        resolve(&parse_spec(spec).unwrap(), catalogue, region, offered)
    }

    fn weights(r: &FleetResolution) -> Vec<(&str, u32)> {
        r.overrides()
            .iter()
            .map(|o| (o.instance_type.as_str(), o.weighted_capacity))
            .collect()
    }

    #[test]
    fn eu_central_scenario() {
        let catalogue = small_catalogue();
        let offered = offerings("eu-central-1", &["g4dn.xlarge", "g5.xlarge"]);

        let r = resolve_spec("*", &catalogue, "eu-central-1", &offered).unwrap();
        assert_eq!(weights(&r), vec![("g5.xlarge", 56), ("g4dn.xlarge", 25)]);
        assert_eq!(r.names_joined(), "g5.xlarge,g4dn.xlarge");
    }

    #[test]
    fn catalogue_exclusion_wins_over_live_offering() {
        let catalogue = small_catalogue();
        let offered = offerings("eu-central-1", &["g4dn.xlarge", "g5.xlarge", "p4d.24xlarge"]);

        let r = resolve_spec("p4d.*,g5.*", &catalogue, "eu-central-1", &offered).unwrap();
        assert_eq!(r.names(), vec!["g5.xlarge"]);
    }

    #[test]
    fn exclusion_wins_regardless_of_token_order() {
        let catalogue = small_catalogue();
        let offered = offerings("us-east-1", &["g4dn.xlarge", "g5.xlarge", "p4d.24xlarge"]);

        let r = resolve_spec("-p4d.*,*", &catalogue, "us-east-1", &offered).unwrap();
        assert_eq!(r.names(), vec!["g5.xlarge", "g4dn.xlarge"]);
    }

    #[test]
    fn not_offered_is_dropped() {
        let catalogue = small_catalogue();
        let offered = offerings("us-east-1", &["g4dn.xlarge"]);

        let r = resolve_spec("g5.xlarge,g4dn.xlarge", &catalogue, "us-east-1", &offered).unwrap();
        assert_eq!(r.names(), vec!["g4dn.xlarge"]);
    }

    #[test]
    fn offerings_from_other_regions_are_ignored() {
        let catalogue = small_catalogue();
        let offered = offerings("us-west-2", &["g4dn.xlarge", "g5.xlarge"]);

        let err = resolve_spec("*", &catalogue, "us-east-1", &offered).unwrap_err();
        assert!(matches!(err, FleetError::NoInstancesAvailable { .. }));
    }

    #[test]
    fn include_then_exclude_same_name_is_empty() {
        let catalogue = small_catalogue();
        let offered = offerings("us-east-1", &["g4dn.xlarge", "g5.xlarge"]);

        let err = resolve_spec("g4dn.xlarge,-g4dn.xlarge", &catalogue, "us-east-1", &offered)
            .unwrap_err();
        assert_eq!(
            err,
            FleetError::NoInstancesAvailable {
                region: "us-east-1".into(),
                spec: "g4dn.xlarge,-g4dn.xlarge".into(),
            }
        );
    }

    #[test]
    fn exclude_everything_is_empty() {
        let catalogue = small_catalogue();
        let offered = offerings("us-east-1", &["g4dn.xlarge", "g5.xlarge"]);

        let err = resolve_spec("-*", &catalogue, "us-east-1", &offered).unwrap_err();
        assert!(matches!(err, FleetError::NoInstancesAvailable { .. }));
    }

    #[test]
    fn unknown_exact_name_selects_nothing() {
        let catalogue = small_catalogue();
        let offered = offerings("us-east-1", &["g4dn.xlarge", "g5.xlarge"]);

        assert!(resolve_spec("x1.large", &catalogue, "us-east-1", &offered).is_err());
    }

    #[test]
    fn duplicate_includes_are_idempotent() {
        let catalogue = small_catalogue();
        let offered = offerings("us-east-1", &["g4dn.xlarge", "g5.xlarge"]);

        let r = resolve_spec("g5.*,g5.xlarge,*", &catalogue, "us-east-1", &offered).unwrap();
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn equal_weights_keep_catalogue_order() {
        let catalogue = Catalogue::builtin().unwrap();
        let offered = offerings(
            "us-east-1",
            &["g4dn.2xlarge", "g4dn.xlarge", "g4ad.xlarge", "g4ad.2xlarge"],
        );

        let r = resolve_spec("g4*", &catalogue, "us-east-1", &offered).unwrap();
        assert_eq!(
            r.names(),
            vec!["g4ad.xlarge", "g4ad.2xlarge", "g4dn.xlarge", "g4dn.2xlarge"]
        );
    }

    #[test]
    fn launch_template_passes_through() {
        let catalogue = Catalogue::builtin().unwrap();
        let offered = offerings("us-east-1", &["p4d.24xlarge"]);

        let r = resolve_spec("p4d.24xlarge", &catalogue, "us-east-1", &offered).unwrap();
        assert_eq!(
            r.overrides()[0].launch_template,
            Some(serde_json::json!({"LaunchTemplateName": "deep-learning"}))
        );
    }

    #[test]
    fn select_skips_live_offerings() {
        let catalogue = small_catalogue();
        let rules = parse_spec("*").unwrap();
        let names: Vec<&str> = select(&rules, &catalogue, "eu-central-1")
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["g4dn.xlarge", "g5.xlarge"]);
    }
}
