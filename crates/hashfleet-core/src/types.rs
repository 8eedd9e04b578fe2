//! Shared types used across hashfleet crates.

use serde::{Deserialize, Serialize};

/// A provider's assertion that an instance type can be purchased in a region.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Offering {
    pub instance_type: String,
    pub region: String,
}

impl Offering {
    pub fn new(instance_type: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            instance_type: instance_type.into(),
            region: region.into(),
        }
    }
}

/// One eligible entry of an autoscaling group's mixed-instance policy.
///
/// Serializes to the shape the autoscaling API expects for a launch template
/// override: `InstanceType`, `WeightedCapacity` (as a string) and an optional
/// `LaunchTemplateSpecification`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResolvedOverride {
    pub instance_type: String,
    #[serde(with = "weight_string")]
    pub weighted_capacity: u32,
    #[serde(
        rename = "LaunchTemplateSpecification",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub launch_template: Option<serde_json::Value>,
}

/// The resolver's complete output, most-preferred override first.
///
/// Serializes transparently as the override array, which is what the stack
/// hands back to the capacity sizer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FleetResolution {
    overrides: Vec<ResolvedOverride>,
}

impl FleetResolution {
    pub fn new(overrides: Vec<ResolvedOverride>) -> Self {
        Self { overrides }
    }

    pub fn overrides(&self) -> &[ResolvedOverride] {
        &self.overrides
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    /// Instance type names in override order, without duplicates.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::with_capacity(self.overrides.len());
        for o in &self.overrides {
            if !names.contains(&o.instance_type.as_str()) {
                names.push(&o.instance_type);
            }
        }
        names
    }

    /// Comma-joined names, for display in stack outputs.
    pub fn names_joined(&self) -> String {
        self.names().join(",")
    }

    /// Largest weighted capacity among the overrides.
    pub fn max_weight(&self) -> Option<u32> {
        self.overrides.iter().map(|o| o.weighted_capacity).max()
    }
}

/// Desired capacity in weighted-capacity units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityResult {
    pub desired_capacity: u32,
}

/// `WeightedCapacity` as the stack sends it: usually a string, sometimes a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WeightValue {
    Number(i64),
    Text(String),
}

impl WeightValue {
    /// The weight, if it is a positive integer.
    pub fn positive(&self) -> Option<u32> {
        let parsed = match self {
            WeightValue::Number(n) => u32::try_from(*n).ok(),
            WeightValue::Text(s) => s.trim().parse::<u32>().ok(),
        };
        parsed.filter(|w| *w > 0)
    }
}

/// Serialized as a decimal string, read through [`WeightValue`].
mod weight_string {
    use serde::{Deserialize, Deserializer, Serializer, de};

    use super::WeightValue;

    pub fn serialize<S: Serializer>(weight: &u32, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&weight.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
        WeightValue::deserialize(d)?
            .positive()
            .ok_or_else(|| de::Error::custom("WeightedCapacity must be a positive integer"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ovr(name: &str, weight: u32) -> ResolvedOverride {
        ResolvedOverride {
            instance_type: name.to_string(),
            weighted_capacity: weight,
            launch_template: None,
        }
    }

    #[test]
    fn override_serializes_weight_as_string() {
        let json = serde_json::to_value(ovr("g5.xlarge", 56)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"InstanceType": "g5.xlarge", "WeightedCapacity": "56"})
        );
    }

    #[test]
    fn override_accepts_numeric_weight() {
        let o: ResolvedOverride =
            serde_json::from_str(r#"{"InstanceType":"g5.xlarge","WeightedCapacity":56}"#).unwrap();
        assert_eq!(o.weighted_capacity, 56);
    }

    #[test]
    fn override_rejects_zero_weight() {
        let err = serde_json::from_str::<ResolvedOverride>(
            r#"{"InstanceType":"g5.xlarge","WeightedCapacity":"0"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("positive integer"));
    }

    #[test]
    fn weight_value_accepts_positive_integers_only() {
        assert_eq!(WeightValue::Number(48).positive(), Some(48));
        assert_eq!(WeightValue::Text(" 25 ".into()).positive(), Some(25));
        assert_eq!(WeightValue::Number(0).positive(), None);
        assert_eq!(WeightValue::Number(-3).positive(), None);
        assert_eq!(WeightValue::Text("2.5".into()).positive(), None);
    }

    #[test]
    fn resolution_serializes_as_array() {
        let r = FleetResolution::new(vec![ovr("g5.xlarge", 56), ovr("g4dn.xlarge", 25)]);
        let text = serde_json::to_string(&r).unwrap();
        assert!(text.starts_with('['));
        let back: FleetResolution = serde_json::from_str(&text).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn names_keep_order_and_drop_duplicates() {
        let r = FleetResolution::new(vec![
            ovr("g5.xlarge", 56),
            ovr("g4dn.xlarge", 25),
            ovr("g5.xlarge", 56),
        ]);
        assert_eq!(r.names(), vec!["g5.xlarge", "g4dn.xlarge"]);
        assert_eq!(r.names_joined(), "g5.xlarge,g4dn.xlarge");
        assert_eq!(r.max_weight(), Some(56));
    }
}
