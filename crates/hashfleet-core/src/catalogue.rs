//! Candidate instance-type catalogue.
//!
//! The catalogue is plain configuration handed to the resolver. It arrives
//! either as the `InstanceTypesAttributes` array of a stack event or from a
//! TOML file of `[[instance_type]]` tables. A built-in table ships with the
//! crate.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FleetError, FleetResult};
use crate::types::{ResolvedOverride, WeightValue};

const BUILTIN_CATALOGUE: &str = include_str!("../catalogue.toml");

/// An instance type eligible for the fleet.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateType {
    pub name: String,
    /// Hashrate-equivalent weight. Always positive.
    pub weighted_capacity: u32,
    /// Regions where this type must never be used, regardless of offerings.
    pub excluded_regions: BTreeSet<String>,
    /// Opaque launch template reference, passed through to the override.
    pub launch_template: Option<serde_json::Value>,
}

impl CandidateType {
    pub fn new(
        name: impl Into<String>,
        weighted_capacity: u32,
        excluded_regions: impl IntoIterator<Item = impl Into<String>>,
        launch_template: Option<serde_json::Value>,
    ) -> FleetResult<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(FleetError::InvalidCatalogue(
                "instance type name is empty".to_string(),
            ));
        }
        if weighted_capacity == 0 {
            return Err(FleetError::InvalidCatalogue(format!(
                "{name}: weighted capacity must be positive"
            )));
        }
        Ok(Self {
            name,
            weighted_capacity,
            excluded_regions: excluded_regions.into_iter().map(Into::into).collect(),
            launch_template,
        })
    }

    pub fn is_excluded_in(&self, region: &str) -> bool {
        self.excluded_regions.contains(region)
    }

    pub fn to_override(&self) -> ResolvedOverride {
        ResolvedOverride {
            instance_type: self.name.clone(),
            weighted_capacity: self.weighted_capacity,
            launch_template: self.launch_template.clone(),
        }
    }
}

impl WeightValue {
    fn to_weight(&self, name: &str) -> FleetResult<u32> {
        self.positive().ok_or_else(|| {
            FleetError::InvalidCatalogue(format!(
                "{name}: WeightedCapacity {self:?} is not a positive integer"
            ))
        })
    }
}

/// One element of the event's `InstanceTypesAttributes` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CatalogueEntry {
    pub instance_type: String,
    pub weighted_capacity: WeightValue,
    #[serde(
        rename = "LaunchTemplateSpecification",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub launch_template: Option<serde_json::Value>,
    #[serde(
        rename = "_ExcludeInRegions",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub exclude_in_regions: Vec<String>,
}

impl CatalogueEntry {
    pub fn into_candidate(self) -> FleetResult<CandidateType> {
        let weight = self.weighted_capacity.to_weight(&self.instance_type)?;
        CandidateType::new(
            self.instance_type,
            weight,
            self.exclude_in_regions,
            self.launch_template,
        )
    }
}

#[derive(Debug, Deserialize)]
struct CatalogueFile {
    #[serde(default)]
    instance_type: Vec<CatalogueFileEntry>,
}

#[derive(Debug, Deserialize)]
struct CatalogueFileEntry {
    name: String,
    weighted_capacity: u32,
    #[serde(default)]
    exclude_in_regions: Vec<String>,
    launch_template: Option<serde_json::Value>,
}

/// Ordered set of candidate types with unique names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalogue {
    candidates: Vec<CandidateType>,
}

impl Catalogue {
    pub fn new(candidates: Vec<CandidateType>) -> FleetResult<Self> {
        let mut seen = HashSet::new();
        for c in &candidates {
            if !seen.insert(c.name.as_str()) {
                return Err(FleetError::InvalidCatalogue(format!(
                    "duplicate instance type {}",
                    c.name
                )));
            }
        }
        Ok(Self { candidates })
    }

    /// Build from the stack's `InstanceTypesAttributes`.
    pub fn from_entries(entries: Vec<CatalogueEntry>) -> FleetResult<Self> {
        let candidates = entries
            .into_iter()
            .map(CatalogueEntry::into_candidate)
            .collect::<FleetResult<Vec<_>>>()?;
        Self::new(candidates)
    }

    pub fn from_toml_str(content: &str) -> FleetResult<Self> {
        let file: CatalogueFile = toml::from_str(content)
            .map_err(|e| FleetError::InvalidCatalogue(e.to_string()))?;
        let candidates = file
            .instance_type
            .into_iter()
            .map(|e| {
                CandidateType::new(
                    e.name,
                    e.weighted_capacity,
                    e.exclude_in_regions,
                    e.launch_template,
                )
            })
            .collect::<FleetResult<Vec<_>>>()?;
        Self::new(candidates)
    }

    pub fn from_file(path: &Path) -> FleetResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FleetError::InvalidCatalogue(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// The GPU catalogue bundled with the crate.
    pub fn builtin() -> FleetResult<Self> {
        Self::from_toml_str(BUILTIN_CATALOGUE)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CandidateType> {
        self.candidates.iter()
    }

    pub fn get(&self, name: &str) -> Option<&CandidateType> {
        self.candidates.iter().find(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Back to the stack's attribute shape.
    pub fn to_entries(&self) -> Vec<CatalogueEntry> {
        self.candidates
            .iter()
            .map(|c| CatalogueEntry {
                instance_type: c.name.clone(),
                weighted_capacity: WeightValue::Text(c.weighted_capacity.to_string()),
                launch_template: c.launch_template.clone(),
                exclude_in_regions: c.excluded_regions.iter().cloned().collect(),
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a Catalogue {
    type Item = &'a CandidateType;
    type IntoIter = std::slice::Iter<'a, CandidateType>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.iter()
    }
}
