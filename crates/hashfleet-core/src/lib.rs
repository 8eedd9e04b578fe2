//! hashfleet-core — the decision logic behind a weighted GPU mining fleet.
//!
//! Turns an instance-type specification such as `"g4dn.*,g5.*,-p4d.*"` and
//! a catalogue of weighted candidate types into the ordered override list of
//! an autoscaling group's mixed-instance policy, and turns a hashrate target
//! into the group's desired capacity.
//!
//! # Components
//!
//! - **`pattern`** — specification parsing and single-wildcard matching
//! - **`catalogue`** — candidate types, weights, regional exclusions
//! - **`resolver`** — rules + catalogue + live offerings → overrides
//! - **`sizer`** — hashrate target → desired capacity
//!
//! Nothing here performs I/O. Live offerings are fetched by
//! `hashfleet-provider` and passed in.

pub mod catalogue;
pub mod error;
pub mod pattern;
pub mod resolver;
pub mod sizer;
pub mod types;

pub use catalogue::{CandidateType, Catalogue, CatalogueEntry};
pub use error::{FleetError, FleetResult};
pub use pattern::{MatchRule, Pattern, RuleKind, parse_spec, render_spec};
pub use resolver::{resolve, select};
pub use sizer::{CapacityRequest, MAX_DESIRED_CAPACITY, parse_target, size};
pub use types::*;
