//! In-process provider implementations.
//!
//! Used by tests across the workspace, by `hashfleet resolve --offline`, and
//! by `hashfleet size --dry-run`.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tracing::info;

use hashfleet_core::Offering;

use crate::error::SourceError;
use crate::source::{OfferingsPage, OfferingsSource, ScalingGroup};

/// Static offerings per region, with optional paging and scripted failures.
#[derive(Debug, Default)]
pub struct InMemoryOfferings {
    offered: BTreeMap<String, BTreeSet<String>>,
    page_size: Option<usize>,
    failures: HashMap<usize, SourceError>,
    calls: AtomicUsize,
    max_names: AtomicUsize,
}

impl InMemoryOfferings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offer<I, S>(mut self, region: &str, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.offered
            .entry(region.to_string())
            .or_default()
            .extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size.max(1));
        self
    }

    /// Fail the call with zero-based index `call` once.
    pub fn fail_at(mut self, call: usize, error: SourceError) -> Self {
        self.failures.insert(call, error);
        self
    }

    /// Fail the call that follows `successes` calls.
    pub fn fail_after(self, successes: usize, error: SourceError) -> Self {
        self.fail_at(successes, error)
    }

    /// Fail the first call not already scripted to fail.
    pub fn fail_next(self, error: SourceError) -> Self {
        let next = (0..).find(|i| !self.failures.contains_key(i)).unwrap_or(0);
        self.fail_at(next, error)
    }

    /// Total calls made, failures included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Largest name filter seen in a single call.
    pub fn max_names_per_call(&self) -> usize {
        self.max_names.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OfferingsSource for InMemoryOfferings {
    async fn offerings_page(
        &self,
        region: &str,
        names: &[String],
        next_token: Option<String>,
    ) -> Result<OfferingsPage, SourceError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.max_names.fetch_max(names.len(), Ordering::SeqCst);

        if let Some(error) = self.failures.get(&call) {
            return Err(error.clone());
        }

        let matching: Vec<&String> = self
            .offered
            .get(region)
            .map(|set| set.iter().filter(|n| names.contains(*n)).collect())
            .unwrap_or_default();

        let start = match next_token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| SourceError::Fatal(format!("invalid next token '{token}'")))?,
            None => 0,
        };
        let page_size = self.page_size.unwrap_or(matching.len().max(1));
        let end = (start + page_size).min(matching.len());

        let offerings = matching
            .get(start..end)
            .unwrap_or_default()
            .iter()
            .map(|name| Offering::new(name.as_str(), region))
            .collect();
        let next_token = (end < matching.len()).then(|| end.to_string());

        Ok(OfferingsPage {
            offerings,
            next_token,
        })
    }
}

/// Records capacity changes instead of applying them.
#[derive(Debug, Default)]
pub struct RecordingScalingGroup {
    applied: Mutex<Vec<(String, u32)>>,
    failures: HashMap<usize, SourceError>,
    calls: AtomicUsize,
}

impl RecordingScalingGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_at(mut self, call: usize, error: SourceError) -> Self {
        self.failures.insert(call, error);
        self
    }

    /// Successfully applied `(group, capacity)` pairs, in order.
    pub fn applied(&self) -> Vec<(String, u32)> {
        self.applied
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScalingGroup for RecordingScalingGroup {
    async fn set_desired_capacity(&self, group: &str, capacity: u32) -> Result<(), SourceError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.failures.get(&call) {
            return Err(error.clone());
        }

        info!(group, capacity, "dry run: desired capacity not applied");
        self.applied
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((group.to_string(), capacity));
        Ok(())
    }
}
