//! Ordered composition of [`Filter`]s.

use crate::traits::Filter;
use anyhow::Result;
use sources::{Candidate, UserContext};
use tracing::debug;

/// Runs its filters in insertion order over one candidate list.
///
/// ## Usage
/// ```ignore
/// let pipeline = FilterPipeline::new()
///     .add_filter(SeenFilter)
///     .add_filter(ExcludeFilter::new(chosen))
///     .add_filter(LimitFilter::new(remaining));
///
/// let filtered = pipeline.apply(candidates, &context)?;
/// ```
pub struct FilterPipeline {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterPipeline {
    /// A pipeline that passes everything through
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Append a filter; it runs after every filter already added
    pub fn add_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Names of the configured filters, in application order
    pub fn filter_names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Apply all filters in sequence to the candidates.
    ///
    /// Each step is logged with its input and output counts. Stops early once
    /// nothing is left, and at the first failing filter.
    pub fn apply(
        &self,
        candidates: Vec<Candidate>,
        context: &UserContext,
    ) -> Result<Vec<Candidate>> {
        let mut current = candidates;
        for filter in &self.filters {
            if current.is_empty() {
                break;
            }
            let before = current.len();
            current = filter.apply(current, context)?;
            debug!("{}: {} -> {} candidates", filter.name(), before, current.len());
        }
        Ok(current)
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new()
    }
}
