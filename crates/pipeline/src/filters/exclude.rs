//! Filter to remove a fixed set of articles.
//!
//! Used when topping up a partial result: items already chosen must not be
//! offered a second time.

use crate::traits::Filter;
use anyhow::Result;
use data_loader::ItemId;
use sources::{Candidate, UserContext};
use std::collections::HashSet;

/// Removes candidates whose id is in the exclusion set.
pub struct ExcludeFilter {
    excluded: HashSet<ItemId>,
}

impl ExcludeFilter {
    /// Create a new ExcludeFilter from any collection of ids.
    pub fn new(excluded: impl IntoIterator<Item = ItemId>) -> Self {
        Self {
            excluded: excluded.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.excluded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.excluded.is_empty()
    }
}

impl Filter for ExcludeFilter {
    fn name(&self) -> &str {
        "ExcludeFilter"
    }

    fn apply(
        &self,
        candidates: Vec<Candidate>,
        _context: &UserContext,
    ) -> Result<Vec<Candidate>> {
        if self.excluded.is_empty() {
            return Ok(candidates);
        }
        Ok(candidates
            .into_iter()
            .filter(|candidate| !self.excluded.contains(&candidate.item_id))
            .collect())
    }
}
