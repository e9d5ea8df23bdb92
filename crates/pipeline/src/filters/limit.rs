//! Filter to cap the candidate count.

use crate::traits::Filter;
use anyhow::Result;
use sources::{Candidate, UserContext};

/// Keeps only the first `limit` candidates.
pub struct LimitFilter {
    limit: usize,
}

impl LimitFilter {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }
}

impl Filter for LimitFilter {
    fn name(&self) -> &str {
        "LimitFilter"
    }

    fn apply(
        &self,
        mut candidates: Vec<Candidate>,
        _context: &UserContext,
    ) -> Result<Vec<Candidate>> {
        candidates.truncate(self.limit);
        Ok(candidates)
    }
}
