//! Filter to drop repeated articles, keeping the first occurrence.

use crate::traits::Filter;
use anyhow::Result;
use sources::{Candidate, UserContext};
use std::collections::HashSet;

/// Removes every candidate whose id already appeared earlier in the list.
///
/// Since candidates arrive best-first, the highest-ranked copy survives.
pub struct DuplicateFilter;

impl Filter for DuplicateFilter {
    fn name(&self) -> &str {
        "DuplicateFilter"
    }

    fn apply(
        &self,
        candidates: Vec<Candidate>,
        _context: &UserContext,
    ) -> Result<Vec<Candidate>> {
        let mut seen = HashSet::with_capacity(candidates.len());
        Ok(candidates
            .into_iter()
            .filter(|candidate| seen.insert(candidate.item_id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sources::CandidateSource;

    #[test]
    fn test_duplicate_filter_keeps_first() {
        let context = UserContext::new(1);
        let candidates = vec![
            Candidate::new(5, CandidateSource::Model, 0.9),
            Candidate::new(6, CandidateSource::Model, 0.8),
            Candidate::new(5, CandidateSource::Trending, 0.0),
        ];

        let filtered = DuplicateFilter.apply(candidates, &context).unwrap();

        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].item_id, 5);
        assert_eq!(filtered[0].source, CandidateSource::Model);
        assert_eq!(filtered[1].item_id, 6);
    }
}
