//! Trending Source - popularity fallback
//!
//! Serves the precomputed trending list in rank order. Used on its own for
//! users the model has never seen, and to top up model results that ran
//! short after seen-filtering.

use crate::types::{Candidate, UserContext};
use data_loader::ArtifactBundle;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Trending source yields the bundle's trending list as candidates
pub struct TrendingSource {
    /// Shared reference to the artifact bundle
    bundle: Arc<ArtifactBundle>,
}

impl TrendingSource {
    /// Create a new Trending source
    pub fn new(bundle: Arc<ArtifactBundle>) -> Self {
        Self { bundle }
    }

    /// Total length of the trending list
    pub fn len(&self) -> usize {
        self.bundle.trending().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundle.trending().is_empty()
    }

    /// First `limit` trending items in rank order.
    ///
    /// No personalisation happens here; filtering by the context is left to
    /// the pipeline.
    #[instrument(skip(self, user_context), fields(user_id = user_context.user_id))]
    pub fn get_candidates(&self, user_context: &UserContext, limit: usize) -> Vec<Candidate> {
        let candidates: Vec<Candidate> = self
            .bundle
            .trending()
            .iter()
            .take(limit)
            .enumerate()
            .map(|(rank, &item_id)| Candidate::trending(item_id, rank))
            .collect();

        debug!("Generated {} trending candidates", candidates.len());
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::create_test_bundle;
    use crate::types::CandidateSource;

    #[test]
    fn test_get_candidates_in_rank_order() {
        let trending = TrendingSource::new(Arc::new(create_test_bundle()));
        let context = UserContext::new(999);

        let candidates = trending.get_candidates(&context, 2);
        let ids: Vec<_> = candidates.iter().map(|c| c.item_id).collect();

        assert_eq!(ids, vec![99, 98]);
        assert_eq!(candidates[1].metadata.trending_rank, Some(1));
        assert!(candidates.iter().all(|c| c.source == CandidateSource::Trending));
    }

    #[test]
    fn test_limit_beyond_list() {
        let trending = TrendingSource::new(Arc::new(create_test_bundle()));
        let context = UserContext::new(999);

        assert_eq!(trending.get_candidates(&context, 50).len(), trending.len());
        assert!(trending.get_candidates(&context, 0).is_empty());
    }
}
