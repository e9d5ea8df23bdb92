//! # Sources Crate
//!
//! This crate implements candidate generation sources for article recommendations.
//!
//! ## Components
//!
//! ### Model Source
//! Personalised candidates from the factorization model:
//! - Scores every item for a known user
//! - Over-samples `k * 50` candidates so seen-filtering rarely runs dry
//! - Partial selection + sort of the kept set only
//!
//! ### Trending Source
//! The precomputed trending list, in rank order:
//! - Sole source for users outside the model vocabulary
//! - Tops up model results that fall short after filtering
//!
//! ## Example Usage
//!
//! ```ignore
//! use sources::{ModelSource, TrendingSource, user_context::build_user_context};
//! use std::sync::Arc;
//!
//! let bundle = Arc::new(bundle);
//! let context = build_user_context(&bundle, user_id);
//!
//! let model = ModelSource::new(bundle.clone());
//! let trending = TrendingSource::new(bundle.clone());
//!
//! let scored = model.get_candidates(&context, 10)?;
//! let fallback = trending.get_candidates(&context, trending.len());
//! ```

// Public modules
pub mod types;
pub mod user_context;
pub mod model_source;
pub mod trending;

// Re-export commonly used types
pub use types::{Candidate, CandidateMetadata, CandidateSource, UserContext};
pub use model_source::{top_n_indices, ModelSource, DEFAULT_OVERSAMPLE_FACTOR};
pub use trending::TrendingSource;


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_creation() {
        let candidate = Candidate::new(1, CandidateSource::Model, 0.85);
        assert_eq!(candidate.item_id, 1);
        assert_eq!(candidate.source, CandidateSource::Model);
        assert_eq!(candidate.base_score, 0.85);
        assert_eq!(candidate.metadata, CandidateMetadata::default());
    }

    #[test]
    fn test_candidate_provenance() {
        let scored = Candidate::scored(11, 1, 0.9);
        assert_eq!(scored.metadata.item_index, Some(1));
        assert_eq!(scored.metadata.trending_rank, None);

        let trending = Candidate::trending(99, 0);
        assert_eq!(trending.source, CandidateSource::Trending);
        assert_eq!(trending.metadata.trending_rank, Some(0));
        assert_eq!(trending.source.to_string(), "trending");
    }
}
