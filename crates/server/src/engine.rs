//! # Recommendation Engine
//!
//! This module coordinates one recommendation request:
//! 1. Build user context
//! 2. Unknown user: take the head of the trending list, done
//! 3. Known user: generate over-sampled model candidates
//! 4. Filter seen items and duplicates, stop at k
//! 5. Top up from trending (skipping seen and already chosen) if short
//!
//! The engine is immutable once built and shared across requests behind an
//! `Arc`; every call is a pure read.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, instrument};

use data_loader::{ArtifactBundle, ItemId, UserId};
use pipeline::filters::{DuplicateFilter, ExcludeFilter, LimitFilter, SeenFilter};
use pipeline::FilterPipeline;
use sources::{user_context::build_user_context, Candidate, ModelSource, TrendingSource, UserContext};

use crate::error::{EngineError, Result};

/// How a recommendation list was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Strategy {
    /// Head of the trending list; user unknown to the model
    #[serde(rename = "trending")]
    Trending,
    /// Model-ranked, seen-filtered, topped up from trending
    #[serde(rename = "lightfm_online")]
    Personalized,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Trending => "trending",
            Strategy::Personalized => "lightfm_online",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final recommendation returned to the caller
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub user_id: UserId,
    /// Ranked entries with their provenance, best first
    pub items: Vec<Candidate>,
    pub strategy: Strategy,
}

impl Recommendation {
    pub fn item_ids(&self) -> Vec<ItemId> {
        self.items.iter().map(|c| c.item_id).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Main engine that coordinates sources and filters
pub struct RecommendationEngine {
    bundle: Arc<ArtifactBundle>,
    model: ModelSource,
    trending: TrendingSource,
    filter_pipeline: FilterPipeline,
}

impl RecommendationEngine {
    /// Create a new engine over a loaded bundle
    pub fn new(bundle: Arc<ArtifactBundle>) -> Self {
        let model = ModelSource::new(bundle.clone());
        let trending = TrendingSource::new(bundle.clone());
        let filter_pipeline = FilterPipeline::new()
            .add_filter(SeenFilter)
            .add_filter(DuplicateFilter);

        Self {
            bundle,
            model,
            trending,
            filter_pipeline,
        }
    }

    /// Configure the model over-sampling factor (default: 50)
    pub fn with_oversample_factor(mut self, factor: usize) -> Self {
        self.model = self.model.with_oversample_factor(factor);
        self
    }

    pub fn bundle(&self) -> &ArtifactBundle {
        &self.bundle
    }

    /// Default recommendation count carried by the bundle
    pub fn top_k(&self) -> usize {
        self.bundle.top_k()
    }

    /// Main entry point: up to `k` recommendations for a user.
    ///
    /// Any `k` is accepted; `k = 0` yields an empty list. The result holds no
    /// duplicate and no item the user has seen (known users). It is shorter
    /// than `k` only when the model and trending lists together run out.
    #[instrument(skip(self))]
    pub fn recommend(&self, user_id: UserId, k: usize) -> Result<Recommendation> {
        let start_time = Instant::now();

        let context = build_user_context(&self.bundle, user_id);

        let recommendation = if context.is_known() {
            self.recommend_personalized(&context, k)?
        } else {
            self.recommend_trending(&context, k)
        };

        info!(
            "Recommended {} items for user {} (k={}, strategy={}) in {:.2?}",
            recommendation.len(),
            user_id,
            k,
            recommendation.strategy,
            start_time.elapsed()
        );
        Ok(recommendation)
    }

    /// Unknown user: the first `k` trending items verbatim
    fn recommend_trending(&self, context: &UserContext, k: usize) -> Recommendation {
        debug!("User {} not in model vocabulary, serving trending", context.user_id);
        Recommendation {
            user_id: context.user_id,
            items: self.trending.get_candidates(context, k),
            strategy: Strategy::Trending,
        }
    }

    fn recommend_personalized(&self, context: &UserContext, k: usize) -> Result<Recommendation> {
        let candidates = self
            .model
            .get_candidates(context, k)
            .map_err(|e| EngineError::Computation(format!("{:#}", e)))?;
        let candidate_count = candidates.len();

        let mut items = self
            .filter_pipeline
            .apply(candidates, context)
            .map_err(|e| EngineError::Computation(format!("{:#}", e)))?;
        items.truncate(k);
        debug!(
            "Model candidates: {} scored, {} after filtering (seen={})",
            candidate_count,
            items.len(),
            context.seen_count()
        );

        if items.len() < k {
            let top_up = self.top_up_from_trending(context, &items, k - items.len())?;
            debug!("Topped up {} items from trending", top_up.len());
            items.extend(top_up);
        }

        Ok(Recommendation {
            user_id: context.user_id,
            items,
            strategy: Strategy::Personalized,
        })
    }

    /// Walk the trending list in order, skipping seen and already chosen items
    fn top_up_from_trending(
        &self,
        context: &UserContext,
        chosen: &[Candidate],
        needed: usize,
    ) -> Result<Vec<Candidate>> {
        let fallback = FilterPipeline::new()
            .add_filter(SeenFilter)
            .add_filter(ExcludeFilter::new(chosen.iter().map(|c| c.item_id)))
            .add_filter(DuplicateFilter)
            .add_filter(LimitFilter::new(needed));

        fallback
            .apply(self.trending.get_candidates(context, self.trending.len()), context)
            .map_err(|e| EngineError::Computation(format!("{:#}", e)))
    }
}

impl fmt::Debug for RecommendationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecommendationEngine")
            .field("bundle", &self.bundle)
            .field("oversample_factor", &self.model.oversample_factor())
            .field("filters", &self.filter_pipeline.filter_names())
            .finish()
    }
}
