//! ArtifactBundle assembly and validation.
//!
//! Loading runs in three steps:
//! 1. Locate (or download) the four artifacts
//! 2. Parse them in parallel with Rayon
//! 3. Check the cross-artifact invariants and build the bundle
//!
//! A bundle either passes every check or is not built at all.

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::store::ArtifactLocation;
use crate::types::*;
use scorer::{Scorer, SparseMatrix};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

impl ArtifactBundle {
    /// Assemble a bundle from already-parsed artifacts.
    ///
    /// Checks:
    /// - matrix rows == size of `idx_to_item`, which must cover `[0, n_items)`
    /// - matrix columns == the model's item-feature count
    /// - every user index is valid for the model
    ///
    /// Duplicate ids in `trending` are dropped, keeping the highest-ranked one.
    pub fn new(
        model: Arc<dyn Scorer>,
        item_features: SparseMatrix,
        mappings: Mappings,
        trending: Vec<ItemId>,
    ) -> Result<Self> {
        let n_items = item_features.n_rows();

        if mappings.idx_to_item.len() != n_items {
            return Err(DataLoadError::ShapeMismatch {
                what: "idx_to_item".to_string(),
                expected: n_items,
                found: mappings.idx_to_item.len(),
            });
        }
        let idx_to_item = mappings.idx_to_item.into_dense(n_items).map_err(|idx| {
            DataLoadError::ValidationError(format!(
                "idx_to_item does not cover item index {} of [0, {})",
                idx, n_items
            ))
        })?;

        if item_features.n_cols() != model.n_item_features() {
            return Err(DataLoadError::ShapeMismatch {
                what: "item feature columns".to_string(),
                expected: model.n_item_features(),
                found: item_features.n_cols(),
            });
        }

        let n_model_users = model.n_users();
        if let Some((user_id, idx)) = mappings
            .user_to_idx
            .iter()
            .find(|&(_, &idx)| idx >= n_model_users)
        {
            return Err(DataLoadError::ValidationError(format!(
                "user {} maps to index {} but the model has {} users",
                user_id, idx, n_model_users
            )));
        }

        if mappings.top_k == 0 {
            return Err(DataLoadError::InvalidValue {
                field: "top_k".to_string(),
                value: "0".to_string(),
            });
        }

        let trending = dedup_trending(trending);

        Ok(Self {
            model,
            item_features,
            user_to_idx: mappings.user_to_idx,
            idx_to_item,
            user_seen: mappings.user_seen,
            top_k: mappings.top_k,
            trending,
            all_item_idx: (0..n_items).collect(),
        })
    }

    /// Load a bundle from a directory holding the four artifacts
    pub fn load_from_dir(dir: &Path, names: &ArtifactNames) -> Result<Self> {
        let start = Instant::now();
        info!("Loading artifact bundle from {:?}", dir);

        let model_path = dir.join(&names.model);
        let features_path = dir.join(&names.item_features);
        let mappings_path = dir.join(&names.mappings);
        let trending_path = dir.join(&names.trending);

        // Parse all four artifacts in parallel; nested joins give four-way parallelism
        let ((model, item_features), (mappings, trending)) = rayon::join(
            || {
                rayon::join(
                    || parser::parse_model(&model_path),
                    || parser::parse_item_features(&features_path),
                )
            },
            || {
                rayon::join(
                    || parser::parse_mappings(&mappings_path),
                    || parser::parse_trending(&trending_path),
                )
            },
        );

        let bundle = Self::new(Arc::new(model?), item_features?, mappings?, trending?)?;

        let counts = bundle.counts();
        info!(
            "Artifact bundle loaded in {:.2?}: users={} items={} features={} trending={} top_k={}",
            start.elapsed(),
            counts.users,
            counts.items,
            counts.item_features,
            counts.trending,
            counts.top_k
        );
        Ok(bundle)
    }

    /// Fetch the artifacts from `location` and load them.
    ///
    /// Remote artifacts are copied into a temporary directory that is removed
    /// once parsing is done.
    pub fn load(location: &ArtifactLocation, names: &ArtifactNames) -> Result<Self> {
        let local = location.fetch(names)?;
        Self::load_from_dir(local.dir(), names)
    }
}

/// Remove repeated ids, keeping the first (highest-ranked) occurrence
fn dedup_trending(trending: Vec<ItemId>) -> Vec<ItemId> {
    let mut seen = HashSet::with_capacity(trending.len());
    let before = trending.len();
    let deduped: Vec<ItemId> = trending.into_iter().filter(|id| seen.insert(*id)).collect();

    if deduped.len() != before {
        warn!(
            "Trending list had {} duplicate ids; kept first occurrences",
            before - deduped.len()
        );
    }
    deduped
}
