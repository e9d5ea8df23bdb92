//! Model Source - factorization-model candidates
//!
//! Scores every item in the bundle for a known user and keeps the best ones.
//!
//! ## Algorithm
//! 1. Score all items `[0, n_items)` with the full item-feature matrix
//! 2. `candidate_n = min(n_items, k * oversample_factor)`
//! 3. Partial selection of the top `candidate_n` (`select_nth_unstable_by`),
//!    then a full sort of only that set
//! 4. Map ItemIndex -> ItemId
//!
//! Over-sampling leaves room for the seen filter downstream: most of the
//! `k * 50` candidates survive even for users with long histories.
//!
//! Ordering is descending score, ties broken by ascending ItemIndex, NaN
//! scores below every real score. The output is deterministic for a given
//! bundle and user.

use crate::types::{Candidate, UserContext};
use anyhow::{anyhow, bail, Context, Result};
use data_loader::{ArtifactBundle, ItemIndex};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Default over-sampling factor applied to k
pub const DEFAULT_OVERSAMPLE_FACTOR: usize = 50;

/// Model source generates scored candidates for users known to the model
pub struct ModelSource {
    /// Shared reference to the artifact bundle (read-only, so no Mutex needed)
    bundle: Arc<ArtifactBundle>,

    /// How many candidates to keep per requested item
    oversample_factor: usize,
}

impl ModelSource {
    /// Create a new Model source
    pub fn new(bundle: Arc<ArtifactBundle>) -> Self {
        Self {
            bundle,
            oversample_factor: DEFAULT_OVERSAMPLE_FACTOR,
        }
    }

    /// Configure the over-sampling factor (default: 50, minimum 1)
    pub fn with_oversample_factor(mut self, factor: usize) -> Self {
        self.oversample_factor = factor.max(1);
        self
    }

    pub fn oversample_factor(&self) -> usize {
        self.oversample_factor
    }

    /// Number of candidates kept for a request of `k` items
    pub fn candidate_count(&self, k: usize) -> usize {
        self.bundle
            .n_items()
            .min(k.saturating_mul(self.oversample_factor))
    }

    /// Generate ranked candidates for a known user.
    ///
    /// Returns up to `candidate_count(k)` candidates, best first. Fails if the
    /// user has no model index or the scorer misbehaves.
    #[instrument(skip(self, user_context), fields(user_id = user_context.user_id))]
    pub fn get_candidates(&self, user_context: &UserContext, k: usize) -> Result<Vec<Candidate>> {
        let user_index = user_context
            .user_index
            .ok_or_else(|| anyhow!("User {} is not known to the model", user_context.user_id))?;

        let candidate_n = self.candidate_count(k);
        if candidate_n == 0 {
            return Ok(Vec::new());
        }

        let items = self.bundle.all_item_indices();
        let scores = self
            .bundle
            .model()
            .score(user_index, items, self.bundle.item_features())
            .with_context(|| format!("Scoring failed for user index {}", user_index))?;

        if scores.len() != items.len() {
            bail!(
                "Model returned {} scores for {} items",
                scores.len(),
                items.len()
            );
        }
        debug!("Scored {} items for user index {}", scores.len(), user_index);

        let candidates = top_n_indices(&scores, candidate_n)
            .into_iter()
            .map(|idx| {
                let item_id = self
                    .bundle
                    .item_id(idx)
                    .ok_or_else(|| anyhow!("No item id for index {}", idx))?;
                Ok(Candidate::scored(item_id, idx, scores[idx]))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "Generated {} model candidates (k={}, oversample={})",
            candidates.len(),
            k,
            self.oversample_factor
        );
        Ok(candidates)
    }
}

/// Ranking order for two scored items: higher score first, NaN last, then
/// lower index first.
fn rank_order(scores: &[f32], a: ItemIndex, b: ItemIndex) -> Ordering {
    let (sa, sb) = (scores[a], scores[b]);
    let by_score = match (sa.is_nan(), sb.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => sb.partial_cmp(&sa).unwrap_or(Ordering::Equal),
    };
    by_score.then(a.cmp(&b))
}

/// Indices of the `n` best scores, best first.
///
/// Two-phase: O(len) partial selection, then O(n log n) sort of the kept
/// set. `n` larger than `scores.len()` returns every index.
pub fn top_n_indices(scores: &[f32], n: usize) -> Vec<ItemIndex> {
    let n = n.min(scores.len());
    if n == 0 {
        return Vec::new();
    }

    let mut indices: Vec<ItemIndex> = (0..scores.len()).collect();
    if n < indices.len() {
        indices.select_nth_unstable_by(n - 1, |&a, &b| rank_order(scores, a, b));
        indices.truncate(n);
    }
    indices.sort_unstable_by(|&a, &b| rank_order(scores, a, b));
    indices
}
