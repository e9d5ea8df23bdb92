//! Hybrid matrix-factorization scorer.
//!
//! Users are represented by one embedding row and one bias each. Items are
//! represented through their features: an item's embedding is the
//! feature-weighted sum of feature embeddings, and likewise for its bias.
//!
//! score(u, i) = <user_embedding[u], item_repr(i)> + user_bias[u] + item_bias(i)
//!
//! With an identity item-feature matrix this reduces to plain
//! matrix factorization with one embedding per item.

use crate::matrix::SparseMatrix;
use crate::{ItemIndex, Result, ScoreError, Scorer, UserIndex};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Factorization model weights, as exported by the training job.
///
/// Embedding tables are stored row-major with `no_components` columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorizationModel {
    no_components: usize,
    user_embeddings: Vec<f32>,
    user_biases: Vec<f32>,
    item_embeddings: Vec<f32>,
    item_biases: Vec<f32>,
}

impl FactorizationModel {
    /// Build a model from its weight tables, validating their shapes
    pub fn new(
        no_components: usize,
        user_embeddings: Vec<f32>,
        user_biases: Vec<f32>,
        item_embeddings: Vec<f32>,
        item_biases: Vec<f32>,
    ) -> Result<Self> {
        let model = Self {
            no_components,
            user_embeddings,
            user_biases,
            item_embeddings,
            item_biases,
        };
        model.validate()?;
        Ok(model)
    }

    /// Latent dimensionality
    pub fn no_components(&self) -> usize {
        self.no_components
    }

    /// Check that the weight tables agree with each other.
    pub fn validate(&self) -> Result<()> {
        if self.no_components == 0 {
            return Err(ScoreError::InvalidModel(
                "no_components must be at least 1".to_string(),
            ));
        }

        let n_users = self.user_biases.len();
        let n_features = self.item_biases.len();

        check_table("user_embeddings", self.user_embeddings.len(), n_users, self.no_components)?;
        check_table("item_embeddings", self.item_embeddings.len(), n_features, self.no_components)?;
        Ok(())
    }

    fn user_row(&self, user: UserIndex) -> &[f32] {
        let d = self.no_components;
        &self.user_embeddings[user * d..(user + 1) * d]
    }

    fn feature_row(&self, feature: usize) -> &[f32] {
        let d = self.no_components;
        &self.item_embeddings[feature * d..(feature + 1) * d]
    }

    /// Score a single item row against a user representation
    fn score_item(&self, user_repr: &[f32], user_bias: f32, features: &SparseMatrix, item: ItemIndex) -> f32 {
        let mut item_repr = vec![0.0f32; self.no_components];
        let mut item_bias = 0.0f32;

        for (feature, value) in features.row(item) {
            for (acc, w) in item_repr.iter_mut().zip(self.feature_row(feature)) {
                *acc += value * w;
            }
            item_bias += value * self.item_biases[feature];
        }

        let dot: f32 = user_repr.iter().zip(&item_repr).map(|(u, i)| u * i).sum();
        dot + user_bias + item_bias
    }
}

/// `found` must equal `rows * no_components`
fn check_table(what: &str, found: usize, rows: usize, no_components: usize) -> Result<()> {
    let expected = rows.checked_mul(no_components).ok_or_else(|| {
        ScoreError::InvalidModel(format!(
            "{}: {} rows x {} components overflows",
            what, rows, no_components
        ))
    })?;
    if found != expected {
        return Err(ScoreError::ShapeMismatch {
            what: what.to_string(),
            expected,
            found,
        });
    }
    Ok(())
}

impl Scorer for FactorizationModel {
    fn name(&self) -> &str {
        "factorization"
    }

    fn n_users(&self) -> usize {
        self.user_biases.len()
    }

    fn n_item_features(&self) -> usize {
        self.item_biases.len()
    }

    fn score(
        &self,
        user: UserIndex,
        items: &[ItemIndex],
        features: &SparseMatrix,
    ) -> Result<Vec<f32>> {
        if user >= self.n_users() {
            return Err(ScoreError::UnknownUser {
                index: user,
                n_users: self.n_users(),
            });
        }
        if features.n_cols() != self.n_item_features() {
            return Err(ScoreError::ShapeMismatch {
                what: "item feature columns".to_string(),
                expected: self.n_item_features(),
                found: features.n_cols(),
            });
        }
        if let Some(&index) = items.iter().find(|&&i| i >= features.n_rows()) {
            return Err(ScoreError::ItemOutOfRange {
                index,
                n_items: features.n_rows(),
            });
        }

        debug!("Scoring {} items for user index {}", items.len(), user);

        let user_repr = self.user_row(user);
        let user_bias = self.user_biases[user];

        // par_iter over a slice keeps output order aligned with `items`
        let scores = items
            .par_iter()
            .map(|&item| self.score_item(user_repr, user_bias, features, item))
            .collect();
        Ok(scores)
    }
}
