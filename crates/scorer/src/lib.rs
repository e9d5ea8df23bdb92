//! Relevance scoring for the recommendation engine.
//!
//! This crate owns the "model" side of serving:
//! - The `Scorer` capability the engine calls to score items for a user
//! - `SparseMatrix`, the CSR item-feature matrix handed to every scoring call
//! - `FactorizationModel`, the bundled hybrid matrix-factorization scorer
//!
//! The engine only relies on the `Scorer` contract: given a user index and a
//! slice of item indices, return one score per item, positionally aligned.
//! Anything that honours that contract can be swapped in.

pub mod factorization;
pub mod matrix;

use thiserror::Error;

pub use factorization::FactorizationModel;
pub use matrix::SparseMatrix;

/// Dense row index of a trained user inside the model
pub type UserIndex = usize;

/// Dense row index of an item inside the model, in `[0, n_items)`
pub type ItemIndex = usize;

/// Errors that can occur while validating or invoking a scorer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoreError {
    #[error("User index {index} out of range (model has {n_users} users)")]
    UnknownUser { index: UserIndex, n_users: usize },

    #[error("Item index {index} out of range (feature matrix has {n_items} rows)")]
    ItemOutOfRange { index: ItemIndex, n_items: usize },

    #[error("Shape mismatch for {what}: expected {expected}, found {found}")]
    ShapeMismatch {
        what: String,
        expected: usize,
        found: usize,
    },

    #[error("Invalid model: {0}")]
    InvalidModel(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, ScoreError>;

/// Capability interface for anything that can score items for a user.
///
/// `Send + Sync` because one scorer is shared by every in-flight request.
pub trait Scorer: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Number of users the scorer was trained on
    fn n_users(&self) -> usize;

    /// Number of item-feature columns the scorer expects
    fn n_item_features(&self) -> usize;

    /// Score `items` for `user`.
    ///
    /// The returned vector has exactly `items.len()` entries and entry `i`
    /// is the score of `items[i]`.
    fn score(
        &self,
        user: UserIndex,
        items: &[ItemIndex],
        features: &SparseMatrix,
    ) -> Result<Vec<f32>>;
}
