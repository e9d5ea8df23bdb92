//! Server crate for the article recommendation engine.
//!
//! This crate contains the engine that coordinates sources and filters, the
//! lazily-loaded engine cell, and the HTTP surface around them.
//!
//! - **engine**: `RecommendationEngine::recommend(user_id, k)`
//! - **loader**: `EngineLoader` trait and the single-flight `EngineCell`
//! - **http**: axum router (`/recommend`, `/api/recommend`, `/health`)
//! - **config**: environment-driven `ServerConfig`

pub mod config;
pub mod engine;
pub mod error;
pub mod http;
pub mod loader;

pub use config::{ConfigError, ServerConfig};
pub use engine::{Recommendation, RecommendationEngine, Strategy};
pub use error::EngineError;
pub use http::{router, serve, AppState};
pub use loader::{ArtifactEngineLoader, EngineCell, EngineLoader};

#[cfg(test)]
pub(crate) mod test_support {
    use data_loader::{ArtifactBundle, IdxToItem, ItemId, Mappings};
    use scorer::{FactorizationModel, SparseMatrix};
    use std::collections::{HashMap, HashSet};
    use std::path::Path;
    use std::sync::Arc;

    /// Single-user model whose item scores are `scores`, one item per feature
    fn model(scores: Vec<f32>) -> FactorizationModel {
        let n = scores.len();
        FactorizationModel::new(1, vec![1.0], vec![0.0], scores, vec![0.0; n]).unwrap()
    }

    /// idx0 -> 10, idx1 -> 11; user 1 -> idx0 and has seen 10
    pub fn scenario_mappings() -> Mappings {
        Mappings {
            user_to_idx: HashMap::from([(1, 0)]),
            idx_to_item: IdxToItem::Dense(vec![10, 11]),
            user_seen: HashMap::from([(1, HashSet::from([10]))]),
            top_k: 5,
        }
    }

    /// Scores [0.1, 0.9], trending [99, 98, 97]
    pub fn scenario_bundle_from(mappings: Mappings) -> ArtifactBundle {
        ArtifactBundle::new(
            Arc::new(model(vec![0.1, 0.9])),
            SparseMatrix::identity(2),
            mappings,
            vec![99, 98, 97],
        )
        .unwrap()
    }

    pub fn scenario_bundle() -> ArtifactBundle {
        scenario_bundle_from(scenario_mappings())
    }

    /// Bundle for user 1 with the given per-item scores, ids, seen set and trending
    pub fn bundle_with(
        scores: Vec<f32>,
        item_ids: Vec<ItemId>,
        seen: HashSet<ItemId>,
        trending: Vec<ItemId>,
    ) -> ArtifactBundle {
        let n = scores.len();
        let mappings = Mappings {
            user_to_idx: HashMap::from([(1, 0)]),
            idx_to_item: IdxToItem::Dense(item_ids),
            user_seen: HashMap::from([(1, seen)]),
            top_k: 5,
        };
        ArtifactBundle::new(Arc::new(model(scores)), SparseMatrix::identity(n), mappings, trending)
            .unwrap()
    }

    /// Write the scenario bundle as artifact files
    pub fn write_scenario_artifacts(dir: &Path) {
        std::fs::write(
            dir.join("model.json"),
            r#"{"no_components": 1, "user_embeddings": [1.0], "user_biases": [0.0],
                "item_embeddings": [0.1, 0.9], "item_biases": [0.0, 0.0]}"#,
        )
        .unwrap();
        std::fs::write(
            dir.join("item_features.json"),
            r#"{"shape": [2, 2], "indptr": [0, 1, 2], "indices": [0, 1], "data": [1.0, 1.0]}"#,
        )
        .unwrap();
        std::fs::write(
            dir.join("mappings.json"),
            r#"{"user_to_idx": {"1": 0}, "idx_to_item": [10, 11], "user_seen": {"1": [10]}, "top_k": 5}"#,
        )
        .unwrap();
        std::fs::write(dir.join("trending.csv"), "article_id\n99\n98\n97\n").unwrap();
    }
}
