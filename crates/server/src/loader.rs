//! Engine construction and the lazily-initialised, single-flight engine cell.
//!
//! The first request to need the engine triggers a load; requests arriving
//! while that load runs wait for its outcome instead of starting their own.
//! A successful engine is kept for the life of the process. A failed load is
//! handed to everyone who waited on it and then forgotten, so the next
//! request tries again.

use std::sync::Arc;
use std::time::Instant;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::{Mutex, OnceCell};
use tracing::{error, info, warn};

use data_loader::{ArtifactBundle, ArtifactLocation, ArtifactNames};

use crate::engine::RecommendationEngine;
use crate::error::{EngineError, Result};

/// Builds a recommendation engine from ambient configuration.
///
/// `load` is blocking (network and file I/O); [`EngineCell`] runs it on the
/// blocking thread pool.
pub trait EngineLoader: Send + Sync + 'static {
    fn load(&self) -> Result<RecommendationEngine>;
}

/// Loads the artifact bundle from a storage location
#[derive(Debug, Clone)]
pub struct ArtifactEngineLoader {
    location: ArtifactLocation,
    names: ArtifactNames,
    oversample_factor: Option<usize>,
}

impl ArtifactEngineLoader {
    pub fn new(location: ArtifactLocation) -> Self {
        Self {
            location,
            names: ArtifactNames::default(),
            oversample_factor: None,
        }
    }

    /// Override the artifact file names
    pub fn with_names(mut self, names: ArtifactNames) -> Self {
        self.names = names;
        self
    }

    /// Override the model over-sampling factor
    pub fn with_oversample_factor(mut self, factor: usize) -> Self {
        self.oversample_factor = Some(factor);
        self
    }

    pub fn location(&self) -> &ArtifactLocation {
        &self.location
    }
}

impl EngineLoader for ArtifactEngineLoader {
    fn load(&self) -> Result<RecommendationEngine> {
        info!("Loading engine from {}", self.location);

        let bundle = ArtifactBundle::load(&self.location, &self.names).map_err(|e| {
            error!("Artifact load failed: {}", e);
            EngineError::Unavailable(e.to_string())
        })?;

        let engine = RecommendationEngine::new(Arc::new(bundle));
        Ok(match self.oversample_factor {
            Some(factor) => engine.with_oversample_factor(factor),
            None => engine,
        })
    }
}

type LoadFuture = Shared<BoxFuture<'static, Result<Arc<RecommendationEngine>>>>;

/// Process-wide holder of the engine with single-flight lazy construction
pub struct EngineCell {
    loader: Arc<dyn EngineLoader>,
    engine: OnceCell<Arc<RecommendationEngine>>,
    in_flight: Mutex<Option<LoadFuture>>,
}

impl EngineCell {
    pub fn new(loader: impl EngineLoader) -> Self {
        Self {
            loader: Arc::new(loader),
            engine: OnceCell::new(),
            in_flight: Mutex::new(None),
        }
    }

    /// Whether an engine has been built
    pub fn is_loaded(&self) -> bool {
        self.engine.initialized()
    }

    /// The engine if it is already built; never starts a load
    pub fn try_get(&self) -> Option<Arc<RecommendationEngine>> {
        self.engine.get().cloned()
    }

    /// Get the engine, building it if needed.
    ///
    /// Concurrent callers during a load all receive that load's outcome.
    pub async fn get(&self) -> Result<Arc<RecommendationEngine>> {
        if let Some(engine) = self.engine.get() {
            return Ok(engine.clone());
        }

        let attempt = {
            let mut slot = self.in_flight.lock().await;
            if let Some(engine) = self.engine.get() {
                return Ok(engine.clone());
            }
            match slot.as_ref() {
                Some(attempt) => attempt.clone(),
                None => {
                    let attempt = self.start_load();
                    *slot = Some(attempt.clone());
                    attempt
                }
            }
        };

        let outcome = attempt.clone().await;

        // First waiter back publishes the outcome and clears the slot
        let mut slot = self.in_flight.lock().await;
        if slot.as_ref().is_some_and(|current| current.ptr_eq(&attempt)) {
            if let Ok(engine) = &outcome {
                let _ = self.engine.set(engine.clone());
            }
            *slot = None;
        }

        outcome
    }

    fn start_load(&self) -> LoadFuture {
        let loader = Arc::clone(&self.loader);

        async move {
            let start = Instant::now();
            info!("Engine cold start");

            let result = match tokio::task::spawn_blocking(move || loader.load()).await {
                Ok(result) => result.map(Arc::new),
                Err(e) => Err(EngineError::Unavailable(format!("Loader task failed: {}", e))),
            };

            match &result {
                Ok(_) => info!("Engine ready in {:.2?}", start.elapsed()),
                Err(e) => warn!("Engine load failed after {:.2?}: {}", start.elapsed(), e),
            }
            result
        }
        .boxed()
        .shared()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{scenario_bundle, write_scenario_artifacts};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    /// Counts invocations; fails while `fail_first` attempts remain
    struct CountingLoader {
        calls: Arc<AtomicUsize>,
        fail_first: usize,
        delay: Duration,
    }

    impl EngineLoader for CountingLoader {
        fn load(&self) -> Result<RecommendationEngine> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            if call < self.fail_first {
                return Err(EngineError::Unavailable(format!("attempt {} failed", call)));
            }
            Ok(RecommendationEngine::new(Arc::new(scenario_bundle())))
        }
    }

    fn counting(fail_first: usize, delay_ms: u64) -> (EngineCell, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let cell = EngineCell::new(CountingLoader {
            calls: calls.clone(),
            fail_first,
            delay: Duration::from_millis(delay_ms),
        });
        (cell, calls)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_requests_load_once() {
        let (cell, calls) = counting(0, 100);
        let cell = Arc::new(cell);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let cell = cell.clone();
                tokio::spawn(async move { cell.get().await })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cell.is_loaded());

        // Later calls reuse the published engine
        cell.get().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_waiters_share_failed_outcome() {
        let (cell, calls) = counting(1, 100);
        let cell = Arc::new(cell);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cell = cell.clone();
                tokio::spawn(async move { cell.get().await })
            })
            .collect();

        for handle in handles {
            let err = handle.await.unwrap().unwrap_err();
            assert_eq!(err, EngineError::Unavailable("attempt 0 failed".to_string()));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!cell.is_loaded());
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let (cell, calls) = counting(2, 0);

        assert!(cell.get().await.is_err());
        assert!(cell.get().await.is_err());
        assert!(cell.try_get().is_none());

        let engine = cell.get().await.unwrap();
        assert_eq!(engine.top_k(), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(cell.try_get().is_some());
    }

    #[tokio::test]
    async fn test_artifact_loader_recovers_after_storage_fixed() {
        let dir = TempDir::new().unwrap();
        write_scenario_artifacts(dir.path());
        let trending = dir.path().join("trending.csv");
        std::fs::remove_file(&trending).unwrap();

        let cell = EngineCell::new(ArtifactEngineLoader::new(ArtifactLocation::Directory(
            dir.path().to_path_buf(),
        )));

        let err = cell.get().await.unwrap_err();
        assert!(matches!(err, EngineError::Unavailable(ref msg) if msg.contains("trending.csv")));

        std::fs::write(&trending, "article_id\n99\n98\n97\n").unwrap();

        let engine = cell.get().await.unwrap();
        let rec = engine.recommend(1, 2).unwrap();
        assert_eq!(rec.item_ids(), vec![11, 99]);
    }

    #[tokio::test]
    async fn test_malformed_artifact_fails_load() {
        let dir = TempDir::new().unwrap();
        write_scenario_artifacts(dir.path());
        std::fs::write(dir.path().join("mappings.json"), r#"{"user_to_idx": {}}"#).unwrap();

        let cell = EngineCell::new(ArtifactEngineLoader::new(ArtifactLocation::Directory(
            dir.path().to_path_buf(),
        )));

        assert!(matches!(cell.get().await, Err(EngineError::Unavailable(_))));
        assert!(!cell.is_loaded());
    }
}
