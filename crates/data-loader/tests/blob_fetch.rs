//! Blob-location loads against a local HTTP server standing in for the
//! storage account.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use data_loader::{ArtifactBundle, ArtifactLocation, ArtifactNames, BlobLocation, DataLoadError};
use std::collections::HashMap;
use std::sync::Arc;

const SIGNATURE: &str = "s3cr3t";

type Blobs = HashMap<String, (StatusCode, String)>;

async fn get_blob(
    State(blobs): State<Arc<Blobs>>,
    Path(path): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> (StatusCode, String) {
    if query.get("sig").map(String::as_str) != Some(SIGNATURE) {
        return (StatusCode::FORBIDDEN, "signature mismatch".to_string());
    }
    match blobs.get(path.trim_start_matches('/')) {
        Some((status, body)) => (*status, body.clone()),
        None => (StatusCode::NOT_FOUND, String::new()),
    }
}

/// Serve `blobs` under `/artifacts/` on an ephemeral port; returns the base URL
fn spawn_storage(blobs: Blobs) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async move {
            let app = Router::new()
                .route("/artifacts/{*path}", get(get_blob))
                .with_state(Arc::new(blobs));
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            axum::serve(listener, app).await.unwrap();
        });
    });

    format!("http://{}", addr)
}

/// The four artifacts of a two-item bundle, stored under `prefix/` (root if empty)
fn bundle_blobs(prefix: &str) -> Blobs {
    let files = [
        (
            "model.json",
            r#"{"no_components": 1, "user_embeddings": [1.0], "user_biases": [0.0],
                "item_embeddings": [0.1, 0.9], "item_biases": [0.0, 0.0]}"#,
        ),
        (
            "item_features.json",
            r#"{"shape": [2, 2], "indptr": [0, 1, 2], "indices": [0, 1], "data": [1.0, 1.0]}"#,
        ),
        (
            "mappings.json",
            r#"{"user_to_idx": {"1": 0}, "idx_to_item": [10, 11], "user_seen": {"1": [10]}, "top_k": 5}"#,
        ),
        ("trending.csv", "article_id\n99\n98\n97\n"),
    ];

    files
        .into_iter()
        .map(|(name, body)| {
            let key = format!("{}/{}", prefix, name).trim_start_matches('/').to_string();
            (key, (StatusCode::OK, body.to_string()))
        })
        .collect()
}

fn location(base_url: String, prefix: &str, sas_token: &str) -> ArtifactLocation {
    ArtifactLocation::Blob(BlobLocation {
        base_url,
        container: "artifacts".to_string(),
        prefix: prefix.to_string(),
        sas_token: Some(sas_token.to_string()),
    })
}

fn signed() -> String {
    format!("?sv=2024-01-01&sig={}", SIGNATURE)
}

#[test]
fn test_blob_bundle_loads() {
    let base_url = spawn_storage(bundle_blobs("lightfm_online"));
    let location = location(base_url, "lightfm_online", &signed());

    let bundle = ArtifactBundle::load(&location, &ArtifactNames::default()).unwrap();

    assert_eq!(bundle.n_items(), 2);
    assert_eq!(bundle.item_id(1), Some(11));
    assert_eq!(bundle.user_index(1), Some(0));
    assert_eq!(bundle.trending(), &[99, 98, 97]);
}

#[test]
fn test_blob_fetch_uses_temp_dir_and_removes_it() {
    let base_url = spawn_storage(bundle_blobs("bundle"));
    let location = location(base_url, "bundle", &signed());
    let names = ArtifactNames::default();

    let local = location.fetch(&names).unwrap();
    let dir = local.dir().to_path_buf();

    let dir_name = dir.file_name().unwrap().to_string_lossy().into_owned();
    assert!(dir_name.starts_with("reco_artifacts_"), "{}", dir_name);
    for name in names.all() {
        assert!(dir.join(name).is_file(), "{} not downloaded", name);
    }
    assert_eq!(
        std::fs::read_to_string(dir.join("trending.csv")).unwrap(),
        "article_id\n99\n98\n97\n"
    );

    drop(local);
    assert!(!dir.exists());
}

#[test]
fn test_blob_404_is_artifact_not_found() {
    let mut blobs = bundle_blobs("bundle");
    blobs.remove("bundle/trending.csv");
    let base_url = spawn_storage(blobs);

    let err = location(base_url, "bundle", &signed())
        .fetch(&ArtifactNames::default())
        .unwrap_err();

    match err {
        DataLoadError::ArtifactNotFound { name, path } => {
            assert_eq!(name, "trending.csv");
            assert!(path.ends_with("/artifacts/bundle/trending.csv"));
            assert!(!path.contains(SIGNATURE));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_blob_server_error_is_download_failure() {
    let mut blobs = bundle_blobs("bundle");
    blobs.insert(
        "bundle/mappings.json".to_string(),
        (StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string()),
    );
    let base_url = spawn_storage(blobs);

    let err = location(base_url, "bundle", &signed())
        .fetch(&ArtifactNames::default())
        .unwrap_err();

    assert!(matches!(err, DataLoadError::Download { ref url, .. } if url.ends_with("mappings.json")));
    let message = err.to_string();
    assert!(message.contains("500"), "{}", message);
    assert!(!message.contains(SIGNATURE), "{}", message);
}

#[test]
fn test_blob_request_carries_sas_token() {
    let base_url = spawn_storage(bundle_blobs(""));

    // Container-root blobs, wrong signature: storage refuses
    let err = location(base_url.clone(), "", "sv=2024-01-01&sig=wrong")
        .fetch(&ArtifactNames::default())
        .unwrap_err();
    assert!(matches!(err, DataLoadError::Download { .. }));
    assert!(err.to_string().contains("403"));

    // Token without a leading '?' works the same as with one
    let token = signed().trim_start_matches('?').to_string();
    let local = location(base_url, "", &token)
        .fetch(&ArtifactNames::default())
        .unwrap();
    assert!(local.dir().join("model.json").is_file());
}
