//! Where artifact bundles live and how to get them onto local disk.
//!
//! Two locations are supported:
//! - a local directory, used as-is
//! - a blob container reachable over HTTP(S), downloaded into a temporary
//!   directory first
//!
//! Blob URLs are `{base_url}/{container}/{prefix}/{file}`; an empty prefix
//! puts the files at the container root. An optional SAS token is appended as
//! the query string and never logged.

use crate::error::{DataLoadError, Result};
use crate::types::ArtifactNames;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info};

/// Timeout for a single artifact download
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Blob container coordinates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobLocation {
    pub base_url: String,
    pub container: String,
    pub prefix: String,
    pub sas_token: Option<String>,
}

impl BlobLocation {
    /// URL of one artifact, without credentials
    pub fn blob_url(&self, file: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let container = self.container.trim_matches('/');
        let prefix = self.prefix.trim_matches('/');

        if prefix.is_empty() {
            format!("{}/{}/{}", base, container, file)
        } else {
            format!("{}/{}/{}/{}", base, container, prefix, file)
        }
    }

    fn signed_url(&self, file: &str) -> String {
        let url = self.blob_url(file);
        match self.sas_token.as_deref().map(|t| t.trim_start_matches('?')) {
            Some(token) if !token.is_empty() => format!("{}?{}", url, token),
            _ => url,
        }
    }
}

/// Storage location of one artifact bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactLocation {
    Directory(PathBuf),
    Blob(BlobLocation),
}

impl fmt::Display for ArtifactLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactLocation::Directory(dir) => write!(f, "dir:{}", dir.display()),
            ArtifactLocation::Blob(blob) => {
                let prefix = if blob.prefix.is_empty() { "<root>" } else { &blob.prefix };
                write!(f, "blob:{}/{} prefix={}", blob.base_url, blob.container, prefix)
            }
        }
    }
}

/// Artifacts available on local disk.
///
/// Holds the temporary directory (if any) so the files stay alive until the
/// bundle has been parsed.
#[derive(Debug)]
pub struct LocalArtifacts {
    dir: PathBuf,
    _temp: Option<TempDir>,
}

impl LocalArtifacts {
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArtifactLocation {
    /// Make every named artifact available locally.
    ///
    /// Blocking: performs network and file I/O.
    pub fn fetch(&self, names: &ArtifactNames) -> Result<LocalArtifacts> {
        match self {
            ArtifactLocation::Directory(dir) => {
                for name in names.all() {
                    let path = dir.join(name);
                    if !path.is_file() {
                        return Err(DataLoadError::ArtifactNotFound {
                            name: name.to_string(),
                            path: path.display().to_string(),
                        });
                    }
                }
                Ok(LocalArtifacts {
                    dir: dir.clone(),
                    _temp: None,
                })
            }
            ArtifactLocation::Blob(blob) => download_all(blob, names),
        }
    }
}

fn download_all(blob: &BlobLocation, names: &ArtifactNames) -> Result<LocalArtifacts> {
    let temp = tempfile::Builder::new()
        .prefix("reco_artifacts_")
        .tempdir()?;

    info!(
        "Downloading artifacts from container={} prefix={}",
        blob.container,
        if blob.prefix.is_empty() { "<root>" } else { &blob.prefix }
    );

    let client = reqwest::blocking::Client::builder()
        .timeout(DOWNLOAD_TIMEOUT)
        .build()
        .map_err(|e| DataLoadError::Download {
            url: blob.base_url.clone(),
            reason: e.to_string(),
        })?;

    for name in names.all() {
        download_to(&client, blob, name, &temp.path().join(name))?;
    }

    info!("Artifacts downloaded to {:?}", temp.path());
    Ok(LocalArtifacts {
        dir: temp.path().to_path_buf(),
        _temp: Some(temp),
    })
}

fn download_to(
    client: &reqwest::blocking::Client,
    blob: &BlobLocation,
    name: &str,
    dest: &Path,
) -> Result<()> {
    let url = blob.blob_url(name);
    let download_err = |reason: String| DataLoadError::Download {
        url: url.clone(),
        reason,
    };

    debug!("Fetching {}", url);
    let response = client
        .get(blob.signed_url(name))
        .send()
        .map_err(|e| download_err(e.without_url().to_string()))?;

    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(DataLoadError::ArtifactNotFound {
            name: name.to_string(),
            path: url,
        });
    }
    if !status.is_success() {
        return Err(download_err(format!("HTTP {}", status)));
    }

    let bytes = response
        .bytes()
        .map_err(|e| download_err(e.without_url().to_string()))?;
    fs::write(dest, &bytes)?;

    debug!("Fetched {} ({} bytes)", name, bytes.len());
    Ok(())
}
