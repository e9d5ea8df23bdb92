//! Server configuration from environment variables.
//!
//! | Variable              | Default        |
//! |-----------------------|----------------|
//! | `BIND_ADDR`           | `0.0.0.0:7071` |
//! | `ARTIFACTS_DIR`       |                |
//! | `ARTIFACTS_BASE_URL`  |                |
//! | `ARTIFACTS_CONTAINER` | `artifacts`    |
//! | `ARTIFACTS_PREFIX`    | (empty)        |
//! | `ARTIFACTS_SAS_TOKEN` |                |
//! | `MAX_K`               | `100`          |
//!
//! One of `ARTIFACTS_DIR` or `ARTIFACTS_BASE_URL` is required; the directory
//! wins when both are set. Empty values count as unset.

use std::path::PathBuf;

use thiserror::Error;

use data_loader::{ArtifactLocation, BlobLocation};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:7071";
pub const DEFAULT_CONTAINER: &str = "artifacts";
pub const DEFAULT_MAX_K: usize = 100;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("No artifact location configured: set ARTIFACTS_DIR or ARTIFACTS_BASE_URL")]
    MissingLocation,

    #[error("Invalid value for {var}: '{value}' ({reason})")]
    InvalidValue {
        var: String,
        value: String,
        reason: String,
    },
}

/// Everything the HTTP server needs at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub location: ArtifactLocation,
    /// Upper bound applied to the requested `k`
    pub max_k: usize,
}

impl ServerConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let location = if let Some(dir) = get("ARTIFACTS_DIR") {
            ArtifactLocation::Directory(PathBuf::from(dir))
        } else if let Some(base_url) = get("ARTIFACTS_BASE_URL") {
            ArtifactLocation::Blob(BlobLocation {
                base_url,
                container: get("ARTIFACTS_CONTAINER").unwrap_or_else(|| DEFAULT_CONTAINER.to_string()),
                prefix: get("ARTIFACTS_PREFIX").unwrap_or_default(),
                sas_token: get("ARTIFACTS_SAS_TOKEN"),
            })
        } else {
            return Err(ConfigError::MissingLocation);
        };

        let max_k = match get("MAX_K") {
            Some(raw) => parse_positive("MAX_K", &raw)?,
            None => DEFAULT_MAX_K,
        };

        Ok(Self {
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            location,
            max_k,
        })
    }
}

fn parse_positive(var: &str, raw: &str) -> Result<usize, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidValue {
        var: var.to_string(),
        value: raw.to_string(),
        reason: reason.to_string(),
    };
    match raw.trim().parse::<usize>() {
        Ok(0) => Err(invalid("must be at least 1")),
        Ok(n) => Ok(n),
        Err(_) => Err(invalid("not a positive integer")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_directory_config_with_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[("ARTIFACTS_DIR", "/data/bundle")])).unwrap();

        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.max_k, DEFAULT_MAX_K);
        assert_eq!(config.location, ArtifactLocation::Directory(PathBuf::from("/data/bundle")));
    }

    #[test]
    fn test_blob_config() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("ARTIFACTS_BASE_URL", "https://acct.blob.core.windows.net"),
            ("ARTIFACTS_PREFIX", "lightfm_online"),
            ("ARTIFACTS_SAS_TOKEN", "sv=1&sig=x"),
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("MAX_K", "25"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.max_k, 25);
        match config.location {
            ArtifactLocation::Blob(blob) => {
                assert_eq!(blob.container, DEFAULT_CONTAINER);
                assert_eq!(blob.prefix, "lightfm_online");
                assert_eq!(blob.sas_token.as_deref(), Some("sv=1&sig=x"));
            }
            other => panic!("expected blob location, got {:?}", other),
        }
    }

    #[test]
    fn test_directory_wins_over_blob() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("ARTIFACTS_DIR", "/local"),
            ("ARTIFACTS_BASE_URL", "https://remote"),
        ]))
        .unwrap();

        assert!(matches!(config.location, ArtifactLocation::Directory(_)));
    }

    #[test]
    fn test_missing_location() {
        let err = ServerConfig::from_lookup(lookup(&[("ARTIFACTS_DIR", "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::MissingLocation);
    }

    #[test]
    fn test_invalid_max_k() {
        for bad in ["0", "-3", "many"] {
            let err = ServerConfig::from_lookup(lookup(&[("ARTIFACTS_DIR", "/d"), ("MAX_K", bad)]))
                .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue { ref var, .. } if var == "MAX_K"));
        }
    }
}
