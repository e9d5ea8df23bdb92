//! # Data Loader Crate
//!
//! Loads the artifact bundle produced by the offline training job and turns
//! it into an immutable [`ArtifactBundle`] ready for serving.
//!
//! ## Main Components
//!
//! - **types**: Ids, the mappings artifact and the `ArtifactBundle` itself
//! - **parser**: Parse each artifact file (JSON model/features/mappings, CSV trending)
//! - **bundle**: Cross-artifact validation and parallel loading
//! - **store**: Artifact locations (local directory or blob container)
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{ArtifactBundle, ArtifactLocation, ArtifactNames};
//! use std::path::PathBuf;
//!
//! let location = ArtifactLocation::Directory(PathBuf::from("artifacts"));
//! let bundle = ArtifactBundle::load(&location, &ArtifactNames::default())?;
//!
//! println!("{} users, {} items", bundle.n_users(), bundle.n_items());
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod bundle;
pub mod store;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use store::{ArtifactLocation, BlobLocation, LocalArtifacts};
pub use types::{
    // Type aliases
    UserId,
    ItemId,
    UserIndex,
    ItemIndex,
    // Core types
    ArtifactBundle,
    ArtifactNames,
    BundleCounts,
    IdxToItem,
    Mappings,
    // Constants
    DEFAULT_TOP_K,
};
