//! Pipeline for filtering article candidates.
//!
//! This crate provides:
//! - Filter trait and implementations for candidate filtering
//! - FilterPipeline for composing filters
//!
//! ## Architecture
//! Candidates arrive ranked best-first from a source; every filter keeps
//! that order and only removes entries:
//! 1. SeenFilter drops articles already shown to the user
//! 2. ExcludeFilter drops articles already chosen by an earlier stage
//! 3. DuplicateFilter drops repeats
//! 4. LimitFilter stops at k
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::FilterPipeline;
//! use pipeline::filters::*;
//!
//! let pipeline = FilterPipeline::new()
//!     .add_filter(SeenFilter)
//!     .add_filter(DuplicateFilter)
//!     .add_filter(LimitFilter::new(k));
//!
//! let filtered = pipeline.apply(candidates, &context)?;
//! ```

pub mod traits;
pub mod filters;
pub mod filter_pipeline;

// Re-export main types
pub use traits::Filter;
pub use filter_pipeline::FilterPipeline;
