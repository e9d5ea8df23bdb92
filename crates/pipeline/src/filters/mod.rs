//! Filter implementations for the candidate pipeline.
//!
//! This module contains all the concrete filter implementations
//! that can be composed into a FilterPipeline.

pub mod seen;
pub mod exclude;
pub mod duplicate;
pub mod limit;

// Re-export for convenience
pub use seen::SeenFilter;
pub use exclude::ExcludeFilter;
pub use duplicate::DuplicateFilter;
pub use limit::LimitFilter;
