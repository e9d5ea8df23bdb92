//! The `Filter` seam every candidate filter plugs into.

use anyhow::Result;
use sources::{Candidate, UserContext};

/// A single order-preserving step over a ranked candidate list.
///
/// Filters take the list by value and hand back the survivors in their
/// original order; they never re-rank. `Send + Sync` lets one pipeline serve
/// concurrent requests.
pub trait Filter: Send + Sync {
    /// Short name used in pipeline logs
    fn name(&self) -> &str;

    /// Keep the candidates that pass.
    ///
    /// `candidates` arrives best first; `context` carries the user's seen
    /// history.
    fn apply(&self, candidates: Vec<Candidate>, context: &UserContext) -> Result<Vec<Candidate>>;
}
