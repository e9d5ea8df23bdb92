//! Filter to remove articles the user has already been shown.
//!
//! This is typically the first filter in the pipeline, as there's no
//! point in recommending articles the user has already seen.

use crate::traits::Filter;
use anyhow::Result;
use sources::{Candidate, UserContext};

/// Removes candidates present in the user's seen history.
///
/// One hash lookup per candidate; order is preserved.
pub struct SeenFilter;

impl Filter for SeenFilter {
    fn name(&self) -> &str {
        "SeenFilter"
    }

    fn apply(
        &self,
        candidates: Vec<Candidate>,
        context: &UserContext,
    ) -> Result<Vec<Candidate>> {
        let filtered: Vec<Candidate> = candidates
            .into_iter()
            .filter(|candidate| !context.has_seen(candidate.item_id))
            .collect();
        Ok(filtered)
    }
}
