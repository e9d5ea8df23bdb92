//! Candidate and user-context types shared by every source and filter.

use data_loader::{ItemId, ItemIndex, UserId, UserIndex};
use std::collections::HashSet;
use std::fmt;

/// Where a candidate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateSource {
    /// Scored by the factorization model
    Model,
    /// Taken from the trending list
    Trending,
}

impl fmt::Display for CandidateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateSource::Model => write!(f, "model"),
            CandidateSource::Trending => write!(f, "trending"),
        }
    }
}

/// Provenance details kept alongside a candidate
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateMetadata {
    /// Row of the item in the feature matrix (model candidates)
    pub item_index: Option<ItemIndex>,

    /// 0-based position in the trending list (trending candidates)
    pub trending_rank: Option<usize>,
}

/// A recommendable item produced by a source
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub item_id: ItemId,
    pub source: CandidateSource,
    /// Model score; 0.0 for trending candidates
    pub base_score: f32,
    pub metadata: CandidateMetadata,
}

impl Candidate {
    pub fn new(item_id: ItemId, source: CandidateSource, base_score: f32) -> Self {
        Self {
            item_id,
            source,
            base_score,
            metadata: CandidateMetadata::default(),
        }
    }

    /// Candidate scored by the model at `item_index`
    pub fn scored(item_id: ItemId, item_index: ItemIndex, score: f32) -> Self {
        let mut candidate = Self::new(item_id, CandidateSource::Model, score);
        candidate.metadata.item_index = Some(item_index);
        candidate
    }

    /// Candidate taken from the trending list at `rank`
    pub fn trending(item_id: ItemId, rank: usize) -> Self {
        let mut candidate = Self::new(item_id, CandidateSource::Trending, 0.0);
        candidate.metadata.trending_rank = Some(rank);
        candidate
    }
}

/// Everything the sources and filters need to know about the requesting user.
///
/// Borrows the seen history from the bundle for the length of one request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UserContext<'a> {
    pub user_id: UserId,

    /// `None` when the model was never trained on this user
    pub user_index: Option<UserIndex>,

    /// Items the user has already been shown
    seen_items: Option<&'a HashSet<ItemId>>,
}

impl<'a> UserContext<'a> {
    /// Context for a user with no model index and no history
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            user_index: None,
            seen_items: None,
        }
    }

    pub fn with_user_index(mut self, user_index: UserIndex) -> Self {
        self.user_index = Some(user_index);
        self
    }

    pub fn with_seen(mut self, seen_items: &'a HashSet<ItemId>) -> Self {
        self.seen_items = Some(seen_items);
        self
    }

    pub fn is_known(&self) -> bool {
        self.user_index.is_some()
    }

    pub fn has_seen(&self, item_id: ItemId) -> bool {
        self.seen_items.is_some_and(|seen| seen.contains(&item_id))
    }

    /// Size of the seen history
    pub fn seen_count(&self) -> usize {
        self.seen_items.map_or(0, HashSet::len)
    }
}
