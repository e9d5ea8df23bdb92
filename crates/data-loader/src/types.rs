//! Core domain types for the artifact bundle.
//!
//! External identifiers (`UserId`, `ItemId`) come from the content platform;
//! dense indices (`UserIndex`, `ItemIndex`) only exist inside the model and
//! never leave the bundle.

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use scorer::{Scorer, SparseMatrix};
pub use scorer::{ItemIndex, UserIndex};

// =============================================================================
// Type Aliases
// =============================================================================

/// External user identifier, supplied by callers
pub type UserId = i64;

/// External article identifier
pub type ItemId = i64;

/// Default recommendation count when the mappings artifact omits `top_k`
pub const DEFAULT_TOP_K: usize = 5;

// =============================================================================
// Artifact names
// =============================================================================

/// File names of the four artifacts that make up one bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactNames {
    pub model: String,
    pub item_features: String,
    pub mappings: String,
    pub trending: String,
}

impl ArtifactNames {
    /// All four names, in fetch order
    pub fn all(&self) -> [&str; 4] {
        [
            self.model.as_str(),
            self.item_features.as_str(),
            self.mappings.as_str(),
            self.trending.as_str(),
        ]
    }
}

impl Default for ArtifactNames {
    fn default() -> Self {
        Self {
            model: "model.json".to_string(),
            item_features: "item_features.json".to_string(),
            mappings: "mappings.json".to_string(),
            trending: "trending.csv".to_string(),
        }
    }
}

// =============================================================================
// Mappings artifact
// =============================================================================

/// Id mappings, seen-history and default k, as exported by the training job
#[derive(Debug, Clone, Deserialize)]
pub struct Mappings {
    pub user_to_idx: HashMap<UserId, UserIndex>,
    pub idx_to_item: IdxToItem,
    pub user_seen: HashMap<UserId, HashSet<ItemId>>,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

/// ItemIndex -> ItemId mapping.
///
/// Exports either write a plain array (position = index) or an object keyed
/// by index; both are accepted and normalised with [`IdxToItem::into_dense`].
#[derive(Debug, Clone, PartialEq)]
pub enum IdxToItem {
    Dense(Vec<ItemId>),
    Keyed(HashMap<ItemIndex, ItemId>),
}

impl IdxToItem {
    pub fn len(&self) -> usize {
        match self {
            IdxToItem::Dense(v) => v.len(),
            IdxToItem::Keyed(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convert to a dense vector covering exactly `[0, n_items)`.
    ///
    /// Returns the first index that is missing or out of range on failure.
    pub fn into_dense(self, n_items: usize) -> std::result::Result<Vec<ItemId>, ItemIndex> {
        match self {
            IdxToItem::Dense(v) if v.len() == n_items => Ok(v),
            IdxToItem::Dense(v) => Err(v.len().min(n_items)),
            IdxToItem::Keyed(mut m) => {
                if let Some(&bad) = m.keys().find(|&&idx| idx >= n_items) {
                    return Err(bad);
                }
                (0..n_items)
                    .map(|idx| m.remove(&idx).ok_or(idx))
                    .collect()
            }
        }
    }
}

impl<'de> Deserialize<'de> for IdxToItem {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct IdxToItemVisitor;

        impl<'de> Visitor<'de> for IdxToItemVisitor {
            type Value = IdxToItem;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an array of item ids or an object keyed by item index")
            }

            fn visit_seq<A>(self, mut seq: A) -> std::result::Result<IdxToItem, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(item) = seq.next_element::<ItemId>()? {
                    items.push(item);
                }
                Ok(IdxToItem::Dense(items))
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<IdxToItem, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut items = HashMap::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((idx, item)) = map.next_entry::<ItemIndex, ItemId>()? {
                    if items.insert(idx, item).is_some() {
                        return Err(de::Error::custom(format!("duplicate item index {}", idx)));
                    }
                }
                Ok(IdxToItem::Keyed(items))
            }
        }

        deserializer.deserialize_any(IdxToItemVisitor)
    }
}

// =============================================================================
// ArtifactBundle - the immutable serving structure
// =============================================================================

/// Everything the engine needs at serving time, assembled once per process.
///
/// Fields are private: a bundle only exists after the cross-artifact checks in
/// `ArtifactBundle::new` have passed, and nothing mutates it afterwards.
pub struct ArtifactBundle {
    pub(crate) model: Arc<dyn Scorer>,
    pub(crate) item_features: SparseMatrix,
    pub(crate) user_to_idx: HashMap<UserId, UserIndex>,
    pub(crate) idx_to_item: Vec<ItemId>,
    pub(crate) user_seen: HashMap<UserId, HashSet<ItemId>>,
    pub(crate) top_k: usize,
    pub(crate) trending: Vec<ItemId>,
    /// `[0, n_items)`, materialised once since every scoring call needs it
    pub(crate) all_item_idx: Vec<ItemIndex>,
}

/// Summary counts for logging and the `inspect` command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BundleCounts {
    pub users: usize,
    pub items: usize,
    pub item_features: usize,
    pub users_with_history: usize,
    pub trending: usize,
    pub top_k: usize,
}

impl ArtifactBundle {
    /// Dense index of a trained user, `None` for users the model never saw
    pub fn user_index(&self, user_id: UserId) -> Option<UserIndex> {
        self.user_to_idx.get(&user_id).copied()
    }

    pub fn is_known_user(&self, user_id: UserId) -> bool {
        self.user_to_idx.contains_key(&user_id)
    }

    /// External id of an item row
    pub fn item_id(&self, index: ItemIndex) -> Option<ItemId> {
        self.idx_to_item.get(index).copied()
    }

    /// Items already shown to a user; `None` if the user has no history
    pub fn seen_items(&self, user_id: UserId) -> Option<&HashSet<ItemId>> {
        self.user_seen.get(&user_id)
    }

    /// Trending list in rank order
    pub fn trending(&self) -> &[ItemId] {
        &self.trending
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn n_items(&self) -> usize {
        self.idx_to_item.len()
    }

    pub fn n_users(&self) -> usize {
        self.user_to_idx.len()
    }

    /// The full candidate index range `[0, n_items)`
    pub fn all_item_indices(&self) -> &[ItemIndex] {
        &self.all_item_idx
    }

    pub fn item_features(&self) -> &SparseMatrix {
        &self.item_features
    }

    pub fn model(&self) -> &dyn Scorer {
        self.model.as_ref()
    }

    /// All known user ids (unordered)
    pub fn user_ids(&self) -> impl Iterator<Item = UserId> + '_ {
        self.user_to_idx.keys().copied()
    }

    pub fn counts(&self) -> BundleCounts {
        BundleCounts {
            users: self.n_users(),
            items: self.n_items(),
            item_features: self.item_features.n_cols(),
            users_with_history: self.user_seen.len(),
            trending: self.trending.len(),
            top_k: self.top_k,
        }
    }
}

impl fmt::Debug for ArtifactBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactBundle")
            .field("model", &self.model.name())
            .field("counts", &self.counts())
            .finish()
    }
}
