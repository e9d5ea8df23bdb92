//! Helper functions to build UserContext from an ArtifactBundle
//!
//! The context is gathered once per request so sources and filters never go
//! back to the bundle for per-user lookups.

use crate::types::UserContext;
use data_loader::{ArtifactBundle, UserId};

/// Build a UserContext for a given user
///
/// Never fails: users outside the model vocabulary get a context with no
/// user index, which routes them to the trending source. Only known users
/// carry their seen history; it is borrowed from the bundle, not copied.
pub fn build_user_context(bundle: &ArtifactBundle, user_id: UserId) -> UserContext<'_> {
    let context = UserContext::new(user_id);
    let Some(user_index) = bundle.user_index(user_id) else {
        return context;
    };

    let context = context.with_user_index(user_index);
    match bundle.seen_items(user_id) {
        Some(seen) => context.with_seen(seen),
        None => context,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::create_test_bundle;

    #[test]
    fn test_build_user_context_known_user() {
        let bundle = create_test_bundle();
        let context = build_user_context(&bundle, 1);

        assert_eq!(context.user_id, 1);
        assert_eq!(context.user_index, Some(0));
        assert!(context.is_known());
        assert!(context.has_seen(10));
        assert!(!context.has_seen(11));
    }

    #[test]
    fn test_user_not_in_model() {
        let bundle = create_test_bundle();
        let context = build_user_context(&bundle, 999);

        assert!(!context.is_known());
        assert_eq!(context.seen_count(), 0);
    }

    #[test]
    fn test_unknown_user_history_not_attached() {
        let mut mappings = crate::test_support::create_test_mappings();
        mappings.user_seen.insert(999, [10, 11].into_iter().collect());
        let bundle = crate::test_support::create_test_bundle_from(mappings);

        let context = build_user_context(&bundle, 999);
        assert!(!context.is_known());
        assert!(!context.has_seen(10));
        assert_eq!(context.seen_count(), 0);
    }

    #[test]
    fn test_known_user_without_history() {
        let bundle = create_test_bundle();
        let context = build_user_context(&bundle, 2);

        assert_eq!(context.user_index, Some(1));
        assert_eq!(context.seen_count(), 0);
    }
}
