//! Behavior switches for the family tree store.

use serde::Deserialize;

/// Configuration for [`crate::FamilyTreeStore`].
///
/// Every field has a default, so partial JSON documents are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TreeStoreConfig {
    /// Deleting a member also unlinks it from every peer.
    ///
    /// When `false`, deletion only removes the record and leaves peers'
    /// edges pointing at the removed id.
    pub delete_teardown: bool,
    /// Rewrites non-owner endpoint roles from resolved relation labels on
    /// `connect`. Off by default: labels are computed and logged only.
    ///
    /// `connect(a, b)` writes the first resolved label onto `a` and the second
    /// onto `b`, verbatim. The label table is keyed on the pair of roles, not
    /// on either endpoint's point of view, so for example a `Child`-`Parent`
    /// pair resolves to `(Grandparent, Grandchild)` and `a` becomes a
    /// `Grandparent`. Labels with no stored role (`Grandchild`, `Owner`, ...)
    /// leave that endpoint unchanged.
    pub apply_resolved_labels: bool,
    /// Drops edges to ids that exist nowhere when loading persisted state.
    pub prune_dangling_on_load: bool,
}

impl Default for TreeStoreConfig {
    fn default() -> Self {
        Self {
            delete_teardown: true,
            apply_resolved_labels: false,
            prune_dangling_on_load: true,
        }
    }
}

impl TreeStoreConfig {
    /// Configuration that reproduces the literal legacy behavior: plain
    /// deletes and no load-time repair.
    pub fn legacy() -> Self {
        Self {
            delete_teardown: false,
            apply_resolved_labels: false,
            prune_dangling_on_load: false,
        }
    }

    /// Parses a JSON document; absent fields keep their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
