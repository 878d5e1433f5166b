use std::sync::Arc;

/// An opaque per-tree token for callers composing external locks.
///
/// The tree performs no locking of its own; callers that guard a tree with
/// their own synchronization can use the sync root as a stable identity for
/// the lock, surviving clones of the handle. The token is created lazily on
/// the first request; concurrent first requests observe the same token.
///
/// # Examples
///
/// ```
/// use rank_tree::SortedSet;
///
/// let set: SortedSet<i32> = SortedSet::new();
/// let a = set.sync_root();
/// let b = set.sync_root();
/// assert!(a.same_tree(&b));
/// ```
#[derive(Clone, Debug)]
pub struct SyncRoot(Arc<()>);

impl SyncRoot {
    pub(crate) fn new() -> Self {
        Self(Arc::new(()))
    }

    /// Returns true if both tokens were issued by the same tree.
    #[must_use]
    pub fn same_tree(&self, other: &SyncRoot) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
