/// A zero-based position into the sorted order of a collection.
///
/// Indexing a collection by `Rank` panics when the rank is out of range; use
/// the `element_at` methods for a fallible lookup.
///
/// # Examples
///
/// ```
/// use rank_tree::{Rank, SortedMap};
///
/// let mut map = SortedMap::new();
/// map.insert("a", 10);
/// map.insert("b", 20);
///
/// assert_eq!(map[Rank(0)], 10);
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Rank(pub usize);
