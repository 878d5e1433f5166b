//! Rank-augmented sorted collections for Rust.
//!
//! This crate provides four sorted-collection flavors built on a single
//! B+ tree core: [`SortedSet`] (unique keys), [`SortedBag`] (duplicate keys
//! with stable insertion order among equals), [`SortedMap`] (unique
//! key-to-value), and [`SortedMultiMap`] (duplicate keys, each with its own
//! value). All four support O(log n) positional operations in addition to the
//! usual sorted-collection surface:
//!
//! - [`element_at`](SortedSet::element_at) - Get the element at a given sorted position
//! - [`index_of`](SortedSet::index_of) - Get the sorted position of a key
//! - Indexing by [`Rank`] - e.g., `set[Rank(0)]` for the first element
//!
//! # Example
//!
//! ```
//! use rank_tree::{Rank, SortedBag};
//!
//! let mut rolls = SortedBag::new();
//! rolls.insert(4);
//! rolls.insert(6);
//! rolls.insert(4);
//!
//! assert_eq!(rolls.len(), 3);
//! assert_eq!(rolls.occurrences_of(&4), 2);
//! assert_eq!(rolls.index_of(&6), 2);
//! assert_eq!(rolls[Rank(0)], 4);
//! ```
//!
//! # Features
//!
//! - **Four flavors, one core** - every collection is a thin façade over the
//!   same rank-augmented B+ tree
//! - **O(log n) rank operations** - positional access via subtree weight
//!   augmentation
//! - **Configurable branching factor** - orders from 4 to 256, with an
//!   append-biased split policy that keeps bulk loads dense
//! - **Injected ordering** - a [`Comparer`] decides key order, with
//!   [`NaturalOrder`] as the `Ord`-based default
//! - **Cursor invalidation** - detached [cursors](SortedSet::cursor) freeze
//!   the tree's mutation stage and fail fast after any later mutation
//!
//! # Implementation
//!
//! The collections are implemented as B+ trees (all data in leaves, linked
//! leaf chain) with subtree weight augmentation. Leaves live in an arena and
//! link to their siblings by slot handle, so sequential scans never touch the
//! branch levels. The engine performs no internal locking and is not
//! thread-safe; callers composing external locks can key them off the per-tree
//! [`SyncRoot`] token.

// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod comparer;
mod error;
mod rank;
mod raw;
mod sync_root;

pub mod sorted_bag;
pub mod sorted_map;
pub mod sorted_multi_map;
pub mod sorted_set;

pub use comparer::{Comparer, FnComparer, NaturalOrder};
pub use error::Error;
pub use rank::Rank;
pub use sorted_bag::SortedBag;
pub use sorted_map::SortedMap;
pub use sorted_multi_map::SortedMultiMap;
pub use sorted_set::SortedSet;
pub use sync_root::SyncRoot;

/// The smallest supported branching factor.
pub const ORDER_MIN: usize = 4;
/// The largest supported branching factor.
pub const ORDER_MAX: usize = 256;
/// The branching factor used by the `new()` constructors.
pub const DEFAULT_ORDER: usize = 128;
