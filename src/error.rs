use thiserror::Error;

/// An error raised by a sorted collection or one of its cursors.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The requested branching factor is outside the supported range.
    #[error("order {0} is outside the supported range 4..=256")]
    InvalidOrder(usize),

    /// A positional operation was given an index past the end of the collection.
    #[error("index {index} is out of range for a collection of {len} elements")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// The collection length at the time of the call.
        len: usize,
    },

    /// A copy destination cannot hold the collection at the given offset.
    #[error("destination of {dst} elements cannot hold {count} elements starting at offset {offset}")]
    DestinationTooSmall {
        /// Length of the destination slice.
        dst: usize,
        /// Offset the copy was to start at.
        offset: usize,
        /// Number of elements to copy.
        count: usize,
    },

    /// `first`, `last`, `min`, or `max` was called on an empty collection.
    #[error("the collection is empty")]
    Empty,

    /// The collection was mutated after the cursor froze its stage.
    #[error("the collection was modified while a cursor was reading it")]
    Invalidated,

    /// The cursor is rewound or consumed and has no current element.
    #[error("the cursor is not positioned on an element")]
    NotPositioned,
}
