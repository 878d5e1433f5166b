mod arena;
mod cursor;
mod node;
mod tree;
mod vector;

pub(crate) use cursor::RawCursor;
pub(crate) use tree::{RawDistinct, RawIter, RawRange, RawTree};
pub(crate) use vector::Seek;
