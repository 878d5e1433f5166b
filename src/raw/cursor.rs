use crate::error::Error;

use super::arena::Handle;
use super::tree::RawTree;

/// Where a cursor stands between steps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    /// Before the first element; the initial and post-`reset` state.
    Rewound,
    /// On the element at the stored leaf position.
    Active(Handle, usize),
    /// Past the last element; further steps stay here.
    Consumed,
}

/// A detached cursor over the leaf chain, frozen against the tree's stage
/// counter at construction.
///
/// Holding no borrow, the cursor cannot stop the tree from mutating; instead
/// every step and every read compares the frozen stage and fails with
/// [`Error::Invalidated`] once they diverge.
#[derive(Clone, Debug)]
pub(crate) struct RawCursor {
    stage: u64,
    reverse: bool,
    state: State,
}

impl RawCursor {
    pub(crate) fn new(stage: u64, reverse: bool) -> Self {
        Self {
            stage,
            reverse,
            state: State::Rewound,
        }
    }

    fn check_stage<K, V, C>(&self, tree: &RawTree<K, V, C>) -> Result<(), Error> {
        if self.stage == tree.stage() { Ok(()) } else { Err(Error::Invalidated) }
    }

    /// Steps to the next element. Returns false once the data is consumed,
    /// and keeps returning false thereafter.
    pub(crate) fn move_next<K, V, C>(&mut self, tree: &RawTree<K, V, C>) -> Result<bool, Error> {
        self.check_stage(tree)?;
        let next = match self.state {
            State::Rewound => {
                if self.reverse {
                    tree.last_position()
                } else {
                    tree.first_position()
                }
            }
            State::Active(handle, index) => {
                if self.reverse {
                    tree.position_before(handle, index)
                } else {
                    tree.position_after(handle, index)
                }
            }
            State::Consumed => None,
        };
        match next {
            Some((handle, index)) => {
                self.state = State::Active(handle, index);
                Ok(true)
            }
            None => {
                self.state = State::Consumed;
                Ok(false)
            }
        }
    }

    /// The current element; an error when rewound, consumed, or invalidated.
    pub(crate) fn current<'a, K, V, C>(&self, tree: &'a RawTree<K, V, C>) -> Result<(&'a K, &'a V), Error> {
        self.check_stage(tree)?;
        match self.state {
            State::Active(handle, index) => {
                let leaf = tree.leaf(handle);
                Ok((leaf.key(index), leaf.value(index)))
            }
            State::Rewound | State::Consumed => Err(Error::NotPositioned),
        }
    }

    /// The current element, or `None` in any state without one.
    pub(crate) fn current_opt<'a, K, V, C>(&self, tree: &'a RawTree<K, V, C>) -> Option<(&'a K, &'a V)> {
        self.current(tree).ok()
    }

    /// Rewinds to replay from the start, re-freezing against the tree's
    /// current stage.
    pub(crate) fn reset<K, V, C>(&mut self, tree: &RawTree<K, V, C>) {
        self.stage = tree.stage();
        self.state = State::Rewound;
    }
}
