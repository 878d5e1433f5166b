use core::cmp::Ordering;

use smallvec::SmallVec;

use crate::comparer::Comparer;

use super::arena::Handle;
use super::node::{BranchNode, Node};
use super::tree::RawTree;

/// Which end of an equal-key run a search aims for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Seek {
    /// The first position with key >= the target.
    Lowest,
    /// The first position with key > the target (also the stable insertion
    /// point for a duplicate, and the exact position for unique keys).
    Highest,
}

/// A root-to-leaf path, stored as parallel stacks of node handle and chosen
/// child index. The top of the path is the leaf with its in-leaf index.
///
/// Every mutating operation builds one of these, performs its edit at the
/// leaf, and then bubbles weight updates, splits, and demotions back along
/// the recorded path. Storage is bounded by tree height.
pub(crate) struct NodeVector {
    nodes: SmallVec<[Handle; 16]>,
    indexes: SmallVec<[usize; 16]>,
    /// Nodes abandoned left of the divergence point by the most recent
    /// `traverse_right`, kept so `tilt_left` can move weight from the new
    /// (right) subtree onto the old (left) one.
    left_path: SmallVec<[Handle; 16]>,
}

impl NodeVector {
    fn empty() -> Self {
        Self {
            nodes: SmallVec::new(),
            indexes: SmallVec::new(),
            left_path: SmallVec::new(),
        }
    }

    /// Descends from the root towards `key`. Returns the path and whether the
    /// exact key exists at (or just left of, for [`Seek::Highest`]) the final
    /// position.
    pub(crate) fn seek<K, V, C>(tree: &RawTree<K, V, C>, key: &K, seek: Seek) -> (Self, bool)
    where
        C: Comparer<K>,
    {
        let mut vector = Self::empty();
        let mut current = tree.root();
        loop {
            match tree.node(current) {
                Node::Branch(branch) => {
                    let child = match seek {
                        Seek::Lowest => branch.descend_lower(key, tree.comparer()),
                        Seek::Highest => branch.descend_upper(key, tree.comparer()),
                    };
                    vector.push(current, child);
                    current = branch.child(child);
                }
                Node::Leaf(leaf) => {
                    let (index, found) = match seek {
                        Seek::Lowest => {
                            let index = leaf.lower_bound(key, tree.comparer());
                            let found = index < leaf.key_count()
                                && tree.comparer().compare(leaf.key(index), key) == Ordering::Equal;
                            (index, found)
                        }
                        Seek::Highest => {
                            let index = leaf.upper_bound(key, tree.comparer());
                            let found = index > 0
                                && tree.comparer().compare(leaf.key(index - 1), key) == Ordering::Equal;
                            (index, found)
                        }
                    };
                    let past_end = index == leaf.key_count() && leaf.next().is_some();
                    vector.push(current, index);
                    if seek == Seek::Lowest && !found && past_end {
                        // The run boundary sits between two leaves; the first
                        // position >= key is the head of the next leaf.
                        let advanced = vector.traverse_right(tree);
                        debug_assert!(advanced);
                        let leaf = tree.leaf(vector.leaf());
                        let found = leaf.key_count() > 0
                            && tree.comparer().compare(leaf.key(0), key) == Ordering::Equal;
                        return (vector, found);
                    }
                    return (vector, found);
                }
            }
        }
    }

    /// Descends from the root by child weights to the leaf holding the given
    /// 0-based rank. The caller must bounds-check the rank.
    pub(crate) fn seek_rank<K, V, C>(tree: &RawTree<K, V, C>, rank: usize) -> Self {
        debug_assert!(rank < tree.len());
        let mut vector = Self::empty();
        let mut current = tree.root();
        let mut remaining = rank;
        loop {
            match tree.node(current) {
                Node::Branch(branch) => {
                    let mut child = 0;
                    loop {
                        debug_assert!(child < branch.child_count());
                        let weight = tree.node_weight(branch.child(child));
                        if remaining < weight {
                            break;
                        }
                        remaining -= weight;
                        child += 1;
                    }
                    vector.push(current, child);
                    current = branch.child(child);
                }
                Node::Leaf(_) => {
                    vector.push(current, remaining);
                    return vector;
                }
            }
        }
    }

    fn push(&mut self, node: Handle, index: usize) {
        self.nodes.push(node);
        self.indexes.push(index);
    }

    fn pop(&mut self) -> Option<(Handle, usize)> {
        let node = self.nodes.pop()?;
        let index = self.indexes.pop()?;
        Some((node, index))
    }

    fn top(&self) -> Option<(Handle, usize)> {
        let node = *self.nodes.last()?;
        let index = *self.indexes.last()?;
        Some((node, index))
    }

    /// Depth of the path, leaf level included.
    pub(crate) fn height(&self) -> usize {
        self.nodes.len()
    }

    /// Handle of the leaf at the top of the path.
    pub(crate) fn leaf(&self) -> Handle {
        *self.nodes.last().unwrap()
    }

    /// In-leaf index at the top of the path.
    pub(crate) fn leaf_index(&self) -> usize {
        *self.indexes.last().unwrap()
    }

    /// The leaf immediately preceding the current position, if any.
    pub(crate) fn left_sibling<K, V, C>(&self, tree: &RawTree<K, V, C>) -> Option<Handle> {
        tree.leaf(self.leaf()).prev()
    }

    /// Computes the 0-based rank of the current position by summing the
    /// weights of every left-hand child along the path.
    pub(crate) fn rank<K, V, C>(&self, tree: &RawTree<K, V, C>) -> usize {
        let mut rank = self.leaf_index();
        for level in 0..self.height() - 1 {
            let branch = tree.branch(self.nodes[level]);
            for child in 0..self.indexes[level] {
                rank += tree.node_weight(branch.child(child));
            }
        }
        rank
    }

    /// Applies `delta` to every branch weight along the path.
    pub(crate) fn update_weight<K, V, C>(&self, tree: &mut RawTree<K, V, C>, delta: isize) {
        for level in 0..self.height() - 1 {
            let branch = tree.branch_mut(self.nodes[level]);
            if delta >= 0 {
                #[allow(clippy::cast_sign_loss)]
                branch.add_weight(delta as usize);
            } else {
                branch.sub_weight(delta.unsigned_abs());
            }
        }
    }

    /// Advances the top of the path to the next leaf in sorted order,
    /// updating every level. Returns false past the rightmost leaf.
    ///
    /// The nodes abandoned below the divergence point are retained until the
    /// next [`tilt_left`](Self::tilt_left).
    pub(crate) fn traverse_right<K, V, C>(&mut self, tree: &RawTree<K, V, C>) -> bool {
        let divergence = (0..self.height().saturating_sub(1))
            .rev()
            .find(|&level| self.indexes[level] + 1 < tree.branch(self.nodes[level]).child_count());
        let Some(divergence) = divergence else {
            return false;
        };
        self.left_path.clear();
        while self.nodes.len() > divergence + 1 {
            self.left_path.push(self.nodes.pop().unwrap());
            self.indexes.pop();
        }
        self.indexes[divergence] += 1;
        let mut current = tree.branch(self.nodes[divergence]).child(self.indexes[divergence]);
        loop {
            match tree.node(current) {
                Node::Branch(branch) => {
                    let child = branch.child(0);
                    self.push(current, 0);
                    current = child;
                }
                Node::Leaf(_) => {
                    self.push(current, 0);
                    return true;
                }
            }
        }
    }

    /// Transfers `amount` weight from the branches under the divergence point
    /// of the last `traverse_right` onto the branches left behind by it.
    /// Called after keys migrate from the current (right) leaf to its left
    /// neighbor during a rotate or coalesce.
    pub(crate) fn tilt_left<K, V, C>(&mut self, tree: &mut RawTree<K, V, C>, amount: usize) {
        let divergence = self.height() - 1 - self.left_path.len();
        for &handle in &self.left_path {
            if let Node::Branch(branch) = tree.node_mut(handle) {
                branch.add_weight(amount);
            }
        }
        for level in divergence + 1..self.height() - 1 {
            tree.branch_mut(self.nodes[level]).sub_weight(amount);
        }
        self.left_path.clear();
    }

    fn pivot_position(&self) -> Option<(usize, usize)> {
        (0..self.height().saturating_sub(1))
            .rev()
            .find(|&level| self.indexes[level] > 0)
            .map(|level| (level, self.indexes[level] - 1))
    }

    /// The nearest ancestor separator for which the path took a right child:
    /// the anchor of the subtree holding the current position.
    #[cfg(test)]
    pub(crate) fn get_pivot<'a, K, V, C>(&self, tree: &'a RawTree<K, V, C>) -> Option<&'a K> {
        self.pivot_position().map(|(level, index)| tree.branch(self.nodes[level]).key(index))
    }

    /// Rewrites the nearest right-turn separator after the subtree's first
    /// key changed.
    pub(crate) fn set_pivot<K, V, C>(&self, tree: &mut RawTree<K, V, C>, key: K) {
        if let Some((level, index)) = self.pivot_position() {
            tree.branch_mut(self.nodes[level]).set_key(index, key);
        }
    }

    /// As `set_pivot`, but only considers levels strictly above `level`.
    fn set_pivot_above<K, V, C>(&self, tree: &mut RawTree<K, V, C>, key: K, level: usize) {
        if let Some(turn) = (0..level).rev().find(|&l| self.indexes[l] > 0) {
            tree.branch_mut(self.nodes[turn]).set_key(self.indexes[turn] - 1, key);
        }
    }

    /// Grafts a freshly split-off node into the parent of the current leaf,
    /// splitting branches (and ultimately the root) as they overflow.
    ///
    /// `separator` must be the first key of `new_child`'s subtree. When
    /// `is_append` is set the splits keep the new right nodes minimal so the
    /// rightmost spine stays sparse under monotonic load.
    pub(crate) fn promote<K, V, C>(&mut self, tree: &mut RawTree<K, V, C>, separator: K, new_child: Handle, is_append: bool) {
        let max_keys = tree.max_keys();
        let mut separator = separator;
        let mut new_child = new_child;
        self.pop(); // the leaf level is settled
        loop {
            let Some((handle, index)) = self.top() else {
                // The split reached the top: graft a new root.
                let old_root = tree.root();
                let weight = tree.node_weight(old_root) + tree.node_weight(new_child);
                let root = BranchNode::new_root(old_root, separator, new_child, weight);
                let root = tree.alloc(Node::Branch(root));
                tree.set_root(root);
                return;
            };
            let overflowed = {
                let branch = tree.branch_mut(handle);
                branch.insert_child(index, separator, new_child);
                branch.key_count() > max_keys
            };
            if !overflowed {
                return;
            }
            let key_count = tree.branch(handle).key_count();
            let split_at = if is_append { key_count - 1 } else { key_count / 2 };
            let (up, mut right) = tree.branch_mut(handle).split(split_at);
            let right_weight: usize = right.children().iter().map(|&child| tree.node_weight(child)).sum();
            right.set_weight(right_weight);
            tree.branch_mut(handle).sub_weight(right_weight);
            separator = up;
            new_child = tree.alloc(Node::Branch(right));
            self.pop();
        }
    }

    /// Detaches the dead node at the top of the path from its parent and
    /// restores the fill invariant bottom-up: coalesce with the same-parent
    /// right sibling when the combined keys fit, rotate through the pivot
    /// when they do not, collapse a one-child root into its child.
    ///
    /// The dead node must already be empty; a dead leaf must already be
    /// unlinked from the sibling chain.
    pub(crate) fn demote<K: Clone, V, C>(&mut self, tree: &mut RawTree<K, V, C>) {
        let max_keys = tree.max_keys();
        let min_keys = tree.min_branch_keys();
        let (dead, _) = self.pop().expect("demote requires a non-root node");
        tree.free(dead);
        loop {
            let Some((handle, index)) = self.top() else {
                unreachable!("the root is never demoted");
            };
            // Detach the dead child and its anchor separator.
            if index == 0 {
                if let Some(separator) = tree.branch_mut(handle).remove_first_child() {
                    // The subtree's minimum moved up to the old first anchor.
                    self.set_pivot_above(tree, separator, self.height() - 1);
                }
            } else {
                tree.branch_mut(handle).remove_child(index);
            }
            if tree.branch(handle).child_count() == 0 {
                // A childless branch (rightmost-spine remnant) dies in turn.
                self.pop();
                tree.free(handle);
                continue;
            }
            if self.height() == 1 {
                let branch = tree.branch(handle);
                if branch.key_count() == 0 {
                    let child = branch.child(0);
                    tree.free(handle);
                    tree.set_root(child);
                }
                return;
            }
            if tree.branch(handle).key_count() >= min_keys {
                return;
            }
            // Underfull. Rebalance against the right sibling under the same
            // parent; the last child of its parent is spine-exempt.
            let parent_level = self.height() - 2;
            let (parent_handle, parent_index) = (self.nodes[parent_level], self.indexes[parent_level]);
            let parent = tree.branch(parent_handle);
            if parent_index + 1 >= parent.child_count() {
                return;
            }
            let right_handle = parent.child(parent_index + 1);
            let pivot = parent.key(parent_index).clone();
            let left_count = tree.branch(handle).key_count();
            let right_count = tree.branch(right_handle).key_count();
            if left_count + right_count + 1 <= max_keys {
                // Coalesce left, pivot between; then detach the absorbed
                // sibling's slot one level up.
                let right = tree.take_branch(right_handle);
                tree.branch_mut(handle).merge_right(pivot, right);
                self.pop();
                *self.indexes.last_mut().unwrap() = parent_index + 1;
            } else {
                // Rotate through the pivot: shift front children off the
                // right sibling until the pair is balanced.
                let shifts = (left_count + right_count + 1) / 2 - left_count;
                let mut pivot = pivot;
                for _ in 0..shifts {
                    let (next_pivot, child) = tree.branch_mut(right_handle).pop_front_child();
                    let weight = tree.node_weight(child);
                    tree.branch_mut(right_handle).sub_weight(weight);
                    let branch = tree.branch_mut(handle);
                    branch.push_child(pivot, child);
                    branch.add_weight(weight);
                    pivot = next_pivot;
                }
                tree.branch_mut(parent_handle).set_key(parent_index, pivot);
                return;
            }
        }
    }
}
