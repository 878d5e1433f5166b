use core::cmp::Ordering;
use std::sync::OnceLock;

use crate::comparer::Comparer;
use crate::error::Error;
use crate::sync_root::SyncRoot;
use crate::{ORDER_MAX, ORDER_MIN};

use super::arena::{Arena, Handle};
use super::node::{BranchNode, LeafNode, Node};
use super::vector::{NodeVector, Seek};

/// The B+ tree core shared by every collection flavor.
///
/// Owns the node arena, the root, the ends of the leaf chain, the injected
/// comparer, the branching factor, and the stage counter that invalidates
/// cursors. Set flavors instantiate `V = ()`.
pub(crate) struct RawTree<K, V, C> {
    /// Arena storing every node; leaves link to siblings by slot handle.
    nodes: Arena<Node<K, V>>,
    /// The root node. An empty tree is a single empty leaf.
    root: Handle,
    /// Head of the leaf chain.
    first_leaf: Handle,
    /// Tail of the leaf chain.
    last_leaf: Handle,
    /// Total number of entries.
    len: usize,
    /// Branching factor: maximum children per branch.
    order: usize,
    comparer: C,
    /// Bumped on every mutation; cursors freeze it at construction.
    stage: u64,
    sync_root: OnceLock<SyncRoot>,
}

impl<K, V, C> RawTree<K, V, C> {
    pub(crate) fn with_order(order: usize, comparer: C) -> Result<Self, Error> {
        if !(ORDER_MIN..=ORDER_MAX).contains(&order) {
            return Err(Error::InvalidOrder(order));
        }
        let mut nodes = Arena::new();
        let root = nodes.alloc(Node::Leaf(LeafNode::new()));
        Ok(Self {
            nodes,
            root,
            first_leaf: root,
            last_leaf: root,
            len: 0,
            order,
            comparer,
            stage: 0,
            sync_root: OnceLock::new(),
        })
    }

    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) const fn order(&self) -> usize {
        self.order
    }

    pub(crate) const fn stage(&self) -> u64 {
        self.stage
    }

    pub(crate) fn comparer(&self) -> &C {
        &self.comparer
    }

    /// Keys per node never exceed this.
    pub(crate) const fn max_keys(&self) -> usize {
        self.order - 1
    }

    /// Leaves with a right sibling rebalance below this.
    pub(crate) fn min_leaf_keys(&self) -> usize {
        (self.order - 1).div_ceil(2)
    }

    /// Branches with a right sibling rebalance below this.
    pub(crate) fn min_branch_keys(&self) -> usize {
        self.order.div_ceil(2) - 1
    }

    pub(crate) fn sync_root(&self) -> SyncRoot {
        self.sync_root.get_or_init(SyncRoot::new).clone()
    }

    pub(crate) const fn root(&self) -> Handle {
        self.root
    }

    pub(crate) fn set_root(&mut self, root: Handle) {
        self.root = root;
    }

    pub(crate) const fn first_leaf(&self) -> Handle {
        self.first_leaf
    }

    pub(crate) const fn last_leaf(&self) -> Handle {
        self.last_leaf
    }

    #[inline]
    pub(crate) fn node(&self, handle: Handle) -> &Node<K, V> {
        self.nodes.get(handle)
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, handle: Handle) -> &mut Node<K, V> {
        self.nodes.get_mut(handle)
    }

    #[inline]
    pub(crate) fn leaf(&self, handle: Handle) -> &LeafNode<K, V> {
        self.nodes.get(handle).as_leaf()
    }

    #[inline]
    pub(crate) fn leaf_mut(&mut self, handle: Handle) -> &mut LeafNode<K, V> {
        self.nodes.get_mut(handle).as_leaf_mut()
    }

    #[inline]
    pub(crate) fn branch(&self, handle: Handle) -> &BranchNode<K> {
        self.nodes.get(handle).as_branch()
    }

    #[inline]
    pub(crate) fn branch_mut(&mut self, handle: Handle) -> &mut BranchNode<K> {
        self.nodes.get_mut(handle).as_branch_mut()
    }

    /// Leaf-key count under the node: the cached weight for branches, the key
    /// count for leaves.
    #[inline]
    pub(crate) fn node_weight(&self, handle: Handle) -> usize {
        self.nodes.get(handle).weight()
    }

    pub(crate) fn alloc(&mut self, node: Node<K, V>) -> Handle {
        self.nodes.alloc(node)
    }

    pub(crate) fn free(&mut self, handle: Handle) {
        self.nodes.free(handle);
    }

    pub(crate) fn take_branch(&mut self, handle: Handle) -> BranchNode<K> {
        match self.nodes.take(handle) {
            Node::Branch(branch) => branch,
            Node::Leaf(_) => panic!("expected branch node"),
        }
    }

    /// Resets the tree to a single empty leaf.
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        let root = self.nodes.alloc(Node::Leaf(LeafNode::new()));
        self.root = root;
        self.first_leaf = root;
        self.last_leaf = root;
        self.len = 0;
        self.stage += 1;
    }

    pub(crate) fn first_entry(&self) -> Option<(&K, &V)> {
        if self.len == 0 {
            return None;
        }
        let leaf = self.leaf(self.first_leaf);
        Some((leaf.key(0), leaf.value(0)))
    }

    pub(crate) fn last_entry(&self) -> Option<(&K, &V)> {
        if self.len == 0 {
            return None;
        }
        let leaf = self.leaf(self.last_leaf);
        let index = leaf.key_count() - 1;
        Some((leaf.key(index), leaf.value(index)))
    }

    /// Position of the first entry, if any.
    pub(crate) fn first_position(&self) -> Option<(Handle, usize)> {
        if self.len == 0 { None } else { Some((self.first_leaf, 0)) }
    }

    /// Position of the last entry, if any.
    pub(crate) fn last_position(&self) -> Option<(Handle, usize)> {
        if self.len == 0 {
            None
        } else {
            Some((self.last_leaf, self.leaf(self.last_leaf).key_count() - 1))
        }
    }

    /// The position one step right in sorted order, hopping the leaf chain.
    pub(crate) fn position_after(&self, handle: Handle, index: usize) -> Option<(Handle, usize)> {
        let leaf = self.leaf(handle);
        if index + 1 < leaf.key_count() {
            Some((handle, index + 1))
        } else {
            leaf.next().map(|next| (next, 0))
        }
    }

    /// The position one step left in sorted order.
    pub(crate) fn position_before(&self, handle: Handle, index: usize) -> Option<(Handle, usize)> {
        if index > 0 {
            Some((handle, index - 1))
        } else {
            self.leaf(handle).prev().map(|prev| (prev, self.leaf(prev).key_count() - 1))
        }
    }

    /// Drains every entry in sorted order by walking the leaf chain, skipping
    /// any rebalancing.
    pub(crate) fn into_entries(mut self) -> Vec<(K, V)> {
        let mut entries = Vec::with_capacity(self.len);
        let mut current = Some(self.first_leaf);
        while let Some(handle) = current {
            let leaf = self.nodes.get_mut(handle).as_leaf_mut();
            let next = leaf.next();
            let (keys, values) = leaf.take_entries();
            entries.extend(keys.into_iter().zip(values));
            current = next;
        }
        entries
    }

    pub(crate) fn iter(&self) -> RawIter<'_, K, V, C> {
        RawIter {
            tree: self,
            front: self.first_position(),
            back: self.last_position(),
            remaining: self.len,
        }
    }

    /// The element at the given rank, by weight descent from the root.
    pub(crate) fn element_at(&self, rank: usize) -> Option<(&K, &V)> {
        if rank >= self.len {
            return None;
        }
        let mut current = self.root;
        let mut remaining = rank;
        loop {
            match self.node(current) {
                Node::Branch(branch) => {
                    let mut child = 0;
                    loop {
                        debug_assert!(child < branch.child_count());
                        let weight = self.node_weight(branch.child(child));
                        if remaining < weight {
                            break;
                        }
                        remaining -= weight;
                        child += 1;
                    }
                    current = branch.child(child);
                }
                Node::Leaf(leaf) => return Some((leaf.key(remaining), leaf.value(remaining))),
            }
        }
    }
}

impl<K, V, C: Comparer<K>> RawTree<K, V, C> {
    /// Exact-match search without building a path. For duplicate-key flavors
    /// this lands on the last equal entry.
    pub(crate) fn find(&self, key: &K) -> Option<(Handle, usize)> {
        let mut current = self.root;
        loop {
            match self.node(current) {
                Node::Branch(branch) => current = branch.child(branch.descend_upper(key, &self.comparer)),
                Node::Leaf(leaf) => {
                    let index = leaf.upper_bound(key, &self.comparer);
                    if index > 0 && self.comparer.compare(leaf.key(index - 1), key) == Ordering::Equal {
                        return Some((current, index - 1));
                    }
                    return None;
                }
            }
        }
    }

    pub(crate) fn contains(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    pub(crate) fn get(&self, key: &K) -> Option<&V> {
        let (handle, index) = self.find(key)?;
        Some(self.leaf(handle).value(index))
    }

    pub(crate) fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let (handle, index) = self.find(key)?;
        Some(self.leaf_mut(handle).value_mut(index))
    }

    pub(crate) fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        let (handle, index) = self.find(key)?;
        let leaf = self.leaf(handle);
        Some((leaf.key(index), leaf.value(index)))
    }

    /// The rank of the key's position, or the bitwise complement of the rank
    /// it would be inserted at. [`Seek::Lowest`] ranks the first equal entry,
    /// [`Seek::Highest`] the position just past the last equal entry.
    pub(crate) fn index_of(&self, key: &K, seek: Seek) -> isize {
        let (vector, found) = NodeVector::seek(self, key, seek);
        #[allow(clippy::cast_possible_wrap)]
        let rank = vector.rank(self) as isize;
        if found { rank } else { !rank }
    }

    /// Number of entries equal to `key`, via two path builds.
    pub(crate) fn count_of(&self, key: &K) -> usize {
        let (lower, found) = NodeVector::seek(self, key, Seek::Lowest);
        if !found {
            return 0;
        }
        let (upper, _) = NodeVector::seek(self, key, Seek::Highest);
        upper.rank(self) - lower.rank(self)
    }

    /// First position with key >= `key`, if any.
    pub(crate) fn lower_position(&self, key: &K) -> Option<(Handle, usize)> {
        let mut current = self.root;
        loop {
            match self.node(current) {
                Node::Branch(branch) => current = branch.child(branch.descend_lower(key, &self.comparer)),
                Node::Leaf(leaf) => {
                    let index = leaf.lower_bound(key, &self.comparer);
                    if index < leaf.key_count() {
                        return Some((current, index));
                    }
                    return leaf.next().map(|next| (next, 0));
                }
            }
        }
    }

    /// First position with key > `key`, if any.
    pub(crate) fn upper_position(&self, key: &K) -> Option<(Handle, usize)> {
        let mut current = self.root;
        loop {
            match self.node(current) {
                Node::Branch(branch) => current = branch.child(branch.descend_upper(key, &self.comparer)),
                Node::Leaf(leaf) => {
                    let index = leaf.upper_bound(key, &self.comparer);
                    if index < leaf.key_count() {
                        return Some((current, index));
                    }
                    return leaf.next().map(|next| (next, 0));
                }
            }
        }
    }

    /// Number of distinct keys, jumping equal runs.
    pub(crate) fn distinct_count(&self) -> usize {
        let mut count = 0;
        let mut position = self.first_position();
        while let Some((handle, index)) = position {
            count += 1;
            position = self.upper_position(self.leaf(handle).key(index));
        }
        count
    }

    /// Forward scan starting at the first key >= `lower`, bounded above by
    /// `upper` inclusively when present.
    pub(crate) fn range<'a>(&'a self, lower: &K, upper: Option<&'a K>) -> RawRange<'a, K, V, C> {
        RawRange {
            tree: self,
            position: self.lower_position(lower),
            upper,
        }
    }

    /// One entry per distinct key, first occurrence of each.
    pub(crate) fn distinct(&self) -> RawDistinct<'_, K, V, C> {
        RawDistinct {
            tree: self,
            position: self.first_position(),
        }
    }
}

impl<K: Clone, V, C: Comparer<K>> RawTree<K, V, C> {
    /// Inserts when the key is absent; returns false (leaving the tree and
    /// its stage untouched) when present.
    pub(crate) fn insert_unique(&mut self, key: K, value: V) -> bool {
        let (mut vector, found) = NodeVector::seek(self, &key, Seek::Highest);
        if found {
            return false;
        }
        self.insert_at_vector(&mut vector, key, value);
        true
    }

    /// Inserts, or replaces the value of an existing key in place.
    pub(crate) fn insert_or_assign(&mut self, key: K, value: V) -> Option<V> {
        let (mut vector, found) = NodeVector::seek(self, &key, Seek::Highest);
        if found {
            let index = vector.leaf_index() - 1;
            let leaf = self.leaf_mut(vector.leaf());
            let old = core::mem::replace(leaf.value_mut(index), value);
            self.stage += 1;
            return Some(old);
        }
        self.insert_at_vector(&mut vector, key, value);
        None
    }

    /// Always inserts; an equal key goes after every existing equal entry so
    /// insertion order among equals is stable.
    pub(crate) fn insert_dup(&mut self, key: K, value: V) {
        let (mut vector, _) = NodeVector::seek(self, &key, Seek::Highest);
        self.insert_at_vector(&mut vector, key, value);
    }

    fn insert_at_vector(&mut self, vector: &mut NodeVector, key: K, value: V) {
        self.stage += 1;
        self.len += 1;
        let max_keys = self.max_keys();
        let handle = vector.leaf();
        let index = vector.leaf_index();
        let (is_append, right) = {
            let leaf = self.leaf_mut(handle);
            if leaf.key_count() < max_keys {
                leaf.insert(index, key, value);
                (false, None)
            } else if leaf.next().is_none() && index == leaf.key_count() {
                // Tail of the rightmost leaf: the new leaf takes only the new
                // key, keeping the right spine sparse under monotonic load.
                let mut right = LeafNode::new();
                right.insert(0, key, value);
                (true, Some(right))
            } else {
                leaf.insert(index, key, value);
                // Midpoint split over the post-insert count keeps both halves
                // at or above minimum fill.
                let split_at = leaf.key_count() / 2;
                (false, Some(leaf.split_off(split_at)))
            }
        };
        let Some(mut right) = right else {
            vector.update_weight(self, 1);
            return;
        };
        // Thread the new leaf into the chain immediately right of the old.
        let old_next = self.leaf(handle).next();
        right.set_prev(Some(handle));
        right.set_next(old_next);
        let separator = right.key(0).clone();
        let right_handle = self.alloc(Node::Leaf(right));
        self.leaf_mut(handle).set_next(Some(right_handle));
        match old_next {
            Some(next) => self.leaf_mut(next).set_prev(Some(right_handle)),
            None => self.last_leaf = right_handle,
        }
        vector.update_weight(self, 1);
        vector.promote(self, separator, right_handle, is_append);
    }

    /// Removes the lowest occurrence of `key`.
    pub(crate) fn remove_key(&mut self, key: &K) -> Option<(K, V)> {
        let (mut vector, found) = NodeVector::seek(self, key, Seek::Lowest);
        if !found {
            return None;
        }
        Some(self.remove_at_vector(&mut vector))
    }

    /// Removes the entry at the given rank. The caller must bounds-check.
    pub(crate) fn remove_at_rank(&mut self, rank: usize) -> (K, V) {
        debug_assert!(rank < self.len);
        let mut vector = NodeVector::seek_rank(self, rank);
        self.remove_at_vector(&mut vector)
    }

    pub(crate) fn pop_first(&mut self) -> Option<(K, V)> {
        if self.len == 0 { None } else { Some(self.remove_at_rank(0)) }
    }

    pub(crate) fn pop_last(&mut self) -> Option<(K, V)> {
        if self.len == 0 { None } else { Some(self.remove_at_rank(self.len - 1)) }
    }

    /// Removes every entry the predicate approves of.
    pub(crate) fn remove_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&K, &V) -> bool,
    {
        let mut ranks: Vec<usize> = Vec::new();
        for (rank, (key, value)) in self.iter().enumerate() {
            if predicate(key, value) {
                ranks.push(rank);
            }
        }
        for &rank in ranks.iter().rev() {
            self.remove_at_rank(rank);
        }
        ranks.len()
    }

    fn remove_at_vector(&mut self, vector: &mut NodeVector) -> (K, V) {
        let handle = vector.leaf();
        let index = vector.leaf_index();
        let entry = self.leaf_mut(handle).remove(index);
        self.len -= 1;
        self.stage += 1;
        vector.update_weight(self, -1);
        let key_count = self.leaf(handle).key_count();
        if key_count == 0 {
            if vector.left_sibling(self).is_none() && self.leaf(handle).next().is_none() {
                // The sole (leftmost) leaf may sit empty.
                return entry;
            }
            self.unlink_leaf(handle);
            vector.demote(self);
            return entry;
        }
        let leaf = self.leaf(handle);
        if index == 0 {
            // The anchor for this subtree changed.
            let first = leaf.key(0).clone();
            vector.set_pivot(self, first);
        }
        if key_count < self.min_leaf_keys() && self.leaf(handle).next().is_some() {
            self.balance_leaf(vector, handle);
        }
        entry
    }

    /// Restores the fill invariant of an underfull leaf against its right
    /// chain neighbor, which may live under a different parent.
    fn balance_leaf(&mut self, vector: &mut NodeVector, handle: Handle) {
        let max_keys = self.max_keys();
        let right_handle = self.leaf(handle).next().unwrap();
        let left_count = self.leaf(handle).key_count();
        let right_count = self.leaf(right_handle).key_count();
        if left_count + right_count > max_keys {
            // Rotate: shift the front of the right neighbor onto this leaf.
            let shifts = (left_count + right_count + 1) / 2 - left_count;
            let (keys, values) = self.leaf_mut(right_handle).drain_front(shifts);
            self.leaf_mut(handle).extend_back(keys, values);
            let advanced = vector.traverse_right(self);
            debug_assert!(advanced);
            let first = self.leaf(right_handle).key(0).clone();
            vector.set_pivot(self, first);
            vector.tilt_left(self, shifts);
        } else {
            // Coalesce left: absorb the right neighbor, then demote its husk.
            let (keys, values) = self.leaf_mut(right_handle).take_entries();
            self.leaf_mut(handle).extend_back(keys, values);
            self.unlink_leaf(right_handle);
            let advanced = vector.traverse_right(self);
            debug_assert!(advanced);
            vector.tilt_left(self, right_count);
            vector.demote(self);
        }
    }

    fn unlink_leaf(&mut self, handle: Handle) {
        let leaf = self.leaf(handle);
        let prev = leaf.prev();
        let next = leaf.next();
        match prev {
            Some(prev) => self.leaf_mut(prev).set_next(next),
            None => self.first_leaf = next.unwrap(),
        }
        match next {
            Some(next) => self.leaf_mut(next).set_prev(prev),
            None => self.last_leaf = prev.unwrap(),
        }
    }
}

impl<K: Clone, V: Clone, C: Clone> Clone for RawTree<K, V, C> {
    fn clone(&self) -> Self {
        // Handles are arena slot indices, so cloning the arena slot-for-slot
        // preserves every link, the root, and the chain ends.
        Self {
            nodes: self.nodes.clone(),
            root: self.root,
            first_leaf: self.first_leaf,
            last_leaf: self.last_leaf,
            len: self.len,
            order: self.order,
            comparer: self.comparer.clone(),
            stage: self.stage,
            sync_root: OnceLock::new(),
        }
    }
}

/// Double-ended iterator over every entry, walking the leaf chain.
pub(crate) struct RawIter<'a, K, V, C> {
    tree: &'a RawTree<K, V, C>,
    front: Option<(Handle, usize)>,
    back: Option<(Handle, usize)>,
    remaining: usize,
}

impl<K, V, C> Clone for RawIter<'_, K, V, C> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V, C> Iterator for RawIter<'a, K, V, C> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let tree = self.tree;
        let (handle, index) = self.front?;
        let leaf = tree.leaf(handle);
        self.remaining -= 1;
        if self.remaining == 0 {
            self.front = None;
            self.back = None;
        } else {
            self.front = tree.position_after(handle, index);
        }
        Some((leaf.key(index), leaf.value(index)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V, C> DoubleEndedIterator for RawIter<'_, K, V, C> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let tree = self.tree;
        let (handle, index) = self.back?;
        let leaf = tree.leaf(handle);
        self.remaining -= 1;
        if self.remaining == 0 {
            self.front = None;
            self.back = None;
        } else {
            self.back = tree.position_before(handle, index);
        }
        Some((leaf.key(index), leaf.value(index)))
    }
}

impl<K, V, C> ExactSizeIterator for RawIter<'_, K, V, C> {}
impl<K, V, C> core::iter::FusedIterator for RawIter<'_, K, V, C> {}

/// Forward scan from a lower bound, optionally capped by an inclusive upper
/// bound.
pub(crate) struct RawRange<'a, K, V, C> {
    tree: &'a RawTree<K, V, C>,
    position: Option<(Handle, usize)>,
    upper: Option<&'a K>,
}

impl<'a, K, V, C: Comparer<K>> Iterator for RawRange<'a, K, V, C> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;
        let (handle, index) = self.position?;
        let leaf = tree.leaf(handle);
        let key = leaf.key(index);
        if let Some(upper) = self.upper
            && tree.comparer().compare(key, upper) == Ordering::Greater
        {
            self.position = None;
            return None;
        }
        self.position = tree.position_after(handle, index);
        Some((key, leaf.value(index)))
    }
}

impl<K, V, C: Comparer<K>> core::iter::FusedIterator for RawRange<'_, K, V, C> {}

/// Yields the first occurrence of each distinct key, hopping equal runs with
/// an upper-bound descent per step.
pub(crate) struct RawDistinct<'a, K, V, C> {
    tree: &'a RawTree<K, V, C>,
    position: Option<(Handle, usize)>,
}

impl<'a, K, V, C: Comparer<K>> Iterator for RawDistinct<'a, K, V, C> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;
        let (handle, index) = self.position?;
        let leaf = tree.leaf(handle);
        let key = leaf.key(index);
        self.position = tree.upper_position(key);
        Some((key, leaf.value(index)))
    }
}

impl<K, V, C: Comparer<K>> core::iter::FusedIterator for RawDistinct<'_, K, V, C> {}

#[cfg(test)]
impl<K, V, C> RawTree<K, V, C>
where
    K: Clone + core::fmt::Debug,
    C: Comparer<K>,
{
    /// Walks the whole tree and panics on any structural invariant violation.
    /// Intended for tests only.
    pub(crate) fn assert_valid(&self, unique: bool) {
        let mut leaves = Vec::new();
        let mut leaf_depth = None;
        let weight = self.check_node(self.root, 0, &mut leaf_depth, &mut leaves);
        assert_eq!(weight, self.len, "root weight must equal the element count");

        // The leaf chain must enumerate exactly the leaves, in tree order,
        // with mutually inverse links and the tracked ends.
        assert_eq!(leaves.first(), Some(&self.first_leaf), "first_leaf must head the chain");
        assert_eq!(leaves.last(), Some(&self.last_leaf), "last_leaf must end the chain");
        let mut previous: Option<Handle> = None;
        for (position, &handle) in leaves.iter().enumerate() {
            let leaf = self.leaf(handle);
            assert_eq!(leaf.prev(), previous, "left link of leaf {position} is wrong");
            assert_eq!(leaf.next(), leaves.get(position + 1).copied(), "right link of leaf {position} is wrong");
            previous = Some(handle);
        }

        // Keys must be ordered across the chain, strictly for unique flavors.
        let mut last: Option<K> = None;
        for &handle in &leaves {
            for key in self.leaf(handle).keys() {
                if let Some(last) = &last {
                    let ordering = self.comparer.compare(last, key);
                    if unique {
                        assert_eq!(ordering, Ordering::Less, "keys must be strictly increasing: {last:?} vs {key:?}");
                    } else {
                        assert_ne!(ordering, Ordering::Greater, "keys must be non-decreasing: {last:?} vs {key:?}");
                    }
                }
                last = Some(key.clone());
            }
        }

        // Only the sole leaf of an empty tree may be empty.
        if leaves.len() > 1 {
            for &handle in &leaves {
                assert!(self.leaf(handle).key_count() > 0, "only the sole leaf may be empty");
            }
        }
    }

    fn check_node(&self, handle: Handle, depth: usize, leaf_depth: &mut Option<usize>, leaves: &mut Vec<Handle>) -> usize {
        match self.node(handle) {
            Node::Leaf(leaf) => {
                match *leaf_depth {
                    None => *leaf_depth = Some(depth),
                    Some(expected) => assert_eq!(depth, expected, "all leaves must share a depth"),
                }
                leaves.push(handle);
                leaf.key_count()
            }
            Node::Branch(branch) => {
                assert_eq!(branch.child_count(), branch.key_count() + 1, "a branch has one more child than keys");
                let mut weight = 0;
                for index in 0..branch.child_count() {
                    let child = branch.child(index);
                    weight += self.check_node(child, depth + 1, leaf_depth, leaves);
                    if index + 1 < branch.child_count() {
                        // Nodes with a right sibling honor the fill invariant;
                        // the rightmost spine is exempt.
                        match self.node(child) {
                            Node::Leaf(leaf) => assert!(
                                leaf.key_count() >= self.min_leaf_keys(),
                                "leaf below minimum fill: {} < {}",
                                leaf.key_count(),
                                self.min_leaf_keys()
                            ),
                            Node::Branch(inner) => assert!(
                                inner.key_count() >= self.min_branch_keys(),
                                "branch below minimum fill: {} < {}",
                                inner.key_count(),
                                self.min_branch_keys()
                            ),
                        }
                    }
                    if index > 0 {
                        // Each separator anchors the subtree to its right.
                        let anchor = branch.key(index - 1);
                        let first = self.subtree_first_key(child);
                        assert_eq!(
                            self.comparer.compare(anchor, first),
                            Ordering::Equal,
                            "separator {anchor:?} must equal the first key {first:?} of its right subtree"
                        );
                    }
                }
                assert_eq!(branch.weight(), weight, "cached weight must equal the sum of child weights");
                weight
            }
        }
    }

    fn subtree_first_key(&self, handle: Handle) -> &K {
        let mut current = handle;
        loop {
            match self.node(current) {
                Node::Branch(branch) => current = branch.child(0),
                Node::Leaf(leaf) => return leaf.key(0),
            }
        }
    }
}
