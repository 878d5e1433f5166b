use core::num::NonZero;

/// Index of an arena slot, stored shifted by one so the all-zero bit pattern
/// stays free and `Option<Handle>` in the leaf sibling links costs no extra
/// space.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(transparent)]
pub(crate) struct Handle(NonZero<u32>);

impl Handle {
    /// Wraps a slot number. Panics when the arena has run out of
    /// representable slots.
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn from_slot(slot: usize) -> Self {
        // The shifted value must still fit in u32.
        assert!(slot < u32::MAX as usize, "arena is out of slots");
        Self(NonZero::new(slot as u32 + 1).expect("slot + 1 is nonzero"))
    }

    fn slot(self) -> usize {
        self.0.get() as usize - 1
    }
}

/// A slab of node slots. Nodes refer to each other by [`Handle`] rather than
/// by reference, which turns the cyclic leaf sibling list into plain slot
/// indices owned by the tree.
#[derive(Clone)]
pub(crate) struct Arena<T> {
    slots: Vec<Option<T>>,
    free: Vec<Handle>,
}

impl<T> Arena<T> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub(crate) const fn len(&self) -> usize {
        self.slots.len().saturating_sub(self.free.len())
    }

    pub(crate) fn alloc(&mut self, element: T) -> Handle {
        if let Some(handle) = self.free.pop() {
            // Reuse a freed slot.
            self.slots[handle.slot()] = Some(element);
            handle
        } else {
            self.slots.push(Some(element));
            Handle::from_slot(self.slots.len() - 1)
        }
    }

    #[inline]
    pub(crate) fn get(&self, handle: Handle) -> &T {
        self.slots[handle.slot()].as_ref().expect("stale arena handle")
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, handle: Handle) -> &mut T {
        self.slots[handle.slot()].as_mut().expect("stale arena handle")
    }

    pub(crate) fn take(&mut self, handle: Handle) -> T {
        let element = self.slots[handle.slot()].take().expect("stale arena handle");
        self.free.push(handle);
        element
    }

    pub(crate) fn free(&mut self, handle: Handle) {
        drop(self.take(handle));
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}
