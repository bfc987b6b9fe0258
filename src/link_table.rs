use crate::automaton_builder::int_hash;
use crate::ids::{TransitionIndex, UnitIndex};

/// Maps merging automaton transitions to the double-array offset already
/// assigned to their state, so shared subtrees are packed only once.
///
/// Open addressing with linear probing; transition 0 is never merging and
/// serves as the empty key.
pub(crate) struct LinkTable {
    slots: Vec<(u32, u32)>,
}

impl LinkTable {
    /// A table for `capacity` entries. One slot always stays free so probing
    /// terminates.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        LinkTable {
            slots: vec![(0, 0); capacity + capacity / 2 + 1],
        }
    }

    pub(crate) fn insert(&mut self, index: TransitionIndex, offset: UnitIndex) {
        let slot = self.find_slot(index.get());
        self.slots[slot] = (index.get(), offset.get());
    }

    /// Offset stored for `index`, or `None` if the state was not packed yet.
    pub(crate) fn find(&self, index: TransitionIndex) -> Option<UnitIndex> {
        let (key, offset) = self.slots[self.find_slot(index.get())];
        (key != 0).then_some(UnitIndex(offset))
    }

    fn find_slot(&self, index: u32) -> usize {
        let len = self.slots.len();
        let mut slot = int_hash(index) as usize % len;
        loop {
            let key = self.slots[slot].0;
            if key == 0 || key == index {
                return slot;
            }
            slot = (slot + 1) % len;
        }
    }
}
