use std::mem;

use smallvec::SmallVec;
use tracing::{debug, trace};

use super::unit::{Unit, OFFSET_MAX};
use super::DoubleArray;
use crate::automaton::Automaton;
use crate::error::{DawgError, Result};
use crate::ids::{TransitionIndex, UnitIndex};
use crate::link_table::LinkTable;

const BLOCK_SIZE: u32 = 256;
const NUM_UNFIXED_BLOCKS: u32 = 16;

const UPPER_MASK: u32 = !(OFFSET_MAX - 1);
const LOWER_MASK: u32 = 0xff;

/// Build-time bookkeeping for one double-array slot.
///
/// Slots not yet fixed form a circular doubly linked list through
/// `prev`/`next`, so a reserved slot is unlinked in constant time.
#[derive(Clone, Copy, Debug, Default)]
struct ExtraUnit {
    prev: u32,
    next: u32,
    is_fixed: bool,
    is_used: bool,
}

/// Packs an [`Automaton`] into a [`DoubleArray`].
///
/// Units are allocated in blocks of 256. Only the newest sixteen blocks take
/// part in the offset search; older blocks are closed, and any slot still free
/// in them gets a dummy label that no transition can match.
pub struct DoubleArrayBuilder<'a> {
    automaton: &'a Automaton,
    units: Vec<Unit>,
    extras: Vec<Vec<ExtraUnit>>,
    labels: SmallVec<[u8; 16]>,
    link_table: LinkTable,
    unfixed_index: u32,
    num_unused_units: usize,
}

impl<'a> DoubleArrayBuilder<'a> {
    pub fn new(automaton: &'a Automaton) -> Self {
        DoubleArrayBuilder {
            automaton,
            units: Vec::new(),
            extras: Vec::new(),
            labels: SmallVec::new(),
            link_table: LinkTable::with_capacity(automaton.num_merging_states()),
            unfixed_index: 0,
            num_unused_units: 0,
        }
    }

    /// Number of slots that ended up holding no transition.
    pub fn num_unused_units(&self) -> usize {
        self.num_unused_units
    }

    /// Runs the packing and returns the finished array.
    ///
    /// # Errors
    ///
    /// `OffsetOverflow` if some state's children cannot be placed within the
    /// encodable offset range.
    pub fn build(&mut self) -> Result<DoubleArray> {
        self.reserve_unit(0);
        self.extra_mut(0).is_used = true;
        self.units[0].set_offset(1);
        self.units[0].set_label(0);

        if self.automaton.len() > 1 {
            self.build_indices(self.automaton.root(), 0)?;
        }
        self.fix_all_blocks();

        debug!(
            units = self.units.len(),
            unused = self.num_unused_units,
            "double array packed"
        );
        Ok(DoubleArray::from_units(mem::take(&mut self.units)))
    }

    fn num_units(&self) -> u32 {
        self.units.len() as u32
    }

    fn num_blocks(&self) -> u32 {
        self.extras.len() as u32
    }

    #[inline]
    fn extra(&self, index: u32) -> &ExtraUnit {
        &self.extras[(index / BLOCK_SIZE) as usize][(index % BLOCK_SIZE) as usize]
    }

    #[inline]
    fn extra_mut(&mut self, index: u32) -> &mut ExtraUnit {
        &mut self.extras[(index / BLOCK_SIZE) as usize][(index % BLOCK_SIZE) as usize]
    }

    fn build_indices(&mut self, transition: TransitionIndex, index: u32) -> Result<()> {
        let automaton = self.automaton;
        if automaton.is_leaf(transition) {
            return Ok(());
        }

        let child = automaton.child(transition);
        if automaton.is_merging(child) {
            if let Some(offset) = self.link_table.find(child) {
                let relative = offset.get() ^ index;
                if (relative & UPPER_MASK == 0 || relative & LOWER_MASK == 0)
                    && self.units[index as usize].set_offset(relative)
                {
                    if automaton.is_leaf(child) {
                        self.units[index as usize].set_has_leaf();
                    }
                    return Ok(());
                }
            }
        }

        let offset = self.arrange_child_nodes(transition, index)?;
        if automaton.is_merging(child) {
            self.link_table.insert(child, UnitIndex(offset));
        }

        for next in automaton.children(transition) {
            self.build_indices(next, offset ^ automaton.label(next) as u32)?;
        }
        Ok(())
    }

    fn arrange_child_nodes(&mut self, transition: TransitionIndex, index: u32) -> Result<u32> {
        let automaton = self.automaton;
        self.labels.clear();
        self.labels
            .extend(automaton.children(transition).map(|c| automaton.label(c)));

        let offset = self.find_good_offset(index);
        if !self.units[index as usize].set_offset(index ^ offset) {
            return Err(DawgError::OffsetOverflow { index });
        }

        for child in automaton.children(transition) {
            let label = automaton.label(child);
            let child_index = offset ^ label as u32;
            self.reserve_unit(child_index);

            if automaton.is_leaf(child) {
                self.units[index as usize].set_has_leaf();
                self.units[child_index as usize].set_value(automaton.value(child));
            } else {
                self.units[child_index as usize].set_label(label);
            }
        }
        self.extra_mut(offset).is_used = true;
        Ok(offset)
    }

    fn find_good_offset(&self, index: u32) -> u32 {
        if self.unfixed_index >= self.num_units() {
            return self.num_units() | (index & 0xff);
        }

        // Scans the free list from the oldest open slot.
        let mut unfixed = self.unfixed_index;
        loop {
            let offset = unfixed ^ self.labels[0] as u32;
            if self.is_good_offset(index, offset) {
                return offset;
            }
            unfixed = self.extra(unfixed).next;
            if unfixed == self.unfixed_index {
                break;
            }
        }
        self.num_units() | (index & 0xff)
    }

    fn is_good_offset(&self, index: u32, offset: u32) -> bool {
        if self.extra(offset).is_used {
            return false;
        }
        let relative = index ^ offset;
        if relative & LOWER_MASK != 0 && relative & UPPER_MASK != 0 {
            return false;
        }
        self.labels[1..]
            .iter()
            .all(|&label| !self.extra(offset ^ label as u32).is_fixed)
    }

    fn reserve_unit(&mut self, index: u32) {
        if index >= self.num_units() {
            self.expand();
        }

        if index == self.unfixed_index {
            self.unfixed_index = self.extra(index).next;
            if self.unfixed_index == index {
                self.unfixed_index = self.num_units();
            }
        }
        let ExtraUnit { prev, next, .. } = *self.extra(index);
        self.extra_mut(prev).next = next;
        self.extra_mut(next).prev = prev;
        self.extra_mut(index).is_fixed = true;
    }

    fn expand(&mut self) {
        let src_units = self.num_units();
        let src_blocks = self.num_blocks();
        let dest_units = src_units + BLOCK_SIZE;
        let dest_blocks = src_blocks + 1;

        if dest_blocks > NUM_UNFIXED_BLOCKS {
            self.fix_block(src_blocks - NUM_UNFIXED_BLOCKS);
        }

        self.units.resize(dest_units as usize, Unit::default());
        if dest_blocks > NUM_UNFIXED_BLOCKS {
            // The closed block's extras are recycled for the new one.
            let closed = (src_blocks - NUM_UNFIXED_BLOCKS) as usize;
            let mut block = mem::take(&mut self.extras[closed]);
            block.fill(ExtraUnit::default());
            self.extras.push(block);
        } else {
            self.extras
                .push(vec![ExtraUnit::default(); BLOCK_SIZE as usize]);
        }

        for i in src_units + 1..dest_units {
            self.extra_mut(i - 1).next = i;
            self.extra_mut(i).prev = i - 1;
        }
        self.extra_mut(src_units).prev = dest_units - 1;
        self.extra_mut(dest_units - 1).next = src_units;

        // Splices the new block in front of the oldest open slot.
        let unfixed = self.unfixed_index;
        let unfixed_prev = self.extra(unfixed).prev;
        self.extra_mut(src_units).prev = unfixed_prev;
        self.extra_mut(dest_units - 1).next = unfixed;
        self.extra_mut(unfixed_prev).next = src_units;
        self.extra_mut(unfixed).prev = dest_units - 1;
    }

    fn fix_all_blocks(&mut self) {
        let end = self.num_blocks();
        let begin = end.saturating_sub(NUM_UNFIXED_BLOCKS);
        for block in begin..end {
            self.fix_block(block);
        }
    }

    fn fix_block(&mut self, block: u32) {
        let begin = block * BLOCK_SIZE;
        let end = begin + BLOCK_SIZE;

        let unused_offset = (begin..end)
            .find(|&offset| !self.extra(offset).is_used)
            .unwrap_or(0);

        let mut unused = 0;
        for index in begin..end {
            if !self.extra(index).is_fixed {
                self.reserve_unit(index);
                self.units[index as usize].set_label((index ^ unused_offset) as u8);
                unused += 1;
            }
        }
        self.num_unused_units += unused;
        trace!(block, unused, "block closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_slots(builder: &DoubleArrayBuilder<'_>) -> Vec<u32> {
        let mut slots = Vec::new();
        if builder.unfixed_index >= builder.num_units() {
            return slots;
        }
        let mut cur = builder.unfixed_index;
        loop {
            slots.push(cur);
            cur = builder.extra(cur).next;
            if cur == builder.unfixed_index {
                break;
            }
        }
        slots
    }

    #[test]
    fn reserving_unlinks_from_the_free_list() {
        let automaton = Automaton::new();
        let mut builder = DoubleArrayBuilder::new(&automaton);
        builder.reserve_unit(0);
        assert_eq!(builder.num_units(), BLOCK_SIZE);
        assert_eq!(open_slots(&builder).len(), BLOCK_SIZE as usize - 1);
        assert_eq!(builder.unfixed_index, 1);

        builder.reserve_unit(5);
        let slots = open_slots(&builder);
        assert!(!slots.contains(&5));
        assert_eq!(slots.len(), BLOCK_SIZE as usize - 2);
    }

    #[test]
    fn expansion_splices_new_blocks_into_the_list() {
        let automaton = Automaton::new();
        let mut builder = DoubleArrayBuilder::new(&automaton);
        builder.reserve_unit(0);
        builder.reserve_unit(BLOCK_SIZE + 3);
        assert_eq!(builder.num_blocks(), 2);
        let slots = open_slots(&builder);
        assert_eq!(slots.len(), 2 * BLOCK_SIZE as usize - 2);
        assert_eq!(slots[0], 1);
    }

    #[test]
    fn old_blocks_are_closed() {
        let automaton = Automaton::new();
        let mut builder = DoubleArrayBuilder::new(&automaton);
        builder.reserve_unit(0);
        builder.extra_mut(0).is_used = true;
        for block in 1..=NUM_UNFIXED_BLOCKS {
            builder.reserve_unit(block * BLOCK_SIZE);
        }
        assert_eq!(builder.num_blocks(), NUM_UNFIXED_BLOCKS + 1);
        assert_eq!(builder.num_unused_units(), BLOCK_SIZE as usize - 1);
        assert!(open_slots(&builder)
            .iter()
            .all(|&slot| slot >= BLOCK_SIZE));
        // Dummy labels point away from the block's unused offset.
        assert_eq!(builder.units[1].label(), 1 ^ 1);
        assert_eq!(builder.units[2].label(), 2 ^ 1);
    }

    #[test]
    fn empty_automaton_packs_to_one_block() {
        let automaton = Automaton::new();
        let dict = DoubleArrayBuilder::new(&automaton).build().unwrap();
        assert_eq!(dict.len(), BLOCK_SIZE as usize);
        assert!(!dict.has_value(dict.root()));
    }
}
