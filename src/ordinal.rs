//! Rank/select over the keys of a dictionary: the position of a key in
//! sorted order and the key at a given position.

use std::io::{Read, Write};

use crate::bit_set::BitSet;
use crate::block;
use crate::double_array::DoubleArray;
use crate::error::{DawgError, Result};
use crate::guide::{Guide, GuideTable};
use crate::ids::UnitIndex;

/// Number of keys below each double-array state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrdinalIndex {
    counts: Vec<u32>,
}

impl OrdinalIndex {
    /// Counts keys per state. Shared subtrees are counted once.
    pub fn build(dict: &DoubleArray, guide: &Guide) -> Result<Self> {
        let mut counts = vec![0; dict.len()];
        if !dict.is_empty() {
            count_keys(dict, guide, &mut counts, dict.root())?;
        }
        Ok(OrdinalIndex { counts })
    }

    /// Keys in the subtree of `index`.
    pub fn child_count(&self, index: UnitIndex) -> u32 {
        self.counts.get(index.as_usize()).copied().unwrap_or(0)
    }

    pub fn total_count(&self) -> u32 {
        self.counts.first().copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn file_size(&self) -> usize {
        block::block_size::<u32>(self.counts.len())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(OrdinalIndex {
            counts: block::read_block(reader)?,
        })
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        block::write_block(writer, &self.counts)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8])> {
        let (counts, rest) = block::parse_block(bytes)?;
        Ok((OrdinalIndex { counts }, rest))
    }
}

/// Counts keys below every state reachable from `root`.
///
/// The walk keeps an explicit stack, so deep keys cannot exhaust the thread
/// stack. A state met again while still on the stack means the guide loops,
/// and sibling labels must ascend, so corrupt input ends in an error.
fn count_keys(
    dict: &DoubleArray,
    guide: &Guide,
    counts: &mut [u32],
    root: UnitIndex,
) -> Result<()> {
    let mut done = BitSet::with_len(counts.len());
    let mut on_stack = BitSet::with_len(counts.len());
    // (state, label of the next child to visit)
    let mut stack = vec![(root, guide.child(root))];
    on_stack.set(root.as_usize(), true);
    counts[root.as_usize()] = dict.has_value(root) as u32;

    while let Some(&(index, label)) = stack.last() {
        if label == 0 {
            stack.pop();
            on_stack.set(index.as_usize(), false);
            done.set(index.as_usize(), true);
            continue;
        }
        let child = dict
            .follow(label, index)
            .ok_or(DawgError::InvalidFormat("guide does not match dictionary"))?;
        let slot = child.as_usize();
        if on_stack.get(slot) {
            return Err(DawgError::InvalidFormat("guide cycle"));
        }
        if !done.get(slot) {
            on_stack.set(slot, true);
            counts[slot] = dict.has_value(child) as u32;
            stack.push((child, guide.child(child)));
            continue;
        }
        counts[index.as_usize()] = counts[index.as_usize()]
            .checked_add(counts[slot])
            .ok_or(DawgError::InvalidFormat("key count overflow"))?;
        let sibling = guide.sibling(child);
        if sibling != 0 && sibling <= label {
            return Err(DawgError::InvalidFormat("guide siblings out of order"));
        }
        if let Some(top) = stack.last_mut() {
            top.1 = sibling;
        }
    }
    Ok(())
}

/// Maps keys to their 0-based position in sorted order and back.
pub struct Indexer<'a> {
    dict: &'a DoubleArray,
    guide: &'a Guide,
    index: &'a OrdinalIndex,
}

impl<'a> Indexer<'a> {
    pub fn new(dict: &'a DoubleArray, guide: &'a Guide, index: &'a OrdinalIndex) -> Self {
        Indexer { dict, guide, index }
    }

    pub fn total_count(&self) -> u32 {
        self.index.total_count()
    }

    /// Position of `key`, or `None` if it is not stored.
    pub fn ordinal_of(&self, key: &[u8]) -> Option<u32> {
        let mut index = self.dict.root();
        let mut ordinal = 0;
        for &byte in key {
            if self.dict.has_value(index) {
                ordinal += 1;
            }
            // Skips the subtrees of all smaller siblings.
            let mut label = self.guide.child(index);
            while label != 0 && label < byte {
                let child = self.dict.follow(label, index)?;
                ordinal += self.index.child_count(child);
                label = self.guide.sibling(child);
            }
            if label != byte {
                return None;
            }
            index = self.dict.follow(byte, index)?;
        }
        self.dict.has_value(index).then_some(ordinal)
    }

    /// Key at position `ordinal`, or `None` past the end.
    pub fn key_at(&self, ordinal: u32) -> Option<Vec<u8>> {
        if ordinal >= self.total_count() {
            return None;
        }
        let mut index = self.dict.root();
        let mut cur = 0;
        let mut key = Vec::new();
        loop {
            if self.dict.has_value(index) {
                if cur == ordinal {
                    return Some(key);
                }
                cur += 1;
            }
            let mut label = self.guide.child(index);
            loop {
                if label == 0 {
                    return None;
                }
                let child = self.dict.follow(label, index)?;
                let count = self.index.child_count(child);
                if ordinal < cur + count {
                    key.push(label);
                    index = child;
                    break;
                }
                cur += count;
                label = self.guide.sibling(child);
            }
        }
    }
}
