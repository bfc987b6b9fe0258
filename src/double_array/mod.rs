//! Double-array packing of an automaton and the lookup structure it yields.

mod builder;
mod unit;

use std::io::{Read, Write};

pub use builder::DoubleArrayBuilder;
pub(crate) use unit::Unit;

use crate::automaton::Automaton;
use crate::block::{self, BlockUnit};
use crate::error::Result;
use crate::ids::UnitIndex;

impl BlockUnit for Unit {
    const SIZE: usize = 4;

    fn decode(bytes: &[u8]) -> Self {
        Unit(u32::decode(bytes))
    }

    fn encode<W: Write>(self, writer: &mut W) -> std::io::Result<()> {
        self.0.encode(writer)
    }
}

/// Immutable double array.
///
/// The child of unit `i` on label `l` lives at `i ^ offset(i) ^ l` and is
/// accepted only if the unit found there carries `l`. A state with a stored
/// value has its value in the leaf unit at `i ^ offset(i)`.
#[derive(Clone, Debug, Default)]
pub struct DoubleArray {
    units: Vec<Unit>,
}

impl DoubleArray {
    /// Packs an automaton.
    pub fn build(automaton: &Automaton) -> Result<Self> {
        DoubleArrayBuilder::new(automaton).build()
    }

    pub(crate) fn from_units(units: Vec<Unit>) -> Self {
        DoubleArray { units }
    }

    pub fn root(&self) -> UnitIndex {
        UnitIndex(0)
    }

    /// Number of units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Bytes taken by the units.
    pub fn total_size(&self) -> usize {
        self.units.len() * Unit::SIZE
    }

    /// Bytes taken by the persisted block.
    pub fn file_size(&self) -> usize {
        block::block_size::<Unit>(self.units.len())
    }

    /// Raw unit words.
    pub fn units(&self) -> impl ExactSizeIterator<Item = u32> + '_ {
        self.units.iter().map(|u| u.0)
    }

    /// True if the key ending at `index` has a value.
    #[inline]
    pub fn has_value(&self, index: UnitIndex) -> bool {
        self.unit(index).is_some_and(|u| u.has_leaf())
    }

    /// Value of the key ending at `index`; only meaningful if
    /// [`has_value`](Self::has_value) holds.
    #[inline]
    pub fn value(&self, index: UnitIndex) -> u32 {
        self.unit(index)
            .and_then(|unit| self.units.get((index.get() ^ unit.offset()) as usize))
            .map_or(0, |leaf| leaf.value())
    }

    /// Follows one transition.
    #[inline]
    pub fn follow(&self, label: u8, index: UnitIndex) -> Option<UnitIndex> {
        let next = index.get() ^ self.unit(index)?.offset() ^ label as u32;
        match self.units.get(next as usize) {
            Some(unit) if unit.label() == label as u32 => Some(UnitIndex(next)),
            _ => None,
        }
    }

    /// Target of a transition without checking that it exists; used by the
    /// traversals, whose guides only name existing transitions.
    #[inline]
    pub(crate) fn child_index(&self, label: u8, index: UnitIndex) -> UnitIndex {
        let offset = self.unit(index).map_or(0, |u| u.offset());
        UnitIndex(index.get() ^ offset ^ label as u32)
    }

    /// Value stored in a leaf unit, read directly.
    #[inline]
    pub(crate) fn leaf_value(&self, index: UnitIndex) -> u32 {
        self.unit(index).map_or(0, |u| u.value())
    }

    /// Follows every byte of `key` from `index`.
    pub fn follow_bytes(&self, key: &[u8], index: UnitIndex) -> Option<UnitIndex> {
        key.iter()
            .try_fold(index, |index, &label| self.follow(label, index))
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.follow_bytes(key, self.root())
            .is_some_and(|index| self.has_value(index))
    }

    /// Exact-match lookup.
    pub fn get(&self, key: &[u8]) -> Option<u32> {
        let index = self.follow_bytes(key, self.root())?;
        self.has_value(index).then(|| self.value(index))
    }

    /// Every stored key that is a prefix of `key`, as `(length, value)` pairs
    /// from shortest to longest.
    pub fn common_prefixes(&self, key: &[u8]) -> Vec<(usize, u32)> {
        let mut found = Vec::new();
        let mut index = self.root();
        if self.is_empty() {
            return found;
        }
        for (len, &label) in key.iter().enumerate() {
            if self.has_value(index) {
                found.push((len, self.value(index)));
            }
            match self.follow(label, index) {
                Some(next) => index = next,
                None => return found,
            }
        }
        if self.has_value(index) {
            found.push((key.len(), self.value(index)));
        }
        found
    }

    /// Reads one block from a stream.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(DoubleArray {
            units: block::read_block(reader)?,
        })
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        block::write_block(writer, &self.units)
    }

    /// Parses one block from the front of `bytes`; returns the remainder.
    pub fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8])> {
        let (units, rest) = block::parse_block(bytes)?;
        Ok((DoubleArray { units }, rest))
    }

    #[inline]
    fn unit(&self, index: UnitIndex) -> Option<Unit> {
        self.units.get(index.as_usize()).copied()
    }
}
