//! Child/sibling side tables that make a double array enumerable.
//!
//! A guide stores, per double-array unit, the label of the state's first
//! child and the label of the unit's next sibling. The plain guide keeps
//! children in label order; the ranked guide orders them by the best value
//! reachable below each child.

mod builder;
mod ranked;

use std::io::{Read, Write};

pub use builder::GuideBuilder;
pub(crate) use ranked::rank;
pub use ranked::{Descending, RankedGuideBuilder, ValueOrder};

use crate::block::{self, BlockUnit};
use crate::error::Result;
use crate::ids::UnitIndex;

/// `(child label, sibling label)` for one unit; 0 means none.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GuideUnit {
    pub child: u8,
    pub sibling: u8,
}

impl BlockUnit for GuideUnit {
    const SIZE: usize = 2;

    fn decode(bytes: &[u8]) -> Self {
        GuideUnit {
            child: bytes[0],
            sibling: bytes[1],
        }
    }

    fn encode<W: Write>(self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&[self.child, self.sibling])
    }
}

/// Read access shared by both guide flavours.
pub trait GuideTable {
    fn guide_units(&self) -> &[GuideUnit];

    /// Label of the first child of the state at `index`.
    #[inline]
    fn child(&self, index: UnitIndex) -> u8 {
        self.guide_units()
            .get(index.as_usize())
            .map_or(0, |unit| unit.child)
    }

    /// Label of the sibling following the transition that reached `index`.
    #[inline]
    fn sibling(&self, index: UnitIndex) -> u8 {
        self.guide_units()
            .get(index.as_usize())
            .map_or(0, |unit| unit.sibling)
    }
}

macro_rules! guide_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq, Eq)]
        pub struct $name {
            units: Vec<GuideUnit>,
        }

        impl $name {
            pub(crate) fn from_units(units: Vec<GuideUnit>) -> Self {
                $name { units }
            }

            pub fn root(&self) -> UnitIndex {
                UnitIndex(0)
            }

            pub fn len(&self) -> usize {
                self.units.len()
            }

            pub fn is_empty(&self) -> bool {
                self.units.is_empty()
            }

            pub fn total_size(&self) -> usize {
                self.units.len() * GuideUnit::SIZE
            }

            pub fn file_size(&self) -> usize {
                block::block_size::<GuideUnit>(self.units.len())
            }

            pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
                Ok($name {
                    units: block::read_block(reader)?,
                })
            }

            pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
                block::write_block(writer, &self.units)
            }

            /// Parses one block from the front of `bytes`; returns the remainder.
            pub fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8])> {
                let (units, rest) = block::parse_block(bytes)?;
                Ok(($name { units }, rest))
            }
        }

        impl GuideTable for $name {
            #[inline]
            fn guide_units(&self) -> &[GuideUnit] {
                &self.units
            }
        }
    };
}

guide_type!(
    /// Guide with children in ascending label order.
    Guide
);

guide_type!(
    /// Guide with children ordered by the best value in their subtree.
    RankedGuide
);
