use std::cmp::Ordering;

use super::{GuideUnit, RankedGuide};
use crate::automaton::Automaton;
use crate::bit_set::BitSet;
use crate::double_array::DoubleArray;
use crate::error::{DawgError, Result};
use crate::ids::{TransitionIndex, UnitIndex};

/// Total order over stored values used to rank completions.
pub trait ValueOrder {
    /// True if `a` must be emitted before `b`.
    fn ranks_before(&self, a: u32, b: u32) -> bool;
}

/// Larger values first.
#[derive(Clone, Copy, Debug, Default)]
pub struct Descending;

impl ValueOrder for Descending {
    #[inline]
    fn ranks_before(&self, a: u32, b: u32) -> bool {
        a > b
    }
}

impl<F: Fn(u32, u32) -> bool> ValueOrder for F {
    #[inline]
    fn ranks_before(&self, a: u32, b: u32) -> bool {
        self(a, b)
    }
}

/// Orders two values; equal ranks compare equal.
pub(crate) fn rank<O: ValueOrder + ?Sized>(order: &O, a: u32, b: u32) -> Ordering {
    if order.ranks_before(a, b) {
        Ordering::Less
    } else if order.ranks_before(b, a) {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

#[derive(Clone, Copy, Debug)]
struct Link {
    label: u8,
    value: u32,
}

/// Builds a [`RankedGuide`]: each state's children, end-of-key included, are
/// chained best value first, ties by ascending label.
pub struct RankedGuideBuilder<'a, O = Descending> {
    automaton: &'a Automaton,
    dict: &'a DoubleArray,
    order: O,
    units: Vec<GuideUnit>,
    links: Vec<Link>,
    visited: BitSet,
}

impl<'a> RankedGuideBuilder<'a, Descending> {
    pub fn new(automaton: &'a Automaton, dict: &'a DoubleArray) -> Self {
        RankedGuideBuilder {
            automaton,
            dict,
            order: Descending,
            units: vec![GuideUnit::default(); dict.len()],
            links: Vec::new(),
            visited: BitSet::with_len(dict.len()),
        }
    }
}

impl<'a, O: ValueOrder> RankedGuideBuilder<'a, O> {
    /// Replaces the value order.
    pub fn with_order<P: ValueOrder>(self, order: P) -> RankedGuideBuilder<'a, P> {
        RankedGuideBuilder {
            automaton: self.automaton,
            dict: self.dict,
            order,
            units: self.units,
            links: self.links,
            visited: self.visited,
        }
    }

    pub fn build(mut self) -> Result<RankedGuide> {
        if self.automaton.len() > 1 {
            self.build_indices(self.automaton.root(), self.dict.root())?;
        }
        Ok(RankedGuide::from_units(self.units))
    }

    /// Returns the best value reachable from `index`.
    fn build_indices(&mut self, transition: TransitionIndex, index: UnitIndex) -> Result<u32> {
        if self.visited.get(index.as_usize()) {
            return self.find_max_value(index);
        }
        self.visited.set(index.as_usize(), true);

        let begin = self.links.len();
        self.enumerate_links(transition, index)?;

        let order = &self.order;
        self.links[begin..].sort_by(|a, b| {
            rank(order, a.value, b.value).then_with(|| a.label.cmp(&b.label))
        });
        self.turn_links_into_units(index, begin);

        let max_value = self.links[begin].value;
        self.links.truncate(begin);
        Ok(max_value)
    }

    /// Reads the best value of an already ranked state by following its
    /// first children down to the end of a key.
    fn find_max_value(&self, mut index: UnitIndex) -> Result<u32> {
        loop {
            let label = self.units[index.as_usize()].child;
            if label == 0 {
                break;
            }
            index = self.dict.follow(label, index).ok_or(MISMATCH)?;
        }
        if !self.dict.has_value(index) {
            return Err(MISMATCH);
        }
        Ok(self.dict.value(index))
    }

    fn enumerate_links(&mut self, transition: TransitionIndex, index: UnitIndex) -> Result<()> {
        let automaton = self.automaton;
        for child in automaton.children(transition) {
            let label = automaton.label(child);
            let value = if label == 0 {
                if !self.dict.has_value(index) {
                    return Err(MISMATCH);
                }
                self.dict.value(index)
            } else {
                let child_index = self.dict.follow(label, index).ok_or(MISMATCH)?;
                self.build_indices(child, child_index)?
            };
            self.links.push(Link { label, value });
        }
        Ok(())
    }

    fn turn_links_into_units(&mut self, index: UnitIndex, begin: usize) {
        let first = self.links[begin].label;
        self.units[index.as_usize()].child = first;
        let mut child_index = self.dict.child_index(first, index);
        for link in &self.links[begin + 1..] {
            self.units[child_index.as_usize()].sibling = link.label;
            child_index = self.dict.child_index(link.label, index);
        }
    }
}

const MISMATCH: DawgError = DawgError::InvalidFormat("dictionary does not match automaton");
