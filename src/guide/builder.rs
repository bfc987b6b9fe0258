use super::{Guide, GuideUnit};
use crate::automaton::Automaton;
use crate::bit_set::BitSet;
use crate::double_array::DoubleArray;
use crate::error::{DawgError, Result};
use crate::ids::{TransitionIndex, UnitIndex};

/// Builds a [`Guide`] by walking the automaton alongside the double array
/// it was packed into.
pub struct GuideBuilder<'a> {
    automaton: &'a Automaton,
    dict: &'a DoubleArray,
    units: Vec<GuideUnit>,
    visited: BitSet,
}

impl<'a> GuideBuilder<'a> {
    pub fn new(automaton: &'a Automaton, dict: &'a DoubleArray) -> Self {
        GuideBuilder {
            automaton,
            dict,
            units: vec![GuideUnit::default(); dict.len()],
            visited: BitSet::with_len(dict.len()),
        }
    }

    pub fn build(mut self) -> Result<Guide> {
        if self.automaton.len() > 1 {
            self.build_indices(self.automaton.root(), self.dict.root())?;
        }
        Ok(Guide::from_units(self.units))
    }

    fn build_indices(&mut self, transition: TransitionIndex, index: UnitIndex) -> Result<()> {
        if self.visited.get(index.as_usize()) {
            return Ok(());
        }
        self.visited.set(index.as_usize(), true);

        let automaton = self.automaton;
        // The end-of-key child is never listed in a plain guide.
        let mut children = automaton
            .children(transition)
            .filter(|&child| !automaton.is_leaf(child))
            .peekable();
        let Some(&first) = children.peek() else {
            return Ok(());
        };
        self.units[index.as_usize()].child = automaton.label(first);

        while let Some(child) = children.next() {
            let label = automaton.label(child);
            let child_index = self
                .dict
                .follow(label, index)
                .ok_or(DawgError::InvalidFormat("dictionary does not match automaton"))?;
            self.build_indices(child, child_index)?;
            if let Some(&sibling) = children.peek() {
                self.units[child_index.as_usize()].sibling = automaton.label(sibling);
            }
        }
        Ok(())
    }
}
