use crate::bit_set::BitSet;
use crate::ids::TransitionIndex;

/// Largest value a key can carry (values are 31-bit).
pub const MAX_VALUE: u32 = (1 << 31) - 1;

/// Packed transition word.
///
/// Non-leaf transitions hold `child << 2 | is_state << 1 | has_sibling`;
/// leaf transitions (label 0) hold `value << 1 | has_sibling`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct BaseUnit(pub(crate) u32);

impl BaseUnit {
    #[inline]
    pub(crate) fn child(self) -> u32 {
        self.0 >> 2
    }

    #[inline]
    pub(crate) fn has_sibling(self) -> bool {
        self.0 & 1 != 0
    }

    #[inline]
    pub(crate) fn is_state(self) -> bool {
        self.0 & 2 != 0
    }

    #[inline]
    pub(crate) fn value(self) -> u32 {
        self.0 >> 1
    }
}

/// Frozen minimal automaton produced by [`AutomatonBuilder::finish`].
///
/// Transitions of one state occupy a contiguous run ordered by label, so the
/// sibling of a transition is simply the next slot when `has_sibling` is set.
/// Index 0 is a pseudo transition whose child is the root state.
///
/// [`AutomatonBuilder::finish`]: crate::AutomatonBuilder::finish
#[derive(Clone, Debug)]
pub struct Automaton {
    pub(crate) bases: Vec<BaseUnit>,
    pub(crate) labels: Vec<u8>,
    pub(crate) merging: BitSet,
    pub(crate) num_states: usize,
    pub(crate) num_merged_transitions: usize,
    pub(crate) num_merged_states: usize,
    pub(crate) num_merging_states: usize,
}

impl Default for Automaton {
    fn default() -> Self {
        let mut merging = BitSet::new();
        merging.push();
        Automaton {
            bases: vec![BaseUnit(0)],
            labels: vec![0xff],
            merging,
            num_states: 1,
            num_merged_transitions: 0,
            num_merged_states: 0,
            num_merging_states: 0,
        }
    }
}

impl Automaton {
    /// An automaton holding no keys.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> TransitionIndex {
        TransitionIndex(0)
    }

    /// Number of transition slots including the root pseudo transition.
    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.len() <= 1
    }

    pub fn num_transitions(&self) -> usize {
        self.bases.len() - 1
    }

    pub fn num_states(&self) -> usize {
        self.num_states
    }

    pub fn num_merged_transitions(&self) -> usize {
        self.num_merged_transitions
    }

    pub fn num_merged_states(&self) -> usize {
        self.num_merged_states
    }

    pub fn num_merging_states(&self) -> usize {
        self.num_merging_states
    }

    /// First transition of the state this transition leads to.
    #[inline]
    pub fn child(&self, index: TransitionIndex) -> TransitionIndex {
        TransitionIndex(self.bases[index.as_usize()].child())
    }

    /// Next transition leaving the same state, if any.
    #[inline]
    pub fn sibling(&self, index: TransitionIndex) -> Option<TransitionIndex> {
        if self.bases[index.as_usize()].has_sibling() {
            Some(TransitionIndex(index.0 + 1))
        } else {
            None
        }
    }

    /// Value stored on a leaf transition.
    #[inline]
    pub fn value(&self, index: TransitionIndex) -> u32 {
        self.bases[index.as_usize()].value()
    }

    #[inline]
    pub fn label(&self, index: TransitionIndex) -> u8 {
        self.labels[index.as_usize()]
    }

    /// A leaf transition is the end-of-key transition (label 0).
    #[inline]
    pub fn is_leaf(&self, index: TransitionIndex) -> bool {
        self.label(index) == 0
    }

    /// True if this transition heads a run that was reached from more than
    /// one place during construction.
    #[inline]
    pub fn is_merging(&self, index: TransitionIndex) -> bool {
        self.merging.get(index.as_usize())
    }

    /// Iterates the transitions leaving the state that `index` leads to.
    pub fn children(&self, index: TransitionIndex) -> Children<'_> {
        let first = if self.is_leaf(index) || self.bases.len() <= 1 {
            None
        } else {
            Some(self.child(index))
        };
        Children {
            automaton: self,
            next: first,
        }
    }
}

/// Iterator over one state's outgoing transitions, in label order.
pub struct Children<'a> {
    automaton: &'a Automaton,
    next: Option<TransitionIndex>,
}

impl Iterator for Children<'_> {
    type Item = TransitionIndex;

    fn next(&mut self) -> Option<TransitionIndex> {
        let cur = self.next?;
        self.next = self.automaton.sibling(cur);
        Some(cur)
    }
}
