use bitvec::prelude::{BitVec, Lsb0};

/// Growable bit vector used for per-index flags (merging transitions,
/// visited units).
#[derive(Clone, Debug, Default)]
pub struct BitSet {
    bits: BitVec<u64, Lsb0>,
}

impl BitSet {
    pub fn new() -> Self {
        BitSet { bits: BitVec::new() }
    }

    /// A set of `len` cleared bits.
    pub fn with_len(len: usize) -> Self {
        BitSet {
            bits: BitVec::repeat(false, len),
        }
    }

    /// Appends one cleared bit.
    pub fn push(&mut self) {
        self.bits.push(false);
    }

    #[inline]
    pub fn get(&self, index: usize) -> bool {
        self.bits.get(index).map_or(false, |b| *b)
    }

    /// Sets a bit; indices past the end grow the set.
    pub fn set(&mut self, index: usize, bit: bool) {
        if index >= self.bits.len() {
            self.bits.resize(index + 1, false);
        }
        self.bits.set(index, bit);
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn count_ones(&self) -> usize {
        self.bits.count_ones()
    }

    pub fn clear(&mut self) {
        self.bits.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_set_get() {
        let mut bits = BitSet::new();
        for _ in 0..130 {
            bits.push();
        }
        assert_eq!(bits.len(), 130);
        bits.set(0, true);
        bits.set(64, true);
        bits.set(129, true);
        assert!(bits.get(0) && bits.get(64) && bits.get(129));
        assert!(!bits.get(1) && !bits.get(128));
        assert_eq!(bits.count_ones(), 3);
        bits.set(64, false);
        assert!(!bits.get(64));
    }

    #[test]
    fn out_of_range_reads_are_clear() {
        let bits = BitSet::with_len(8);
        assert!(!bits.get(7));
        assert!(!bits.get(1000));
    }

    #[test]
    fn set_grows() {
        let mut bits = BitSet::new();
        bits.set(200, true);
        assert_eq!(bits.len(), 201);
        assert!(bits.get(200));
        bits.clear();
        assert!(bits.is_empty());
    }
}
