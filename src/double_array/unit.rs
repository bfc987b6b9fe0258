pub(crate) const OFFSET_MAX: u32 = 1 << 21;
const IS_LEAF_BIT: u32 = 1 << 31;
const HAS_LEAF_BIT: u32 = 1 << 8;
const EXTENSION_BIT: u32 = 1 << 9;

/// One 32-bit double-array unit.
///
/// A leaf unit carries `IS_LEAF_BIT | value`. An internal unit carries the
/// label in the low byte, `HAS_LEAF_BIT` when the state has an end-of-key
/// child, and the offset to its children in the upper bits: `offset << 10`
/// for offsets below 2^21, `offset << 2 | EXTENSION_BIT` for multiples of
/// 256 below 2^29.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(transparent)]
pub(crate) struct Unit(pub(crate) u32);

impl Unit {
    #[inline]
    pub(crate) fn has_leaf(self) -> bool {
        self.0 & HAS_LEAF_BIT != 0
    }

    #[inline]
    pub(crate) fn value(self) -> u32 {
        self.0 & !IS_LEAF_BIT
    }

    /// Label with the leaf bit kept, so a leaf unit never matches a label.
    #[inline]
    pub(crate) fn label(self) -> u32 {
        self.0 & (IS_LEAF_BIT | 0xff)
    }

    #[inline]
    pub(crate) fn offset(self) -> u32 {
        (self.0 >> 10) << ((self.0 & EXTENSION_BIT) >> 6)
    }

    pub(crate) fn set_has_leaf(&mut self) {
        self.0 |= HAS_LEAF_BIT;
    }

    pub(crate) fn set_value(&mut self, value: u32) {
        self.0 = value | IS_LEAF_BIT;
    }

    pub(crate) fn set_label(&mut self, label: u8) {
        self.0 = (self.0 & !0xff) | label as u32;
    }

    /// Stores an offset; returns false if it cannot be encoded.
    pub(crate) fn set_offset(&mut self, offset: u32) -> bool {
        if offset >= OFFSET_MAX << 8 {
            return false;
        }
        self.0 &= IS_LEAF_BIT | HAS_LEAF_BIT | 0xff;
        if offset < OFFSET_MAX {
            self.0 |= offset << 10;
        } else {
            self.0 |= (offset << 2) | EXTENSION_BIT;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_offsets_use_the_short_form() {
        let mut unit = Unit::default();
        unit.set_label(b'a');
        unit.set_has_leaf();
        assert!(unit.set_offset(OFFSET_MAX - 1));
        assert_eq!(unit.offset(), OFFSET_MAX - 1);
        assert_eq!(unit.label(), b'a' as u32);
        assert!(unit.has_leaf());
    }

    #[test]
    fn large_offsets_use_the_extension_form() {
        let mut unit = Unit::default();
        unit.set_label(b'z');
        let offset = OFFSET_MAX << 4;
        assert!(unit.set_offset(offset));
        assert_eq!(unit.offset(), offset);
        assert_eq!(unit.label(), b'z' as u32);
        assert!(!unit.has_leaf());
    }

    #[test]
    fn oversized_offset_is_refused() {
        let mut unit = Unit(0x1234);
        assert!(!unit.set_offset(OFFSET_MAX << 8));
        assert_eq!(unit, Unit(0x1234));
    }

    #[test]
    fn leaf_units_never_match_a_label() {
        let mut unit = Unit::default();
        unit.set_value(0);
        assert_eq!(unit.value(), 0);
        assert_ne!(unit.label(), 0);
        unit.set_value(crate::MAX_VALUE);
        assert_eq!(unit.value(), crate::MAX_VALUE);
    }
}
