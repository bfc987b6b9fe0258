//! Index newtypes for the two public index spaces.
//!
//! Automaton transitions and double-array units are both addressed by dense
//! `u32` positions; keeping them apart in the type system stops a transition
//! index from being fed to a double-array lookup by accident. Build-time node
//! ids stay private to the automaton builder.

use std::fmt;

macro_rules! index_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub u32);

        impl $name {
            /// The raw position.
            #[inline]
            pub fn get(self) -> u32 {
                self.0
            }

            #[inline]
            pub(crate) fn as_usize(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<$name> for u32 {
            fn from(i: $name) -> u32 {
                i.0
            }
        }
    };
}

index_type!(
    /// Position of a transition in an [`Automaton`](crate::Automaton).
    TransitionIndex
);

index_type!(
    /// Position of a unit in a [`DoubleArray`](crate::DoubleArray), shared by
    /// the guides and the ordinal index built over it.
    UnitIndex
);
