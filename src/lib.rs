//! Directed acyclic word graphs packed into double arrays.
//!
//! Keys are inserted in ascending byte order into an [`AutomatonBuilder`],
//! which merges equal suffixes into a minimal [`Automaton`]. The automaton is
//! packed into a [`DoubleArray`] for exact lookups; a [`Guide`] or
//! [`RankedGuide`] built alongside it enables prefix completion in label or
//! value order. [`LexiconBuilder`] and [`Lexicon`] bundle the whole pipeline
//! with persistence.

mod automaton;
mod automaton_builder;
mod bit_set;
mod block;
mod builder;
mod completer;
mod double_array;
mod entry;
mod error;
mod guide;
mod ids;
mod lexicon;
mod link_table;
mod ordinal;
mod ranked_completer;
mod streamer;
pub mod utfc;

pub use automaton::{Automaton, Children, MAX_VALUE};
pub use automaton_builder::AutomatonBuilder;
pub use bit_set::BitSet;
pub use block::CHUNK_SIZE;
pub use builder::{BuildStats, LexiconBuilder};
pub use completer::Completer;
pub use double_array::{DoubleArray, DoubleArrayBuilder};
pub use entry::Completion;
pub use error::{DawgError, Result};
pub use guide::{
    Descending, Guide, GuideBuilder, GuideTable, GuideUnit, RankedGuide, RankedGuideBuilder,
    ValueOrder,
};
pub use ids::{TransitionIndex, UnitIndex};
pub use lexicon::{GuideKind, Lexicon, LexiconGuide};
pub use ordinal::{Indexer, OrdinalIndex};
pub use ranked_completer::RankedCompleter;
pub use streamer::{CompletionStream, Streamer};
