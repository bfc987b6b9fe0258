use serde::Serialize;
use tracing::debug;

use crate::automaton::Automaton;
use crate::automaton_builder::AutomatonBuilder;
use crate::double_array::{DoubleArray, DoubleArrayBuilder};
use crate::error::Result;
use crate::guide::{GuideBuilder, RankedGuideBuilder};
use crate::lexicon::{GuideKind, Lexicon, LexiconGuide};

/// Structural numbers reported after a build.
#[derive(Clone, Debug, Default, Serialize)]
pub struct BuildStats {
    pub keys: usize,
    pub states: usize,
    pub transitions: usize,
    pub merged_states: usize,
    pub merging_states: usize,
    pub merged_transitions: usize,
    pub units: usize,
    pub unused_units: usize,
    pub unused_ratio: f64,
    pub guide: GuideKind,
    pub dictionary_size: usize,
    pub guide_size: usize,
    pub file_size: usize,
}

/// Builder for a [`Lexicon`]: insert keys in ascending byte order, then
/// call `finish` to pack the dictionary and build the requested guide.
pub struct LexiconBuilder {
    automaton: AutomatonBuilder,
    /// Optional hook called after each insert with the number of keys so far.
    on_progress: Option<Box<dyn Fn(u64)>>,
}

impl Default for LexiconBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LexiconBuilder {
    pub fn new() -> Self {
        LexiconBuilder {
            automaton: AutomatonBuilder::new(),
            on_progress: None,
        }
    }

    /// Starts the automaton's hash table at `size` slots; useful when the
    /// number of keys is known to be large.
    pub fn with_hash_table_size(mut self, size: usize) -> Self {
        self.automaton = AutomatonBuilder::with_hash_table_size(size);
        self
    }

    /// Attach a progress callback: called with the cumulative key count on
    /// every successful `insert`.
    pub fn with_progress<F>(mut self, cb: F) -> Self
    where
        F: Fn(u64) + 'static,
    {
        self.on_progress = Some(Box::new(cb));
        self
    }

    /// Inserts a key with its value. See [`AutomatonBuilder::insert`] for the
    /// ordering rules.
    pub fn insert(&mut self, key: &[u8], value: u32) -> Result<()> {
        self.automaton.insert(key, value)?;
        if let Some(cb) = &self.on_progress {
            cb(self.automaton.num_keys() as u64);
        }
        Ok(())
    }

    pub fn num_keys(&self) -> usize {
        self.automaton.num_keys()
    }

    /// Packs everything inserted so far.
    pub fn finish(mut self, kind: GuideKind) -> Result<(Lexicon, BuildStats)> {
        let keys = self.automaton.num_keys();
        let automaton = self.automaton.finish();

        let mut packer = DoubleArrayBuilder::new(&automaton);
        let dict = packer.build()?;
        let unused_units = packer.num_unused_units();

        let guide = build_guide(&automaton, &dict, kind)?;
        let lexicon = Lexicon::new(dict, guide)?;

        let stats = BuildStats::collect(keys, &automaton, &lexicon, unused_units);
        debug!(
            keys = stats.keys,
            units = stats.units,
            file_size = stats.file_size,
            "lexicon built"
        );
        Ok((lexicon, stats))
    }
}

fn build_guide(automaton: &Automaton, dict: &DoubleArray, kind: GuideKind) -> Result<LexiconGuide> {
    Ok(match kind {
        GuideKind::None => LexiconGuide::None,
        GuideKind::Plain => LexiconGuide::Plain(GuideBuilder::new(automaton, dict).build()?),
        GuideKind::Ranked => {
            LexiconGuide::Ranked(RankedGuideBuilder::new(automaton, dict).build()?)
        }
    })
}

impl BuildStats {
    fn collect(keys: usize, automaton: &Automaton, lexicon: &Lexicon, unused_units: usize) -> Self {
        let dict = lexicon.dictionary();
        let dictionary_size = dict.file_size();
        let file_size = lexicon.file_size();
        BuildStats {
            keys,
            states: automaton.num_states(),
            transitions: automaton.num_transitions(),
            merged_states: automaton.num_merged_states(),
            merging_states: automaton.num_merging_states(),
            merged_transitions: automaton.num_merged_transitions(),
            units: dict.len(),
            unused_units,
            unused_ratio: if dict.is_empty() {
                0.0
            } else {
                unused_units as f64 / dict.len() as f64
            },
            guide: lexicon.guide_kind(),
            dictionary_size,
            guide_size: file_size - dictionary_size,
            file_size,
        }
    }
}
