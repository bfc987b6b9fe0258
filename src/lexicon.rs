use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use memmap2::Mmap;
use serde::Serialize;

use crate::block::CHUNK_SIZE;
use crate::completer::Completer;
use crate::double_array::DoubleArray;
use crate::error::{DawgError, Result};
use crate::guide::{Guide, RankedGuide};
use crate::ordinal::{Indexer, OrdinalIndex};
use crate::ranked_completer::RankedCompleter;
use crate::streamer::CompletionStream;

/// Which guide block follows the dictionary block in a lexicon file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GuideKind {
    /// Dictionary only: lookups and prefix matches, no completion.
    #[default]
    None,
    /// Completion in label order.
    Plain,
    /// Completion best value first.
    Ranked,
}

/// The guide paired with a lexicon's dictionary.
#[derive(Clone, Debug)]
pub enum LexiconGuide {
    None,
    Plain(Guide),
    Ranked(RankedGuide),
}

impl LexiconGuide {
    pub fn kind(&self) -> GuideKind {
        match self {
            LexiconGuide::None => GuideKind::None,
            LexiconGuide::Plain(_) => GuideKind::Plain,
            LexiconGuide::Ranked(_) => GuideKind::Ranked,
        }
    }

    fn len(&self) -> Option<usize> {
        match self {
            LexiconGuide::None => None,
            LexiconGuide::Plain(g) => Some(g.len()),
            LexiconGuide::Ranked(g) => Some(g.len()),
        }
    }

    fn file_size(&self) -> usize {
        match self {
            LexiconGuide::None => 0,
            LexiconGuide::Plain(g) => g.file_size(),
            LexiconGuide::Ranked(g) => g.file_size(),
        }
    }
}

/// A dictionary with its optional guide: the unit that is saved, opened and
/// queried.
///
/// With a plain guide, an ordinal index is derived on construction so keys
/// can be addressed by their sorted position.
#[derive(Clone, Debug)]
pub struct Lexicon {
    dict: DoubleArray,
    guide: LexiconGuide,
    ordinal: Option<OrdinalIndex>,
}

impl Lexicon {
    /// Pairs a dictionary with a guide.
    ///
    /// # Errors
    ///
    /// `GuideMismatch` if the guide was not built for a dictionary of this
    /// size.
    pub fn new(dict: DoubleArray, guide: LexiconGuide) -> Result<Self> {
        if let Some(guide_units) = guide.len() {
            if guide_units != dict.len() {
                return Err(DawgError::GuideMismatch {
                    units: dict.len(),
                    guide_units,
                });
            }
        }
        let ordinal = match &guide {
            LexiconGuide::Plain(g) => Some(OrdinalIndex::build(&dict, g)?),
            _ => None,
        };
        Ok(Lexicon {
            dict,
            guide,
            ordinal,
        })
    }

    pub fn dictionary(&self) -> &DoubleArray {
        &self.dict
    }

    pub fn guide(&self) -> &LexiconGuide {
        &self.guide
    }

    pub fn guide_kind(&self) -> GuideKind {
        self.guide.kind()
    }

    pub fn get(&self, key: &[u8]) -> Option<u32> {
        self.dict.get(key)
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.dict.contains(key)
    }

    /// Stored keys that are prefixes of `key`, as `(length, value)`.
    pub fn common_prefixes(&self, key: &[u8]) -> Vec<(usize, u32)> {
        self.dict.common_prefixes(key)
    }

    /// Completions of `prefix`. Empty without a guide or if no key starts
    /// with `prefix`.
    pub fn complete(&self, prefix: &[u8]) -> CompletionStream<'_> {
        let Some(index) = self.dict.follow_bytes(prefix, self.dict.root()) else {
            return CompletionStream::Empty;
        };
        match &self.guide {
            LexiconGuide::None => CompletionStream::Empty,
            LexiconGuide::Plain(guide) => {
                let mut completer = Completer::new(&self.dict, guide);
                completer.start(index, prefix);
                CompletionStream::Plain(completer)
            }
            LexiconGuide::Ranked(guide) => {
                let mut completer = RankedCompleter::new(&self.dict, guide);
                completer.start(index, prefix);
                CompletionStream::Ranked(completer)
            }
        }
    }

    /// Number of keys, known when a plain guide is present.
    pub fn num_keys(&self) -> Option<u32> {
        self.ordinal.as_ref().map(|o| o.total_count())
    }

    /// Sorted position of `key` (plain guide only).
    pub fn ordinal_of(&self, key: &[u8]) -> Option<u32> {
        self.indexer()?.ordinal_of(key)
    }

    /// Key at sorted position `ordinal` (plain guide only).
    pub fn key_at(&self, ordinal: u32) -> Option<Vec<u8>> {
        self.indexer()?.key_at(ordinal)
    }

    fn indexer(&self) -> Option<Indexer<'_>> {
        match (&self.guide, &self.ordinal) {
            (LexiconGuide::Plain(guide), Some(ordinal)) => {
                Some(Indexer::new(&self.dict, guide, ordinal))
            }
            _ => None,
        }
    }

    /// Bytes written by [`write_to`](Self::write_to).
    pub fn file_size(&self) -> usize {
        self.dict.file_size() + self.guide.file_size()
    }

    /// Writes the dictionary block followed by the guide block, if any.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.dict.write_to(writer)?;
        match &self.guide {
            LexiconGuide::None => Ok(()),
            LexiconGuide::Plain(g) => g.write_to(writer),
            LexiconGuide::Ranked(g) => g.write_to(writer),
        }
    }

    /// Writes the lexicon to `path`, truncating an existing file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::with_capacity(CHUNK_SIZE, file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        Ok(())
    }

    /// Parses a lexicon whose guide block is of kind `kind`.
    pub fn from_bytes(bytes: &[u8], kind: GuideKind) -> Result<Self> {
        let (dict, rest) = DoubleArray::from_bytes(bytes)?;
        let (guide, rest) = match kind {
            GuideKind::None => (LexiconGuide::None, rest),
            GuideKind::Plain => {
                let (g, rest) = Guide::from_bytes(rest)?;
                (LexiconGuide::Plain(g), rest)
            }
            GuideKind::Ranked => {
                let (g, rest) = RankedGuide::from_bytes(rest)?;
                (LexiconGuide::Ranked(g), rest)
            }
        };
        if !rest.is_empty() {
            return Err(DawgError::InvalidFormat("unexpected data after last block"));
        }
        Lexicon::new(dict, guide)
    }

    /// Memory-maps and parses a lexicon file.
    pub fn open<P: AsRef<Path>>(path: P, kind: GuideKind) -> Result<Self> {
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Err(DawgError::InvalidFormat("empty lexicon file"));
        }
        let mmap = unsafe { Mmap::map(&file)? };
        Lexicon::from_bytes(&mmap, kind)
    }
}
