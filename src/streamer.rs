use crate::completer::Completer;
use crate::entry::Completion;
use crate::ranked_completer::RankedCompleter;

/// Trait for streaming items, similar to `Iterator`.
pub trait Streamer {
    /// The type of item yielded by the streamer.
    type Item;
    /// Return the next item in the stream, or None if finished.
    fn next(&mut self) -> Option<Self::Item>;
    /// Consume the streamer and collect all remaining items into a Vec.
    fn collect(mut self) -> Vec<Self::Item>
    where
        Self: Sized,
    {
        let mut v = Vec::new();
        while let Some(item) = self.next() {
            v.push(item);
        }
        v
    }
    /// Collect at most `n` items.
    fn take_n(&mut self, n: usize) -> Vec<Self::Item> {
        let mut v = Vec::new();
        while v.len() < n {
            match self.next() {
                Some(item) => v.push(item),
                None => break,
            }
        }
        v
    }
}

/// Completions below a prefix, in label order (plain guide) or best value
/// first (ranked guide). Keys include the prefix.
pub enum CompletionStream<'a> {
    /// The prefix is not in the dictionary.
    Empty,
    Plain(Completer<'a>),
    Ranked(RankedCompleter<'a>),
}

impl Streamer for CompletionStream<'_> {
    type Item = Completion;

    fn next(&mut self) -> Option<Completion> {
        match self {
            CompletionStream::Empty => None,
            CompletionStream::Plain(c) => c
                .next()
                .then(|| Completion::new(c.key().to_vec(), c.value())),
            CompletionStream::Ranked(c) => c
                .next()
                .then(|| Completion::new(c.key().to_vec(), c.value())),
        }
    }
}
