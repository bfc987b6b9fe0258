use dawgdic::{AutomatonBuilder, DoubleArray, GuideKind, LexiconBuilder, Streamer};
use std::collections::BTreeMap;

mod common;
use common::assert_mirrors;

const SUFFIXES: [&str; 8] = ["", "s", "ed", "er", "ing", "ness", "ation", "ly"];

/// Deterministic word list: random stems with shared endings, so packing
/// spans many closed blocks and reuses merged subtrees.
fn word_list(count: usize) -> BTreeMap<Vec<u8>, u32> {
    let mut state: u64 = 0x9e37_79b9_7f4a_7c15;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };
    let mut words = BTreeMap::new();
    while words.len() < count {
        let len = 2 + (next() % 7) as usize;
        let mut word: Vec<u8> = (0..len).map(|_| b'a' + (next() % 26) as u8).collect();
        word.extend_from_slice(SUFFIXES[(next() % SUFFIXES.len() as u64) as usize].as_bytes());
        let value = (next() % 1000) as u32;
        words.insert(word, value);
    }
    words
}

#[test]
fn large_key_set_packs_past_the_open_block_window() {
    let words = word_list(40_000);
    let mut builder = AutomatonBuilder::new();
    for (key, &value) in &words {
        builder.insert(key, value).unwrap();
    }
    let automaton = builder.finish();
    assert!(automaton.num_merging_states() > 0);

    let dict = DoubleArray::build(&automaton).unwrap();
    assert!(dict.len() > 16 * 256, "only {} units", dict.len());
    assert_mirrors(&automaton, &dict, automaton.root(), dict.root());
    for (key, &value) in &words {
        assert_eq!(dict.get(key), Some(value));
    }
}

#[test]
fn large_key_set_completes_in_both_orders() {
    let words = word_list(40_000);
    let build = |kind| {
        let mut builder = LexiconBuilder::new();
        for (key, &value) in &words {
            builder.insert(key, value).unwrap();
        }
        builder.finish(kind).unwrap()
    };

    let (plain, stats) = build(GuideKind::Plain);
    assert_eq!(stats.keys, words.len());
    assert!(stats.units > 16 * 256);
    assert!(stats.unused_units < stats.units);
    let listed: Vec<_> = plain
        .complete(b"")
        .collect()
        .into_iter()
        .map(|c| (c.key, c.value))
        .collect();
    let expected: Vec<_> = words.iter().map(|(k, &v)| (k.clone(), v)).collect();
    assert_eq!(listed, expected);
    for (i, key) in words.keys().enumerate().step_by(997) {
        assert_eq!(plain.ordinal_of(key), Some(i as u32));
        assert_eq!(plain.key_at(i as u32).as_deref(), Some(key.as_slice()));
    }

    let (ranked, _) = build(GuideKind::Ranked);
    let best = ranked.complete(b"").collect();
    assert_eq!(best.len(), words.len());
    assert!(best.windows(2).all(|w| w[0].value >= w[1].value));
    let mut keys: Vec<_> = best.into_iter().map(|c| c.key).collect();
    keys.sort();
    assert!(keys.iter().eq(words.keys()));

    let under_ab = words.keys().filter(|k| k.starts_with(b"ab")).count();
    assert_eq!(ranked.complete(b"ab").collect().len(), under_ab);
    assert_eq!(plain.complete(b"ab").collect().len(), under_ab);
}
