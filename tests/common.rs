#![allow(dead_code)]

use dawgdic::{
    Automaton, AutomatonBuilder, DoubleArray, GuideKind, Lexicon, LexiconBuilder, TransitionIndex,
    UnitIndex,
};

/// Sorted keys with ascending values, shared by most tests.
pub const FRUITS: [(&str, u32); 11] = [
    ("apple", 1),
    ("appliance", 2),
    ("applied", 3),
    ("apply", 4),
    ("banana", 5),
    ("changed", 6),
    ("cherry", 7),
    ("durian", 8),
    ("mandarin", 9),
    ("murdered", 10),
    ("office", 11),
];

/// Build an automaton from `(key, value)` pairs that are already sorted.
pub fn automaton_of(pairs: &[(&str, u32)]) -> Automaton {
    let mut builder = AutomatonBuilder::new();
    for &(key, value) in pairs {
        builder.insert(key.as_bytes(), value).unwrap();
    }
    builder.finish()
}

/// Build a lexicon with the given guide from sorted `(key, value)` pairs.
pub fn lexicon_of(pairs: &[(&str, u32)], kind: GuideKind) -> Lexicon {
    let mut builder = LexiconBuilder::new();
    for &(key, value) in pairs {
        builder.insert(key.as_bytes(), value).unwrap();
    }
    builder.finish(kind).unwrap().0
}

/// Completion keys as strings, in emitted order.
pub fn keys_of(completions: &[dawgdic::Completion]) -> Vec<String> {
    completions
        .iter()
        .map(|c| String::from_utf8(c.key.clone()).unwrap())
        .collect()
}

/// Walks the automaton and the double array side by side: every transition
/// must be followable with the same label, every other label must fail, and
/// end-of-key transitions must surface as values.
pub fn assert_mirrors(automaton: &Automaton, dict: &DoubleArray, t: TransitionIndex, index: UnitIndex) {
    let mut labels = Vec::new();
    let mut has_leaf = false;
    for child in automaton.children(t) {
        let label = automaton.label(child);
        if automaton.is_leaf(child) {
            has_leaf = true;
            assert!(dict.has_value(index));
            assert_eq!(dict.value(index), automaton.value(child));
            continue;
        }
        labels.push(label);
        let next = dict
            .follow(label, index)
            .unwrap_or_else(|| panic!("label {} missing at unit {}", label, index));
        assert_mirrors(automaton, dict, child, next);
    }
    assert_eq!(dict.has_value(index), has_leaf);
    for label in 1..=255u8 {
        if !labels.contains(&label) {
            assert_eq!(dict.follow(label, index), None, "stray label {}", label);
        }
    }
}
