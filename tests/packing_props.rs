use dawgdic::{DoubleArray, GuideKind, LexiconBuilder, Streamer};
use proptest::prelude::*;
use std::collections::BTreeSet;

mod common;
use common::assert_mirrors;

fn key_sets() -> impl Strategy<Value = BTreeSet<Vec<u8>>> {
    prop::collection::btree_set(prop::collection::vec(1u8..=255, 0..10), 0..300)
}

/// Small alphabets force long shared prefixes and many merged suffixes.
fn dense_key_sets() -> impl Strategy<Value = BTreeSet<Vec<u8>>> {
    prop::collection::btree_set(prop::collection::vec(b'a'..=b'd', 1..12), 0..400)
}

fn build(keys: &BTreeSet<Vec<u8>>, kind: GuideKind) -> dawgdic::Lexicon {
    let mut builder = LexiconBuilder::new();
    for (i, key) in keys.iter().enumerate() {
        builder.insert(key, (i % 7) as u32).unwrap();
    }
    builder.finish(kind).unwrap().0
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn every_key_is_found_with_its_value(keys in key_sets(), probes in prop::collection::vec(prop::collection::vec(1u8..=255, 0..10), 0..50)) {
        let lexicon = build(&keys, GuideKind::None);
        for (i, key) in keys.iter().enumerate() {
            prop_assert_eq!(lexicon.get(key), Some((i % 7) as u32));
        }
        for probe in &probes {
            prop_assert_eq!(lexicon.contains(probe), keys.contains(probe));
        }
    }

    #[test]
    fn packed_array_mirrors_the_automaton(keys in dense_key_sets()) {
        let mut builder = dawgdic::AutomatonBuilder::new();
        for (i, key) in keys.iter().enumerate() {
            builder.insert(key, (i % 3) as u32).unwrap();
        }
        let automaton = builder.finish();
        let dict = DoubleArray::build(&automaton).unwrap();
        assert_mirrors(&automaton, &dict, automaton.root(), dict.root());
    }

    #[test]
    fn completion_enumerates_the_sorted_set(keys in dense_key_sets()) {
        let lexicon = build(&keys, GuideKind::Plain);
        let listed: Vec<Vec<u8>> = lexicon.complete(b"").collect().into_iter().map(|c| c.key).collect();
        let expected: Vec<Vec<u8>> = keys.iter().cloned().collect();
        prop_assert_eq!(&listed, &expected);

        for (i, key) in keys.iter().enumerate() {
            prop_assert_eq!(lexicon.ordinal_of(key), Some(i as u32));
        }
    }

    #[test]
    fn ranked_completion_never_increases(keys in dense_key_sets()) {
        let lexicon = build(&keys, GuideKind::Ranked);
        let values: Vec<u32> = lexicon.complete(b"").collect().into_iter().map(|c| c.value).collect();
        prop_assert_eq!(values.len(), keys.len());
        prop_assert!(values.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn serialization_is_idempotent(keys in key_sets()) {
        let lexicon = build(&keys, GuideKind::Ranked);
        let mut bytes = Vec::new();
        lexicon.write_to(&mut bytes).unwrap();
        let read = dawgdic::Lexicon::from_bytes(&bytes, GuideKind::Ranked).unwrap();
        let mut again = Vec::new();
        read.write_to(&mut again).unwrap();
        prop_assert_eq!(bytes, again);
    }
}
