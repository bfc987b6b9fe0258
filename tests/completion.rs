use dawgdic::{
    Completer, DoubleArray, Guide, GuideBuilder, GuideKind, GuideTable, RankedCompleter,
    RankedGuide, RankedGuideBuilder, Streamer,
};

mod common;
use common::{automaton_of, keys_of, lexicon_of, FRUITS};

fn plain(pairs: &[(&str, u32)]) -> (DoubleArray, Guide) {
    let automaton = automaton_of(pairs);
    let dict = DoubleArray::build(&automaton).unwrap();
    let guide = GuideBuilder::new(&automaton, &dict).build().unwrap();
    (dict, guide)
}

fn ranked(pairs: &[(&str, u32)]) -> (DoubleArray, RankedGuide) {
    let automaton = automaton_of(pairs);
    let dict = DoubleArray::build(&automaton).unwrap();
    let guide = RankedGuideBuilder::new(&automaton, &dict).build().unwrap();
    (dict, guide)
}

#[test]
fn plain_completion_in_label_order() {
    let (dict, guide) = plain(&FRUITS);
    let index = dict.follow_bytes(b"appl", dict.root()).unwrap();
    let mut completer = Completer::new(&dict, &guide);
    completer.start(index, b"appl");

    let mut found = Vec::new();
    while completer.next() {
        assert_eq!(completer.length(), completer.key().len());
        found.push((
            String::from_utf8(completer.suffix().to_vec()).unwrap(),
            completer.value(),
        ));
    }
    let expected = [("e", 1), ("iance", 2), ("ied", 3), ("y", 4)];
    let expected: Vec<(String, u32)> = expected
        .iter()
        .map(|&(s, v)| (s.to_string(), v))
        .collect();
    assert_eq!(found, expected);
    // Exhausted completers stay exhausted.
    assert!(!completer.next());
}

#[test]
fn plain_completion_from_root_lists_everything_sorted() {
    let (dict, guide) = plain(&FRUITS);
    let mut completer = Completer::new(&dict, &guide);
    completer.start(dict.root(), b"");
    let mut keys = Vec::new();
    while completer.next() {
        keys.push(completer.key().to_vec());
    }
    let expected: Vec<Vec<u8>> = FRUITS.iter().map(|(k, _)| k.as_bytes().to_vec()).collect();
    assert_eq!(keys, expected);
}

#[test]
fn completion_includes_the_prefix_itself() {
    let (dict, guide) = plain(&[("car", 1), ("card", 2), ("care", 3)]);
    let index = dict.follow_bytes(b"car", dict.root()).unwrap();
    let mut completer = Completer::new(&dict, &guide);
    completer.start(index, b"car");
    assert!(completer.next());
    assert_eq!(completer.key(), b"car");
    assert!(completer.suffix().is_empty());
    assert!(completer.next());
    assert_eq!(completer.key(), b"card");
}

#[test]
fn guide_units_point_at_existing_children() {
    let (dict, guide) = plain(&FRUITS);
    let root = dict.root();
    assert_eq!(guide.len(), dict.len());
    assert_eq!(guide.child(root), b'a');
    let a = dict.follow(b'a', root).unwrap();
    assert_eq!(guide.sibling(a), b'b');
}

#[test]
fn ranked_completion_best_value_first() {
    let (dict, guide) = ranked(&FRUITS);
    let index = dict.follow_bytes(b"appl", dict.root()).unwrap();
    let mut completer = RankedCompleter::new(&dict, &guide);
    completer.start(index, b"appl");

    let mut found = Vec::new();
    while completer.next() {
        found.push((
            String::from_utf8(completer.key().to_vec()).unwrap(),
            completer.value(),
        ));
    }
    let expected = [("apply", 4), ("applied", 3), ("appliance", 2), ("apple", 1)];
    let expected: Vec<(String, u32)> = expected
        .iter()
        .map(|&(s, v)| (s.to_string(), v))
        .collect();
    assert_eq!(found, expected);
    assert!(!completer.next());
}

#[test]
fn ranked_completion_from_root() {
    let (dict, guide) = ranked(&FRUITS);
    let mut completer = RankedCompleter::new(&dict, &guide);
    completer.start(dict.root(), b"");
    let mut values = Vec::new();
    while completer.next() {
        assert_eq!(dict.get(completer.key()), Some(completer.value()));
        values.push(completer.value());
    }
    assert_eq!(values, (1..=11).rev().collect::<Vec<u32>>());
}

#[test]
fn ranked_completion_with_custom_order() {
    let automaton = automaton_of(&FRUITS);
    let dict = DoubleArray::build(&automaton).unwrap();
    let ascending = |a: u32, b: u32| a < b;
    let guide = RankedGuideBuilder::new(&automaton, &dict)
        .with_order(ascending)
        .build()
        .unwrap();
    let index = dict.follow_bytes(b"appl", dict.root()).unwrap();
    let mut completer = RankedCompleter::with_order(&dict, &guide, ascending);
    completer.start(index, b"appl");
    let mut values = Vec::new();
    while completer.next() {
        values.push(completer.value());
    }
    assert_eq!(values, vec![1, 2, 3, 4]);
}

#[test]
fn ranked_ties_yield_every_key_once() {
    let pairs = [("aa", 5), ("ab", 5), ("b", 9), ("ba", 5), ("c", 1)];
    let (dict, guide) = ranked(&pairs);
    let mut completer = RankedCompleter::new(&dict, &guide);
    completer.start(dict.root(), b"");
    let mut found = Vec::new();
    while completer.next() {
        found.push((completer.key().to_vec(), completer.value()));
    }
    assert_eq!(found.len(), pairs.len());
    assert_eq!(found[0], (b"b".to_vec(), 9));
    assert_eq!(found[4], (b"c".to_vec(), 1));
    let mut middle: Vec<Vec<u8>> = found[1..4].iter().map(|(k, _)| k.clone()).collect();
    middle.sort();
    assert_eq!(middle, vec![b"aa".to_vec(), b"ab".to_vec(), b"ba".to_vec()]);
}

#[test]
fn empty_dictionary_completes_nothing() {
    let (dict, guide) = plain(&[]);
    let mut completer = Completer::new(&dict, &guide);
    completer.start(dict.root(), b"");
    assert!(!completer.next());

    let (dict, guide) = ranked(&[]);
    let mut completer = RankedCompleter::new(&dict, &guide);
    completer.start(dict.root(), b"");
    assert!(!completer.next());
}

#[test]
fn lexicon_streams_completions() {
    let lexicon = lexicon_of(&FRUITS, GuideKind::Plain);
    let all = lexicon.complete(b"").collect();
    assert_eq!(all.len(), FRUITS.len());
    assert_eq!(keys_of(&lexicon.complete(b"ch").collect()), ["changed", "cherry"]);
    assert_eq!(lexicon.complete(b"m").take_n(1).len(), 1);
    assert!(lexicon.complete(b"x").collect().is_empty());

    let ranked = lexicon_of(&FRUITS, GuideKind::Ranked);
    let top = ranked.complete(b"").take_n(3);
    assert_eq!(keys_of(&top), ["office", "murdered", "mandarin"]);

    let bare = lexicon_of(&FRUITS, GuideKind::None);
    assert!(bare.complete(b"a").collect().is_empty());
}
