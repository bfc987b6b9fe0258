use dawgdic::{Automaton, DawgError, DoubleArray, DoubleArrayBuilder};
use std::io::Cursor;

mod common;
use common::{assert_mirrors, automaton_of, FRUITS};

#[test]
fn fruit_lookups() {
    let dict = DoubleArray::build(&automaton_of(&FRUITS)).unwrap();
    for &(key, value) in &FRUITS {
        assert!(dict.contains(key.as_bytes()), "missing {}", key);
        assert_eq!(dict.get(key.as_bytes()), Some(value));
    }
    for key in ["green", "change", "appl", "apples", "", "o", "officer"] {
        assert!(!dict.contains(key.as_bytes()), "unexpected {}", key);
        assert_eq!(dict.get(key.as_bytes()), None);
    }
}

#[test]
fn packing_mirrors_the_automaton() {
    let automaton = automaton_of(&FRUITS);
    let dict = DoubleArray::build(&automaton).unwrap();
    assert_mirrors(&automaton, &dict, automaton.root(), dict.root());
}

#[test]
fn zero_labels_never_match() {
    let dict = DoubleArray::build(&automaton_of(&FRUITS)).unwrap();
    for len in 1..=6 {
        let zeros = vec![0u8; len];
        assert!(!dict.contains(&zeros));
    }
    assert!(!dict.contains(b"apple\0"));
    assert_eq!(dict.follow(0, dict.root()), None);
}

#[test]
fn empty_key_value_lives_at_the_root() {
    let dict = DoubleArray::build(&automaton_of(&[("", 7), ("a", 1)])).unwrap();
    assert!(dict.has_value(dict.root()));
    assert_eq!(dict.get(b""), Some(7));
    assert_eq!(dict.get(b"a"), Some(1));
}

#[test]
fn empty_dictionary_has_one_block_and_no_keys() {
    let dict = DoubleArray::build(&Automaton::new()).unwrap();
    assert_eq!(dict.len(), 256);
    assert!(!dict.contains(b""));
    assert!(!dict.contains(b"a"));
    assert!(dict.common_prefixes(b"abc").is_empty());
}

#[test]
fn unused_units_are_reported() {
    let automaton = automaton_of(&FRUITS);
    let mut builder = DoubleArrayBuilder::new(&automaton);
    let dict = builder.build().unwrap();
    assert!(builder.num_unused_units() < dict.len());
    assert_eq!(dict.len() % 256, 0);
}

#[test]
fn common_prefixes_shortest_first() {
    let pairs = [("a", 1), ("ab", 2), ("abc", 3), ("abd", 4), ("b", 5)];
    let dict = DoubleArray::build(&automaton_of(&pairs)).unwrap();
    assert_eq!(dict.common_prefixes(b"abcde"), vec![(1, 1), (2, 2), (3, 3)]);
    assert_eq!(dict.common_prefixes(b"abd"), vec![(1, 1), (2, 2), (3, 4)]);
    assert!(dict.common_prefixes(b"x").is_empty());
}

#[test]
fn follow_bytes_reaches_inner_states() {
    let dict = DoubleArray::build(&automaton_of(&FRUITS)).unwrap();
    let index = dict.follow_bytes(b"appl", dict.root()).unwrap();
    assert!(!dict.has_value(index));
    let apple = dict.follow_bytes(b"e", index).unwrap();
    assert_eq!(dict.value(apple), 1);
    assert_eq!(dict.follow_bytes(b"appx", dict.root()), None);
}

#[test]
fn write_read_is_idempotent() {
    let dict = DoubleArray::build(&automaton_of(&FRUITS)).unwrap();
    let mut bytes = Vec::new();
    dict.write_to(&mut bytes).unwrap();
    assert_eq!(bytes.len(), dict.file_size());
    assert_eq!(dict.file_size(), 4 + dict.total_size());
    assert_eq!(&bytes[..4], &(dict.len() as u32).to_le_bytes());

    let read = DoubleArray::read_from(&mut Cursor::new(&bytes)).unwrap();
    assert!(read.units().eq(dict.units()));
    let mut again = Vec::new();
    read.write_to(&mut again).unwrap();
    assert_eq!(bytes, again);

    let (parsed, rest) = DoubleArray::from_bytes(&bytes).unwrap();
    assert!(rest.is_empty());
    for &(key, value) in &FRUITS {
        assert_eq!(parsed.get(key.as_bytes()), Some(value));
    }
}

#[test]
fn truncated_streams_are_rejected() {
    let dict = DoubleArray::build(&automaton_of(&FRUITS)).unwrap();
    let mut bytes = Vec::new();
    dict.write_to(&mut bytes).unwrap();

    for cut in [0, 3, 4, 5, bytes.len() - 1] {
        let short = &bytes[..cut];
        assert!(matches!(
            DoubleArray::read_from(&mut Cursor::new(short)),
            Err(DawgError::InvalidFormat(_))
        ));
        assert!(matches!(
            DoubleArray::from_bytes(short),
            Err(DawgError::InvalidFormat(_))
        ));
    }
}
