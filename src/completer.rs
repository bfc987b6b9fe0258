use crate::double_array::DoubleArray;
use crate::guide::{Guide, GuideTable};
use crate::ids::UnitIndex;

/// Enumerates the keys below a state in label order.
///
/// ```ignore
/// let mut completer = Completer::new(&dict, &guide);
/// completer.start(index, b"appl");
/// while completer.next() {
///     println!("{:?} {}", completer.key(), completer.value());
/// }
/// ```
pub struct Completer<'a> {
    dict: &'a DoubleArray,
    guide: &'a Guide,
    key: Vec<u8>,
    prefix_len: usize,
    stack: Vec<UnitIndex>,
    last: UnitIndex,
    started: bool,
}

impl<'a> Completer<'a> {
    pub fn new(dict: &'a DoubleArray, guide: &'a Guide) -> Self {
        Completer {
            dict,
            guide,
            key: Vec::new(),
            prefix_len: 0,
            stack: Vec::new(),
            last: UnitIndex(0),
            started: false,
        }
    }

    /// Restarts enumeration below `index`. `prefix` is only prepended to the
    /// reported keys; it is not followed.
    pub fn start(&mut self, index: UnitIndex, prefix: &[u8]) {
        self.key.clear();
        self.key.extend_from_slice(prefix);
        self.prefix_len = prefix.len();
        self.stack.clear();
        self.started = false;
        if !self.guide.is_empty() && index.as_usize() < self.dict.len() {
            self.stack.push(index);
        }
    }

    /// Moves to the next key; false once the subtree is exhausted.
    pub fn next(&mut self) -> bool {
        let Some(&top) = self.stack.last() else {
            return false;
        };
        let mut index = top;

        if self.started {
            let label = self.guide.child(index);
            if label != 0 {
                match self.follow(label, index) {
                    Some(next) => index = next,
                    None => return self.exhaust(),
                }
            } else {
                loop {
                    let sibling = self.guide.sibling(index);
                    if self.key.len() > self.prefix_len {
                        self.key.pop();
                    }
                    self.stack.pop();
                    let Some(&parent) = self.stack.last() else {
                        return false;
                    };
                    if sibling != 0 {
                        match self.follow(sibling, parent) {
                            Some(next) => index = next,
                            None => return self.exhaust(),
                        }
                        break;
                    }
                    index = parent;
                }
            }
        }
        self.find_terminal(index)
    }

    /// Prefix followed by the current suffix.
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// The current key without the prefix passed to `start`.
    pub fn suffix(&self) -> &[u8] {
        &self.key[self.prefix_len..]
    }

    pub fn length(&self) -> usize {
        self.key.len()
    }

    pub fn value(&self) -> u32 {
        self.dict.value(self.last)
    }

    fn follow(&mut self, label: u8, index: UnitIndex) -> Option<UnitIndex> {
        let next = self.dict.follow(label, index)?;
        self.key.push(label);
        self.stack.push(next);
        Some(next)
    }

    fn find_terminal(&mut self, mut index: UnitIndex) -> bool {
        while !self.dict.has_value(index) {
            let label = self.guide.child(index);
            if label == 0 {
                return self.exhaust();
            }
            match self.follow(label, index) {
                Some(next) => index = next,
                None => return self.exhaust(),
            }
        }
        self.last = index;
        self.started = true;
        true
    }

    fn exhaust(&mut self) -> bool {
        self.stack.clear();
        false
    }
}
