use std::mem;

use tracing::debug;

use crate::automaton::{Automaton, BaseUnit, MAX_VALUE};
use crate::bit_set::BitSet;
use crate::error::{DawgError, Result};

const DEFAULT_HASH_TABLE_SIZE: usize = 1 << 8;

/// Id of a build node in the builder's arena; 0 is the root and doubles as
/// "none" for sibling links.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct NodeId(u32);

impl NodeId {
    const NONE: NodeId = NodeId(0);

    #[inline]
    fn idx(self) -> usize {
        self.0 as usize
    }
}

/// A transition still open for insertion.
///
/// `child` is a node id while the node sits on the insertion path, a
/// transition index once its subtree is fixed, and the stored value for the
/// end-of-key node (label 0).
#[derive(Clone, Copy, Debug, Default)]
struct BuildNode {
    child: u32,
    sibling: NodeId,
    label: u8,
    is_state: bool,
    has_sibling: bool,
}

impl BuildNode {
    /// Packed transition word this node fixes into.
    fn base(&self) -> BaseUnit {
        let sibling = self.has_sibling as u32;
        if self.label == 0 {
            return BaseUnit(self.child << 1 | sibling);
        }
        BaseUnit(self.child << 2 | (self.is_state as u32) << 1 | sibling)
    }
}

/// Incremental builder of a minimal automaton from sorted keys.
///
/// Keys must arrive in strictly ascending byte order. Every time the next
/// key diverges from the previous one, the part of the trie that can no longer
/// change is fixed: its sibling runs are hash-consed against the runs already
/// committed and either merged into an equal run or appended as new
/// transitions.
pub struct AutomatonBuilder {
    initial_hash_table_size: usize,
    bases: Vec<BaseUnit>,
    labels: Vec<u8>,
    merging: BitSet,
    nodes: Vec<BuildNode>,
    hash_table: Vec<u32>,
    unfixed: Vec<NodeId>,
    unused: Vec<NodeId>,
    num_keys: usize,
    num_states: usize,
    num_merged_transitions: usize,
    num_merging_states: usize,
}

impl Default for AutomatonBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AutomatonBuilder {
    pub fn new() -> Self {
        Self::with_hash_table_size(DEFAULT_HASH_TABLE_SIZE)
    }

    /// Creates a builder whose transition hash table starts at `size` slots.
    /// The table doubles whenever it is three quarters full.
    pub fn with_hash_table_size(size: usize) -> Self {
        AutomatonBuilder {
            initial_hash_table_size: size.max(2),
            bases: Vec::new(),
            labels: Vec::new(),
            merging: BitSet::new(),
            nodes: Vec::new(),
            hash_table: Vec::new(),
            unfixed: Vec::new(),
            unused: Vec::new(),
            num_keys: 0,
            num_states: 1,
            num_merged_transitions: 0,
            num_merging_states: 0,
        }
    }

    /// Number of keys accepted since the last `finish`.
    pub fn num_keys(&self) -> usize {
        self.num_keys
    }

    /// Inserts a key with its value.
    ///
    /// # Errors
    ///
    /// Rejects keys that are not strictly greater than the previous key, keys
    /// containing the byte 0 and values above [`MAX_VALUE`]. A rejected key
    /// leaves the builder exactly as it was.
    pub fn insert(&mut self, key: &[u8], value: u32) -> Result<()> {
        if value > MAX_VALUE {
            return Err(DawgError::ValueOutOfRange(value));
        }
        if key.contains(&0) {
            return Err(DawgError::NulByte(key.to_vec()));
        }
        if self.hash_table.is_empty() {
            self.init();
        }

        let mut index = NodeId::NONE;
        let mut pos = 0;

        // Walks the shared prefix with the previous key.
        while pos <= key.len() {
            let child = self.nodes[index.idx()].child;
            if child == 0 {
                break;
            }
            let child = NodeId(child);
            let key_label = key.get(pos).copied().unwrap_or(0);
            let node_label = self.nodes[child.idx()].label;

            if key_label < node_label {
                return Err(DawgError::Order {
                    previous: self.previous_key(),
                    key: key.to_vec(),
                });
            } else if key_label > node_label {
                self.nodes[child.idx()].has_sibling = true;
                self.fix_nodes(child);
                break;
            }
            if pos == key.len() {
                return Err(DawgError::Duplicate(key.to_vec()));
            }
            index = child;
            pos += 1;
        }

        // Appends the remaining labels plus the end-of-key node.
        while pos <= key.len() {
            let key_label = key.get(pos).copied().unwrap_or(0);
            let child = self.allocate_node();
            let first = self.nodes[index.idx()].child;
            let node = &mut self.nodes[child.idx()];
            node.is_state = first == 0;
            node.sibling = NodeId(first);
            node.label = key_label;
            self.nodes[index.idx()].child = child.0;
            self.unfixed.push(child);

            index = child;
            pos += 1;
        }
        self.nodes[index.idx()].child = value;
        self.num_keys += 1;
        Ok(())
    }

    /// Fixes every pending node and hands the transitions over to a new
    /// [`Automaton`]. The builder is empty afterwards and can be reused.
    pub fn finish(&mut self) -> Automaton {
        if self.hash_table.is_empty() {
            self.init();
        }
        self.fix_nodes(NodeId::NONE);
        self.bases[0] = self.nodes[0].base();
        self.labels[0] = self.nodes[0].label;

        let num_transitions = self.bases.len() - 1;
        let num_merged_states =
            (num_transitions + self.num_merged_transitions + 1).saturating_sub(self.num_states);
        let automaton = Automaton {
            bases: mem::take(&mut self.bases),
            labels: mem::take(&mut self.labels),
            merging: mem::take(&mut self.merging),
            num_states: self.num_states,
            num_merged_transitions: self.num_merged_transitions,
            num_merged_states,
            num_merging_states: self.num_merging_states,
        };
        debug!(
            keys = self.num_keys,
            states = automaton.num_states,
            transitions = num_transitions,
            merged_states = automaton.num_merged_states,
            merging_states = automaton.num_merging_states,
            merged_transitions = automaton.num_merged_transitions,
            "automaton finished"
        );
        self.clear();
        automaton
    }

    fn init(&mut self) {
        self.hash_table = vec![0; self.initial_hash_table_size];
        let root = self.allocate_node();
        self.allocate_transition();
        self.nodes[root.idx()].label = 0xff;
        self.unfixed.push(root);
    }

    fn clear(&mut self) {
        self.bases.clear();
        self.labels.clear();
        self.merging.clear();
        self.nodes.clear();
        self.hash_table = Vec::new();
        self.unfixed.clear();
        self.unused.clear();
        self.num_keys = 0;
        self.num_states = 1;
        self.num_merged_transitions = 0;
        self.num_merging_states = 0;
    }

    /// The last accepted key, read back from the insertion path.
    fn previous_key(&self) -> Vec<u8> {
        self.unfixed
            .iter()
            .skip(1)
            .map(|id| self.nodes[id.idx()].label)
            .take_while(|&label| label != 0)
            .collect()
    }

    fn allocate_node(&mut self) -> NodeId {
        match self.unused.pop() {
            Some(id) => {
                self.nodes[id.idx()] = BuildNode::default();
                id
            }
            None => {
                self.nodes.push(BuildNode::default());
                NodeId((self.nodes.len() - 1) as u32)
            }
        }
    }

    fn allocate_transition(&mut self) -> u32 {
        self.bases.push(BaseUnit(0));
        self.labels.push(0);
        self.merging.push();
        (self.bases.len() - 1) as u32
    }

    /// Hash of a committed run starting at `index`.
    fn hash_transition(&self, mut index: u32) -> u32 {
        let mut hash = 0;
        while index != 0 {
            let base = self.bases[index as usize];
            let label = self.labels[index as usize] as u32;
            hash ^= int_hash((label << 24) ^ base.0);
            if !base.has_sibling() {
                break;
            }
            index += 1;
        }
        hash
    }

    /// Hash of a pending sibling chain; equal to `hash_transition` of the run
    /// it would become.
    fn hash_node(&self, mut id: NodeId) -> u32 {
        let mut hash = 0;
        while id != NodeId::NONE {
            let node = &self.nodes[id.idx()];
            hash ^= int_hash((node.label as u32) << 24 ^ node.base().0);
            id = node.sibling;
        }
        hash
    }

    /// Compares a pending chain (descending labels) with a committed run
    /// (ascending labels).
    fn are_equal(&self, id: NodeId, mut transition: u32) -> bool {
        let mut sibling = self.nodes[id.idx()].sibling;
        while sibling != NodeId::NONE {
            if !self.bases[transition as usize].has_sibling() {
                return false;
            }
            transition += 1;
            sibling = self.nodes[sibling.idx()].sibling;
        }
        if self.bases[transition as usize].has_sibling() {
            return false;
        }

        let mut cur = id;
        while cur != NodeId::NONE {
            let node = &self.nodes[cur.idx()];
            if node.base() != self.bases[transition as usize]
                || node.label != self.labels[transition as usize]
            {
                return false;
            }
            transition = transition.wrapping_sub(1);
            cur = node.sibling;
        }
        true
    }

    /// Free slot for a committed run; committed runs are unique so no
    /// equality check is needed.
    fn find_transition_slot(&self, index: u32) -> usize {
        let len = self.hash_table.len();
        let mut slot = self.hash_transition(index) as usize % len;
        while self.hash_table[slot] != 0 {
            slot = (slot + 1) % len;
        }
        slot
    }

    /// Looks up a committed run equal to the chain at `id`. Returns the run's
    /// first transition (0 if none) and the slot probing stopped at.
    fn find_node(&self, id: NodeId) -> (u32, usize) {
        let len = self.hash_table.len();
        let mut slot = self.hash_node(id) as usize % len;
        loop {
            let transition = self.hash_table[slot];
            if transition == 0 {
                return (0, slot);
            }
            if self.are_equal(id, transition) {
                return (transition, slot);
            }
            slot = (slot + 1) % len;
        }
    }

    fn expand_hash_table(&mut self) {
        let size = self.hash_table.len() << 1;
        self.hash_table = vec![0; size];
        for index in 1..self.bases.len() as u32 {
            if self.labels[index as usize] == 0 || self.bases[index as usize].is_state() {
                let slot = self.find_transition_slot(index);
                self.hash_table[slot] = index;
            }
        }
    }

    /// Fixes the nodes above `id` on the insertion path, then drops `id`
    /// itself from the path.
    fn fix_nodes(&mut self, id: NodeId) {
        while let Some(&top) = self.unfixed.last() {
            if top == id {
                break;
            }
            self.unfixed.pop();

            let table_len = self.hash_table.len();
            if self.num_states >= table_len - (table_len >> 2) {
                self.expand_hash_table();
            }

            let mut num_siblings = 0;
            let mut cur = top;
            while cur != NodeId::NONE {
                num_siblings += 1;
                cur = self.nodes[cur.idx()].sibling;
            }

            let (mut matched, slot) = self.find_node(top);
            if matched != 0 {
                self.num_merged_transitions += num_siblings;
                if !self.merging.get(matched as usize) {
                    self.num_merging_states += 1;
                    self.merging.set(matched as usize, true);
                }
            } else {
                let mut transition = 0;
                for _ in 0..num_siblings {
                    transition = self.allocate_transition();
                }
                let mut cur = top;
                while cur != NodeId::NONE {
                    let node = self.nodes[cur.idx()];
                    self.bases[transition as usize] = node.base();
                    self.labels[transition as usize] = node.label;
                    transition -= 1;
                    cur = node.sibling;
                }
                matched = transition + 1;
                self.hash_table[slot] = matched;
                self.num_states += 1;
            }

            let mut cur = top;
            while cur != NodeId::NONE {
                let next = self.nodes[cur.idx()].sibling;
                self.unused.push(cur);
                cur = next;
            }

            if let Some(&parent) = self.unfixed.last() {
                self.nodes[parent.idx()].child = matched;
            }
        }
        self.unfixed.pop();
    }
}

/// Thomas Wang's 32-bit integer mix.
#[inline]
pub(crate) fn int_hash(mut key: u32) -> u32 {
    key = (!key).wrapping_add(key << 15);
    key ^= key >> 12;
    key = key.wrapping_add(key << 2);
    key ^= key >> 4;
    key = key.wrapping_mul(2057);
    key ^= key >> 16;
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn previous_key_is_read_from_path() {
        let mut builder = AutomatonBuilder::new();
        builder.insert(b"apple", 1).unwrap();
        assert_eq!(builder.previous_key(), b"apple".to_vec());
        builder.insert(b"apply", 2).unwrap();
        assert_eq!(builder.previous_key(), b"apply".to_vec());
    }

    #[test]
    fn rejected_key_leaves_path_untouched() {
        let mut builder = AutomatonBuilder::new();
        builder.insert(b"banana", 1).unwrap();
        let depth = builder.unfixed.len();
        assert!(builder.insert(b"apple", 2).is_err());
        assert!(builder.insert(b"banana", 2).is_err());
        assert_eq!(builder.unfixed.len(), depth);
        assert_eq!(builder.previous_key(), b"banana".to_vec());
    }

    #[test]
    fn hash_table_grows_under_load() {
        let mut builder = AutomatonBuilder::with_hash_table_size(4);
        for i in 0..200u32 {
            let key = format!("k{:04}", i);
            builder.insert(key.as_bytes(), i).unwrap();
        }
        let automaton = builder.finish();
        assert!(automaton.num_states() > 4);
        assert!(builder.hash_table.is_empty());
    }

    #[test]
    fn int_hash_mixes() {
        assert_ne!(int_hash(1), int_hash(2));
        assert_eq!(int_hash(12345), int_hash(12345));
        assert_ne!(int_hash(0), 0);
    }
}
