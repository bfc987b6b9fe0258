use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;

use crate::double_array::DoubleArray;
use crate::guide::{rank, Descending, GuideTable, RankedGuide, ValueOrder};
use crate::ids::UnitIndex;

/// A visited transition in the lazily grown traversal graph.
#[derive(Clone, Copy, Debug)]
struct Node {
    unit: UnitIndex,
    prev: usize,
    label: u8,
    is_queued: bool,
    has_terminal: bool,
}

/// The best key below a queued node. The greatest candidate ranks first;
/// equal ranks fall back to the older node.
struct Candidate<O> {
    node: usize,
    value: u32,
    order: Arc<O>,
}

impl<O: ValueOrder> Ord for Candidate<O> {
    fn cmp(&self, other: &Self) -> Ordering {
        rank(&*self.order, self.value, other.value)
            .reverse()
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl<O: ValueOrder> PartialOrd for Candidate<O> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<O: ValueOrder> PartialEq for Candidate<O> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<O: ValueOrder> Eq for Candidate<O> {}

/// Enumerates the keys below a state best value first.
///
/// Only the paths that can still hold the next best key are expanded, so
/// taking the first few completions of a large subtree stays cheap. Keys of
/// equal rank come out in discovery order.
pub struct RankedCompleter<'a, O = Descending> {
    dict: &'a DoubleArray,
    guide: &'a RankedGuide,
    order: Arc<O>,
    key: Vec<u8>,
    prefix_len: usize,
    value: u32,
    started: bool,
    nodes: Vec<Node>,
    queue: Vec<usize>,
    heap: BinaryHeap<Candidate<O>>,
}

impl<'a> RankedCompleter<'a, Descending> {
    pub fn new(dict: &'a DoubleArray, guide: &'a RankedGuide) -> Self {
        Self::with_order(dict, guide, Descending)
    }
}

impl<'a, O: ValueOrder> RankedCompleter<'a, O> {
    /// A completer ranking with `order`, which should match the order the
    /// guide was built with.
    pub fn with_order(dict: &'a DoubleArray, guide: &'a RankedGuide, order: O) -> Self {
        RankedCompleter {
            dict,
            guide,
            order: Arc::new(order),
            key: Vec::new(),
            prefix_len: 0,
            value: 0,
            started: false,
            nodes: Vec::new(),
            queue: Vec::new(),
            heap: BinaryHeap::new(),
        }
    }

    /// Restarts enumeration below `index`; `prefix` is prepended to keys.
    pub fn start(&mut self, index: UnitIndex, prefix: &[u8]) {
        self.key.clear();
        self.key.extend_from_slice(prefix);
        self.prefix_len = prefix.len();
        self.value = 0;
        self.started = false;
        self.nodes.clear();
        self.queue.clear();
        self.heap.clear();

        if self.guide.is_empty() || index.as_usize() >= self.dict.len() {
            return;
        }
        if self.guide.child(index) != 0 || self.dict.has_value(index) {
            self.create_node(index, 0, b'X');
            self.enqueue_node(0);
        }
    }

    pub fn next(&mut self) -> bool {
        for i in 0..self.queue.len() {
            let mut node = self.queue[i];
            if self.started {
                match self.find_sibling(node) {
                    Some(sibling) => node = sibling,
                    None => continue,
                }
            }
            let terminal = self.find_terminal(node);
            let value = self.dict.leaf_value(self.nodes[terminal].unit);
            self.push_candidate(terminal, value);
        }
        self.queue.clear();

        let Some(candidate) = self.heap.pop() else {
            return false;
        };
        self.enqueue_node(candidate.node);
        self.key.truncate(self.prefix_len);
        let mut node = self.nodes[candidate.node].prev;
        while node != 0 {
            self.key.push(self.nodes[node].label);
            self.enqueue_node(node);
            node = self.nodes[node].prev;
        }
        self.key[self.prefix_len..].reverse();
        self.value = candidate.value;
        self.started = true;
        true
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn suffix(&self) -> &[u8] {
        &self.key[self.prefix_len..]
    }

    pub fn length(&self) -> usize {
        self.key.len()
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    fn create_node(&mut self, unit: UnitIndex, prev: usize, label: u8) -> usize {
        self.nodes.push(Node {
            unit,
            prev,
            label,
            is_queued: false,
            has_terminal: label != 0 && self.dict.has_value(unit),
        });
        self.nodes.len() - 1
    }

    fn enqueue_node(&mut self, node: usize) {
        if !self.nodes[node].is_queued {
            self.nodes[node].is_queued = true;
            self.queue.push(node);
        }
    }

    /// Creates the node for the next sibling of `node`. A sibling label of 0
    /// is the parent's end-of-key transition, taken at most once.
    fn find_sibling(&mut self, node: usize) -> Option<usize> {
        let Node { unit, prev, .. } = self.nodes[node];
        let label = self.guide.sibling(unit);
        if label == 0 {
            if !self.nodes[prev].has_terminal {
                return None;
            }
            self.nodes[prev].has_terminal = false;
        }
        let unit = self.dict.child_index(label, self.nodes[prev].unit);
        Some(self.create_node(unit, prev, label))
    }

    /// Descends along first children to the end of the best key.
    fn find_terminal(&mut self, mut node: usize) -> usize {
        while self.nodes[node].label != 0 {
            let unit = self.nodes[node].unit;
            let label = self.guide.child(unit);
            if label == 0 {
                self.nodes[node].has_terminal = false;
            }
            let child = self.dict.child_index(label, unit);
            node = self.create_node(child, node, label);
        }
        node
    }

    fn push_candidate(&mut self, node: usize, value: u32) {
        self.heap.push(Candidate {
            node,
            value,
            order: Arc::clone(&self.order),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heap_pops_best_then_oldest() {
        let dict = DoubleArray::default();
        let guide = RankedGuide::default();
        let mut completer = RankedCompleter::new(&dict, &guide);
        for (node, value) in [(4, 7), (1, 9), (3, 7), (2, 1), (5, 9)] {
            completer.push_candidate(node, value);
        }
        let order: Vec<_> = std::iter::from_fn(|| completer.heap.pop())
            .map(|c| (c.node, c.value))
            .collect();
        assert_eq!(order, vec![(1, 9), (5, 9), (3, 7), (4, 7), (2, 1)]);
    }

    #[test]
    fn custom_order_ranks_small_values_first() {
        let dict = DoubleArray::default();
        let guide = RankedGuide::default();
        let mut completer =
            RankedCompleter::with_order(&dict, &guide, |a: u32, b: u32| a < b);
        for (node, value) in [(1, 5), (2, 3), (3, 8)] {
            completer.push_candidate(node, value);
        }
        assert_eq!(completer.heap.pop().map(|c| c.value), Some(3));
        assert_eq!(completer.heap.pop().map(|c| c.value), Some(5));
        assert_eq!(completer.heap.pop().map(|c| c.value), Some(8));
        assert!(completer.heap.pop().is_none());
    }

    #[test]
    fn empty_guide_yields_nothing() {
        let dict = DoubleArray::default();
        let guide = RankedGuide::default();
        let mut completer = RankedCompleter::new(&dict, &guide);
        completer.start(dict.root(), b"");
        assert!(!completer.next());
    }
}
