//! Queue strategies.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use std::rc::Rc;

type KeyFn<'a, T> = Rc<dyn Fn(&T) -> i64 + 'a>;

struct Keyed<T> {
    key: i64,
    seq: u64,
    item: T,
}

impl<T> PartialEq for Keyed<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.seq == other.seq
    }
}

impl<T> Eq for Keyed<T> {}

impl<T> PartialOrd for Keyed<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Keyed<T> {
    // BinaryHeap is a max-heap: reverse so the smallest key, then the
    // earliest insertion, pops first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .key
            .cmp(&self.key)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

enum Inner<'a, T> {
    Fifo(VecDeque<T>),
    Lifo(Vec<T>),
    Priority {
        heap: BinaryHeap<Keyed<T>>,
        key: KeyFn<'a, T>,
        next_seq: u64,
    },
}

/// Order in which queued items are processed.
///
/// - `fifo`: breadth-first
/// - `lifo`: depth-first
/// - `priority`: smallest key first, ties in insertion order
pub struct Queue<'a, T> {
    inner: Inner<'a, T>,
}

impl<'a, T> Queue<'a, T> {
    pub fn fifo() -> Self {
        Self {
            inner: Inner::Fifo(VecDeque::new()),
        }
    }

    pub fn lifo() -> Self {
        Self {
            inner: Inner::Lifo(Vec::new()),
        }
    }

    pub fn priority(key: impl Fn(&T) -> i64 + 'a) -> Self {
        Self {
            inner: Inner::Priority {
                heap: BinaryHeap::new(),
                key: Rc::new(key),
                next_seq: 0,
            },
        }
    }

    /// An empty queue with the same strategy (and key) as this one.
    pub fn empty_like(&self) -> Self {
        let inner = match &self.inner {
            Inner::Fifo(_) => Inner::Fifo(VecDeque::new()),
            Inner::Lifo(_) => Inner::Lifo(Vec::new()),
            Inner::Priority { key, .. } => Inner::Priority {
                heap: BinaryHeap::new(),
                key: Rc::clone(key),
                next_seq: 0,
            },
        };
        Self { inner }
    }

    pub fn push(&mut self, item: T) {
        match &mut self.inner {
            Inner::Fifo(q) => q.push_back(item),
            Inner::Lifo(q) => q.push(item),
            Inner::Priority {
                heap,
                key,
                next_seq,
            } => {
                heap.push(Keyed {
                    key: (**key)(&item),
                    seq: *next_seq,
                    item,
                });
                *next_seq += 1;
            }
        }
    }

    pub fn pop(&mut self) -> Option<T> {
        match &mut self.inner {
            Inner::Fifo(q) => q.pop_front(),
            Inner::Lifo(q) => q.pop(),
            Inner::Priority { heap, .. } => heap.pop().map(|k| k.item),
        }
    }

    pub fn peek(&self) -> Option<&T> {
        match &self.inner {
            Inner::Fifo(q) => q.front(),
            Inner::Lifo(q) => q.last(),
            Inner::Priority { heap, .. } => heap.peek().map(|k| &k.item),
        }
    }

    pub fn len(&self) -> usize {
        match &self.inner {
            Inner::Fifo(q) => q.len(),
            Inner::Lifo(q) => q.len(),
            Inner::Priority { heap, .. } => heap.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        match &mut self.inner {
            Inner::Fifo(q) => q.clear(),
            Inner::Lifo(q) => q.clear(),
            Inner::Priority { heap, next_seq, .. } => {
                heap.clear();
                *next_seq = 0;
            }
        }
    }
}

impl<T> Extend<T> for Queue<'_, T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item);
        }
    }
}

impl<T> std::fmt::Debug for Queue<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.inner {
            Inner::Fifo(_) => "fifo",
            Inner::Lifo(_) => "lifo",
            Inner::Priority { .. } => "priority",
        };
        f.debug_struct("Queue")
            .field("kind", &kind)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(mut q: Queue<'_, i32>) -> Vec<i32> {
        std::iter::from_fn(|| q.pop()).collect()
    }

    #[test]
    fn fifo_and_lifo_orders() {
        let mut fifo = Queue::fifo();
        fifo.extend([1, 2, 3]);
        assert_eq!(fifo.peek(), Some(&1));
        assert_eq!(drain(fifo), vec![1, 2, 3]);

        let mut lifo = Queue::lifo();
        lifo.extend([1, 2, 3]);
        assert_eq!(lifo.peek(), Some(&3));
        assert_eq!(drain(lifo), vec![3, 2, 1]);
    }

    #[test]
    fn priority_pops_smallest_key_with_stable_ties() {
        let mut q = Queue::priority(|n: &i32| i64::from(*n / 10));
        q.extend([21, 5, 13, 2, 17]);
        assert_eq!(q.len(), 5);
        assert_eq!(drain(q), vec![5, 2, 13, 17, 21]);
    }

    #[test]
    fn empty_like_keeps_strategy() {
        let mut q = Queue::priority(|n: &i32| -i64::from(*n));
        q.push(1);
        let mut copy = q.empty_like();
        assert!(copy.is_empty());
        copy.extend([1, 3, 2]);
        assert_eq!(drain(copy), vec![3, 2, 1]);

        q.clear();
        assert!(q.is_empty());
    }
}
