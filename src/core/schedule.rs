use crate::error::{Error, Result};
use std::cmp::Ordering;

/// Ordering key attached to every scheduled item: the priority (event time) plus
/// the insertion sequence number used to break ties deterministically.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeapKey {
    pub priority: f64,
    pub seq: u64,
}

/// Comparison function over heap keys, fixed at schedule construction.
pub type KeyOrder = fn(&HeapKey, &HeapKey) -> Ordering;

/// Default order: earlier priority first, then first-inserted first.
pub fn by_priority_then_seq(a: &HeapKey, b: &HeapKey) -> Ordering {
    a.priority
        .total_cmp(&b.priority)
        .then_with(|| a.seq.cmp(&b.seq))
}

/// Array-backed binary min-heap keyed by `f64` priority.
///
/// The payload type needs no ordering of its own. There is no decrease-key and
/// no arbitrary removal: consumers drop stale entries when they pop them.
#[derive(Debug, Clone)]
pub struct EventSchedule<T> {
    heap: Vec<(HeapKey, T)>,
    next_seq: u64,
    order: KeyOrder,
}

impl<T> Default for EventSchedule<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EventSchedule<T> {
    pub fn new() -> Self {
        Self::with_comparator(by_priority_then_seq)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: Vec::with_capacity(capacity),
            next_seq: 0,
            order: by_priority_then_seq,
        }
    }

    /// Create an empty schedule ordered by `order`.
    pub fn with_comparator(order: KeyOrder) -> Self {
        Self {
            heap: Vec::new(),
            next_seq: 0,
            order,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drop all entries. The sequence counter keeps running.
    pub fn clear(&mut self) {
        self.heap.clear();
    }

    /// Insert `item` with `priority`. O(log n) amortized.
    pub fn enqueue(&mut self, priority: f64, item: T) {
        let key = HeapKey {
            priority,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.heap.push((key, item));
        self.sift_up(self.heap.len() - 1);
    }

    /// Remove and return the item with the smallest key.
    ///
    /// Errors: `Error::EmptySchedule` if nothing is held.
    pub fn dequeue(&mut self) -> Result<T> {
        self.dequeue_entry().map(|(_, item)| item)
    }

    /// Like [`dequeue`](Self::dequeue) but also returns the item's priority.
    pub fn dequeue_entry(&mut self) -> Result<(f64, T)> {
        if self.heap.is_empty() {
            return Err(Error::EmptySchedule);
        }
        let (key, item) = self.heap.swap_remove(0);
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        Ok((key.priority, item))
    }

    /// The item with the smallest key, without removing it.
    pub fn peek(&self) -> Option<(f64, &T)> {
        self.heap.first().map(|(k, item)| (k.priority, item))
    }

    #[inline]
    fn less(&self, i: usize, j: usize) -> bool {
        (self.order)(&self.heap[i].0, &self.heap[j].0) == Ordering::Less
    }

    fn sift_up(&mut self, mut idx: usize) {
        while idx > 0 {
            let parent = (idx - 1) / 2;
            if !self.less(idx, parent) {
                break;
            }
            self.heap.swap(idx, parent);
            idx = parent;
        }
    }

    fn sift_down(&mut self, mut idx: usize) {
        let n = self.heap.len();
        loop {
            let left = 2 * idx + 1;
            let right = left + 1;
            let mut smallest = idx;
            if left < n && self.less(left, smallest) {
                smallest = left;
            }
            if right < n && self.less(right, smallest) {
                smallest = right;
            }
            if smallest == idx {
                break;
            }
            self.heap.swap(idx, smallest);
            idx = smallest;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_schedule_reports_underflow() {
        let mut s: EventSchedule<&str> = EventSchedule::new();
        assert!(s.is_empty());
        assert!(s.peek().is_none());
        assert!(matches!(s.dequeue(), Err(Error::EmptySchedule)));
    }

    #[test]
    fn dequeues_in_priority_order() -> Result<()> {
        let mut s = EventSchedule::with_capacity(8);
        for (p, name) in [(3.0, "c"), (1.0, "a"), (4.0, "d"), (0.5, "z"), (2.0, "b")] {
            s.enqueue(p, name);
        }
        assert_eq!(s.len(), 5);
        assert_eq!(s.peek(), Some((0.5, &"z")));
        let mut out = Vec::new();
        while !s.is_empty() {
            out.push(s.dequeue()?);
        }
        assert_eq!(out, vec!["z", "a", "b", "c", "d"]);
        Ok(())
    }

    #[test]
    fn equal_priorities_come_out_in_insertion_order() -> Result<()> {
        let mut s = EventSchedule::new();
        for i in 0..10 {
            s.enqueue(1.0, i);
        }
        s.enqueue(0.0, 99);
        assert_eq!(s.dequeue()?, 99);
        for i in 0..10 {
            assert_eq!(s.dequeue()?, i);
        }
        Ok(())
    }

    #[test]
    fn custom_comparator_is_used() -> Result<()> {
        fn latest_first(a: &HeapKey, b: &HeapKey) -> Ordering {
            b.priority.total_cmp(&a.priority).then_with(|| a.seq.cmp(&b.seq))
        }
        let mut s = EventSchedule::with_comparator(latest_first);
        s.enqueue(1.0, 'a');
        s.enqueue(3.0, 'c');
        s.enqueue(2.0, 'b');
        assert_eq!(s.dequeue_entry()?, (3.0, 'c'));
        assert_eq!(s.dequeue()?, 'b');
        assert_eq!(s.dequeue()?, 'a');
        Ok(())
    }

    #[test]
    fn clear_empties_but_keeps_working() -> Result<()> {
        let mut s = EventSchedule::new();
        s.enqueue(1.0, 1);
        s.enqueue(2.0, 2);
        s.clear();
        assert!(s.is_empty());
        s.enqueue(5.0, 5);
        assert_eq!(s.dequeue()?, 5);
        Ok(())
    }
}
