// THEORY:
// The `BoundedHistory` is the memory of every trail effect. It is a fixed-capacity,
// insertion-ordered window over the most recent per-frame artifacts (contour sets,
// edge masks, particle positions).
//
// Key architectural principles:
// 1.  **Strict FIFO Eviction**: Appending beyond capacity discards the oldest item.
//     Nothing else ever removes an item; the window only slides forward.
// 2.  **Age Ordering**: Iteration always runs oldest -> newest, index 0 first. The
//     index of an item is its "age slot" and drives both its blend opacity and its
//     palette color in the compositors.
// 3.  **Age Ratio**: `(index + 1) / len` is strictly increasing with recency and is
//     exactly 1.0 for the newest slot.
// 4.  **Single-Threaded**: The history is mutated once per frame tick by its owner.

use std::collections::VecDeque;

/// A fixed-capacity, oldest-first ring of artifacts.
#[derive(Debug, Clone)]
pub struct BoundedHistory<T> {
    capacity: usize,
    items: VecDeque<T>,
}

impl<T> BoundedHistory<T> {
    /// Creates an empty history. A capacity of zero is clamped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            items: VecDeque::new(),
        }
    }

    /// Appends to the back, evicting the front once `capacity` is exceeded.
    pub fn push(&mut self, item: T) {
        self.items.push_back(item);
        if self.items.len() > self.capacity {
            self.items.pop_front();
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn newest(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn oldest(&self) -> Option<&T> {
        self.items.front()
    }

    /// Iterates `(index, item)` pairs from oldest (0) to newest.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.items.iter().enumerate()
    }

    /// Iterates `(index, age_ratio, item)` triples from oldest to newest.
    pub fn iter_with_age(&self) -> impl Iterator<Item = (usize, f32, &T)> {
        let len = self.items.len();
        self.items
            .iter()
            .enumerate()
            .map(move |(i, item)| (i, age_ratio(i, len), item))
    }
}

/// Normalized recency of slot `index` in a history of `len` items.
pub fn age_ratio(index: usize, len: usize) -> f32 {
    if len == 0 {
        return 0.0;
    }
    (index + 1) as f32 / len as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retains_only_the_most_recent_items() {
        for capacity in 1..8 {
            let mut history = BoundedHistory::new(capacity);
            for i in 0..(capacity * 3 + 1) {
                history.push(i);
            }
            assert_eq!(history.len(), capacity);
            let kept: Vec<usize> = history.iter().map(|(_, v)| *v).collect();
            let expected: Vec<usize> = ((capacity * 2 + 1)..(capacity * 3 + 1)).collect();
            assert_eq!(kept, expected);
        }
    }

    #[test]
    fn indices_start_at_zero_oldest_first() {
        let mut history = BoundedHistory::new(3);
        history.push('a');
        history.push('b');
        let pairs: Vec<(usize, char)> = history.iter().map(|(i, c)| (i, *c)).collect();
        assert_eq!(pairs, vec![(0, 'a'), (1, 'b')]);
        assert_eq!(history.oldest(), Some(&'a'));
        assert_eq!(history.newest(), Some(&'b'));
    }

    #[test]
    fn age_ratio_is_strictly_increasing_and_ends_at_one() {
        let mut history = BoundedHistory::new(15);
        for i in 0..40 {
            history.push(i);
        }
        let ratios: Vec<f32> = history.iter_with_age().map(|(_, a, _)| a).collect();
        assert!(ratios.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(*ratios.last().unwrap(), 1.0);
        assert!(ratios.iter().all(|a| *a > 0.0 && *a <= 1.0));
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut history = BoundedHistory::new(0);
        history.push(1);
        history.push(2);
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.newest(), Some(&2));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn huge_capacity_allocates_lazily() {
        let mut history = BoundedHistory::new(usize::MAX);
        history.push(7u8);
        history.push(8u8);
        assert_eq!(history.capacity(), usize::MAX);
        assert_eq!(history.len(), 2);
        assert_eq!(history.oldest(), Some(&7));
    }
}
