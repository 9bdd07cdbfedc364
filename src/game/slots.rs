//! Numbered-slot pool for human seats.
//!
//! At room creation the numbers `1..=total_players` are drawn in random
//! order; the agents take a prefix and the remainder seeds this pool.
//! The standing invariant: agent numbers, assigned human numbers, and
//! pooled numbers always partition `1..=total_players`.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct SlotPool {
    pool: VecDeque<u8>,
}

impl SlotPool {
    pub fn new(numbers: impl IntoIterator<Item = u8>) -> Self {
        Self {
            pool: numbers.into_iter().collect(),
        }
    }

    /// Pop the next free number, or `None` when every human seat is taken.
    pub fn acquire(&mut self) -> Option<u8> {
        self.pool.pop_front()
    }

    /// Return a number on leave. Callers guarantee `number` was acquired
    /// from this pool; pushing a foreign number would break the partition
    /// invariant.
    pub fn release(&mut self, number: u8) {
        debug_assert!(!self.pool.contains(&number));
        self.pool.push_back(number);
    }

    pub fn remaining(&self) -> usize {
        self.pool.len()
    }

    pub fn contains(&self, number: u8) -> bool {
        self.pool.contains(&number)
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.pool.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn acquire_is_fifo() {
        let mut pool = SlotPool::new([4, 7, 2]);
        assert_eq!(pool.acquire(), Some(4));
        assert_eq!(pool.acquire(), Some(7));
        assert_eq!(pool.acquire(), Some(2));
        assert_eq!(pool.acquire(), None);
    }

    #[test]
    fn release_makes_number_reacquirable() {
        let mut pool = SlotPool::new([9]);
        let n = pool.acquire().unwrap();
        assert_eq!(pool.acquire(), None);
        pool.release(n);
        assert_eq!(pool.acquire(), Some(9));
    }

    proptest! {
        /// Arbitrary interleavings of acquire/release preserve the
        /// partition: assigned numbers and pooled numbers stay disjoint
        /// and their union never changes.
        #[test]
        fn acquire_release_preserves_partition(ops in proptest::collection::vec(any::<bool>(), 0..64)) {
            let initial: Vec<u8> = vec![4, 1, 6, 9];
            let universe: HashSet<u8> = initial.iter().copied().collect();
            let mut pool = SlotPool::new(initial);
            let mut assigned: Vec<u8> = Vec::new();

            for acquire in ops {
                if acquire {
                    if let Some(n) = pool.acquire() {
                        prop_assert!(!assigned.contains(&n));
                        assigned.push(n);
                    }
                } else if let Some(n) = assigned.pop() {
                    pool.release(n);
                }

                let pooled: HashSet<u8> = pool.iter().collect();
                let held: HashSet<u8> = assigned.iter().copied().collect();
                prop_assert!(pooled.is_disjoint(&held));
                let union: HashSet<u8> = pooled.union(&held).copied().collect();
                prop_assert_eq!(&union, &universe);
            }
        }
    }
}
