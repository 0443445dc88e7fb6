//! Sequential k-way jump-merge.
//!
//! [`SequentialMerger`] combines any number of parts into one sorted
//! [`DataBlock`], preserving duplicates. It is a classic heap merge with a
//! twist: instead of popping one value at a time, it promotes **entire
//! dominated sub-ranges** in bulk.
//!
//! A min-heap orders the live cursors by their current value. After popping
//! the smallest cursor, the next heap pop yields the *second smallest*
//! current value across all parts. By the part invariant (blocks of one
//! part strictly increasing), every value up to that bound still to be
//! produced must come from the smallest cursor alone, so its whole prefix
//! is appended through [`PartCursor::take_through`] at one slice copy per
//! block. The per-element `O(log k)` of a plain heap merge is paid once per
//! *jump* instead of once per value.
//!
//! Equal values from different parts are all emitted; their relative order
//! is unspecified.

#[cfg(test)]
mod tests;

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::trace;

use crate::part::{DataBlock, Part, PartCursor, PartView};

// ------------------------------------------------------------------------------------------------
// Heap ordering
// ------------------------------------------------------------------------------------------------

/// Min-heap adapter: orders cursors by current value, smallest first.
///
/// Only live (non-exhausted) cursors ever enter the heap, so comparing on
/// the cached value is always meaningful.
struct MinCursor<'a>(PartCursor<'a>);

impl PartialEq for MinCursor<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.0.val() == other.0.val()
    }
}

impl Eq for MinCursor<'_> {}

impl PartialOrd for MinCursor<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MinCursor<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap.
        other.0.val().cmp(&self.0.val())
    }
}

// ------------------------------------------------------------------------------------------------
// SequentialMerger
// ------------------------------------------------------------------------------------------------

/// Single-threaded jump-merge over a set of parts.
///
/// Parts are added by reference; the merger never copies a key until it
/// lands in the output buffer. [`SequentialMerger::merge`] consumes the
/// merger, so a second merge over fused input state is unrepresentable.
///
/// # Example
///
/// ```rust
/// use confluo::{Part, SequentialMerger};
///
/// let p1: Part = vec![vec![1, 2], vec![5, 9]];
/// let p2: Part = vec![vec![4, 7], vec![10, 15, 16]];
///
/// let mut merger = SequentialMerger::new();
/// merger.add_part(&p1);
/// merger.add_part(&p2);
/// assert_eq!(merger.merge(), vec![1, 2, 4, 5, 7, 9, 10, 15, 16]);
/// ```
#[derive(Default)]
pub struct SequentialMerger<'a> {
    /// Input parts, as borrowed block views.
    parts: Vec<PartView<'a>>,
}

impl<'a> SequentialMerger<'a> {
    pub fn new() -> Self {
        Self { parts: Vec::new() }
    }

    /// Adds one part. Accepts owned [`Part`]s as well as borrowed slice
    /// views; the part must satisfy the part invariant.
    pub fn add_part<B: AsRef<[u64]>>(&mut self, part: &'a [B]) {
        self.parts.push(part.iter().map(AsRef::as_ref).collect());
    }

    /// Adds a batch of parts. Addition order only affects the relative
    /// order of equal keys across parts, which is unspecified anyway.
    pub fn add_parts(&mut self, parts: &'a [Part]) {
        for part in parts {
            self.add_part(part);
        }
    }

    /// Adds an already-extracted view, e.g. one stripe of a cursor. Used
    /// by the parallel driver to hand stripe prefixes to sub-merges.
    pub fn add_view(&mut self, view: PartView<'a>) {
        self.parts.push(view);
    }

    /// Total number of keys across all added parts.
    fn pending_len(&self) -> usize {
        self.parts
            .iter()
            .flat_map(|part| part.iter())
            .map(|block| block.len())
            .sum()
    }

    /// Merges all added parts into one sorted output, preserving
    /// duplicates.
    pub fn merge(self) -> DataBlock {
        let total = self.pending_len();
        let mut result = DataBlock::with_capacity(total);

        let mut heap = BinaryHeap::with_capacity(self.parts.len());
        for view in self.parts {
            if let Some(cursor) = PartCursor::from_view(view) {
                heap.push(MinCursor(cursor));
            }
        }
        trace!(cursors = heap.len(), total, "starting jump-merge");

        let Some(MinCursor(mut curr)) = heap.pop() else {
            return result;
        };

        while let Some(MinCursor(next)) = heap.pop() {
            // `next` holds the second-smallest live value: everything up to
            // it (inclusive, to keep duplicates together) belongs to `curr`.
            for run in curr.take_through(next.val()) {
                result.extend_from_slice(run);
            }
            if !curr.is_end() {
                heap.push(MinCursor(curr));
            }
            curr = next;
        }

        // Last live cursor owns the entire remaining tail.
        for run in curr.take_rest() {
            result.extend_from_slice(run);
        }

        debug_assert_eq!(result.len(), total);
        result
    }
}
