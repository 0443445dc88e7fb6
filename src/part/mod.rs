//! Parts, blocks, and the part cursor.
//!
//! The merge engine consumes **parts**: ordered sequences of sorted,
//! pairwise-disjoint **blocks** of `u64` keys. Within one part, block order
//! matches key order, so for any two blocks `B_i`, `B_j` with `i < j`:
//!
//! ```text
//! last(B_i) < first(B_j)
//! ```
//!
//! Duplicates *within* a block are allowed; blocks of the same part never
//! overlap. Empty blocks may appear anywhere in a part and are skipped.
//!
//! # Part Cursor
//!
//! [`PartCursor`] is a forward position over one part. Besides one-value
//! stepping it supports **bulk extraction**: [`PartCursor::take_through`]
//! returns every remaining value up to an inclusive bound as a sequence of
//! sub-slices of the original blocks, one slice per touched block. No key is
//! copied; a long run that is dominated by a single part moves to the output
//! at one slice append per block instead of one comparison per element.
//!
//! The cursor borrows the blocks read-only. Several cursors may walk the
//! same part at once, and every [`PartView`] it hands out stays valid for
//! the lifetime of the input borrow.

#[cfg(test)]
mod tests;

// ------------------------------------------------------------------------------------------------
// Core types
// ------------------------------------------------------------------------------------------------

/// A sorted (non-decreasing) run of keys. Duplicates are permitted.
pub type Block = Vec<u64>;

/// An ordered sequence of pairwise-disjoint [`Block`]s.
///
/// Callers own parts; the merge engine only ever borrows them.
pub type Part = Vec<Block>;

/// The flat, merged output sequence.
pub type DataBlock = Vec<u64>;

/// A borrowed form of a part: ordered, pairwise-disjoint sub-slices of the
/// underlying block storage.
///
/// Produced by [`PartCursor::take_through`] and [`PartCursor::take_rest`],
/// and consumed by the mergers. Only slice headers are moved around; the
/// keys themselves stay in the caller's blocks until they are copied into
/// the final [`DataBlock`].
pub type PartView<'a> = Vec<&'a [u64]>;

// ------------------------------------------------------------------------------------------------
// PartCursor
// ------------------------------------------------------------------------------------------------

/// A forward cursor over one part.
///
/// Tracks `(block, index)` and caches the value it points at. The cursor
/// only holds slice references into the input blocks; it never mutates or
/// copies them.
///
/// Empty blocks are dropped once at construction, so an in-bounds position
/// always refers to a populated block and `blocks.len()` is the single
/// exhausted state.
pub struct PartCursor<'a> {
    /// Populated block slices, in part order.
    blocks: Vec<&'a [u64]>,

    /// Index of the current block; `blocks.len()` once exhausted.
    block: usize,

    /// Position inside the current block.
    idx: usize,

    /// Cached value at `(block, idx)`. Stale once exhausted.
    val: u64,
}

impl<'a> PartCursor<'a> {
    /// Creates a cursor positioned at the first value of `part`.
    ///
    /// Accepts anything that views as a sequence of `&[u64]` blocks, i.e.
    /// both owned [`Part`]s and borrowed [`PartView`]s. Returns `None` iff
    /// no block in the part holds a value.
    pub fn new<B: AsRef<[u64]>>(part: &'a [B]) -> Option<Self> {
        Self::from_blocks(part.iter().map(AsRef::as_ref).collect())
    }

    /// Creates a cursor that takes ownership of an already-borrowed view.
    pub fn from_view(view: PartView<'a>) -> Option<Self> {
        Self::from_blocks(view)
    }

    fn from_blocks(mut blocks: Vec<&'a [u64]>) -> Option<Self> {
        blocks.retain(|b| !b.is_empty());
        debug_assert!(part_invariant_holds(&blocks), "blocks unsorted or overlapping");

        let val = *blocks.first()?.first()?;
        Some(Self {
            blocks,
            block: 0,
            idx: 0,
            val,
        })
    }

    /// The value the cursor points at.
    ///
    /// Meaningless once the cursor is exhausted; callers check
    /// [`PartCursor::is_end`] first. The last cached value is returned in
    /// that state rather than panicking.
    pub fn val(&self) -> u64 {
        self.val
    }

    /// Returns `true` once every value of the part has been consumed.
    pub fn is_end(&self) -> bool {
        self.block >= self.blocks.len()
    }

    /// Advances one position and returns the new value, crossing block
    /// boundaries as needed. Returns `None` on exhaustion.
    pub fn next_val(&mut self) -> Option<u64> {
        if self.is_end() {
            return None;
        }

        self.idx += 1;
        if self.idx >= self.blocks[self.block].len() {
            self.block += 1;
            self.idx = 0;
        }

        if self.is_end() {
            return None;
        }
        self.val = self.blocks[self.block][self.idx];
        Some(self.val)
    }

    /// Bulk-extracts every remaining value `v` with `v <= max` as a
    /// sequence of block sub-slices, leaving the cursor at the first value
    /// strictly greater than `max` (or exhausted).
    ///
    /// - Blocks whose maximum is `<= max` contribute their whole unread
    ///   tail as a single slice.
    /// - The first block reaching past `max` is cut by binary search at
    ///   the first index holding a value `> max`, so every duplicate of
    ///   `max` lands in the emitted prefix.
    /// - If the cursor is exhausted, or already points past `max`, nothing
    ///   is emitted and the cursor does not move.
    pub fn take_through(&mut self, max: u64) -> PartView<'a> {
        let mut view = PartView::new();
        if self.is_end() || self.val > max {
            return view;
        }

        while self.block < self.blocks.len() {
            let block = self.blocks[self.block];
            if block[block.len() - 1] <= max {
                // Whole remaining tail is dominated; take it and move on.
                view.push(&block[self.idx..]);
                self.block += 1;
                self.idx = 0;
            } else {
                // First index with a value > max. `partition_point` keeps
                // every duplicate of `max` on the emitted side.
                let cut = self.idx + block[self.idx..].partition_point(|&v| v <= max);
                if cut > self.idx {
                    view.push(&block[self.idx..cut]);
                    self.idx = cut;
                }
                break;
            }
        }

        if !self.is_end() {
            self.val = self.blocks[self.block][self.idx];
        }
        view
    }

    /// Extracts everything left: the unread tail of the current block, then
    /// each remaining block whole. Leaves the cursor exhausted. No-op when
    /// already exhausted.
    pub fn take_rest(&mut self) -> PartView<'a> {
        let mut view = PartView::new();
        if self.is_end() {
            return view;
        }

        let block = self.blocks[self.block];
        view.push(&block[self.idx..]);
        view.extend_from_slice(&self.blocks[self.block + 1..]);

        self.block = self.blocks.len();
        self.idx = 0;
        view
    }
}

/// Single-value iteration, delegating to [`PartCursor::next_val`].
///
/// Note the first value is the one the cursor already points at, so the
/// current value is yielded before advancing.
impl Iterator for PartCursor<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_end() {
            return None;
        }
        let val = self.val;
        self.next_val();
        Some(val)
    }
}

/// Checks the part invariant: each block non-decreasing, consecutive
/// blocks strictly separated. Debug builds only; invalid input is a caller
/// bug, not a runtime condition.
fn part_invariant_holds(blocks: &[&[u64]]) -> bool {
    for block in blocks {
        if block.windows(2).any(|w| w[0] > w[1]) {
            return false;
        }
    }
    blocks
        .windows(2)
        .all(|w| w[0][w[0].len() - 1] < w[1][0])
}
