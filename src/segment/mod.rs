//! Key-distribution index: disjoint range union with counts.
//!
//! [`SegmentIndex`] folds the block bounds of every input part into an
//! ordered list of disjoint key ranges, each tagged with the number of
//! input keys it covers. The index never looks at individual keys, only at
//! `(first, last, len)` per block, so building it is linear in the number
//! of blocks.
//!
//! Its one consumer is the parallel driver: [`SegmentIndex::split_points`]
//! walks the ranges and derives cut values that divide the total key count
//! into near-equal stripes. Balance is best-effort; inside a segment the
//! keys are assumed uniformly distributed and the cut is found by linear
//! interpolation.
//!
//! # Invariants
//!
//! After every block insertion:
//!
//! - segments are strictly increasing with a gap of at least one key
//!   between neighbors: `seg.end + 1 < next.begin`;
//! - each segment's `size` counts every key from all inserted parts that
//!   falls inside `[begin, end]`.
//!
//! The index is a transient estimator scoped to one split-point
//! computation. It is array-backed with a forward insertion cursor; blocks
//! of one part arrive in ascending key order, so the cursor never has to
//! rewind within a part.

#[cfg(test)]
mod tests;

use tracing::debug;

// ------------------------------------------------------------------------------------------------
// Segment
// ------------------------------------------------------------------------------------------------

/// One disjoint key range `[begin, end]` and the number of input keys
/// inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Smallest key of the range (inclusive).
    pub begin: u64,

    /// Largest key of the range (inclusive).
    pub end: u64,

    /// Number of keys from all inserted parts inside `[begin, end]`.
    pub size: usize,
}

// ------------------------------------------------------------------------------------------------
// SegmentIndex
// ------------------------------------------------------------------------------------------------

/// Ordered union of the key ranges covered by all inserted parts.
#[derive(Debug, Default)]
pub struct SegmentIndex {
    /// Disjoint segments, strictly increasing, gap of at least one key.
    segs: Vec<Segment>,

    /// Running total of inserted keys.
    total: usize,
}

impl SegmentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one part into the index, block by block.
    ///
    /// The insertion cursor persists across the blocks of the part: block
    /// first-keys are non-decreasing within a part, so each block resumes
    /// the walk where the previous one stopped.
    pub fn add_part<B: AsRef<[u64]>>(&mut self, part: &[B]) {
        let mut cur = 0usize;

        for block in part {
            let block = block.as_ref();
            if block.is_empty() {
                continue;
            }
            let first = block[0];
            let last = block[block.len() - 1];
            let size = block.len();
            self.total += size;

            if self.segs.is_empty() {
                self.segs.push(Segment {
                    begin: first,
                    end: last,
                    size,
                });
                continue;
            }

            // Resume the walk: skip segments that end before this block.
            while cur + 1 < self.segs.len() && first >= self.segs[cur + 1].begin {
                cur += 1;
            }

            let seg = &mut self.segs[cur];
            if first <= seg.end.saturating_add(1) {
                // Touching or overlapping: fold the block in.
                seg.size += size;
                if last > seg.end {
                    seg.end = last;
                }
            } else {
                // Strictly past the current segment: splice a new one.
                self.segs.insert(
                    cur + 1,
                    Segment {
                        begin: first,
                        end: last,
                        size,
                    },
                );
                cur += 1;
            }

            // The fold may have extended `end` into later segments.
            self.coalesce_from(cur);
        }
    }

    /// Absorbs successors of `cur` while they touch or overlap it,
    /// restoring the gap invariant after a fold or splice. A successor
    /// entirely contained in `cur` only contributes its count.
    fn coalesce_from(&mut self, cur: usize) {
        while cur + 1 < self.segs.len()
            && self.segs[cur + 1].begin <= self.segs[cur].end.saturating_add(1)
        {
            let next = self.segs.remove(cur + 1);
            self.segs[cur].size += next.size;
            if next.end > self.segs[cur].end {
                self.segs[cur].end = next.end;
            }
        }
    }

    /// Total number of keys inserted so far.
    pub fn total(&self) -> usize {
        self.total
    }

    /// The current disjoint segment list.
    pub fn segments(&self) -> &[Segment] {
        &self.segs
    }

    /// Derives up to `workers - 1` strictly increasing cut values dividing
    /// the indexed keys into near-equal stripes.
    ///
    /// Each returned point is an inclusive upper bound for its stripe:
    /// values `<= point` fall below the cut, values `> point` above it.
    /// Returns an empty list when there is nothing to split or the
    /// per-stripe quota rounds down to zero, in which case the caller
    /// degenerates to a single sequential merge.
    pub fn split_points(&self, workers: usize) -> Vec<u64> {
        let mut points = Vec::new();
        if workers < 2 {
            return points;
        }
        let quota = self.total / workers;
        if quota == 0 {
            return points;
        }

        let mut segs = self.segs.iter();
        let Some(mut seg) = segs.next() else {
            return points;
        };
        // Keys of the current segment already consumed by earlier stripes.
        let mut consumed = 0usize;
        let mut remaining = quota;

        while points.len() < workers - 1 {
            if seg.size - consumed <= remaining {
                // Segment runs out first; an exact boundary cuts at its end.
                remaining -= seg.size - consumed;
                if remaining == 0 {
                    push_increasing(&mut points, seg.end);
                    remaining = quota;
                }
                match segs.next() {
                    Some(next) => seg = next,
                    None => break,
                }
                consumed = 0;
            } else {
                // The stripe boundary falls inside this segment; assume a
                // uniform key distribution and interpolate.
                consumed += remaining;
                push_increasing(&mut points, interpolate(seg, consumed));
                remaining = quota;
            }
        }

        debug!(
            total = self.total,
            workers,
            quota,
            points = points.len(),
            "derived split points"
        );
        points
    }
}

/// Interpolated cut after `consumed` of `seg.size` keys, clamped into
/// `[begin, end]` so float rounding at extreme spans cannot escape the
/// segment.
fn interpolate(seg: &Segment, consumed: usize) -> u64 {
    let span = seg.end - seg.begin;
    let offset = (span as f64 * (consumed as f64 / seg.size as f64)).ceil() as u64;
    seg.begin + offset.min(span)
}

/// Appends `point` only if it keeps the list strictly increasing. Narrow
/// segments can interpolate to the same cut twice; the duplicate stripe
/// would be empty, so the point is dropped instead.
fn push_increasing(points: &mut Vec<u64>, point: u64) {
    if points.last().map_or(true, |&last| point > last) {
        points.push(point);
    }
}
