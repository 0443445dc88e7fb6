//! Parallel striped merge.
//!
//! [`ParallelMerger`] produces the same output as
//! [`SequentialMerger`](crate::merge::SequentialMerger), split across a
//! fixed-size worker pool. The driver:
//!
//! 1. builds a [`SegmentIndex`] over all parts and derives up to
//!    `workers - 1` split points dividing the key space into near-equal
//!    **stripes**;
//! 2. drains every part cursor stripe by stripe: each stripe takes the
//!    prefix of every cursor up to (and including) its split point, the
//!    last stripe takes the rest;
//! 3. hands each stripe's views to a fresh sequential merger and runs the
//!    stripe merges on the pool, one output slot per stripe;
//! 4. concatenates the slots in stripe order.
//!
//! Because split points are cut *values* and every cursor is drained up to
//! each point before the next stripe starts, stripe `i` holds only values
//! `<= point_i` and stripe `i + 1` only values `> point_i`. Stripe outputs
//! therefore never interleave and plain concatenation is correct; no
//! second merge and no locking are needed. Workers share nothing but the
//! read-only input blocks.
//!
//! Striping is an estimate. Skewed inputs degrade balance, never
//! correctness; with no usable split points the whole merge degenerates to
//! one sequential stripe.


use rayon::prelude::*;
use thiserror::Error;
use tracing::debug;

use crate::merge::SequentialMerger;
use crate::part::{DataBlock, Part, PartCursor, PartView};
use crate::segment::SegmentIndex;

// ------------------------------------------------------------------------------------------------
// Errors
// ------------------------------------------------------------------------------------------------

/// Errors surfaced when setting up a merge.
///
/// The merge itself is infallible; only construction can refuse.
#[derive(Debug, Error)]
pub enum MergeError {
    /// A parallel merger needs at least one worker.
    #[error("worker count must be at least 1")]
    ZeroWorkers,

    /// The dedicated worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

// ------------------------------------------------------------------------------------------------
// ParallelMerger
// ------------------------------------------------------------------------------------------------

/// Striped k-way merge on a dedicated worker pool.
///
/// The worker count is fixed at construction and bounds both the pool size
/// and the number of stripes.
///
/// # Example
///
/// ```rust
/// use confluo::{ParallelMerger, Part};
///
/// let parts: Vec<Part> = vec![
///     vec![vec![1, 2], vec![5, 9]],
///     vec![vec![4, 7], vec![14, 15, 16]],
///     vec![vec![3, 6], vec![8, 10, 11, 11]],
/// ];
///
/// let mut merger = ParallelMerger::new(4).unwrap();
/// merger.add_parts(&parts);
/// let merged = merger.merge();
/// assert_eq!(merged, vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 11, 14, 15, 16]);
/// ```
pub struct ParallelMerger<'a> {
    /// Dedicated pool; exactly `workers` threads.
    pool: rayon::ThreadPool,

    /// Maximum number of stripes.
    workers: usize,

    /// Input parts, as borrowed block views.
    parts: Vec<PartView<'a>>,
}

impl<'a> ParallelMerger<'a> {
    /// Creates a merger backed by a pool of `workers` threads.
    ///
    /// `workers` must be at least 1; `workers == 1` is valid and performs
    /// a single sequential merge on the pool.
    pub fn new(workers: usize) -> Result<Self, MergeError> {
        if workers == 0 {
            return Err(MergeError::ZeroWorkers);
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()?;
        Ok(Self {
            pool,
            workers,
            parts: Vec::new(),
        })
    }

    /// Adds one part. Same contract as
    /// [`SequentialMerger::add_part`](crate::merge::SequentialMerger::add_part).
    pub fn add_part<B: AsRef<[u64]>>(&mut self, part: &'a [B]) {
        self.parts.push(part.iter().map(AsRef::as_ref).collect());
    }

    /// Adds a batch of parts.
    pub fn add_parts(&mut self, parts: &'a [Part]) {
        for part in parts {
            self.add_part(part);
        }
    }

    /// Merges all added parts into one sorted output.
    ///
    /// Equal to the sequential merger's output for the same inputs, up to
    /// the unspecified order of equal keys from different parts.
    pub fn merge(self) -> DataBlock {
        let Self {
            pool,
            workers,
            parts,
        } = self;

        let mut index = SegmentIndex::new();
        for part in &parts {
            index.add_part(part);
        }
        let total = index.total();
        let points = index.split_points(workers);
        debug!(
            parts = parts.len(),
            total,
            workers,
            stripes = points.len() + 1,
            "striping merge"
        );

        let mut cursors: Vec<PartCursor<'a>> =
            parts.into_iter().filter_map(PartCursor::from_view).collect();

        // Stripe partitioning is sequential: each stripe drains its prefix
        // of every cursor before the next stripe begins, which is what
        // makes the stripes pairwise disjoint.
        let mut stripes: Vec<SequentialMerger<'a>> = Vec::with_capacity(points.len() + 1);
        for i in 0..=points.len() {
            let mut stripe = SequentialMerger::new();
            for cursor in &mut cursors {
                let view = match points.get(i) {
                    Some(&point) => cursor.take_through(point),
                    None => cursor.take_rest(),
                };
                stripe.add_view(view);
            }
            stripes.push(stripe);
        }

        // One slot per stripe; the indexed collect keeps slot order, so no
        // synchronization beyond the implicit barrier is needed.
        let outputs: Vec<DataBlock> = pool.install(|| {
            stripes
                .into_par_iter()
                .map(SequentialMerger::merge)
                .collect()
        });

        let mut result = DataBlock::with_capacity(total);
        for output in &outputs {
            result.extend_from_slice(output);
        }
        result
    }
}
