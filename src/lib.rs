//! # Confluo
//!
//! A **parallel k-way merge engine** for sorted `u64` runs. Confluo takes a
//! collection of *parts*, each an ordered sequence of sorted,
//! pairwise-disjoint *blocks*, and produces one flat sorted sequence,
//! preserving duplicates (stable multiset union).
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                      ParallelMerger                        │
//! │                                                            │
//! │  parts ──► SegmentIndex ──► split points                   │
//! │    │                            │                          │
//! │    ▼                            ▼                          │
//! │  PartCursor ──── stripe 0 │ stripe 1 │ ... │ stripe W-1    │
//! │  (bulk slice        │          │               │           │
//! │   extraction)       ▼          ▼               ▼           │
//! │              SequentialMerger per stripe (worker pool)     │
//! │                     │          │               │           │
//! │                     └────► concatenate ◄───────┘           │
//! │                              │                             │
//! │                              ▼                             │
//! │                          DataBlock                         │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`part`] | Part/block types and the bulk-extracting [`PartCursor`] |
//! | [`merge`] | Sequential jump-merge over a min-heap of cursors |
//! | [`segment`] | Key-distribution index and split-point derivation |
//! | [`parallel`] | Striped fan-out on a dedicated worker pool |
//!
//! ## The jump in jump-merge
//!
//! A plain heap merge pays `O(log k)` per element. Confluo's sequential
//! merger instead asks the heap for the *second smallest* current value and
//! bulk-promotes everything below it from the smallest cursor as borrowed
//! block slices, one append per block. When one part dominates a long key
//! range, merging it costs a handful of slice copies instead of a heap
//! operation per element.
//!
//! The parallel merger stripes the key space with split points estimated
//! from the block bounds of all parts, merges each stripe independently on
//! a fixed-size worker pool, and concatenates the stripe outputs, which
//! are disjoint by construction.
//!
//! ## Quick Start
//!
//! ```rust
//! use confluo::{ParallelMerger, Part, SequentialMerger};
//!
//! let p1: Part = vec![vec![1, 2], vec![5, 9]];
//! let p2: Part = vec![vec![4, 7], vec![10, 15, 16]];
//!
//! // Sequential
//! let mut merger = SequentialMerger::new();
//! merger.add_part(&p1);
//! merger.add_part(&p2);
//! assert_eq!(merger.merge(), vec![1, 2, 4, 5, 7, 9, 10, 15, 16]);
//!
//! // Parallel, same output
//! let mut merger = ParallelMerger::new(4).unwrap();
//! merger.add_part(&p1);
//! merger.add_part(&p2);
//! assert_eq!(merger.merge(), vec![1, 2, 4, 5, 7, 9, 10, 15, 16]);
//! ```
//!
//! ## Scope
//!
//! Confluo is a library boundary, not a protocol boundary: it consumes
//! fully-materialized parts borrowed from the caller and returns one owned
//! output buffer. How parts are produced, encoded, or persisted is the
//! caller's business. Keys are `u64` with natural order; there is no
//! deduplication and no streaming output.

pub mod merge;
pub mod parallel;
pub mod part;
pub mod segment;

pub use merge::SequentialMerger;
pub use parallel::{MergeError, ParallelMerger};
pub use part::{Block, DataBlock, Part, PartCursor, PartView};
pub use segment::{Segment, SegmentIndex};
