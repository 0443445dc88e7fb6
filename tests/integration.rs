//! Integration tests for the public merge API.
//!
//! These tests exercise the whole pipeline (cursor extraction → segment
//! index → striping → sub-merges → concatenation) through the public
//! `confluo::{SequentialMerger, ParallelMerger}` surface only. No internal
//! modules are referenced.
//!
//! ## Coverage areas
//! - **Multiset preservation**: output equals the sorted union of all
//!   input values, duplicates included
//! - **Sequential = parallel**: identical output for every worker count
//! - **Shape robustness**: randomized block boundaries, interior empty
//!   blocks, empty parts, single parts, heavy cross-part duplication
//! - **Scale**: inputs large enough for every stripe to see real work

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use confluo::{Block, DataBlock, ParallelMerger, Part, SequentialMerger};

// ------------------------------------------------------------------------------------------------
// Helpers
// ------------------------------------------------------------------------------------------------

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Builds a random valid part: sorted values carved into blocks, with
/// block boundaries only where the key strictly increases (blocks of one
/// part must be pairwise disjoint) and empty blocks sprinkled in between.
fn random_part(rng: &mut StdRng, len: usize, key_range: u64) -> Part {
    let mut values: Vec<u64> = (0..len).map(|_| rng.gen_range(0..key_range)).collect();
    values.sort_unstable();

    let mut part: Part = Vec::new();
    let mut block: Block = Vec::new();
    for value in values {
        if let Some(&last) = block.last() {
            if last < value && rng.gen_bool(0.15) {
                part.push(std::mem::take(&mut block));
                if rng.gen_bool(0.1) {
                    part.push(Block::new());
                }
            }
        }
        block.push(value);
    }
    if !block.is_empty() {
        part.push(block);
    }
    part
}

/// The expected merge result: flatten everything and sort. Comparing the
/// full `Vec<u64>` checks multiset, ordering, and length in one shot.
fn expected_output(parts: &[Part]) -> DataBlock {
    let mut all: DataBlock = parts
        .iter()
        .flat_map(|part| part.iter())
        .flat_map(|block| block.iter().copied())
        .collect();
    all.sort_unstable();
    all
}

fn sequential_merge(parts: &[Part]) -> DataBlock {
    let mut merger = SequentialMerger::new();
    merger.add_parts(parts);
    merger.merge()
}

fn parallel_merge(parts: &[Part], workers: usize) -> DataBlock {
    let mut merger = ParallelMerger::new(workers).expect("worker count >= 1");
    merger.add_parts(parts);
    merger.merge()
}

// ================================================================================================
// Randomized equivalence
// ================================================================================================

/// # Scenario
/// Many random part sets, each merged sequentially and in parallel with
/// worker counts from 1 to 8.
///
/// # Expected behavior
/// Every merge equals the flatten-and-sort of its inputs exactly.
#[test]
fn randomized_parts_merge_to_sorted_union() {
    init_tracing();
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);

    for round in 0..20 {
        let part_count = rng.gen_range(1..=6);
        let parts: Vec<Part> = (0..part_count)
            .map(|_| {
                let len = rng.gen_range(0..400);
                random_part(&mut rng, len, 1_000)
            })
            .collect();
        let expected = expected_output(&parts);

        assert_eq!(sequential_merge(&parts), expected, "round {round}");
        for workers in 1..=8 {
            assert_eq!(
                parallel_merge(&parts, workers),
                expected,
                "round {round}, workers {workers}"
            );
        }
    }
}

/// Narrow key range forces heavy duplication within and across parts.
#[test]
fn heavy_duplication_is_preserved() {
    let mut rng = StdRng::seed_from_u64(42);

    let parts: Vec<Part> = (0..5).map(|_| random_part(&mut rng, 500, 20)).collect();
    let expected = expected_output(&parts);
    assert_eq!(expected.len(), 2_500);

    assert_eq!(sequential_merge(&parts), expected);
    for workers in [2, 3, 5] {
        assert_eq!(parallel_merge(&parts, workers), expected);
    }
}

/// Large disjoint key bands per part: the jump path dominates and every
/// stripe sees a long single-part run.
#[test]
fn banded_parts_use_bulk_promotion() {
    let parts: Vec<Part> = (0..4u64)
        .map(|band| {
            let base = band * 100_000;
            vec![
                (base..base + 5_000).collect::<Block>(),
                (base + 10_000..base + 15_000).collect::<Block>(),
            ]
        })
        .collect();
    let expected = expected_output(&parts);

    assert_eq!(sequential_merge(&parts), expected);
    assert_eq!(parallel_merge(&parts, 4), expected);
}

// ================================================================================================
// Degenerate shapes
// ================================================================================================

#[test]
fn zero_parts_and_all_empty_parts() {
    let none: Vec<Part> = Vec::new();
    assert_eq!(sequential_merge(&none), DataBlock::new());
    assert_eq!(parallel_merge(&none, 4), DataBlock::new());

    let empties: Vec<Part> = vec![vec![], vec![Block::new(), Block::new()]];
    assert_eq!(sequential_merge(&empties), DataBlock::new());
    assert_eq!(parallel_merge(&empties, 4), DataBlock::new());
}

#[test]
fn one_part_round_trips() {
    let mut rng = StdRng::seed_from_u64(7);
    let parts = vec![random_part(&mut rng, 300, 10_000)];
    let expected = expected_output(&parts);

    assert_eq!(sequential_merge(&parts), expected);
    assert_eq!(parallel_merge(&parts, 3), expected);
}

/// A large merge where the stripe count is meaningful: every worker gets
/// a non-trivial share and the concatenated result is still exact.
#[test]
fn large_merge_across_worker_counts() {
    init_tracing();
    let mut rng = StdRng::seed_from_u64(0xDEADBEEF);

    let parts: Vec<Part> = (0..8)
        .map(|_| random_part(&mut rng, 5_000, 1_000_000))
        .collect();
    let expected = expected_output(&parts);
    assert_eq!(expected.len(), 40_000);

    for workers in [1, 2, 4, 8] {
        assert_eq!(parallel_merge(&parts, workers), expected);
    }
}
