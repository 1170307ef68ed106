//! Deterministic allocator scenarios, each against a fresh isolated heap so
//! byte-counter assertions aren't perturbed by other tests sharing the
//! process-wide facade.

use ralloc::heap::Heap;
use ralloc::AllocPolicy;

/// A1: alloc(1024) → stats.allocated == 1024 → free(p) → stats.allocated == 0.
#[test]
fn a1_single_alloc_free_roundtrips_stats() {
    let mut h = Heap::new(AllocPolicy::FirstFit);
    let p = h.allocate(1024).unwrap();
    assert_ne!(p, 0);
    let (allocated, _, _) = h.stats();
    assert_eq!(allocated, 1024);
    h.free(p).unwrap();
    let (allocated, _, _) = h.stats();
    assert_eq!(allocated, 0);
}

/// A2: three allocations, pairwise disjoint and 8-aligned, verify ok
/// throughout; freeing in p2, p1, p3 order drains `allocated` to zero.
#[test]
fn a2_three_allocations_disjoint_then_freed_out_of_order() {
    let mut h = Heap::new(AllocPolicy::FirstFit);
    let p1 = h.allocate(100).unwrap();
    let p2 = h.allocate(200).unwrap();
    let p3 = h.allocate(512).unwrap();

    for p in [p1, p2, p3] {
        assert_eq!(p % 8, 0);
    }
    let ranges = [(p1, 104), (p2, 200), (p3, 512)];
    for i in 0..ranges.len() {
        for j in (i + 1)..ranges.len() {
            let (a, sa) = ranges[i];
            let (b, sb) = ranges[j];
            assert!(a + sa <= b || b + sb <= a, "ranges overlap");
        }
    }
    assert!(h.verify().is_ok());

    h.free(p2).unwrap();
    h.free(p1).unwrap();
    h.free(p3).unwrap();

    let (allocated, _, _) = h.stats();
    assert_eq!(allocated, 0);
    assert!(h.verify().is_ok());
}

/// A3: alloc/free the same size 100 times; initial and final `allocated`
/// match, verify ok throughout.
#[test]
fn a3_repeated_alloc_free_matches_baseline() {
    let mut h = Heap::new(AllocPolicy::FirstFit);
    let (baseline, _, _) = h.stats();
    for _ in 0..100 {
        let p = h.allocate(1024).unwrap();
        assert!(h.verify().is_ok());
        h.free(p).unwrap();
        assert!(h.verify().is_ok());
    }
    let (allocated, _, _) = h.stats();
    assert_eq!(allocated, baseline);
}

/// A4: two adjacent allocations, freed in order, coalesce into one FREE
/// region covering their union.
#[test]
fn a4_freeing_adjacent_allocations_merges_block_count() {
    let mut h = Heap::new(AllocPolicy::FirstFit);
    let p1 = h.allocate(64).unwrap();
    let p2 = h.allocate(64).unwrap();
    assert_eq!(p2, p1 + 64);

    let count_before = h.block_count();
    h.free(p1).unwrap();
    h.free(p2).unwrap();
    assert!(h.block_count() <= count_before);
    assert!(h.verify().is_ok());
}

/// A5: freeing an address with no backing block is NotFound; heap state is
/// unaffected.
#[test]
fn a5_free_of_unknown_address_is_not_found() {
    let mut h = Heap::new(AllocPolicy::FirstFit);
    let (allocated_before, free_before, _) = h.stats();
    let result = h.free(0xdead_beef);
    assert_eq!(result, Err(ralloc::AllocError::NotFound));
    assert!(h.verify().is_ok());
    let (allocated_after, free_after, _) = h.stats();
    assert_eq!(allocated_before, allocated_after);
    assert_eq!(free_before, free_after);
}

#[test]
fn double_free_is_reported_and_state_preserved() {
    let mut h = Heap::new(AllocPolicy::FirstFit);
    let p = h.allocate(32).unwrap();
    h.free(p).unwrap();
    assert_eq!(h.free(p), Err(ralloc::AllocError::DoubleFree));
    assert!(h.verify().is_ok());
}

#[test]
fn best_fit_and_worst_fit_both_keep_verify_happy() {
    for policy in [AllocPolicy::BestFit, AllocPolicy::WorstFit] {
        let mut h = Heap::new(policy);
        let mut ptrs = Vec::new();
        for size in [64, 4096, 128, 2048, 32] {
            ptrs.push(h.allocate(size).unwrap());
        }
        assert!(h.verify().is_ok());
        for p in ptrs {
            h.free(p).unwrap();
        }
        assert!(h.verify().is_ok());
    }
}
