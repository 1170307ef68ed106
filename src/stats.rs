//! Allocation diagnostic counters.
//!
//! All counters use `Relaxed` ordering — they are observational only and not
//! used as synchronization primitives. The heap's own mutex provides the
//! ordering guarantees for correctness; these counters are purely additive
//! monitoring and participate in no invariant.
//!
//! # Usage
//!
//! ```ignore
//! let snap = ralloc::stats::snapshot();
//! println!("allocs: {}", snap.alloc_count);
//! ```
//!
//! Obtain a [`Snapshot`] with [`snapshot()`]. Individual counter loads are
//! each atomic but not globally consistent with each other.

use core::sync::atomic::{AtomicU64, Ordering};

pub(crate) struct Stats {
    /// Total successful calls to [`crate::alloc`].
    pub alloc_count: AtomicU64,
    /// Total successful calls to [`crate::free`].
    pub free_count: AtomicU64,
    /// Sum of all requested byte sizes passed to `alloc`.
    pub alloc_bytes: AtomicU64,
    /// Total calls to [`crate::verify`].
    pub verify_count: AtomicU64,

    /// Calls to `platform::page_alloc` made by the VM layer.
    pub os_reserve_count: AtomicU64,
    /// Bytes requested from the OS via `platform::page_alloc`.
    pub os_reserve_bytes: AtomicU64,
    /// Calls to `platform::page_dealloc`.
    pub os_release_count: AtomicU64,

    /// Times a free block was split to satisfy a smaller request.
    pub block_splits: AtomicU64,
    /// Times two adjacent free blocks were merged.
    pub block_merges: AtomicU64,
}

impl Stats {
    const fn new() -> Self {
        Self {
            alloc_count: AtomicU64::new(0),
            free_count: AtomicU64::new(0),
            alloc_bytes: AtomicU64::new(0),
            verify_count: AtomicU64::new(0),
            os_reserve_count: AtomicU64::new(0),
            os_reserve_bytes: AtomicU64::new(0),
            os_release_count: AtomicU64::new(0),
            block_splits: AtomicU64::new(0),
            block_merges: AtomicU64::new(0),
        }
    }
}

pub(crate) static STATS: Stats = Stats::new();

/// A point-in-time snapshot of all diagnostic counters.
///
/// Fields are plain `u64` values loaded from the global atomic counters.
/// Individual fields are each atomically read, but the snapshot as a whole
/// is not globally consistent — concurrent allocations may race between
/// loads. For monitoring purposes this is always sufficient.
///
/// Obtain a snapshot with [`snapshot()`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Snapshot {
    pub alloc_count: u64,
    pub free_count: u64,
    pub alloc_bytes: u64,
    pub verify_count: u64,
    pub os_reserve_count: u64,
    pub os_reserve_bytes: u64,
    pub os_release_count: u64,
    pub block_splits: u64,
    pub block_merges: u64,
}

/// Load all counters with `Relaxed` ordering and return a [`Snapshot`].
pub fn snapshot() -> Snapshot {
    let s = &STATS;
    Snapshot {
        alloc_count: s.alloc_count.load(Ordering::Relaxed),
        free_count: s.free_count.load(Ordering::Relaxed),
        alloc_bytes: s.alloc_bytes.load(Ordering::Relaxed),
        verify_count: s.verify_count.load(Ordering::Relaxed),
        os_reserve_count: s.os_reserve_count.load(Ordering::Relaxed),
        os_reserve_bytes: s.os_reserve_bytes.load(Ordering::Relaxed),
        os_release_count: s.os_release_count.load(Ordering::Relaxed),
        block_splits: s.block_splits.load(Ordering::Relaxed),
        block_merges: s.block_merges.load(Ordering::Relaxed),
    }
}
