//! Public allocator facade: hides the heap behind a lazily-initialised,
//! process-wide singleton.
//!
//! One [`SpinMutex<Option<Heap>>`](crate::sync::SpinMutex) plays two roles
//! at once: it is the heap mutex the data model calls for ("a single
//! mutex", taken on every allocate/free/find/merge/stats/verify/dump), and
//! its own locking is what makes the double-checked lazy-init safe — there
//! is no separate init lock to keep in step with it.

use log::debug;

use crate::error::{AllocError, Result};
use crate::heap::Heap;
use crate::policy::policy_from_env;
use crate::sync::SpinMutex;
use core::sync::atomic::{AtomicBool, Ordering};

static INITIALISED: AtomicBool = AtomicBool::new(false);
static INIT_LOCK: SpinMutex<()> = SpinMutex::new(());
static HEAP: SpinMutex<Option<Heap>> = SpinMutex::new(None);

/// Build the heap if it doesn't exist yet. Double-checked: the fast path
/// (already initialised) never takes `INIT_LOCK`.
fn ensure_init() {
    if INITIALISED.load(Ordering::Acquire) {
        return;
    }
    let _guard = INIT_LOCK.lock();
    if INITIALISED.load(Ordering::Acquire) {
        return;
    }
    let policy = policy_from_env();
    let mut heap = HEAP.lock();
    *heap = Some(Heap::new(policy));
    INITIALISED.store(true, Ordering::Release);
    debug!("facade lazily initialised with policy {policy:?}");
}

/// Explicitly initialise the facade. `enable_concurrency` is accepted for
/// parity with the external interface; the heap mutex is always held
/// around every operation regardless, so there is no unsynchronized mode to
/// opt out of. A second call before [`cleanup`] is a no-op, not an error.
pub fn init(_enable_concurrency: bool) -> Result<()> {
    ensure_init();
    Ok(())
}

/// Tear down the process-wide heap, releasing every VM reservation. A
/// subsequent `alloc`/`free` call re-initialises lazily, per the facade's
/// edge-case contract.
pub fn cleanup() -> Result<()> {
    let mut heap = HEAP.lock();
    match heap.take() {
        Some(h) => {
            h.cleanup();
            INITIALISED.store(false, Ordering::Release);
            debug!("facade cleaned up, will re-initialise lazily on next use");
            Ok(())
        }
        None => Err(AllocError::NotInitialised),
    }
}

/// Allocate `size` bytes, 8-byte aligned. Returns a null pointer on failure
/// or when `size == 0`.
pub fn alloc(size: usize) -> *mut u8 {
    if size == 0 {
        return core::ptr::null_mut();
    }
    ensure_init();
    let mut heap = HEAP.lock();
    match heap.as_mut().and_then(|h| h.allocate(size).ok()) {
        Some(addr) => addr as *mut u8,
        None => core::ptr::null_mut(),
    }
}

/// Free a pointer previously returned by [`alloc`]. `free(null)` is a no-op
/// that returns `Ok`.
pub fn free(ptr: *mut u8) -> Result<()> {
    if ptr.is_null() {
        return Ok(());
    }
    ensure_init();
    let mut heap = HEAP.lock();
    match heap.as_mut() {
        Some(h) => h.free(ptr as usize),
        None => Err(AllocError::NotInitialised),
    }
}

/// Snapshot of `(allocated, free, peak)` byte counters.
pub fn heap_stats() -> Result<(usize, usize, usize)> {
    ensure_init();
    let heap = HEAP.lock();
    heap.as_ref()
        .map(|h| h.stats())
        .ok_or(AllocError::NotInitialised)
}

/// Check heap invariants under lock. A failure here signals corruption and
/// should be treated as fatal at the diagnostic layer.
pub fn verify() -> Result<()> {
    ensure_init();
    let heap = HEAP.lock();
    heap.as_ref().map(|h| h.verify()).ok_or(AllocError::NotInitialised)?
}

/// Write a diagnostic dump of the heap and VM reservation list to stderr.
pub fn dump() {
    ensure_init();
    let heap = HEAP.lock();
    if let Some(h) = heap.as_ref() {
        h.dump();
    }
}

/// `true` if the heap currently reports zero bytes allocated. Intended for
/// an at-exit leak check; does not itself run at exit.
pub fn leak_check() -> bool {
    let heap = HEAP.lock();
    match heap.as_ref() {
        Some(h) => h.stats().0 == 0,
        None => true,
    }
}
