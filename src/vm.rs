//! Virtual memory reservation layer.
//!
//! The sole provider of raw address space to the heap. Reserves
//! page-aligned, anonymous, read/write, private ranges from the OS via
//! [`crate::platform`], and tracks every outstanding reservation so they can
//! all be released on cleanup.
//!
//! Callers (the [`crate::heap::Heap`]) are expected to hold their own mutex
//! around every call here; this type performs no locking of its own.

use crate::error::{AllocError, Result};
use crate::platform;
use crate::PAGE_SIZE;

/// A single page-aligned range reserved from the OS.
#[derive(Debug, Clone, Copy)]
pub struct Reservation {
    pub start_addr: usize,
    pub length: usize,
}

/// Owns the list of outstanding VM reservations for one heap.
///
/// The list is expected to be small (one entry per heap extension, not per
/// allocation) and is traversed linearly, per spec.
#[derive(Default)]
pub struct VmManager {
    reservations: Vec<Reservation>,
}

impl VmManager {
    pub fn new() -> Self {
        Self {
            reservations: Vec::new(),
        }
    }

    /// Round `length` up to the next multiple of [`PAGE_SIZE`]. `length`
    /// must be positive.
    fn round_to_page(length: usize) -> usize {
        (length + PAGE_SIZE - 1) / PAGE_SIZE * PAGE_SIZE
    }

    /// Reserve at least `length` bytes, rounded up to a page multiple.
    /// Returns `(start_addr, rounded_length)`. The reservation list is
    /// extended only on success; on failure the list is left unchanged and
    /// [`AllocError::OutOfMemory`] is returned.
    pub fn reserve(&mut self, length: usize) -> Result<(usize, usize)> {
        if length == 0 {
            return Err(AllocError::InvalidArgument);
        }
        let rounded = Self::round_to_page(length);
        let ptr = unsafe { platform::page_alloc(rounded) };
        if ptr.is_null() {
            return Err(AllocError::OutOfMemory);
        }
        let start_addr = ptr as usize;
        self.reservations.push(Reservation {
            start_addr,
            length: rounded,
        });
        stat_inc!(os_reserve_count);
        stat_add!(os_reserve_bytes, rounded);
        Ok((start_addr, rounded))
    }

    /// Release the reservation starting at `addr`. Fails if no recorded
    /// reservation starts at exactly `addr`, or if `length` disagrees with
    /// the recorded length.
    pub fn release(&mut self, addr: usize, length: usize) -> Result<()> {
        let pos = self
            .reservations
            .iter()
            .position(|r| r.start_addr == addr)
            .ok_or(AllocError::NotFound)?;
        if self.reservations[pos].length != length {
            return Err(AllocError::InvalidArgument);
        }
        let r = self.reservations.remove(pos);
        unsafe { platform::page_dealloc(r.start_addr as *mut u8, r.length) };
        stat_inc!(os_release_count);
        Ok(())
    }

    /// Total bytes reserved across all outstanding reservations.
    pub fn total(&self) -> usize {
        self.reservations.iter().map(|r| r.length).sum()
    }

    /// Number of outstanding reservations.
    pub fn count(&self) -> usize {
        self.reservations.len()
    }

    /// Release every outstanding reservation. Used by [`crate::heap::Heap::cleanup`],
    /// which delegates to this wholesale: merges in the block layer are
    /// purely address-based and can produce blocks spanning the boundary
    /// between two original reservations, so per-block release is not
    /// possible by the time cleanup runs.
    pub fn cleanup(&mut self) {
        for r in self.reservations.drain(..) {
            unsafe { platform::page_dealloc(r.start_addr as *mut u8, r.length) };
        }
    }

    /// Diagnostic listing of every outstanding reservation, written to
    /// stderr.
    pub fn dump(&self) {
        eprintln!("vm: {} reservation(s), {} bytes total", self.count(), self.total());
        for r in &self.reservations {
            eprintln!(
                "  [{:#x}, {:#x}) len={}",
                r.start_addr,
                r.start_addr + r.length,
                r.length
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserve_rounds_up_to_page_multiple() {
        let mut vm = VmManager::new();
        let (addr, len) = vm.reserve(1).unwrap();
        assert_eq!(addr % PAGE_SIZE, 0);
        assert_eq!(len, PAGE_SIZE);
        assert_eq!(vm.total(), PAGE_SIZE);
        assert_eq!(vm.count(), 1);
    }

    #[test]
    fn release_requires_exact_match() {
        let mut vm = VmManager::new();
        let (addr, _) = vm.reserve(PAGE_SIZE).unwrap();
        assert!(vm.release(addr, PAGE_SIZE * 2).is_err());
        assert_eq!(vm.count(), 1);
        assert!(vm.release(addr, PAGE_SIZE).is_ok());
        assert_eq!(vm.count(), 0);
    }

    #[test]
    fn release_unknown_address_fails() {
        let mut vm = VmManager::new();
        assert!(matches!(
            vm.release(0xdead_beef, PAGE_SIZE),
            Err(AllocError::NotFound)
        ));
    }

    #[test]
    fn cleanup_releases_everything() {
        let mut vm = VmManager::new();
        vm.reserve(PAGE_SIZE).unwrap();
        vm.reserve(PAGE_SIZE * 4).unwrap();
        assert_eq!(vm.count(), 2);
        vm.cleanup();
        assert_eq!(vm.count(), 0);
        assert_eq!(vm.total(), 0);
    }
}
