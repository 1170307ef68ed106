//! Alignment contract tests against the public facade.
//!
//! The facade guarantees 8-byte alignment only; this crate makes no
//! provision for caller-requested over-alignment, unlike a `GlobalAlloc`
//! implementation would.

#[test]
fn allocations_are_8_byte_aligned_across_sizes() {
    for &size in &[1, 7, 8, 15, 16, 31, 64, 255, 256, 1024, 4096, 8192] {
        let ptr = ralloc::alloc(size);
        assert!(!ptr.is_null(), "alloc failed for size {size}");
        assert_eq!(ptr as usize % 8, 0, "misaligned for size {size}");
        unsafe { ptr.write_bytes(0xAB, size) };
        assert!(ralloc::free(ptr).is_ok());
    }
}

#[test]
fn zero_size_alloc_returns_null() {
    assert!(ralloc::alloc(0).is_null());
}

#[test]
fn free_of_null_is_ok() {
    assert!(ralloc::free(core::ptr::null_mut()).is_ok());
}

#[test]
fn many_aligned_allocations_do_not_overlap() {
    let size = 64;
    let count = 500;
    let mut ptrs = Vec::with_capacity(count);
    for _ in 0..count {
        let ptr = ralloc::alloc(size);
        assert!(!ptr.is_null());
        assert_eq!(ptr as usize % 8, 0);
        unsafe { ptr.write_bytes(0xDD, size) };
        ptrs.push(ptr);
    }

    for &ptr in &ptrs {
        for i in 0..size {
            assert_eq!(unsafe { *ptr.add(i) }, 0xDD);
        }
    }

    for ptr in ptrs {
        assert!(ralloc::free(ptr).is_ok());
    }
}
