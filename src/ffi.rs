//! C-ABI exports of the allocator facade.
//!
//! Gated behind `features = ["ffi"]`. With the `testing` feature, export
//! names are left unmangled (plain Rust names) so multiple copies of this
//! crate can be linked into one test binary without symbol collisions;
//! without it, exports take the plain `ralloc_*` names external code links
//! against.

use crate::error::AllocError;
use crate::facade;

#[cfg_attr(not(feature = "testing"), unsafe(export_name = "ralloc_alloc"))]
pub unsafe extern "C" fn ralloc_alloc(size: usize) -> *mut u8 {
    facade::alloc(size)
}

#[cfg_attr(not(feature = "testing"), unsafe(export_name = "ralloc_free"))]
pub unsafe extern "C" fn ralloc_free(ptr: *mut u8) -> i32 {
    result_to_code(facade::free(ptr))
}

#[cfg_attr(not(feature = "testing"), unsafe(export_name = "ralloc_init"))]
pub unsafe extern "C" fn ralloc_init(enable_concurrency: i32) -> i32 {
    result_to_code(facade::init(enable_concurrency != 0))
}

#[cfg_attr(not(feature = "testing"), unsafe(export_name = "ralloc_cleanup"))]
pub unsafe extern "C" fn ralloc_cleanup() -> i32 {
    result_to_code(facade::cleanup())
}

#[cfg_attr(not(feature = "testing"), unsafe(export_name = "ralloc_verify"))]
pub unsafe extern "C" fn ralloc_verify() -> i32 {
    result_to_code(facade::verify())
}

#[cfg_attr(not(feature = "testing"), unsafe(export_name = "ralloc_dump"))]
pub unsafe extern "C" fn ralloc_dump() {
    facade::dump();
}

#[cfg_attr(not(feature = "testing"), unsafe(export_name = "ralloc_stats"))]
pub unsafe extern "C" fn ralloc_stats(
    out_allocated: *mut usize,
    out_free: *mut usize,
    out_peak: *mut usize,
) -> i32 {
    match facade::heap_stats() {
        Ok((allocated, free, peak)) => {
            if !out_allocated.is_null() {
                unsafe { *out_allocated = allocated };
            }
            if !out_free.is_null() {
                unsafe { *out_free = free };
            }
            if !out_peak.is_null() {
                unsafe { *out_peak = peak };
            }
            0
        }
        Err(e) => error_code(e),
    }
}

fn result_to_code(result: crate::error::Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => error_code(e),
    }
}

fn error_code(e: AllocError) -> i32 {
    match e {
        AllocError::InvalidArgument => 1,
        AllocError::OutOfMemory => 2,
        AllocError::NotFound => 3,
        AllocError::DoubleFree => 4,
        AllocError::NotInitialised => 5,
        AllocError::WrongState => 6,
        AllocError::Corruption => 7,
    }
}
