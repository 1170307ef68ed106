//! ralloc: a user-space general-purpose allocator atop page-granular
//! virtual-memory reservations.
//!
//! Three layers, thinnest to thickest:
//! - [`vm`]: page-aligned reservations from the OS (mmap/VirtualAlloc)
//! - [`block`]: metadata for contiguous sub-regions (FREE/ALLOCATED, split/merge)
//! - [`heap`]: the block list, allocation policy, and stats, under one mutex
//!
//! [`alloc`]/[`free`] are the process-wide facade: a lazily-initialized
//! singleton heap, double-checked on every call.
//!
//! # Usage
//!
//! ```ignore
//! let p = ralloc::alloc(1024);
//! assert!(!p.is_null());
//! ralloc::free(p).unwrap();
//! ```

#[macro_use]
pub mod macros;

pub mod block;
pub mod error;
mod facade;
#[cfg(feature = "ffi")]
pub mod ffi;
pub mod heap;
pub mod platform;
pub mod policy;
pub mod stats;
pub mod sync;
#[cfg(feature = "trace")]
pub mod trace;
pub mod vm;

/// Page size used for VM reservations. 4 KiB matches the typical Linux/x86_64
/// system page size; [`vm::VmManager::reserve`] rounds every request up to a
/// multiple of it.
pub const PAGE_SHIFT: usize = 12;
pub const PAGE_SIZE: usize = 1 << PAGE_SHIFT;

pub use error::AllocError;
pub use facade::{alloc, cleanup, dump, free, heap_stats, init, leak_check, verify};
pub use policy::AllocPolicy;
