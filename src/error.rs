//! Error taxonomy for the allocator.

use thiserror::Error;

/// All recoverable failure modes of the VM, block, heap, and facade layers.
///
/// Every fallible operation in this crate returns `Result<T, AllocError>`;
/// nothing here is surfaced as a panic or process abort. Diagnostic-layer
/// policy (abort vs. continue on [`AllocError::Corruption`]) belongs to the
/// application, not this crate.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
    /// A null pointer where non-null was required, a zero size where a
    /// positive one was required, a misaligned split point, or an
    /// unrecognized policy name.
    #[error("invalid argument")]
    InvalidArgument,

    /// A VM reservation or metadata record allocation failed.
    #[error("out of memory")]
    OutOfMemory,

    /// `free` was called on an address not inside any known block.
    #[error("address not found in any block")]
    NotFound,

    /// `free` was called on a block whose state is already FREE.
    #[error("double free")]
    DoubleFree,

    /// A facade operation was invoked with no heap, and lazy init was
    /// disabled or had previously failed.
    #[error("allocator not initialised")]
    NotInitialised,

    /// An operation was invalid for the current state (e.g. `release` on a
    /// reservation that doesn't match, or double `cleanup`).
    #[error("wrong state")]
    WrongState,

    /// `verify` detected an invariant violation.
    #[error("heap corruption detected")]
    Corruption,
}

pub type Result<T> = core::result::Result<T, AllocError>;
