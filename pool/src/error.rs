//! Error taxonomy for the bounded queue and thread pool.

use thiserror::Error;

/// Failure modes of [`crate::queue::TaskQueue`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// `submit` or `pop_and_execute` called on a queue that has already
    /// been `destroy`ed.
    #[error("queue already destroyed")]
    WrongState,
}

/// Failure modes of [`crate::pool::ThreadPool`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    /// `submit` on a non-RUNNING pool, or `destroy`/`resize` on a pool
    /// already STOPPING/STOPPED.
    #[error("pool is not in a valid state for this operation")]
    WrongState,

    /// A worker thread failed to spawn (OS thread creation failure).
    #[error("failed to spawn worker thread")]
    OutOfMemory,

    /// `resize` was asked to shrink by more workers than currently exist.
    #[error("invalid resize argument")]
    InvalidArgument,

    /// The underlying queue reported an error.
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),
}
