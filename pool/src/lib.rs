//! rpool: a bounded-queue worker thread pool with a cleanup-aware task
//! lifecycle and a quiescence primitive.
//!
//! The hard engineering lives in the queue's condition-variable protocol
//! (backpressure, the distinction between "queue empty" and "all work
//! drained"), the pool's state machine, and dynamic resize — not in the
//! workloads a caller might run on top of it.
//!
//! ```ignore
//! let pool = rpool::ThreadPool::create(rpool::PoolConfig {
//!     num_threads: 4,
//!     queue_size: 100,
//!     ..Default::default()
//! })?;
//! pool.submit(|| println!("hello from a worker"), None)?;
//! pool.wait_all();
//! pool.destroy()?;
//! ```

mod error;
mod pool;
mod queue;
mod task;
mod worker;

pub use error::{PoolError, QueueError};
pub use pool::{PoolConfig, PoolSnapshot, PoolState, ThreadPool};
pub use queue::QueueSnapshot;
pub use worker::WorkerSnapshot;
