//! Worker lifecycle: spawn, main loop, exit.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::queue::{PopOutcome, TaskQueue};

/// Per-worker state visible to the pool across threads. Cheap to clone
/// (each field is its own `Arc`) so the pool can read a worker's counters
/// without taking any lock the worker itself might be blocked on.
#[derive(Clone)]
pub(crate) struct WorkerHandle {
    pub(crate) id: usize,
    pub(crate) should_exit: Arc<AtomicBool>,
    pub(crate) is_active: Arc<AtomicBool>,
    pub(crate) tasks_completed: Arc<AtomicU64>,
}

/// Owns the actual `JoinHandle`; kept separate from [`WorkerHandle`] so the
/// handle (not `Send`-constrained the same way) can be taken out of the
/// pool's worker array independently during shrink, while the counters
/// remain readable.
pub(crate) struct WorkerSlot {
    pub(crate) info: WorkerHandle,
    pub(crate) join: Option<JoinHandle<()>>,
}

/// A point-in-time snapshot of one worker, for `print_info`.
#[derive(Debug, Clone, Copy)]
pub struct WorkerSnapshot {
    pub id: usize,
    pub tasks_completed: u64,
    pub is_active: bool,
}

/// The worker main loop: while not told to exit, mark active,
/// pop-and-execute one task, mark inactive. `should_exit` is observed by
/// reference on every wakeup, never copied, so a flag set while the worker
/// sleeps in `pop_and_execute`'s wait is never missed.
fn worker_main(queue: Arc<TaskQueue>, pool_shutdown: Arc<AtomicBool>, info: WorkerHandle) {
    loop {
        if info.should_exit.load(Ordering::SeqCst) {
            break;
        }
        info.is_active.store(true, Ordering::SeqCst);
        let outcome = queue.pop_and_execute(|| {
            pool_shutdown.load(Ordering::SeqCst) || info.should_exit.load(Ordering::SeqCst)
        });
        info.is_active.store(false, Ordering::SeqCst);
        match outcome {
            PopOutcome::ShouldStop => break,
            PopOutcome::Executed => {
                info.tasks_completed.fetch_add(1, Ordering::SeqCst);
            }
        }
    }
}

/// Spawn one worker thread. `stack_size` of `None` uses the platform
/// default. `daemon` threads have their `JoinHandle` dropped immediately
/// after spawn — in Rust, dropping a `JoinHandle` detaches the thread,
/// which keeps running on its own; this is the closest equivalent to a
/// daemon thread the standard library offers, since there is no true
/// fire-and-forget non-joinable thread primitive.
pub(crate) fn spawn_worker(
    id: usize,
    queue: Arc<TaskQueue>,
    pool_shutdown: Arc<AtomicBool>,
    stack_size: Option<usize>,
    daemon: bool,
) -> std::io::Result<WorkerSlot> {
    let info = WorkerHandle {
        id,
        should_exit: Arc::new(AtomicBool::new(false)),
        is_active: Arc::new(AtomicBool::new(false)),
        tasks_completed: Arc::new(AtomicU64::new(0)),
    };
    let thread_info = info.clone();

    let mut builder = std::thread::Builder::new().name(format!("rpool-worker-{id}"));
    if let Some(size) = stack_size {
        builder = builder.stack_size(size);
    }
    let handle = builder.spawn(move || worker_main(queue, pool_shutdown, thread_info))?;

    Ok(WorkerSlot {
        info,
        join: if daemon { None } else { Some(handle) },
    })
}
