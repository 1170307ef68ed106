//! The thread pool: worker lifecycle, the pool state machine, submit,
//! quiescence, destroy, and resize.
//!
//! ```text
//! CREATED ──create()──▶ RUNNING ──destroy()──▶ STOPPING ──joined──▶ STOPPED
//!                          │
//!                          └──shutdown()──▶ (wait-all then destroy path)
//! ```
//!
//! Lock ordering: never more than one of {queue mutex, pool state mutex} is
//! held at once. Grow and shrink release the state mutex before
//! broadcasting on the queue's `not_empty`, then re-acquire only to publish
//! the new worker count — read shared flag, release, broadcast on the
//! other mutex, re-acquire only to publish the next step.

use log::{debug, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};

use crate::error::PoolError;
use crate::queue::{QueueSnapshot, TaskQueue};
use crate::task::Task;
use crate::worker::{spawn_worker, WorkerSnapshot, WorkerSlot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    Created,
    Running,
    Stopping,
    Stopped,
}

/// Configuration for [`ThreadPool::create`].
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub num_threads: usize,
    /// 0 means unbounded.
    pub queue_size: usize,
    /// `None` uses the platform default stack size.
    pub stack_size: Option<usize>,
    pub daemon_threads: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            num_threads: 4,
            queue_size: 0,
            stack_size: None,
            daemon_threads: false,
        }
    }
}

struct Inner {
    state: PoolState,
    workers: Vec<WorkerSlot>,
}

/// A snapshot of the whole pool, for `print_info`.
#[derive(Debug, Clone)]
pub struct PoolSnapshot {
    pub state: PoolState,
    pub workers: Vec<WorkerSnapshot>,
    pub queue: QueueSnapshot,
}

pub struct ThreadPool {
    queue: Arc<TaskQueue>,
    shutdown: Arc<AtomicBool>,
    inner: Mutex<Inner>,
    state_cv: Condvar,
    stack_size: Option<usize>,
    daemon_threads: bool,
}

impl ThreadPool {
    /// Allocate worker arrays, construct the queue bounded at
    /// `config.queue_size` (0 ⇒ unbounded), and spawn `config.num_threads`
    /// workers. On a partial spawn failure, tears down everything already
    /// started and returns [`PoolError::OutOfMemory`].
    pub fn create(config: PoolConfig) -> Result<Self, PoolError> {
        let queue = Arc::new(TaskQueue::new(config.queue_size));
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(config.num_threads);
        for id in 0..config.num_threads {
            match spawn_worker(
                id,
                queue.clone(),
                shutdown.clone(),
                config.stack_size,
                config.daemon_threads,
            ) {
                Ok(slot) => workers.push(slot),
                Err(e) => {
                    warn!("worker {id} failed to spawn ({e}), rolling back {} already-spawned workers", workers.len());
                    for w in &workers {
                        w.info.should_exit.store(true, Ordering::SeqCst);
                    }
                    queue.wake_all_waiters();
                    for w in workers {
                        if let Some(h) = w.join {
                            let _ = h.join();
                        }
                    }
                    return Err(PoolError::OutOfMemory);
                }
            }
        }
        debug!("pool created with {} workers", config.num_threads);

        let pool = Self {
            queue,
            shutdown,
            inner: Mutex::new(Inner {
                state: PoolState::Running,
                workers,
            }),
            state_cv: Condvar::new(),
            stack_size: config.stack_size,
            daemon_threads: config.daemon_threads,
        };
        pool.state_cv.notify_all();
        Ok(pool)
    }

    /// Refuses unless state is RUNNING; otherwise delegates to the queue.
    pub fn submit(
        &self,
        func: impl FnOnce() + Send + 'static,
        cleanup: Option<Box<dyn FnOnce() + Send>>,
    ) -> Result<(), PoolError> {
        {
            let inner = self.inner.lock().unwrap();
            if inner.state != PoolState::Running {
                return Err(PoolError::WrongState);
            }
        }
        self.queue.submit(Task::new(func, cleanup))?;
        Ok(())
    }

    /// Block until the queue and every worker's active task are drained.
    pub fn wait_all(&self) {
        self.queue.wait_empty();
    }

    /// Set state STOPPING and the shutdown flag, wake every worker waiting
    /// in the queue, join them all, drain and discard any remaining tasks,
    /// then set state STOPPED. Does not abort in-flight tasks — a task
    /// already running completes before its worker observes shutdown.
    pub fn destroy(&self) -> Result<(), PoolError> {
        {
            let mut inner = self.inner.lock().unwrap();
            if inner.state == PoolState::Stopping || inner.state == PoolState::Stopped {
                return Err(PoolError::WrongState);
            }
            inner.state = PoolState::Stopping;
        }
        debug!("pool destroy: signalling shutdown to all workers");
        self.shutdown.store(true, Ordering::SeqCst);
        self.queue.wake_all_waiters();

        let workers = {
            let mut inner = self.inner.lock().unwrap();
            std::mem::take(&mut inner.workers)
        };
        for w in workers {
            if let Some(h) = w.join {
                let _ = h.join();
            }
        }
        self.queue.destroy();

        let mut inner = self.inner.lock().unwrap();
        inner.state = PoolState::Stopped;
        drop(inner);
        self.state_cv.notify_all();
        Ok(())
    }

    /// `wait_all()` then `destroy()` — always waits for in-flight work
    /// before tearing the pool down.
    pub fn shutdown(&self) -> Result<(), PoolError> {
        self.wait_all();
        self.destroy()
    }

    /// Dispatch to grow or shrink depending on whether `n` is above or
    /// below the current worker count. `n` equal to the current count is a
    /// no-op.
    pub fn resize(&self, n: usize) -> Result<(), PoolError> {
        let current = self.inner.lock().unwrap().workers.len();
        match n.cmp(&current) {
            std::cmp::Ordering::Greater => self.grow(n - current),
            std::cmp::Ordering::Less => self.shrink(current - n),
            std::cmp::Ordering::Equal => Ok(()),
        }
    }

    /// Spawn `additional` new workers. On a spawn failure midway through,
    /// marks the partially-spawned new workers' `should_exit`, broadcasts
    /// `not_empty` so they wake and observe it, joins them, and rolls the
    /// worker count back to its pre-grow value.
    fn grow(&self, additional: usize) -> Result<(), PoolError> {
        let next_id = self.inner.lock().unwrap().workers.len();
        let mut new_workers = Vec::with_capacity(additional);
        for offset in 0..additional {
            match spawn_worker(
                next_id + offset,
                self.queue.clone(),
                self.shutdown.clone(),
                self.stack_size,
                self.daemon_threads,
            ) {
                Ok(slot) => new_workers.push(slot),
                Err(_) => {
                    for w in &new_workers {
                        w.info.should_exit.store(true, Ordering::SeqCst);
                    }
                    self.queue.wake_all_waiters();
                    for w in new_workers {
                        if let Some(h) = w.join {
                            let _ = h.join();
                        }
                    }
                    return Err(PoolError::OutOfMemory);
                }
            }
        }

        let mut inner = self.inner.lock().unwrap();
        inner.workers.extend(new_workers);
        let total = inner.workers.len();
        drop(inner);
        debug!("pool grown by {additional} workers, now {total}");
        self.state_cv.notify_all();
        Ok(())
    }

    /// Mark the trailing `count` workers' `should_exit`, release the state
    /// mutex, broadcast `not_empty` so they wake even if idle, join them
    /// outside any lock, then re-acquire the state mutex only to publish
    /// the shrunk worker array. A worker mid-task finishes that task before
    /// observing the flag; shrink never targets workers by identity, only
    /// by trailing index.
    fn shrink(&self, count: usize) -> Result<(), PoolError> {
        // Mark the trailing `count` workers and take just their join
        // handles, leaving the slots themselves in place so `num_threads`
        // (derived from `inner.workers.len()`) does not drop until they
        // have actually been joined.
        let handles: Vec<_> = {
            let mut inner = self.inner.lock().unwrap();
            if count > inner.workers.len() {
                return Err(PoolError::InvalidArgument);
            }
            let split_at = inner.workers.len() - count;
            inner.workers[split_at..]
                .iter_mut()
                .map(|w| {
                    w.info.should_exit.store(true, Ordering::SeqCst);
                    w.join.take()
                })
                .collect()
        };

        self.queue.wake_all_waiters();

        for h in handles {
            if let Some(h) = h {
                let _ = h.join();
            }
        }

        let mut inner = self.inner.lock().unwrap();
        let new_len = inner.workers.len() - count;
        inner.workers.truncate(new_len);
        drop(inner);
        self.state_cv.notify_all();
        Ok(())
    }

    /// Diagnostic snapshot of pool state, every worker, and the queue.
    pub fn print_info(&self) -> PoolSnapshot {
        let inner = self.inner.lock().unwrap();
        let workers = inner
            .workers
            .iter()
            .map(|w| WorkerSnapshot {
                id: w.info.id,
                tasks_completed: w.info.tasks_completed.load(Ordering::SeqCst),
                is_active: w.info.is_active.load(Ordering::SeqCst),
            })
            .collect();
        PoolSnapshot {
            state: inner.state,
            workers,
            queue: self.queue.snapshot(),
        }
    }

    pub fn num_threads(&self) -> usize {
        self.inner.lock().unwrap().workers.len()
    }

    pub fn state(&self) -> PoolState {
        self.inner.lock().unwrap().state
    }
}

impl Drop for ThreadPool {
    /// Best-effort: a pool dropped without an explicit `destroy`/`shutdown`
    /// still stops its workers rather than leaking threads.
    fn drop(&mut self) {
        if self.inner.lock().unwrap().state != PoolState::Stopped {
            let _ = self.destroy();
        }
    }
}
