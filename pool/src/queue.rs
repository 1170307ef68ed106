//! Bounded FIFO task queue shared by many producers and many consumers.
//!
//! Three condition variables, not four: the source's `empty` is
//! superseded by `all_done` (it already notes as much) and is dropped here.
//! `not_empty` guards `count > 0 || shutdown_requested`, `not_full` guards
//! `count < max_count`, `all_done` guards `count == 0 && active_tasks == 0`
//! (quiescence). Every wait loops on its predicate — spurious wakeups are
//! tolerated — and every signal happens while holding the mutex that guards
//! the predicate.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

use crate::error::QueueError;
use crate::task::Task;

/// Outcome of one [`TaskQueue::pop_and_execute`] step.
pub(crate) enum PopOutcome {
    /// A task was dequeued, run, and its cleanup (if any) invoked.
    Executed,
    /// The predicate passed to `pop_and_execute` became true with the
    /// queue empty; the caller should stop looping.
    ShouldStop,
}

struct State {
    tasks: VecDeque<Task>,
    max_count: usize,
    total_enqueued: u64,
    total_dequeued: u64,
    total_processed: u64,
    active_tasks: usize,
    destroyed: bool,
}

/// A point-in-time snapshot of the queue's counters, for diagnostics.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueueSnapshot {
    pub count: usize,
    pub active_tasks: usize,
    pub total_enqueued: u64,
    pub total_dequeued: u64,
    pub total_processed: u64,
}

pub(crate) struct TaskQueue {
    state: Mutex<State>,
    not_empty: Condvar,
    not_full: Condvar,
    all_done: Condvar,
}

impl TaskQueue {
    /// `max_count == 0` means unbounded.
    pub(crate) fn new(max_count: usize) -> Self {
        Self {
            state: Mutex::new(State {
                tasks: VecDeque::new(),
                max_count,
                total_enqueued: 0,
                total_dequeued: 0,
                total_processed: 0,
                active_tasks: 0,
                destroyed: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            all_done: Condvar::new(),
        }
    }

    /// Append `task` to the tail. Blocks on `not_full` while the queue is
    /// at capacity (the backpressure contract) — this is the producer-side
    /// suspension point.
    pub(crate) fn submit(&self, task: Task) -> Result<(), QueueError> {
        let mut state = self.state.lock().unwrap();
        loop {
            if state.destroyed {
                return Err(QueueError::WrongState);
            }
            if state.max_count == 0 || state.tasks.len() < state.max_count {
                break;
            }
            state = self.not_full.wait(state).unwrap();
        }
        state.tasks.push_back(task);
        state.total_enqueued += 1;
        self.not_empty.notify_one();
        Ok(())
    }

    /// The canonical worker step. Waits on `not_empty` while the queue is
    /// empty and `should_stop()` is false. If woken with the queue still
    /// empty and `should_stop()` true, returns [`PopOutcome::ShouldStop`].
    /// Otherwise detaches the head, runs it outside the lock, and
    /// broadcasts `all_done` if this was the task that drained the queue.
    ///
    /// `should_stop` is a predicate rather than a single shared flag so a
    /// worker can be asked to exit individually (during a pool resize)
    /// without requiring the whole pool's shutdown flag to be set — the
    /// caller merges "pool is shutting down" and "this worker specifically
    /// should exit" into one closure.
    pub(crate) fn pop_and_execute(&self, should_stop: impl Fn() -> bool) -> PopOutcome {
        let task = {
            let mut state = self.state.lock().unwrap();
            loop {
                if !state.tasks.is_empty() {
                    break;
                }
                if should_stop() {
                    return PopOutcome::ShouldStop;
                }
                state = self.not_empty.wait(state).unwrap();
            }
            let task = state.tasks.pop_front().unwrap();
            state.total_dequeued += 1;
            state.total_processed += 1;
            state.active_tasks += 1;
            let signal_not_full = state.max_count > 0;
            drop(state);
            if signal_not_full {
                self.not_full.notify_one();
            }
            task
        };

        task.execute();

        let mut state = self.state.lock().unwrap();
        state.active_tasks -= 1;
        if state.tasks.is_empty() && state.active_tasks == 0 {
            self.all_done.notify_all();
        }
        PopOutcome::Executed
    }

    /// Block until `count == 0 && active_tasks == 0`.
    pub(crate) fn wait_empty(&self) {
        let mut state = self.state.lock().unwrap();
        while !state.tasks.is_empty() || state.active_tasks > 0 {
            state = self.all_done.wait(state).unwrap();
        }
    }

    pub(crate) fn count(&self) -> usize {
        self.state.lock().unwrap().tasks.len()
    }

    pub(crate) fn snapshot(&self) -> QueueSnapshot {
        let state = self.state.lock().unwrap();
        QueueSnapshot {
            count: state.tasks.len(),
            active_tasks: state.active_tasks,
            total_enqueued: state.total_enqueued,
            total_dequeued: state.total_dequeued,
            total_processed: state.total_processed,
        }
    }

    /// Wake every thread waiting on `not_empty`, without otherwise touching
    /// queue state. Used by the pool both on full shutdown (after setting
    /// its shutdown flag) and on a targeted resize (after marking only the
    /// departing workers' own exit flags) — in both cases the predicate
    /// each worker re-checks on waking is its own, not the queue's.
    pub(crate) fn wake_all_waiters(&self) {
        self.not_empty.notify_all();
    }

    /// Drain and discard every remaining task (running cleanup for each,
    /// never `func`), then wake every sleeper on all three condition
    /// variables so nothing blocks forever past this point.
    pub(crate) fn destroy(&self) {
        let drained: Vec<Task> = {
            let mut state = self.state.lock().unwrap();
            state.destroyed = true;
            state.tasks.drain(..).collect()
        };
        for task in drained {
            task.discard();
        }
        self.not_empty.notify_all();
        self.not_full.notify_all();
        self.all_done.notify_all();
    }
}
