//! Task records: a single-shot closure plus an optional cleanup closure.
//!
//! The source this crate is grounded on passes an opaque function pointer,
//! an untyped argument, and a separate cleanup pointer. Here a task owns a
//! closure's captured state directly, which eliminates the common leak
//! shape where `submit` succeeded but the caller forgot to arrange cleanup:
//! `func` and `cleanup` stay two separate closures (not folded into one)
//! because cleanup must still run when `func` never executes — a task still
//! queued at `destroy()` time is discarded without running, but its cleanup
//! is called exactly once regardless.

pub(crate) struct Task {
    func: Box<dyn FnOnce() + Send>,
    cleanup: Option<Box<dyn FnOnce() + Send>>,
}

impl Task {
    pub(crate) fn new(
        func: impl FnOnce() + Send + 'static,
        cleanup: Option<Box<dyn FnOnce() + Send>>,
    ) -> Self {
        Self {
            func: Box::new(func),
            cleanup,
        }
    }

    /// Run `func`, then `cleanup` if present. Consumes the task.
    pub(crate) fn execute(self) {
        (self.func)();
        if let Some(cleanup) = self.cleanup {
            cleanup();
        }
    }

    /// Run only `cleanup`, without running `func`. Used to drain tasks
    /// still queued when the pool is destroyed.
    pub(crate) fn discard(self) {
        if let Some(cleanup) = self.cleanup {
            cleanup();
        }
    }
}
