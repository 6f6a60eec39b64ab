//! Task handle / task group.
//!
//! A [`Handle`] aggregates outstanding asynchronous work and supports a
//! collective wait. The bookkeeping is a reference-counted atomic counter
//! behind a condvar: increment on submission, decrement on task exit, block
//! on the counter reaching zero.
//!
//! `Handle` itself holds no knowledge of *what* it is waiting for — dispatch,
//! bulk for-each, and dma all call [`Handle::submit`] before shipping work
//! and [`Handle::complete`] when the shipped work (and anything it
//! recursively submitted to the same handle) finishes.

use crate::error::{Result, RuntimeError};
use crate::observability::{emit, DispatchEvent};
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Default)]
struct Inner {
    outstanding: Mutex<u64>,
    idle: Condvar,
    errors: Mutex<Vec<RuntimeError>>,
}

/// A task-group token. Created empty via [`Handle::create`], grows as
/// asynchronous work is submitted to it, and is drained by
/// [`Handle::wait_for_completion`].
///
/// `Handle` is `Clone`: every clone shares the same underlying counter, so a
/// shipped closure that receives a `Handle` parameter observes the same
/// group as its submitter.
#[derive(Clone, Debug)]
pub struct Handle {
    id: u64,
    inner: Arc<Inner>,
}

impl Handle {
    /// A new, empty task group.
    pub fn create() -> Self {
        Handle {
            id: NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed),
            inner: Arc::new(Inner::default()),
        }
    }

    /// Process-wide-unique identifier, stable for the handle's lifetime
    /// (including across clones).
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Registers one unit of outstanding work. Dispatch/for-each/dma call
    /// this before the caller resumes: the count increments before control
    /// returns to the submitter.
    pub fn submit(&self) {
        let mut count = self.inner.outstanding.lock();
        *count += 1;
    }

    /// Retires one unit of outstanding work, submitted by a task that has
    /// finished (including everything it recursively submitted to this
    /// same handle). Wakes any waiter once the count reaches zero.
    pub fn complete(&self) {
        let mut count = self.inner.outstanding.lock();
        debug_assert!(*count > 0, "Handle::complete called more times than submit");
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.inner.idle.notify_all();
        }
    }

    /// The number of tasks currently registered but not yet retired.
    pub fn outstanding(&self) -> u64 {
        *self.inner.outstanding.lock()
    }

    /// Blocks until every task submitted to this handle before the call
    /// (and everything those tasks recursively submit to the same handle)
    /// has completed. On return the handle is empty and may be reused.
    ///
    /// A failing user kernel never aborts the wait silently: the first
    /// error recorded by any task on this handle (in submission
    /// order is not guaranteed, only "first observed") is returned here and
    /// the error queue is cleared so the handle is ready for its next
    /// round.
    pub fn wait_for_completion(&self) -> Result<()> {
        emit(DispatchEvent::HandleWaitEnter {
            handle_id: self.id,
            outstanding: self.outstanding(),
        });
        {
            let mut count = self.inner.outstanding.lock();
            while *count > 0 {
                self.inner.idle.wait(&mut count);
            }
        }
        let mut errors = self.inner.errors.lock();
        let result = if let Some(first) = errors.pop() {
            errors.clear();
            Err(first)
        } else {
            Ok(())
        };
        emit(DispatchEvent::HandleWaitExit {
            handle_id: self.id,
            ok: result.is_ok(),
        });
        result
    }

    /// Records a failure produced by a task running under this handle, to
    /// be surfaced at the next [`wait_for_completion`](Self::wait_for_completion).
    /// Never panics, never drops the error: algorithms must not swallow
    /// user kernel failures.
    pub fn record_error(&self, err: RuntimeError) {
        self.inner.errors.lock().push(err);
    }

    /// Like [`wait_for_completion`](Self::wait_for_completion), but returns
    /// an error instead of panicking if the caller attempts to drop a
    /// handle with outstanding work without having waited — used by RAII
    /// guards that want to surface `HandleDestroyedWithOutstanding` instead
    /// of silently leaking tasks.
    pub fn check_drained(&self) -> Result<()> {
        let outstanding = self.outstanding();
        if outstanding == 0 {
            Ok(())
        } else {
            Err(RuntimeError::HandleDestroyedWithOutstanding {
                handle_id: self.id,
                outstanding,
            })
        }
    }
}

/// A scope guard that asserts its [`Handle`] is drained when dropped. Use
/// this instead of a bare `Handle` whenever a leaked outstanding task would
/// otherwise be silently ignored.
pub struct DrainGuard(pub Handle);

impl Drop for DrainGuard {
    fn drop(&mut self) {
        if let Err(err) = self.0.check_drained() {
            // A handle going out of scope with outstanding work is a
            // programming error; we cannot propagate a Result from Drop,
            // so this is the documented fatal-abort path.
            panic!("{err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn wait_blocks_until_drained() {
        let h = Handle::create();
        h.submit();
        h.submit();
        let h2 = h.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            h2.complete();
            h2.complete();
        });
        h.wait_for_completion().unwrap();
        assert_eq!(h.outstanding(), 0);
    }

    #[test]
    fn empty_handle_waits_immediately() {
        let h = Handle::create();
        h.wait_for_completion().unwrap();
        assert_eq!(h.outstanding(), 0);
    }

    #[test]
    fn reused_handle_tracks_independent_rounds() {
        let h = Handle::create();
        h.submit();
        h.complete();
        h.wait_for_completion().unwrap();
        h.submit();
        assert_eq!(h.outstanding(), 1);
        h.complete();
        h.wait_for_completion().unwrap();
    }

    #[test]
    fn wait_surfaces_recorded_error() {
        let h = Handle::create();
        h.submit();
        h.record_error(RuntimeError::UserKernelFailed {
            locality: crate::locality::Locality::new(1),
            message: "boom".into(),
        });
        h.complete();
        assert!(h.wait_for_completion().is_err());
        // the queue was cleared, and the handle is ready for reuse.
        h.submit();
        h.complete();
        assert!(h.wait_for_completion().is_ok());
    }
}
