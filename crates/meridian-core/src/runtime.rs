//! Runtime aggregation, concurrency primitives, and configuration.
//!
//! [`Runtime`] is the single trait algorithms and user code are generic
//! over: it bundles locality membership, the dispatch substrate, bulk
//! for-each, and dma behind one bound. Nothing here picks a transport — the
//! concrete process-set (threaded emulator, message-passing layer, actor
//! framework) is an external collaborator satisfying this trait.

use crate::dispatch::Dispatcher;
use crate::dma::Dma;
use crate::foreach::ForEachDispatcher;
use crate::locality::LocalityTopology;
use crate::policy::ExecutionPolicy;
use parking_lot::{Condvar, Mutex, MutexGuard};

/// Tuning knobs read once at [`crate::bootstrap::initialize`] and handed to
/// the host `Runtime`.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// Worker threads per locality. `None` defers to
    /// [`std::thread::available_parallelism`].
    pub concurrency: Option<usize>,
    /// The policy algorithms use when the caller omits one explicitly
    /// (always `sequential_across_localities` unless overridden here).
    pub default_policy: ExecutionPolicy,
    /// A hint for how many elements a single dma call should move before
    /// a host transport chooses to chunk it; purely advisory.
    pub dma_chunk_hint: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            concurrency: None,
            default_policy: ExecutionPolicy::SequentialAcrossLocalities,
            dma_chunk_hint: 1 << 16,
        }
    }
}

impl RuntimeConfig {
    /// Resolves [`concurrency`](Self::concurrency), falling back to the
    /// platform's reported parallelism (or `1` if that query fails).
    pub fn resolved_concurrency(&self) -> usize {
        self.concurrency.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}

/// The full process-set capability set a host must provide: locality
/// membership, dispatch, bulk for-each, and one-sided copy, plus the
/// per-process concurrency driver below.
pub trait Runtime: LocalityTopology + Dispatcher + ForEachDispatcher + Dma + Concurrency {}

impl<T> Runtime for T where T: LocalityTopology + Dispatcher + ForEachDispatcher + Dma + Concurrency {}

/// The local thread pool capability a transport must supply: worker count
/// and an explicit yield point for spin loops.
pub trait Concurrency {
    /// Worker-thread count on this locality.
    fn concurrency(&self) -> usize;

    /// Cooperatively yields the calling worker thread.
    fn yield_now(&self) {
        std::thread::yield_now();
    }
}

/// A locality-local mutual exclusion primitive. Explicitly *not*
/// transferable between localities: it wraps a plain
/// [`parking_lot::Mutex`] and exists only to protect locally-shared state a
/// kernel touches from multiple worker threads; container concurrency
/// control is the container's own responsibility, but ordinary local
/// critical sections use this.
pub struct Lock(Mutex<()>);

impl Default for Lock {
    fn default() -> Self {
        Lock::new()
    }
}

impl Lock {
    pub fn new() -> Self {
        Lock(Mutex::new(()))
    }

    pub fn lock(&self) -> MutexGuard<'_, ()> {
        self.0.lock()
    }
}

/// A condition variable paired with the same locality-local restriction as
/// [`Lock`]; used by in-process test runtimes to implement
/// [`crate::handle::Handle`]-style waits without reaching back into this
/// crate's own handle machinery.
#[derive(Default)]
pub struct LocalCondvar(Condvar);

impl LocalCondvar {
    pub fn new() -> Self {
        LocalCondvar(Condvar::new())
    }

    pub fn notify_all(&self) {
        self.0.notify_all();
    }

    pub fn wait<'a, T>(&self, guard: &mut MutexGuard<'a, T>) {
        self.0.wait(guard)
    }
}
