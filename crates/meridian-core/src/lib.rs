//! Locality-addressed task dispatch and distributed-range algorithm
//! kernels.
//!
//! A program built on this crate runs as a fixed set of *localities*
//! (`N`, fixed for the process set's lifetime) that each own a partition
//! of some distributed data structure. Work moves to the data: a caller
//! ships a stateless kernel to the locality that holds the slice it needs,
//! rather than pulling the slice to the caller.
//!
//! Three layers, leaves first:
//!
//! - [`locality`], [`handle`], [`dispatch`], [`foreach`], [`dma`] — the
//!   substrate. Locality identity and membership, a task-group handle for
//!   collective waits, synchronous/asynchronous remote dispatch, bulk
//!   parallel for-loops, and one-sided remote memory copy.
//! - [`iter`] — the distributed-iterator contract: given a pair of global
//!   iterators over a partitioned container, which localities does the
//!   range touch, what is each locality's local sub-range, and how does a
//!   local position lift back into a global one.
//! - [`algorithms`] — search, elementwise, reduction, and scan kernels
//!   implemented once against the iterator contract and the dispatch
//!   substrate, each under either of the two [`policy::ExecutionPolicy`]
//!   tags.
//!
//! [`runtime::Runtime`] is the single trait a host transport implements to
//! plug in underneath all three layers; [`testing::LoopbackRuntime`] is an
//! in-process instance of one, used by this crate's own tests and
//! available to downstream crates that want to exercise [`algorithms`]
//! without a real multi-process transport. [`bootstrap`] drives the
//! initialize/run-entrypoint/finalize sequence around a concrete runtime.

pub mod algorithms;
pub mod bootstrap;
pub mod dispatch;
pub mod dma;
pub mod error;
pub mod foreach;
pub mod handle;
pub mod iter;
pub mod locality;
pub mod observability;
pub mod policy;
pub mod runtime;
pub mod testing;

pub use dispatch::{BufferResultCell, Dispatcher, ResultCell};
pub use dma::{Dma, RemotePtr, RemoteWriteTarget, TriviallyRelocatable};
pub use error::{ErrorCategory, Result, RuntimeError};
pub use foreach::ForEachDispatcher;
pub use handle::{DrainGuard, Handle};
pub use iter::{block_bounds, verify_partition, DistributedIterator, LocalAccess, LocalBounds};
pub use locality::{Locality, LocalityRange, LocalityTopology};
pub use policy::{ExecutionPolicy, IsExecutionPolicy};
pub use runtime::{Concurrency, Lock, Runtime, RuntimeConfig};
