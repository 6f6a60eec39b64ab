//! Dispatch substrate.
//!
//! A kernel is *stateless code*: a plain function pointer rather than a
//! closure with captures. What travels to the remote locality is the
//! kernel identity (resolved identically on every locality, since all
//! localities run the same program — an SPMD model) plus an explicit
//! argument struct: the closure itself is a named function plus its
//! argument struct, and the wire payload is a bit-copy of the struct.
//!
//! Two argument shapes exist at the call site — a typed value and an
//! explicit byte buffer — and they are equivalent on the wire. This module
//! exposes both; a real cross-process `Runtime` would serialize the typed
//! form the same way it transports the raw-byte form.

use crate::error::{Result, RuntimeError};
use crate::handle::Handle;
use crate::locality::{Locality, LocalityTopology};
use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// A value cell written by an asynchronous call's kernel and read by the
/// caller only after the owning [`Handle`] has been waited on. Result
/// buffers for async calls must outlive the handle's wait.
pub struct ResultCell<R>(Arc<Mutex<Option<R>>>);

impl<R> Clone for ResultCell<R> {
    fn clone(&self) -> Self {
        ResultCell(self.0.clone())
    }
}

impl<R: Send + 'static> Default for ResultCell<R> {
    fn default() -> Self {
        ResultCell(Arc::new(Mutex::new(None)))
    }
}

impl<R: Send + 'static> ResultCell<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called by a host `Runtime`'s async dispatch implementation once the
    /// kernel has produced its value. Not part of the public API: callers
    /// only ever `take` after waiting on the owning handle.
    pub(crate) fn set(&self, value: R) {
        *self.0.lock() = Some(value);
    }

    /// Takes the value written by the kernel. Only meaningful after the
    /// handle the call was submitted under has been waited on; reading
    /// before that races with an in-flight write.
    pub fn take(&self) -> Option<R> {
        self.0.lock().take()
    }
}

/// The async counterpart of a caller-supplied output buffer: the capacity
/// the caller committed to is recorded up front so the host `Runtime` can
/// raise `ResultTruncated` on the submitting handle instead of writing past
/// what the caller promised to hold.
pub struct BufferResultCell {
    capacity: usize,
    cell: ResultCell<Vec<u8>>,
}

impl Clone for BufferResultCell {
    fn clone(&self) -> Self {
        BufferResultCell { capacity: self.capacity, cell: self.cell.clone() }
    }
}

impl BufferResultCell {
    pub fn new(capacity: usize) -> Self {
        BufferResultCell { capacity, cell: ResultCell::new() }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn set(&self, value: Vec<u8>) {
        self.cell.set(value);
    }

    /// Takes the bytes written by the kernel. Only meaningful after the
    /// handle the call was submitted under has been waited on.
    pub fn take(&self) -> Option<Vec<u8>> {
        self.cell.take()
    }
}

/// Runs `kernel(args)`, converting a panic into a [`RuntimeError::UserKernelFailed`]
/// instead of unwinding across the dispatch boundary, whether or not the
/// kernel has a result channel to propagate it through.
pub(crate) fn run_kernel<A, R>(locality: Locality, kernel: fn(&A) -> R, args: &A) -> Result<R> {
    panic::catch_unwind(AssertUnwindSafe(|| kernel(args))).map_err(|payload| {
        let message = panic_message(&payload);
        RuntimeError::UserKernelFailed { locality, message }
    })
}

fn panic_message(payload: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "user kernel panicked with an unprintable payload".to_string()
    }
}

/// The dispatch substrate contract: ship a kernel plus argument payload to
/// a target locality and run it there.
///
/// Implemented by the host runtime. Algorithms never call a concrete
/// implementation directly — they go through this trait, so the same
/// kernel code runs unmodified whether the host is an in-process emulator
/// or a real multi-process transport.
pub trait Dispatcher: LocalityTopology {
    /// Fire-and-forget: run `kernel(&args)` on `target`, blocking the
    /// caller until it completes. A sync call to a target is ordered after
    /// any preceding sync call from the same caller to the same target.
    fn execute_at<A>(&self, target: Locality, kernel: fn(&A), args: A) -> Result<()>
    where
        A: Send + 'static;

    /// Synchronous call that returns a typed value.
    fn execute_at_with_result<A, R>(&self, target: Locality, kernel: fn(&A) -> R, args: A) -> Result<R>
    where
        A: Send + 'static,
        R: Send + 'static;

    /// Synchronous call whose kernel writes into a caller-supplied buffer.
    /// `ResultTruncated` is raised synchronously if the kernel wrote more
    /// than `out` can hold.
    fn execute_at_with_buffer<A>(
        &self,
        target: Locality,
        kernel: fn(&A, &mut Vec<u8>) -> usize,
        args: A,
        out: &mut Vec<u8>,
    ) -> Result<()>
    where
        A: Send + 'static;

    /// Byte-buffer argument variant of [`execute_at`](Self::execute_at),
    /// for payloads whose shape is not statically known at the call site.
    fn execute_at_bytes(&self, target: Locality, kernel: fn(&[u8]), args: &[u8]) -> Result<()>;

    /// Byte-buffer argument variant of
    /// [`execute_at_with_result`](Self::execute_at_with_result).
    fn execute_at_bytes_with_result<R>(&self, target: Locality, kernel: fn(&[u8]) -> R, args: &[u8]) -> Result<R>
    where
        R: Send + 'static;

    /// Byte-buffer argument variant of
    /// [`execute_at_with_buffer`](Self::execute_at_with_buffer).
    fn execute_at_bytes_with_buffer(
        &self,
        target: Locality,
        kernel: fn(&[u8], &mut Vec<u8>) -> usize,
        args: &[u8],
        out: &mut Vec<u8>,
    ) -> Result<()>;

    /// Fire-and-forget, asynchronous: registers one task on `handle` and
    /// returns immediately. Delivery is at-most-once; no ordering is
    /// guaranteed relative to any other async call.
    fn execute_at_async<A>(
        &self,
        target: Locality,
        handle: &Handle,
        kernel: fn(&A),
        args: A,
    ) -> Result<()>
    where
        A: Send + 'static;

    /// Asynchronous call returning a typed value through a [`ResultCell`],
    /// valid to read only after `handle` has been waited on.
    fn execute_at_with_result_async<A, R>(
        &self,
        target: Locality,
        handle: &Handle,
        kernel: fn(&A) -> R,
        args: A,
        result: ResultCell<R>,
    ) -> Result<()>
    where
        A: Send + 'static,
        R: Send + 'static;

    /// Asynchronous call whose kernel writes into a caller-supplied buffer,
    /// delivered through a [`BufferResultCell`]. `ResultTruncated` surfaces
    /// at `handle.wait_for_completion()`, not at submission, matching every
    /// other async failure mode.
    fn execute_at_with_buffer_async<A>(
        &self,
        target: Locality,
        handle: &Handle,
        kernel: fn(&A, &mut Vec<u8>) -> usize,
        args: A,
        result: BufferResultCell,
    ) -> Result<()>
    where
        A: Send + 'static;

    /// Byte-buffer argument variant of
    /// [`execute_at_async`](Self::execute_at_async). Owned `args` rather
    /// than a borrow: an async call must outlive the caller's stack frame.
    fn execute_at_bytes_async(&self, target: Locality, handle: &Handle, kernel: fn(&[u8]), args: Vec<u8>) -> Result<()>;

    /// Byte-buffer argument variant of
    /// [`execute_at_with_result_async`](Self::execute_at_with_result_async).
    fn execute_at_bytes_with_result_async<R>(
        &self,
        target: Locality,
        handle: &Handle,
        kernel: fn(&[u8]) -> R,
        args: Vec<u8>,
        result: ResultCell<R>,
    ) -> Result<()>
    where
        R: Send + 'static;

    /// Byte-buffer argument variant of
    /// [`execute_at_with_buffer_async`](Self::execute_at_with_buffer_async).
    fn execute_at_bytes_with_buffer_async(
        &self,
        target: Locality,
        handle: &Handle,
        kernel: fn(&[u8], &mut Vec<u8>) -> usize,
        args: Vec<u8>,
        result: BufferResultCell,
    ) -> Result<()>;

    /// Convenience: dispatch to every locality, fire-and-forget, under one
    /// implicit wait.
    fn execute_on_all<A>(&self, kernel: fn(&A), args: A) -> Result<()>
    where
        A: Clone + Send + 'static,
    {
        let handle = Handle::create();
        for loc in self.all_localities().iter() {
            self.execute_at_async(loc, &handle, kernel, args.clone())?;
        }
        handle.wait_for_completion()
    }

    /// Like [`execute_on_all`](Self::execute_on_all) but collects the
    /// per-locality return value, ordered by locality id.
    fn execute_on_all_with_results<A, R>(&self, kernel: fn(&A) -> R, args: A) -> Result<Vec<(Locality, R)>>
    where
        A: Clone + Send + 'static,
        R: Send + 'static,
    {
        let handle = Handle::create();
        let cells: Vec<(Locality, ResultCell<R>)> = self
            .all_localities()
            .iter()
            .map(|loc| (loc, ResultCell::new()))
            .collect();
        for (loc, cell) in &cells {
            self.execute_at_with_result_async(*loc, &handle, kernel, args.clone(), cell.clone())?;
        }
        handle.wait_for_completion()?;
        Ok(cells
            .into_iter()
            .map(|(loc, cell)| (loc, cell.take().expect("handle drained implies cell filled")))
            .collect())
    }
}
