//! Reference test doubles: an in-process locality emulator and a toy
//! block-distributed vector.
//!
//! Always compiled (not `#[cfg(test)]`): integration tests, doctests, and
//! downstream crates that want to exercise [`crate::algorithms`] without a
//! real multi-process transport all depend on this module. The concrete
//! transport is explicitly out of scope for this crate, and a
//! single-process threaded emulator is a perfectly legitimate shape for
//! one — that is exactly what [`LoopbackRuntime`] is.

use crate::dispatch::{run_kernel, BufferResultCell, Dispatcher, ResultCell};
use crate::dma::{Dma, RemotePtr, RemoteWriteTarget, TriviallyRelocatable};
use crate::error::{Result, RuntimeError};
use crate::foreach::ForEachDispatcher;
use crate::handle::Handle;
use crate::iter::{block_bounds, DistributedIterator, LocalAccess, LocalBounds};
use crate::locality::{Locality, LocalityRange, LocalityTopology};
use crate::observability::{emit, DispatchEvent, DispatchKind};
use crate::runtime::Concurrency;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

/// A single-process runtime: `num_localities` virtual localities, each
/// backed by its own small worker pool. Dispatch is implemented by literally
/// moving the (function pointer, argument) pair onto a worker thread —
/// there is no serialization step, which is faithful to the typed and
/// byte-buffer argument shapes being equivalent on the wire, without this
/// crate having to pick a wire format for a transport that is out of scope
/// here.
pub struct LoopbackRuntime {
    num_localities: u32,
    this: Locality,
    pools: Vec<WorkerPool>,
}

struct WorkerPool {
    threads: usize,
}

impl WorkerPool {
    fn new(threads: usize) -> Self {
        WorkerPool {
            threads: threads.max(1),
        }
    }
}

impl LoopbackRuntime {
    /// Builds an `N`-locality emulator where the calling thread plays the
    /// role of locality 0, the natural mapping for a single-process
    /// transport.
    pub fn new(num_localities: u32, threads_per_locality: usize) -> Arc<Self> {
        assert!(num_localities > 0, "a runtime needs at least one locality");
        let pools = (0..num_localities)
            .map(|_| WorkerPool::new(threads_per_locality))
            .collect();
        Arc::new(LoopbackRuntime {
            num_localities,
            this: Locality::new(0),
            pools,
        })
    }
}

impl LocalityTopology for LoopbackRuntime {
    fn num_localities(&self) -> u32 {
        self.num_localities
    }

    fn this_locality(&self) -> Locality {
        self.this
    }
}

impl Concurrency for LoopbackRuntime {
    fn concurrency(&self) -> usize {
        self.pools.first().map(|p| p.threads).unwrap_or(1)
    }
}

impl Dispatcher for LoopbackRuntime {
    fn execute_at<A>(&self, target: Locality, kernel: fn(&A), args: A) -> Result<()>
    where
        A: Send + 'static,
    {
        self.validate(target)?;
        emit(DispatchEvent::Submitted { target, kind: DispatchKind::Sync });
        let result = run_kernel(target, |a: &A| kernel(a), &args);
        emit(DispatchEvent::Completed { target, kind: DispatchKind::Sync, ok: result.is_ok() });
        result
    }

    fn execute_at_with_result<A, R>(
        &self,
        target: Locality,
        kernel: fn(&A) -> R,
        args: A,
    ) -> Result<R>
    where
        A: Send + 'static,
        R: Send + 'static,
    {
        self.validate(target)?;
        emit(DispatchEvent::Submitted { target, kind: DispatchKind::Sync });
        let result = run_kernel(target, kernel, &args);
        emit(DispatchEvent::Completed { target, kind: DispatchKind::Sync, ok: result.is_ok() });
        result
    }

    fn execute_at_with_buffer<A>(
        &self,
        target: Locality,
        kernel: fn(&A, &mut Vec<u8>) -> usize,
        args: A,
        out: &mut Vec<u8>,
    ) -> Result<()>
    where
        A: Send + 'static,
    {
        self.validate(target)?;
        let capacity = out.capacity();
        let mut scratch = Vec::new();
        let written = run_kernel(target, |a: &A| kernel(a, &mut scratch), &args)?;
        if written > capacity {
            return Err(RuntimeError::ResultTruncated {
                provided: capacity,
                required: written,
            });
        }
        out.clear();
        out.extend_from_slice(&scratch[..written]);
        Ok(())
    }

    fn execute_at_bytes(&self, target: Locality, kernel: fn(&[u8]), args: &[u8]) -> Result<()> {
        self.validate(target)?;
        let owned = args.to_vec();
        run_kernel(target, |a: &Vec<u8>| kernel(a), &owned)
    }

    fn execute_at_bytes_with_result<R>(&self, target: Locality, kernel: fn(&[u8]) -> R, args: &[u8]) -> Result<R>
    where
        R: Send + 'static,
    {
        self.validate(target)?;
        let owned = args.to_vec();
        emit(DispatchEvent::Submitted { target, kind: DispatchKind::Sync });
        let result = run_kernel(target, |a: &Vec<u8>| kernel(a), &owned);
        emit(DispatchEvent::Completed { target, kind: DispatchKind::Sync, ok: result.is_ok() });
        result
    }

    fn execute_at_bytes_with_buffer(
        &self,
        target: Locality,
        kernel: fn(&[u8], &mut Vec<u8>) -> usize,
        args: &[u8],
        out: &mut Vec<u8>,
    ) -> Result<()> {
        self.validate(target)?;
        let owned = args.to_vec();
        let capacity = out.capacity();
        let mut scratch = Vec::new();
        let written = run_kernel(target, |a: &Vec<u8>| kernel(a, &mut scratch), &owned)?;
        if written > capacity {
            return Err(RuntimeError::ResultTruncated { provided: capacity, required: written });
        }
        out.clear();
        out.extend_from_slice(&scratch[..written]);
        Ok(())
    }

    fn execute_at_async<A>(
        &self,
        target: Locality,
        handle: &Handle,
        kernel: fn(&A),
        args: A,
    ) -> Result<()>
    where
        A: Send + 'static,
    {
        self.validate(target)?;
        handle.submit();
        emit(DispatchEvent::Submitted { target, kind: DispatchKind::Async });
        let handle = handle.clone();
        thread::spawn(move || {
            let result = run_kernel(target, |a: &A| kernel(a), &args);
            emit(DispatchEvent::Completed { target, kind: DispatchKind::Async, ok: result.is_ok() });
            if let Err(err) = result {
                handle.record_error(err);
            }
            handle.complete();
        });
        Ok(())
    }

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
        R: Send + 'static,
    {
        self.validate(target)?;
        handle.submit();
        emit(DispatchEvent::Submitted { target, kind: DispatchKind::Async });
        let handle = handle.clone();
        thread::spawn(move || {
            let outcome = run_kernel(target, kernel, &args);
            emit(DispatchEvent::Completed { target, kind: DispatchKind::Async, ok: outcome.is_ok() });
            match outcome {
                Ok(value) => result.set(value),
                Err(err) => handle.record_error(err),
            }
            handle.complete();
        });
        Ok(())
    }

    fn execute_at_with_buffer_async<A>(
        &self,
        target: Locality,
        handle: &Handle,
        kernel: fn(&A, &mut Vec<u8>) -> usize,
        args: A,
        result: BufferResultCell,
    ) -> Result<()>
    where
        A: Send + 'static,
    {
        self.validate(target)?;
        handle.submit();
        emit(DispatchEvent::Submitted { target, kind: DispatchKind::Async });
        let handle = handle.clone();
        thread::spawn(move || {
            let capacity = result.capacity();
            let mut scratch = Vec::new();
            let outcome = run_kernel(target, |a: &A| kernel(a, &mut scratch), &args)
                .and_then(|written| {
                    if written > capacity {
                        Err(RuntimeError::ResultTruncated { provided: capacity, required: written })
                    } else {
                        scratch.truncate(written);
                        Ok(scratch)
                    }
                });
            emit(DispatchEvent::Completed { target, kind: DispatchKind::Async, ok: outcome.is_ok() });
            match outcome {
                Ok(bytes) => result.set(bytes),
                Err(err) => handle.record_error(err),
            }
            handle.complete();
        });
        Ok(())
    }

    fn execute_at_bytes_async(&self, target: Locality, handle: &Handle, kernel: fn(&[u8]), args: Vec<u8>) -> Result<()> {
        self.validate(target)?;
        handle.submit();
        emit(DispatchEvent::Submitted { target, kind: DispatchKind::Async });
        let handle = handle.clone();
        thread::spawn(move || {
            let result = run_kernel(target, |a: &Vec<u8>| kernel(a), &args);
            emit(DispatchEvent::Completed { target, kind: DispatchKind::Async, ok: result.is_ok() });
            if let Err(err) = result {
                handle.record_error(err);
            }
            handle.complete();
        });
        Ok(())
    }

    fn execute_at_bytes_with_result_async<R>(
        &self,
        target: Locality,
        handle: &Handle,
        kernel: fn(&[u8]) -> R,
        args: Vec<u8>,
        result: ResultCell<R>,
    ) -> Result<()>
    where
        R: Send + 'static,
    {
        self.validate(target)?;
        handle.submit();
        emit(DispatchEvent::Submitted { target, kind: DispatchKind::Async });
        let handle = handle.clone();
        thread::spawn(move || {
            let outcome = run_kernel(target, |a: &Vec<u8>| kernel(a), &args);
            emit(DispatchEvent::Completed { target, kind: DispatchKind::Async, ok: outcome.is_ok() });
            match outcome {
                Ok(value) => result.set(value),
                Err(err) => handle.record_error(err),
            }
            handle.complete();
        });
        Ok(())
    }

    fn execute_at_bytes_with_buffer_async(
        &self,
        target: Locality,
        handle: &Handle,
        kernel: fn(&[u8], &mut Vec<u8>) -> usize,
        args: Vec<u8>,
        result: BufferResultCell,
    ) -> Result<()> {
        self.validate(target)?;
        handle.submit();
        emit(DispatchEvent::Submitted { target, kind: DispatchKind::Async });
        let handle = handle.clone();
        thread::spawn(move || {
            let capacity = result.capacity();
            let mut scratch = Vec::new();
            let outcome = run_kernel(target, |a: &Vec<u8>| kernel(a, &mut scratch), &args)
                .and_then(|written| {
                    if written > capacity {
                        Err(RuntimeError::ResultTruncated { provided: capacity, required: written })
                    } else {
                        scratch.truncate(written);
                        Ok(scratch)
                    }
                });
            emit(DispatchEvent::Completed { target, kind: DispatchKind::Async, ok: outcome.is_ok() });
            match outcome {
                Ok(bytes) => result.set(bytes),
                Err(err) => handle.record_error(err),
            }
            handle.complete();
        });
        Ok(())
    }
}

impl ForEachDispatcher for LoopbackRuntime {
    fn for_each_at<A>(
        &self,
        target: Locality,
        kernel: fn(&A, u64),
        args: A,
        n_iters: u64,
    ) -> Result<()>
    where
        A: Sync + 'static,
    {
        self.validate(target)?;
        if n_iters == 0 {
            return Ok(());
        }
        emit(DispatchEvent::Submitted { target, kind: DispatchKind::Bulk });
        let threads = self.pools[target.id() as usize].threads as u64;
        let args = Arc::new(args);
        let workers = threads.min(n_iters).max(1);
        let chunk = n_iters.div_ceil(workers);
        let outcome = std::thread::scope(|scope| {
            let mut handles = Vec::new();
            for w in 0..workers {
                let lo = w * chunk;
                let hi = (lo + chunk).min(n_iters);
                if lo >= hi {
                    continue;
                }
                let args = Arc::clone(&args);
                handles.push(scope.spawn(move || -> Result<()> {
                    for i in lo..hi {
                        run_kernel(target, |a: &A| kernel(a, i), &args)?;
                    }
                    Ok(())
                }));
            }
            for h in handles {
                h.join().expect("worker thread panicked without unwinding through catch_unwind")?;
            }
            Ok(())
        });
        emit(DispatchEvent::Completed { target, kind: DispatchKind::Bulk, ok: outcome.is_ok() });
        outcome
    }

    fn for_each_at_async<A>(
        &self,
        target: Locality,
        handle: &Handle,
        kernel: fn(&A, u64),
        args: A,
        n_iters: u64,
    ) -> Result<()>
    where
        A: Send + Sync + 'static,
    {
        self.validate(target)?;
        if n_iters == 0 {
            return Ok(());
        }
        handle.submit();
        emit(DispatchEvent::Submitted { target, kind: DispatchKind::Bulk });
        let group = handle.clone();
        let threads = self.pools[target.id() as usize].threads as u64;
        thread::spawn(move || {
            let args = Arc::new(args);
            let workers = threads.min(n_iters).max(1);
            let chunk = n_iters.div_ceil(workers);
            let result = std::thread::scope(|scope| {
                let mut handles = Vec::new();
                for w in 0..workers {
                    let lo = w * chunk;
                    let hi = (lo + chunk).min(n_iters);
                    if lo >= hi {
                        continue;
                    }
                    let args = Arc::clone(&args);
                    handles.push(scope.spawn(move || -> Result<()> {
                        for i in lo..hi {
                            run_kernel(target, |a: &A| kernel(a, i), &args)?;
                        }
                        Ok(())
                    }));
                }
                let mut first_err = None;
                for h in handles {
                    if let Err(e) = h.join().expect("worker panicked without unwinding") {
                        if first_err.is_none() {
                            first_err = Some(e);
                        }
                    }
                }
                first_err
            });
            emit(DispatchEvent::Completed { target, kind: DispatchKind::Bulk, ok: result.is_none() });
            if let Some(err) = result {
                group.record_error(err);
            }
            group.complete();
        });
        Ok(())
    }
}

/// Per-`(locality, address)` remote buffer registry backing [`Dma`] for the
/// loopback emulator — the stand-in for what a real transport would do
/// with RDMA-registered memory. Sharded concurrent map rather than a
/// single `RwLock<HashMap<..>>` since `put`/`get` on disjoint addresses
/// must not contend with each other across worker threads.
#[derive(Default)]
pub struct RemoteHeap {
    next_address: AtomicU64,
    buffers: DashMap<(u32, u64), Arc<Mutex<Vec<u8>>>>,
}

impl RemoteHeap {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers a buffer of `count` `T`s on `locality`, returning a
    /// [`RemotePtr`] that only [`Dma`] operations may resolve. This stands
    /// in for the earlier dispatch that, on a real transport, would have
    /// read a pointer out of the remote locality's address space.
    pub fn allocate<T: TriviallyRelocatable>(&self, locality: Locality, count: usize) -> RemotePtr<T> {
        let address = self.next_address.fetch_add(1, Ordering::Relaxed);
        let bytes = vec![0u8; count * std::mem::size_of::<T>()];
        self.buffers.insert((locality.id(), address), Arc::new(Mutex::new(bytes)));
        RemotePtr::from_raw_parts(locality, address, count)
    }

    fn buffer(&self, locality: Locality, address: u64) -> Arc<Mutex<Vec<u8>>> {
        self.buffers
            .get(&(locality.id(), address))
            .expect("dma against an address never allocated through this RemoteHeap")
            .clone()
    }

    /// Reads out the current contents of a registered buffer as `T`s —
    /// test-only convenience, not part of the dma contract itself.
    pub fn snapshot<T: TriviallyRelocatable>(&self, ptr: RemotePtr<T>) -> Vec<T> {
        let buf = self.buffer(ptr.locality(), ptr.address());
        let guard = buf.lock();
        bytes_to_elems(&guard, ptr.count())
    }
}

fn bytes_to_elems<T: TriviallyRelocatable>(bytes: &[u8], count: usize) -> Vec<T> {
    let mut out = Vec::with_capacity(count);
    let stride = std::mem::size_of::<T>();
    for i in 0..count {
        // Safety: TriviallyRelocatable guarantees any bit pattern the
        // buffer might hold is a valid T, and `bytes` was sized as an exact
        // multiple of `stride` by `RemoteHeap::allocate`.
        let value = unsafe { std::ptr::read_unaligned(bytes[i * stride..].as_ptr() as *const T) };
        out.push(value);
    }
    out
}

fn elems_to_bytes<T: TriviallyRelocatable>(elems: &[T], out: &mut [u8]) {
    let stride = std::mem::size_of::<T>();
    for (i, e) in elems.iter().enumerate() {
        // Safety: symmetric with `bytes_to_elems`; `out` was sized by the
        // caller to `elems.len() * stride`.
        unsafe {
            std::ptr::write_unaligned(out[i * stride..].as_mut_ptr() as *mut T, *e);
        }
    }
}

/// An implementation of [`Dma`] against a [`RemoteHeap`]. Kept separate from
/// [`LoopbackRuntime`] so tests can wire up exactly the remote buffers they
/// need rather than growing a process-wide default heap.
pub struct LoopbackDma<'a> {
    pub topology: &'a LoopbackRuntime,
    pub heap: Arc<RemoteHeap>,
}

impl LocalityTopology for LoopbackDma<'_> {
    fn num_localities(&self) -> u32 {
        self.topology.num_localities()
    }
    fn this_locality(&self) -> Locality {
        self.topology.this_locality()
    }
}

impl Dma for LoopbackDma<'_> {
    fn put<T: TriviallyRelocatable>(&self, dst: RemotePtr<T>, src_local: &[T]) -> Result<()> {
        self.validate(dst.locality())?;
        assert_eq!(dst.count(), src_local.len(), "dma put length mismatch");
        emit(DispatchEvent::Submitted { target: dst.locality(), kind: DispatchKind::Dma });
        let buf = self.heap.buffer(dst.locality(), dst.address());
        let mut guard = buf.lock();
        elems_to_bytes(src_local, &mut guard);
        drop(guard);
        emit(DispatchEvent::Completed { target: dst.locality(), kind: DispatchKind::Dma, ok: true });
        Ok(())
    }

    fn get<T: TriviallyRelocatable>(&self, dst_local: &mut [T], src: RemotePtr<T>) -> Result<()> {
        self.validate(src.locality())?;
        assert_eq!(src.count(), dst_local.len(), "dma get length mismatch");
        emit(DispatchEvent::Submitted { target: src.locality(), kind: DispatchKind::Dma });
        let buf = self.heap.buffer(src.locality(), src.address());
        let guard = buf.lock();
        let values: Vec<T> = bytes_to_elems(&guard, src.count());
        drop(guard);
        dst_local.copy_from_slice(&values);
        emit(DispatchEvent::Completed { target: src.locality(), kind: DispatchKind::Dma, ok: true });
        Ok(())
    }

    fn put_async<T: TriviallyRelocatable>(
        &self,
        dst: RemotePtr<T>,
        src_local: Vec<T>,
        handle: &Handle,
    ) -> Result<()> {
        self.validate(dst.locality())?;
        emit(DispatchEvent::Submitted { target: dst.locality(), kind: DispatchKind::Dma });
        let heap = Arc::clone(&self.heap);
        handle.submit();
        let handle = handle.clone();
        thread::spawn(move || {
            let buf = heap.buffer(dst.locality(), dst.address());
            let mut guard = buf.lock();
            elems_to_bytes(&src_local, &mut guard);
            drop(guard);
            emit(DispatchEvent::Completed { target: dst.locality(), kind: DispatchKind::Dma, ok: true });
            handle.complete();
        });
        Ok(())
    }

    fn get_async<T: TriviallyRelocatable>(
        &self,
        mut dst_local: RemoteWriteTarget<T>,
        src: RemotePtr<T>,
        handle: &Handle,
    ) -> Result<()> {
        self.validate(src.locality())?;
        emit(DispatchEvent::Submitted { target: src.locality(), kind: DispatchKind::Dma });
        let heap = Arc::clone(&self.heap);
        handle.submit();
        let handle = handle.clone();
        thread::spawn(move || {
            let buf = heap.buffer(src.locality(), src.address());
            let guard = buf.lock();
            let values: Vec<T> = bytes_to_elems(&guard, src.count());
            drop(guard);
            dst_local.as_slice_mut().copy_from_slice(&values);
            emit(DispatchEvent::Completed { target: src.locality(), kind: DispatchKind::Dma, ok: true });
            handle.complete();
        });
        Ok(())
    }
}

/// A toy, contiguously block-distributed vector: every locality owns the
/// slice the classic even-split distribution (see [`block_bounds`]) assigns
/// it. Exists purely to drive [`crate::algorithms`] under test; containers
/// are external collaborators to this crate and this is explicitly not one
/// of the production containers it would ultimately serve.
pub struct DistVec<T> {
    parts: Arc<Vec<RwLock<Vec<T>>>>,
    len: usize,
}

impl<T: TriviallyRelocatable> DistVec<T> {
    pub fn from_vec(values: Vec<T>, num_localities: u32) -> Self {
        let len = values.len();
        let mut parts: Vec<Vec<T>> = Vec::with_capacity(num_localities as usize);
        let mut remaining = values;
        for loc_idx in 0..num_localities {
            let (lo, hi) = block_bounds(len, num_localities, Locality::new(loc_idx));
            let tail = remaining.split_off(hi - lo);
            parts.push(std::mem::replace(&mut remaining, tail));
        }
        DistVec {
            parts: Arc::new(parts.into_iter().map(RwLock::new).collect()),
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn num_localities(&self) -> u32 {
        self.parts.len() as u32
    }

    pub fn begin(&self) -> DistVecIter {
        DistVecIter {
            len: self.len,
            num_localities: self.num_localities(),
            index: 0,
        }
    }

    pub fn end(&self) -> DistVecIter {
        DistVecIter {
            len: self.len,
            num_localities: self.num_localities(),
            index: self.len,
        }
    }

    /// Materializes the whole container on the caller, in global order.
    /// Test/debug convenience only.
    pub fn to_vec(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len);
        for part in self.parts.iter() {
            out.extend_from_slice(&part.read());
        }
        out
    }

    pub fn access(&self) -> DistVecAccess<T> {
        DistVecAccess {
            parts: Arc::clone(&self.parts),
        }
    }
}

/// The global iterator type for [`DistVec`]. Carries only a flat global
/// index plus the two numbers (`len`, `num_localities`) needed to compute
/// the block distribution — small enough to be a trivially-relocatable
/// dispatch payload.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DistVecIter {
    len: usize,
    num_localities: u32,
    index: usize,
}

impl DistributedIterator for DistVecIter {
    fn localities(begin: Self, end: Self) -> LocalityRange {
        if begin.index >= end.index {
            return LocalityRange::empty();
        }
        let mut lo = None;
        let mut hi = 0u32;
        for loc in 0..begin.num_localities {
            let (block_lo, block_hi) = block_bounds(begin.len, begin.num_localities, Locality::new(loc));
            let overlap_lo = begin.index.max(block_lo);
            let overlap_hi = end.index.min(block_hi);
            if overlap_lo < overlap_hi {
                if lo.is_none() {
                    lo = Some(loc);
                }
                hi = loc + 1;
            }
        }
        match lo {
            Some(lo) => LocalityRange::new(lo, hi),
            None => LocalityRange::empty(),
        }
    }

    fn local_bounds(begin: Self, end: Self, on: Locality) -> LocalBounds {
        let (block_lo, block_hi) = block_bounds(begin.len, begin.num_localities, on);
        let overlap_lo = begin.index.max(block_lo);
        let overlap_hi = end.index.min(block_hi);
        if overlap_lo >= overlap_hi {
            return LocalBounds::empty();
        }
        LocalBounds {
            lo: overlap_lo - block_lo,
            hi: overlap_hi - block_lo,
        }
    }

    fn lift_local(begin: Self, _end: Self, on: Locality, local_index: usize) -> Self {
        let (block_lo, _) = block_bounds(begin.len, begin.num_localities, on);
        DistVecIter {
            len: begin.len,
            num_localities: begin.num_localities,
            index: block_lo + local_index,
        }
    }

    fn global_len(begin: Self, end: Self) -> usize {
        end.index.saturating_sub(begin.index)
    }

    fn advance(self, delta: usize) -> Self {
        DistVecIter {
            index: self.index + delta,
            ..self
        }
    }

    fn offset_from(self, begin: Self) -> usize {
        self.index - begin.index
    }
}

/// Cheap, `Send + Sync + 'static` handle to a [`DistVec`]'s local parts —
/// the thing a dispatch argument actually carries (an `Arc`, not the whole
/// container) so kernels shipped to other localities can reach local data.
pub struct DistVecAccess<T> {
    parts: Arc<Vec<RwLock<Vec<T>>>>,
}

impl<T> Clone for DistVecAccess<T> {
    fn clone(&self) -> Self {
        DistVecAccess {
            parts: Arc::clone(&self.parts),
        }
    }
}

impl<T: TriviallyRelocatable> LocalAccess for DistVecAccess<T> {
    type Item = T;

    fn read_local(&self, on: Locality, bounds: LocalBounds) -> Vec<T> {
        let part = self.parts[on.id() as usize].read();
        part[bounds.lo..bounds.hi].to_vec()
    }

    fn write_local(&self, on: Locality, start: usize, values: &[T]) {
        let mut part = self.parts[on.id() as usize].write();
        part[start..start + values.len()].copy_from_slice(values);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dist_vec_round_trips_through_to_vec() {
        let values: Vec<i64> = (0..42).collect();
        let dv = DistVec::from_vec(values.clone(), 5);
        assert_eq!(dv.to_vec(), values);
    }

    #[test]
    fn iterator_partition_matches_container() {
        let dv = DistVec::from_vec((0..10001i64).collect(), 4);
        let begin = dv.begin();
        let end = dv.end();
        crate::iter::verify_partition::<DistVecIter>(begin, end).unwrap();
    }

    #[test]
    fn loopback_runtime_executes_locally() {
        let rt = LoopbackRuntime::new(3, 2);
        let got = rt.execute_at_with_result(Locality::new(1), |a: &i32| *a * 2, 21).unwrap();
        assert_eq!(got, 42);
    }

    #[test]
    fn loopback_runtime_executes_byte_buffer_arg_with_result() {
        let rt = LoopbackRuntime::new(2, 1);
        let got = rt
            .execute_at_bytes_with_result(Locality::new(0), |bytes: &[u8]| bytes.iter().map(|b| *b as u32).sum::<u32>(), &[1, 2, 3])
            .unwrap();
        assert_eq!(got, 6);
    }

    #[test]
    fn loopback_runtime_executes_byte_buffer_arg_with_buffer() {
        let rt = LoopbackRuntime::new(2, 1);
        let mut out = Vec::with_capacity(4);
        rt.execute_at_bytes_with_buffer(
            Locality::new(0),
            |bytes: &[u8], scratch: &mut Vec<u8>| {
                scratch.extend(bytes.iter().rev());
                scratch.len()
            },
            &[1, 2, 3],
            &mut out,
        )
        .unwrap();
        assert_eq!(out, vec![3, 2, 1]);
    }

    #[test]
    fn loopback_runtime_async_buffer_call_round_trips() {
        let rt = LoopbackRuntime::new(2, 1);
        let handle = Handle::create();
        let cell = crate::dispatch::BufferResultCell::new(4);
        rt.execute_at_with_buffer_async(
            Locality::new(1),
            &handle,
            |value: &i32, scratch: &mut Vec<u8>| {
                scratch.extend_from_slice(&value.to_le_bytes());
                scratch.len()
            },
            99,
            cell.clone(),
        )
        .unwrap();
        handle.wait_for_completion().unwrap();
        assert_eq!(cell.take().unwrap(), 99i32.to_le_bytes().to_vec());
    }

    #[test]
    fn loopback_runtime_async_buffer_call_surfaces_truncation_at_wait() {
        let rt = LoopbackRuntime::new(2, 1);
        let handle = Handle::create();
        let cell = crate::dispatch::BufferResultCell::new(1);
        rt.execute_at_with_buffer_async(
            Locality::new(1),
            &handle,
            |value: &i32, scratch: &mut Vec<u8>| {
                scratch.extend_from_slice(&value.to_le_bytes());
                scratch.len()
            },
            99,
            cell,
        )
        .unwrap();
        assert!(handle.wait_for_completion().is_err());
    }

    #[test]
    fn dma_put_then_get_round_trips() {
        let rt = LoopbackRuntime::new(2, 1);
        let heap = RemoteHeap::new();
        let dma = LoopbackDma { topology: &rt, heap: heap.clone() };
        let ptr = heap.allocate::<i64>(Locality::new(1), 4);
        dma.put(ptr, &[1, 2, 3, 4]).unwrap();
        let mut back = [0i64; 4];
        dma.get(&mut back, ptr).unwrap();
        assert_eq!(back, [1, 2, 3, 4]);
    }
}
