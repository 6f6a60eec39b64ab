//! Bulk for-each dispatcher.
//!
//! `for_each_at` runs `n_iters` iterations of a kernel at one locality,
//! partitioned across that locality's local worker threads. `for_each_on_all`
//! spreads `n_iters` iterations *in total* across every locality. Both are
//! the primitive the bulk elementwise algorithms are built on, but they are
//! also part of the public dispatch surface in their own right.

use crate::error::Result;
use crate::handle::Handle;
use crate::locality::{Locality, LocalityTopology};

/// The bulk for-each contract.
pub trait ForEachDispatcher: LocalityTopology {
    /// Runs `kernel(&args, i)` for `i in [0, n_iters)` at `target`,
    /// blocking until every iteration completes. `n_iters == 0` is a legal
    /// no-op.
    fn for_each_at<A>(&self, target: Locality, kernel: fn(&A, u64), args: A, n_iters: u64) -> Result<()>
    where
        A: Sync + 'static;

    /// Asynchronous variant: registers the whole batch as outstanding work
    /// on `handle` and returns once submission (not execution) completes.
    fn for_each_at_async<A>(
        &self,
        target: Locality,
        handle: &Handle,
        kernel: fn(&A, u64),
        args: A,
        n_iters: u64,
    ) -> Result<()>
    where
        A: Send + Sync + 'static;

    /// Runs `n_iters` iterations *in total*, spread over the union of all
    /// localities. The iteration-to-locality mapping is
    /// implementation-defined but stable within one call.
    fn for_each_on_all<A>(&self, kernel: fn(&A, u64), args: A, n_iters: u64) -> Result<()>
    where
        A: Clone + Send + Sync + 'static,
    {
        if n_iters == 0 {
            return Ok(());
        }
        let localities = self.all_localities();
        let n = localities.len() as u64;
        let handle = Handle::create();
        for (idx, loc) in localities.iter().enumerate() {
            let idx = idx as u64;
            // Evenly split n_iters across localities; the first
            // (n_iters % n) localities get one extra iteration.
            let base = n_iters / n;
            let extra = n_iters % n;
            let count = base + u64::from(idx < extra);
            if count == 0 {
                continue;
            }
            let offset = idx * base + idx.min(extra);
            let shifted_args = (args.clone(), offset);
            self.for_each_at_async(
                loc,
                &handle,
                shift_kernel::<A>,
                ShiftedArgs { args: shifted_args.0, offset: shifted_args.1, inner: kernel },
                count,
            )?;
        }
        handle.wait_for_completion()
    }
}

/// Carries the global offset a locality's local iteration indices must be
/// shifted by, so the `i`-th local call observes global index `offset + i`
/// — this is what makes `for_each_on_all`'s mapping stable within one call
/// rather than locality-relative.
struct ShiftedArgs<A> {
    args: A,
    offset: u64,
    inner: fn(&A, u64),
}

fn shift_kernel<A>(shifted: &ShiftedArgs<A>, local_i: u64) {
    (shifted.inner)(&shifted.args, shifted.offset + local_i)
}
