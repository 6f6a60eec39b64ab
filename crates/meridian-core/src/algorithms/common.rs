//! Shared orchestration helpers used by every algorithm family in
//! [`crate::algorithms`].
//!
//! Every public algorithm follows the same shape: compute the locality set
//! a range touches, ship one kernel per locality under a policy, then
//! combine the per-locality results on the caller. The functions here
//! factor out that shape so each algorithm file only supplies the kernel
//! and the combine step.

use crate::dispatch::{Dispatcher, ResultCell};
use crate::error::Result;
use crate::handle::Handle;
use crate::iter::{DistributedIterator, LocalAccess, LocalBounds};
use crate::locality::{Locality, LocalityRange};
use crate::policy::ExecutionPolicy;

/// Runs `kernel(args_for(locality))` at every locality in `localities`,
/// honoring `policy`: sequentially with early return when `fold` says so,
/// or under one handle with results combined afterward in locality order.
///
/// `fold` receives the accumulator-so-far and a fresh per-locality result;
/// it returns `Ok((new_accumulator, should_stop))`, or an `Err` to abort the
/// whole call — needed by folds that themselves dispatch (a scan's output
/// scatter, say) and must surface a failure there rather than swallow it.
/// This is general enough to express both a short-circuiting search (stop
/// as soon as a hit appears) and a full reduction (never stops, `fold`
/// just combines).
pub(super) fn run_and_fold<R, A, Out, Acc>(
    rt: &R,
    localities: LocalityRange,
    policy: ExecutionPolicy,
    kernel: fn(&A) -> Out,
    mut args_for: impl FnMut(Locality) -> A,
    init: Acc,
    mut fold: impl FnMut(Acc, Out) -> Result<(Acc, bool)>,
) -> Result<Acc>
where
    R: Dispatcher,
    A: Send + 'static,
    Out: Send + 'static,
{
    if policy.is_sequential() {
        let mut acc = init;
        for loc in localities.iter() {
            let args = args_for(loc);
            let out = rt.execute_at_with_result(loc, kernel, args)?;
            let (next, stop) = fold(acc, out)?;
            acc = next;
            if stop {
                break;
            }
        }
        Ok(acc)
    } else {
        let handle = Handle::create();
        let mut cells = Vec::new();
        for loc in localities.iter() {
            let args = args_for(loc);
            let cell = ResultCell::new();
            rt.execute_at_with_result_async(loc, &handle, kernel, args, cell.clone())?;
            cells.push(cell);
        }
        handle.wait_for_completion()?;
        let mut acc = init;
        for cell in cells {
            let out = cell.take().expect("drained handle implies every cell was filled");
            let (next, stop) = fold(acc, out)?;
            acc = next;
            if stop {
                break;
            }
        }
        Ok(acc)
    }
}

/// Materializes the elements of `[begin, end)` that lie in the global
/// index window `[offset, offset + len)`, in global order, by dispatching
/// one read per locality that window touches and concatenating the
/// results in locality order (sound by the locality-range partition
/// invariant).
///
/// This is how two-range algorithms (`equal`, `inner_product`,
/// `transform_reduce`, `lexicographical_compare`) realize the alignment
/// distance between the two ranges: rather than shipping a second range's own
/// `LocalAccess` into every first-range kernel and re-deriving per-locality
/// overlaps inside the kernel, the caller pre-fetches exactly the aligned
/// window once and hands it to the kernel as plain data.
pub(super) fn read_aligned_window<R, It, A>(
    rt: &R,
    begin: It,
    end: It,
    access: &A,
    offset: usize,
    len: usize,
) -> Result<Vec<A::Item>>
where
    R: Dispatcher,
    It: DistributedIterator,
    A: LocalAccess,
{
    if len == 0 {
        return Ok(Vec::new());
    }
    let window_begin = begin.advance(offset);
    let window_end = begin.advance(offset + len);
    debug_assert!(
        window_end.offset_from(begin) <= It::global_len(begin, end),
        "aligned window runs past the end of the second range"
    );
    let localities = It::localities(window_begin, window_end);
    let mut out = Vec::with_capacity(len);
    for loc in localities.iter() {
        let bounds = It::local_bounds(window_begin, window_end, loc);
        if bounds.is_empty() {
            continue;
        }
        let args = ReadWindowArgs {
            access: access.clone(),
            on: loc,
            bounds,
        };
        let values = rt.execute_at_with_result(loc, read_window_kernel::<A>, args)?;
        out.extend(values);
    }
    Ok(out)
}

struct ReadWindowArgs<A: LocalAccess> {
    access: A,
    on: Locality,
    bounds: LocalBounds,
}

fn read_window_kernel<A: LocalAccess>(args: &ReadWindowArgs<A>) -> Vec<A::Item> {
    args.access.read_local(args.on, args.bounds)
}

/// The scatter counterpart of [`read_aligned_window`]: writes `values`
/// (given in global order) starting at global index `offset` of
/// `[begin, end)`, splitting across however many localities that window
/// touches.
///
/// `transform`'s need to advance the output iterator by the alignment
/// distance becomes, in this copy-based design, "compute the aligned
/// global offset once on the caller, then scatter-write it here" — the
/// kernel that *produced* `values` never needs to reach across localities
/// itself.
pub(super) fn write_aligned_window<R, It, A>(
    rt: &R,
    begin: It,
    end: It,
    access: &A,
    offset: usize,
    values: &[A::Item],
) -> Result<()>
where
    R: Dispatcher,
    It: DistributedIterator,
    A: LocalAccess,
{
    if values.is_empty() {
        return Ok(());
    }
    let window_begin = begin.advance(offset);
    let window_end = begin.advance(offset + values.len());
    debug_assert!(window_end.offset_from(begin) <= It::global_len(begin, end));
    let localities = It::localities(window_begin, window_end);
    let mut consumed = 0usize;
    for loc in localities.iter() {
        let bounds = It::local_bounds(window_begin, window_end, loc);
        if bounds.is_empty() {
            continue;
        }
        let slice = values[consumed..consumed + bounds.len()].to_vec();
        consumed += bounds.len();
        let args = WriteWindowArgs {
            access: access.clone(),
            on: loc,
            start: bounds.lo,
            values: slice,
        };
        rt.execute_at(loc, write_window_kernel::<A>, args)?;
    }
    Ok(())
}

struct WriteWindowArgs<A: LocalAccess> {
    access: A,
    on: Locality,
    start: usize,
    values: Vec<A::Item>,
}

fn write_window_kernel<A: LocalAccess>(args: &WriteWindowArgs<A>) {
    args.access.write_local(args.on, args.start, &args.values);
}
