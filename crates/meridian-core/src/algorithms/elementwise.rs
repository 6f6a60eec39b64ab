//! Elementwise algorithms: for_each, fill, generate, replace, replace_if,
//! transform.
//!
//! Every algorithm here dispatches one kernel per locality in
//! `It::localities(begin, end)`, each kernel touching only its own local
//! sub-range; there is no cross-locality combine step. The execution
//! policy picks between visiting localities one at a time versus firing
//! every kernel under a single handle — for this family that changes only
//! how dispatch overlaps with the caller, never the result.

use super::common::write_aligned_window;
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::handle::Handle;
use crate::iter::{DistributedIterator, LocalAccess, LocalBounds};
use crate::locality::Locality;
use crate::policy::ExecutionPolicy;

/// Runs the fire-and-forget kernel `kernel(make_args(loc, bounds))` at
/// every locality `[begin, end)` touches — sequentially, or with every
/// call registered on one handle and waited on together.
fn dispatch_per_locality<R, It, A>(
    rt: &R,
    begin: It,
    end: It,
    policy: ExecutionPolicy,
    make_args: impl Fn(Locality, LocalBounds) -> A,
    kernel: fn(&A),
) -> Result<()>
where
    R: Dispatcher,
    It: DistributedIterator,
    A: Send + 'static,
{
    if policy.is_sequential() {
        for loc in It::localities(begin, end).iter() {
            let bounds = It::local_bounds(begin, end, loc);
            rt.execute_at(loc, kernel, make_args(loc, bounds))?;
        }
        Ok(())
    } else {
        let handle = Handle::create();
        for loc in It::localities(begin, end).iter() {
            let bounds = It::local_bounds(begin, end, loc);
            rt.execute_at_async(loc, &handle, kernel, make_args(loc, bounds))?;
        }
        handle.wait_for_completion()
    }
}

struct ForEachArgs<A: LocalAccess> {
    access: A,
    on: Locality,
    bounds: LocalBounds,
    f: fn(&mut A::Item),
}

fn for_each_kernel<A: LocalAccess>(args: &ForEachArgs<A>) {
    if args.bounds.is_empty() {
        return;
    }
    let mut local = args.access.read_local(args.on, args.bounds);
    for v in local.iter_mut() {
        (args.f)(v);
    }
    args.access.write_local(args.on, args.bounds.lo, &local);
}

/// Applies `f` in place to every element of `[begin, end)`.
pub fn for_each<R, It, A>(
    rt: &R,
    begin: It,
    end: It,
    access: &A,
    f: fn(&mut A::Item),
    policy: impl Into<ExecutionPolicy>,
) -> Result<()>
where
    R: Dispatcher,
    It: DistributedIterator,
    A: LocalAccess,
{
    dispatch_per_locality(
        rt,
        begin,
        end,
        policy.into(),
        |loc, bounds| ForEachArgs { access: access.clone(), on: loc, bounds, f },
        for_each_kernel::<A>,
    )
}

struct FillArgs<A: LocalAccess> {
    access: A,
    on: Locality,
    bounds: LocalBounds,
    value: A::Item,
}

fn fill_kernel<A: LocalAccess>(args: &FillArgs<A>) {
    if args.bounds.is_empty() {
        return;
    }
    let values = vec![args.value; args.bounds.len()];
    args.access.write_local(args.on, args.bounds.lo, &values);
}

/// Overwrites every element of `[begin, end)` with `value`.
pub fn fill<R, It, A>(
    rt: &R,
    begin: It,
    end: It,
    access: &A,
    value: A::Item,
    policy: impl Into<ExecutionPolicy>,
) -> Result<()>
where
    R: Dispatcher,
    It: DistributedIterator,
    A: LocalAccess,
{
    dispatch_per_locality(
        rt,
        begin,
        end,
        policy.into(),
        |loc, bounds| FillArgs { access: access.clone(), on: loc, bounds, value },
        fill_kernel::<A>,
    )
}

struct ReplaceIfArgs<A: LocalAccess> {
    access: A,
    on: Locality,
    bounds: LocalBounds,
    pred: fn(&A::Item) -> bool,
    new_value: A::Item,
}

fn replace_if_kernel<A: LocalAccess>(args: &ReplaceIfArgs<A>) {
    if args.bounds.is_empty() {
        return;
    }
    let mut local = args.access.read_local(args.on, args.bounds);
    for v in local.iter_mut() {
        if (args.pred)(v) {
            *v = args.new_value;
        }
    }
    args.access.write_local(args.on, args.bounds.lo, &local);
}

/// Replaces every element for which `pred` holds with `new_value`.
pub fn replace_if<R, It, A>(
    rt: &R,
    begin: It,
    end: It,
    access: &A,
    pred: fn(&A::Item) -> bool,
    new_value: A::Item,
    policy: impl Into<ExecutionPolicy>,
) -> Result<()>
where
    R: Dispatcher,
    It: DistributedIterator,
    A: LocalAccess,
{
    dispatch_per_locality(
        rt,
        begin,
        end,
        policy.into(),
        |loc, bounds| ReplaceIfArgs { access: access.clone(), on: loc, bounds, pred, new_value },
        replace_if_kernel::<A>,
    )
}

struct ReplaceArgs<A: LocalAccess> {
    access: A,
    on: Locality,
    bounds: LocalBounds,
    old_value: A::Item,
    new_value: A::Item,
}

fn replace_kernel<A>(args: &ReplaceArgs<A>)
where
    A: LocalAccess,
    A::Item: PartialEq,
{
    if args.bounds.is_empty() {
        return;
    }
    let mut local = args.access.read_local(args.on, args.bounds);
    for v in local.iter_mut() {
        if *v == args.old_value {
            *v = args.new_value;
        }
    }
    args.access.write_local(args.on, args.bounds.lo, &local);
}

/// Replaces every element equal to `old_value` with `new_value`.
pub fn replace<R, It, A>(
    rt: &R,
    begin: It,
    end: It,
    access: &A,
    old_value: A::Item,
    new_value: A::Item,
    policy: impl Into<ExecutionPolicy>,
) -> Result<()>
where
    R: Dispatcher,
    It: DistributedIterator,
    A: LocalAccess,
    A::Item: PartialEq,
{
    dispatch_per_locality(
        rt,
        begin,
        end,
        policy.into(),
        |loc, bounds| ReplaceArgs { access: access.clone(), on: loc, bounds, old_value, new_value },
        replace_kernel::<A>,
    )
}

struct GenerateArgs<A: LocalAccess> {
    access: A,
    on: Locality,
    bounds: LocalBounds,
    global_start: u64,
    gen: fn(u64) -> A::Item,
}

fn generate_kernel<A: LocalAccess>(args: &GenerateArgs<A>) {
    if args.bounds.is_empty() {
        return;
    }
    let values: Vec<A::Item> = (0..args.bounds.len() as u64)
        .map(|i| (args.gen)(args.global_start + i))
        .collect();
    args.access.write_local(args.on, args.bounds.lo, &values);
}

/// Calls `gen(i)` for each global index `i` of `[begin, end)` and writes
/// the result in place.
///
/// A sequential, stateful generator would invoke a fixed number of
/// "phantom" times per locality purely to keep its internal call counter
/// aligned with global index, so that the element at global index `k`
/// equals the generator's `k`-th invocation. Because kernels here are
/// required to be stateless, that alignment is free: `gen` already
/// receives the exact global index, so `gen(k)` trivially *is* the
/// generator's `k`-th invocation, with no phantom calls needed.
pub fn generate<R, It, A>(
    rt: &R,
    begin: It,
    end: It,
    access: &A,
    gen: fn(u64) -> A::Item,
    policy: impl Into<ExecutionPolicy>,
) -> Result<()>
where
    R: Dispatcher,
    It: DistributedIterator,
    A: LocalAccess,
{
    dispatch_per_locality(
        rt,
        begin,
        end,
        policy.into(),
        |loc, bounds| {
            let global_start = It::lift_local(begin, end, loc, bounds.lo).offset_from(begin) as u64;
            GenerateArgs { access: access.clone(), on: loc, bounds, global_start, gen }
        },
        generate_kernel::<A>,
    )
}

struct TransformArgs<A: LocalAccess, OutItem> {
    access: A,
    on: Locality,
    bounds: LocalBounds,
    f: fn(&A::Item) -> OutItem,
}

fn transform_kernel<A, OutItem>(args: &TransformArgs<A, OutItem>) -> Vec<OutItem>
where
    A: LocalAccess,
    OutItem: Copy + Send + Sync + 'static,
{
    if args.bounds.is_empty() {
        return Vec::new();
    }
    let local = args.access.read_local(args.on, args.bounds);
    local.iter().map(args.f).collect()
}

/// Applies `f` to every element of `[begin, end)`, writing results into
/// the range starting at `out_begin` of a (possibly differently
/// distributed, possibly distinct) output container.
///
/// Each locality's local transform result is scattered into its
/// globally-aligned output position via [`write_aligned_window`] — the
/// copy-based reading of "advance the output iterator by the alignment
/// distance before writing". Takes a policy argument for signature
/// consistency with every other algorithm in this module, though the
/// per-locality compute is always synchronous here: the scatter write has
/// nothing to overlap it with.
#[allow(clippy::too_many_arguments)]
pub fn transform<R, It, A, OutIt, OutA>(
    rt: &R,
    begin: It,
    end: It,
    access: &A,
    f: fn(&A::Item) -> OutA::Item,
    out_begin: OutIt,
    out_end: OutIt,
    out_access: &OutA,
    _policy: impl Into<ExecutionPolicy>,
) -> Result<()>
where
    R: Dispatcher,
    It: DistributedIterator,
    A: LocalAccess,
    OutIt: DistributedIterator,
    OutA: LocalAccess,
{
    for loc in It::localities(begin, end).iter() {
        let bounds = It::local_bounds(begin, end, loc);
        if bounds.is_empty() {
            continue;
        }
        let global_start = It::lift_local(begin, end, loc, bounds.lo).offset_from(begin);
        let args = TransformArgs::<A, OutA::Item> { access: access.clone(), on: loc, bounds, f };
        let transformed = rt.execute_at_with_result(loc, transform_kernel::<A, OutA::Item>, args)?;
        write_aligned_window(rt, out_begin, out_end, out_access, global_start, &transformed)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::ExecutionPolicy;
    use crate::testing::{DistVec, LoopbackRuntime};

    #[test]
    fn for_each_increments_every_element() {
        let rt = LoopbackRuntime::new(4, 2);
        let dv = DistVec::from_vec(vec![1i64; 10001], 4);
        let access = dv.access();
        for_each(&*rt, dv.begin(), dv.end(), &access, |v| *v += 1, ExecutionPolicy::default()).unwrap();
        for_each(&*rt, dv.begin(), dv.end(), &access, |v| *v += 1, ExecutionPolicy::default()).unwrap();
        assert!(dv.to_vec().iter().all(|&v| v == 3));
    }

    #[test]
    fn fill_overwrites_whole_range() {
        let rt = LoopbackRuntime::new(3, 2);
        let dv = DistVec::from_vec(vec![0i64; 97], 3);
        let access = dv.access();
        fill(&*rt, dv.begin(), dv.end(), &access, 9, ExecutionPolicy::default()).unwrap();
        assert!(dv.to_vec().iter().all(|&v| v == 9));
    }

    #[test]
    fn generate_aligns_with_global_index() {
        let rt = LoopbackRuntime::new(5, 2);
        let dv = DistVec::from_vec(vec![0i64; 1000], 5);
        let access = dv.access();
        generate(&*rt, dv.begin(), dv.end(), &access, |i| i as i64 * 2, ExecutionPolicy::default()).unwrap();
        let expected: Vec<i64> = (0..1000).map(|i| i * 2).collect();
        assert_eq!(dv.to_vec(), expected);
    }

    #[test]
    fn transform_writes_aligned_output() {
        let rt = LoopbackRuntime::new(3, 2);
        let input = DistVec::from_vec((0..500i64).collect(), 3);
        let output = DistVec::from_vec(vec![0i64; 500], 4);
        let in_access = input.access();
        let out_access = output.access();
        transform(
            &*rt,
            input.begin(),
            input.end(),
            &in_access,
            |v| v * 3,
            output.begin(),
            output.end(),
            &out_access,
            ExecutionPolicy::default(),
        )
        .unwrap();
        let expected: Vec<i64> = (0..500).map(|v| v * 3).collect();
        assert_eq!(output.to_vec(), expected);
    }
}
