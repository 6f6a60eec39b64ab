//! Folds: reduce, accumulate, inner_product, transform_reduce.
//!
//! Sequential policy threads a single accumulator locality-to-locality, a
//! true left-fold of the flattened global sequence — `op` need not be
//! associative, which is what makes [`accumulate`] sound for ops like
//! subtraction where grouping changes the answer. Parallel policy instead
//! computes one partial fold per locality independently and combines them
//! on the caller with the same `op`, which only needs `op` to be
//! associative but lets every locality's dispatch overlap.

use super::common::read_aligned_window;
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::handle::Handle;
use crate::iter::{DistributedIterator, LocalAccess};
use crate::locality::Locality;
use crate::policy::ExecutionPolicy;

struct FoldArgs<A: LocalAccess> {
    access: A,
    on: Locality,
    bounds: crate::iter::LocalBounds,
    op: fn(A::Item, A::Item) -> A::Item,
}

/// Folds a locality's own local slice starting from its own first element
/// (not from any running accumulator). Used only by the parallel policy,
/// where every locality's raw partial is combined with `init` by the
/// caller afterward — sound whenever `op` is associative.
fn fold_kernel<A: LocalAccess>(args: &FoldArgs<A>) -> Option<A::Item> {
    let local = args.access.read_local(args.on, args.bounds);
    local.into_iter().reduce(args.op)
}

struct FoldFromArgs<A: LocalAccess> {
    access: A,
    on: Locality,
    bounds: crate::iter::LocalBounds,
    carry: A::Item,
    op: fn(A::Item, A::Item) -> A::Item,
}

/// Folds a locality's own local slice starting from the accumulator carried
/// in from every locality visited before it, so dispatching this kernel
/// once per locality in order, threading the result forward as `carry`,
/// reproduces the single-threaded left-fold of the flattened sequence
/// without assuming `op` is associative.
fn fold_from_kernel<A: LocalAccess>(args: &FoldFromArgs<A>) -> A::Item {
    let local = args.access.read_local(args.on, args.bounds);
    local.into_iter().fold(args.carry, args.op)
}

/// Folds `[begin, end)` with `op`, starting from `init`.
///
/// Under the sequential policy this is a true left-fold: `init` is carried
/// locality-to-locality as the running accumulator, one dispatch at a time,
/// so the result equals the single-threaded fold of the flattened global
/// sequence regardless of whether `op` is associative. Under the parallel
/// policy every locality's raw local fold is computed independently and
/// then combined with `init` on the caller, which only needs `op` to be
/// associative but lets every locality's dispatch run concurrently.
pub fn reduce<R, It, A>(
    rt: &R,
    begin: It,
    end: It,
    access: &A,
    init: A::Item,
    op: fn(A::Item, A::Item) -> A::Item,
    policy: impl Into<ExecutionPolicy>,
) -> Result<A::Item>
where
    R: Dispatcher,
    It: DistributedIterator,
    A: LocalAccess,
{
    let policy = policy.into();
    let localities = It::localities(begin, end);
    if policy.is_sequential() {
        let mut carry = init;
        for loc in localities.iter() {
            let bounds = It::local_bounds(begin, end, loc);
            let args = FoldFromArgs { access: access.clone(), on: loc, bounds, carry, op };
            carry = rt.execute_at_with_result(loc, fold_from_kernel::<A>, args)?;
        }
        Ok(carry)
    } else {
        let handle = Handle::create();
        let mut cells = Vec::new();
        for loc in localities.iter() {
            let bounds = It::local_bounds(begin, end, loc);
            let cell = crate::dispatch::ResultCell::new();
            let args = FoldArgs { access: access.clone(), on: loc, bounds, op };
            rt.execute_at_with_result_async(loc, &handle, fold_kernel::<A>, args, cell.clone())?;
            cells.push(cell);
        }
        handle.wait_for_completion()?;
        let partials: Vec<Option<A::Item>> = cells
            .into_iter()
            .map(|cell| cell.take().expect("drained handle implies filled cell"))
            .collect();
        Ok(partials.into_iter().flatten().fold(init, op))
    }
}

/// Strictly sequential fold — the order-sensitive counterpart of
/// [`reduce`], for ops that are not associative.
pub fn accumulate<R, It, A>(
    rt: &R,
    begin: It,
    end: It,
    access: &A,
    init: A::Item,
    op: fn(A::Item, A::Item) -> A::Item,
) -> Result<A::Item>
where
    R: Dispatcher,
    It: DistributedIterator,
    A: LocalAccess,
{
    reduce(rt, begin, end, access, init, op, ExecutionPolicy::SequentialAcrossLocalities)
}

struct TransformReduceArgs<A: LocalAccess, B> {
    access: A,
    on: Locality,
    bounds: crate::iter::LocalBounds,
    other: Vec<B>,
    combine: fn(A::Item, A::Item) -> A::Item,
    transform: fn(&A::Item, &B) -> A::Item,
}

fn transform_reduce_kernel<A, B>(args: &TransformReduceArgs<A, B>) -> Option<A::Item>
where
    A: LocalAccess,
    B: Copy + Send + Sync + 'static,
{
    let local = args.access.read_local(args.on, args.bounds);
    local
        .iter()
        .zip(args.other.iter())
        .map(|(a, b)| (args.transform)(a, b))
        .reduce(args.combine)
}

/// Pairs elements of `[begin1, end1)` with the aligned window of
/// `[begin2, end2)` (same alignment rule as [`super::search::equal`]),
/// applies `transform` to each pair, and folds the results with `combine`
/// starting from `init`.
///
/// `inner_product(r1, r2, init)` is `transform_reduce` with `transform =
/// (*, *)` and `combine = +`.
///
/// Takes a policy argument for call-site consistency with [`reduce`], but
/// each locality's own dispatch is already a synchronous
/// `execute_at_with_result` here, since the aligned-window read it depends
/// on is itself synchronous; there is no cross-locality overlap for a
/// parallel policy to buy.
#[allow(clippy::too_many_arguments)]
pub fn transform_reduce<R, It1, A1, It2, A2>(
    rt: &R,
    begin1: It1,
    end1: It1,
    access1: &A1,
    begin2: It2,
    end2: It2,
    access2: &A2,
    init: A1::Item,
    combine: fn(A1::Item, A1::Item) -> A1::Item,
    transform: fn(&A1::Item, &A2::Item) -> A1::Item,
    _policy: impl Into<ExecutionPolicy>,
) -> Result<A1::Item>
where
    R: Dispatcher,
    It1: DistributedIterator,
    A1: LocalAccess,
    It2: DistributedIterator,
    A2: LocalAccess,
{
    let localities = It1::localities(begin1, end1);
    let mut partials = Vec::new();
    for loc in localities.iter() {
        let bounds = It1::local_bounds(begin1, end1, loc);
        if bounds.is_empty() {
            continue;
        }
        let global_start = It1::lift_local(begin1, end1, loc, bounds.lo).offset_from(begin1);
        let other = read_aligned_window(rt, begin2, end2, access2, global_start, bounds.len())?;
        let args = TransformReduceArgs {
            access: access1.clone(),
            on: loc,
            bounds,
            other,
            combine,
            transform,
        };
        let partial = rt.execute_at_with_result(loc, transform_reduce_kernel::<A1, A2::Item>, args)?;
        partials.push(partial);
    }
    Ok(partials.into_iter().flatten().fold(init, combine))
}

/// `inner_product(r1, r2, init) = transform_reduce(r1, r2, init, +, *)`.
pub fn inner_product<R, It1, A1, It2, A2>(
    rt: &R,
    begin1: It1,
    end1: It1,
    access1: &A1,
    begin2: It2,
    end2: It2,
    access2: &A2,
    init: A1::Item,
    policy: impl Into<ExecutionPolicy>,
) -> Result<A1::Item>
where
    R: Dispatcher,
    It1: DistributedIterator,
    A1: LocalAccess,
    A1::Item: std::ops::Add<Output = A1::Item> + std::ops::Mul<Output = A1::Item>,
    It2: DistributedIterator,
    A2: LocalAccess<Item = A1::Item>,
{
    transform_reduce(
        rt,
        begin1,
        end1,
        access1,
        begin2,
        end2,
        access2,
        init,
        |a, b| a + b,
        |a, b| *a * *b,
        policy,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::ExecutionPolicy;
    use crate::testing::{DistVec, LoopbackRuntime};

    #[test]
    fn reduce_sums_sequential_and_parallel() {
        let rt = LoopbackRuntime::new(6, 2);
        let dv = DistVec::from_vec(vec![2i64; 42], 6);
        let access = dv.access();
        let seq = reduce(&*rt, dv.begin(), dv.end(), &access, 2, |a, b| a + b, ExecutionPolicy::SequentialAcrossLocalities).unwrap();
        assert_eq!(seq, 86);
        let par = reduce(&*rt, dv.begin(), dv.end(), &access, 2, |a, b| a + b, ExecutionPolicy::ParallelAcrossLocalities).unwrap();
        assert_eq!(par, 86);
    }

    #[test]
    fn reduce_product_over_constant_array() {
        let rt = LoopbackRuntime::new(6, 2);
        let dv = DistVec::from_vec(vec![2i64; 42], 6);
        let access = dv.access();
        let got = reduce(&*rt, dv.begin(), dv.end(), &access, 2, |a, b| a * b, ExecutionPolicy::SequentialAcrossLocalities).unwrap();
        assert_eq!(got, 2i64.pow(43));
    }

    #[test]
    fn accumulate_threads_init_across_localities_for_non_associative_op() {
        let rt = LoopbackRuntime::new(2, 2);
        let dv = DistVec::from_vec(vec![10i64, 3, 1], 2);
        let access = dv.access();
        let got = accumulate(&*rt, dv.begin(), dv.end(), &access, 0, |a, b| a - b).unwrap();
        assert_eq!(got, -14);
    }

    #[test]
    fn inner_product_of_constant_and_progression() {
        let rt = LoopbackRuntime::new(4, 2);
        let a = DistVec::from_vec(vec![2i64; 42], 4);
        let b = DistVec::from_vec((0..42).map(|i| i * 3).collect(), 4);
        let aa = a.access();
        let ba = b.access();
        let got = inner_product(&*rt, a.begin(), a.end(), &aa, b.begin(), b.end(), &ba, 2, ExecutionPolicy::default()).unwrap();
        assert_eq!(got, 5168);
    }
}
