//! Prefix operations: inclusive_scan, exclusive_scan,
//! transform_inclusive_scan, transform_exclusive_scan, partial_sum,
//! adjacent_difference, iota.
//!
//! Every scan here is two-phase: Phase A dispatches one kernel
//! per locality that scans *only its own local slice*, independent of every
//! other locality, so it can run under either execution policy exactly like
//! [`super::reduce::reduce`]. Phase B then walks the per-locality results in
//! locality order, threading a running carry forward and writing the final,
//! carry-adjusted values — this half is inherently sequential no matter
//! which policy governs Phase A, since locality `k`'s final values depend on
//! every locality before it.
//!
//! Associativity of `op` is what makes rebasing by a single `op` application
//! sound: a locality's local inclusive scan is `fold(local[0..=i])`, and
//! prefixing the true carry via `op(carry, local[0..=i])` equals the scan of
//! `carry, local[0], ..., local[i]` only because `op` doesn't care how its
//! operands were grouped.

use super::common::{run_and_fold, write_aligned_window};
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::iter::{DistributedIterator, LocalAccess, LocalBounds};
use crate::locality::Locality;
use crate::policy::ExecutionPolicy;

struct PhaseAArgs<A: LocalAccess, It: DistributedIterator> {
    access: A,
    begin: It,
    end: It,
    on: Locality,
    xform: fn(&A::Item) -> A::Item,
    op: fn(A::Item, A::Item) -> A::Item,
}

/// One locality's contribution to Phase A: its own local inclusive scan
/// (computed with no knowledge of any other locality's carry), the global
/// offset it starts at, and the local total (the same as the scan's last
/// value — kept separate so an empty locality can report `None`).
struct PhaseAOut<Item> {
    global_start: usize,
    values: Vec<Item>,
    total: Option<Item>,
}

fn phase_a_kernel<A, It>(args: &PhaseAArgs<A, It>) -> PhaseAOut<A::Item>
where
    A: LocalAccess,
    It: DistributedIterator,
{
    let bounds = It::local_bounds(args.begin, args.end, args.on);
    if bounds.is_empty() {
        return PhaseAOut { global_start: 0, values: Vec::new(), total: None };
    }
    let global_start = It::lift_local(args.begin, args.end, args.on, bounds.lo).offset_from(args.begin);
    let local = args.access.read_local(args.on, bounds);
    let mut values: Vec<A::Item> = local.iter().map(args.xform).collect();
    for i in 1..values.len() {
        values[i] = (args.op)(values[i - 1], values[i]);
    }
    let total = values.last().copied();
    PhaseAOut { global_start, values, total }
}

fn identity<T: Copy>(v: &T) -> T {
    *v
}

/// Writes the inclusive scan of `[begin, end)` under `op` into the range
/// starting at `out_begin`. No `init` — the first element seeds itself,
/// matching `std::inclusive_scan` without an init value.
#[allow(clippy::too_many_arguments)]
pub fn inclusive_scan<R, It, A, OutIt, OutA>(
    rt: &R,
    begin: It,
    end: It,
    access: &A,
    op: fn(A::Item, A::Item) -> A::Item,
    out_begin: OutIt,
    out_end: OutIt,
    out_access: &OutA,
    policy: impl Into<ExecutionPolicy>,
) -> Result<()>
where
    R: Dispatcher,
    It: DistributedIterator,
    A: LocalAccess,
    OutIt: DistributedIterator,
    OutA: LocalAccess<Item = A::Item>,
{
    transform_inclusive_scan(rt, begin, end, access, identity::<A::Item>, op, out_begin, out_end, out_access, policy)
}

/// [`inclusive_scan`], applying `xform` to each element before combining —
/// the analogue of [`super::reduce::transform_reduce`] for scans.
#[allow(clippy::too_many_arguments)]
pub fn transform_inclusive_scan<R, It, A, OutIt, OutA>(
    rt: &R,
    begin: It,
    end: It,
    access: &A,
    xform: fn(&A::Item) -> A::Item,
    op: fn(A::Item, A::Item) -> A::Item,
    out_begin: OutIt,
    out_end: OutIt,
    out_access: &OutA,
    policy: impl Into<ExecutionPolicy>,
) -> Result<()>
where
    R: Dispatcher,
    It: DistributedIterator,
    A: LocalAccess,
    OutIt: DistributedIterator,
    OutA: LocalAccess<Item = A::Item>,
{
    let localities = It::localities(begin, end);
    run_and_fold(
        rt,
        localities,
        policy.into(),
        phase_a_kernel::<A, It>,
        |loc| PhaseAArgs { access: access.clone(), begin, end, on: loc, xform, op },
        None::<A::Item>,
        |carry, out| {
            if out.values.is_empty() {
                return Ok((carry, false));
            }
            let committed: Vec<A::Item> = match carry {
                None => out.values.clone(),
                Some(c) => out.values.iter().map(|v| op(c, *v)).collect(),
            };
            write_aligned_window(rt, out_begin, out_end, out_access, out.global_start, &committed)?;
            let new_carry = match carry {
                None => out.total.expect("non-empty locality reports a total"),
                Some(c) => op(c, out.total.expect("non-empty locality reports a total")),
            };
            Ok((Some(new_carry), false))
        },
    )?;
    Ok(())
}

/// Writes the exclusive scan of `[begin, end)` under `op`, seeded by `init`:
/// `out[i]` is the fold of every element strictly before global index `i`,
/// with `init` prefixed (`out[0] == init`).
#[allow(clippy::too_many_arguments)]
pub fn exclusive_scan<R, It, A, OutIt, OutA>(
    rt: &R,
    begin: It,
    end: It,
    access: &A,
    init: A::Item,
    op: fn(A::Item, A::Item) -> A::Item,
    out_begin: OutIt,
    out_end: OutIt,
    out_access: &OutA,
    policy: impl Into<ExecutionPolicy>,
) -> Result<()>
where
    R: Dispatcher,
    It: DistributedIterator,
    A: LocalAccess,
    OutIt: DistributedIterator,
    OutA: LocalAccess<Item = A::Item>,
{
    transform_exclusive_scan(rt, begin, end, access, init, identity::<A::Item>, op, out_begin, out_end, out_access, policy)
}

/// [`exclusive_scan`], applying `xform` to each element before combining.
#[allow(clippy::too_many_arguments)]
pub fn transform_exclusive_scan<R, It, A, OutIt, OutA>(
    rt: &R,
    begin: It,
    end: It,
    access: &A,
    init: A::Item,
    xform: fn(&A::Item) -> A::Item,
    op: fn(A::Item, A::Item) -> A::Item,
    out_begin: OutIt,
    out_end: OutIt,
    out_access: &OutA,
    policy: impl Into<ExecutionPolicy>,
) -> Result<()>
where
    R: Dispatcher,
    It: DistributedIterator,
    A: LocalAccess,
    OutIt: DistributedIterator,
    OutA: LocalAccess<Item = A::Item>,
{
    let localities = It::localities(begin, end);
    run_and_fold(
        rt,
        localities,
        policy.into(),
        phase_a_kernel::<A, It>,
        |loc| PhaseAArgs { access: access.clone(), begin, end, on: loc, xform, op },
        init,
        |carry, out| {
            if out.values.is_empty() {
                return Ok((carry, false));
            }
            let mut committed = Vec::with_capacity(out.values.len());
            let mut prefix = carry;
            for v in &out.values {
                committed.push(prefix);
                prefix = op(prefix, *v);
            }
            write_aligned_window(rt, out_begin, out_end, out_access, out.global_start, &committed)?;
            Ok((prefix, false))
        },
    )?;
    Ok(())
}

/// `partial_sum(r, out) = inclusive_scan(r, +, out)`.
pub fn partial_sum<R, It, A, OutIt, OutA>(
    rt: &R,
    begin: It,
    end: It,
    access: &A,
    out_begin: OutIt,
    out_end: OutIt,
    out_access: &OutA,
    policy: impl Into<ExecutionPolicy>,
) -> Result<()>
where
    R: Dispatcher,
    It: DistributedIterator,
    A: LocalAccess,
    A::Item: std::ops::Add<Output = A::Item>,
    OutIt: DistributedIterator,
    OutA: LocalAccess<Item = A::Item>,
{
    inclusive_scan(rt, begin, end, access, |a, b| a + b, out_begin, out_end, out_access, policy)
}

struct RawReadArgs<A: LocalAccess, It: DistributedIterator> {
    access: A,
    begin: It,
    end: It,
    on: Locality,
}

fn raw_read_kernel<A, It>(args: &RawReadArgs<A, It>) -> PhaseAOut<A::Item>
where
    A: LocalAccess,
    It: DistributedIterator,
{
    let bounds = It::local_bounds(args.begin, args.end, args.on);
    if bounds.is_empty() {
        return PhaseAOut { global_start: 0, values: Vec::new(), total: None };
    }
    let global_start = It::lift_local(args.begin, args.end, args.on, bounds.lo).offset_from(args.begin);
    let values = args.access.read_local(args.on, bounds);
    let total = values.last().copied();
    PhaseAOut { global_start, values, total }
}

/// Writes `out[i] = op(in[i], in[i-1])` for every `i` of `[begin, end)`,
/// except `out[0] = in[0]`.
///
/// Each locality after the first needs the raw last element of the
/// locality before it to compute its own first difference, so — unlike
/// [`inclusive_scan`] — this has no independent-per-locality Phase A and
/// takes no execution policy: the boundary dependency forces strict
/// locality-order visitation regardless.
pub fn adjacent_difference<R, It, A, OutIt, OutA>(
    rt: &R,
    begin: It,
    end: It,
    access: &A,
    op: fn(A::Item, A::Item) -> A::Item,
    out_begin: OutIt,
    out_end: OutIt,
    out_access: &OutA,
) -> Result<()>
where
    R: Dispatcher,
    It: DistributedIterator,
    A: LocalAccess,
    OutIt: DistributedIterator,
    OutA: LocalAccess<Item = A::Item>,
{
    let localities = It::localities(begin, end);
    run_and_fold(
        rt,
        localities,
        ExecutionPolicy::ParallelAcrossLocalities,
        raw_read_kernel::<A, It>,
        |loc| RawReadArgs { access: access.clone(), begin, end, on: loc },
        None::<A::Item>,
        |prev_last, out| {
            if out.values.is_empty() {
                return Ok((prev_last, false));
            }
            let mut diffs = Vec::with_capacity(out.values.len());
            let mut prior = prev_last;
            for v in &out.values {
                diffs.push(match prior {
                    Some(p) => op(*v, p),
                    None => *v,
                });
                prior = Some(*v);
            }
            write_aligned_window(rt, out_begin, out_end, out_access, out.global_start, &diffs)?;
            Ok((out.values.last().copied(), false))
        },
    )?;
    Ok(())
}

/// A type whose values have a well-defined `++` successor, generalizing
/// `std::iota` beyond integers to any type supporting `++`.
///
/// `advance_by` defaults to repeated `successor()`, which is all a type with
/// no faster notion of "add n" can offer; integer types override it with
/// plain addition so `iota` stays O(1) per element instead of O(n) per
/// locality.
pub trait Successor: Copy + Send + Sync + 'static {
    fn successor(self) -> Self;

    fn advance_by(self, n: u64) -> Self {
        let mut v = self;
        for _ in 0..n {
            v = v.successor();
        }
        v
    }
}

macro_rules! impl_successor_int {
    ($($t:ty),*) => {
        $(
            impl Successor for $t {
                fn successor(self) -> Self {
                    self + 1
                }
                fn advance_by(self, n: u64) -> Self {
                    self + n as $t
                }
            }
        )*
    };
}

impl_successor_int!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

struct IotaArgs<A: LocalAccess> {
    access: A,
    on: Locality,
    bounds: LocalBounds,
    start: A::Item,
    global_start: u64,
}

fn iota_kernel<A>(args: &IotaArgs<A>)
where
    A: LocalAccess,
    A::Item: Successor,
{
    if args.bounds.is_empty() {
        return;
    }
    let values: Vec<A::Item> = (0..args.bounds.len() as u64)
        .map(|i| args.start.advance_by(args.global_start + i))
        .collect();
    args.access.write_local(args.on, args.bounds.lo, &values);
}

/// Fills `[begin, end)` with the successive `++`-successors of `start`,
/// aligned to global index: global index `i` gets `start.advance_by(i)`.
pub fn iota<R, It, A>(
    rt: &R,
    begin: It,
    end: It,
    access: &A,
    start: A::Item,
    policy: impl Into<ExecutionPolicy>,
) -> Result<()>
where
    R: Dispatcher,
    It: DistributedIterator,
    A: LocalAccess,
    A::Item: Successor,
{
    let policy = policy.into();
    let localities = It::localities(begin, end);
    if policy.is_sequential() {
        for loc in localities.iter() {
            let bounds = It::local_bounds(begin, end, loc);
            let global_start = It::lift_local(begin, end, loc, bounds.lo).offset_from(begin) as u64;
            let args = IotaArgs { access: access.clone(), on: loc, bounds, start, global_start };
            rt.execute_at(loc, iota_kernel::<A>, args)?;
        }
        Ok(())
    } else {
        let handle = crate::handle::Handle::create();
        for loc in localities.iter() {
            let bounds = It::local_bounds(begin, end, loc);
            let global_start = It::lift_local(begin, end, loc, bounds.lo).offset_from(begin) as u64;
            let args = IotaArgs { access: access.clone(), on: loc, bounds, start, global_start };
            rt.execute_at_async(loc, &handle, iota_kernel::<A>, args)?;
        }
        handle.wait_for_completion()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::ExecutionPolicy;
    use crate::testing::{DistVec, LoopbackRuntime};

    #[test]
    fn inclusive_scan_matches_sequential_fold() {
        let rt = LoopbackRuntime::new(4, 2);
        let input = DistVec::from_vec((1..=40i64).collect(), 4);
        let output = DistVec::from_vec(vec![0i64; 40], 4);
        let in_access = input.access();
        let out_access = output.access();
        partial_sum(
            &*rt,
            input.begin(),
            input.end(),
            &in_access,
            output.begin(),
            output.end(),
            &out_access,
            ExecutionPolicy::ParallelAcrossLocalities,
        )
        .unwrap();
        let mut expected = Vec::with_capacity(40);
        let mut running = 0i64;
        for v in 1..=40i64 {
            running += v;
            expected.push(running);
        }
        assert_eq!(output.to_vec(), expected);
    }

    #[test]
    fn exclusive_scan_is_inclusive_shifted_by_one() {
        let rt = LoopbackRuntime::new(5, 2);
        let input = DistVec::from_vec((0..97i64).collect(), 5);
        let inclusive_out = DistVec::from_vec(vec![0i64; 97], 5);
        let exclusive_out = DistVec::from_vec(vec![0i64; 97], 5);
        let in_access = input.access();
        let inc_access = inclusive_out.access();
        let exc_access = exclusive_out.access();
        inclusive_scan(
            &*rt,
            input.begin(),
            input.end(),
            &in_access,
            |a, b| a + b,
            inclusive_out.begin(),
            inclusive_out.end(),
            &inc_access,
            ExecutionPolicy::default(),
        )
        .unwrap();
        exclusive_scan(
            &*rt,
            input.begin(),
            input.end(),
            &in_access,
            0,
            |a, b| a + b,
            exclusive_out.begin(),
            exclusive_out.end(),
            &exc_access,
            ExecutionPolicy::default(),
        )
        .unwrap();
        let inc = inclusive_out.to_vec();
        let exc = exclusive_out.to_vec();
        assert_eq!(exc[0], 0);
        for i in 1..97 {
            assert_eq!(exc[i], inc[i - 1]);
        }
    }

    #[test]
    fn adjacent_difference_round_trips_with_partial_sum() {
        let rt = LoopbackRuntime::new(3, 2);
        let input = DistVec::from_vec(vec![5, 2, 9, 1, 7, 3, 8, 4, 6, 0, 11, 13], 3);
        let diffs = DistVec::from_vec(vec![0i64; 12], 3);
        let recovered = DistVec::from_vec(vec![0i64; 12], 3);
        let in_access = input.access();
        let diff_access = diffs.access();
        let rec_access = recovered.access();
        adjacent_difference(&*rt, input.begin(), input.end(), &in_access, |a, b| a - b, diffs.begin(), diffs.end(), &diff_access).unwrap();
        partial_sum(&*rt, diffs.begin(), diffs.end(), &diff_access, recovered.begin(), recovered.end(), &rec_access, ExecutionPolicy::default()).unwrap();
        assert_eq!(recovered.to_vec(), input.to_vec());
    }

    #[test]
    fn iota_fills_sequential_values() {
        let rt = LoopbackRuntime::new(4, 2);
        let dv = DistVec::from_vec(vec![0i64; 1001], 4);
        let access = dv.access();
        iota(&*rt, dv.begin(), dv.end(), &access, 10, ExecutionPolicy::default()).unwrap();
        let expected: Vec<i64> = (0..1001).map(|i| 10 + i).collect();
        assert_eq!(dv.to_vec(), expected);
    }
}
