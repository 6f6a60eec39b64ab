//! Short-circuiting search: any_of / all_of / none_of / find / find_if /
//! find_if_not / equal / lexicographical_compare.
//!
//! Under the sequential policy, localities are visited in order and the
//! first locality producing a terminating result short-circuits the rest.
//! Under the parallel policy every per-locality kernel runs under one
//! handle and the caller scans the collected results in locality order —
//! ties resolve to the lowest locality id either way, so `find` returns the
//! same answer under both policies.

use super::common::{read_aligned_window, run_and_fold};
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::iter::{DistributedIterator, LocalAccess, LocalBounds};
use crate::locality::Locality;
use crate::policy::ExecutionPolicy;

struct PredArgs<A: LocalAccess, It: DistributedIterator> {
    access: A,
    begin: It,
    end: It,
    on: Locality,
    pred: fn(&A::Item) -> bool,
    negate: bool,
}

fn pred_kernel<A: LocalAccess, It: DistributedIterator>(args: &PredArgs<A, It>) -> Option<It> {
    let bounds = It::local_bounds(args.begin, args.end, args.on);
    if bounds.is_empty() {
        return None;
    }
    let local = args.access.read_local(args.on, bounds);
    for (i, v) in local.iter().enumerate() {
        if (args.pred)(v) != args.negate {
            return Some(It::lift_local(args.begin, args.end, args.on, bounds.lo + i));
        }
    }
    None
}

fn search_by_pred<R, It, A>(
    rt: &R,
    begin: It,
    end: It,
    access: &A,
    pred: fn(&A::Item) -> bool,
    negate: bool,
    policy: ExecutionPolicy,
) -> Result<Option<It>>
where
    R: Dispatcher,
    It: DistributedIterator,
    A: LocalAccess,
{
    let localities = It::localities(begin, end);
    run_and_fold(
        rt,
        localities,
        policy,
        pred_kernel::<A, It>,
        |loc| PredArgs { access: access.clone(), begin, end, on: loc, pred, negate },
        None,
        |_acc, out| match out {
            Some(it) => Ok((Some(it), true)),
            None => Ok((None, false)),
        },
    )
}

/// First element for which `pred` holds, or `end` if none does.
pub fn find_if<R, It, A>(
    rt: &R,
    begin: It,
    end: It,
    access: &A,
    pred: fn(&A::Item) -> bool,
    policy: impl Into<ExecutionPolicy>,
) -> Result<It>
where
    R: Dispatcher,
    It: DistributedIterator,
    A: LocalAccess,
{
    Ok(search_by_pred(rt, begin, end, access, pred, false, policy.into())?.unwrap_or(end))
}

/// First element for which `pred` does *not* hold, or `end` if every
/// element satisfies it. Implemented by delegating to [`find_if`] with the
/// predicate's negation baked into the shared kernel.
pub fn find_if_not<R, It, A>(
    rt: &R,
    begin: It,
    end: It,
    access: &A,
    pred: fn(&A::Item) -> bool,
    policy: impl Into<ExecutionPolicy>,
) -> Result<It>
where
    R: Dispatcher,
    It: DistributedIterator,
    A: LocalAccess,
{
    Ok(search_by_pred(rt, begin, end, access, pred, true, policy.into())?.unwrap_or(end))
}

/// `true` if `pred` holds for at least one element.
pub fn any_of<R, It, A>(
    rt: &R,
    begin: It,
    end: It,
    access: &A,
    pred: fn(&A::Item) -> bool,
    policy: impl Into<ExecutionPolicy>,
) -> Result<bool>
where
    R: Dispatcher,
    It: DistributedIterator,
    A: LocalAccess,
{
    Ok(search_by_pred(rt, begin, end, access, pred, false, policy.into())?.is_some())
}

/// `true` if `pred` holds for every element (vacuously true on an empty
/// range).
pub fn all_of<R, It, A>(
    rt: &R,
    begin: It,
    end: It,
    access: &A,
    pred: fn(&A::Item) -> bool,
    policy: impl Into<ExecutionPolicy>,
) -> Result<bool>
where
    R: Dispatcher,
    It: DistributedIterator,
    A: LocalAccess,
{
    Ok(search_by_pred(rt, begin, end, access, pred, true, policy.into())?.is_none())
}

/// `true` if `pred` holds for no element.
pub fn none_of<R, It, A>(
    rt: &R,
    begin: It,
    end: It,
    access: &A,
    pred: fn(&A::Item) -> bool,
    policy: impl Into<ExecutionPolicy>,
) -> Result<bool>
where
    R: Dispatcher,
    It: DistributedIterator,
    A: LocalAccess,
{
    Ok(!any_of(rt, begin, end, access, pred, policy)?)
}

struct FindArgs<A: LocalAccess, It: DistributedIterator> {
    access: A,
    begin: It,
    end: It,
    on: Locality,
    needle: A::Item,
}

fn find_kernel<A, It>(args: &FindArgs<A, It>) -> Option<It>
where
    A: LocalAccess,
    A::Item: PartialEq,
    It: DistributedIterator,
{
    let bounds = It::local_bounds(args.begin, args.end, args.on);
    if bounds.is_empty() {
        return None;
    }
    let local = args.access.read_local(args.on, bounds);
    for (i, v) in local.iter().enumerate() {
        if *v == args.needle {
            return Some(It::lift_local(args.begin, args.end, args.on, bounds.lo + i));
        }
    }
    None
}

/// First element equal to `needle`, or `end` if absent.
pub fn find<R, It, A>(
    rt: &R,
    begin: It,
    end: It,
    access: &A,
    needle: A::Item,
    policy: impl Into<ExecutionPolicy>,
) -> Result<It>
where
    R: Dispatcher,
    It: DistributedIterator,
    A: LocalAccess,
    A::Item: PartialEq,
{
    let localities = It::localities(begin, end);
    let found = run_and_fold(
        rt,
        localities,
        policy.into(),
        find_kernel::<A, It>,
        |loc| FindArgs { access: access.clone(), begin, end, on: loc, needle },
        None,
        |_acc, out| match out {
            Some(it) => Ok((Some(it), true)),
            None => Ok((None, false)),
        },
    )?;
    Ok(found.unwrap_or(end))
}

struct EqualArgs<A: LocalAccess> {
    access: A,
    on: Locality,
    bounds: LocalBounds,
    other: Vec<A::Item>,
}

fn equal_kernel<A>(args: &EqualArgs<A>) -> bool
where
    A: LocalAccess,
    A::Item: PartialEq,
{
    let local = args.access.read_local(args.on, args.bounds);
    local == args.other
}

/// `true` if `[begin1, end1)` and the equal-length range starting at
/// `begin2` compare element-wise equal. Behavior is undefined if range 2
/// is shorter than range 1 — callers must check lengths first.
#[allow(clippy::too_many_arguments)]
pub fn equal<R, It1, A1, It2, A2>(
    rt: &R,
    begin1: It1,
    end1: It1,
    access1: &A1,
    begin2: It2,
    end2: It2,
    access2: &A2,
    policy: impl Into<ExecutionPolicy>,
) -> Result<bool>
where
    R: Dispatcher,
    It1: DistributedIterator,
    A1: LocalAccess,
    It2: DistributedIterator,
    A2: LocalAccess<Item = A1::Item>,
    A1::Item: PartialEq,
{
    let policy = policy.into();
    let localities = It1::localities(begin1, end1);
    // Fetched up front, and propagated with `?`, rather than inside
    // `args_for`: that closure runs under `run_and_fold`'s infallible
    // contract, so a dispatch error reading range 2 must surface here, not
    // be swallowed into a spurious `false`.
    let windows: Vec<Vec<A1::Item>> = localities
        .iter()
        .map(|loc| {
            let bounds = It1::local_bounds(begin1, end1, loc);
            let global_start = It1::lift_local(begin1, end1, loc, bounds.lo).offset_from(begin1);
            read_aligned_window(rt, begin2, end2, access2, global_start, bounds.len())
        })
        .collect::<Result<_>>()?;
    let mut windows = windows.into_iter();
    run_and_fold(
        rt,
        localities,
        policy,
        equal_kernel::<A1>,
        |loc| {
            let bounds = It1::local_bounds(begin1, end1, loc);
            let other = windows.next().expect("one aligned window per locality");
            EqualArgs { access: access1.clone(), on: loc, bounds, other }
        },
        true,
        |acc, out| Ok((acc && out, policy.is_sequential() && !out)),
    )
}

/// The outcome of comparing one locality's local slice against the aligned
/// window of the second range, used to fold `lexicographical_compare`
/// across localities in order.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Ordering3 {
    Less,
    Greater,
    EqualSoFar,
}

struct LexArgs<A: LocalAccess> {
    access: A,
    on: Locality,
    bounds: LocalBounds,
    other: Vec<A::Item>,
}

fn lex_kernel<A>(args: &LexArgs<A>) -> Ordering3
where
    A: LocalAccess,
    A::Item: PartialOrd,
{
    let local = args.access.read_local(args.on, args.bounds);
    for (a, b) in local.iter().zip(args.other.iter()) {
        if a < b {
            return Ordering3::Less;
        }
        if a > b {
            return Ordering3::Greater;
        }
    }
    Ordering3::EqualSoFar
}

/// Lexicographical comparison of `[begin1, end1)` against `[begin2, end2)`,
/// accounting for differing lengths: the shorter of two otherwise-equal
/// prefixes is "less". Each locality of range 1 compares against the
/// aligned, possibly truncated, window of range 2; results fold in
/// locality order with the first non-`EqualSoFar` verdict winning.
#[allow(clippy::too_many_arguments)]
pub fn lexicographical_compare<R, It1, A1, It2, A2>(
    rt: &R,
    begin1: It1,
    end1: It1,
    access1: &A1,
    begin2: It2,
    end2: It2,
    access2: &A2,
    policy: impl Into<ExecutionPolicy>,
) -> Result<bool>
where
    R: Dispatcher,
    It1: DistributedIterator,
    A1: LocalAccess,
    It2: DistributedIterator,
    A2: LocalAccess<Item = A1::Item>,
    A1::Item: PartialOrd,
{
    let policy = policy.into();
    let len1 = It1::global_len(begin1, end1);
    let len2 = It2::global_len(begin2, end2);
    let localities = It1::localities(begin1, end1);
    // Same reasoning as `equal`: pre-fetch so a dispatch error propagates
    // with `?` instead of being swallowed into a spurious ordering.
    let windows: Vec<Vec<A1::Item>> = localities
        .iter()
        .map(|loc| {
            let bounds = It1::local_bounds(begin1, end1, loc);
            let global_start = It1::lift_local(begin1, end1, loc, bounds.lo).offset_from(begin1);
            let window_len = bounds.len().min(len2.saturating_sub(global_start));
            read_aligned_window(rt, begin2, end2, access2, global_start, window_len)
        })
        .collect::<Result<_>>()?;
    let mut windows = windows.into_iter();
    let verdict = run_and_fold(
        rt,
        localities,
        policy,
        lex_kernel::<A1>,
        |loc| {
            let bounds = It1::local_bounds(begin1, end1, loc);
            let other = windows.next().expect("one aligned window per locality");
            LexArgs { access: access1.clone(), on: loc, bounds, other }
        },
        Ordering3::EqualSoFar,
        |acc, out| {
            if acc != Ordering3::EqualSoFar {
                Ok((acc, true))
            } else {
                Ok((out, out != Ordering3::EqualSoFar))
            }
        },
    )?;
    Ok(match verdict {
        Ordering3::Less => true,
        Ordering3::Greater => false,
        Ordering3::EqualSoFar => len1 < len2,
    })
}
