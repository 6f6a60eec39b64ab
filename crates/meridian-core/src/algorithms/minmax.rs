//! Extremum tracking: min_element, max_element, minmax_element.
//!
//! Each locality finds its own first-occurring extremum (value plus the
//! global iterator pointing at it); the caller folds those per-locality
//! extrema across the locality range in order, replacing the running
//! extremum only on a *strict* improvement. That tie-breaking rule is what
//! makes the result "the first element achieving the minimum" rather than
//! an arbitrary one among ties.

use super::common::run_and_fold;
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::iter::{DistributedIterator, LocalAccess};
use crate::locality::Locality;
use crate::policy::ExecutionPolicy;

struct ExtremaArgs<A: LocalAccess, It: DistributedIterator> {
    access: A,
    begin: It,
    end: It,
    on: Locality,
}

/// One locality's first-occurring minimum and maximum, each paired with the
/// global iterator pointing at it. `None` only for an empty local slice.
struct LocalExtrema<A: LocalAccess, It: DistributedIterator> {
    min: Option<(A::Item, It)>,
    max: Option<(A::Item, It)>,
}

fn extrema_kernel<A, It>(args: &ExtremaArgs<A, It>) -> LocalExtrema<A, It>
where
    A: LocalAccess,
    A::Item: PartialOrd,
    It: DistributedIterator,
{
    let bounds = It::local_bounds(args.begin, args.end, args.on);
    if bounds.is_empty() {
        return LocalExtrema { min: None, max: None };
    }
    let local = args.access.read_local(args.on, bounds);
    let mut min = (local[0], It::lift_local(args.begin, args.end, args.on, bounds.lo));
    let mut max = min;
    for (i, v) in local.iter().enumerate().skip(1) {
        if *v < min.0 {
            min = (*v, It::lift_local(args.begin, args.end, args.on, bounds.lo + i));
        }
        if *v > max.0 {
            max = (*v, It::lift_local(args.begin, args.end, args.on, bounds.lo + i));
        }
    }
    LocalExtrema { min: Some(min), max: Some(max) }
}

fn keep_min<T: PartialOrd, It: Copy>(acc: Option<(T, It)>, out: Option<(T, It)>) -> Option<(T, It)> {
    match (acc, out) {
        (None, x) => x,
        (x, None) => x,
        (Some(a), Some(b)) => {
            if b.0 < a.0 {
                Some(b)
            } else {
                Some(a)
            }
        }
    }
}

fn keep_max<T: PartialOrd, It: Copy>(acc: Option<(T, It)>, out: Option<(T, It)>) -> Option<(T, It)> {
    match (acc, out) {
        (None, x) => x,
        (x, None) => x,
        (Some(a), Some(b)) => {
            if b.0 > a.0 {
                Some(b)
            } else {
                Some(a)
            }
        }
    }
}

fn extrema<R, It, A>(
    rt: &R,
    begin: It,
    end: It,
    access: &A,
    policy: ExecutionPolicy,
) -> Result<(Option<(A::Item, It)>, Option<(A::Item, It)>)>
where
    R: Dispatcher,
    It: DistributedIterator,
    A: LocalAccess,
    A::Item: PartialOrd,
{
    let localities = It::localities(begin, end);
    run_and_fold(
        rt,
        localities,
        policy,
        extrema_kernel::<A, It>,
        |loc| ExtremaArgs { access: access.clone(), begin, end, on: loc },
        (None, None),
        |(min_acc, max_acc), out| {
            Ok(((keep_min(min_acc, out.min), keep_max(max_acc, out.max)), false))
        },
    )
}

/// The first element achieving the minimum of `[begin, end)`, or `end` if
/// the range is empty.
pub fn min_element<R, It, A>(
    rt: &R,
    begin: It,
    end: It,
    access: &A,
    policy: impl Into<ExecutionPolicy>,
) -> Result<It>
where
    R: Dispatcher,
    It: DistributedIterator,
    A: LocalAccess,
    A::Item: PartialOrd,
{
    let (min, _) = extrema(rt, begin, end, access, policy.into())?;
    Ok(min.map(|(_, it)| it).unwrap_or(end))
}

/// The first element achieving the maximum of `[begin, end)`, or `end` if
/// the range is empty.
pub fn max_element<R, It, A>(
    rt: &R,
    begin: It,
    end: It,
    access: &A,
    policy: impl Into<ExecutionPolicy>,
) -> Result<It>
where
    R: Dispatcher,
    It: DistributedIterator,
    A: LocalAccess,
    A::Item: PartialOrd,
{
    let (_, max) = extrema(rt, begin, end, access, policy.into())?;
    Ok(max.map(|(_, it)| it).unwrap_or(end))
}

/// Both extrema in a single pass over `[begin, end)` — each locality's local
/// slice is read exactly once and yields both candidates, so this costs no
/// more than one of [`min_element`] or [`max_element`] alone.
pub fn minmax_element<R, It, A>(
    rt: &R,
    begin: It,
    end: It,
    access: &A,
    policy: impl Into<ExecutionPolicy>,
) -> Result<(It, It)>
where
    R: Dispatcher,
    It: DistributedIterator,
    A: LocalAccess,
    A::Item: PartialOrd,
{
    let (min, max) = extrema(rt, begin, end, access, policy.into())?;
    Ok((min.map(|(_, it)| it).unwrap_or(end), max.map(|(_, it)| it).unwrap_or(end)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::ExecutionPolicy;
    use crate::testing::{DistVec, LoopbackRuntime};

    #[test]
    fn min_element_finds_first_occurrence_on_tie() {
        let rt = LoopbackRuntime::new(4, 2);
        let dv = DistVec::from_vec(vec![5, 3, 1, 9, 1, 3, 5, 1], 4);
        let access = dv.access();
        let pos = min_element(&*rt, dv.begin(), dv.end(), &access, ExecutionPolicy::default()).unwrap();
        assert_eq!(pos.offset_from(dv.begin()), 2);
    }

    #[test]
    fn max_element_finds_first_occurrence_on_tie() {
        let rt = LoopbackRuntime::new(4, 2);
        let dv = DistVec::from_vec(vec![5, 3, 9, 9, 1, 3, 5, 1], 4);
        let access = dv.access();
        let pos = max_element(&*rt, dv.begin(), dv.end(), &access, ExecutionPolicy::default()).unwrap();
        assert_eq!(pos.offset_from(dv.begin()), 2);
    }

    #[test]
    fn minmax_element_matches_separate_calls() {
        let rt = LoopbackRuntime::new(5, 2);
        let dv = DistVec::from_vec((0..97i64).map(|i| (i * 37) % 53).collect(), 5);
        let access = dv.access();
        let (lo, hi) = minmax_element(&*rt, dv.begin(), dv.end(), &access, ExecutionPolicy::default()).unwrap();
        let expected_lo = min_element(&*rt, dv.begin(), dv.end(), &access, ExecutionPolicy::default()).unwrap();
        let expected_hi = max_element(&*rt, dv.begin(), dv.end(), &access, ExecutionPolicy::default()).unwrap();
        assert_eq!(lo, expected_lo);
        assert_eq!(hi, expected_hi);
    }

    #[test]
    fn min_element_on_empty_range_is_end() {
        let rt = LoopbackRuntime::new(3, 1);
        let dv = DistVec::from_vec(Vec::<i64>::new(), 3);
        let access = dv.access();
        let pos = min_element(&*rt, dv.begin(), dv.end(), &access, ExecutionPolicy::default()).unwrap();
        assert_eq!(pos, dv.end());
    }
}
