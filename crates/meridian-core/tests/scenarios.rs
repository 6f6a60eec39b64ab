//! End-to-end scenarios, each run under both execution policies.

use meridian_core::algorithms::{
    find, find_if, for_each, inner_product, min_element, minmax_element, partial_sum,
};
use meridian_core::policy::ExecutionPolicy;
use meridian_core::testing::{DistVec, LoopbackRuntime};

const POLICIES: [ExecutionPolicy; 2] =
    [ExecutionPolicy::SequentialAcrossLocalities, ExecutionPolicy::ParallelAcrossLocalities];

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// find on a 10001-element all-ones array, then after poisoning the last
/// element.
#[test]
fn find_locates_poisoned_tail_element() {
    init_tracing();
    for policy in POLICIES {
        let rt = LoopbackRuntime::new(4, 2);
        let dv = DistVec::from_vec(vec![1i64; 10001], 4);
        let access = dv.access();
        assert_eq!(find(&*rt, dv.begin(), dv.end(), &access, 0, policy).unwrap(), dv.end());

        for_each(&*rt, dv.begin(), dv.end(), &access, |v| *v = 2, ExecutionPolicy::default()).unwrap();
        // restore everything but the last element to 1.
        let mut values = dv.to_vec();
        for v in values.iter_mut().take(values.len() - 1) {
            *v = 1;
        }
        let dv = DistVec::from_vec(values, 4);
        let access = dv.access();
        let found = find(&*rt, dv.begin(), dv.end(), &access, 2, policy).unwrap();
        assert_eq!(found.offset_from(dv.begin()), 10000);
    }
}

/// for_each mutate twice from all-ones to all-threes; find_if for the
/// stale values must return end.
#[test]
fn for_each_mutate_twice_leaves_no_stale_values() {
    init_tracing();
    for policy in POLICIES {
        let rt = LoopbackRuntime::new(5, 2);
        let dv = DistVec::from_vec(vec![1i64; 10001], 5);
        let access = dv.access();
        for_each(&*rt, dv.begin(), dv.end(), &access, |v| *v += 1, policy).unwrap();
        for_each(&*rt, dv.begin(), dv.end(), &access, |v| *v += 1, policy).unwrap();
        assert!(dv.to_vec().iter().all(|&v| v == 3));
        assert_eq!(find_if(&*rt, dv.begin(), dv.end(), &access, |v| *v == 1, policy).unwrap(), dv.end());
        assert_eq!(find_if(&*rt, dv.begin(), dv.end(), &access, |v| *v == 2, policy).unwrap(), dv.end());
    }
}

/// reduce with + and * over a length-42 array of 2s.
#[test]
fn reduce_sum_and_product_over_constant_array() {
    use meridian_core::algorithms::reduce;
    init_tracing();
    for policy in POLICIES {
        let rt = LoopbackRuntime::new(6, 2);
        let dv = DistVec::from_vec(vec![2i64; 42], 6);
        let access = dv.access();
        assert_eq!(reduce(&*rt, dv.begin(), dv.end(), &access, 2, |a, b| a + b, policy).unwrap(), 86);
        assert_eq!(
            reduce(&*rt, dv.begin(), dv.end(), &access, 2, |a, b| a * b, policy).unwrap(),
            8_796_093_022_208
        );
    }
}

/// inner_product of a constant range and an arithmetic progression.
#[test]
fn inner_product_of_constant_and_progression() {
    init_tracing();
    for policy in POLICIES {
        let rt = LoopbackRuntime::new(4, 2);
        let a = DistVec::from_vec(vec![2i64; 42], 4);
        let b = DistVec::from_vec((0..42).map(|i| i * 3).collect(), 4);
        let aa = a.access();
        let ba = b.access();
        let got = inner_product(&*rt, a.begin(), a.end(), &aa, b.begin(), b.end(), &ba, 2, policy).unwrap();
        assert_eq!(got, 5168);
    }
}

/// partial_sum of `[0, 3, 6, ..., 123]`.
#[test]
fn partial_sum_of_arithmetic_progression() {
    init_tracing();
    for policy in POLICIES {
        let rt = LoopbackRuntime::new(4, 2);
        let input: Vec<i64> = (0..42).map(|i| i * 3).collect();
        let dv = DistVec::from_vec(input.clone(), 4);
        let out = DistVec::from_vec(vec![0i64; 42], 4);
        let in_access = dv.access();
        let out_access = out.access();
        partial_sum(&*rt, dv.begin(), dv.end(), &in_access, out.begin(), out.end(), &out_access, policy).unwrap();
        let result = out.to_vec();
        for (k, &v) in result.iter().enumerate() {
            let k = k as i64;
            assert_eq!(v, 3 * k * (k + 1) / 2);
        }
        assert_eq!(*result.last().unwrap(), 2583);
    }
}

/// inclusive_scan under the parallel policy matches the sequential result
/// (associativity of `+`), over the same arithmetic-progression input as
/// the partial_sum scenario above.
#[test]
fn inclusive_scan_parallel_matches_sequential() {
    use meridian_core::algorithms::inclusive_scan;
    init_tracing();
    let rt = LoopbackRuntime::new(4, 2);
    let input: Vec<i64> = (0..42).map(|i| i * 3).collect();
    let dv = DistVec::from_vec(input, 4);
    let in_access = dv.access();

    let seq_out = DistVec::from_vec(vec![0i64; 42], 4);
    let seq_access = seq_out.access();
    inclusive_scan(
        &*rt,
        dv.begin(),
        dv.end(),
        &in_access,
        |a, b| a + b,
        seq_out.begin(),
        seq_out.end(),
        &seq_access,
        ExecutionPolicy::SequentialAcrossLocalities,
    )
    .unwrap();

    let par_out = DistVec::from_vec(vec![0i64; 42], 4);
    let par_access = par_out.access();
    inclusive_scan(
        &*rt,
        dv.begin(),
        dv.end(),
        &in_access,
        |a, b| a + b,
        par_out.begin(),
        par_out.end(),
        &par_access,
        ExecutionPolicy::ParallelAcrossLocalities,
    )
    .unwrap();

    assert_eq!(seq_out.to_vec(), par_out.to_vec());
}

/// minmax_element over a length-42 identity array with one element
/// overwritten must match the flattened-array min/max.
#[test]
fn minmax_element_matches_flattened_array() {
    init_tracing();
    for policy in POLICIES {
        let rt = LoopbackRuntime::new(5, 2);
        let mut values: Vec<i64> = (0..42).collect();
        values[17] = -5;
        let dv = DistVec::from_vec(values.clone(), 5);
        let access = dv.access();
        let (lo, hi) = minmax_element(&*rt, dv.begin(), dv.end(), &access, policy).unwrap();
        let expected_min = *values.iter().min().unwrap();
        let expected_max = *values.iter().max().unwrap();
        assert_eq!(values[lo.offset_from(dv.begin())], expected_min);
        assert_eq!(values[hi.offset_from(dv.begin())], expected_max);

        let alone_min = min_element(&*rt, dv.begin(), dv.end(), &access, policy).unwrap();
        assert_eq!(alone_min, lo);
    }
}
