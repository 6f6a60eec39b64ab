//! Quantified invariants, checked against randomized inputs via `proptest`
//! rather than a handful of fixed cases.

use meridian_core::algorithms::{
    adjacent_difference, exclusive_scan, inclusive_scan, partial_sum, reduce,
};
use meridian_core::policy::ExecutionPolicy;
use meridian_core::testing::{DistVec, LoopbackRuntime};
use proptest::prelude::*;

fn small_vec() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(-1000i64..1000, 0..200)
}

fn locality_count() -> impl Strategy<Value = u32> {
    1u32..=6
}

proptest! {
    /// Sequential reduce matches a plain fold of the flattened input, and
    /// the parallel policy (associative `+`) matches the sequential policy
    /// on the same input.
    #[test]
    fn reduce_matches_flattened_fold(values in small_vec(), n in locality_count()) {
        let rt = LoopbackRuntime::new(n, 2);
        let dv = DistVec::from_vec(values.clone(), n);
        let access = dv.access();

        let expected: i64 = values.iter().fold(0, |a, b| a + b);
        let seq = reduce(&*rt, dv.begin(), dv.end(), &access, 0, |a, b| a + b, ExecutionPolicy::SequentialAcrossLocalities).unwrap();
        let par = reduce(&*rt, dv.begin(), dv.end(), &access, 0, |a, b| a + b, ExecutionPolicy::ParallelAcrossLocalities).unwrap();
        prop_assert_eq!(seq, expected);
        prop_assert_eq!(par, expected);
    }

    /// The locality-ordered concatenation of `local_bounds` covers the
    /// whole range with no gaps or overlaps, for any partition width.
    #[test]
    fn partition_covers_whole_range(values in small_vec(), n in locality_count()) {
        let dv = DistVec::from_vec(values, n);
        meridian_core::verify_partition::<meridian_core::testing::DistVecIter>(dv.begin(), dv.end()).unwrap();
    }

    /// partial_sum followed by adjacent_difference on the result recovers
    /// the original sequence, for any input and partition width.
    #[test]
    fn partial_sum_then_adjacent_difference_round_trips(values in small_vec(), n in locality_count()) {
        let rt = LoopbackRuntime::new(n, 2);
        let input = DistVec::from_vec(values.clone(), n);
        let summed = DistVec::from_vec(vec![0i64; values.len()], n);
        let recovered = DistVec::from_vec(vec![0i64; values.len()], n);
        let in_access = input.access();
        let sum_access = summed.access();
        let rec_access = recovered.access();

        partial_sum(&*rt, input.begin(), input.end(), &in_access, summed.begin(), summed.end(), &sum_access, ExecutionPolicy::default()).unwrap();
        adjacent_difference(&*rt, summed.begin(), summed.end(), &sum_access, |a, b| a - b, recovered.begin(), recovered.end(), &rec_access).unwrap();

        prop_assert_eq!(recovered.to_vec(), values);
    }

    /// exclusive_scan(init) rebased by `-init` yields the classical
    /// prefix-sum law: the k-th element is the sum of the first k inputs.
    #[test]
    fn exclusive_scan_matches_classical_prefix_sum(values in small_vec(), n in locality_count()) {
        let rt = LoopbackRuntime::new(n, 2);
        let input = DistVec::from_vec(values.clone(), n);
        let out = DistVec::from_vec(vec![0i64; values.len()], n);
        let in_access = input.access();
        let out_access = out.access();
        let init = 7i64;

        exclusive_scan(&*rt, input.begin(), input.end(), &in_access, init, |a, b| a + b, out.begin(), out.end(), &out_access, ExecutionPolicy::default()).unwrap();

        let result = out.to_vec();
        let mut running = 0i64;
        for (k, v) in result.iter().enumerate() {
            prop_assert_eq!(*v - init, running);
            running += values[k];
        }
    }

    /// inclusive_scan agrees between the two execution policies for any
    /// input and any partition width (associativity of `+`).
    #[test]
    fn inclusive_scan_policy_agreement(values in small_vec(), n in locality_count()) {
        let rt = LoopbackRuntime::new(n, 2);
        let input = DistVec::from_vec(values.clone(), n);
        let in_access = input.access();

        let seq_out = DistVec::from_vec(vec![0i64; values.len()], n);
        let seq_access = seq_out.access();
        inclusive_scan(&*rt, input.begin(), input.end(), &in_access, |a, b| a + b, seq_out.begin(), seq_out.end(), &seq_access, ExecutionPolicy::SequentialAcrossLocalities).unwrap();

        let par_out = DistVec::from_vec(vec![0i64; values.len()], n);
        let par_access = par_out.access();
        inclusive_scan(&*rt, input.begin(), input.end(), &in_access, |a, b| a + b, par_out.begin(), par_out.end(), &par_access, ExecutionPolicy::ParallelAcrossLocalities).unwrap();

        prop_assert_eq!(seq_out.to_vec(), par_out.to_vec());
    }
}
