//! How `reduce` over a fixed-size array scales with the number of
//! localities it is partitioned across, under each execution policy.

use criterion::{black_box, Criterion};
use meridian_core::algorithms::reduce;
use meridian_core::policy::ExecutionPolicy;
use meridian_core::testing::{DistVec, LoopbackRuntime};
use std::env;
use std::time::Duration;

const LEN: usize = 100_000;

fn bench_reduce(c: &mut Criterion, num_localities: u32, policy: ExecutionPolicy, label: &str) {
    let rt = LoopbackRuntime::new(num_localities, 4);
    let dv = DistVec::from_vec(vec![1i64; LEN], num_localities);
    let access = dv.access();
    c.bench_function(label, |b| {
        b.iter(|| {
            let got = reduce(&*rt, dv.begin(), dv.end(), &access, 0, |a, b| a + b, policy).unwrap();
            black_box(got)
        });
    });
}

fn main() {
    let mut quick_mode = false;
    for arg in env::args().skip(1) {
        if arg == "--quick" {
            quick_mode = true;
        }
    }

    let mut criterion = Criterion::default();
    if quick_mode {
        criterion = criterion
            .sample_size(10)
            .warm_up_time(Duration::from_millis(100))
            .measurement_time(Duration::from_millis(250));
    }

    for &n in &[1u32, 2, 4, 8] {
        bench_reduce(&mut criterion, n, ExecutionPolicy::SequentialAcrossLocalities, &format!("reduce_seq_{n}_localities"));
        bench_reduce(&mut criterion, n, ExecutionPolicy::ParallelAcrossLocalities, &format!("reduce_par_{n}_localities"));
    }

    criterion.final_summary();
}
