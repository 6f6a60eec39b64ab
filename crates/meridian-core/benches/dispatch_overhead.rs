//! Cost of a single round-trip through the dispatch substrate, sync and
//! async, against the in-process loopback runtime.

use criterion::{black_box, Criterion};
use meridian_core::dispatch::Dispatcher;
use meridian_core::handle::Handle;
use meridian_core::locality::Locality;
use meridian_core::testing::LoopbackRuntime;
use std::env;
use std::time::Duration;

fn double(a: &i64) -> i64 {
    *a * 2
}

fn bench_sync_execute_at(c: &mut Criterion) {
    let rt = LoopbackRuntime::new(4, 4);
    c.bench_function("sync_execute_at", |b| {
        b.iter(|| {
            let got = rt.execute_at_with_result(Locality::new(1), double, black_box(21)).unwrap();
            black_box(got)
        });
    });
}

fn bench_async_execute_at(c: &mut Criterion) {
    let rt = LoopbackRuntime::new(4, 4);
    c.bench_function("async_execute_at", |b| {
        b.iter(|| {
            let handle = Handle::create();
            rt.execute_at_async(Locality::new(1), &handle, |_a: &i64| {}, black_box(21)).unwrap();
            handle.wait_for_completion().unwrap();
        });
    });
}

fn bench_execute_on_all(c: &mut Criterion) {
    let rt = LoopbackRuntime::new(8, 2);
    c.bench_function("execute_on_all_8_localities", |b| {
        b.iter(|| {
            rt.execute_on_all(|_a: &i64| {}, black_box(1)).unwrap();
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

    bench_sync_execute_at(&mut criterion);
    bench_async_execute_at(&mut criterion);
    bench_execute_on_all(&mut criterion);
    criterion.final_summary();
}
