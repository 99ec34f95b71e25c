//! Basic benchmarks for the `growable_array` crate.
#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::hint::black_box;
use std::iter;
use std::time::Instant;

use alloc_tracker::Allocator;
use criterion::{Criterion, criterion_group, criterion_main};
use growable_array::GrowableArray;

criterion_group!(benches, entrypoint);
criterion_main!(benches);

#[global_allocator]
static ALLOCATOR: Allocator<std::alloc::System> = Allocator::system();

type TestItem = usize;
const TEST_VALUE: TestItem = 1024;

fn entrypoint(c: &mut Criterion) {
    let allocs = alloc_tracker::Session::new();

    let mut group = c.benchmark_group("ga_basic");

    let allocs_op = allocs.operation("build_empty");
    group.bench_function("build_empty", |b| {
        b.iter_custom(|iters| {
            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for _ in 0..iters {
                drop(black_box(GrowableArray::<TestItem>::new()));
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("push_one");
    group.bench_function("push_one", |b| {
        b.iter_custom(|iters| {
            let mut arrays = iter::repeat_with(GrowableArray::<TestItem>::new)
                .take(usize::try_from(iters).unwrap())
                .collect::<Vec<_>>();

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for array in &mut arrays {
                array.push_back(black_box(TEST_VALUE)).unwrap();
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("insert_front_of_100");
    group.bench_function("insert_front_of_100", |b| {
        b.iter_custom(|iters| {
            let mut arrays = iter::repeat_with(|| {
                let mut array = GrowableArray::<TestItem>::builder()
                    .capacity(101)
                    .build()
                    .unwrap();
                array.resize_value(100, &TEST_VALUE).unwrap();
                array
            })
            .take(usize::try_from(iters).unwrap())
            .collect::<Vec<_>>();

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for array in &mut arrays {
                _ = black_box(array.insert(0, black_box(TEST_VALUE)).unwrap());
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("erase_front_of_100");
    group.bench_function("erase_front_of_100", |b| {
        b.iter_custom(|iters| {
            let mut arrays = iter::repeat_with(|| GrowableArray::from_elem(100, &TEST_VALUE).unwrap())
                .take(usize::try_from(iters).unwrap())
                .collect::<Vec<_>>();

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for array in &mut arrays {
                _ = black_box(array.erase(0).unwrap());
            }

            start.elapsed()
        });
    });

    group.finish();

    let mut group = c.benchmark_group("ga_slow");

    let allocs_op = allocs.operation("push_10k");
    group.bench_function("push_10k", |b| {
        b.iter_custom(|iters| {
            let mut arrays = iter::repeat_with(GrowableArray::<TestItem>::new)
                .take(usize::try_from(iters).unwrap())
                .collect::<Vec<_>>();

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for array in &mut arrays {
                for _ in 0..10_000 {
                    array.push_back(black_box(TEST_VALUE)).unwrap();
                }
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("push_10k_reserved");
    group.bench_function("push_10k_reserved", |b| {
        b.iter_custom(|iters| {
            let mut arrays = iter::repeat_with(|| {
                GrowableArray::<TestItem>::builder()
                    .capacity(10_000)
                    .build()
                    .unwrap()
            })
            .take(usize::try_from(iters).unwrap())
            .collect::<Vec<_>>();

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for array in &mut arrays {
                for _ in 0..10_000 {
                    array.push_back(black_box(TEST_VALUE)).unwrap();
                }
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("assign_1k_into_10k");
    group.bench_function("assign_1k_into_10k", |b| {
        b.iter_custom(|iters| {
            let mut arrays =
                iter::repeat_with(|| GrowableArray::from_elem(10_000, &TEST_VALUE).unwrap())
                    .take(usize::try_from(iters).unwrap())
                    .collect::<Vec<_>>();

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for array in &mut arrays {
                array.assign_n(1_000, black_box(&TEST_VALUE)).unwrap();
            }

            start.elapsed()
        });
    });

    group.finish();

    allocs.print_to_stdout();
}
