//! Benchmark tests for value marshaling.
//!
//! Run with: cargo bench --package fathom-core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fathom_core::{buf, Value, ValueMap};

fn bench_tensor_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("tensor_construction");

    for size in [100, 10_000, 1_000_000].iter() {
        let data = vec![1.0f32; *size];
        let shape = [*size as i32];

        group.bench_with_input(BenchmarkId::new("copying", size), size, |bencher, _| {
            bencher.iter(|| black_box(Value::tensor(&data, &shape).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("borrowed", size), size, |bencher, _| {
            bencher.iter(|| {
                black_box(unsafe { Value::tensor_borrowed(data.as_ptr(), &shape).unwrap() })
            });
        });
    }

    group.finish();
}

fn bench_tensor_view(c: &mut Criterion) {
    let mut group = c.benchmark_group("tensor_view");

    for size in [10_000, 1_000_000].iter() {
        let data = vec![1.0f32; *size];
        let value = Value::tensor(&data, &[*size as i32]).unwrap();

        group.bench_with_input(BenchmarkId::new("as_slice", size), size, |bencher, _| {
            bencher.iter(|| black_box(value.as_slice::<f32>().unwrap().len()));
        });

        group.bench_with_input(BenchmarkId::new("clone_owned", size), size, |bencher, _| {
            bencher.iter(|| black_box(value.clone_owned()));
        });
    }

    group.finish();
}

fn bench_map_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("value_map");

    for entries in [4, 32, 256].iter() {
        group.bench_with_input(BenchmarkId::new("set", entries), entries, |bencher, &n| {
            bencher.iter(|| {
                let mut map = ValueMap::new();
                for i in 0..n {
                    map.set(format!("key_{i}"), Some(Value::scalar(i as i32)));
                }
                black_box(map)
            });
        });

        let mut map = ValueMap::new();
        for i in 0..*entries {
            map.set(format!("key_{i}"), Some(Value::scalar(i as i32)));
        }
        let probe = format!("key_{}", entries - 1);

        group.bench_with_input(BenchmarkId::new("get", entries), entries, |bencher, _| {
            bencher.iter(|| black_box(map.get(&probe).unwrap()));
        });
    }

    group.finish();
}

fn bench_string_fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("string_fill");

    let text = "a".repeat(4096);
    let mut dst = vec![0u8; buf::required_size(&text)];

    group.bench_function("fill_4k", |bencher| {
        bencher.iter(|| black_box(buf::fill(&text, &mut dst).unwrap()));
    });

    group.bench_function("fill_lossy_truncated", |bencher| {
        let mut small = vec![0u8; 128];
        bencher.iter(|| black_box(buf::fill_lossy(&text, &mut small)));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_tensor_construction,
    bench_tensor_view,
    bench_map_operations,
    bench_string_fill
);

criterion_main!(benches);
