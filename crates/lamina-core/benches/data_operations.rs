//! Benchmark suite for core engine operations: grouping with aggregation,
//! column-set expansion, and structural equality.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use lamina_core::{AggExpr, ColExpr, DataFrame, Series, Value};

/// Generate a table with the specified number of rows
fn generate_test_dataframe(num_rows: usize) -> DataFrame {
    let mut ids = Vec::with_capacity(num_rows);
    let mut regions = Vec::with_capacity(num_rows);
    let mut amounts = Vec::with_capacity(num_rows);
    let mut tags = Vec::with_capacity(num_rows);

    let region_options = ["North", "South", "East", "West"];

    for i in 0..num_rows {
        ids.push(i as i64);
        regions.push(region_options[i % 4]);
        amounts.push((i % 1000) as i64);
        tags.push(Value::list(
            (0..(i % 4)).map(|t| Value::Long(t as i64)).collect(),
        ));
    }

    DataFrame::from_series(vec![
        Series::from_longs("id", ids),
        Series::from_strings("region", regions),
        Series::from_longs("amount", amounts),
        Series::from_values("tags", tags),
    ])
    .expect("failed to create table")
}

/// Benchmark group-by plus aggregation
fn bench_group_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("group_aggregate");

    for size in [1_000, 10_000, 100_000].iter() {
        let df = generate_test_dataframe(*size);

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let result = df
                    .group_by(&["region"])
                    .unwrap()
                    .aggregate(&[
                        AggExpr::sum().col("amount").alias("total"),
                        AggExpr::mean().col("amount").alias("avg"),
                        AggExpr::count().alias("n"),
                    ])
                    .unwrap();
                black_box(result)
            });
        });
    }

    group.finish();
}

/// Benchmark dynamic column-set expansion
fn bench_expand(c: &mut Criterion) {
    let mut group = c.benchmark_group("expand");

    for size in [1_000, 10_000, 100_000].iter() {
        let df = generate_test_dataframe(*size);

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(df.expand(&[], &ColExpr::col("tags")).unwrap()));
        });
    }

    group.finish();
}

/// Benchmark structural equality
fn bench_eq(c: &mut Criterion) {
    let mut group = c.benchmark_group("eq");

    for size in [1_000, 10_000, 100_000].iter() {
        let df = generate_test_dataframe(*size);
        let other = generate_test_dataframe(*size);

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(df.eq(&other).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_group_aggregate, bench_expand, bench_eq);
criterion_main!(benches);
