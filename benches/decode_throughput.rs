//! Decoder throughput benchmark
//!
//! Measures both projections on a study-sized table: 5 parameters, 3
//! periods, 4 blocks, and a varying number of sample columns.
//!
//! # Run Instructions
//!
//! ```bash
//! cargo bench --bench decode_throughput
//! ```

use convstat::table::MEMORY_SOURCE;
use convstat::{decode_by_parameter, decode_by_period, BlockLayout, Layout, RawTable};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Build a PDE-layout table with `samples` columns
fn create_bench_table(layout: &Layout, samples: usize) -> RawTable {
    let rows = layout.expected_rows();
    let mut data = Vec::with_capacity(rows * samples);
    for r in 0..rows {
        let parameter = 1.0 / (1 + r % layout.parameters()) as f64;
        for s in 0..samples {
            if r < layout.block_rows() {
                data.push(parameter);
            } else {
                data.push((r * samples + s) as f64);
            }
        }
    }
    RawTable::new(MEMORY_SOURCE, rows, samples, data).expect("bench table shape")
}

/// Benchmark: fixed-period projection (contiguous rows)
fn bench_decode_by_period(c: &mut Criterion) {
    let layout = Layout::new(5, 3, BlockLayout::Pde).expect("bench layout");
    let mut group = c.benchmark_group("decode_by_period");

    for samples in [10, 100, 1000] {
        let table = create_bench_table(&layout, samples);
        group.bench_with_input(BenchmarkId::from_parameter(samples), &table, |b, table| {
            b.iter(|| decode_by_period(black_box(table), &layout, 2));
        });
    }

    group.finish();
}

/// Benchmark: fixed-parameter projection (strided rows)
fn bench_decode_by_parameter(c: &mut Criterion) {
    let layout = Layout::new(5, 3, BlockLayout::Pde).expect("bench layout");
    let mut group = c.benchmark_group("decode_by_parameter");

    for samples in [10, 100, 1000] {
        let table = create_bench_table(&layout, samples);
        group.bench_with_input(BenchmarkId::from_parameter(samples), &table, |b, table| {
            b.iter(|| decode_by_parameter(black_box(table), &layout, 0));
        });
    }

    group.finish();
}

/// Benchmark: text parsing of a 60-row, 100-sample file
fn bench_table_parse(c: &mut Criterion) {
    let layout = Layout::new(5, 3, BlockLayout::Pde).expect("bench layout");
    let table = create_bench_table(&layout, 100);
    let text: String = (0..table.rows())
        .map(|r| {
            let row: Vec<String> = table.row(r).iter().map(|v| format!("{v:.17e}")).collect();
            row.join(" ") + "\n"
        })
        .collect();

    c.bench_function("table_parse", |b| {
        b.iter(|| RawTable::parse(MEMORY_SOURCE, black_box(&text)));
    });
}

criterion_group!(
    benches,
    bench_decode_by_period,
    bench_decode_by_parameter,
    bench_table_parse
);
criterion_main!(benches);
