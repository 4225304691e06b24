use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sensorwatch::{Reading, ReadingValue, SensorConfig, SensorSchedule};
use sensorwatch_types::ModuleSnapshot;

fn schedule(threshold: f64) -> SensorSchedule {
    let mut s = SensorSchedule::new(
        SensorConfig::new("Temperature", Duration::from_secs(600), threshold),
        0,
    );
    s.accept(Reading::new(0, "Temperature", ReadingValue::Float(70.0)));
    s
}

/// Benchmark the per-sensor decision made on every sweep
fn bench_sensor_decision(c: &mut Criterion) {
    let mut group = c.benchmark_group("sensor_decision");
    let s = schedule(0.5);

    let candidates = [
        ("within_threshold", ReadingValue::Float(71.0)),
        ("past_threshold", ReadingValue::Float(200.0)),
        ("not_available", ReadingValue::from("N/A")),
    ];

    for (name, value) in candidates {
        let candidate = Reading::new(1, "Temperature", value);
        group.bench_with_input(BenchmarkId::from_parameter(name), &candidate, |b, candidate| {
            b.iter(|| black_box(s.is_due(black_box(1)) || s.exceeds_threshold(black_box(candidate))));
        });
    }
    group.finish();
}

/// Benchmark accept followed by the change check
fn bench_accept_and_pending(c: &mut Criterion) {
    c.bench_function("accept_and_pending", |b| {
        let mut s = schedule(0.5);
        let mut i = 0i64;
        b.iter(|| {
            i += 1;
            s.accept(Reading::new(i as u64, "Temperature", ReadingValue::Integer(i % 3)));
            black_box(s.pending_alert().is_some());
        });
    });
}

/// Benchmark converting snapshot rows into readings with varying row counts
fn bench_snapshot_demux(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot_demux");

    for rows in [4usize, 16, 64].iter() {
        let snapshot = (0..*rows)
            .fold(ModuleSnapshot::builder().timestamp_ms(0), |b, i| {
                b.row(format!("Sensor_{}", i), |r| r.value(format!("{}.5", i)).unit("F"))
            })
            .build();

        group.bench_with_input(BenchmarkId::from_parameter(rows), &snapshot, |b, snapshot| {
            b.iter(|| {
                let readings: Vec<_> = snapshot
                    .rows
                    .iter()
                    .filter_map(|row| Reading::from_row(row, snapshot.timestamp_ms, Some("Rack1-")).ok())
                    .collect();
                black_box(readings)
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_sensor_decision,
    bench_accept_and_pending,
    bench_snapshot_demux
);
criterion_main!(benches);
