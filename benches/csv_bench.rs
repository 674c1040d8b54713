//! Benchmarks for CSV export/import round-trips.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use quiver::{CsvOptions, Database, Element, Value};
use std::hint::black_box;

const SCHEMA_SQL: &str = r#"
CREATE TABLE Configuration (id INTEGER PRIMARY KEY, label TEXT UNIQUE NOT NULL);
INSERT INTO Configuration (id, label) VALUES (1, 'default');

CREATE TABLE Plant (
    id INTEGER PRIMARY KEY,
    label TEXT UNIQUE NOT NULL,
    capacity_mw REAL
);
"#;

fn populated_db(rows: usize) -> Database {
    let db = Database::from_schema(SCHEMA_SQL).unwrap();
    for i in 0..rows {
        let element = Element::new()
            .with_scalar("label", Value::Text(format!("Plant {i}")))
            .with_scalar("capacity_mw", Value::Real(i as f64));
        db.create_element("Plant", &element).unwrap();
    }
    db
}

fn bench_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("export_csv");
    for rows in [100usize, 2_000] {
        let db = populated_db(rows);
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("plants.csv");
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, _| {
            b.iter(|| {
                black_box(db.export_csv("Plant", None, &out, &CsvOptions::new()).unwrap());
            });
        });
    }
    group.finish();
}

fn bench_import(c: &mut Criterion) {
    let mut group = c.benchmark_group("import_csv");
    for rows in [100usize, 2_000] {
        let db = populated_db(rows);
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("plants.csv");
        db.export_csv("Plant", None, &csv_path, &CsvOptions::new()).unwrap();

        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, _| {
            b.iter(|| {
                black_box(db.import_csv("Plant", None, &csv_path, &CsvOptions::new()).unwrap());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_export, bench_import);
criterion_main!(benches);
