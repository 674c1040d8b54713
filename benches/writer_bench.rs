//! Benchmarks for element creation throughput.
//!
//! Tests:
//! - Scalar-only element creation
//! - Element creation with a zipped vector attribute group

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use quiver::{Database, Element, Value};
use std::hint::black_box;

const SCHEMA_SQL: &str = r#"
CREATE TABLE Configuration (id INTEGER PRIMARY KEY, label TEXT UNIQUE NOT NULL);
INSERT INTO Configuration (id, label) VALUES (1, 'default');

CREATE TABLE Plant (
    id INTEGER PRIMARY KEY,
    label TEXT UNIQUE NOT NULL,
    capacity_mw REAL
);

CREATE TABLE Plant_vector_cost (
    id INTEGER NOT NULL REFERENCES Plant(id) ON DELETE CASCADE ON UPDATE CASCADE,
    vector_index INTEGER NOT NULL,
    cost REAL,
    PRIMARY KEY (id, vector_index)
);
"#;

fn bench_create_scalar(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_element_scalar");
    for count in [100usize, 1_000] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let db = Database::from_schema(SCHEMA_SQL).unwrap();
                for i in 0..count {
                    let element = Element::new()
                        .with_scalar("label", Value::Text(format!("Plant {i}")))
                        .with_scalar("capacity_mw", Value::Real(100.0));
                    black_box(db.create_element("Plant", &element).unwrap());
                }
            });
        });
    }
    group.finish();
}

fn bench_create_with_vector_group(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_element_with_vector_group");
    for width in [4usize, 32] {
        group.throughput(Throughput::Elements(width as u64));
        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, &width| {
            b.iter(|| {
                let db = Database::from_schema(SCHEMA_SQL).unwrap();
                let element = Element::new()
                    .with_scalar("label", Value::Text("Plant".to_string()))
                    .with_array("cost", (0..width).map(|i| Value::Real(i as f64)).collect());
                black_box(db.create_element("Plant", &element).unwrap());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_create_scalar, bench_create_with_vector_group);
criterion_main!(benches);
