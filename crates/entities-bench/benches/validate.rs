//! Validation benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use entities_bench::fixtures::{generate_customers, BankSchema, Scale};
use entities_core::{Field, Value};

fn bench_valid_graphs(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate/valid");
    let schema = BankSchema::declare().unwrap();

    for scale in [Scale::Tiny, Scale::Small, Scale::Medium] {
        let customers = generate_customers(&schema, scale).unwrap();
        group.bench_with_input(
            BenchmarkId::from_parameter(scale.count()),
            &customers,
            |b, customers| {
                b.iter(|| {
                    for customer in customers {
                        customer.validate().unwrap();
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_invalid_graphs(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate/invalid");
    let schema = BankSchema::declare().unwrap();
    let customers = generate_customers(&schema, Scale::Small).unwrap();

    // One bad account item per customer.
    let single: Vec<_> = customers
        .iter()
        .map(|customer| {
            let accounts = customer.get("accounts").unwrap();
            accounts.as_list().unwrap().push(123);
            customer.clone()
        })
        .collect();

    group.bench_function("single_error", |b| {
        b.iter(|| {
            for customer in &single {
                black_box(customer.validate().unwrap_err());
            }
        });
    });

    // A second bad field turns every failure into an aggregate.
    for customer in &single {
        customer.set("id", "not a number").unwrap();
    }

    group.bench_function("aggregate_error", |b| {
        b.iter(|| {
            for customer in &single {
                black_box(customer.validate().unwrap_err());
            }
        });
    });

    group.finish();
}

fn bench_collection_items(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate/items");
    let field = Field::list_of(Field::integer());

    for size in [10usize, 100, 1_000] {
        let valid = Value::list((0..size as i64).collect::<Vec<_>>());
        group.bench_with_input(BenchmarkId::new("valid", size), &valid, |b, value| {
            b.iter(|| field.validate(value).unwrap());
        });

        let invalid = Value::list((0..size).map(|i| Value::from(i as f64)).collect::<Vec<_>>());
        group.bench_with_input(BenchmarkId::new("all_invalid", size), &invalid, |b, value| {
            b.iter(|| black_box(field.validate(value).unwrap_err()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_valid_graphs,
    bench_invalid_graphs,
    bench_collection_items
);
criterion_main!(benches);
