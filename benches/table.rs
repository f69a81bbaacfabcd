use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use hasharr::Config;
use nanoid::nanoid;

const SLOTS: usize = 100_000;

fn filled_table(count: usize, value_len: usize) -> (hasharr::FlatHashTable<Vec<u8>>, Vec<String>) {
    let mut table = Config::new(SLOTS).create_in_memory().unwrap();

    let keys = (0..count).map(|_| nanoid!()).collect::<Vec<_>>();

    for key in &keys {
        table.put(key, vec![0; value_len]).unwrap();
    }

    (table, keys)
}

fn table_get_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("table get");

    for (name, value_len) in [("small", 16), ("chained", 500)] {
        let (table, keys) = filled_table(10_000, value_len);
        let key = &keys[keys.len() / 2];

        group.bench_function(name, |b| {
            b.iter(|| {
                assert_eq!(value_len, table.get(key).unwrap().len());
            });
        });
    }
}

fn table_get_miss(c: &mut Criterion) {
    let (table, _) = filled_table(50_000, 16);

    c.bench_function("table get miss", |b| {
        b.iter(|| {
            assert!(!table.contains_key("this-key-does-not-exist").unwrap());
        });
    });
}

fn table_put(c: &mut Criterion) {
    let keys = (0..10_000).map(|_| nanoid!()).collect::<Vec<_>>();

    c.bench_function("table put 10k", |b| {
        b.iter_batched(
            || Config::new(SLOTS).create_in_memory().unwrap(),
            |mut table| {
                for key in &keys {
                    table.put(key, b"value").unwrap();
                }
            },
            BatchSize::LargeInput,
        );
    });
}

fn table_put_remove(c: &mut Criterion) {
    let (mut table, _) = filled_table(50_000, 16);

    c.bench_function("table put+remove", |b| {
        b.iter(|| {
            table.put("churn", b"value").unwrap();
            table.remove("churn").unwrap();
        });
    });
}

fn table_iter(c: &mut Criterion) {
    let (table, _) = filled_table(10_000, 16);

    c.bench_function("table iter", |b| {
        b.iter(|| {
            assert_eq!(10_000, table.iter().count());
        });
    });
}

criterion_group!(
    benches,
    table_get_hit,
    table_get_miss,
    table_put,
    table_put_remove,
    table_iter
);
criterion_main!(benches);
