//! Performance benchmarks for shelf-engine

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use shelf_engine::{
    Book, EntryPatch, EntryTransaction, JoinedEntry, LibraryEntry, LibraryState, Ownership,
    Priority, ReadingStatus, SortOrder,
};

fn library(size: usize) -> LibraryState {
    LibraryState::from_joined((0..size).map(|i| {
        let status = ReadingStatus::ALL[i % ReadingStatus::ALL.len()];
        let mut entry = LibraryEntry::new(format!("e-{i}"), format!("b-{i}"), status);
        entry.owned = status != ReadingStatus::Wishlist && i % 3 != 0;
        entry.priority = Priority::try_from((i % 5) as i64 + 1).unwrap_or_default();
        JoinedEntry {
            entry,
            book: Some(Book::new(
                format!("b-{i}"),
                format!("Book number {i}"),
                format!("Author {}", i % 50),
            )),
        }
    }))
}

fn bench_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("load");

    for size in [100, 500, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("from_joined", size), size, |b, &size| {
            let rows: Vec<JoinedEntry> = (0..size)
                .map(|i| JoinedEntry {
                    entry: LibraryEntry::new(format!("e-{i}"), format!("b-{i}"), ReadingStatus::Owned),
                    book: Some(Book::new(format!("b-{i}"), format!("Book {i}"), "Author")),
                })
                .collect();

            b.iter(|| LibraryState::from_joined(black_box(rows.clone())))
        });
    }

    group.finish();
}

fn bench_views(c: &mut Criterion) {
    let mut group = c.benchmark_group("views");
    let state = library(1000);

    group.bench_function("search", |b| {
        b.iter(|| state.search(black_box("author 42")).len())
    });

    group.bench_function("filter_status_owned", |b| {
        b.iter(|| {
            state
                .query()
                .status(black_box(ReadingStatus::Owned))
                .ownership(Ownership::Owned)
                .count()
        })
    });

    group.bench_function("sort_priority", |b| {
        b.iter(|| state.query().sort(black_box(SortOrder::Priority)).entries().len())
    });

    group.bench_function("stats", |b| b.iter(|| state.stats()));

    group.finish();
}

fn bench_transactions(c: &mut Criterion) {
    let mut group = c.benchmark_group("transactions");

    group.bench_function("begin_rollback", |b| {
        let mut state = library(1000);
        let patch = EntryPatch {
            notes: Some(Some("benchmark".to_string())),
            owned: Some(true),
            ..EntryPatch::default()
        };

        b.iter(|| {
            let tx = EntryTransaction::begin(&mut state, black_box("e-500"), |_, _| Ok(patch.clone()));
            if let Ok(tx) = tx {
                tx.rollback(&mut state);
            }
        })
    });

    group.finish();
}

fn bench_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialization");
    let state = library(500);

    group.bench_function("state_to_json", |b| {
        b.iter(|| serde_json::to_string(black_box(&state)))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_load,
    bench_views,
    bench_transactions,
    bench_serialization,
);
criterion_main!(benches);
