//! Performance benchmarks for the habit ledger.

use chrono::{Days, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use habit_ledger::{
    compute_stats, EndpointTransport, FileEntryStore, FixedClock, HabitId, HabitInput,
    MemoryEntryStore, StoreConfig, SyncConfig, SyncEngine, ToggleEndpoint, ToggleService, UserId,
};
use std::sync::Arc;
use tempfile::TempDir;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
}

fn ago(n: u64) -> NaiveDate {
    today().checked_sub_days(Days::new(n)).unwrap()
}

/// Benchmark stats over histories of varying length
fn bench_compute_stats(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_stats");

    for days in [30u64, 365, 3650] {
        // Every third day missed, so streaks stay short.
        let entries: Vec<(NaiveDate, bool)> = (0..days)
            .filter(|n| n % 3 != 2)
            .map(|n| (ago(n), true))
            .collect();

        group.bench_with_input(BenchmarkId::new("days", days), &entries, |b, entries| {
            b.iter(|| black_box(compute_stats(entries, today())));
        });
    }

    group.finish();
}

/// Benchmark server-side toggles on the in-memory store
fn bench_service_toggle(c: &mut Criterion) {
    let service = ToggleService::with_clock(
        Arc::new(MemoryEntryStore::new()),
        Arc::new(FixedClock::new(today())),
    );
    let owner = UserId::new("bench");
    let habit = service
        .create_habit(&owner, HabitInput::named("Bench"))
        .unwrap()
        .id;

    c.bench_function("service_toggle_memory", |b| {
        let mut n = 0u64;
        b.iter(|| {
            n = (n + 1) % 365;
            black_box(service.toggle(&owner, habit, ago(n)).unwrap());
        });
    });
}

/// Benchmark durable toggles, each one rewriting the ledger file
fn bench_file_toggle(c: &mut Criterion) {
    let mut group = c.benchmark_group("service_toggle_file");

    for history in [0u64, 1000] {
        group.bench_with_input(
            BenchmarkId::new("history_entries", history),
            &history,
            |b, &history| {
                let dir = TempDir::new().unwrap();
                let store = FileEntryStore::create(StoreConfig {
                    path: dir.path().join("ledger"),
                    create_if_missing: true,
                })
                .unwrap();
                let service =
                    ToggleService::with_clock(Arc::new(store), Arc::new(FixedClock::new(today())));
                let owner = UserId::new("bench");
                let habit = service
                    .create_habit(&owner, HabitInput::named("Bench"))
                    .unwrap()
                    .id;

                for n in 1..=history {
                    service.toggle(&owner, habit, ago(n)).unwrap();
                }

                b.iter(|| black_box(service.toggle(&owner, habit, today()).unwrap()));
            },
        );
    }

    group.finish();
}

/// Benchmark the optimistic client path end to end
fn bench_engine_toggle(c: &mut Criterion) {
    let clock = Arc::new(FixedClock::new(today()));
    let service = Arc::new(ToggleService::with_clock(
        Arc::new(MemoryEntryStore::new()),
        clock.clone(),
    ));
    let owner = UserId::new("bench");
    let habit: HabitId = service
        .create_habit(&owner, HabitInput::named("Bench"))
        .unwrap()
        .id;

    let endpoint = Arc::new(ToggleEndpoint::new(Arc::clone(&service)));
    let transport = Arc::new(EndpointTransport::new(endpoint, Some(owner.clone())));
    let engine = SyncEngine::new(transport, clock, SyncConfig::default());
    engine.init(service.snapshot(&owner).unwrap());

    c.bench_function("engine_toggle", |b| {
        b.iter(|| black_box(engine.toggle(habit, today()).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_compute_stats,
    bench_service_toggle,
    bench_file_toggle,
    bench_engine_toggle,
);

criterion_main!(benches);
