// Vesting calculator and release-path benchmarks.
//
// Covers the pure curve evaluation and a full add-schedule + release cycle
// against the in-memory ledger at various store sizes.

use chrono::{DateTime, Duration, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use tokenvest_engine::calculator::{releasable_amount, vested_amount};
use tokenvest_engine::{
    Address, AllocationCategory, Capability, EngineConfig, InMemoryLedger, RoleRegistry,
    ScheduleTerms, VestingEngine, VestingSchedule,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
}

fn terms() -> ScheduleTerms {
    ScheduleTerms {
        total_amount: 1_000_000_000,
        start: Some(t0()),
        cliff_secs: 90 * 86_400,
        duration_secs: 4 * 365 * 86_400,
        category: AllocationCategory::Ecosystem,
    }
}

fn address(n: u32) -> Address {
    let mut bytes = [0u8; 20];
    bytes[16..].copy_from_slice(&n.to_be_bytes());
    bytes[0] = 0xbe;
    Address::from_bytes(bytes)
}

fn bench_vested_amount(c: &mut Criterion) {
    let t = terms();
    let at = t0() + Duration::days(500);
    c.bench_function("calculator/vested_amount", |b| {
        b.iter(|| vested_amount(&t, t0(), at));
    });
}

fn bench_releasable_amount(c: &mut Criterion) {
    let schedule = VestingSchedule::new(address(1), terms(), t0()).unwrap();
    let at = t0() + Duration::days(500);
    c.bench_function("calculator/releasable_amount", |b| {
        b.iter(|| releasable_amount(&schedule, t0(), at));
    });
}

fn bench_release_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/release_all");
    let admin = address(0);

    for size in [10u32, 100, 1_000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter_batched(
                || {
                    let roles = RoleRegistry::new().with_grant(admin, Capability::Admin);
                    let ledger = InMemoryLedger::funded(address(u32::MAX), u64::MAX);
                    let mut engine =
                        VestingEngine::new(&EngineConfig::default(), ledger, roles).unwrap();
                    for n in 1..=size {
                        let t = ScheduleTerms {
                            total_amount: 100_000,
                            ..terms()
                        };
                        engine.add_schedule(&admin, address(n), t, t0()).unwrap();
                    }
                    engine
                },
                |mut engine| {
                    let at = t0() + Duration::days(700);
                    for n in 1..=size {
                        let beneficiary = address(n);
                        engine.release(&beneficiary, &beneficiary, at).unwrap();
                    }
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_vested_amount,
    bench_releasable_amount,
    bench_release_cycle
);
criterion_main!(benches);
