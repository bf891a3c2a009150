//! Property tests for the vesting calculator and the category cap.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use tokenvest_engine::calculator::{releasable_amount, vested_amount};
use tokenvest_engine::{
    Address, AllocationCategory, CategoryLedger, ScheduleTerms, VestingError, VestingSchedule,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
}

fn schedule(total: u64, cliff: u64, duration: u64, released: u64) -> VestingSchedule {
    let terms = ScheduleTerms {
        total_amount: total,
        start: Some(t0()),
        cliff_secs: cliff,
        duration_secs: duration,
        category: AllocationCategory::Community,
    };
    let mut s = VestingSchedule::new(Address::from_bytes([1; 20]), terms, t0()).unwrap();
    s.released_amount = released;
    s
}

prop_compose! {
    fn arb_schedule()(
        total in 1u64..=u64::MAX / 2,
        duration in 1u64..=10 * 365 * 86_400,
    )(
        total in Just(total),
        duration in Just(duration),
        cliff in 0..=duration,
        released_frac in 0u64..=100,
    ) -> VestingSchedule {
        // Released can be anything up to what was vested at the end.
        let released = ((total as u128) * (released_frac as u128) / 100) as u64;
        schedule(total, cliff, duration, released)
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn releasable_is_monotonic_in_time(
        s in arb_schedule(),
        a in -1_000_000i64..400_000_000,
        b in -1_000_000i64..400_000_000,
    ) {
        let (early, late) = if a <= b { (a, b) } else { (b, a) };
        let r_early = releasable_amount(&s, t0(), t0() + Duration::seconds(early));
        let r_late = releasable_amount(&s, t0(), t0() + Duration::seconds(late));
        prop_assert!(r_early <= r_late, "{r_early} > {r_late}");
    }

    #[test]
    fn releasable_reaches_unreleased_at_end(s in arb_schedule(), extra in 0i64..1_000_000) {
        let end = t0() + Duration::seconds(s.terms.duration_secs as i64 + extra);
        prop_assert_eq!(releasable_amount(&s, t0(), end), s.unreleased());
    }

    #[test]
    fn vested_never_exceeds_total(s in arb_schedule(), offset in -1_000_000i64..400_000_000) {
        let v = vested_amount(&s.terms, t0(), t0() + Duration::seconds(offset));
        prop_assert!(v <= s.terms.total_amount);
    }

    #[test]
    fn allocations_never_exceed_cap(
        cap in 0u64..1_000_000,
        requests in prop::collection::vec(0u64..300_000, 1..20),
    ) {
        let mut ledger = CategoryLedger::new([(AllocationCategory::Community, cap)]);
        for amount in requests {
            let before = ledger.stats(AllocationCategory::Community).allocated;
            match ledger.record_allocation(AllocationCategory::Community, amount) {
                Ok(()) => prop_assert_eq!(
                    ledger.stats(AllocationCategory::Community).allocated,
                    before + amount
                ),
                Err(VestingError::AllocationExceeded { .. }) => prop_assert_eq!(
                    ledger.stats(AllocationCategory::Community).allocated,
                    before
                ),
                Err(other) => prop_assert!(false, "unexpected error {other}"),
            }
            let stats = ledger.stats(AllocationCategory::Community);
            prop_assert!(stats.allocated <= stats.max_allocation);
        }
    }
}
