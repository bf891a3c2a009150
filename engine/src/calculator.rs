//! # Vesting Calculator
//!
//! Pure functions over a schedule, the global start, and `now`. Nothing here
//! reads a clock or mutates state.
//!
//! The curve is linear over the **full** duration from the effective start.
//! The cliff only gates when tokens become releasable; it does not shift the
//! curve:
//!
//! ```text
//! vested
//!   ^                              ______ total
//!   |                          ___/
//!   |                      ___/
//!   |                  ___/
//!   |              ___/ <- releasable from here on
//!   |          ___/ :
//!   |      ___/     :
//!   |  ___/         :
//!   +--+------------+-----------------+----> time
//!    start        cliff            start+duration
//! ```
//!
//! All math is integer. The linear segment uses a u128 intermediate and
//! rounds down, so `vested` never overshoots.

use chrono::{DateTime, Duration, Utc};

use crate::schedule::{ScheduleTerms, VestingSchedule};

/// The schedule's own start, or the global start when it has none.
pub fn effective_start(terms: &ScheduleTerms, global_start: DateTime<Utc>) -> DateTime<Utc> {
    terms.start.unwrap_or(global_start)
}

/// First instant at which anything can be released.
pub fn cliff_end(terms: &ScheduleTerms, global_start: DateTime<Utc>) -> DateTime<Utc> {
    offset(effective_start(terms, global_start), terms.cliff_secs)
}

/// First instant at which the full amount is vested.
pub fn vesting_end(terms: &ScheduleTerms, global_start: DateTime<Utc>) -> DateTime<Utc> {
    offset(effective_start(terms, global_start), terms.duration_secs)
}

/// Amount vested at `now`, ignoring the cliff and prior releases.
pub fn vested_amount(
    terms: &ScheduleTerms,
    global_start: DateTime<Utc>,
    now: DateTime<Utc>,
) -> u64 {
    let start = effective_start(terms, global_start);
    if now < start {
        return 0;
    }

    let elapsed = elapsed_secs(start, now);
    if elapsed >= terms.duration_secs {
        return terms.total_amount;
    }

    let vested = (terms.total_amount as u128) * (elapsed as u128) / (terms.duration_secs as u128);
    // elapsed < duration, so vested < total_amount and always fits.
    vested as u64
}

/// Vested amount once the cliff has passed, zero before it.
pub fn unlocked_amount(
    terms: &ScheduleTerms,
    global_start: DateTime<Utc>,
    now: DateTime<Utc>,
) -> u64 {
    let start = effective_start(terms, global_start);
    if now < start || elapsed_secs(start, now) < terms.cliff_secs {
        return 0;
    }
    vested_amount(terms, global_start, now)
}

/// Amount the beneficiary could release at `now`.
///
/// Zero while revoked or before the cliff, otherwise vested minus already
/// released.
pub fn releasable_amount(
    schedule: &VestingSchedule,
    global_start: DateTime<Utc>,
    now: DateTime<Utc>,
) -> u64 {
    if schedule.revoked {
        return 0;
    }
    unlocked_amount(&schedule.terms, global_start, now).saturating_sub(schedule.released_amount)
}

/// Whole seconds from `start` to `now`, clamped at zero.
fn elapsed_secs(start: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    u64::try_from(now.signed_duration_since(start).num_seconds()).unwrap_or(0)
}

fn offset(instant: DateTime<Utc>, secs: u64) -> DateTime<Utc> {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|d| instant.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SECONDS_PER_DAY;
    use crate::types::{Address, AllocationCategory};
    use chrono::TimeZone;

    const DAY: i64 = SECONDS_PER_DAY as i64;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    fn terms(start: Option<DateTime<Utc>>) -> ScheduleTerms {
        ScheduleTerms {
            total_amount: 12_000,
            start,
            cliff_secs: 30 * SECONDS_PER_DAY,
            duration_secs: 365 * SECONDS_PER_DAY,
            category: AllocationCategory::Team,
        }
    }

    fn schedule() -> VestingSchedule {
        VestingSchedule::new(Address::from_bytes([7; 20]), terms(Some(t0())), t0()).unwrap()
    }

    #[test]
    fn nothing_vests_before_start() {
        let t = terms(Some(t0()));
        assert_eq!(vested_amount(&t, t0(), t0() - Duration::seconds(1)), 0);
        assert_eq!(vested_amount(&t, t0(), t0()), 0);
    }

    #[test]
    fn vesting_is_linear_from_start_not_from_cliff() {
        let t = terms(Some(t0()));
        // 60 days in: 12000 * 60 / 365 = 1972.6 -> 1972.
        let at = t0() + Duration::seconds(60 * DAY);
        assert_eq!(vested_amount(&t, t0(), at), 1_972);
        assert_eq!(unlocked_amount(&t, t0(), at), 1_972);
    }

    #[test]
    fn cliff_gates_release_but_not_vesting() {
        let s = schedule();
        let at = t0() + Duration::seconds(15 * DAY);
        assert!(vested_amount(&s.terms, t0(), at) > 0);
        assert_eq!(releasable_amount(&s, t0(), at), 0);

        // At the cliff the whole linear amount to date unlocks at once.
        let cliff = cliff_end(&s.terms, t0());
        assert_eq!(cliff, t0() + Duration::seconds(30 * DAY));
        assert_eq!(releasable_amount(&s, t0(), cliff), 12_000 * 30 / 365);
        assert_eq!(releasable_amount(&s, t0(), cliff - Duration::seconds(1)), 0);
    }

    #[test]
    fn fully_vested_at_and_after_end() {
        let s = schedule();
        let end = vesting_end(&s.terms, t0());
        assert_eq!(releasable_amount(&s, t0(), end), 12_000);
        assert_eq!(
            releasable_amount(&s, t0(), end + Duration::seconds(1)),
            12_000
        );
        assert_eq!(
            releasable_amount(&s, t0(), end + Duration::days(3_650)),
            12_000
        );
    }

    #[test]
    fn releasable_subtracts_released_and_respects_revocation() {
        let mut s = schedule();
        let at = t0() + Duration::seconds(200 * DAY);
        let before = releasable_amount(&s, t0(), at);
        s.released_amount = 1_000;
        assert_eq!(releasable_amount(&s, t0(), at), before - 1_000);

        s.revoked = true;
        assert_eq!(releasable_amount(&s, t0(), at), 0);
        s.revoked = false;
        assert_eq!(releasable_amount(&s, t0(), at), before - 1_000);
    }

    #[test]
    fn unset_start_follows_global_start() {
        let t = terms(None);
        let global = t0() + Duration::days(10);
        assert_eq!(effective_start(&t, global), global);
        assert_eq!(vested_amount(&t, global, t0() + Duration::days(5)), 0);
        assert_eq!(
            vested_amount(&t, global, global + Duration::seconds(365 * DAY)),
            12_000
        );
    }

    #[test]
    fn zero_cliff_releases_immediately_after_start() {
        let t = ScheduleTerms {
            cliff_secs: 0,
            ..terms(Some(t0()))
        };
        assert_eq!(unlocked_amount(&t, t0(), t0()), 0);
        assert!(unlocked_amount(&t, t0(), t0() + Duration::days(1)) > 0);
    }

    #[test]
    fn large_amounts_do_not_overflow() {
        let t = ScheduleTerms {
            total_amount: u64::MAX,
            ..terms(Some(t0()))
        };
        let half = t0() + Duration::seconds(365 * DAY / 2);
        let v = vested_amount(&t, t0(), half);
        assert!(v > u64::MAX / 2 - u64::MAX / 1_000);
        assert!(v < u64::MAX);
    }
}
