//! # Schedule Store
//!
//! Holds exactly one [`VestingSchedule`] per beneficiary. Records are created
//! once, mutated by releases and revoke/restore, and never deleted, so the
//! store doubles as an audit source for status tooling.
//!
//! Lifecycle per beneficiary:
//!
//! ```text
//! Uninitialized --add_schedule--> Active <--revoke/restore--> Revoked
//! ```
//!
//! There is no terminal state. A fully released schedule stays queryable.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::CategoryLedger;
use crate::constants::MAX_VESTING_DURATION_SECS;
use crate::error::VestingError;
use crate::types::{Address, AllocationCategory};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The parameters a schedule is created with. Immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleTerms {
    /// Tokens granted over the life of the schedule. Must be > 0.
    pub total_amount: u64,
    /// Custom start instant. `None` means "use the global vesting start".
    pub start: Option<DateTime<Utc>>,
    /// Seconds after the effective start before anything is releasable.
    pub cliff_secs: u64,
    /// Seconds from the effective start to full vesting. Must be > 0.
    pub duration_secs: u64,
    /// Category whose cap this schedule counts against.
    pub category: AllocationCategory,
}

impl ScheduleTerms {
    /// Checks amount, duration, and cliff.
    ///
    /// # Errors
    ///
    /// Returns [`VestingError::Validation`] for a zero amount, a zero or
    /// over-long duration, or a cliff longer than the duration.
    pub fn validate(&self) -> Result<(), VestingError> {
        if self.total_amount == 0 {
            return Err(VestingError::validation("total amount must be > 0"));
        }
        if self.duration_secs == 0 {
            return Err(VestingError::validation("duration must be > 0"));
        }
        if self.duration_secs > MAX_VESTING_DURATION_SECS {
            return Err(VestingError::validation(format!(
                "duration {}s exceeds the {}s maximum",
                self.duration_secs, MAX_VESTING_DURATION_SECS
            )));
        }
        if self.cliff_secs > self.duration_secs {
            return Err(VestingError::validation(format!(
                "cliff {}s exceeds duration {}s",
                self.cliff_secs, self.duration_secs
            )));
        }
        Ok(())
    }
}

/// One beneficiary's vesting record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingSchedule {
    /// Identity entitled to the tokens.
    pub beneficiary: Address,
    /// Creation-time parameters.
    pub terms: ScheduleTerms,
    /// Tokens already transferred out. Never decreases, never exceeds
    /// `terms.total_amount`.
    pub released_amount: u64,
    /// Revoked schedules release nothing until restored.
    pub revoked: bool,
    /// Set on creation, never cleared.
    pub initialized: bool,
    /// Instant the schedule was created.
    pub created_at: DateTime<Utc>,
}

impl VestingSchedule {
    /// Validates `terms` and the beneficiary identity, then builds a fresh
    /// record with nothing released.
    pub fn new(
        beneficiary: Address,
        terms: ScheduleTerms,
        created_at: DateTime<Utc>,
    ) -> Result<Self, VestingError> {
        if beneficiary.is_zero() {
            return Err(VestingError::validation(
                "beneficiary must not be the zero address",
            ));
        }
        terms.validate()?;
        Ok(Self {
            beneficiary,
            terms,
            released_amount: 0,
            revoked: false,
            initialized: true,
            created_at,
        })
    }

    /// Tokens not yet transferred: `total_amount - released_amount`.
    pub fn unreleased(&self) -> u64 {
        self.terms.total_amount.saturating_sub(self.released_amount)
    }

    /// Returns `true` once every token has been released.
    pub fn is_fully_released(&self) -> bool {
        self.released_amount >= self.terms.total_amount
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// All schedules keyed by beneficiary, in deterministic order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleStore {
    schedules: BTreeMap<Address, VestingSchedule>,
}

impl ScheduleStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a schedule and commits its amount to the category ledger.
    ///
    /// Both writes land or neither does: every check that can fail runs
    /// before either structure is touched.
    ///
    /// # Errors
    ///
    /// - [`VestingError::Validation`] for bad terms or a zero beneficiary.
    /// - [`VestingError::DuplicateBeneficiary`] if a schedule already exists.
    /// - [`VestingError::AllocationExceeded`] if the category cap is hit.
    pub fn add_schedule(
        &mut self,
        categories: &mut CategoryLedger,
        beneficiary: Address,
        terms: ScheduleTerms,
        now: DateTime<Utc>,
    ) -> Result<&VestingSchedule, VestingError> {
        let schedule = VestingSchedule::new(beneficiary, terms, now)?;

        if self.schedules.contains_key(&beneficiary) {
            return Err(VestingError::DuplicateBeneficiary(beneficiary));
        }

        categories.record_allocation(terms.category, terms.total_amount)?;

        Ok(&*self.schedules.entry(beneficiary).or_insert(schedule))
    }

    /// # Errors
    ///
    /// [`VestingError::NotFound`] if the beneficiary has no schedule.
    pub fn get(&self, beneficiary: &Address) -> Result<&VestingSchedule, VestingError> {
        self.schedules
            .get(beneficiary)
            .ok_or(VestingError::NotFound(*beneficiary))
    }

    /// Whether `beneficiary` has a schedule, revoked or not.
    pub fn contains(&self, beneficiary: &Address) -> bool {
        self.schedules.contains_key(beneficiary)
    }

    /// Marks the schedule revoked. `released_amount` and `total_amount` are
    /// untouched.
    pub fn revoke(&mut self, beneficiary: &Address) -> Result<&VestingSchedule, VestingError> {
        self.set_revoked(beneficiary, true)
    }

    /// Clears the revoked flag. Release accounting picks up exactly where it
    /// was.
    pub fn restore(&mut self, beneficiary: &Address) -> Result<&VestingSchedule, VestingError> {
        self.set_revoked(beneficiary, false)
    }

    /// Adds `amount` to the beneficiary's released total.
    ///
    /// # Errors
    ///
    /// [`VestingError::AmountOverflow`] if the result would exceed
    /// `total_amount`.
    pub fn record_release(
        &mut self,
        beneficiary: &Address,
        amount: u64,
    ) -> Result<&VestingSchedule, VestingError> {
        let schedule = self
            .schedules
            .get_mut(beneficiary)
            .ok_or(VestingError::NotFound(*beneficiary))?;
        let released = schedule
            .released_amount
            .checked_add(amount)
            .filter(|r| *r <= schedule.terms.total_amount)
            .ok_or(VestingError::AmountOverflow)?;
        schedule.released_amount = released;
        Ok(&*schedule)
    }

    /// Schedules in beneficiary order.
    pub fn iter(&self) -> impl Iterator<Item = &VestingSchedule> {
        self.schedules.values()
    }

    /// Number of schedules, revoked ones included.
    pub fn len(&self) -> usize {
        self.schedules.len()
    }

    /// True when no schedule has been created.
    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty()
    }

    fn set_revoked(
        &mut self,
        beneficiary: &Address,
        revoked: bool,
    ) -> Result<&VestingSchedule, VestingError> {
        let schedule = self
            .schedules
            .get_mut(beneficiary)
            .ok_or(VestingError::NotFound(*beneficiary))?;
        if schedule.revoked == revoked {
            let state = if revoked { "revoked" } else { "active" };
            return Err(VestingError::validation(format!(
                "schedule for {beneficiary} is already {state}"
            )));
        }
        schedule.revoked = revoked;
        Ok(&*schedule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SECONDS_PER_DAY;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    fn bob() -> Address {
        Address::from_bytes([0xb0; 20])
    }

    fn terms(amount: u64) -> ScheduleTerms {
        ScheduleTerms {
            total_amount: amount,
            start: Some(t0()),
            cliff_secs: 30 * SECONDS_PER_DAY,
            duration_secs: 365 * SECONDS_PER_DAY,
            category: AllocationCategory::Team,
        }
    }

    fn categories() -> CategoryLedger {
        CategoryLedger::new([(AllocationCategory::Team, 250_000)])
    }

    #[test]
    fn add_then_get_round_trips_terms() {
        let mut store = ScheduleStore::new();
        let mut cats = categories();
        store
            .add_schedule(&mut cats, bob(), terms(12_000), t0())
            .unwrap();

        let s = store.get(&bob()).unwrap();
        assert_eq!(s.terms, terms(12_000));
        assert_eq!(s.released_amount, 0);
        assert!(!s.revoked);
        assert!(s.initialized);
        assert_eq!(cats.stats(AllocationCategory::Team).allocated, 12_000);
    }

    #[test]
    fn invalid_terms_rejected() {
        let zero_amount = terms(0);
        let zero_duration = ScheduleTerms {
            duration_secs: 0,
            cliff_secs: 0,
            ..terms(1)
        };
        let long_cliff = ScheduleTerms {
            cliff_secs: 400 * SECONDS_PER_DAY,
            ..terms(1)
        };
        for bad in [zero_amount, zero_duration, long_cliff] {
            assert!(matches!(bad.validate(), Err(VestingError::Validation(_))));
        }
    }

    #[test]
    fn cliff_equal_to_duration_is_valid() {
        let t = ScheduleTerms {
            cliff_secs: 365 * SECONDS_PER_DAY,
            ..terms(1)
        };
        assert!(t.validate().is_ok());
    }

    #[test]
    fn zero_beneficiary_rejected() {
        let mut store = ScheduleStore::new();
        let mut cats = categories();
        let err = store
            .add_schedule(&mut cats, Address::ZERO, terms(100), t0())
            .unwrap_err();
        assert!(matches!(err, VestingError::Validation(_)));
        assert_eq!(cats.total_allocated(), 0);
    }

    #[test]
    fn duplicate_leaves_first_schedule_and_allocation_untouched() {
        let mut store = ScheduleStore::new();
        let mut cats = categories();
        store
            .add_schedule(&mut cats, bob(), terms(12_000), t0())
            .unwrap();
        let err = store
            .add_schedule(&mut cats, bob(), terms(5_000), t0())
            .unwrap_err();
        assert_eq!(err, VestingError::DuplicateBeneficiary(bob()));
        assert_eq!(store.get(&bob()).unwrap().terms.total_amount, 12_000);
        assert_eq!(cats.stats(AllocationCategory::Team).allocated, 12_000);
    }

    #[test]
    fn allocation_failure_stores_nothing() {
        let mut store = ScheduleStore::new();
        let mut cats = categories();
        let err = store
            .add_schedule(&mut cats, bob(), terms(250_001), t0())
            .unwrap_err();
        assert!(matches!(err, VestingError::AllocationExceeded { .. }));
        assert!(!store.contains(&bob()));
        assert!(store.is_empty());
    }

    #[test]
    fn revoke_restore_toggle_only_the_flag() {
        let mut store = ScheduleStore::new();
        let mut cats = categories();
        store
            .add_schedule(&mut cats, bob(), terms(12_000), t0())
            .unwrap();
        store.record_release(&bob(), 1_000).unwrap();

        assert!(store.revoke(&bob()).unwrap().revoked);
        assert!(matches!(
            store.revoke(&bob()),
            Err(VestingError::Validation(_))
        ));
        let restored = store.restore(&bob()).unwrap();
        assert!(!restored.revoked);
        assert_eq!(restored.released_amount, 1_000);
        assert_eq!(restored.terms.total_amount, 12_000);
        assert!(matches!(
            store.restore(&bob()),
            Err(VestingError::Validation(_))
        ));
    }

    #[test]
    fn release_cannot_exceed_total() {
        let mut store = ScheduleStore::new();
        let mut cats = categories();
        store.add_schedule(&mut cats, bob(), terms(100), t0()).unwrap();
        store.record_release(&bob(), 100).unwrap();
        assert!(store.get(&bob()).unwrap().is_fully_released());
        assert_eq!(
            store.record_release(&bob(), 1).unwrap_err(),
            VestingError::AmountOverflow
        );
    }

    #[test]
    fn missing_beneficiary_not_found() {
        let mut store = ScheduleStore::new();
        assert_eq!(store.get(&bob()).unwrap_err(), VestingError::NotFound(bob()));
        assert_eq!(
            store.revoke(&bob()).unwrap_err(),
            VestingError::NotFound(bob())
        );
    }
}
