//! # Reporting Types
//!
//! Read-only views consumed by status and audit tooling. Produced by
//! [`VestingEngine::report`](crate::engine::VestingEngine::report),
//! [`VestingEngine::check_solvency`](crate::engine::VestingEngine::check_solvency),
//! and [`VestingEngine::quote`](crate::engine::VestingEngine::quote).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::CategoryStats;
use crate::types::{Address, AllocationCategory};

/// Custody balance measured against outstanding obligations.
///
/// Obligations are `total_amount - released_amount` summed over non-revoked
/// schedules. The sum is kept in `u128`: category caps are independent, so
/// their total can exceed `u64::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolvencyStatus {
    /// Tokens held by the custody account.
    pub custody_balance: u64,
    /// Tokens still owed to non-revoked schedules.
    pub obligations: u128,
    /// `custody - obligations` when solvent, else 0.
    pub surplus: u64,
    /// `obligations - custody` when insolvent, else 0.
    pub shortfall: u128,
}

impl SolvencyStatus {
    /// Compares `custody_balance` against `obligations`.
    pub fn new(custody_balance: u64, obligations: u128) -> Self {
        let custody = u128::from(custody_balance);
        Self {
            custody_balance,
            obligations,
            // At most `custody_balance`, so it always fits.
            surplus: u64::try_from(custody.saturating_sub(obligations)).unwrap_or(u64::MAX),
            shortfall: obligations.saturating_sub(custody),
        }
    }

    /// True when custody covers every obligation.
    pub fn is_solvent(&self) -> bool {
        self.shortfall == 0
    }
}

/// Aggregate engine state at an instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineReport {
    /// The `now` the report was computed for.
    pub generated_at: DateTime<Utc>,
    /// Start used by schedules without their own.
    pub global_vesting_start: DateTime<Utc>,
    /// Whether the release gate is engaged.
    pub paused: bool,
    /// Schedules ever created, revoked ones included.
    pub schedule_count: usize,
    /// Schedules currently revoked.
    pub revoked_count: usize,
    /// One entry per category, in category order.
    pub categories: Vec<CategoryStats>,
    /// Sum of category allocations (revoked schedules included).
    pub total_allocated: u64,
    /// Sum of `released_amount` across every schedule.
    pub total_released: u64,
    /// What could be released right now across every schedule.
    pub total_releasable: u64,
    /// Custody balance against outstanding obligations.
    pub solvency: SolvencyStatus,
}

/// Per-beneficiary view at an instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingQuote {
    /// Whose schedule this is.
    pub beneficiary: Address,
    /// Category the schedule draws from.
    pub category: AllocationCategory,
    /// Tokens granted by the schedule.
    pub total_amount: u64,
    /// Vested at the quoted instant, ignoring the cliff.
    pub vested: u64,
    /// Already released.
    pub released: u64,
    /// Releasable at the quoted instant: zero while revoked or inside the cliff.
    pub releasable: u64,
    /// Whether releases are currently blocked by a revocation.
    pub revoked: bool,
    /// The schedule's own start, or the global start.
    pub effective_start: DateTime<Utc>,
    /// First instant anything can be released.
    pub cliff_end: DateTime<Utc>,
    /// First instant the full amount is vested.
    pub vesting_end: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solvency_surplus_and_shortfall() {
        let ok = SolvencyStatus::new(1_000, 600);
        assert!(ok.is_solvent());
        assert_eq!(ok.surplus, 400);
        assert_eq!(ok.shortfall, 0);

        let short = SolvencyStatus::new(100, 600);
        assert!(!short.is_solvent());
        assert_eq!(short.surplus, 0);
        assert_eq!(short.shortfall, 500);

        assert!(SolvencyStatus::new(600, 600).is_solvent());
    }

    #[test]
    fn obligations_beyond_u64_are_not_clamped_into_solvency() {
        let huge = u128::from(u64::MAX) + 1_000;
        let status = SolvencyStatus::new(u64::MAX, huge);
        assert!(!status.is_solvent());
        assert_eq!(status.shortfall, 1_000);
        assert_eq!(status.surplus, 0);
    }
}
