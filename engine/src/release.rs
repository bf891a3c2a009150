//! # Release Executor
//!
//! Moves vested tokens from custody to beneficiaries.
//!
//! Every path computes `releasable(now)`, asks the ledger to transfer, and
//! only then bumps `released_amount`. A refused transfer leaves bookkeeping
//! exactly as it was and is never retried here; the caller owns retry
//! policy.
//!
//! A releasable amount of zero is a successful no-op: the ledger is not
//! called and the receipt reports `amount == 0`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::access::CapabilityChecker;
use crate::audit::AuditKind;
use crate::calculator;
use crate::constants::MAX_BATCH_RELEASE;
use crate::engine::VestingEngine;
use crate::error::VestingError;
use crate::ledger::TokenLedger;
use crate::types::{Address, Capability};

/// Result of a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseReceipt {
    pub beneficiary: Address,
    /// Who triggered the release.
    pub initiated_by: Address,
    /// Tokens moved by this call. Zero for a no-op.
    pub amount: u64,
    /// `released_amount` after this call.
    pub released_total: u64,
    pub at: DateTime<Utc>,
}

/// Per-entry result of [`VestingEngine::release_batch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReleaseOutcome {
    pub beneficiary: Address,
    pub result: Result<ReleaseReceipt, VestingError>,
}

impl<L: TokenLedger, C: CapabilityChecker> VestingEngine<L, C> {
    /// Releases whatever `beneficiary` can release at `now`.
    ///
    /// # Errors
    ///
    /// - [`VestingError::Unauthorized`] unless `caller` is the beneficiary or
    ///   holds schedule-manager.
    /// - [`VestingError::Paused`] while the release gate is engaged.
    /// - [`VestingError::NotFound`] if there is no schedule.
    /// - [`VestingError::Transfer`] if the ledger refuses; nothing changes.
    pub fn release(
        &mut self,
        caller: &Address,
        beneficiary: &Address,
        now: DateTime<Utc>,
    ) -> Result<ReleaseReceipt, VestingError> {
        if caller != beneficiary && !self.has(caller, Capability::ScheduleManager) {
            return Err(VestingError::Unauthorized {
                caller: *caller,
                action: "release",
            });
        }
        self.execute_release(beneficiary, caller, now)
    }

    /// Administrative release on behalf of a beneficiary who cannot
    /// self-serve. Same computation as [`Self::release`].
    pub fn release_for(
        &mut self,
        caller: &Address,
        beneficiary: &Address,
        now: DateTime<Utc>,
    ) -> Result<ReleaseReceipt, VestingError> {
        self.require(caller, Capability::Admin, "release_for")?;
        self.execute_release(beneficiary, caller, now)
    }

    /// Releases for up to [`MAX_BATCH_RELEASE`] beneficiaries.
    ///
    /// Entries are processed in order and independently: one failing entry
    /// does not undo or block the others. The call itself fails only for a
    /// bad caller, an empty or oversized batch, or an engaged pause gate.
    pub fn release_batch(
        &mut self,
        caller: &Address,
        beneficiaries: &[Address],
        now: DateTime<Utc>,
    ) -> Result<Vec<BatchReleaseOutcome>, VestingError> {
        self.require(caller, Capability::ScheduleManager, "release_batch")?;
        if beneficiaries.is_empty() {
            return Err(VestingError::validation("batch must not be empty"));
        }
        if beneficiaries.len() > MAX_BATCH_RELEASE {
            return Err(VestingError::validation(format!(
                "batch of {} exceeds the limit of {MAX_BATCH_RELEASE}",
                beneficiaries.len()
            )));
        }
        if self.paused {
            return Err(VestingError::Paused);
        }

        let outcomes: Vec<_> = beneficiaries
            .iter()
            .map(|b| BatchReleaseOutcome {
                beneficiary: *b,
                result: self.execute_release(b, caller, now),
            })
            .collect();

        let released: u64 = outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .map(|r| r.amount)
            .sum();
        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        tracing::info!(
            %caller,
            batch_size = beneficiaries.len(),
            failed,
            released,
            "batch release processed"
        );
        Ok(outcomes)
    }

    fn execute_release(
        &mut self,
        beneficiary: &Address,
        caller: &Address,
        now: DateTime<Utc>,
    ) -> Result<ReleaseReceipt, VestingError> {
        if self.paused {
            return Err(VestingError::Paused);
        }

        let schedule = self.schedules.get(beneficiary)?;
        let amount = calculator::releasable_amount(schedule, self.global_vesting_start, now);
        let released_before = schedule.released_amount;

        if amount == 0 {
            tracing::debug!(%beneficiary, %caller, "nothing releasable");
            return Ok(ReleaseReceipt {
                beneficiary: *beneficiary,
                initiated_by: *caller,
                amount: 0,
                released_total: released_before,
                at: now,
            });
        }

        // Guard the bookkeeping update before moving tokens.
        released_before
            .checked_add(amount)
            .ok_or(VestingError::AmountOverflow)?;

        if let Err(e) = self.ledger.transfer(beneficiary, amount) {
            tracing::error!(%beneficiary, amount, error = %e, "release transfer failed");
            return Err(e.into());
        }

        let released_total = self
            .schedules
            .record_release(beneficiary, amount)?
            .released_amount;

        tracing::info!(%beneficiary, %caller, amount, released_total, "tokens released");
        self.audit.record(
            now,
            *caller,
            AuditKind::Released {
                beneficiary: *beneficiary,
                amount,
                released_total,
            },
        );

        Ok(ReleaseReceipt {
            beneficiary: *beneficiary,
            initiated_by: *caller,
            amount,
            released_total,
            at: now,
        })
    }
}
