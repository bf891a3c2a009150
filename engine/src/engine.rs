//! # Vesting Engine
//!
//! Owns the category ledger, the schedule store, the global vesting start,
//! the pause gate, and the audit trail, and drives the two external
//! collaborators: a [`TokenLedger`] for custody and a [`CapabilityChecker`]
//! for authorization.
//!
//! This file holds the admin control surface and the read-only reporting
//! surface. The release executor lives in [`crate::release`].
//!
//! Every mutating method takes `&mut self` and the caller-supplied `now`.
//! Wrap the engine in [`SharedEngine`](crate::shared::SharedEngine) when
//! more than one thread needs it.
//!
//! ## Authorization
//!
//! | Operation                      | Requires                        |
//! |--------------------------------|---------------------------------|
//! | `add_schedule`                 | admin or schedule-manager       |
//! | `revoke` / `restore`           | admin                           |
//! | `update_category_allocation`   | admin                           |
//! | `update_global_vesting_start`  | admin                           |
//! | `emergency_withdraw`           | admin                           |
//! | `pause` / `unpause`            | pause-controller                |
//! | `release`                      | beneficiary or schedule-manager |
//! | `release_for`                  | admin                           |
//! | `release_batch`                | schedule-manager                |
//! | `deposit` (in-memory ledger)   | anyone                          |
//!
//! Capabilities are fixed once the engine is built. Tokens leave custody
//! only through a release or `emergency_withdraw`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::CapabilityChecker;
use crate::audit::{AuditEvent, AuditKind, AuditLog};
use crate::calculator;
use crate::category::{CategoryLedger, CategoryStats};
use crate::config::{ConfigError, EngineConfig};
use crate::error::VestingError;
use crate::ledger::{InMemoryLedger, TokenLedger};
use crate::report::{EngineReport, SolvencyStatus, VestingQuote};
use crate::schedule::{ScheduleStore, ScheduleTerms, VestingSchedule};
use crate::types::{Address, AllocationCategory, Capability};

/// Point-in-time copy of everything the engine owns except its collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    /// Start used by schedules created without one.
    pub global_vesting_start: DateTime<Utc>,
    /// Whether the release gate was engaged.
    pub paused: bool,
    /// Caps and allocations per category.
    pub categories: CategoryLedger,
    /// Every schedule, keyed by beneficiary.
    pub schedules: ScheduleStore,
}

/// The vesting engine.
pub struct VestingEngine<L, C> {
    pub(crate) ledger: L,
    pub(crate) capabilities: C,
    pub(crate) categories: CategoryLedger,
    pub(crate) schedules: ScheduleStore,
    pub(crate) global_vesting_start: DateTime<Utc>,
    pub(crate) paused: bool,
    pub(crate) audit: AuditLog,
}

impl<L: TokenLedger, C: CapabilityChecker> VestingEngine<L, C> {
    /// Builds an engine from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the configuration does not list every
    /// category exactly once.
    pub fn new(config: &EngineConfig, ledger: L, capabilities: C) -> Result<Self, ConfigError> {
        config.validate()?;
        tracing::info!(
            global_vesting_start = %config.global_vesting_start,
            custody = %ledger.custody_address(),
            "vesting engine initialized"
        );
        Ok(Self {
            ledger,
            capabilities,
            categories: CategoryLedger::new(config.caps()),
            schedules: ScheduleStore::new(),
            global_vesting_start: config.global_vesting_start,
            paused: false,
            audit: AuditLog::new(),
        })
    }

    // -----------------------------------------------------------------------
    // Schedules
    // -----------------------------------------------------------------------

    /// Creates the one and only schedule for `beneficiary`.
    ///
    /// # Errors
    ///
    /// - [`VestingError::Unauthorized`] unless the caller is admin or
    ///   schedule-manager.
    /// - [`VestingError::Validation`] for bad terms, a zero beneficiary, or
    ///   the custody account itself as beneficiary.
    /// - [`VestingError::DuplicateBeneficiary`] if a schedule exists.
    /// - [`VestingError::AllocationExceeded`] if the category is full.
    pub fn add_schedule(
        &mut self,
        caller: &Address,
        beneficiary: Address,
        terms: ScheduleTerms,
        now: DateTime<Utc>,
    ) -> Result<&VestingSchedule, VestingError> {
        if !self.has(caller, Capability::Admin) && !self.has(caller, Capability::ScheduleManager) {
            return Err(VestingError::Unauthorized {
                caller: *caller,
                action: "add_schedule",
            });
        }

        if beneficiary == self.ledger.custody_address() {
            return Err(VestingError::validation(
                "the custody account cannot be a beneficiary",
            ));
        }

        self.schedules
            .add_schedule(&mut self.categories, beneficiary, terms, now)?;

        tracing::info!(
            %beneficiary,
            category = %terms.category,
            total_amount = terms.total_amount,
            cliff_secs = terms.cliff_secs,
            duration_secs = terms.duration_secs,
            custom_start = terms.start.is_some(),
            "vesting schedule created"
        );
        self.audit.record(
            now,
            *caller,
            AuditKind::ScheduleCreated {
                beneficiary,
                category: terms.category,
                total_amount: terms.total_amount,
            },
        );
        self.schedules.get(&beneficiary)
    }

    /// Stops all releases for `beneficiary` until restored. Category capacity
    /// is not returned.
    pub fn revoke(
        &mut self,
        caller: &Address,
        beneficiary: &Address,
        now: DateTime<Utc>,
    ) -> Result<&VestingSchedule, VestingError> {
        self.require(caller, Capability::Admin, "revoke")?;
        self.schedules.revoke(beneficiary)?;
        tracing::info!(%beneficiary, "vesting schedule revoked");
        self.audit.record(
            now,
            *caller,
            AuditKind::Revoked {
                beneficiary: *beneficiary,
            },
        );
        self.schedules.get(beneficiary)
    }

    /// Re-enables releases. `released_amount` carries over, so the
    /// beneficiary can immediately release whatever vested in the meantime.
    pub fn restore(
        &mut self,
        caller: &Address,
        beneficiary: &Address,
        now: DateTime<Utc>,
    ) -> Result<&VestingSchedule, VestingError> {
        self.require(caller, Capability::Admin, "restore")?;
        self.schedules.restore(beneficiary)?;
        tracing::info!(%beneficiary, "vesting schedule restored");
        self.audit.record(
            now,
            *caller,
            AuditKind::Restored {
                beneficiary: *beneficiary,
            },
        );
        self.schedules.get(beneficiary)
    }

    // -----------------------------------------------------------------------
    // Admin controls
    // -----------------------------------------------------------------------

    /// Moves the global vesting start. Allowed only while `now` is still
    /// before the current global start, and never into the past.
    ///
    /// # Errors
    ///
    /// - [`VestingError::AlreadyStarted`] once `now >= global start`.
    /// - [`VestingError::Validation`] if `new_start < now`.
    pub fn update_global_vesting_start(
        &mut self,
        caller: &Address,
        new_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), VestingError> {
        self.require(caller, Capability::Admin, "update_global_vesting_start")?;
        let previous = self.global_vesting_start;
        if now >= previous {
            return Err(VestingError::AlreadyStarted { start: previous });
        }
        if new_start < now {
            return Err(VestingError::validation(format!(
                "new global start {new_start} is in the past"
            )));
        }

        self.global_vesting_start = new_start;
        tracing::info!(%previous, %new_start, "global vesting start updated");
        self.audit.record(
            now,
            *caller,
            AuditKind::GlobalStartUpdated {
                previous,
                new_start,
            },
        );
        Ok(())
    }

    /// Sets a new cap for `category`.
    ///
    /// # Errors
    ///
    /// [`VestingError::Validation`] if `new_max` is below what is already
    /// allocated.
    pub fn update_category_allocation(
        &mut self,
        caller: &Address,
        category: AllocationCategory,
        new_max: u64,
        now: DateTime<Utc>,
    ) -> Result<CategoryStats, VestingError> {
        self.require(caller, Capability::Admin, "update_category_allocation")?;
        let previous = self.categories.update_cap(category, new_max)?;
        tracing::info!(%category, previous, new_max, "category cap updated");
        self.audit.record(
            now,
            *caller,
            AuditKind::CategoryCapUpdated {
                category,
                previous,
                new_max,
            },
        );
        Ok(self.categories.stats(category))
    }

    /// Engages the release gate. Admin operations keep working.
    pub fn pause(&mut self, caller: &Address, now: DateTime<Utc>) -> Result<(), VestingError> {
        self.require(caller, Capability::PauseController, "pause")?;
        if self.paused {
            return Err(VestingError::validation("releases are already paused"));
        }
        self.paused = true;
        tracing::info!(%caller, "releases paused");
        self.audit.record(now, *caller, AuditKind::Paused);
        Ok(())
    }

    /// Releases the gate engaged by [`Self::pause`].
    pub fn unpause(&mut self, caller: &Address, now: DateTime<Utc>) -> Result<(), VestingError> {
        self.require(caller, Capability::PauseController, "unpause")?;
        if !self.paused {
            return Err(VestingError::validation("releases are not paused"));
        }
        self.paused = false;
        tracing::info!(%caller, "releases unpaused");
        self.audit.record(now, *caller, AuditKind::Unpaused);
        Ok(())
    }

    /// Escape hatch: moves `amount` out of custody to `to`, bypassing every
    /// schedule. Nothing in the schedule store or category ledger changes,
    /// so this can leave the engine insolvent; [`Self::check_solvency`]
    /// will show it.
    ///
    /// Always logged at `warn` and recorded in the audit trail. Returns the
    /// audit entry id.
    ///
    /// # Errors
    ///
    /// - [`VestingError::Unauthorized`] unless the caller is admin.
    /// - [`VestingError::InvalidReason`] for an empty or blank reason.
    /// - [`VestingError::Validation`] for a zero target or zero amount.
    /// - [`VestingError::Transfer`] if the ledger refuses.
    pub fn emergency_withdraw(
        &mut self,
        caller: &Address,
        to: &Address,
        amount: u64,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<Uuid, VestingError> {
        self.require(caller, Capability::Admin, "emergency_withdraw")?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(VestingError::InvalidReason);
        }
        if to.is_zero() {
            return Err(VestingError::validation(
                "withdrawal target must not be the zero address",
            ));
        }
        if amount == 0 {
            return Err(VestingError::validation("withdrawal amount must be > 0"));
        }

        if let Err(e) = self.ledger.transfer(to, amount) {
            tracing::error!(%caller, %to, amount, error = %e, "emergency withdrawal transfer failed");
            return Err(e.into());
        }

        let id = self.audit.record(
            now,
            *caller,
            AuditKind::EmergencyWithdrawal {
                to: *to,
                amount,
                reason: reason.to_string(),
            },
        );
        tracing::warn!(
            audit_id = %id,
            %caller,
            %to,
            amount,
            reason,
            custody_after = self.ledger.custody_balance(),
            "EMERGENCY WITHDRAWAL executed outside schedule accounting"
        );
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// The schedule for `beneficiary`.
    pub fn get(&self, beneficiary: &Address) -> Result<&VestingSchedule, VestingError> {
        self.schedules.get(beneficiary)
    }

    /// Vested amount at `now`, ignoring the cliff and prior releases.
    pub fn vested(&self, beneficiary: &Address, now: DateTime<Utc>) -> Result<u64, VestingError> {
        let schedule = self.schedules.get(beneficiary)?;
        Ok(calculator::vested_amount(
            &schedule.terms,
            self.global_vesting_start,
            now,
        ))
    }

    /// What a release at `now` would move.
    pub fn releasable(
        &self,
        beneficiary: &Address,
        now: DateTime<Utc>,
    ) -> Result<u64, VestingError> {
        let schedule = self.schedules.get(beneficiary)?;
        Ok(calculator::releasable_amount(
            schedule,
            self.global_vesting_start,
            now,
        ))
    }

    /// Full per-beneficiary view at `now`.
    pub fn quote(
        &self,
        beneficiary: &Address,
        now: DateTime<Utc>,
    ) -> Result<VestingQuote, VestingError> {
        let schedule = self.schedules.get(beneficiary)?;
        let global = self.global_vesting_start;
        Ok(VestingQuote {
            beneficiary: *beneficiary,
            category: schedule.terms.category,
            total_amount: schedule.terms.total_amount,
            vested: calculator::vested_amount(&schedule.terms, global, now),
            released: schedule.released_amount,
            releasable: calculator::releasable_amount(schedule, global, now),
            revoked: schedule.revoked,
            effective_start: calculator::effective_start(&schedule.terms, global),
            cliff_end: calculator::cliff_end(&schedule.terms, global),
            vesting_end: calculator::vesting_end(&schedule.terms, global),
        })
    }

    /// Allocation and cap for one category.
    pub fn category_stats(&self, category: AllocationCategory) -> CategoryStats {
        self.categories.stats(category)
    }

    /// Start used by schedules created without one.
    pub fn global_vesting_start(&self) -> DateTime<Utc> {
        self.global_vesting_start
    }

    /// Whether the release gate is engaged.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Every schedule, ordered by beneficiary.
    pub fn schedules(&self) -> impl Iterator<Item = &VestingSchedule> {
        self.schedules.iter()
    }

    /// The audit trail, oldest first.
    pub fn events(&self) -> &[AuditEvent] {
        self.audit.events()
    }

    /// The audit trail with its query helpers.
    pub fn audit_log(&self) -> &AuditLog {
        &self.audit
    }

    /// Read access to the token ledger. There is no mutable counterpart:
    /// tokens leave custody only through a release or
    /// [`Self::emergency_withdraw`].
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Sum of unreleased amounts over non-revoked schedules.
    pub fn outstanding_obligations(&self) -> u128 {
        self.schedules
            .iter()
            .filter(|s| !s.revoked)
            .map(|s| u128::from(s.unreleased()))
            .sum()
    }

    /// Custody balance against [`Self::outstanding_obligations`].
    pub fn check_solvency(&self) -> SolvencyStatus {
        SolvencyStatus::new(self.ledger.custody_balance(), self.outstanding_obligations())
    }

    /// Aggregate state at `now` for status tooling.
    pub fn report(&self, now: DateTime<Utc>) -> EngineReport {
        let global = self.global_vesting_start;
        let (total_released, total_releasable, revoked_count) = self.schedules.iter().fold(
            (0u64, 0u64, 0usize),
            |(released, releasable, revoked), s| {
                (
                    released.saturating_add(s.released_amount),
                    releasable.saturating_add(calculator::releasable_amount(s, global, now)),
                    revoked + usize::from(s.revoked),
                )
            },
        );

        EngineReport {
            generated_at: now,
            global_vesting_start: global,
            paused: self.paused,
            schedule_count: self.schedules.len(),
            revoked_count,
            categories: self.categories.all_stats(),
            total_allocated: self.categories.total_allocated(),
            total_released,
            total_releasable,
            solvency: self.check_solvency(),
        }
    }

    /// Detached copy of the engine's own state.
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            global_vesting_start: self.global_vesting_start,
            paused: self.paused,
            categories: self.categories.clone(),
            schedules: self.schedules.clone(),
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    pub(crate) fn has(&self, caller: &Address, capability: Capability) -> bool {
        self.capabilities.has_capability(caller, capability)
    }

    pub(crate) fn require(
        &self,
        caller: &Address,
        capability: Capability,
        action: &'static str,
    ) -> Result<(), VestingError> {
        if self.has(caller, capability) {
            Ok(())
        } else {
            tracing::debug!(%caller, %capability, action, "capability check failed");
            Err(VestingError::Unauthorized {
                caller: *caller,
                action,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// In-memory custody
// ---------------------------------------------------------------------------

impl<C: CapabilityChecker> VestingEngine<InMemoryLedger, C> {
    /// Tops up custody and records who funded it.
    ///
    /// Anyone may fund custody; only the inbound direction exists here.
    ///
    /// # Errors
    ///
    /// - [`VestingError::Validation`] for a zero amount.
    /// - [`VestingError::Transfer`] if the balance would overflow.
    pub fn deposit(
        &mut self,
        funder: &Address,
        amount: u64,
        now: DateTime<Utc>,
    ) -> Result<u64, VestingError> {
        if amount == 0 {
            return Err(VestingError::validation("deposit amount must be > 0"));
        }
        self.ledger.deposit(amount)?;
        let custody_balance = self.ledger.custody_balance();
        tracing::info!(%funder, amount, custody_balance, "custody funded");
        self.audit.record(
            now,
            *funder,
            AuditKind::Deposited {
                amount,
                custody_balance,
            },
        );
        Ok(custody_balance)
    }

    /// Makes every outbound transfer fail with `reason` until
    /// [`Self::accept_transfers`]. Simulates a ledger outage.
    pub fn reject_transfers(&mut self, reason: impl Into<String>) {
        self.ledger.reject_transfers(reason);
    }

    /// Ends a simulated outage.
    pub fn accept_transfers(&mut self) {
        self.ledger.accept_transfers();
    }
}
