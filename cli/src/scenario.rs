//! # Scenario Runner
//!
//! A scenario is a JSON document describing roles, custody funding, and a
//! timeline of engine operations. Each step carries its own timestamp and
//! caller; the runner replays the steps in file order against a fresh
//! in-memory engine and records what each one returned.
//!
//! ```json
//! {
//!   "custody": "0xcc000000000000000000000000000000000000cc",
//!   "custody_funding": 1000000,
//!   "roles": [
//!     { "address": "0xad000000000000000000000000000000000000ad", "capabilities": ["admin"] }
//!   ],
//!   "steps": [
//!     { "at": "2026-01-01T00:00:00Z", "caller": "0xad...", "op": "add_schedule",
//!       "beneficiary": "0xb0...", "amount": 12000, "cliff_days": 30,
//!       "duration_days": 365, "category": "team" },
//!     { "at": "2026-04-01T00:00:00Z", "caller": "0xb0...", "op": "release",
//!       "beneficiary": "0xb0..." }
//!   ]
//! }
//! ```
//!
//! A failing step is recorded and the run continues, the same way a failed
//! transaction does not stop the next one from being submitted.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tokenvest_engine::audit::AuditEvent;
use tokenvest_engine::constants::SECONDS_PER_DAY;
use tokenvest_engine::{
    Address, AllocationCategory, BatchReleaseOutcome, Capability, CategoryStats, EngineConfig,
    EngineReport, InMemoryLedger, ReleaseReceipt, RoleRegistry, ScheduleTerms, VestingEngine,
    VestingError, VestingSchedule,
};

type Engine = VestingEngine<InMemoryLedger, RoleRegistry>;

// ---------------------------------------------------------------------------
// Scenario format
// ---------------------------------------------------------------------------

/// Capabilities granted to one identity before the first step runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleGrant {
    pub address: Address,
    pub capabilities: Vec<Capability>,
}

/// A complete scenario file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Account that holds the tokens backing every schedule.
    pub custody: Address,
    /// Initial custody balance.
    #[serde(default)]
    pub custody_funding: u64,
    #[serde(default)]
    pub roles: Vec<RoleGrant>,
    pub steps: Vec<Step>,
    /// Instant for the final report. Defaults to the last step's timestamp.
    #[serde(default)]
    pub report_at: Option<DateTime<Utc>>,
}

/// One timestamped operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub at: DateTime<Utc>,
    /// Identity submitting the operation. A missing caller is the zero
    /// address, which holds no capabilities.
    #[serde(default)]
    pub caller: Option<Address>,
    #[serde(flatten)]
    pub action: Action,
}

/// Operations a step can perform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Action {
    AddSchedule {
        beneficiary: Address,
        amount: u64,
        #[serde(default)]
        start: Option<DateTime<Utc>>,
        #[serde(default)]
        cliff_days: u64,
        duration_days: u64,
        category: AllocationCategory,
    },
    Release {
        beneficiary: Address,
    },
    ReleaseFor {
        beneficiary: Address,
    },
    ReleaseBatch {
        beneficiaries: Vec<Address>,
    },
    Revoke {
        beneficiary: Address,
    },
    Restore {
        beneficiary: Address,
    },
    Pause,
    Unpause,
    UpdateCategoryAllocation {
        category: AllocationCategory,
        max_allocation: u64,
    },
    UpdateGlobalVestingStart {
        start: DateTime<Utc>,
    },
    EmergencyWithdraw {
        to: Address,
        amount: u64,
        reason: String,
    },
    /// Tops up custody. The caller is recorded as the funder.
    Deposit {
        amount: u64,
    },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::AddSchedule { .. } => "add_schedule",
            Action::Release { .. } => "release",
            Action::ReleaseFor { .. } => "release_for",
            Action::ReleaseBatch { .. } => "release_batch",
            Action::Revoke { .. } => "revoke",
            Action::Restore { .. } => "restore",
            Action::Pause => "pause",
            Action::Unpause => "unpause",
            Action::UpdateCategoryAllocation { .. } => "update_category_allocation",
            Action::UpdateGlobalVestingStart { .. } => "update_global_vesting_start",
            Action::EmergencyWithdraw { .. } => "emergency_withdraw",
            Action::Deposit { .. } => "deposit",
        }
    }
}

impl Scenario {
    /// Reads and parses a scenario file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario file: {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse scenario file: {}", path.display()))
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// What one step returned.
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub step: usize,
    pub op: &'static str,
    pub at: DateTime<Utc>,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<StepResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Payload of a successful step. Serialized without a tag; the `op` on the
/// enclosing [`StepOutcome`] says which shape to expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StepResult {
    Schedule(VestingSchedule),
    Receipt(ReleaseReceipt),
    Batch(Vec<BatchEntry>),
    Category(CategoryStats),
    Revoked {
        revoked: Address,
    },
    Restored {
        restored: Address,
    },
    Paused {
        paused: bool,
    },
    GlobalStart {
        global_vesting_start: DateTime<Utc>,
    },
    Withdrawal {
        audit_id: Uuid,
        to: Address,
        amount: u64,
    },
    Deposit {
        custody_balance: u64,
    },
}

impl StepResult {
    /// Releases in this result that moved a non-zero amount.
    pub fn releases(&self) -> u64 {
        match self {
            StepResult::Receipt(receipt) => u64::from(receipt.amount > 0),
            StepResult::Batch(entries) => entries
                .iter()
                .filter_map(|e| e.receipt.as_ref())
                .filter(|r| r.amount > 0)
                .count() as u64,
            _ => 0,
        }
    }
}

/// One beneficiary's share of a batch release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchEntry {
    pub beneficiary: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<ReleaseReceipt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<BatchReleaseOutcome> for BatchEntry {
    fn from(outcome: BatchReleaseOutcome) -> Self {
        let (receipt, error) = match outcome.result {
            Ok(receipt) => (Some(receipt), None),
            Err(e) => (None, Some(e.to_string())),
        };
        Self {
            beneficiary: outcome.beneficiary,
            receipt,
            error,
        }
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    pub steps: Vec<StepOutcome>,
    pub report: EngineReport,
    pub events: Vec<AuditEvent>,
    /// Releases that moved a non-zero amount.
    pub releases: u64,
}

impl SimulationResult {
    pub fn failed_steps(&self) -> usize {
        self.steps.iter().filter(|s| !s.ok).count()
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Replays `scenario` against a fresh engine built from `config`.
pub fn run(scenario: &Scenario, config: &EngineConfig) -> Result<SimulationResult> {
    let mut roles = RoleRegistry::new();
    for grant in &scenario.roles {
        for capability in &grant.capabilities {
            roles.grant(grant.address, *capability);
        }
    }
    let ledger = InMemoryLedger::funded(scenario.custody, scenario.custody_funding);
    let mut engine = VestingEngine::new(config, ledger, roles)
        .context("failed to build engine from configuration")?;

    tracing::info!(
        steps = scenario.steps.len(),
        roles = scenario.roles.len(),
        custody_funding = scenario.custody_funding,
        "replaying scenario"
    );

    let mut releases = 0u64;
    let mut outcomes = Vec::with_capacity(scenario.steps.len());
    for (index, step) in scenario.steps.iter().enumerate() {
        let outcome = match apply(&mut engine, step) {
            Ok(value) => {
                releases += value.releases();
                StepOutcome {
                    step: index,
                    op: step.action.name(),
                    at: step.at,
                    ok: true,
                    result: Some(value),
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!(step = index, op = step.action.name(), error = %e, "step failed");
                StepOutcome {
                    step: index,
                    op: step.action.name(),
                    at: step.at,
                    ok: false,
                    result: None,
                    error: Some(e.to_string()),
                }
            }
        };
        outcomes.push(outcome);
    }

    let report_at = scenario
        .report_at
        .or_else(|| scenario.steps.last().map(|s| s.at))
        .unwrap_or(config.global_vesting_start);
    let report = engine.report(report_at);
    let failed = outcomes.iter().filter(|o| !o.ok).count();
    tracing::info!(
        failed,
        releases,
        solvent = report.solvency.is_solvent(),
        "scenario complete"
    );

    Ok(SimulationResult {
        steps: outcomes,
        report,
        events: engine.events().to_vec(),
        releases,
    })
}

fn apply(engine: &mut Engine, step: &Step) -> Result<StepResult, VestingError> {
    let caller = step.caller.unwrap_or(Address::ZERO);
    let now = step.at;

    let result = match &step.action {
        Action::AddSchedule {
            beneficiary,
            amount,
            start,
            cliff_days,
            duration_days,
            category,
        } => {
            let terms = ScheduleTerms {
                total_amount: *amount,
                start: *start,
                cliff_secs: days_to_secs(*cliff_days)?,
                duration_secs: days_to_secs(*duration_days)?,
                category: *category,
            };
            StepResult::Schedule(engine.add_schedule(&caller, *beneficiary, terms, now)?.clone())
        }
        Action::Release { beneficiary } => {
            StepResult::Receipt(engine.release(&caller, beneficiary, now)?)
        }
        Action::ReleaseFor { beneficiary } => {
            StepResult::Receipt(engine.release_for(&caller, beneficiary, now)?)
        }
        Action::ReleaseBatch { beneficiaries } => StepResult::Batch(
            engine
                .release_batch(&caller, beneficiaries, now)?
                .into_iter()
                .map(BatchEntry::from)
                .collect(),
        ),
        Action::Revoke { beneficiary } => {
            engine.revoke(&caller, beneficiary, now)?;
            StepResult::Revoked {
                revoked: *beneficiary,
            }
        }
        Action::Restore { beneficiary } => {
            engine.restore(&caller, beneficiary, now)?;
            StepResult::Restored {
                restored: *beneficiary,
            }
        }
        Action::Pause => {
            engine.pause(&caller, now)?;
            StepResult::Paused { paused: true }
        }
        Action::Unpause => {
            engine.unpause(&caller, now)?;
            StepResult::Paused { paused: false }
        }
        Action::UpdateCategoryAllocation {
            category,
            max_allocation,
        } => StepResult::Category(engine.update_category_allocation(
            &caller,
            *category,
            *max_allocation,
            now,
        )?),
        Action::UpdateGlobalVestingStart { start } => {
            engine.update_global_vesting_start(&caller, *start, now)?;
            StepResult::GlobalStart {
                global_vesting_start: *start,
            }
        }
        Action::EmergencyWithdraw { to, amount, reason } => StepResult::Withdrawal {
            audit_id: engine.emergency_withdraw(&caller, to, *amount, reason, now)?,
            to: *to,
            amount: *amount,
        },
        Action::Deposit { amount } => StepResult::Deposit {
            custody_balance: engine.deposit(&caller, *amount, now)?,
        },
    };
    Ok(result)
}

fn days_to_secs(days: u64) -> Result<u64, VestingError> {
    days.checked_mul(SECONDS_PER_DAY)
        .ok_or(VestingError::AmountOverflow)
}
