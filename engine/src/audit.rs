//! # Audit Trail
//!
//! Append-only record of every successful state change. Failed operations
//! leave no entry, matching the "validate then mutate" rule.
//!
//! Emergency withdrawals are recorded here in addition to being logged at
//! `warn` level, so reviewers can isolate every use of the escape hatch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Address, AllocationCategory};

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditKind {
    ScheduleCreated {
        beneficiary: Address,
        category: AllocationCategory,
        total_amount: u64,
    },
    Released {
        beneficiary: Address,
        amount: u64,
        released_total: u64,
    },
    Revoked {
        beneficiary: Address,
    },
    Restored {
        beneficiary: Address,
    },
    CategoryCapUpdated {
        category: AllocationCategory,
        previous: u64,
        new_max: u64,
    },
    GlobalStartUpdated {
        previous: DateTime<Utc>,
        new_start: DateTime<Utc>,
    },
    Paused,
    Unpaused,
    EmergencyWithdrawal {
        to: Address,
        amount: u64,
        reason: String,
    },
    /// Custody topped up from outside the engine.
    Deposited {
        amount: u64,
        custody_balance: u64,
    },
}

/// One entry in the trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique identifier for this entry.
    pub id: Uuid,
    /// The instant supplied by the caller.
    pub at: DateTime<Utc>,
    /// The identity that performed the operation.
    pub actor: Address,
    #[serde(flatten)]
    pub kind: AuditKind,
}

/// The trail itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditLog {
    events: Vec<AuditEvent>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry and returns its id.
    pub fn record(&mut self, at: DateTime<Utc>, actor: Address, kind: AuditKind) -> Uuid {
        let id = Uuid::new_v4();
        self.events.push(AuditEvent {
            id,
            at,
            actor,
            kind,
        });
        id
    }

    pub fn events(&self) -> &[AuditEvent] {
        &self.events
    }

    /// Only the emergency withdrawals.
    pub fn emergency_withdrawals(&self) -> impl Iterator<Item = &AuditEvent> {
        self.events
            .iter()
            .filter(|e| matches!(e.kind, AuditKind::EmergencyWithdrawal { .. }))
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
