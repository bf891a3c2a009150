//! # Engine Errors
//!
//! One taxonomy for every operation. Read paths only ever return
//! [`VestingError::NotFound`]; everything else comes from mutations, which
//! validate fully before touching state.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::ledger::LedgerError;
use crate::types::{Address, AllocationCategory};

/// Errors that can occur during vesting engine operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VestingError {
    /// Malformed input: zero amount or duration, cliff past the duration,
    /// a malformed identity, or a redundant state toggle.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The category does not have enough room left under its cap.
    #[error(
        "allocation exceeded for {category}: requested {requested}, remaining {remaining}"
    )]
    AllocationExceeded {
        /// The category being allocated from.
        category: AllocationCategory,
        /// Amount the caller tried to commit.
        requested: u64,
        /// Room left under the cap.
        remaining: u64,
    },

    /// The beneficiary already has a schedule. Schedules are never re-created.
    #[error("beneficiary {0} already has a vesting schedule")]
    DuplicateBeneficiary(Address),

    /// No schedule exists for this beneficiary.
    #[error("no vesting schedule for beneficiary {0}")]
    NotFound(Address),

    /// The caller lacks the capability (or identity) the operation needs.
    #[error("unauthorized: {caller} may not {action}")]
    Unauthorized {
        /// The identity that attempted the operation.
        caller: Address,
        /// Short name of the attempted operation.
        action: &'static str,
    },

    /// The release gate is engaged.
    #[error("releases are paused")]
    Paused,

    /// The global vesting start has been reached and can no longer move.
    #[error("global vesting start {start} has already been reached")]
    AlreadyStarted {
        /// The current (frozen) global start.
        start: DateTime<Utc>,
    },

    /// Emergency withdrawals must state a reason.
    #[error("emergency withdrawal requires a non-empty reason")]
    InvalidReason,

    /// An arithmetic overflow would occur.
    #[error("amount overflow: operation would exceed allowed limits")]
    AmountOverflow,

    /// The token ledger refused the transfer. Bookkeeping is unchanged.
    #[error("token transfer failed: {0}")]
    Transfer(#[from] LedgerError),
}

impl VestingError {
    /// Shorthand for a [`VestingError::Validation`] with a message.
    pub fn validation(msg: impl Into<String>) -> Self {
        VestingError::Validation(msg.into())
    }
}
