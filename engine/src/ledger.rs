//! # Token Ledger Seam
//!
//! The engine holds custody of tokens but never moves value itself. It asks a
//! [`TokenLedger`] for its custody balance and to transfer out of custody.
//!
//! [`InMemoryLedger`] is a complete ledger for tests and scenario replay: it
//! tracks per-holder balances, enforces non-negative balances, and can be
//! told to refuse transfers so failure paths are testable.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Address;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors a token ledger can report for a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Custody does not hold enough tokens.
    #[error("insufficient custody balance: available {available}, requested {requested}")]
    InsufficientBalance {
        /// Current custody balance.
        available: u64,
        /// Amount the engine asked to move.
        requested: u64,
    },

    /// Crediting the recipient would overflow u64.
    #[error("balance overflow crediting {0}")]
    Overflow(Address),

    /// The ledger refused the transfer for its own reasons.
    #[error("transfer rejected: {0}")]
    Rejected(String),
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Balance and transfer primitives the engine consumes.
///
/// `transfer` always moves out of the engine's custody. Implementations must
/// either move the full amount or nothing; the engine does not retry.
pub trait TokenLedger {
    /// The holder whose balance is the engine's custody.
    fn custody_address(&self) -> Address;

    /// Balance held by `holder`.
    fn balance_of(&self, holder: &Address) -> u64;

    /// Moves `amount` from custody to `to`.
    fn transfer(&mut self, to: &Address, amount: u64) -> Result<(), LedgerError>;

    /// Convenience: the engine's own balance.
    fn custody_balance(&self) -> u64 {
        self.balance_of(&self.custody_address())
    }
}

// ---------------------------------------------------------------------------
// InMemoryLedger
// ---------------------------------------------------------------------------

/// HashMap-backed ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InMemoryLedger {
    custody: Address,
    balances: HashMap<Address, u64>,
    /// When set, every transfer is refused with this message.
    reject_transfers: Option<String>,
    transfer_count: u64,
}

impl InMemoryLedger {
    /// Creates an empty ledger with `custody` as the engine's holding.
    pub fn new(custody: Address) -> Self {
        Self {
            custody,
            balances: HashMap::new(),
            reject_transfers: None,
            transfer_count: 0,
        }
    }

    /// Creates a ledger whose custody already holds `amount`.
    pub fn funded(custody: Address, amount: u64) -> Self {
        let mut ledger = Self::new(custody);
        ledger.balances.insert(custody, amount);
        ledger
    }

    /// Credits `amount` to custody from outside the engine (treasury funding).
    pub fn deposit(&mut self, amount: u64) -> Result<(), LedgerError> {
        let custody = self.custody;
        self.credit(&custody, amount)
    }

    /// Makes every subsequent transfer fail with `reason` until cleared.
    pub fn reject_transfers(&mut self, reason: impl Into<String>) {
        self.reject_transfers = Some(reason.into());
    }

    /// Stops refusing transfers.
    pub fn accept_transfers(&mut self) {
        self.reject_transfers = None;
    }

    /// Number of transfers that actually moved tokens.
    pub fn transfer_count(&self) -> u64 {
        self.transfer_count
    }

    fn credit(&mut self, holder: &Address, amount: u64) -> Result<(), LedgerError> {
        let balance = self.balances.entry(*holder).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(LedgerError::Overflow(*holder))?;
        Ok(())
    }
}

impl TokenLedger for InMemoryLedger {
    fn custody_address(&self) -> Address {
        self.custody
    }

    fn balance_of(&self, holder: &Address) -> u64 {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    fn transfer(&mut self, to: &Address, amount: u64) -> Result<(), LedgerError> {
        if let Some(reason) = &self.reject_transfers {
            return Err(LedgerError::Rejected(reason.clone()));
        }

        let available = self.custody_balance();
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                available,
                requested: amount,
            });
        }

        // Check the credit side before debiting so a failure moves nothing.
        let recipient = self.balance_of(to);
        if *to != self.custody && recipient.checked_add(amount).is_none() {
            return Err(LedgerError::Overflow(*to));
        }

        self.balances.insert(self.custody, available - amount);
        self.credit(to, amount)?;
        self.transfer_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn custody() -> Address {
        Address::from_bytes([0xcc; 20])
    }

    fn alice() -> Address {
        Address::from_bytes([0xa1; 20])
    }

    #[test]
    fn transfer_moves_from_custody() {
        let mut ledger = InMemoryLedger::funded(custody(), 1_000);
        ledger.transfer(&alice(), 400).unwrap();
        assert_eq!(ledger.custody_balance(), 600);
        assert_eq!(ledger.balance_of(&alice()), 400);
        assert_eq!(ledger.transfer_count(), 1);
    }

    #[test]
    fn insufficient_custody_rejected_without_side_effects() {
        let mut ledger = InMemoryLedger::funded(custody(), 100);
        let err = ledger.transfer(&alice(), 101).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientBalance {
                available: 100,
                requested: 101
            }
        );
        assert_eq!(ledger.custody_balance(), 100);
        assert_eq!(ledger.balance_of(&alice()), 0);
    }

    #[test]
    fn rejecting_ledger_moves_nothing() {
        let mut ledger = InMemoryLedger::funded(custody(), 100);
        ledger.reject_transfers("maintenance");
        assert!(matches!(
            ledger.transfer(&alice(), 10),
            Err(LedgerError::Rejected(_))
        ));
        assert_eq!(ledger.custody_balance(), 100);

        ledger.accept_transfers();
        ledger.transfer(&alice(), 10).unwrap();
        assert_eq!(ledger.balance_of(&alice()), 10);
    }

    #[test]
    fn deposit_increases_custody() {
        let mut ledger = InMemoryLedger::new(custody());
        ledger.deposit(500).unwrap();
        ledger.deposit(250).unwrap();
        assert_eq!(ledger.custody_balance(), 750);
    }
}
