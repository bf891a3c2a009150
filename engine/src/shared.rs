//! # Shared Engine
//!
//! Serialization point for concurrent callers. The category cap check and
//! increment, and the beneficiary uniqueness check and insert, are both
//! check-then-act sequences; running every mutation under one write lock
//! keeps them from interleaving.
//!
//! Reads take the read lock, or clone an [`EngineSnapshot`] to work from a
//! consistent copy without holding the lock.
//!
//! Thread safety: all shared state is behind `Arc<RwLock<_>>`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::access::CapabilityChecker;
use crate::engine::{EngineSnapshot, VestingEngine};
use crate::error::VestingError;
use crate::ledger::TokenLedger;
use crate::release::ReleaseReceipt;
use crate::report::EngineReport;
use crate::schedule::{ScheduleTerms, VestingSchedule};
use crate::types::Address;

/// Clonable handle to a single engine instance.
pub struct SharedEngine<L, C> {
    inner: Arc<RwLock<VestingEngine<L, C>>>,
}

impl<L, C> Clone for SharedEngine<L, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L: TokenLedger, C: CapabilityChecker> SharedEngine<L, C> {
    pub fn new(engine: VestingEngine<L, C>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(engine)),
        }
    }

    /// Runs `f` under the read lock.
    pub fn read<R>(&self, f: impl FnOnce(&VestingEngine<L, C>) -> R) -> R {
        f(&self.inner.read())
    }

    /// Runs `f` under the write lock. Everything inside `f` is atomic with
    /// respect to every other caller.
    pub fn write<R>(&self, f: impl FnOnce(&mut VestingEngine<L, C>) -> R) -> R {
        f(&mut self.inner.write())
    }

    pub fn add_schedule(
        &self,
        caller: &Address,
        beneficiary: Address,
        terms: ScheduleTerms,
        now: DateTime<Utc>,
    ) -> Result<VestingSchedule, VestingError> {
        self.write(|e| e.add_schedule(caller, beneficiary, terms, now).cloned())
    }

    pub fn release(
        &self,
        caller: &Address,
        beneficiary: &Address,
        now: DateTime<Utc>,
    ) -> Result<ReleaseReceipt, VestingError> {
        self.write(|e| e.release(caller, beneficiary, now))
    }

    pub fn get(&self, beneficiary: &Address) -> Result<VestingSchedule, VestingError> {
        self.read(|e| e.get(beneficiary).cloned())
    }

    pub fn releasable(
        &self,
        beneficiary: &Address,
        now: DateTime<Utc>,
    ) -> Result<u64, VestingError> {
        self.read(|e| e.releasable(beneficiary, now))
    }

    pub fn report(&self, now: DateTime<Utc>) -> EngineReport {
        self.read(|e| e.report(now))
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        self.read(|e| e.snapshot())
    }
}
