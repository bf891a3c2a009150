// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # tokenvest Vesting Engine
//!
//! Distributes a fixed pool of tokens to many beneficiaries over time. Every
//! beneficiary gets exactly one schedule, every schedule belongs to one capped
//! allocation category, and tokens leave custody only through a release (or
//! the audited emergency escape hatch).
//!
//! ## Architecture
//!
//! - **types**: Addresses, allocation categories, capabilities.
//! - **category**: Per-category caps and cumulative allocation.
//! - **schedule**: Schedule records, one per beneficiary, never deleted.
//! - **calculator**: Pure cliff/linear vesting math.
//! - **engine**: Admin control surface and read-only reporting.
//! - **release**: Release executor (self-service, on-behalf, batch).
//! - **ledger** / **access**: External collaborator seams (token custody and
//!   capability checks) plus in-memory implementations.
//! - **shared**: Single-writer serialization point for concurrent callers.
//! - **audit**: Append-only trail of every successful mutation.
//! - **config** / **constants**: Engine configuration and defaults.
//!
//! ## Design Principles
//!
//! 1. The engine never reads a clock. Every operation takes `now`.
//! 2. All monetary operations are checked: `checked_add`, `checked_sub`, and
//!    u128 intermediates for the linear curve.
//! 3. Validate fully, then mutate. A failed call leaves state untouched.
//! 4. Every public type is serializable (serde) for reporting tooling.

pub mod access;
pub mod audit;
pub mod calculator;
pub mod category;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod release;
pub mod report;
pub mod schedule;
pub mod shared;
pub mod types;

pub use access::{CapabilityChecker, RoleRegistry};
pub use category::{CategoryLedger, CategoryStats};
pub use config::{CategoryConfig, ConfigError, EngineConfig};
pub use engine::{EngineSnapshot, VestingEngine};
pub use error::VestingError;
pub use ledger::{InMemoryLedger, LedgerError, TokenLedger};
pub use release::{BatchReleaseOutcome, ReleaseReceipt};
pub use report::{EngineReport, SolvencyStatus, VestingQuote};
pub use schedule::{ScheduleStore, ScheduleTerms, VestingSchedule};
pub use shared::SharedEngine;
pub use types::{Address, AllocationCategory, Capability};

/// Crate version, as built.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
