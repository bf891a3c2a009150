//! # Engine Constants & Defaults
//!
//! Every default the engine ships with lives here. Deployments override the
//! category caps and the global start through [`crate::config::EngineConfig`];
//! the limits below are fixed.

use crate::types::AllocationCategory;

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// Seconds per day (UTC). Durations are stored in whole seconds.
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Longest schedule duration the engine accepts: 50 years.
///
/// Keeps every `start + duration` instant comfortably inside chrono's range.
pub const MAX_VESTING_DURATION_SECS: u64 = 50 * 365 * SECONDS_PER_DAY;

/// Default global vesting start: 2026-01-01T00:00:00Z.
pub const DEFAULT_GLOBAL_VESTING_START_TS: i64 = 1_767_225_600;

// ---------------------------------------------------------------------------
// Supply & Category Caps
// ---------------------------------------------------------------------------

/// Total pool distributed by a default deployment, in smallest units.
pub const DEFAULT_TOTAL_POOL: u64 = 1_000_000_000;

/// Default cap for the core team.
pub const DEFAULT_TEAM_CAP: u64 = 150_000_000;

/// Default cap for advisors.
pub const DEFAULT_ADVISORS_CAP: u64 = 50_000_000;

/// Default cap for seed and private-round investors.
pub const DEFAULT_INVESTORS_CAP: u64 = 200_000_000;

/// Default cap for ecosystem grants and partnerships.
pub const DEFAULT_ECOSYSTEM_CAP: u64 = 300_000_000;

/// Default cap for the treasury reserve.
pub const DEFAULT_TREASURY_CAP: u64 = 200_000_000;

/// Default cap for community programs.
pub const DEFAULT_COMMUNITY_CAP: u64 = 100_000_000;

/// Default cap for a category.
pub const fn default_cap(category: AllocationCategory) -> u64 {
    match category {
        AllocationCategory::Team => DEFAULT_TEAM_CAP,
        AllocationCategory::Advisors => DEFAULT_ADVISORS_CAP,
        AllocationCategory::Investors => DEFAULT_INVESTORS_CAP,
        AllocationCategory::Ecosystem => DEFAULT_ECOSYSTEM_CAP,
        AllocationCategory::Treasury => DEFAULT_TREASURY_CAP,
        AllocationCategory::Community => DEFAULT_COMMUNITY_CAP,
    }
}

// ---------------------------------------------------------------------------
// Operational Limits
// ---------------------------------------------------------------------------

/// Max beneficiaries processed per `release_batch` call.
pub const MAX_BATCH_RELEASE: usize = 20;
