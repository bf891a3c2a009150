//! # Core Types
//!
//! Identities, allocation categories, and the capability set the engine asks
//! its [`CapabilityChecker`](crate::access::CapabilityChecker) about.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// Byte length of an [`Address`].
pub const ADDRESS_LENGTH: usize = 20;

/// Errors produced when parsing an [`Address`] from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// The input is not valid hex.
    #[error("invalid hex in address: {0}")]
    InvalidHex(String),

    /// The decoded byte length is wrong.
    #[error("invalid address length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Required byte length.
        expected: usize,
        /// Byte length actually decoded.
        actual: usize,
    },
}

/// A 20-byte account identity, rendered as `0x`-prefixed lowercase hex.
///
/// The all-zero address parses fine but is never a valid beneficiary or
/// withdrawal target; see [`Address::is_zero`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// The all-zero address.
    pub const ZERO: Address = Address([0u8; ADDRESS_LENGTH]);

    /// Wraps raw bytes.
    pub const fn from_bytes(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Returns `true` for the all-zero address.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Lowercase hex with a `0x` prefix.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let bytes = hex::decode(digits).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        let array: [u8; ADDRESS_LENGTH] =
            bytes
                .as_slice()
                .try_into()
                .map_err(|_| AddressError::InvalidLength {
                    expected: ADDRESS_LENGTH,
                    actual: bytes.len(),
                })?;
        Ok(Self(array))
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.to_hex()
    }
}

impl From<[u8; ADDRESS_LENGTH]> for Address {
    fn from(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// AllocationCategory
// ---------------------------------------------------------------------------

/// A named allocation bucket. Each carries its own hard cap shared by every
/// schedule tagged with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationCategory {
    /// Core contributors.
    Team,
    /// Advisors and early helpers.
    Advisors,
    /// Seed and private-round investors.
    Investors,
    /// Grants, partnerships, integrations.
    Ecosystem,
    /// Long-term reserve.
    Treasury,
    /// Community programs and incentives.
    Community,
}

impl AllocationCategory {
    /// Every category, in declaration order.
    pub const ALL: [AllocationCategory; 6] = [
        AllocationCategory::Team,
        AllocationCategory::Advisors,
        AllocationCategory::Investors,
        AllocationCategory::Ecosystem,
        AllocationCategory::Treasury,
        AllocationCategory::Community,
    ];

    /// Stable lowercase name, also used as the serde representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            AllocationCategory::Team => "team",
            AllocationCategory::Advisors => "advisors",
            AllocationCategory::Investors => "investors",
            AllocationCategory::Ecosystem => "ecosystem",
            AllocationCategory::Treasury => "treasury",
            AllocationCategory::Community => "community",
        }
    }
}

impl fmt::Display for AllocationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AllocationCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        AllocationCategory::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == lower)
            .ok_or_else(|| format!("unknown allocation category: {s}"))
    }
}

// ---------------------------------------------------------------------------
// Capability
// ---------------------------------------------------------------------------

/// Privileges the engine checks through its capability checker.
///
/// "Self-beneficiary" is not a capability: it is an identity comparison
/// between the caller and the schedule's beneficiary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Highest privilege: caps, global start, revoke/restore, emergency withdraw.
    Admin,
    /// Creates schedules and releases on behalf of beneficiaries.
    ScheduleManager,
    /// Engages and disengages the release pause gate.
    PauseController,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Admin => write!(f, "admin"),
            Capability::ScheduleManager => write!(f, "schedule-manager"),
            Capability::PauseController => write!(f, "pause-controller"),
        }
    }
}
