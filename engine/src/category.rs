//! # Category Ledger
//!
//! Tracks, per [`AllocationCategory`], the cap and the cumulative amount
//! committed to schedules. `allocated` only ever grows: revoking a schedule
//! does not hand its capacity back.
//!
//! Invariant: `allocated <= max_allocation` for every category, at all times.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::VestingError;
use crate::types::AllocationCategory;

/// Cap and running total for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryAllocation {
    /// Hard cap on the sum of schedule amounts.
    pub max_allocation: u64,
    /// Sum of `total_amount` over every schedule ever created here.
    pub allocated: u64,
}

/// Read-only view returned by [`CategoryLedger::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub category: AllocationCategory,
    pub allocated: u64,
    pub max_allocation: u64,
    pub remaining: u64,
}

/// Per-category caps and allocations.
///
/// Every category in [`AllocationCategory::ALL`] is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryLedger {
    entries: BTreeMap<AllocationCategory, CategoryAllocation>,
}

impl CategoryLedger {
    /// Creates a ledger with the given caps and nothing allocated.
    ///
    /// Categories missing from `caps` start with a cap of zero.
    pub fn new(caps: impl IntoIterator<Item = (AllocationCategory, u64)>) -> Self {
        let mut entries: BTreeMap<_, _> = AllocationCategory::ALL
            .iter()
            .map(|c| {
                (
                    *c,
                    CategoryAllocation {
                        max_allocation: 0,
                        allocated: 0,
                    },
                )
            })
            .collect();
        for (category, cap) in caps {
            if let Some(entry) = entries.get_mut(&category) {
                entry.max_allocation = cap;
            }
        }
        Self { entries }
    }

    /// Room left under the cap for `category`.
    pub fn remaining(&self, category: AllocationCategory) -> u64 {
        let entry = self.entry(category);
        entry.max_allocation.saturating_sub(entry.allocated)
    }

    /// Fails with [`VestingError::AllocationExceeded`] unless `amount` fits.
    /// Does not mutate.
    pub fn ensure_capacity(
        &self,
        category: AllocationCategory,
        amount: u64,
    ) -> Result<(), VestingError> {
        let entry = self.entry(category);
        let fits = entry
            .allocated
            .checked_add(amount)
            .is_some_and(|total| total <= entry.max_allocation);
        if !fits {
            return Err(VestingError::AllocationExceeded {
                category,
                requested: amount,
                remaining: self.remaining(category),
            });
        }
        Ok(())
    }

    /// Commits `amount` to `category`. Only called during schedule creation.
    ///
    /// On failure `allocated` is unchanged.
    pub fn record_allocation(
        &mut self,
        category: AllocationCategory,
        amount: u64,
    ) -> Result<(), VestingError> {
        self.ensure_capacity(category, amount)?;
        let entry = self.entry_mut(category);
        entry.allocated += amount;
        Ok(())
    }

    /// Sets a new cap. A cap below what is already allocated is rejected,
    /// since it would break `allocated <= max_allocation`.
    ///
    /// Returns the previous cap.
    pub fn update_cap(
        &mut self,
        category: AllocationCategory,
        new_max: u64,
    ) -> Result<u64, VestingError> {
        let entry = self.entry_mut(category);
        if new_max < entry.allocated {
            return Err(VestingError::validation(format!(
                "cap {new_max} for {category} is below the {} already allocated",
                entry.allocated
            )));
        }
        let previous = entry.max_allocation;
        entry.max_allocation = new_max;
        Ok(previous)
    }

    pub fn stats(&self, category: AllocationCategory) -> CategoryStats {
        let entry = self.entry(category);
        CategoryStats {
            category,
            allocated: entry.allocated,
            max_allocation: entry.max_allocation,
            remaining: self.remaining(category),
        }
    }

    /// Stats for every category, in declaration order.
    pub fn all_stats(&self) -> Vec<CategoryStats> {
        AllocationCategory::ALL
            .iter()
            .map(|c| self.stats(*c))
            .collect()
    }

    /// Sum of `allocated` across categories.
    pub fn total_allocated(&self) -> u64 {
        self.entries
            .values()
            .fold(0u64, |acc, e| acc.saturating_add(e.allocated))
    }

    fn entry(&self, category: AllocationCategory) -> CategoryAllocation {
        self.entries
            .get(&category)
            .copied()
            .unwrap_or(CategoryAllocation {
                max_allocation: 0,
                allocated: 0,
            })
    }

    fn entry_mut(&mut self, category: AllocationCategory) -> &mut CategoryAllocation {
        self.entries
            .entry(category)
            .or_insert(CategoryAllocation {
                max_allocation: 0,
                allocated: 0,
            })
    }
}
