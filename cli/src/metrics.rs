//! # Prometheus Metrics
//!
//! Renders an [`EngineReport`] as Prometheus gauges so a scenario's final
//! state can be diffed against a live deployment's scrape output.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] under
//! the `tokenvest` prefix so they do not collide with the default registry.

use prometheus::{Encoder, IntCounter, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder};
use tokenvest_engine::EngineReport;

/// Holds all Prometheus metric handles for one engine.
#[derive(Clone)]
pub struct EngineMetrics {
    registry: Registry,
    /// Number of schedules ever created.
    pub schedules: IntGauge,
    /// Number of schedules currently revoked.
    pub revoked_schedules: IntGauge,
    /// Sum of category allocations.
    pub total_allocated: IntGauge,
    /// Sum of released amounts.
    pub total_released: IntGauge,
    /// Tokens releasable right now across every schedule.
    pub total_releasable: IntGauge,
    /// Tokens held by the custody account.
    pub custody_balance: IntGauge,
    /// Tokens still owed to beneficiaries.
    pub obligations: IntGauge,
    /// 1 while the release gate is engaged.
    pub paused: IntGauge,
    /// Allocated amount per category.
    pub category_allocated: IntGaugeVec,
    /// Cap per category.
    pub category_cap: IntGaugeVec,
    /// Releases that moved a non-zero amount.
    pub releases_total: IntCounter,
}

impl EngineMetrics {
    /// Creates and registers all metrics.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("tokenvest".into()), None)?;

        let schedules = IntGauge::new("schedules", "Number of vesting schedules")?;
        registry.register(Box::new(schedules.clone()))?;

        let revoked_schedules =
            IntGauge::new("revoked_schedules", "Number of revoked vesting schedules")?;
        registry.register(Box::new(revoked_schedules.clone()))?;

        let total_allocated = IntGauge::new(
            "total_allocated",
            "Tokens committed to schedules across all categories",
        )?;
        registry.register(Box::new(total_allocated.clone()))?;

        let total_released =
            IntGauge::new("total_released", "Tokens released to beneficiaries")?;
        registry.register(Box::new(total_released.clone()))?;

        let total_releasable = IntGauge::new(
            "total_releasable",
            "Tokens releasable at report time across all schedules",
        )?;
        registry.register(Box::new(total_releasable.clone()))?;

        let custody_balance =
            IntGauge::new("custody_balance", "Tokens held by the custody account")?;
        registry.register(Box::new(custody_balance.clone()))?;

        let obligations = IntGauge::new(
            "obligations",
            "Unreleased tokens owed to non-revoked schedules",
        )?;
        registry.register(Box::new(obligations.clone()))?;

        let paused = IntGauge::new("paused", "1 while releases are paused")?;
        registry.register(Box::new(paused.clone()))?;

        let category_allocated = IntGaugeVec::new(
            Opts::new("category_allocated", "Tokens allocated per category"),
            &["category"],
        )?;
        registry.register(Box::new(category_allocated.clone()))?;

        let category_cap = IntGaugeVec::new(
            Opts::new("category_cap", "Allocation cap per category"),
            &["category"],
        )?;
        registry.register(Box::new(category_cap.clone()))?;

        let releases_total = IntCounter::new(
            "releases_total",
            "Releases that transferred a non-zero amount",
        )?;
        registry.register(Box::new(releases_total.clone()))?;

        Ok(Self {
            registry,
            schedules,
            revoked_schedules,
            total_allocated,
            total_released,
            total_releasable,
            custody_balance,
            obligations,
            paused,
            category_allocated,
            category_cap,
            releases_total,
        })
    }

    /// Sets every gauge from `report`.
    pub fn observe_report(&self, report: &EngineReport) {
        self.schedules.set(clamp(report.schedule_count));
        self.revoked_schedules.set(clamp(report.revoked_count));
        self.total_allocated.set(clamp(report.total_allocated));
        self.total_released.set(clamp(report.total_released));
        self.total_releasable.set(clamp(report.total_releasable));
        self.custody_balance
            .set(clamp(report.solvency.custody_balance));
        self.obligations.set(clamp(report.solvency.obligations));
        self.paused.set(i64::from(report.paused));

        for stats in &report.categories {
            let label = stats.category.as_str();
            self.category_allocated
                .with_label_values(&[label])
                .set(clamp(stats.allocated));
            self.category_cap
                .with_label_values(&[label])
                .set(clamp(stats.max_allocation));
        }
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Gauges are `i64`; anything larger pins at `i64::MAX`.
fn clamp(value: impl TryInto<i64>) -> i64 {
    value.try_into().unwrap_or(i64::MAX)
}
