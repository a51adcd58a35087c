//! Period-over-period deltas via explicit lag lookups.
//!
//! The caller supplies partitions already sorted ascending by period key;
//! this pass never sorts defensively, so an out-of-order or duplicate key is
//! surfaced as an `UnsortedInput` error rather than silently reordered.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::instrument;

use crate::errors::AnalyticsError;
use crate::models::PeriodMetric;

const GLOBAL_PARTITION: &str = "<global>";

/// Fills `growth_rate` by looking back N rows within a partition.
#[derive(Debug, Clone, Copy)]
pub struct TrendCalculator {
    lag: usize,
}

impl TrendCalculator {
    pub fn new(lag: usize) -> Self {
        Self { lag }
    }

    /// Lag 1: month-over-month when fed monthly rows.
    pub fn month_over_month() -> Self {
        Self::new(1)
    }

    /// Lag 12: year-over-year when fed consecutive monthly rows.
    pub fn year_over_year() -> Self {
        Self::new(12)
    }

    /// Compute growth rates for a single ordered partition.
    #[instrument(skip_all, fields(lag = self.lag))]
    pub fn apply(&self, metrics: &[PeriodMetric]) -> Result<Vec<PeriodMetric>, AnalyticsError> {
        self.apply_named(GLOBAL_PARTITION, metrics)
    }

    /// Compute growth rates for each partition independently.
    #[instrument(skip_all, fields(lag = self.lag))]
    pub fn apply_partitioned(
        &self,
        partitions: &BTreeMap<String, Vec<PeriodMetric>>,
    ) -> Result<BTreeMap<String, Vec<PeriodMetric>>, AnalyticsError> {
        let mut out = BTreeMap::new();
        for (name, metrics) in partitions {
            out.insert(name.clone(), self.apply_named(name, metrics)?);
        }
        Ok(out)
    }

    fn apply_named(
        &self,
        partition: &str,
        metrics: &[PeriodMetric],
    ) -> Result<Vec<PeriodMetric>, AnalyticsError> {
        verify_strictly_ordered(partition, metrics)?;

        let mut out = Vec::with_capacity(metrics.len());
        for (idx, metric) in metrics.iter().enumerate() {
            let previous = idx.checked_sub(self.lag).map(|i| &metrics[i]);
            let growth_rate = previous.map(|prev| growth_pct(metric.revenue, prev.revenue));
            out.push(PeriodMetric {
                growth_rate,
                ..metric.clone()
            });
        }
        Ok(out)
    }
}

/// (current - previous) / previous * 100, with the zero-previous guard.
fn growth_pct(current: Decimal, previous: Decimal) -> Decimal {
    if previous.is_zero() {
        Decimal::ZERO
    } else {
        ((current - previous) / previous * Decimal::ONE_HUNDRED).round_dp(2)
    }
}

fn verify_strictly_ordered(
    partition: &str,
    metrics: &[PeriodMetric],
) -> Result<(), AnalyticsError> {
    for window in metrics.windows(2) {
        if window[1].period_key <= window[0].period_key {
            return Err(AnalyticsError::UnsortedInput {
                partition: partition.to_string(),
                previous: window[0].period_key.clone(),
                key: window[1].period_key.clone(),
            });
        }
    }
    Ok(())
}
