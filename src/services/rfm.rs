//! Recency/frequency/monetary customer scoring and segmentation.
//!
//! Both the score thresholds and the segment rules are evaluated top-down
//! with first match winning. The rule order is load-bearing: "Loyal
//! Customers" must be checked before "New Customers" so a recent, frequent
//! buyer is never misfiled as new.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::config::RfmConfig;
use crate::models::{CustomerAggregate, RfmScore, Segment, TransactionRecord};

/// Per-segment rollup for the segment summary table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SegmentSummary {
    pub segment: Segment,
    pub customer_count: i64,
    /// Share of all scored customers, percent, 2 decimals
    pub percentage: Decimal,
    pub avg_monetary_value: Decimal,
    pub avg_frequency: Decimal,
    pub avg_recency_days: Decimal,
}

/// Full RFM output: one row per customer plus the segment rollup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RfmReport {
    pub customers: Vec<CustomerRfmRow>,
    pub segments: Vec<SegmentSummary>,
}

/// Customer aggregate joined with its scores and segment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerRfmRow {
    #[serde(flatten)]
    pub aggregate: CustomerAggregate,
    pub recency_score: u8,
    pub frequency_score: u8,
    pub monetary_score: u8,
    pub segment: Segment,
}

#[derive(Debug, Clone)]
pub struct RfmSegmenter {
    thresholds: RfmConfig,
}

impl RfmSegmenter {
    pub fn new(thresholds: RfmConfig) -> Self {
        Self { thresholds }
    }

    /// Build per-customer aggregates, ordered by customer id.
    pub fn customer_aggregates(
        records: &[TransactionRecord],
        as_of: DateTime<Utc>,
    ) -> Vec<CustomerAggregate> {
        let mut grouped: BTreeMap<&str, Vec<&TransactionRecord>> = BTreeMap::new();
        for record in records {
            grouped.entry(&record.customer_id).or_default().push(record);
        }

        let as_of_date = as_of.date_naive();
        grouped
            .into_iter()
            .map(|(customer_id, rows)| {
                let last_purchase_date = rows
                    .iter()
                    .map(|r| r.transaction_date)
                    .max()
                    .expect("group is never empty");
                let total_transactions = rows.len() as i64;
                let total_spent: Decimal = rows.iter().map(|r| r.total_amount).sum();
                let avg_transaction_value =
                    (total_spent / Decimal::from(total_transactions)).round_dp(2);
                CustomerAggregate {
                    customer_id: customer_id.to_string(),
                    last_purchase_date,
                    total_transactions,
                    total_spent,
                    avg_transaction_value,
                    recency_days: (as_of_date - last_purchase_date).num_days(),
                }
            })
            .collect()
    }

    /// Score one customer against the threshold cascades.
    pub fn score(&self, aggregate: &CustomerAggregate) -> RfmScore {
        let recency_score = score_ascending(aggregate.recency_days, &self.thresholds.recency_cutoffs);
        let frequency_score =
            score_descending(aggregate.total_transactions, &self.thresholds.frequency_cutoffs);
        let monetary_score =
            score_descending(aggregate.total_spent, &self.thresholds.monetary_cutoffs);
        RfmScore {
            customer_id: aggregate.customer_id.clone(),
            recency_score,
            frequency_score,
            monetary_score,
            segment: assign_segment(recency_score, frequency_score, monetary_score),
        }
    }

    /// Score every customer and roll the results up per segment.
    #[instrument(skip_all, fields(customers = records.len()))]
    pub fn run(&self, records: &[TransactionRecord], as_of: DateTime<Utc>) -> RfmReport {
        let aggregates = Self::customer_aggregates(records, as_of);
        let customers: Vec<CustomerRfmRow> = aggregates
            .into_iter()
            .map(|aggregate| {
                let score = self.score(&aggregate);
                CustomerRfmRow {
                    aggregate,
                    recency_score: score.recency_score,
                    frequency_score: score.frequency_score,
                    monetary_score: score.monetary_score,
                    segment: score.segment,
                }
            })
            .collect();
        let segments = summarize_segments(&customers);
        RfmReport {
            customers,
            segments,
        }
    }
}

/// Segment assignment cascade; the order of these rules must not change.
pub fn assign_segment(recency: u8, frequency: u8, monetary: u8) -> Segment {
    if recency >= 4 && frequency >= 4 && monetary >= 4 {
        Segment::Champions
    } else if recency >= 3 && frequency >= 3 && monetary >= 3 {
        Segment::LoyalCustomers
    } else if recency >= 4 && frequency <= 2 {
        Segment::NewCustomers
    } else if recency <= 2 && frequency >= 3 && monetary >= 3 {
        Segment::AtRisk
    } else if recency <= 2 && frequency <= 2 {
        Segment::LostCustomers
    } else {
        Segment::PotentialLoyalists
    }
}

/// Lower is better: value <= cutoffs[i] scores 5-i, else 1.
fn score_ascending(value: i64, cutoffs: &[i64]) -> u8 {
    for (i, cutoff) in cutoffs.iter().enumerate() {
        if value <= *cutoff {
            return 5 - i as u8;
        }
    }
    1
}

/// Higher is better: value >= cutoffs[i] scores 5-i, else 1.
fn score_descending<T: PartialOrd<T>, U: Into<T> + Copy>(value: T, cutoffs: &[U]) -> u8 {
    for (i, cutoff) in cutoffs.iter().enumerate() {
        if value >= (*cutoff).into() {
            return 5 - i as u8;
        }
    }
    1
}

fn summarize_segments(customers: &[CustomerRfmRow]) -> Vec<SegmentSummary> {
    let total = customers.len();
    let mut grouped: BTreeMap<Segment, Vec<&CustomerRfmRow>> = BTreeMap::new();
    for row in customers {
        grouped.entry(row.segment).or_default().push(row);
    }

    grouped
        .into_iter()
        .map(|(segment, rows)| {
            let count = rows.len() as i64;
            let divisor = Decimal::from(count);
            let sum_spent: Decimal = rows.iter().map(|r| r.aggregate.total_spent).sum();
            let sum_freq: i64 = rows.iter().map(|r| r.aggregate.total_transactions).sum();
            let sum_recency: i64 = rows.iter().map(|r| r.aggregate.recency_days).sum();
            SegmentSummary {
                segment,
                customer_count: count,
                percentage: (Decimal::from(count) / Decimal::from(total as i64)
                    * Decimal::ONE_HUNDRED)
                    .round_dp(2),
                avg_monetary_value: (sum_spent / divisor).round_dp(2),
                avg_frequency: (Decimal::from(sum_freq) / divisor).round_dp(2),
                avg_recency_days: (Decimal::from(sum_recency) / divisor).round_dp(2),
            }
        })
        .collect()
}
