//! Headline scalar metrics, all-time and trailing-window.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::models::{ProductRecord, TransactionRecord};

/// Executive KPI summary. Every metric is independent of the others.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KpiSummary {
    pub as_of: DateTime<Utc>,
    pub window_days: i64,

    // All-time
    pub total_revenue: Decimal,
    pub total_transactions: i64,
    pub total_customers: i64,
    pub avg_order_value: Decimal,
    pub active_products: i64,

    // Trailing window, lower bound inclusive
    pub trailing_revenue: Decimal,
    pub trailing_transactions: i64,
    pub trailing_customers: i64,
    pub trailing_avg_order_value: Decimal,
    /// Distinct products sold inside the trailing window
    pub trailing_products_sold: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct KpiSummarizer {
    window_days: i64,
}

impl KpiSummarizer {
    pub fn new(window_days: i64) -> Self {
        Self { window_days }
    }

    #[instrument(skip_all, fields(transactions = transactions.len()))]
    pub fn run(
        &self,
        transactions: &[TransactionRecord],
        products: &[ProductRecord],
        as_of: DateTime<Utc>,
    ) -> KpiSummary {
        let window_start = as_of.date_naive() - Duration::days(self.window_days);
        let trailing: Vec<&TransactionRecord> = transactions
            .iter()
            .filter(|t| t.transaction_date >= window_start)
            .collect();

        let total_revenue: Decimal = transactions.iter().map(|t| t.total_amount).sum();
        let trailing_revenue: Decimal = trailing.iter().map(|t| t.total_amount).sum();

        let total_customers = transactions
            .iter()
            .map(|t| t.customer_id.as_str())
            .collect::<BTreeSet<_>>()
            .len() as i64;
        let trailing_customers = trailing
            .iter()
            .map(|t| t.customer_id.as_str())
            .collect::<BTreeSet<_>>()
            .len() as i64;
        let trailing_products_sold = trailing
            .iter()
            .map(|t| t.product_id.as_str())
            .collect::<BTreeSet<_>>()
            .len() as i64;

        KpiSummary {
            as_of,
            window_days: self.window_days,
            total_revenue,
            total_transactions: transactions.len() as i64,
            total_customers,
            avg_order_value: guarded_avg(total_revenue, transactions.len() as i64),
            active_products: products.iter().filter(|p| p.is_active).count() as i64,
            trailing_revenue,
            trailing_transactions: trailing.len() as i64,
            trailing_customers,
            trailing_avg_order_value: guarded_avg(trailing_revenue, trailing.len() as i64),
            trailing_products_sold,
        }
    }
}

fn guarded_avg(revenue: Decimal, count: i64) -> Decimal {
    if count > 0 {
        (revenue / Decimal::from(count)).round_dp(2)
    } else {
        Decimal::ZERO
    }
}
