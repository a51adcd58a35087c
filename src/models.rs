//! Input records and derived analytical rows.
//!
//! Input records are immutable once loaded; every derived type is recomputed
//! from scratch each report cycle and never carries state between runs.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::Display;
use validator::{Validate, ValidationError};

/// One cleaned sales transaction, as handed over by the ETL collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct TransactionRecord {
    pub id: i64,
    pub customer_id: String,
    pub product_id: String,
    pub sales_rep: String,
    pub region: String,
    pub transaction_date: NaiveDate,
    #[validate(range(min = 0))]
    pub quantity: i64,
    #[validate(custom = "validate_non_negative_amount")]
    pub total_amount: Decimal,
}

/// Product reference data joined against transactions.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct ProductRecord {
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub brand: String,
    /// Percent, 0-100
    #[validate(custom = "validate_percent")]
    pub profit_margin: Decimal,
    #[validate(range(min = 0))]
    pub stock_quantity: i64,
    pub is_active: bool,
}

pub fn validate_non_negative_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if amount.is_sign_negative() {
        return Err(ValidationError::new("negative_amount"));
    }
    Ok(())
}

pub fn validate_percent(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() || *value > Decimal::ONE_HUNDRED {
        return Err(ValidationError::new("percent_out_of_range"));
    }
    Ok(())
}

/// Per-customer purchase rollup, rebuilt fresh each run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerAggregate {
    pub customer_id: String,
    pub last_purchase_date: NaiveDate,
    pub total_transactions: i64,
    pub total_spent: Decimal,
    pub avg_transaction_value: Decimal,
    /// Continuous whole-day difference between the as-of date and the last
    /// purchase date.
    pub recency_days: i64,
}

/// Named RFM segment, in rule-cascade order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
pub enum Segment {
    #[serde(rename = "Champions")]
    #[strum(serialize = "Champions")]
    Champions,
    #[serde(rename = "Loyal Customers")]
    #[strum(serialize = "Loyal Customers")]
    LoyalCustomers,
    #[serde(rename = "New Customers")]
    #[strum(serialize = "New Customers")]
    NewCustomers,
    #[serde(rename = "At Risk")]
    #[strum(serialize = "At Risk")]
    AtRisk,
    #[serde(rename = "Lost Customers")]
    #[strum(serialize = "Lost Customers")]
    LostCustomers,
    #[serde(rename = "Potential Loyalists")]
    #[strum(serialize = "Potential Loyalists")]
    PotentialLoyalists,
}

/// Recency/frequency/monetary scores (each 1-5) plus the assigned segment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RfmScore {
    pub customer_id: String,
    pub recency_score: u8,
    pub frequency_score: u8,
    pub monetary_score: u8,
    pub segment: Segment,
}

/// One aggregate row per distinct grouping key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupAggregate {
    pub key: String,
    pub revenue: Decimal,
    pub transaction_count: i64,
    pub unique_customers: i64,
    pub units: i64,
    /// revenue / transaction_count, 0 when the group is empty
    pub avg_transaction_value: Decimal,
}

/// One period's metrics within an ordered (optionally partitioned) sequence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeriodMetric {
    pub period_key: String,
    pub revenue: Decimal,
    pub transaction_count: i64,
    pub unique_customers: i64,
    /// `None` until a trend pass runs, or when no prior period exists in the
    /// partition; `Some(0)` when the prior period exists with zero revenue.
    pub growth_rate: Option<Decimal>,
}

impl From<GroupAggregate> for PeriodMetric {
    fn from(agg: GroupAggregate) -> Self {
        Self {
            period_key: agg.key,
            revenue: agg.revenue,
            transaction_count: agg.transaction_count,
            unique_customers: agg.unique_customers,
            growth_rate: None,
        }
    }
}

/// Stock level band derived from `stock_quantity` alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum StockStatus {
    Critical,
    Low,
    Medium,
    High,
}

/// Restocking flag derived from stock vs. recent sales velocity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum ReorderRecommendation {
    #[serde(rename = "Reorder Required")]
    #[strum(serialize = "Reorder Required")]
    ReorderRequired,
    #[serde(rename = "OK")]
    #[strum(serialize = "OK")]
    Ok,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn negative_amount_fails_validation() {
        let record = TransactionRecord {
            id: 1,
            customer_id: "C001".into(),
            product_id: "P001".into(),
            sales_rep: "North Rep".into(),
            region: "North".into(),
            transaction_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            quantity: 2,
            total_amount: dec!(-10.00),
        };
        assert!(record.validate().is_err());
    }

    #[test]
    fn segment_display_uses_business_names() {
        assert_eq!(Segment::LoyalCustomers.to_string(), "Loyal Customers");
        assert_eq!(
            ReorderRecommendation::ReorderRequired.to_string(),
            "Reorder Required"
        );
    }
}
