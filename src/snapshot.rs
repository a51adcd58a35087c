//! Snapshot ingestion boundary.
//!
//! The ETL collaborator hands over a JSON document with raw transaction and
//! product rows. Numeric fields arrive as optionals so a null in the source
//! extract surfaces as a per-row `InvalidRecord` instead of failing the whole
//! document; promotion to typed records happens here and nowhere else.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, warn};
use validator::Validate;

use crate::errors::{AnalyticsError, RecordIssue};
use crate::models::{ProductRecord, TransactionRecord};

/// Raw transaction row as serialized by the ETL step.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTransaction {
    pub id: i64,
    pub customer_id: String,
    pub product_id: String,
    pub sales_rep: String,
    pub region: String,
    pub transaction_date: NaiveDate,
    pub quantity: Option<i64>,
    pub total_amount: Option<Decimal>,
}

/// Raw product row as serialized by the ETL step.
#[derive(Debug, Clone, Deserialize)]
pub struct RawProduct {
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub brand: String,
    pub profit_margin: Option<Decimal>,
    pub stock_quantity: Option<i64>,
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct RawSnapshot {
    pub transactions: Vec<RawTransaction>,
    pub products: Vec<RawProduct>,
}

/// Validated, immutable input set for one report cycle.
#[derive(Debug, Clone)]
pub struct SalesSnapshot {
    pub transactions: Vec<TransactionRecord>,
    pub products: Vec<ProductRecord>,
    /// Rows rejected at the boundary (batch mode only)
    pub issues: Vec<RecordIssue>,
}

impl SalesSnapshot {
    /// Build a snapshot directly from typed records, e.g. in tests or when an
    /// embedding pipeline already holds validated rows.
    pub fn new(transactions: Vec<TransactionRecord>, products: Vec<ProductRecord>) -> Self {
        Self {
            transactions,
            products,
            issues: Vec::new(),
        }
    }

    /// Load and validate a JSON snapshot file.
    pub fn from_json_file(
        path: impl AsRef<Path>,
        fail_fast: bool,
    ) -> Result<Self, AnalyticsError> {
        let path = path.as_ref();
        let body = fs::read_to_string(path).map_err(|e| {
            AnalyticsError::Snapshot(format!("cannot read {}: {}", path.display(), e))
        })?;
        let raw: RawSnapshot = serde_json::from_str(&body).map_err(|e| {
            AnalyticsError::Snapshot(format!("cannot parse {}: {}", path.display(), e))
        })?;
        let snapshot = Self::from_raw(raw, fail_fast)?;
        info!(
            transactions = snapshot.transactions.len(),
            products = snapshot.products.len(),
            skipped = snapshot.issues.len(),
            "snapshot loaded"
        );
        Ok(snapshot)
    }

    /// Promote raw rows to typed records, collecting or failing on bad rows.
    pub fn from_raw(raw: RawSnapshot, fail_fast: bool) -> Result<Self, AnalyticsError> {
        let mut transactions = Vec::with_capacity(raw.transactions.len());
        let mut products = Vec::with_capacity(raw.products.len());
        let mut issues = Vec::new();

        for row in raw.transactions {
            match promote_transaction(row) {
                Ok(record) => transactions.push(record),
                Err(err) if fail_fast => return Err(err),
                Err(err) => {
                    warn!("skipping row: {}", err);
                    issues.push(RecordIssue::from(&err));
                }
            }
        }

        for row in raw.products {
            match promote_product(row) {
                Ok(record) => products.push(record),
                Err(err) if fail_fast => return Err(err),
                Err(err) => {
                    warn!("skipping row: {}", err);
                    issues.push(RecordIssue::from(&err));
                }
            }
        }

        Ok(Self {
            transactions,
            products,
            issues,
        })
    }
}

fn promote_transaction(raw: RawTransaction) -> Result<TransactionRecord, AnalyticsError> {
    let label = format!("transaction {}", raw.id);
    let quantity = raw.quantity.ok_or_else(|| AnalyticsError::InvalidRecord {
        record: label.clone(),
        reason: "quantity is missing or null".to_string(),
    })?;
    let total_amount = raw.total_amount.ok_or_else(|| AnalyticsError::InvalidRecord {
        record: label.clone(),
        reason: "total_amount is missing or null".to_string(),
    })?;
    let record = TransactionRecord {
        id: raw.id,
        customer_id: raw.customer_id,
        product_id: raw.product_id,
        sales_rep: raw.sales_rep,
        region: raw.region,
        transaction_date: raw.transaction_date,
        quantity,
        total_amount,
    };
    record
        .validate()
        .map_err(|e| AnalyticsError::InvalidRecord {
            record: label,
            reason: e.to_string(),
        })?;
    Ok(record)
}

fn promote_product(raw: RawProduct) -> Result<ProductRecord, AnalyticsError> {
    let label = format!("product {}", raw.product_id);
    let profit_margin = raw.profit_margin.ok_or_else(|| AnalyticsError::InvalidRecord {
        record: label.clone(),
        reason: "profit_margin is missing or null".to_string(),
    })?;
    let stock_quantity = raw.stock_quantity.ok_or_else(|| AnalyticsError::InvalidRecord {
        record: label.clone(),
        reason: "stock_quantity is missing or null".to_string(),
    })?;
    let record = ProductRecord {
        product_id: raw.product_id,
        product_name: raw.product_name,
        category: raw.category,
        brand: raw.brand,
        profit_margin,
        stock_quantity,
        is_active: raw.is_active,
    };
    record
        .validate()
        .map_err(|e| AnalyticsError::InvalidRecord {
            record: label,
            reason: e.to_string(),
        })?;
    Ok(record)
}
