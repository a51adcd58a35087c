//! Data-quality checks applied to the loaded snapshot before reporting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::warn;

use crate::config::QualityConfig;
use crate::models::TransactionRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum QualityCheck {
    LowDailyVolume,
    AnomalousAmount,
    StaleData,
    EmptySnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QualityIssue {
    pub check: QualityCheck,
    pub detail: String,
}

/// Run all quality checks; returns an empty list for a healthy snapshot.
pub fn validate_snapshot(
    transactions: &[TransactionRecord],
    thresholds: &QualityConfig,
    as_of: DateTime<Utc>,
) -> Vec<QualityIssue> {
    let mut issues = Vec::new();

    if transactions.is_empty() {
        issues.push(QualityIssue {
            check: QualityCheck::EmptySnapshot,
            detail: "snapshot contains no transactions".to_string(),
        });
        return issues;
    }

    let today = as_of.date_naive();
    let todays: Vec<&TransactionRecord> = transactions
        .iter()
        .filter(|t| t.transaction_date == today)
        .collect();

    let daily_count = todays.len() as i64;
    if daily_count < thresholds.min_daily_transactions {
        issues.push(QualityIssue {
            check: QualityCheck::LowDailyVolume,
            detail: format!(
                "low transaction count today: {} (expected: >{})",
                daily_count, thresholds.min_daily_transactions
            ),
        });
    }

    if let Some(max_amount) = todays.iter().map(|t| t.total_amount).max() {
        if max_amount > thresholds.max_transaction_amount {
            issues.push(QualityIssue {
                check: QualityCheck::AnomalousAmount,
                detail: format!("unusually high transaction detected: ${}", max_amount),
            });
        }
    }

    // Freshness is measured from midnight of the newest transaction date, the
    // finest resolution the snapshot carries.
    if let Some(latest) = transactions.iter().map(|t| t.transaction_date).max() {
        let latest_midnight = latest.and_hms_opt(0, 0, 0).expect("midnight is valid");
        let hours_old = (as_of.naive_utc() - latest_midnight).num_hours();
        if hours_old > thresholds.data_freshness_hours {
            issues.push(QualityIssue {
                check: QualityCheck::StaleData,
                detail: format!(
                    "data is stale: {} hours old (threshold: {}h)",
                    hours_old, thresholds.data_freshness_hours
                ),
            });
        }
    }

    for issue in &issues {
        warn!(check = %issue.check, "{}", issue.detail);
    }
    issues
}
