//! Inventory health: trailing sales velocity vs. current stock.
//!
//! avg_daily_sales is the mean per-transaction quantity inside the trailing
//! window, exactly as the upstream reporting logic computes it. It is NOT
//! units sold divided by window days; see DESIGN.md before changing this.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::config::StockConfig;
use crate::models::{ProductRecord, ReorderRecommendation, StockStatus, TransactionRecord};

/// Days-of-inventory reported when there is no recent sales velocity.
pub const NO_VELOCITY_SENTINEL: i64 = 999;

/// One row per active product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryStatusRow {
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub stock_quantity: i64,
    /// Units sold inside the trailing window
    pub units_sold: i64,
    /// Mean per-transaction quantity inside the trailing window, 2 decimals
    pub avg_daily_sales: Decimal,
    /// stock / avg_daily_sales rounded to nearest, 999 when velocity is 0
    pub days_of_inventory: i64,
    pub stock_status: StockStatus,
    pub reorder_recommendation: ReorderRecommendation,
}

#[derive(Debug, Clone)]
pub struct InventorySignal {
    window_days: i64,
    lead_time_days: i64,
    stock: StockConfig,
}

impl InventorySignal {
    pub fn new(window_days: i64, lead_time_days: i64, stock: StockConfig) -> Self {
        Self {
            window_days,
            lead_time_days,
            stock,
        }
    }

    /// Compute signals for every active product, ordered by product id.
    /// Inactive products are excluded entirely.
    #[instrument(skip_all, fields(products = products.len()))]
    pub fn run(
        &self,
        products: &[ProductRecord],
        transactions: &[TransactionRecord],
        as_of: DateTime<Utc>,
    ) -> Vec<InventoryStatusRow> {
        let window_start = as_of.date_naive() - Duration::days(self.window_days);

        // (units, transaction count) per product inside the window
        let mut recent: BTreeMap<&str, (i64, i64)> = BTreeMap::new();
        for tx in transactions {
            if tx.transaction_date >= window_start {
                let entry = recent.entry(&tx.product_id).or_default();
                entry.0 += tx.quantity;
                entry.1 += 1;
            }
        }

        let mut sorted: Vec<&ProductRecord> = products.iter().filter(|p| p.is_active).collect();
        sorted.sort_by(|a, b| a.product_id.cmp(&b.product_id));

        sorted
            .into_iter()
            .map(|product| {
                let (units_sold, tx_count) = recent
                    .get(product.product_id.as_str())
                    .copied()
                    .unwrap_or((0, 0));
                self.row_for(product, units_sold, tx_count)
            })
            .collect()
    }

    fn row_for(&self, product: &ProductRecord, units_sold: i64, tx_count: i64) -> InventoryStatusRow {
        let avg_daily_sales = if tx_count > 0 {
            Decimal::from(units_sold) / Decimal::from(tx_count)
        } else {
            Decimal::ZERO
        };

        let stock = Decimal::from(product.stock_quantity);
        let days_of_inventory = if avg_daily_sales.is_zero() {
            NO_VELOCITY_SENTINEL
        } else {
            (stock / avg_daily_sales)
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .to_i64()
                .unwrap_or(NO_VELOCITY_SENTINEL)
        };

        let reorder_recommendation = if !avg_daily_sales.is_zero()
            && stock / avg_daily_sales < Decimal::from(self.lead_time_days)
        {
            ReorderRecommendation::ReorderRequired
        } else {
            ReorderRecommendation::Ok
        };

        InventoryStatusRow {
            product_id: product.product_id.clone(),
            product_name: product.product_name.clone(),
            category: product.category.clone(),
            stock_quantity: product.stock_quantity,
            units_sold,
            avg_daily_sales: avg_daily_sales.round_dp(2),
            days_of_inventory,
            stock_status: self.stock_status(product.stock_quantity),
            reorder_recommendation,
        }
    }

    /// Band by stock quantity alone, independent of velocity.
    pub fn stock_status(&self, stock_quantity: i64) -> StockStatus {
        if stock_quantity <= self.stock.critical_max {
            StockStatus::Critical
        } else if stock_quantity <= self.stock.low_max {
            StockStatus::Low
        } else if stock_quantity <= self.stock.medium_max {
            StockStatus::Medium
        } else {
            StockStatus::High
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use rust_decimal_macros::dec;
    use test_case::test_case;

    fn signal() -> InventorySignal {
        InventorySignal::new(30, 14, StockConfig::default())
    }

    fn product(id: &str, stock: i64, active: bool) -> ProductRecord {
        ProductRecord {
            product_id: id.to_string(),
            product_name: format!("Product {}", id),
            category: "Widgets".into(),
            brand: "Acme".into(),
            profit_margin: dec!(25),
            stock_quantity: stock,
            is_active: active,
        }
    }

    fn sale(id: i64, product_id: &str, date: NaiveDate, quantity: i64) -> TransactionRecord {
        TransactionRecord {
            id,
            customer_id: "C001".into(),
            product_id: product_id.to_string(),
            sales_rep: "North Rep".into(),
            region: "North".into(),
            transaction_date: date,
            quantity,
            total_amount: dec!(10),
        }
    }

    #[test_case(5, StockStatus::Critical)]
    #[test_case(10, StockStatus::Critical)]
    #[test_case(11, StockStatus::Low)]
    #[test_case(50, StockStatus::Low)]
    #[test_case(51, StockStatus::Medium)]
    #[test_case(100, StockStatus::Medium)]
    #[test_case(101, StockStatus::High)]
    fn stock_bands(stock: i64, expected: StockStatus) {
        assert_eq!(signal().stock_status(stock), expected);
    }

    #[test]
    fn no_recent_sales_hits_the_sentinel() {
        let as_of = Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap();
        let rows = signal().run(&[product("P1", 40, true)], &[], as_of);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].days_of_inventory, NO_VELOCITY_SENTINEL);
        assert_eq!(rows[0].avg_daily_sales, Decimal::ZERO);
        assert_eq!(rows[0].stock_status, StockStatus::Low);
        assert_eq!(rows[0].reorder_recommendation, ReorderRecommendation::Ok);
    }

    #[test]
    fn velocity_counts_only_the_trailing_window() {
        let as_of = Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap();
        let inside = NaiveDate::from_ymd_opt(2024, 6, 20).unwrap();
        let boundary = NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(); // exactly 30 days back
        let outside = NaiveDate::from_ymd_opt(2024, 5, 30).unwrap();
        let rows = signal().run(
            &[product("P1", 60, true)],
            &[
                sale(1, "P1", inside, 4),
                sale(2, "P1", boundary, 2),
                sale(3, "P1", outside, 50),
            ],
            as_of,
        );
        assert_eq!(rows[0].units_sold, 6);
        // mean per-transaction quantity: (4 + 2) / 2
        assert_eq!(rows[0].avg_daily_sales, dec!(3.00));
        assert_eq!(rows[0].days_of_inventory, 20);
        assert_eq!(rows[0].reorder_recommendation, ReorderRecommendation::Ok);
    }

    #[test]
    fn fast_moving_low_stock_triggers_reorder() {
        let as_of = Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 6, 25).unwrap();
        let rows = signal().run(
            &[product("P1", 20, true)],
            &[sale(1, "P1", date, 3)],
            as_of,
        );
        // 20 / 3 is under the 14-day lead time
        assert_eq!(
            rows[0].reorder_recommendation,
            ReorderRecommendation::ReorderRequired
        );
        assert_eq!(rows[0].days_of_inventory, 7);
    }

    #[test]
    fn inactive_products_are_excluded() {
        let as_of = Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap();
        let rows = signal().run(
            &[product("P1", 10, false), product("P2", 10, true)],
            &[],
            as_of,
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].product_id, "P2");
    }
}
