//! Shared builders for integration tests.
#![allow(dead_code)]

use chrono::NaiveDate;
use rust_decimal::Decimal;

use sales_analytics::models::{ProductRecord, TransactionRecord};

pub struct TxBuilder {
    record: TransactionRecord,
}

impl TxBuilder {
    pub fn new(id: i64) -> Self {
        Self {
            record: TransactionRecord {
                id,
                customer_id: "C001".to_string(),
                product_id: "P001".to_string(),
                sales_rep: "North Rep".to_string(),
                region: "North".to_string(),
                transaction_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
                quantity: 1,
                total_amount: Decimal::new(10000, 2), // 100.00
            },
        }
    }

    pub fn customer(mut self, id: &str) -> Self {
        self.record.customer_id = id.to_string();
        self
    }

    pub fn product(mut self, id: &str) -> Self {
        self.record.product_id = id.to_string();
        self
    }

    pub fn rep(mut self, rep: &str) -> Self {
        self.record.sales_rep = rep.to_string();
        self
    }

    pub fn region(mut self, region: &str) -> Self {
        self.record.region = region.to_string();
        self
    }

    pub fn date(mut self, y: i32, m: u32, d: u32) -> Self {
        self.record.transaction_date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        self
    }

    pub fn quantity(mut self, quantity: i64) -> Self {
        self.record.quantity = quantity;
        self
    }

    pub fn amount(mut self, amount: Decimal) -> Self {
        self.record.total_amount = amount;
        self
    }

    pub fn build(self) -> TransactionRecord {
        self.record
    }
}

pub fn tx(id: i64) -> TxBuilder {
    TxBuilder::new(id)
}

pub fn product(id: &str, stock: i64) -> ProductRecord {
    ProductRecord {
        product_id: id.to_string(),
        product_name: format!("Product {}", id),
        category: "Widgets".to_string(),
        brand: "Acme".to_string(),
        profit_margin: Decimal::new(250, 1), // 25.0%
        stock_quantity: stock,
        is_active: true,
    }
}
