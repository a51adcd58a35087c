//! Transaction aggregation: one pass, one aggregate row per distinct key.
//!
//! Grouping uses ordered maps so report tables come out sorted by key and a
//! rerun over the same snapshot serializes identically.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Datelike;
use rust_decimal::Decimal;
use tracing::instrument;

use crate::calendar;
use crate::errors::{AnalyticsError, RecordIssue};
use crate::models::{GroupAggregate, TransactionRecord};

/// Running totals for one group.
#[derive(Debug, Default, Clone)]
struct GroupStats {
    revenue: Decimal,
    transaction_count: i64,
    units: i64,
    customers: BTreeSet<String>,
}

impl GroupStats {
    fn absorb(&mut self, record: &TransactionRecord) {
        self.revenue += record.total_amount;
        self.transaction_count += 1;
        self.units += record.quantity;
        self.customers.insert(record.customer_id.clone());
    }

    fn finalize(self, key: String) -> GroupAggregate {
        let avg_transaction_value = if self.transaction_count > 0 {
            (self.revenue / Decimal::from(self.transaction_count)).round_dp(2)
        } else {
            Decimal::ZERO
        };
        GroupAggregate {
            key,
            revenue: self.revenue,
            transaction_count: self.transaction_count,
            unique_customers: self.customers.len() as i64,
            units: self.units,
            avg_transaction_value,
        }
    }
}

/// Result of one aggregation pass: ordered rows plus any rows skipped because
/// their key could not be derived (batch mode only).
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub rows: Vec<GroupAggregate>,
    pub skipped: Vec<RecordIssue>,
}

/// Groups transactions by a caller-supplied key and computes per-group sums,
/// counts and guarded averages.
#[derive(Debug, Clone)]
pub struct TransactionAggregator {
    fail_fast: bool,
}

impl TransactionAggregator {
    pub fn new(fail_fast: bool) -> Self {
        Self { fail_fast }
    }

    /// Core group-by. A key error is local to its record: collected in batch
    /// mode, fatal in fail-fast mode.
    pub fn aggregate_by<K, F>(
        &self,
        records: &[TransactionRecord],
        key_fn: F,
    ) -> Result<AggregationByKey<K>, AnalyticsError>
    where
        K: Ord + Clone,
        F: Fn(&TransactionRecord) -> Result<K, AnalyticsError>,
    {
        let mut groups: BTreeMap<K, GroupStats> = BTreeMap::new();
        let mut skipped = Vec::new();

        for record in records {
            match key_fn(record) {
                Ok(key) => groups.entry(key).or_default().absorb(record),
                Err(err) if self.fail_fast => return Err(err),
                Err(err) => skipped.push(RecordIssue::from(&err)),
            }
        }

        Ok(AggregationByKey { groups, skipped })
    }

    /// Revenue by calendar month ("YYYY-MM").
    #[instrument(skip_all)]
    pub fn by_month(&self, records: &[TransactionRecord]) -> Result<Aggregation, AnalyticsError> {
        self.aggregate_by(records, |r| Ok(calendar::month_key(r.transaction_date)))
            .map(|agg| agg.into_rows(|key| key))
    }

    /// Revenue by region.
    #[instrument(skip_all)]
    pub fn by_region(&self, records: &[TransactionRecord]) -> Result<Aggregation, AnalyticsError> {
        self.aggregate_by(records, |r| Ok(r.region.clone()))
            .map(|agg| agg.into_rows(|key| key))
    }

    /// Region-month pairs, for partitioned trend analysis.
    #[instrument(skip_all)]
    pub fn by_region_month(
        &self,
        records: &[TransactionRecord],
    ) -> Result<AggregationByKey<(String, String)>, AnalyticsError> {
        self.aggregate_by(records, |r| {
            Ok((r.region.clone(), calendar::month_key(r.transaction_date)))
        })
    }

    /// Revenue by sales rep.
    #[instrument(skip_all)]
    pub fn by_rep(&self, records: &[TransactionRecord]) -> Result<Aggregation, AnalyticsError> {
        self.aggregate_by(records, |r| Ok(r.sales_rep.clone()))
            .map(|agg| agg.into_rows(|key| key))
    }

    /// Revenue by product id.
    #[instrument(skip_all)]
    pub fn by_product(&self, records: &[TransactionRecord]) -> Result<Aggregation, AnalyticsError> {
        self.aggregate_by(records, |r| Ok(r.product_id.clone()))
            .map(|agg| agg.into_rows(|key| key))
    }

    /// Revenue by customer id.
    #[instrument(skip_all)]
    pub fn by_customer(&self, records: &[TransactionRecord]) -> Result<Aggregation, AnalyticsError> {
        self.aggregate_by(records, |r| Ok(r.customer_id.clone()))
            .map(|agg| agg.into_rows(|key| key))
    }

    /// Revenue by day of week, rows ordered Sunday through Saturday.
    #[instrument(skip_all)]
    pub fn by_weekday(&self, records: &[TransactionRecord]) -> Result<Aggregation, AnalyticsError> {
        let agg = self.aggregate_by(records, |r| Ok(calendar::weekday_code(r.transaction_date)))?;
        agg.try_into_rows(calendar::weekday_name)
    }

    /// Revenue by month of year, rows ordered January through December.
    #[instrument(skip_all)]
    pub fn by_month_of_year(
        &self,
        records: &[TransactionRecord],
    ) -> Result<Aggregation, AnalyticsError> {
        let agg = self.aggregate_by(records, |r| Ok(r.transaction_date.month()))?;
        agg.try_into_rows(calendar::month_name)
    }

    /// Revenue by quarter, rows ordered Q1 through Q4.
    #[instrument(skip_all)]
    pub fn by_quarter(&self, records: &[TransactionRecord]) -> Result<Aggregation, AnalyticsError> {
        let agg = self.aggregate_by(records, |r| Ok(r.transaction_date.month()))?;
        // Quarter shares a month-numbered key space; merge the three months
        // of each quarter before finalizing. "Q1".."Q4" sort correctly.
        let mut merged: BTreeMap<&'static str, GroupStats> = BTreeMap::new();
        for (month, stats) in agg.groups {
            let entry = merged.entry(calendar::quarter_label(month)?).or_default();
            entry.revenue += stats.revenue;
            entry.transaction_count += stats.transaction_count;
            entry.units += stats.units;
            entry.customers.extend(stats.customers);
        }
        let rows = merged
            .into_iter()
            .map(|(quarter, stats)| stats.finalize(quarter.to_string()))
            .collect();
        Ok(Aggregation {
            rows,
            skipped: agg.skipped,
        })
    }
}

/// Intermediate keyed aggregation, before keys are rendered to labels.
#[derive(Debug, Clone)]
pub struct AggregationByKey<K: Ord> {
    groups: BTreeMap<K, GroupStats>,
    pub skipped: Vec<RecordIssue>,
}

impl<K: Ord> AggregationByKey<K> {
    pub fn into_rows(self, label: impl Fn(K) -> String) -> Aggregation {
        let rows = self
            .groups
            .into_iter()
            .map(|(key, stats)| {
                let label = label(key);
                stats.finalize(label)
            })
            .collect();
        Aggregation {
            rows,
            skipped: self.skipped,
        }
    }

    /// Key-partitioned rows, e.g. region -> ordered month rows.
    pub fn into_partitions<P, I>(self, split: impl Fn(K) -> (P, I)) -> BTreeMap<P, Vec<GroupAggregate>>
    where
        P: Ord,
        I: Into<String>,
    {
        let mut partitions: BTreeMap<P, Vec<GroupAggregate>> = BTreeMap::new();
        for (key, stats) in self.groups {
            let (partition, inner) = split(key);
            partitions
                .entry(partition)
                .or_default()
                .push(stats.finalize(inner.into()));
        }
        partitions
    }
}

impl AggregationByKey<u32> {
    fn try_into_rows(
        self,
        label: impl Fn(u32) -> Result<&'static str, AnalyticsError>,
    ) -> Result<Aggregation, AnalyticsError> {
        let mut rows = Vec::with_capacity(self.groups.len());
        for (key, stats) in self.groups {
            rows.push(stats.finalize(label(key)?.to_string()));
        }
        Ok(Aggregation {
            rows,
            skipped: self.skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn tx(
        id: i64,
        customer: &str,
        date: (i32, u32, u32),
        quantity: i64,
        amount: Decimal,
    ) -> TransactionRecord {
        TransactionRecord {
            id,
            customer_id: customer.to_string(),
            product_id: "P001".into(),
            sales_rep: "North Rep".into(),
            region: "North".into(),
            transaction_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            quantity,
            total_amount: amount,
        }
    }

    #[test]
    fn monthly_rollup_sums_and_counts() {
        let records = vec![
            tx(1, "C1", (2024, 1, 5), 1, dec!(100)),
            tx(2, "C2", (2024, 1, 20), 2, dec!(50)),
            tx(3, "C1", (2024, 2, 3), 1, dec!(75)),
        ];
        let agg = TransactionAggregator::new(false).by_month(&records).unwrap();
        assert_eq!(agg.rows.len(), 2);
        let jan = &agg.rows[0];
        assert_eq!(jan.key, "2024-01");
        assert_eq!(jan.revenue, dec!(150));
        assert_eq!(jan.transaction_count, 2);
        assert_eq!(jan.unique_customers, 2);
        assert_eq!(jan.units, 3);
        assert_eq!(jan.avg_transaction_value, dec!(75));
    }

    #[test]
    fn empty_input_yields_no_rows_and_no_division() {
        let agg = TransactionAggregator::new(false).by_month(&[]).unwrap();
        assert!(agg.rows.is_empty());
        assert!(agg.skipped.is_empty());
    }

    #[test]
    fn weekday_rows_come_out_in_calendar_order() {
        // 2024-06-02 is a Sunday
        let records = vec![
            tx(1, "C1", (2024, 6, 8), 1, dec!(10)), // Saturday
            tx(2, "C1", (2024, 6, 2), 1, dec!(20)), // Sunday
            tx(3, "C1", (2024, 6, 4), 1, dec!(30)), // Tuesday
        ];
        let agg = TransactionAggregator::new(false)
            .by_weekday(&records)
            .unwrap();
        let keys: Vec<&str> = agg.rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["Sunday", "Tuesday", "Saturday"]);
    }

    #[test]
    fn quarter_rollup_merges_months() {
        let records = vec![
            tx(1, "C1", (2024, 1, 5), 1, dec!(10)),
            tx(2, "C2", (2024, 3, 5), 1, dec!(20)),
            tx(3, "C3", (2024, 7, 5), 1, dec!(40)),
            tx(4, "C4", (2024, 12, 5), 1, dec!(80)),
        ];
        let agg = TransactionAggregator::new(false)
            .by_quarter(&records)
            .unwrap();
        let keys: Vec<&str> = agg.rows.iter().map(|r| r.key.as_str()).collect();
        // Labels come from the shared calendar mapping, in calendar order
        assert_eq!(keys, vec!["Q1", "Q3", "Q4"]);
        assert_eq!(agg.rows[0].revenue, dec!(30));
        assert_eq!(agg.rows[0].unique_customers, 2);
        assert_eq!(agg.rows[2].revenue, dec!(80));
    }

    #[test]
    fn entity_groupings_split_on_their_field() {
        let mut records = vec![
            tx(1, "C1", (2024, 1, 5), 1, dec!(10)),
            tx(2, "C2", (2024, 1, 6), 1, dec!(20)),
            tx(3, "C1", (2024, 1, 7), 1, dec!(30)),
        ];
        records[1].region = "South".to_string();

        let aggregator = TransactionAggregator::new(false);
        let by_customer = aggregator.by_customer(&records).unwrap();
        assert_eq!(by_customer.rows.len(), 2);
        assert_eq!(by_customer.rows[0].key, "C1");
        assert_eq!(by_customer.rows[0].revenue, dec!(40));

        let by_region = aggregator.by_region(&records).unwrap();
        assert_eq!(by_region.rows.len(), 2);
        assert_eq!(by_region.rows[1].key, "South");
        assert_eq!(by_region.rows[1].revenue, dec!(20));
    }

    #[test]
    fn key_errors_are_collected_not_fatal_in_batch_mode() {
        let records = vec![
            tx(1, "C1", (2024, 1, 5), 1, dec!(10)),
            tx(2, "C2", (2024, 2, 5), 1, dec!(20)),
        ];
        let aggregator = TransactionAggregator::new(false);
        let agg = aggregator
            .aggregate_by(&records, |r| {
                if r.id == 2 {
                    Err(AnalyticsError::InvalidRecord {
                        record: "transaction 2".into(),
                        reason: "bad key".into(),
                    })
                } else {
                    Ok(r.region.clone())
                }
            })
            .unwrap()
            .into_rows(|key| key);
        assert_eq!(agg.rows.len(), 1);
        assert_eq!(agg.skipped.len(), 1);
    }
}
