//! Report bundle assembly: one pass over the snapshot producing every named
//! report table.
//!
//! Each table is an independent consumer of the same cleaned input set; the
//! trend pass runs only after its ordered monthly partitions are fully
//! assembled.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::config::AnalyticsConfig;
use crate::errors::{AnalyticsError, RecordIssue};
use crate::models::{GroupAggregate, PeriodMetric, ProductRecord};
use crate::quality::{self, QualityIssue};
use crate::services::aggregation::TransactionAggregator;
use crate::services::inventory::{InventorySignal, InventoryStatusRow};
use crate::services::kpi::{KpiSummarizer, KpiSummary};
use crate::services::rfm::{RfmReport, RfmSegmenter};
use crate::services::trends::TrendCalculator;
use crate::snapshot::SalesSnapshot;

/// Monthly revenue row with both lag-1 and lag-12 growth.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlyTrendRow {
    pub month: String,
    pub revenue: Decimal,
    pub transaction_count: i64,
    pub unique_customers: i64,
    pub avg_transaction_value: Decimal,
    pub mom_growth_rate: Option<Decimal>,
    pub yoy_growth_rate: Option<Decimal>,
}

/// Region-month row with per-region month-over-month growth.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegionalPerformanceRow {
    pub region: String,
    pub month: String,
    pub revenue: Decimal,
    pub transaction_count: i64,
    pub unique_customers: i64,
    pub mom_growth_rate: Option<Decimal>,
}

/// Per-rep lifetime rollup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RepPerformanceRow {
    pub sales_rep: String,
    pub revenue: Decimal,
    pub transaction_count: i64,
    pub unique_customers: i64,
    pub avg_transaction_value: Decimal,
}

/// Per-product rollup with margin-weighted profit estimate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductPerformanceRow {
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub revenue: Decimal,
    pub units_sold: i64,
    pub transaction_count: i64,
    /// revenue * profit_margin / 100, 2 decimals; zero margin when the
    /// product is missing from reference data
    pub estimated_profit: Decimal,
}

/// Calendar-bucket aggregates: weekday, month-of-year, quarter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonalityReport {
    pub by_weekday: Vec<GroupAggregate>,
    pub by_month: Vec<GroupAggregate>,
    pub by_quarter: Vec<GroupAggregate>,
}

/// Everything one report cycle produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportBundle {
    pub generated_at: DateTime<Utc>,
    pub kpis: KpiSummary,
    pub revenue_trends: Vec<MonthlyTrendRow>,
    pub regional_performance: Vec<RegionalPerformanceRow>,
    pub rep_performance: Vec<RepPerformanceRow>,
    pub product_performance: Vec<ProductPerformanceRow>,
    pub seasonality: SeasonalityReport,
    pub customer_rfm: RfmReport,
    pub inventory_status: Vec<InventoryStatusRow>,
    pub quality_issues: Vec<QualityIssue>,
    /// Rows skipped at the snapshot boundary or during grouping
    pub skipped_records: Vec<RecordIssue>,
}

/// Service for generating the full report bundle from a snapshot.
#[derive(Debug, Clone)]
pub struct ReportService {
    config: AnalyticsConfig,
}

impl ReportService {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self { config }
    }

    /// Generate every report table. Pure with respect to the snapshot and
    /// `as_of`: identical inputs yield an identical bundle.
    #[instrument(skip_all, fields(transactions = snapshot.transactions.len()))]
    pub fn generate(
        &self,
        snapshot: &SalesSnapshot,
        as_of: DateTime<Utc>,
    ) -> Result<ReportBundle, AnalyticsError> {
        let cfg = &self.config;
        let aggregator = TransactionAggregator::new(cfg.fail_fast);
        let transactions = &snapshot.transactions;
        let mut skipped_records = snapshot.issues.clone();

        // Monthly trend with MoM and YoY growth
        let monthly = aggregator.by_month(transactions)?;
        skipped_records.extend(monthly.skipped.iter().cloned());
        let metrics: Vec<PeriodMetric> = monthly
            .rows
            .iter()
            .cloned()
            .map(PeriodMetric::from)
            .collect();
        let mom = TrendCalculator::month_over_month().apply(&metrics)?;
        let yoy = TrendCalculator::year_over_year().apply(&metrics)?;
        let revenue_trends: Vec<MonthlyTrendRow> = monthly
            .rows
            .into_iter()
            .zip(mom.into_iter().zip(yoy))
            .map(|(row, (mom, yoy))| MonthlyTrendRow {
                month: row.key,
                revenue: row.revenue,
                transaction_count: row.transaction_count,
                unique_customers: row.unique_customers,
                avg_transaction_value: row.avg_transaction_value,
                mom_growth_rate: mom.growth_rate,
                yoy_growth_rate: yoy.growth_rate,
            })
            .collect();

        // Regional performance: per-region monthly partitions, lag-1 growth
        let regional = aggregator.by_region_month(transactions)?;
        skipped_records.extend(regional.skipped.iter().cloned());
        let partitions: BTreeMap<String, Vec<PeriodMetric>> = regional
            .into_partitions(|(region, month)| (region, month))
            .into_iter()
            .map(|(region, rows)| {
                (
                    region,
                    rows.into_iter().map(PeriodMetric::from).collect(),
                )
            })
            .collect();
        let regional_trends = TrendCalculator::month_over_month().apply_partitioned(&partitions)?;
        let regional_performance = regional_trends
            .into_iter()
            .flat_map(|(region, rows)| {
                rows.into_iter().map(move |m| RegionalPerformanceRow {
                    region: region.clone(),
                    month: m.period_key,
                    revenue: m.revenue,
                    transaction_count: m.transaction_count,
                    unique_customers: m.unique_customers,
                    mom_growth_rate: m.growth_rate,
                })
            })
            .collect();

        // Rep performance
        let reps = aggregator.by_rep(transactions)?;
        skipped_records.extend(reps.skipped.iter().cloned());
        let rep_performance = reps
            .rows
            .into_iter()
            .map(|row| RepPerformanceRow {
                sales_rep: row.key,
                revenue: row.revenue,
                transaction_count: row.transaction_count,
                unique_customers: row.unique_customers,
                avg_transaction_value: row.avg_transaction_value,
            })
            .collect();

        // Product performance, joined against reference data
        let products = aggregator.by_product(transactions)?;
        skipped_records.extend(products.skipped.iter().cloned());
        let product_performance =
            join_product_performance(products.rows, &snapshot.products);

        // Seasonality buckets
        let seasonality = SeasonalityReport {
            by_weekday: {
                let agg = aggregator.by_weekday(transactions)?;
                skipped_records.extend(agg.skipped.iter().cloned());
                agg.rows
            },
            by_month: {
                let agg = aggregator.by_month_of_year(transactions)?;
                skipped_records.extend(agg.skipped.iter().cloned());
                agg.rows
            },
            by_quarter: {
                let agg = aggregator.by_quarter(transactions)?;
                skipped_records.extend(agg.skipped.iter().cloned());
                agg.rows
            },
        };

        // Independent consumers
        let customer_rfm = RfmSegmenter::new(cfg.rfm.clone()).run(transactions, as_of);
        let inventory_status = InventorySignal::new(
            cfg.trailing_window_days,
            cfg.reorder_lead_time_days,
            cfg.stock.clone(),
        )
        .run(&snapshot.products, transactions, as_of);
        let kpis = KpiSummarizer::new(cfg.trailing_window_days).run(
            transactions,
            &snapshot.products,
            as_of,
        );
        let quality_issues = quality::validate_snapshot(transactions, &cfg.quality, as_of);

        info!(
            months = revenue_trends.len(),
            customers = customer_rfm.customers.len(),
            skipped = skipped_records.len(),
            "report bundle generated"
        );

        Ok(ReportBundle {
            generated_at: as_of,
            kpis,
            revenue_trends,
            regional_performance,
            rep_performance,
            product_performance,
            seasonality,
            customer_rfm,
            inventory_status,
            quality_issues,
            skipped_records,
        })
    }
}

fn join_product_performance(
    rows: Vec<GroupAggregate>,
    reference: &[ProductRecord],
) -> Vec<ProductPerformanceRow> {
    let by_id: BTreeMap<&str, &ProductRecord> = reference
        .iter()
        .map(|p| (p.product_id.as_str(), p))
        .collect();

    let mut out: Vec<ProductPerformanceRow> = rows
        .into_iter()
        .map(|row| {
            let product = by_id.get(row.key.as_str());
            let margin = product.map(|p| p.profit_margin).unwrap_or(Decimal::ZERO);
            ProductPerformanceRow {
                product_name: product
                    .map(|p| p.product_name.clone())
                    .unwrap_or_else(|| row.key.clone()),
                category: product
                    .map(|p| p.category.clone())
                    .unwrap_or_else(|| "Unknown".to_string()),
                estimated_profit: (row.revenue * margin / Decimal::ONE_HUNDRED).round_dp(2),
                product_id: row.key,
                revenue: row.revenue,
                units_sold: row.units,
                transaction_count: row.transaction_count,
            }
        })
        .collect();
    // Best sellers first; id as tie-break keeps the order stable
    out.sort_by(|a, b| b.revenue.cmp(&a.revenue).then(a.product_id.cmp(&b.product_id)));
    out
}
