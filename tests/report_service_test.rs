//! End-to-end report bundle scenarios.

mod common;

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use common::{product, tx};
use sales_analytics::config::AnalyticsConfig;
use sales_analytics::models::Segment;
use sales_analytics::services::reports::ReportService;
use sales_analytics::snapshot::SalesSnapshot;

fn service() -> ReportService {
    ReportService::new(AnalyticsConfig::default())
}

#[test]
fn thirteen_months_of_steady_growth_yields_120_percent_yoy() {
    // Revenue 100, 110, ... 220 over 13 consecutive months
    let mut records = Vec::new();
    for i in 0..13i64 {
        let year = 2023 + (i / 12) as i32;
        let month = (i % 12) as u32 + 1;
        records.push(
            tx(i)
                .customer(&format!("C{:03}", i))
                .date(year, month, 10)
                .amount(Decimal::from(100 + 10 * i))
                .build(),
        );
    }
    let snapshot = SalesSnapshot::new(records, vec![]);
    let as_of = Utc.with_ymd_and_hms(2024, 1, 20, 0, 0, 0).unwrap();

    let bundle = service().generate(&snapshot, as_of).unwrap();
    let trends = &bundle.revenue_trends;
    assert_eq!(trends.len(), 13);

    let month13 = trends.last().unwrap();
    assert_eq!(month13.month, "2024-01");
    assert_eq!(month13.revenue, dec!(220));
    assert_eq!(month13.yoy_growth_rate, Some(dec!(120.00)));
    // (220 - 210) / 210 * 100
    assert_eq!(month13.mom_growth_rate, Some(dec!(4.76)));
    // First month has no predecessor in either lag
    assert_eq!(trends[0].mom_growth_rate, None);
    assert_eq!(trends[0].yoy_growth_rate, None);
}

#[test]
fn loyal_customer_scenario() {
    // 12 transactions, $1500 total, last purchase 45 days before as-of
    let as_of = Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap();
    let records: Vec<_> = (0..12)
        .map(|i| {
            tx(i)
                .customer("LOYAL")
                .date(2024, 5, 16 - (i as u32 % 10)) // newest is 2024-05-16, 45 days back
                .amount(dec!(125))
                .build()
        })
        .collect();
    let snapshot = SalesSnapshot::new(records, vec![]);

    let bundle = service().generate(&snapshot, as_of).unwrap();
    let row = &bundle.customer_rfm.customers[0];
    assert_eq!(row.aggregate.customer_id, "LOYAL");
    assert_eq!(row.aggregate.recency_days, 45);
    assert_eq!(row.aggregate.total_spent, dec!(1500));
    assert_eq!(row.recency_score, 4);
    assert_eq!(row.frequency_score, 3);
    assert_eq!(row.monetary_score, 3);
    // Rule 2 fires before rule 3 would classify recency 4 as "New Customers"
    assert_eq!(row.segment, Segment::LoyalCustomers);
}

#[test]
fn champion_scores_five_five_five() {
    let as_of = Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap();
    let records: Vec<_> = (0..20)
        .map(|i| {
            tx(i)
                .customer("BIG")
                .date(2024, 6, 10 + (i as u32 % 15))
                .amount(dec!(300))
                .build()
        })
        .collect();
    let snapshot = SalesSnapshot::new(records, vec![]);

    let bundle = service().generate(&snapshot, as_of).unwrap();
    let row = &bundle.customer_rfm.customers[0];
    assert_eq!(
        (row.recency_score, row.frequency_score, row.monetary_score),
        (5, 5, 5)
    );
    assert_eq!(row.segment, Segment::Champions);

    let summary = &bundle.customer_rfm.segments;
    assert_eq!(summary.len(), 1);
    assert_eq!(summary[0].segment, Segment::Champions);
    assert_eq!(summary[0].customer_count, 1);
    assert_eq!(summary[0].percentage, dec!(100.00));
}

#[test]
fn inventory_scenario_sixty_stock_three_per_sale() {
    let as_of = Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap();
    let records: Vec<_> = (0..4)
        .map(|i| {
            tx(i)
                .product("P9")
                .date(2024, 6, 20 + i as u32)
                .quantity(3)
                .build()
        })
        .collect();
    let snapshot = SalesSnapshot::new(records, vec![product("P9", 60)]);

    let bundle = service().generate(&snapshot, as_of).unwrap();
    let row = &bundle.inventory_status[0];
    assert_eq!(row.avg_daily_sales, dec!(3.00));
    assert_eq!(row.days_of_inventory, 20);
    assert_eq!(row.stock_status.to_string(), "Medium");
    // 20 days of cover is at or above the 14-day lead time
    assert_eq!(row.reorder_recommendation.to_string(), "OK");
}

#[test]
fn identical_input_and_as_of_yield_byte_identical_bundles() {
    let as_of = Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap();
    let records: Vec<_> = (0..50)
        .map(|i| {
            tx(i)
                .customer(&format!("C{:02}", i % 7))
                .product(&format!("P{:02}", i % 5))
                .region(if i % 2 == 0 { "North" } else { "South" })
                .rep(&format!("Rep {}", i % 3))
                .date(2024, 1 + (i as u32 % 6), 1 + (i as u32 % 28))
                .quantity(1 + i % 4)
                .amount(Decimal::from(10 + i * 3))
                .build()
        })
        .collect();
    let products: Vec<_> = (0..5).map(|i| product(&format!("P{:02}", i), 40)).collect();
    let snapshot = SalesSnapshot::new(records, products);

    let service = service();
    let first = service.generate(&snapshot, as_of).unwrap();
    let second = service.generate(&snapshot, as_of).unwrap();
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn regional_growth_is_computed_within_each_region() {
    let as_of = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();
    let records = vec![
        tx(1).region("North").date(2024, 1, 5).amount(dec!(100)).build(),
        tx(2).region("North").date(2024, 2, 5).amount(dec!(150)).build(),
        tx(3).region("South").date(2024, 2, 5).amount(dec!(80)).build(),
    ];
    let snapshot = SalesSnapshot::new(records, vec![]);

    let bundle = service().generate(&snapshot, as_of).unwrap();
    let north_feb = bundle
        .regional_performance
        .iter()
        .find(|r| r.region == "North" && r.month == "2024-02")
        .unwrap();
    assert_eq!(north_feb.mom_growth_rate, Some(dec!(50.00)));

    // South's only month must not inherit North's January as a predecessor
    let south_feb = bundle
        .regional_performance
        .iter()
        .find(|r| r.region == "South" && r.month == "2024-02")
        .unwrap();
    assert_eq!(south_feb.mom_growth_rate, None);
}

#[test]
fn product_report_joins_reference_data_and_estimates_profit() {
    let as_of = Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap();
    let records = vec![
        tx(1).product("P1").quantity(2).amount(dec!(400)).build(),
        tx(2).product("P1").quantity(1).amount(dec!(600)).build(),
        tx(3).product("GHOST").quantity(1).amount(dec!(50)).build(),
    ];
    let snapshot = SalesSnapshot::new(records, vec![product("P1", 10)]);

    let bundle = service().generate(&snapshot, as_of).unwrap();
    let p1 = &bundle.product_performance[0];
    assert_eq!(p1.product_id, "P1");
    assert_eq!(p1.revenue, dec!(1000));
    assert_eq!(p1.units_sold, 3);
    // 25% margin on 1000
    assert_eq!(p1.estimated_profit, dec!(250.00));

    // Unknown product keeps its revenue with a zero profit estimate
    let ghost = &bundle.product_performance[1];
    assert_eq!(ghost.product_id, "GHOST");
    assert_eq!(ghost.estimated_profit, dec!(0.00));
}
