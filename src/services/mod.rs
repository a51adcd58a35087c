pub mod aggregation;
pub mod inventory;
pub mod kpi;
pub mod reports;
pub mod rfm;
pub mod trends;
