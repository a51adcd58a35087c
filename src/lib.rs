//! Sales Analytics Library
//!
//! Batch analytical computation over a sales/customer/product snapshot:
//! transaction aggregation, period-over-period trend deltas, RFM customer
//! segmentation, inventory signals, and executive KPIs. The core is pure and
//! stateless: every report table is a function of the input snapshot plus an
//! explicit "as-of" reference timestamp, so a rerun over identical input
//! yields identical output.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod calendar;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod quality;
pub mod services;
pub mod snapshot;
