//! Summaries of a user's transactions and the monthly spending chart.

mod aggregation;
mod chart;
mod endpoints;

pub use endpoints::{category_summary_endpoint, spending_chart_endpoint, summary_endpoint};
