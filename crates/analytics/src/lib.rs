//! Facility analytics — revenue, churn, cohort retention, customer value,
//! demand forecasting and technician utilization over booking and
//! subscription snapshots.
//!
//! Every aggregator is a pure function of its arguments: no clock reads, no
//! shared state, and empty inputs produce empty summaries.

pub mod acquisition;
pub mod churn;
pub mod clv;
pub mod cohort;
pub mod completion_time;
pub mod dashboard;
pub mod forecast;
pub mod kpi;
pub mod math;
pub mod popular_services;
pub mod ratings;
pub mod revenue;
pub mod subscription_growth;
pub mod utilization;

pub use dashboard::{AnalyticsDashboard, DashboardReport, ReportKind, ReportWindow};
pub use forecast::ForecastPeriod;
pub use kpi::kpi_delta;
