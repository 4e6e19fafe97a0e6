//! Admin analytics dashboard — runs every aggregator over one snapshot.

use chrono::NaiveDate;
use facility_core::config::AnalyticsConfig;
use facility_core::dates::DateRange;
use facility_core::error::{InsightsError, InsightsResult};
use facility_core::snapshot::DataSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;
use tracing::info;

use crate::acquisition::{customer_acquisition, CustomerAcquisition};
use crate::churn::{churn_analysis, ChurnAnalysis};
use crate::clv::{customer_lifetime_value, ClvAnalysis};
use crate::cohort::{cohort_retention, CohortRetention};
use crate::completion_time::{completion_time_stats, CompletionTimeReport};
use crate::forecast::{demand_forecast, DemandForecast, ForecastPeriod};
use crate::kpi::{summary_cards, KpiSummary};
use crate::popular_services::{popular_services, ServicePopularity};
use crate::ratings::{provider_ratings, ProviderRating};
use crate::revenue::{revenue_over_time, RevenueSeries};
use crate::subscription_growth::{subscription_growth, GrowthPoint};
use crate::utilization::{technician_utilization, UtilizationReport};

/// One chart or card group on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Kpis,
    Revenue,
    Churn,
    Cohorts,
    Clv,
    Forecast,
    Utilization,
    PopularServices,
    SubscriptionGrowth,
    Acquisition,
    CompletionTime,
    Ratings,
}

impl ReportKind {
    pub const ALL: [ReportKind; 12] = [
        Self::Kpis,
        Self::Revenue,
        Self::Churn,
        Self::Cohorts,
        Self::Clv,
        Self::Forecast,
        Self::Utilization,
        Self::PopularServices,
        Self::SubscriptionGrowth,
        Self::Acquisition,
        Self::CompletionTime,
        Self::Ratings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kpis => "kpis",
            Self::Revenue => "revenue",
            Self::Churn => "churn",
            Self::Cohorts => "cohorts",
            Self::Clv => "clv",
            Self::Forecast => "forecast",
            Self::Utilization => "utilization",
            Self::PopularServices => "popular_services",
            Self::SubscriptionGrowth => "subscription_growth",
            Self::Acquisition => "acquisition",
            Self::CompletionTime => "completion_time",
            Self::Ratings => "ratings",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| InsightsError::UnknownReport(s.to_string()))
    }
}

/// Every dashboard section for one snapshot and range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    pub range: DateRange,
    pub today: NaiveDate,
    pub kpis: KpiSummary,
    pub revenue: RevenueSeries,
    pub churn: ChurnAnalysis,
    pub cohorts: CohortRetention,
    pub clv: ClvAnalysis,
    pub forecast: DemandForecast,
    pub utilization: UtilizationReport,
    pub popular_services: Vec<ServicePopularity>,
    pub subscription_growth: Vec<GrowthPoint>,
    pub acquisition: CustomerAcquisition,
    pub completion_time: CompletionTimeReport,
    pub ratings: Vec<ProviderRating>,
}

/// Inputs shared by every report.
#[derive(Debug, Clone, Copy)]
pub struct ReportWindow {
    pub range: DateRange,
    /// Reference date for trailing windows and open-ended subscriptions.
    pub today: NaiveDate,
    pub period: ForecastPeriod,
}

pub struct AnalyticsDashboard {
    config: AnalyticsConfig,
}

impl AnalyticsDashboard {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self { config }
    }

    pub fn build(&self, snapshot: &DataSnapshot, window: &ReportWindow) -> DashboardReport {
        let started = Instant::now();
        let cfg = &self.config;
        let range = &window.range;

        let report = DashboardReport {
            range: window.range,
            today: window.today,
            kpis: summary_cards(&snapshot.bookings, &snapshot.subscriptions, range, cfg),
            revenue: revenue_over_time(&snapshot.bookings, &snapshot.subscriptions, range),
            churn: churn_analysis(&snapshot.subscriptions, range, cfg.top_cancel_reasons),
            cohorts: cohort_retention(
                &snapshot.bookings,
                window.today,
                cfg.cohort_count,
                cfg.cohort_offsets,
            ),
            clv: customer_lifetime_value(
                &snapshot.bookings,
                &snapshot.subscriptions,
                window.today,
                cfg.top_customer_fraction,
            ),
            forecast: demand_forecast(
                &snapshot.bookings,
                &snapshot.services,
                &snapshot.providers,
                range,
                window.period,
                cfg,
            ),
            utilization: technician_utilization(
                &snapshot.providers,
                &snapshot.bookings,
                &snapshot.services,
                window.today,
                cfg,
            ),
            popular_services: popular_services(
                &snapshot.bookings,
                &snapshot.services,
                range,
                cfg.popular_services_limit,
            ),
            subscription_growth: subscription_growth(&snapshot.subscriptions, range),
            acquisition: customer_acquisition(
                &snapshot.bookings,
                range,
                cfg.assumed_monthly_marketing_spend,
            ),
            completion_time: completion_time_stats(&snapshot.bookings, &snapshot.services, range),
            ratings: provider_ratings(&snapshot.providers, &snapshot.reviews),
        };

        let elapsed = started.elapsed();
        metrics::counter!("analytics.reports_built", "report" => "dashboard").increment(1);
        metrics::histogram!("analytics.build_seconds").record(elapsed.as_secs_f64());
        info!(
            start = %window.range.start,
            end = %window.range.end,
            bookings = snapshot.bookings.len(),
            subscriptions = snapshot.subscriptions.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Dashboard built"
        );

        report
    }

    /// A single section, serialized for output.
    pub fn report(
        &self,
        kind: ReportKind,
        snapshot: &DataSnapshot,
        window: &ReportWindow,
    ) -> InsightsResult<serde_json::Value> {
        let cfg = &self.config;
        let range = &window.range;
        let value = match kind {
            ReportKind::Kpis => serde_json::to_value(summary_cards(
                &snapshot.bookings,
                &snapshot.subscriptions,
                range,
                cfg,
            ))?,
            ReportKind::Revenue => serde_json::to_value(revenue_over_time(
                &snapshot.bookings,
                &snapshot.subscriptions,
                range,
            ))?,
            ReportKind::Churn => serde_json::to_value(churn_analysis(
                &snapshot.subscriptions,
                range,
                cfg.top_cancel_reasons,
            ))?,
            ReportKind::Cohorts => serde_json::to_value(cohort_retention(
                &snapshot.bookings,
                window.today,
                cfg.cohort_count,
                cfg.cohort_offsets,
            ))?,
            ReportKind::Clv => serde_json::to_value(customer_lifetime_value(
                &snapshot.bookings,
                &snapshot.subscriptions,
                window.today,
                cfg.top_customer_fraction,
            ))?,
            ReportKind::Forecast => serde_json::to_value(demand_forecast(
                &snapshot.bookings,
                &snapshot.services,
                &snapshot.providers,
                range,
                window.period,
                cfg,
            ))?,
            ReportKind::Utilization => serde_json::to_value(technician_utilization(
                &snapshot.providers,
                &snapshot.bookings,
                &snapshot.services,
                window.today,
                cfg,
            ))?,
            ReportKind::PopularServices => serde_json::to_value(popular_services(
                &snapshot.bookings,
                &snapshot.services,
                range,
                cfg.popular_services_limit,
            ))?,
            ReportKind::SubscriptionGrowth => {
                serde_json::to_value(subscription_growth(&snapshot.subscriptions, range))?
            }
            ReportKind::Acquisition => serde_json::to_value(customer_acquisition(
                &snapshot.bookings,
                range,
                cfg.assumed_monthly_marketing_spend,
            ))?,
            ReportKind::CompletionTime => serde_json::to_value(completion_time_stats(
                &snapshot.bookings,
                &snapshot.services,
                range,
            ))?,
            ReportKind::Ratings => {
                serde_json::to_value(provider_ratings(&snapshot.providers, &snapshot.reviews))?
            }
        };

        metrics::counter!("analytics.reports_built", "report" => kind.as_str()).increment(1);
        Ok(value)
    }
}

impl Default for AnalyticsDashboard {
    fn default() -> Self {
        Self::new(AnalyticsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_kind_round_trips_names() {
        for kind in ReportKind::ALL {
            assert_eq!(kind.as_str().parse::<ReportKind>().unwrap(), kind);
        }
        assert_eq!("popular-services".parse::<ReportKind>().unwrap(), ReportKind::PopularServices);
        assert!(matches!(
            "weather".parse::<ReportKind>(),
            Err(InsightsError::UnknownReport(_))
        ));
    }

    #[test]
    fn empty_snapshot_builds_empty_dashboard() {
        let dashboard = AnalyticsDashboard::default();
        let window = ReportWindow {
            range: DateRange::parse("2025-01-01", "2025-03-31").unwrap(),
            today: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
            period: ForecastPeriod::Monthly,
        };

        let report = dashboard.build(&DataSnapshot::default(), &window);
        assert!(report.revenue.points.is_empty());
        assert_eq!(report.churn.monthly.len(), 3);
        assert!(report.cohorts.cohorts.is_empty());
        assert!(report.clv.customers.is_empty());
        assert!(report.forecast.forecast.is_empty());
        assert!(report.utilization.summary.is_none());
        assert!(report.popular_services.is_empty());
        assert!(report.ratings.is_empty());
    }

    #[test]
    fn single_report_serializes() {
        let dashboard = AnalyticsDashboard::default();
        let window = ReportWindow {
            range: DateRange::parse("2025-01-01", "2025-01-31").unwrap(),
            today: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
            period: ForecastPeriod::Weekly,
        };
        let value = dashboard
            .report(ReportKind::Utilization, &DataSnapshot::default(), &window)
            .unwrap();
        assert_eq!(value["chart_data"], serde_json::json!([]));
        assert!(value["summary"].is_null());
    }
}
