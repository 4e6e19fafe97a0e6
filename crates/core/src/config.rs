use serde::Deserialize;

use crate::error::InsightsResult;

/// Root application configuration. Loaded from an optional TOML file and
/// environment variables with the prefix `FACILITY_INSIGHTS__`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

/// Tunables for the analytics aggregators. The defaults are the figures the
/// admin dashboards were designed around.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsConfig {
    /// Fixed travel allowance added to every completed job.
    #[serde(default = "default_travel_minutes_per_job")]
    pub travel_minutes_per_job: f64,
    /// Available hours per technician per month (8h x 22 days).
    #[serde(default = "default_monthly_working_hours")]
    pub monthly_working_hours: f64,
    /// Duration assumed for a service without `duration_minutes`.
    #[serde(default = "default_service_minutes")]
    pub default_service_minutes: f64,
    #[serde(default = "default_utilization_window_days")]
    pub utilization_window_days: i64,
    #[serde(default = "default_overloaded_threshold_pct")]
    pub overloaded_threshold_pct: f64,
    #[serde(default = "default_underutilized_threshold_pct")]
    pub underutilized_threshold_pct: f64,
    #[serde(default = "default_forecast_horizon")]
    pub forecast_horizon: usize,
    #[serde(default = "default_cohort_count")]
    pub cohort_count: usize,
    #[serde(default = "default_cohort_offsets")]
    pub cohort_offsets: u32,
    #[serde(default = "default_top_cancel_reasons")]
    pub top_cancel_reasons: usize,
    #[serde(default = "default_trending_services")]
    pub trending_services: usize,
    #[serde(default = "default_popular_services_limit")]
    pub popular_services_limit: usize,
    /// Changes smaller than this (in percent) render as neutral.
    #[serde(default = "default_kpi_neutral_threshold_pct")]
    pub kpi_neutral_threshold_pct: f64,
    #[serde(default = "default_top_customer_fraction")]
    pub top_customer_fraction: f64,
    /// Used only by the crude CAC estimate.
    #[serde(default = "default_assumed_monthly_marketing_spend")]
    pub assumed_monthly_marketing_spend: f64,
}

// Default functions
fn default_data_dir() -> String {
    "./data".to_string()
}
fn default_travel_minutes_per_job() -> f64 {
    35.0
}
fn default_monthly_working_hours() -> f64 {
    176.0
}
fn default_service_minutes() -> f64 {
    60.0
}
fn default_utilization_window_days() -> i64 {
    30
}
fn default_overloaded_threshold_pct() -> f64 {
    85.0
}
fn default_underutilized_threshold_pct() -> f64 {
    40.0
}
fn default_forecast_horizon() -> usize {
    3
}
fn default_cohort_count() -> usize {
    6
}
fn default_cohort_offsets() -> u32 {
    6
}
fn default_top_cancel_reasons() -> usize {
    5
}
fn default_trending_services() -> usize {
    5
}
fn default_popular_services_limit() -> usize {
    10
}
fn default_kpi_neutral_threshold_pct() -> f64 {
    1.0
}
fn default_top_customer_fraction() -> f64 {
    0.10
}
fn default_assumed_monthly_marketing_spend() -> f64 {
    5000.0
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            travel_minutes_per_job: default_travel_minutes_per_job(),
            monthly_working_hours: default_monthly_working_hours(),
            default_service_minutes: default_service_minutes(),
            utilization_window_days: default_utilization_window_days(),
            overloaded_threshold_pct: default_overloaded_threshold_pct(),
            underutilized_threshold_pct: default_underutilized_threshold_pct(),
            forecast_horizon: default_forecast_horizon(),
            cohort_count: default_cohort_count(),
            cohort_offsets: default_cohort_offsets(),
            top_cancel_reasons: default_top_cancel_reasons(),
            trending_services: default_trending_services(),
            popular_services_limit: default_popular_services_limit(),
            kpi_neutral_threshold_pct: default_kpi_neutral_threshold_pct(),
            top_customer_fraction: default_top_customer_fraction(),
            assumed_monthly_marketing_spend: default_assumed_monthly_marketing_spend(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and an optional config file.
    /// A named file must exist and parse.
    pub fn load(file: Option<&str>) -> InsightsResult<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = file {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        let builder = builder.add_source(
            config::Environment::with_prefix("FACILITY_INSIGHTS")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }
}
