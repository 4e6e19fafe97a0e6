//! Facility Insights — computes the admin analytics dashboard from a snapshot
//! of bookings, subscriptions, providers, services and reviews.
//!
//! Reads the JSON collections from a data directory and prints the requested
//! report as JSON on stdout. Logs go to stderr.

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::Parser;
use facility_analytics::{AnalyticsDashboard, ForecastPeriod, ReportKind, ReportWindow};
use facility_core::config::AppConfig;
use facility_core::dates::DateRange;
use facility_core::snapshot::DataSnapshot;
use std::io::Write;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "facility-insights")]
#[command(about = "Analytics and forecasting for facilities-management bookings")]
#[command(version)]
struct Cli {
    /// Directory holding bookings.json, subscriptions.json, ... (overrides config)
    #[arg(long, env = "FACILITY_INSIGHTS__INPUT__DATA_DIR")]
    data_dir: Option<String>,

    /// Optional TOML config file
    #[arg(long)]
    config: Option<String>,

    /// First day of the range, YYYY-MM-DD (default: 30 days before --end)
    #[arg(long)]
    start: Option<String>,

    /// Last day of the range, YYYY-MM-DD (default: --today)
    #[arg(long)]
    end: Option<String>,

    /// Reference date for trailing windows, YYYY-MM-DD (default: current UTC date)
    #[arg(long)]
    today: Option<String>,

    /// Forecast bucket: weekly or monthly
    #[arg(long, default_value_t = ForecastPeriod::Monthly)]
    period: ForecastPeriod,

    /// Report to print, or "all" for the whole dashboard
    #[arg(long, default_value = "all")]
    report: String,

    /// Pretty-print the JSON output
    #[arg(long, default_value_t = false)]
    pretty: bool,
}

fn parse_day(value: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid date '{value}', expected YYYY-MM-DD"))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    "facility_insights=info,facility_analytics=info,facility_core=info".into()
                }),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let mut config = match cli.config.as_deref() {
        Some(path) => AppConfig::load(Some(path))
            .with_context(|| format!("loading config file {path}"))?,
        None => AppConfig::load(None).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using defaults");
            AppConfig::default()
        }),
    };

    if let Some(dir) = cli.data_dir {
        config.input.data_dir = dir;
    }

    let today = match cli.today.as_deref() {
        Some(value) => parse_day(value)?,
        None => Utc::now().date_naive(),
    };
    let end = match cli.end.as_deref() {
        Some(value) => parse_day(value)?,
        None => today,
    };
    let range = match cli.start.as_deref() {
        Some(start) => DateRange::parse(start, &end.format("%Y-%m-%d").to_string())?,
        None => DateRange::trailing(end, 30),
    };
    if range.is_empty() {
        warn!(
            start = %range.start,
            end = %range.end,
            "Range start is after its end, series will be empty"
        );
    }

    info!(
        data_dir = %config.input.data_dir,
        start = %range.start,
        end = %range.end,
        %today,
        period = %cli.period,
        report = %cli.report,
        "Configuration loaded"
    );

    let snapshot = DataSnapshot::load_dir(&config.input.data_dir)
        .with_context(|| format!("loading snapshot from {}", config.input.data_dir))?;
    if snapshot.is_empty() {
        warn!(data_dir = %config.input.data_dir, "Snapshot holds no records");
    }

    let dashboard = AnalyticsDashboard::new(config.analytics);
    let window = ReportWindow {
        range,
        today,
        period: cli.period,
    };

    let output = if cli.report.eq_ignore_ascii_case("all") {
        serde_json::to_value(dashboard.build(&snapshot, &window))?
    } else {
        let kind: ReportKind = cli.report.parse()?;
        dashboard.report(kind, &snapshot, &window)?
    };

    let rendered = if cli.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{rendered}")?;

    Ok(())
}
