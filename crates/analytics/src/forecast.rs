//! Demand forecasting — booking volume per period, least-squares trend,
//! short-horizon projection, staffing recommendation and trending services.

use chrono::{Datelike, Duration, Months, NaiveDate};
use facility_core::config::AnalyticsConfig;
use facility_core::dates::{week_start, DateRange, MonthKey};
use facility_core::types::{Booking, Provider, Service};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::math::percent;

/// Bucket width for demand series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastPeriod {
    /// Weeks starting on Monday.
    Weekly,
    #[default]
    Monthly,
}

impl ForecastPeriod {
    /// First day of the period containing `date`.
    pub fn start_of(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Weekly => week_start(date),
            Self::Monthly => date.with_day(1).unwrap_or(date),
        }
    }

    pub fn next(&self, start: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Weekly => start.checked_add_signed(Duration::days(7)),
            Self::Monthly => start.checked_add_months(Months::new(1)),
        }
    }

    pub fn label(&self, start: NaiveDate) -> String {
        match self {
            Self::Weekly => start.format("%b %d").to_string(),
            Self::Monthly => MonthKey::from_date(start).label(),
        }
    }
}

impl fmt::Display for ForecastPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weekly => write!(f, "weekly"),
            Self::Monthly => write!(f, "monthly"),
        }
    }
}

impl FromStr for ForecastPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekly" | "week" => Ok(Self::Weekly),
            "monthly" | "month" => Ok(Self::Monthly),
            other => Err(format!("unknown forecast period '{other}' (expected weekly or monthly)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandPoint {
    pub period_start: NaiveDate,
    pub label: String,
    pub bookings: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub period_start: NaiveDate,
    pub label: String,
    pub predicted_bookings: u64,
}

/// `bookings ≈ intercept + slope * period_index`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendLine {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination; 0 when the series has no variance.
    pub r_squared: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaffingRecommendation {
    pub active_technicians: u64,
    pub avg_bookings_per_technician: f64,
    pub predicted_demand: u64,
    pub technicians_needed: u64,
    /// Positive when more technicians are needed than are active.
    pub gap: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingService {
    pub service_id: String,
    pub name: String,
    pub previous: u64,
    pub current: u64,
    pub delta: i64,
    /// `None` when the service had no bookings in the previous period.
    pub growth_rate: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DemandForecast {
    pub period: ForecastPeriod,
    pub history: Vec<DemandPoint>,
    pub trend: TrendLine,
    pub forecast: Vec<ForecastPoint>,
    pub staffing: StaffingRecommendation,
    pub trending_services: Vec<TrendingService>,
}

/// Least-squares fit of `values` against their index. Fewer than two points,
/// or no spread in x, gives a flat line through the mean.
pub fn linear_regression(values: &[f64]) -> TrendLine {
    let n = values.len() as f64;
    if values.len() < 2 {
        return TrendLine {
            slope: 0.0,
            intercept: values.first().copied().unwrap_or(0.0),
            r_squared: 0.0,
        };
    }

    let sum_x: f64 = (0..values.len()).map(|i| i as f64).sum();
    let sum_y: f64 = values.iter().sum();
    let sum_xy: f64 = values.iter().enumerate().map(|(i, y)| i as f64 * y).sum();
    let sum_x2: f64 = (0..values.len()).map(|i| (i * i) as f64).sum();

    let denominator = n * sum_x2 - sum_x * sum_x;
    if denominator.abs() < f64::EPSILON {
        return TrendLine {
            slope: 0.0,
            intercept: sum_y / n,
            r_squared: 0.0,
        };
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / n;

    let mean_y = sum_y / n;
    let ss_tot: f64 = values.iter().map(|y| (y - mean_y).powi(2)).sum();
    let ss_res: f64 = values
        .iter()
        .enumerate()
        .map(|(i, y)| (y - (intercept + slope * i as f64)).powi(2))
        .sum();
    let r_squared = if ss_tot > 0.0 {
        (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
    } else {
        0.0
    };

    TrendLine {
        slope,
        intercept,
        r_squared,
    }
}

fn demand_day(booking: &Booking) -> Option<NaiveDate> {
    booking.scheduled_day().or_else(|| booking.created_day())
}

pub fn demand_forecast(
    bookings: &[Booking],
    services: &[Service],
    providers: &[Provider],
    range: &DateRange,
    period: ForecastPeriod,
    config: &AnalyticsConfig,
) -> DemandForecast {
    let dated: Vec<(NaiveDate, &Booking)> = bookings
        .iter()
        .filter_map(|b| demand_day(b).filter(|d| range.contains(*d)).map(|d| (d, b)))
        .collect();

    let mut counts: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for (day, _) in &dated {
        *counts.entry(period.start_of(*day)).or_default() += 1;
    }

    let history = fill_gaps(&counts, period);
    let values: Vec<f64> = history.iter().map(|p| p.bookings as f64).collect();
    let trend = linear_regression(&values);

    let mut forecast = Vec::new();
    let mut cursor = history.last().and_then(|p| period.next(p.period_start));
    for step in 0..config.forecast_horizon {
        let Some(start) = cursor else { break };
        let x = (history.len() + step) as f64;
        let predicted = (trend.intercept + trend.slope * x).round().max(0.0);
        forecast.push(ForecastPoint {
            period_start: start,
            label: period.label(start),
            predicted_bookings: predicted as u64,
        });
        cursor = period.next(start);
    }

    let active_technicians = providers.iter().filter(|p| p.is_active).count() as u64;
    let mean_per_period = if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    };
    let avg_bookings_per_technician = mean_per_period / active_technicians.max(1) as f64;
    let predicted_demand = forecast.first().map_or(0, |f| f.predicted_bookings);
    let technicians_needed =
        (predicted_demand as f64 / avg_bookings_per_technician.max(1.0)).ceil() as u64;
    let staffing = StaffingRecommendation {
        active_technicians,
        avg_bookings_per_technician,
        predicted_demand,
        technicians_needed,
        gap: technicians_needed as i64 - active_technicians as i64,
    };

    let trending_services = trending_services(
        &dated,
        &history,
        services,
        period,
        config.trending_services,
    );

    debug!(
        %period,
        periods = history.len(),
        slope = trend.slope,
        predicted_demand,
        "Demand forecast computed"
    );

    DemandForecast {
        period,
        history,
        trend,
        forecast,
        staffing,
        trending_services,
    }
}

fn fill_gaps(counts: &BTreeMap<NaiveDate, u64>, period: ForecastPeriod) -> Vec<DemandPoint> {
    let (Some(first), Some(last)) = (counts.keys().next(), counts.keys().next_back()) else {
        return Vec::new();
    };
    let mut history = Vec::new();
    let mut cursor = Some(*first);
    while let Some(start) = cursor.filter(|c| c <= last) {
        history.push(DemandPoint {
            period_start: start,
            label: period.label(start),
            bookings: counts.get(&start).copied().unwrap_or(0),
        });
        cursor = period.next(start);
    }
    history
}

/// Two-point growth between the last two periods, not a fitted trend.
fn trending_services(
    dated: &[(NaiveDate, &Booking)],
    history: &[DemandPoint],
    services: &[Service],
    period: ForecastPeriod,
    limit: usize,
) -> Vec<TrendingService> {
    let [.., previous, current] = history else {
        return Vec::new();
    };

    let mut per_service: HashMap<&str, (u64, u64)> = HashMap::new();
    for (day, booking) in dated {
        let Some(service_id) = booking.service_id.as_deref() else {
            continue;
        };
        let start = period.start_of(*day);
        let entry = per_service.entry(service_id).or_default();
        if start == current.period_start {
            entry.1 += 1;
        } else if start == previous.period_start {
            entry.0 += 1;
        }
    }

    let names: HashMap<&str, &str> = services
        .iter()
        .map(|s| (s.id.as_str(), s.name.as_str()))
        .collect();

    let mut ranked: Vec<TrendingService> = per_service
        .into_iter()
        .map(|(id, (prev, cur))| {
            let delta = cur as i64 - prev as i64;
            TrendingService {
                service_id: id.to_string(),
                name: names.get(id).copied().unwrap_or(id).to_string(),
                previous: prev,
                current: cur,
                delta,
                growth_rate: (prev > 0).then(|| percent(delta as f64, prev as f64)),
            }
        })
        .filter(|s| s.delta > 0)
        .collect();
    ranked.sort_by(|a, b| {
        b.delta
            .cmp(&a.delta)
            .then_with(|| b.current.cmp(&a.current))
            .then_with(|| a.service_id.cmp(&b.service_id))
    });
    ranked.truncate(limit);
    ranked
}
