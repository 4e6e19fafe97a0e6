//! KPI summary cards — headline metrics for the selected window compared with
//! the preceding window of equal length.

use facility_core::config::AnalyticsConfig;
use facility_core::dates::{parse_day, DateRange};
use facility_core::types::{Booking, Subscription, SubscriptionStatus};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::math::{mean, percent};

/// Shown instead of a percentage when there is nothing to compare against.
pub const NO_TREND: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Neutral,
    NoData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiDelta {
    /// `None` when the previous value is missing or zero.
    pub change_percent: Option<f64>,
    pub trend: Trend,
    pub sentiment: Sentiment,
    pub display: String,
}

/// Percentage change of `current` over `previous`.
///
/// A missing or zero `previous` yields [`Trend::NoData`]; a change smaller than
/// `neutral_threshold` percent in magnitude is [`Trend::Neutral`]. With
/// `inverse`, a decrease is the good direction (churn, completion time).
pub fn kpi_delta(
    current: f64,
    previous: Option<f64>,
    inverse: bool,
    neutral_threshold: f64,
) -> KpiDelta {
    let Some(previous) = previous.filter(|p| p.is_finite() && *p != 0.0) else {
        return KpiDelta {
            change_percent: None,
            trend: Trend::NoData,
            sentiment: Sentiment::Neutral,
            display: NO_TREND.to_string(),
        };
    };

    let change = (current - previous) / previous * 100.0;
    if !change.is_finite() {
        return KpiDelta {
            change_percent: None,
            trend: Trend::NoData,
            sentiment: Sentiment::Neutral,
            display: NO_TREND.to_string(),
        };
    }

    let (trend, sentiment) = if change.abs() < neutral_threshold {
        (Trend::Neutral, Sentiment::Neutral)
    } else if change > 0.0 {
        (Trend::Up, if inverse { Sentiment::Negative } else { Sentiment::Positive })
    } else {
        (Trend::Down, if inverse { Sentiment::Positive } else { Sentiment::Negative })
    };

    KpiDelta {
        change_percent: Some(change),
        trend,
        sentiment,
        display: format!("{:+.1}%", change),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiCard {
    pub key: String,
    pub label: String,
    pub current: f64,
    pub previous: Option<f64>,
    pub inverse: bool,
    pub delta: KpiDelta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiSummary {
    pub range: DateRange,
    pub previous_range: DateRange,
    pub cards: Vec<KpiCard>,
    /// Sum of `monthly_amount` over active subscriptions. Point-in-time, so it
    /// carries no trend.
    pub monthly_recurring_revenue: f64,
}

struct WindowMetrics {
    revenue: f64,
    bookings: f64,
    completed: f64,
    new_subscriptions: f64,
    churn_rate: f64,
    avg_completion_minutes: Option<f64>,
}

fn window_metrics(
    bookings: &[Booking],
    subscriptions: &[Subscription],
    window: &DateRange,
) -> WindowMetrics {
    let in_window: Vec<&Booking> = bookings
        .iter()
        .filter(|b| b.scheduled_day().is_some_and(|d| window.contains(d)))
        .collect();

    let revenue: f64 = in_window.iter().filter(|b| b.is_paid()).map(|b| b.amount()).sum();
    let completed: Vec<&&Booking> = in_window.iter().filter(|b| b.is_completed()).collect();
    let durations: Vec<f64> = completed.iter().filter_map(|b| b.actual_minutes()).collect();

    let mut base = 0u64;
    let mut new_subscriptions = 0u64;
    let mut cancelled = 0u64;
    for sub in subscriptions {
        let cancelled_day = sub.cancelled_at.as_deref().and_then(parse_day);
        if let Some(start) = sub.start_day() {
            if start < window.start && cancelled_day.map_or(true, |c| c >= window.start) {
                base += 1;
            }
            if window.contains(start) {
                new_subscriptions += 1;
            }
        }
        if cancelled_day.is_some_and(|c| window.contains(c)) {
            cancelled += 1;
        }
    }

    WindowMetrics {
        revenue,
        bookings: in_window.len() as f64,
        completed: completed.len() as f64,
        new_subscriptions: new_subscriptions as f64,
        churn_rate: percent(cancelled as f64, (base + new_subscriptions).max(1) as f64).min(100.0),
        avg_completion_minutes: (!durations.is_empty()).then(|| mean(&durations)),
    }
}

pub fn summary_cards(
    bookings: &[Booking],
    subscriptions: &[Subscription],
    range: &DateRange,
    config: &AnalyticsConfig,
) -> KpiSummary {
    let previous_range = range.previous();
    let current = window_metrics(bookings, subscriptions, range);
    let previous = window_metrics(bookings, subscriptions, &previous_range);
    let threshold = config.kpi_neutral_threshold_pct;

    let card = |key: &str, label: &str, current: f64, previous: Option<f64>, inverse: bool| {
        KpiCard {
            key: key.to_string(),
            label: label.to_string(),
            current,
            previous,
            inverse,
            delta: kpi_delta(current, previous, inverse, threshold),
        }
    };

    let mut cards = vec![
        card("revenue", "Revenue", current.revenue, Some(previous.revenue), false),
        card("bookings", "Bookings", current.bookings, Some(previous.bookings), false),
        card(
            "completed_jobs",
            "Completed Jobs",
            current.completed,
            Some(previous.completed),
            false,
        ),
        card(
            "new_subscriptions",
            "New Subscriptions",
            current.new_subscriptions,
            Some(previous.new_subscriptions),
            false,
        ),
        card("churn_rate", "Churn Rate", current.churn_rate, Some(previous.churn_rate), true),
    ];
    if let Some(minutes) = current.avg_completion_minutes {
        cards.push(card(
            "avg_completion_minutes",
            "Avg Completion Time",
            minutes,
            previous.avg_completion_minutes,
            true,
        ));
    }

    let monthly_recurring_revenue: f64 = subscriptions
        .iter()
        .filter(|s| s.status == SubscriptionStatus::Active)
        .map(|s| s.amount())
        .sum();

    debug!(cards = cards.len(), monthly_recurring_revenue, "KPI summary computed");

    KpiSummary {
        range: *range,
        previous_range,
        cards,
        monthly_recurring_revenue,
    }
}
