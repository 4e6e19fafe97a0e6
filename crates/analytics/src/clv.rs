//! Customer lifetime value — per-customer revenue from bookings and
//! subscriptions, its distribution, and revenue concentration.

use chrono::NaiveDate;
use facility_core::types::{Booking, Subscription};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::math::percent;

/// Histogram edges: `0-500, 500-1K, 1K-2.5K, 2.5K-5K, 5K-10K, 10K+`.
const BUCKETS: [(&str, f64, Option<f64>); 6] = [
    ("0-500", 0.0, Some(500.0)),
    ("500-1K", 500.0, Some(1_000.0)),
    ("1K-2.5K", 1_000.0, Some(2_500.0)),
    ("2.5K-5K", 2_500.0, Some(5_000.0)),
    ("5K-10K", 5_000.0, Some(10_000.0)),
    ("10K+", 10_000.0, None),
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerValue {
    pub customer_id: String,
    pub paid_bookings: u64,
    pub booking_revenue: f64,
    pub subscription_revenue: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClvBucket {
    pub label: String,
    pub min: f64,
    pub max: Option<f64>,
    pub customers: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClvAnalysis {
    /// Sorted by `total`, highest first.
    pub customers: Vec<CustomerValue>,
    pub distribution: Vec<ClvBucket>,
    pub total_value: f64,
    pub mean: f64,
    /// `customers[n / 2]` of the descending list. For even counts this is the
    /// lower of the two middle values, not the arithmetic median.
    pub median: f64,
    /// Percent of all value held by the top slice of customers.
    pub top_customer_share: f64,
}

/// Months billed for a subscription: `max(1, round(days / 30))`, measured to
/// its end, cancellation, or `today`.
pub fn billed_months(sub: &Subscription, today: NaiveDate) -> Option<i64> {
    let start = sub.start_day()?;
    let end = sub.end_day().unwrap_or(today);
    let days = (end - start).num_days();
    Some(((days as f64 / 30.0).round() as i64).max(1))
}

pub fn customer_lifetime_value(
    bookings: &[Booking],
    subscriptions: &[Subscription],
    today: NaiveDate,
    top_fraction: f64,
) -> ClvAnalysis {
    let mut values: HashMap<&str, CustomerValue> = HashMap::new();

    for booking in bookings {
        let Some(customer) = booking.customer_id.as_deref() else {
            continue;
        };
        let entry = values.entry(customer).or_default();
        if booking.is_paid() {
            entry.paid_bookings += 1;
            entry.booking_revenue += booking.amount();
        }
    }

    for sub in subscriptions {
        let Some(customer) = sub.customer_id.as_deref() else {
            continue;
        };
        let entry = values.entry(customer).or_default();
        if let Some(months) = billed_months(sub, today) {
            entry.subscription_revenue += sub.amount() * months as f64;
        }
    }

    let mut customers: Vec<CustomerValue> = values
        .into_iter()
        .map(|(id, mut value)| {
            value.customer_id = id.to_string();
            value.total = value.booking_revenue + value.subscription_revenue;
            value
        })
        .collect();
    customers.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.customer_id.cmp(&b.customer_id))
    });

    let distribution = BUCKETS
        .iter()
        .map(|(label, min, max)| ClvBucket {
            label: label.to_string(),
            min: *min,
            max: *max,
            // Refund-adjusted totals below zero count in the lowest bucket.
            customers: customers
                .iter()
                .map(|c| c.total.max(0.0))
                .filter(|total| *total >= *min && max.map_or(true, |m| *total < m))
                .count() as u64,
        })
        .collect();

    let n = customers.len();
    let total_value: f64 = customers.iter().map(|c| c.total).sum();
    let mean = if n > 0 { total_value / n as f64 } else { 0.0 };
    let median = customers.get(n / 2).map_or(0.0, |c| c.total);
    let top_n = ((n as f64 * top_fraction).ceil() as usize).clamp(n.min(1), n);
    let top_value: f64 = customers.iter().take(top_n).map(|c| c.total).sum();
    let top_customer_share = percent(top_value, total_value).clamp(0.0, 100.0);

    debug!(customers = n, total_value, "Customer lifetime value computed");

    ClvAnalysis {
        customers,
        distribution,
        total_value,
        mean,
        median,
        top_customer_share,
    }
}
