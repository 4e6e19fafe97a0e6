//! Revenue over time — on-demand bookings and subscription revenue per month.

use facility_core::dates::{DateRange, MonthKey};
use facility_core::types::{Booking, Subscription};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenuePoint {
    pub month_key: MonthKey,
    /// Chart label, e.g. `Jan 25`.
    pub month: String,
    pub on_demand_revenue: f64,
    pub subscription_revenue: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RevenueSeries {
    /// Chronological, one point per month with any revenue.
    pub points: Vec<RevenuePoint>,
    pub on_demand_total: f64,
    pub subscription_total: f64,
    pub total: f64,
}

#[derive(Default)]
struct MonthBucket {
    on_demand: f64,
    subscription: f64,
}

/// Bucket paid bookings by scheduled month and spread each subscription's
/// `monthly_amount` over the months it was running inside `range`.
pub fn revenue_over_time(
    bookings: &[Booking],
    subscriptions: &[Subscription],
    range: &DateRange,
) -> RevenueSeries {
    let mut buckets: BTreeMap<MonthKey, MonthBucket> = BTreeMap::new();
    if range.is_empty() {
        return RevenueSeries::default();
    }

    for booking in bookings.iter().filter(|b| b.is_paid()) {
        let Some(day) = booking.scheduled_day() else {
            continue;
        };
        if !range.contains(day) {
            continue;
        }
        buckets
            .entry(MonthKey::from_date(day))
            .or_default()
            .on_demand += booking.amount();
    }

    let range_start = range.start_month();
    let range_end = range.end_month();
    for sub in subscriptions {
        let Some(start) = sub.start_month() else {
            continue;
        };
        let amount = sub.amount();
        if amount == 0.0 {
            continue;
        }
        let first = start.max(range_start);
        let last = sub.end_month().map_or(range_end, |end| end.min(range_end));
        // Stepping stops at `last`, which never exceeds the range end.
        for month in first.iter_to(last) {
            buckets.entry(month).or_default().subscription += amount;
        }
    }

    let points: Vec<RevenuePoint> = buckets
        .into_iter()
        .map(|(month_key, bucket)| RevenuePoint {
            month_key,
            month: month_key.label(),
            on_demand_revenue: bucket.on_demand,
            subscription_revenue: bucket.subscription,
            total: bucket.on_demand + bucket.subscription,
        })
        .collect();

    let on_demand_total: f64 = points.iter().map(|p| p.on_demand_revenue).sum();
    let subscription_total: f64 = points.iter().map(|p| p.subscription_revenue).sum();

    debug!(months = points.len(), on_demand_total, subscription_total, "Revenue series computed");

    RevenueSeries {
        points,
        on_demand_total,
        subscription_total,
        total: on_demand_total + subscription_total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facility_core::types::{PaymentStatus, SubscriptionStatus};

    fn paid(date: &str, amount: f64) -> Booking {
        Booking {
            scheduled_date: Some(date.into()),
            payment_status: PaymentStatus::Paid,
            total_amount: Some(amount),
            ..Default::default()
        }
    }

    fn sub(start: &str, end: Option<&str>, amount: f64) -> Subscription {
        Subscription {
            start_date: Some(start.into()),
            end_date: end.map(Into::into),
            monthly_amount: Some(amount),
            status: SubscriptionStatus::Active,
            ..Default::default()
        }
    }

    #[test]
    fn paid_bookings_bucket_by_month() {
        let bookings = vec![paid("2025-01-10", 100.0), paid("2025-02-10", 200.0)];
        let range = DateRange::parse("2025-01-01", "2025-02-28").unwrap();

        let series = revenue_over_time(&bookings, &[], &range);
        assert_eq!(series.points.len(), 2);
        assert_eq!(series.points[0].month, "Jan 25");
        assert!((series.points[0].on_demand_revenue - 100.0).abs() < f64::EPSILON);
        assert_eq!(series.points[1].month, "Feb 25");
        assert!((series.points[1].on_demand_revenue - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unpaid_undated_and_out_of_range_bookings_are_skipped() {
        let mut pending = paid("2025-01-12", 999.0);
        pending.payment_status = PaymentStatus::Pending;
        let undated = Booking {
            scheduled_date: None,
            ..paid("2025-01-01", 50.0)
        };
        let bookings = vec![paid("2025-01-05", 10.0), pending, undated, paid("2025-03-01", 70.0)];
        let range = DateRange::parse("2025-01-01", "2025-02-28").unwrap();

        let series = revenue_over_time(&bookings, &[], &range);
        assert!((series.on_demand_total - 10.0).abs() < f64::EPSILON);
        assert_eq!(series.points.len(), 1);
    }

    #[test]
    fn subscriptions_fill_each_running_month() {
        let subs = vec![
            sub("2024-11-15", None, 50.0),
            sub("2025-02-01", Some("2025-03-31"), 30.0),
        ];
        let range = DateRange::parse("2025-01-01", "2025-04-30").unwrap();

        let series = revenue_over_time(&[], &subs, &range);
        let by_month: Vec<(String, f64)> = series
            .points
            .iter()
            .map(|p| (p.month_key.to_string(), p.subscription_revenue))
            .collect();
        assert_eq!(
            by_month,
            vec![
                ("2025-01".to_string(), 50.0),
                ("2025-02".to_string(), 80.0),
                ("2025-03".to_string(), 80.0),
                ("2025-04".to_string(), 50.0),
            ]
        );
        assert!((series.subscription_total - 260.0).abs() < 1e-9);
    }

    #[test]
    fn malformed_subscription_span_contributes_nothing() {
        let subs = vec![sub("2025-06-01", Some("2025-01-01"), 40.0)];
        let range = DateRange::parse("2025-01-01", "2025-12-31").unwrap();
        let series = revenue_over_time(&[], &subs, &range);
        assert!(series.points.is_empty());
    }

    #[test]
    fn totals_equal_sum_of_inputs() {
        let bookings = vec![
            paid("2025-01-03", 120.0),
            paid("2025-01-20", 80.0),
            paid("2025-03-09", 45.5),
        ];
        let subs = vec![sub("2025-02-01", None, 25.0)];
        let range = DateRange::parse("2025-01-01", "2025-03-31").unwrap();

        let series = revenue_over_time(&bookings, &subs, &range);
        let summed: f64 = series.points.iter().map(|p| p.total).sum();
        assert!((summed - (245.5 + 50.0)).abs() < 1e-9);
        assert!((series.total - summed).abs() < 1e-9);
    }

    #[test]
    fn empty_inputs_yield_empty_series() {
        let range = DateRange::parse("2025-01-01", "2025-12-31").unwrap();
        let series = revenue_over_time(&[], &[], &range);
        assert_eq!(series, RevenueSeries::default());
    }
}
