//! Customer acquisition — first-booking customers per month, the cumulative
//! customer count, and a crude acquisition cost estimate.

use chrono::NaiveDate;
use facility_core::dates::{DateRange, MonthKey};
use facility_core::types::Booking;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionPoint {
    pub month_key: MonthKey,
    pub month: String,
    pub new_customers: u64,
    pub cumulative_customers: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerAcquisition {
    pub monthly: Vec<AcquisitionPoint>,
    pub customers_before_range: u64,
    pub total_new: u64,
    pub assumed_marketing_spend: f64,
    /// Assumed spend over the range divided by new customers; 0 without any.
    pub estimated_cac: f64,
}

pub fn customer_acquisition(
    bookings: &[Booking],
    range: &DateRange,
    monthly_marketing_spend: f64,
) -> CustomerAcquisition {
    if range.is_empty() {
        return CustomerAcquisition::default();
    }

    let mut first_seen: HashMap<&str, NaiveDate> = HashMap::new();
    for booking in bookings {
        let (Some(customer), Some(day)) = (
            booking.customer_id.as_deref(),
            booking.created_day().or_else(|| booking.scheduled_day()),
        ) else {
            continue;
        };
        first_seen
            .entry(customer)
            .and_modify(|d| *d = (*d).min(day))
            .or_insert(day);
    }

    let mut customers_before_range = 0u64;
    let mut per_month: HashMap<MonthKey, u64> = HashMap::new();
    for day in first_seen.values() {
        if *day < range.start {
            customers_before_range += 1;
        } else if range.contains(*day) {
            *per_month.entry(MonthKey::from_date(*day)).or_default() += 1;
        }
    }

    let mut cumulative = customers_before_range;
    let monthly: Vec<AcquisitionPoint> = range
        .months()
        .map(|month_key| {
            let new_customers = per_month.get(&month_key).copied().unwrap_or(0);
            cumulative += new_customers;
            AcquisitionPoint {
                month_key,
                month: month_key.label(),
                new_customers,
                cumulative_customers: cumulative,
            }
        })
        .collect();

    let total_new: u64 = monthly.iter().map(|p| p.new_customers).sum();
    let assumed_marketing_spend = monthly_marketing_spend * monthly.len() as f64;
    let estimated_cac = if total_new > 0 {
        assumed_marketing_spend / total_new as f64
    } else {
        0.0
    };

    CustomerAcquisition {
        monthly,
        customers_before_range,
        total_new,
        assumed_marketing_spend,
        estimated_cac,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking(customer: &str, created: &str) -> Booking {
        Booking {
            customer_id: Some(customer.into()),
            created_date: Some(created.into()),
            ..Default::default()
        }
    }

    #[test]
    fn counts_first_bookings_only() {
        let bookings = vec![
            booking("old", "2024-11-03"),
            booking("old", "2025-01-09"),
            booking("a", "2025-01-15"),
            booking("a", "2025-02-15"),
            booking("b", "2025-02-01"),
            booking("c", "2025-02-20"),
        ];
        let range = DateRange::parse("2025-01-01", "2025-02-28").unwrap();

        let result = customer_acquisition(&bookings, &range, 1_000.0);
        assert_eq!(result.customers_before_range, 1);
        let new: Vec<u64> = result.monthly.iter().map(|p| p.new_customers).collect();
        let cumulative: Vec<u64> = result.monthly.iter().map(|p| p.cumulative_customers).collect();
        assert_eq!(new, vec![1, 2]);
        assert_eq!(cumulative, vec![2, 4]);
        assert_eq!(result.total_new, 3);
        assert!((result.estimated_cac - 2_000.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn no_new_customers_means_zero_cac() {
        let range = DateRange::parse("2025-01-01", "2025-03-31").unwrap();
        let result = customer_acquisition(&[], &range, 1_000.0);
        assert_eq!(result.monthly.len(), 3);
        assert_eq!(result.estimated_cac, 0.0);
    }
}
