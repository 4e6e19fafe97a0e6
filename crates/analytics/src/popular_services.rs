//! Popular services ranking.

use facility_core::dates::DateRange;
use facility_core::types::{Booking, Service};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::math::percent;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServicePopularity {
    pub service_id: String,
    pub name: String,
    pub bookings: u64,
    pub revenue: f64,
    /// Share of all dated bookings in range.
    pub share: f64,
}

/// Bookings and paid revenue per service within `range`, most booked first.
pub fn popular_services(
    bookings: &[Booking],
    services: &[Service],
    range: &DateRange,
    limit: usize,
) -> Vec<ServicePopularity> {
    let names: HashMap<&str, &str> = services
        .iter()
        .map(|s| (s.id.as_str(), s.name.as_str()))
        .collect();

    let mut total = 0u64;
    let mut tally: HashMap<&str, (u64, f64)> = HashMap::new();
    for booking in bookings {
        if !booking.scheduled_day().is_some_and(|d| range.contains(d)) {
            continue;
        }
        total += 1;
        let Some(service_id) = booking.service_id.as_deref() else {
            continue;
        };
        let entry = tally.entry(service_id).or_default();
        entry.0 += 1;
        if booking.is_paid() {
            entry.1 += booking.amount();
        }
    }

    let mut ranked: Vec<ServicePopularity> = tally
        .into_iter()
        .map(|(id, (count, revenue))| ServicePopularity {
            service_id: id.to_string(),
            name: names.get(id).copied().unwrap_or(id).to_string(),
            bookings: count,
            revenue,
            share: percent(count as f64, total as f64),
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.bookings
            .cmp(&a.bookings)
            .then_with(|| b.revenue.total_cmp(&a.revenue))
            .then_with(|| a.service_id.cmp(&b.service_id))
    });
    ranked.truncate(limit);
    ranked
}
