//! Service completion time statistics from `started_at` / `completed_at`.

use facility_core::dates::DateRange;
use facility_core::types::{Booking, Service};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::math::{mean, percent, percentile_sorted};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DurationStats {
    pub count: u64,
    pub mean_minutes: f64,
    pub median_minutes: f64,
    pub p90_minutes: f64,
    pub p95_minutes: f64,
    pub min_minutes: f64,
    pub max_minutes: f64,
    pub variance: f64,
    pub std_dev: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCompletion {
    pub service_id: String,
    pub name: String,
    pub jobs: u64,
    pub mean_minutes: f64,
    pub expected_minutes: Option<f64>,
    /// `(mean - expected) / expected * 100`; `None` without an expectation.
    pub overrun_percent: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionTimeReport {
    pub overall: DurationStats,
    pub by_service: Vec<ServiceCompletion>,
}

/// Population statistics; zeroed for an empty slice.
pub fn duration_stats(minutes: &[f64]) -> DurationStats {
    if minutes.is_empty() {
        return DurationStats::default();
    }
    let mut sorted = minutes.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let mean_minutes = mean(&sorted);
    let median_minutes = if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    };
    let variance = sorted.iter().map(|m| (m - mean_minutes).powi(2)).sum::<f64>() / n as f64;

    DurationStats {
        count: n as u64,
        mean_minutes,
        median_minutes,
        p90_minutes: percentile_sorted(&sorted, 90.0),
        p95_minutes: percentile_sorted(&sorted, 95.0),
        min_minutes: sorted[0],
        max_minutes: sorted[n - 1],
        variance,
        std_dev: variance.sqrt(),
    }
}

/// Completed bookings scheduled within `range` that carry both timestamps.
pub fn completion_time_stats(
    bookings: &[Booking],
    services: &[Service],
    range: &DateRange,
) -> CompletionTimeReport {
    let mut all = Vec::new();
    let mut per_service: HashMap<&str, Vec<f64>> = HashMap::new();

    for booking in bookings.iter().filter(|b| b.is_completed()) {
        if !booking.scheduled_day().is_some_and(|d| range.contains(d)) {
            continue;
        }
        let Some(minutes) = booking.actual_minutes() else {
            continue;
        };
        all.push(minutes);
        if let Some(service_id) = booking.service_id.as_deref() {
            per_service.entry(service_id).or_default().push(minutes);
        }
    }

    let catalog: HashMap<&str, &Service> = services.iter().map(|s| (s.id.as_str(), s)).collect();
    let mut by_service: Vec<ServiceCompletion> = per_service
        .into_iter()
        .map(|(id, samples)| {
            let service = catalog.get(id);
            let mean_minutes = mean(&samples);
            let expected_minutes = service.and_then(|s| s.duration_minutes).filter(|m| *m > 0.0);
            ServiceCompletion {
                service_id: id.to_string(),
                name: service.map_or_else(|| id.to_string(), |s| s.name.clone()),
                jobs: samples.len() as u64,
                mean_minutes,
                expected_minutes,
                overrun_percent: expected_minutes.map(|e| percent(mean_minutes - e, e)),
            }
        })
        .collect();
    by_service.sort_by(|a, b| b.jobs.cmp(&a.jobs).then_with(|| a.service_id.cmp(&b.service_id)));

    CompletionTimeReport {
        overall: duration_stats(&all),
        by_service,
    }
}
