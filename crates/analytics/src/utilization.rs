//! Technician utilization over a trailing window: service plus travel hours
//! against assumed monthly capacity, completion rate and travel share.

use chrono::NaiveDate;
use facility_core::config::AnalyticsConfig;
use facility_core::dates::DateRange;
use facility_core::types::{Booking, Provider, Service};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::math::{mean, percent};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicianUtilization {
    pub provider_id: String,
    pub name: String,
    pub assigned_jobs: u64,
    pub completed_jobs: u64,
    pub service_hours: f64,
    pub travel_hours: f64,
    pub active_hours: f64,
    /// `min(100, active_hours / monthly_working_hours * 100)`.
    pub utilization: f64,
    pub completion_rate: f64,
    pub travel_share: f64,
    pub average_rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilizationSummary {
    pub technicians: u64,
    pub average_utilization: f64,
    pub average_travel_share: f64,
    pub overloaded: u64,
    pub underutilized: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UtilizationReport {
    pub window: Option<DateRange>,
    pub chart_data: Vec<TechnicianUtilization>,
    /// `None` when there are no active technicians.
    pub summary: Option<UtilizationSummary>,
}

pub fn technician_utilization(
    providers: &[Provider],
    bookings: &[Booking],
    services: &[Service],
    today: NaiveDate,
    config: &AnalyticsConfig,
) -> UtilizationReport {
    let active: Vec<&Provider> = providers.iter().filter(|p| p.is_active).collect();
    if active.is_empty() {
        return UtilizationReport::default();
    }

    let window = DateRange::trailing(today, config.utilization_window_days);
    let durations: HashMap<&str, f64> = services
        .iter()
        .filter_map(|s| {
            s.duration_minutes
                .filter(|m| m.is_finite() && *m > 0.0)
                .map(|m| (s.id.as_str(), m))
        })
        .collect();

    let mut per_provider: HashMap<&str, Vec<&Booking>> = HashMap::new();
    for booking in bookings {
        let (Some(provider), Some(day)) =
            (booking.assigned_provider_id.as_deref(), booking.scheduled_day())
        else {
            continue;
        };
        if window.contains(day) {
            per_provider.entry(provider).or_default().push(booking);
        }
    }

    let chart_data: Vec<TechnicianUtilization> = active
        .iter()
        .map(|provider| {
            let jobs = per_provider.get(provider.id.as_str()).map(Vec::as_slice).unwrap_or(&[]);
            let completed: Vec<&&Booking> = jobs.iter().filter(|b| b.is_completed()).collect();

            let service_minutes: f64 = completed
                .iter()
                .map(|b| {
                    b.service_id
                        .as_deref()
                        .and_then(|id| durations.get(id).copied())
                        .unwrap_or(config.default_service_minutes)
                })
                .sum();
            let travel_minutes = completed.len() as f64 * config.travel_minutes_per_job;
            let active_minutes = service_minutes + travel_minutes;
            let active_hours = active_minutes / 60.0;

            TechnicianUtilization {
                provider_id: provider.id.clone(),
                name: provider.full_name.clone(),
                assigned_jobs: jobs.len() as u64,
                completed_jobs: completed.len() as u64,
                service_hours: service_minutes / 60.0,
                travel_hours: travel_minutes / 60.0,
                active_hours,
                utilization: percent(active_hours, config.monthly_working_hours).min(100.0),
                completion_rate: percent(completed.len() as f64, jobs.len() as f64),
                travel_share: percent(travel_minutes, active_minutes),
                average_rating: provider.average_rating,
            }
        })
        .collect();

    let utilizations: Vec<f64> = chart_data.iter().map(|t| t.utilization).collect();
    let travel_shares: Vec<f64> = chart_data.iter().map(|t| t.travel_share).collect();
    let summary = UtilizationSummary {
        technicians: chart_data.len() as u64,
        average_utilization: mean(&utilizations),
        average_travel_share: mean(&travel_shares),
        overloaded: utilizations
            .iter()
            .filter(|u| **u > config.overloaded_threshold_pct)
            .count() as u64,
        underutilized: utilizations
            .iter()
            .filter(|u| **u < config.underutilized_threshold_pct)
            .count() as u64,
    };

    debug!(
        technicians = summary.technicians,
        average = summary.average_utilization,
        overloaded = summary.overloaded,
        "Technician utilization computed"
    );

    UtilizationReport {
        window: Some(window),
        chart_data,
        summary: Some(summary),
    }
}
