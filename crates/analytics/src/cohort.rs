//! Cohort analysis — monthly retention curves keyed by first-booking month.

use chrono::NaiveDate;
use facility_core::dates::MonthKey;
use facility_core::types::Booking;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

use crate::math::{mean, percent};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortRow {
    pub cohort: MonthKey,
    pub month: String,
    pub size: u64,
    /// Percent of the cohort active `n` months after joining, indexed by `n`.
    /// Shorter than the configured offsets when later months are in the future.
    pub retention: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CohortRetention {
    pub cohorts: Vec<CohortRow>,
    /// Mean retention per offset over the cohorts that reached it.
    pub average_retention: Vec<f64>,
}

pub fn cohort_retention(
    bookings: &[Booking],
    today: NaiveDate,
    cohort_count: usize,
    offsets: u32,
) -> CohortRetention {
    let current_month = MonthKey::from_date(today);

    let mut activity: HashMap<&str, HashSet<MonthKey>> = HashMap::new();
    for booking in bookings {
        let (Some(customer), Some(month)) =
            (booking.customer_id.as_deref(), booking.created_month())
        else {
            continue;
        };
        activity.entry(customer).or_default().insert(month);
    }

    let mut cohorts: BTreeMap<MonthKey, Vec<&str>> = BTreeMap::new();
    for (customer, months) in &activity {
        if let Some(first) = months.iter().min() {
            cohorts.entry(*first).or_default().push(*customer);
        }
    }

    let eligible: Vec<(MonthKey, Vec<&str>)> = cohorts
        .into_iter()
        .filter(|(month, _)| *month <= current_month)
        .collect();
    let skip = eligible.len().saturating_sub(cohort_count);

    let rows: Vec<CohortRow> = eligible
        .into_iter()
        .skip(skip)
        .map(|(cohort, members)| {
            let size = members.len() as u64;
            let mut retention = Vec::new();
            for offset in 0..offsets {
                let target = cohort.add_months(offset);
                if target > current_month {
                    break;
                }
                let retained = members
                    .iter()
                    .filter(|c| activity.get(*c).is_some_and(|m| m.contains(&target)))
                    .count();
                retention.push(percent(retained as f64, size as f64));
            }
            CohortRow {
                cohort,
                month: cohort.label(),
                size,
                retention,
            }
        })
        .collect();

    let average_retention = (0..offsets as usize)
        .map(|i| {
            rows.iter()
                .filter_map(|r| r.retention.get(i).copied())
                .collect::<Vec<f64>>()
        })
        .take_while(|values| !values.is_empty())
        .map(|values| mean(&values))
        .collect();

    debug!(cohorts = rows.len(), customers = activity.len(), "Cohort retention computed");

    CohortRetention {
        cohorts: rows,
        average_retention,
    }
}
