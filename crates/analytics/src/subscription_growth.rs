//! Subscription growth — net new subscribers per month with a running total.

use facility_core::dates::{DateRange, MonthKey};
use facility_core::types::Subscription;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthPoint {
    pub month_key: MonthKey,
    pub month: String,
    pub new_subscriptions: u64,
    pub cancelled: u64,
    pub net_new: i64,
    /// Subscribers at month end, carried from before the range.
    pub total_active: u64,
    /// Monthly amount added by this month's new subscriptions.
    pub new_mrr: f64,
}

pub fn subscription_growth(subscriptions: &[Subscription], range: &DateRange) -> Vec<GrowthPoint> {
    if range.is_empty() {
        return Vec::new();
    }
    let first = range.start_month();
    let last = range.end_month();

    let mut opening = 0u64;
    let mut starts: HashMap<MonthKey, (u64, f64)> = HashMap::new();
    let mut cancels: HashMap<MonthKey, u64> = HashMap::new();
    for sub in subscriptions {
        let cancelled = sub.cancelled_month();
        if let Some(start) = sub.start_month() {
            if start < first && cancelled.map_or(true, |c| c >= first) {
                opening += 1;
            } else if start >= first && start <= last {
                let entry = starts.entry(start).or_default();
                entry.0 += 1;
                entry.1 += sub.amount();
            }
        }
        if let Some(month) = cancelled.filter(|c| *c >= first && *c <= last) {
            *cancels.entry(month).or_default() += 1;
        }
    }

    let mut total_active = opening;
    first
        .iter_to(last)
        .map(|month_key| {
            let (new_subscriptions, new_mrr) = starts.get(&month_key).copied().unwrap_or_default();
            let cancelled = cancels.get(&month_key).copied().unwrap_or(0);
            total_active = (total_active + new_subscriptions).saturating_sub(cancelled);
            GrowthPoint {
                month_key,
                month: month_key.label(),
                new_subscriptions,
                cancelled,
                net_new: new_subscriptions as i64 - cancelled as i64,
                total_active,
                new_mrr,
            }
        })
        .collect()
}
