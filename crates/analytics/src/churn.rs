//! Subscription churn — monthly new/cancelled/paused counts, churn rate over a
//! running active base, and the most common cancellation reasons.

use facility_core::dates::{DateRange, MonthKey};
use facility_core::types::Subscription;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::math::{mean, percent};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChurnPoint {
    pub month_key: MonthKey,
    pub month: String,
    pub new_subscriptions: u64,
    pub cancelled: u64,
    pub paused: u64,
    /// Active subscribers at the end of the month.
    pub active: u64,
    /// `cancelled / max(1, active + cancelled) * 100`.
    pub churn_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelReason {
    pub reason: String,
    pub count: u64,
    pub share: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChurnSummary {
    pub starting_active: u64,
    pub ending_active: u64,
    pub total_new: u64,
    pub total_cancelled: u64,
    pub total_paused: u64,
    pub overall_churn_rate: f64,
    pub average_monthly_churn_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChurnAnalysis {
    pub monthly: Vec<ChurnPoint>,
    pub summary: ChurnSummary,
    pub top_reasons: Vec<CancelReason>,
}

#[derive(Default)]
struct MonthCounts {
    new: u64,
    cancelled: u64,
    paused: u64,
}

pub fn churn_analysis(
    subscriptions: &[Subscription],
    range: &DateRange,
    top_reasons: usize,
) -> ChurnAnalysis {
    if range.is_empty() {
        return ChurnAnalysis::default();
    }
    let first = range.start_month();
    let last = range.end_month();
    let in_range = |m: &MonthKey| *m >= first && *m <= last;

    let mut counts: HashMap<MonthKey, MonthCounts> = HashMap::new();
    let mut reasons: HashMap<String, u64> = HashMap::new();
    let mut starting_active = 0u64;

    for sub in subscriptions {
        let start = sub.start_month();
        let cancelled = sub.cancelled_month();

        if let Some(start) = start {
            if start < first && cancelled.map_or(true, |c| c >= first) {
                starting_active += 1;
            }
            if in_range(&start) {
                counts.entry(start).or_default().new += 1;
            }
        }

        if let Some(month) = cancelled.filter(in_range) {
            counts.entry(month).or_default().cancelled += 1;
            if let Some(reason) = sub.cancel_reason.as_deref().map(normalize_reason) {
                if !reason.is_empty() {
                    *reasons.entry(reason).or_default() += 1;
                }
            }
        }

        if let Some(month) = sub.paused_month().filter(in_range) {
            counts.entry(month).or_default().paused += 1;
        }
    }

    let mut active = starting_active;
    let mut monthly = Vec::new();
    for month_key in first.iter_to(last) {
        let c = counts.remove(&month_key).unwrap_or_default();
        active = (active + c.new).saturating_sub(c.cancelled);
        let churn_rate = percent(c.cancelled as f64, (active + c.cancelled).max(1) as f64);
        monthly.push(ChurnPoint {
            month_key,
            month: month_key.label(),
            new_subscriptions: c.new,
            cancelled: c.cancelled,
            paused: c.paused,
            active,
            churn_rate,
        });
    }

    let total_new: u64 = monthly.iter().map(|p| p.new_subscriptions).sum();
    let total_cancelled: u64 = monthly.iter().map(|p| p.cancelled).sum();
    let total_paused: u64 = monthly.iter().map(|p| p.paused).sum();
    let rates: Vec<f64> = monthly.iter().map(|p| p.churn_rate).collect();
    let summary = ChurnSummary {
        starting_active,
        ending_active: active,
        total_new,
        total_cancelled,
        total_paused,
        overall_churn_rate: percent(
            total_cancelled as f64,
            (starting_active + total_new).max(1) as f64,
        )
        .min(100.0),
        average_monthly_churn_rate: mean(&rates),
    };

    debug!(
        months = monthly.len(),
        cancelled = total_cancelled,
        overall = summary.overall_churn_rate,
        "Churn analysis computed"
    );

    ChurnAnalysis {
        monthly,
        summary,
        top_reasons: rank_reasons(reasons, top_reasons),
    }
}

fn normalize_reason(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn rank_reasons(reasons: HashMap<String, u64>, limit: usize) -> Vec<CancelReason> {
    let total: u64 = reasons.values().sum();
    let mut ranked: Vec<(String, u64)> = reasons.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
        .into_iter()
        .take(limit)
        .map(|(reason, count)| CancelReason {
            reason,
            count,
            share: percent(count as f64, total as f64),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use facility_core::types::SubscriptionStatus;

    fn cancelled(start: &str, at: &str, reason: Option<&str>) -> Subscription {
        Subscription {
            start_date: Some(start.into()),
            status: SubscriptionStatus::Cancelled,
            cancelled_at: Some(at.into()),
            cancel_reason: reason.map(Into::into),
            monthly_amount: Some(99.0),
            ..Default::default()
        }
    }

    fn active(start: &str) -> Subscription {
        Subscription {
            start_date: Some(start.into()),
            monthly_amount: Some(99.0),
            ..Default::default()
        }
    }

    #[test]
    fn single_cancellation_is_full_churn_for_its_month() {
        let subs = vec![cancelled("2024-01-01", "2024-06-15", None)];
        let range = DateRange::parse("2024-01-01", "2024-12-31").unwrap();

        let analysis = churn_analysis(&subs, &range, 5);
        let june = analysis
            .monthly
            .iter()
            .find(|p| p.month_key.to_string() == "2024-06")
            .unwrap();
        assert_eq!(june.cancelled, 1);
        assert_eq!(june.active, 0);
        assert!((june.churn_rate - 100.0).abs() < f64::EPSILON);
        assert_eq!(analysis.monthly.len(), 12);
    }

    #[test]
    fn base_carries_in_from_before_the_range() {
        let subs = vec![
            active("2023-05-01"),
            active("2023-08-01"),
            cancelled("2023-01-01", "2023-12-01", None),
            cancelled("2023-02-01", "2024-02-10", Some("Moving")),
        ];
        let range = DateRange::parse("2024-01-01", "2024-03-31").unwrap();

        let analysis = churn_analysis(&subs, &range, 5);
        assert_eq!(analysis.summary.starting_active, 3);
        let feb = &analysis.monthly[1];
        assert_eq!(feb.cancelled, 1);
        assert_eq!(feb.active, 2);
        assert!((feb.churn_rate - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(analysis.summary.ending_active, 2);
    }

    #[test]
    fn churn_rate_is_zero_without_base_or_cancellations() {
        let range = DateRange::parse("2024-01-01", "2024-03-31").unwrap();
        let analysis = churn_analysis(&[], &range, 5);
        assert_eq!(analysis.monthly.len(), 3);
        assert!(analysis.monthly.iter().all(|p| p.churn_rate == 0.0));
        assert_eq!(analysis.summary.overall_churn_rate, 0.0);
        assert!(analysis.top_reasons.is_empty());
    }

    #[test]
    fn churn_rate_stays_within_bounds() {
        let subs = vec![
            cancelled("2024-03-01", "2024-01-05", None),
            cancelled("2024-03-01", "2024-01-06", None),
            active("2024-02-01"),
        ];
        let range = DateRange::parse("2024-01-01", "2024-04-30").unwrap();
        let analysis = churn_analysis(&subs, &range, 5);
        for point in &analysis.monthly {
            assert!((0.0..=100.0).contains(&point.churn_rate));
        }
        assert!((0.0..=100.0).contains(&analysis.summary.overall_churn_rate));
    }

    #[test]
    fn reasons_are_normalized_and_ranked() {
        let subs = vec![
            cancelled("2024-01-01", "2024-02-01", Some("Too expensive")),
            cancelled("2024-01-01", "2024-02-03", Some("  too EXPENSIVE ")),
            cancelled("2024-01-01", "2024-02-04", Some("Moving")),
            cancelled("2024-01-01", "2024-02-05", Some("   ")),
            cancelled("2024-01-01", "2024-02-06", Some("bad service")),
        ];
        let range = DateRange::parse("2024-01-01", "2024-02-29").unwrap();

        let analysis = churn_analysis(&subs, &range, 2);
        assert_eq!(analysis.top_reasons.len(), 2);
        assert_eq!(analysis.top_reasons[0].reason, "too expensive");
        assert_eq!(analysis.top_reasons[0].count, 2);
        assert!((analysis.top_reasons[0].share - 50.0).abs() < 1e-9);
        assert_eq!(analysis.top_reasons[1].reason, "bad service");
    }

    #[test]
    fn paused_is_counted_but_keeps_subscriber_active() {
        let mut paused = active("2024-01-10");
        paused.status = SubscriptionStatus::Paused;
        paused.paused_at = Some("2024-02-12T08:00:00Z".into());
        let range = DateRange::parse("2024-01-01", "2024-02-29").unwrap();

        let analysis = churn_analysis(&[paused], &range, 5);
        assert_eq!(analysis.monthly[1].paused, 1);
        assert_eq!(analysis.monthly[1].active, 1);
        assert_eq!(analysis.summary.total_paused, 1);
    }
}
