//! Record snapshots supplied by the backend. The analytics layer only reads
//! them; every optional backend field is an explicit `Option`.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::dates::{parse_day, parse_timestamp, MonthKey};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    #[default]
    Pending,
    Refunded,
    Failed,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    #[default]
    Active,
    Paused,
    Cancelled,
    #[serde(other)]
    Unknown,
}

/// A scheduled service instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Booking {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub service_id: Option<String>,
    #[serde(default)]
    pub assigned_provider_id: Option<String>,
    /// Calendar date, `YYYY-MM-DD`.
    #[serde(default)]
    pub scheduled_date: Option<String>,
    #[serde(default)]
    pub status: BookingStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub total_amount: Option<f64>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub created_date: Option<String>,
}

impl Booking {
    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }

    pub fn is_completed(&self) -> bool {
        self.status == BookingStatus::Completed
    }

    pub fn amount(&self) -> f64 {
        self.total_amount.filter(|a| a.is_finite()).unwrap_or(0.0)
    }

    pub fn scheduled_day(&self) -> Option<NaiveDate> {
        self.scheduled_date.as_deref().and_then(parse_day)
    }

    pub fn scheduled_month(&self) -> Option<MonthKey> {
        self.scheduled_date.as_deref().and_then(MonthKey::from_date_str)
    }

    pub fn created_day(&self) -> Option<NaiveDate> {
        self.created_date.as_deref().and_then(parse_day)
    }

    pub fn created_month(&self) -> Option<MonthKey> {
        self.created_date.as_deref().and_then(MonthKey::from_date_str)
    }

    /// Service minutes actually spent, when both timestamps are present and
    /// ordered.
    pub fn actual_minutes(&self) -> Option<f64> {
        let started = self.started_at.as_deref().and_then(parse_timestamp)?;
        let completed = self.completed_at.as_deref().and_then(parse_timestamp)?;
        let seconds = (completed - started).num_seconds();
        (seconds >= 0).then(|| seconds as f64 / 60.0)
    }
}

/// A recurring service agreement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Subscription {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub package_id: Option<String>,
    #[serde(default)]
    pub status: SubscriptionStatus,
    #[serde(default)]
    pub monthly_amount: Option<f64>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub cancelled_at: Option<String>,
    #[serde(default)]
    pub paused_at: Option<String>,
    #[serde(default)]
    pub cancel_reason: Option<String>,
    #[serde(default)]
    pub auto_renew: bool,
}

impl Subscription {
    pub fn amount(&self) -> f64 {
        self.monthly_amount.filter(|a| a.is_finite()).unwrap_or(0.0)
    }

    pub fn start_day(&self) -> Option<NaiveDate> {
        self.start_date.as_deref().and_then(parse_day)
    }

    pub fn start_month(&self) -> Option<MonthKey> {
        self.start_date.as_deref().and_then(MonthKey::from_date_str)
    }

    pub fn cancelled_month(&self) -> Option<MonthKey> {
        self.cancelled_at.as_deref().and_then(MonthKey::from_date_str)
    }

    pub fn paused_month(&self) -> Option<MonthKey> {
        self.paused_at.as_deref().and_then(MonthKey::from_date_str)
    }

    /// Last day the agreement ran: `end_date`, else `cancelled_at`.
    pub fn end_day(&self) -> Option<NaiveDate> {
        self.end_date
            .as_deref()
            .and_then(parse_day)
            .or_else(|| self.cancelled_at.as_deref().and_then(parse_day))
    }

    pub fn end_month(&self) -> Option<MonthKey> {
        self.end_date
            .as_deref()
            .and_then(MonthKey::from_date_str)
            .or_else(|| self.cancelled_month())
    }
}

fn default_active() -> bool {
    true
}

/// A technician.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub specialization: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub duration_minutes: Option<f64>,
    #[serde(default)]
    pub category_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    #[serde(default)]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub booking_id: Option<String>,
    #[serde(default)]
    pub created_date: Option<String>,
}
