pub mod config;
pub mod dates;
pub mod error;
pub mod snapshot;
pub mod types;

pub use config::{AnalyticsConfig, AppConfig};
pub use dates::{DateRange, MonthKey};
pub use error::{InsightsError, InsightsResult};
pub use snapshot::DataSnapshot;
