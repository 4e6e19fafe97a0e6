//! In-memory collections handed to the analytics layer.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::error::{InsightsError, InsightsResult};
use crate::types::{Booking, Provider, Review, Service, Subscription};

/// Every collection the dashboards read, fetched once by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataSnapshot {
    #[serde(default)]
    pub bookings: Vec<Booking>,
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,
    #[serde(default)]
    pub providers: Vec<Provider>,
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub reviews: Vec<Review>,
}

impl DataSnapshot {
    /// Load `bookings.json`, `subscriptions.json`, `providers.json`,
    /// `services.json` and `reviews.json` from `dir`. A missing file is an
    /// empty collection.
    pub fn load_dir(dir: impl AsRef<Path>) -> InsightsResult<Self> {
        let dir = dir.as_ref();
        let snapshot = Self {
            bookings: load_collection(dir, "bookings.json")?,
            subscriptions: load_collection(dir, "subscriptions.json")?,
            providers: load_collection(dir, "providers.json")?,
            services: load_collection(dir, "services.json")?,
            reviews: load_collection(dir, "reviews.json")?,
        };

        info!(
            dir = %dir.display(),
            bookings = snapshot.bookings.len(),
            subscriptions = snapshot.subscriptions.len(),
            providers = snapshot.providers.len(),
            services = snapshot.services.len(),
            reviews = snapshot.reviews.len(),
            "Snapshot loaded"
        );

        Ok(snapshot)
    }

    pub fn is_empty(&self) -> bool {
        self.bookings.is_empty()
            && self.subscriptions.is_empty()
            && self.providers.is_empty()
            && self.services.is_empty()
            && self.reviews.is_empty()
    }
}

/// Parse one JSON array of records. `name` is only used in the error.
pub fn parse_collection<T: DeserializeOwned>(name: &str, json: &str) -> InsightsResult<Vec<T>> {
    serde_json::from_str(json).map_err(|source| InsightsError::Snapshot {
        file: name.to_string(),
        source,
    })
}

fn load_collection<T: DeserializeOwned>(dir: &Path, file: &str) -> InsightsResult<Vec<T>> {
    let path = dir.join(file);
    if !path.exists() {
        warn!(file = %path.display(), "Snapshot file missing, treating as empty");
        return Ok(Vec::new());
    }
    let raw = std::fs::read_to_string(&path)?;
    parse_collection(&path.display().to_string(), &raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "facility-snapshot-{}-{}",
            tag,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_files_load_as_empty() {
        let dir = scratch_dir("missing");
        std::fs::write(
            dir.join("bookings.json"),
            r#"[{"id": "b1", "scheduled_date": "2025-01-10", "payment_status": "paid",
                 "total_amount": 100}]"#,
        )
        .unwrap();

        let snapshot = DataSnapshot::load_dir(&dir).unwrap();
        assert_eq!(snapshot.bookings.len(), 1);
        assert!(snapshot.subscriptions.is_empty());
        assert!(snapshot.providers.is_empty());
        assert!(!snapshot.is_empty());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn invalid_file_names_the_file() {
        let dir = scratch_dir("invalid");
        std::fs::write(dir.join("providers.json"), "{not json").unwrap();

        let err = DataSnapshot::load_dir(&dir).unwrap_err();
        match err {
            InsightsError::Snapshot { file, .. } => assert!(file.ends_with("providers.json")),
            other => panic!("unexpected error: {other}"),
        }

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn parse_collection_reads_arrays() {
        let services: Vec<Service> = parse_collection(
            "services",
            r#"[{"id": "s1", "name": "Deep clean", "duration_minutes": 120}]"#,
        )
        .unwrap();
        assert_eq!(services[0].duration_minutes, Some(120.0));
    }
}
