use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::oracle::Overpass;
use crate::scheduler::storage::StorageError;

pub const DEFAULT_LEAD_TIME_HOURS: u32 = 24;
pub const DEFAULT_CLOUD_COVERAGE_THRESHOLD: f64 = 15.0;
/// Longest accepted advance notice, one year.
pub const MAX_LEAD_TIME_HOURS: u32 = 24 * 366;

/// Who gets notified about a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Owner {
    /// A configured user, resolved to an address by the store.
    User(String),
    /// A direct email address.
    Email(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WatchedLocation {
    pub id: Uuid,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub owner: Owner,
    #[serde(default = "default_notify")]
    pub notify: bool,
    /// Hours of advance notice before a pass.
    #[serde(default = "default_lead_time")]
    pub notification_lead_time: u32,
    /// Maximum cloud coverage percentage. Stored for filtering but not
    /// consulted when picking the next pass.
    #[serde(default = "default_cloud_coverage_threshold")]
    pub cloud_coverage_threshold: f64,
    pub created_at: DateTime<Utc>,
}

impl WatchedLocation {
    pub fn from_new(
        new: NewLocation,
        owner: Owner,
        created_at: DateTime<Utc>,
    ) -> Result<Self, StorageError> {
        new.validate()?;

        let name = new
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("Location at {}, {}", new.latitude, new.longitude));

        Ok(Self {
            id: Uuid::new_v4(),
            name,
            latitude: new.latitude,
            longitude: new.longitude,
            owner,
            notify: new.notify.unwrap_or_else(default_notify),
            notification_lead_time: new.notification_lead_time.unwrap_or(DEFAULT_LEAD_TIME_HOURS),
            cloud_coverage_threshold: new
                .cloud_coverage_threshold
                .unwrap_or(DEFAULT_CLOUD_COVERAGE_THRESHOLD),
            created_at,
        })
    }

    pub fn lead_time(&self) -> Duration {
        Duration::hours(i64::from(self.notification_lead_time))
    }
}

/// Fields a user supplies when registering a location.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewLocation {
    #[serde(default)]
    pub name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub notification_lead_time: Option<u32>,
    #[serde(default)]
    pub cloud_coverage_threshold: Option<f64>,
    #[serde(default)]
    pub notify: Option<bool>,
}

impl NewLocation {
    pub fn validate(&self) -> Result<(), StorageError> {
        let invalid = |msg: String| Err(StorageError::InvalidLocation(msg));

        if !(-90.0..=90.0).contains(&self.latitude) {
            return invalid(format!("latitude {} outside [-90, 90]", self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return invalid(format!("longitude {} outside [-180, 180]", self.longitude));
        }
        if let Some(hours) = self.notification_lead_time {
            if hours > MAX_LEAD_TIME_HOURS {
                return invalid(format!(
                    "notification_lead_time {} exceeds {} hours",
                    hours, MAX_LEAD_TIME_HOURS
                ));
            }
        }
        if let Some(threshold) = self.cloud_coverage_threshold {
            if !(0.0..=100.0).contains(&threshold) {
                return invalid(format!(
                    "cloud_coverage_threshold {} outside [0, 100]",
                    threshold
                ));
            }
        }
        Ok(())
    }
}

/// A pass that qualified for a notification, addressed to the owner.
#[derive(Debug, Clone)]
pub struct NotificationEvent {
    pub location: WatchedLocation,
    pub pass: Overpass,
    pub recipient: String,
}

fn default_notify() -> bool {
    true
}

fn default_lead_time() -> u32 {
    DEFAULT_LEAD_TIME_HOURS
}

fn default_cloud_coverage_threshold() -> f64 {
    DEFAULT_CLOUD_COVERAGE_THRESHOLD
}
