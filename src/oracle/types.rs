use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use strum_macros::Display;
use utoipa::ToSchema;

pub const OVERPASS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Satellite family the prediction service is queried for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Display)]
pub enum SatelliteFamily {
    #[default]
    #[serde(rename = "landsat_8_9")]
    #[strum(serialize = "landsat_8_9")]
    Landsat89,
    #[serde(rename = "landsat_9")]
    #[strum(serialize = "landsat_9")]
    Landsat9,
    #[serde(rename = "landsat_8")]
    #[strum(serialize = "landsat_8")]
    Landsat8,
}

/// A predicted overpass of a satellite over a coordinate (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ToSchema)]
#[schema(value_type = String, example = "2024-01-02 05:00:00")]
pub struct Overpass(DateTime<Utc>);

impl Overpass {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(at)
    }

    /// Parse the normalized `YYYY-MM-DD HH:MM:SS` form.
    #[cfg(test)]
    pub fn parse(s: &str) -> Option<Self> {
        chrono::NaiveDateTime::parse_from_str(s, OVERPASS_FORMAT)
            .ok()
            .map(|naive| Self(naive.and_utc()))
    }
}

impl fmt::Display for Overpass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(OVERPASS_FORMAT))
    }
}

impl Serialize for Overpass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Raw body returned by the acquisition-prediction service.
#[derive(Debug, Deserialize)]
pub(crate) struct AcquisitionResponse {
    pub results: Vec<AcquisitionRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AcquisitionRecord {
    pub acquisition_date: String,
}
