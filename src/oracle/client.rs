use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::oracle::error::OracleError;
use crate::oracle::types::{AcquisitionResponse, Overpass, SatelliteFamily};

const QUERY_DATE_FORMAT: &str = "%Y-%m-%d";

/// Source of overpass predictions for a coordinate and date window.
#[async_trait]
pub trait OverpassOracle: Send + Sync {
    /// Fetch predicted passes, surfacing every failure to the caller.
    async fn try_fetch(
        &self,
        latitude: f64,
        longitude: f64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Overpass>, OracleError>;

    /// Fetch predicted passes in ascending order. Failures are logged and
    /// reported as an empty sequence.
    async fn fetch_overpasses(
        &self,
        latitude: f64,
        longitude: f64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<Overpass> {
        match self.try_fetch(latitude, longitude, start, end).await {
            Ok(passes) => passes,
            Err(e) => {
                log::warn!(
                    "Failed to fetch overpasses for ({}, {}): {}",
                    latitude,
                    longitude,
                    e
                );
                Vec::new()
            }
        }
    }
}

/// Client for the USGS Landsat acquisition API.
pub struct UsgsOracle {
    client: reqwest::Client,
    url: String,
    satellite: SatelliteFamily,
}

impl UsgsOracle {
    pub fn new(
        url: impl Into<String>,
        satellite: SatelliteFamily,
        timeout: Duration,
    ) -> Result<Self, OracleError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            satellite,
        })
    }

    fn query(
        &self,
        latitude: f64,
        longitude: f64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<(&'static str, String)> {
        vec![
            ("start_date", start.format(QUERY_DATE_FORMAT).to_string()),
            ("end_date", end.format(QUERY_DATE_FORMAT).to_string()),
            ("lat", latitude.to_string()),
            ("lng", longitude.to_string()),
            ("satellite", self.satellite.to_string()),
        ]
    }
}

#[async_trait]
impl OverpassOracle for UsgsOracle {
    async fn try_fetch(
        &self,
        latitude: f64,
        longitude: f64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Overpass>, OracleError> {
        log::debug!(
            "Querying {} for ({}, {}) between {} and {}",
            self.url,
            latitude,
            longitude,
            start,
            end
        );

        let response = self
            .client
            .get(&self.url)
            .query(&self.query(latitude, longitude, start, end))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(OracleError::Status(status));
        }

        let body = response.text().await?;
        parse_acquisitions(&body)
    }
}

/// Parse an acquisition response body into passes sorted ascending.
fn parse_acquisitions(body: &str) -> Result<Vec<Overpass>, OracleError> {
    let response: AcquisitionResponse =
        serde_json::from_str(body).map_err(|e| OracleError::Malformed(e.to_string()))?;

    let mut passes = response
        .results
        .iter()
        .map(|record| {
            DateTime::parse_from_rfc3339(&record.acquisition_date)
                .map(|dt| Overpass::new(dt.with_timezone(&Utc)))
                .map_err(|e| {
                    OracleError::Malformed(format!(
                        "acquisition_date {:?}: {}",
                        record.acquisition_date, e
                    ))
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    passes.sort();
    Ok(passes)
}
