//! Decides which predicted pass, if any, a location should be alerted about.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::oracle::{Overpass, OverpassOracle};
use crate::scheduler::WatchedLocation;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("lead time of {0}h moves the scan window out of the supported date range")]
    WindowOutOfRange(u32),
}

/// Half-open window `[start, end)` the oracle is queried for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ScanWindow {
    /// The window starts one lead time after `now` and spans one day.
    ///
    /// `None` when either bound falls outside the representable range.
    pub fn for_lead_time(lead_time: Duration, now: DateTime<Utc>) -> Option<Self> {
        let start = now.checked_add_signed(lead_time)?;
        let end = start.checked_add_signed(Duration::days(1))?;
        Some(Self { start, end })
    }
}

pub struct PolicyEngine {
    oracle: Arc<dyn OverpassOracle>,
}

impl PolicyEngine {
    pub fn new(oracle: Arc<dyn OverpassOracle>) -> Self {
        Self { oracle }
    }

    pub fn scan_window(
        location: &WatchedLocation,
        now: DateTime<Utc>,
    ) -> Result<ScanWindow, PolicyError> {
        ScanWindow::for_lead_time(location.lead_time(), now)
            .ok_or(PolicyError::WindowOutOfRange(location.notification_lead_time))
    }

    /// Picks the pass that should trigger a notification for `location`.
    ///
    /// The oracle is asked for the calendar days the scan window touches and
    /// the earliest pass it returns wins. Passes are not clipped to the
    /// window, so a pass earlier on the start day can be chosen. An oracle
    /// failure is logged and treated as no pass.
    ///
    /// Only the pass is returned; the caller resolves the recipient and builds
    /// the [`NotificationEvent`](crate::scheduler::NotificationEvent).
    pub async fn evaluate(
        &self,
        location: &WatchedLocation,
        now: DateTime<Utc>,
    ) -> Result<Option<Overpass>, PolicyError> {
        let window = Self::scan_window(location, now)?;
        let passes = match self
            .oracle
            .try_fetch(location.latitude, location.longitude, window.start, window.end)
            .await
        {
            Ok(passes) => passes,
            Err(e) => {
                log::warn!(
                    "Location {}: no prediction for ({}, {}): {}",
                    location.id,
                    location.latitude,
                    location.longitude,
                    e
                );
                return Ok(None);
            }
        };

        let next = passes.into_iter().min();
        match next {
            Some(pass) => log::debug!("Location {} next pass at {}", location.id, pass),
            None => log::debug!(
                "Location {} has no pass between {} and {}",
                location.id,
                window.start,
                window.end
            ),
        }
        Ok(next)
    }
}
