use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::config::Permission;
use crate::oracle::Overpass;
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::auth::AuthenticatedUser;
use crate::web::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct OverpassQuery {
    pub lat: f64,
    pub lng: f64,
    #[serde(default, deserialize_with = "deserialize_option_datetime")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_option_datetime")]
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OverpassResponse {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub overpasses: Vec<Overpass>,
}

#[utoipa::path(
    get,
    path = "/api/overpasses",
    tag = "overpasses",
    params(
        ("lat" = f64, Query, description = "Latitude in degrees"),
        ("lng" = f64, Query, description = "Longitude in degrees"),
        ("start" = Option<String>, Query, description = "Window start (RFC3339), defaults to now"),
        ("end" = Option<String>, Query, description = "Window end (RFC3339), defaults to start plus the lookahead")
    ),
    responses(
        (status = 200, description = "Predicted passes", body = OverpassResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 401, description = "Missing or invalid API key"),
        (status = 403, description = "Insufficient permissions"),
        (status = 502, description = "Prediction service failed", body = ErrorResponse)
    ),
    security(("api_key" = []))
)]
pub async fn list_overpasses(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<OverpassQuery>,
) -> ApiResult<impl IntoResponse> {
    user.require(Permission::FetchOverpasses)?;

    if !(-90.0..=90.0).contains(&query.lat) || !(-180.0..=180.0).contains(&query.lng) {
        return Err(ApiError::Validation("coordinates out of range".into()));
    }

    let start = query.start.unwrap_or_else(Utc::now);
    let end = match query.end {
        Some(end) => end,
        None => start
            .checked_add_signed(Duration::days(i64::from(state.config.oracle.lookahead_days)))
            .ok_or_else(|| ApiError::Validation("start too far in the future".into()))?,
    };
    if start > end {
        return Err(ApiError::Validation("start must not be after end".into()));
    }

    let overpasses = state
        .oracle
        .try_fetch(query.lat, query.lng, start, end)
        .await?;

    Ok((
        StatusCode::OK,
        Json(OverpassResponse {
            start,
            end,
            overpasses,
        }),
    ))
}

fn deserialize_option_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    match value {
        Some(raw) => DateTime::parse_from_rfc3339(&raw)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}
