use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::Permission;
use crate::oracle::Overpass;
use crate::scheduler::{NewLocation, WatchedLocation};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::auth::AuthenticatedUser;
use crate::web::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitLocationResponse {
    pub message: String,
    pub location: WatchedLocation,
    /// Upcoming passes over the configured lookahead; empty if the
    /// prediction service was unavailable.
    pub overpasses: Vec<Overpass>,
}

#[utoipa::path(
    post,
    path = "/api/locations",
    tag = "locations",
    request_body = NewLocation,
    responses(
        (status = 201, description = "Location saved", body = SubmitLocationResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Missing or invalid API key"),
        (status = 403, description = "Insufficient permissions")
    ),
    security(("api_key" = []))
)]
pub async fn submit_location(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<NewLocation>,
) -> ApiResult<impl IntoResponse> {
    user.require(Permission::SubmitLocation)?;

    let now = Utc::now();
    let end = now
        .checked_add_signed(Duration::days(i64::from(state.config.oracle.lookahead_days)))
        .ok_or_else(|| ApiError::Validation("lookahead out of range".into()))?;

    let location = state.store.submit_location(request, user.owner.clone())?;
    log::info!("User {} saved location {} ({})", user.name, location.id, location.name);
    let overpasses = state
        .oracle
        .fetch_overpasses(location.latitude, location.longitude, now, end)
        .await;

    Ok((
        StatusCode::CREATED,
        Json(SubmitLocationResponse {
            message: format!("Saved location: {}", location.name),
            location,
            overpasses,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/locations",
    tag = "locations",
    responses(
        (status = 200, description = "Locations owned by the caller", body = Vec<WatchedLocation>),
        (status = 401, description = "Missing or invalid API key"),
        (status = 403, description = "Insufficient permissions")
    ),
    security(("api_key" = []))
)]
pub async fn list_locations(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<impl IntoResponse> {
    user.require(Permission::ListLocations)?;

    let locations = state.store.list_owned(&user.owner)?;
    Ok((StatusCode::OK, Json(locations)))
}

#[utoipa::path(
    get,
    path = "/api/locations/{id}",
    tag = "locations",
    params(
        ("id" = Uuid, Path, description = "Location ID")
    ),
    responses(
        (status = 200, description = "Location details", body = WatchedLocation),
        (status = 401, description = "Missing or invalid API key"),
        (status = 403, description = "Insufficient permissions"),
        (status = 404, description = "Location not found", body = ErrorResponse)
    ),
    security(("api_key" = []))
)]
pub async fn get_location(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    user.require(Permission::ListLocations)?;

    let location = user.owned_location(&state.store, id)?;
    Ok((StatusCode::OK, Json(location)))
}

#[utoipa::path(
    delete,
    path = "/api/locations/{id}",
    tag = "locations",
    params(
        ("id" = Uuid, Path, description = "Location ID")
    ),
    responses(
        (status = 204, description = "Location deleted"),
        (status = 401, description = "Missing or invalid API key"),
        (status = 403, description = "Insufficient permissions"),
        (status = 404, description = "Location not found", body = ErrorResponse)
    ),
    security(("api_key" = []))
)]
pub async fn delete_location(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    user.require(Permission::SubmitLocation)?;

    user.owned_location(&state.store, id)?;
    state.store.delete_location(id)?;
    Ok(StatusCode::NO_CONTENT)
}
