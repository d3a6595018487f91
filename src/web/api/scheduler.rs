use axum::{extract::State, Json};

use crate::scheduler::SchedulerStatus;
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::auth::AuthenticatedUser;
use crate::web::AppState;

#[utoipa::path(
    get,
    path = "/api/scheduler/status",
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Scheduler mode and last tick", body = SchedulerStatus),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "scheduler"
)]
pub async fn status(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> ApiResult<Json<SchedulerStatus>> {
    let scheduler = state.scheduler.lock().await;
    Ok(Json(scheduler.status()))
}
