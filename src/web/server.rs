use axum::{routing::get, routing::post, Router};
use std::future::Future;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::api::locations as location_handlers;
use super::api::overpasses as overpass_handlers;
use super::api::scheduler as scheduler_handlers;
use super::api_doc::ApiDoc;
use super::AppState;

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Location API endpoints
        .route(
            "/api/locations",
            post(location_handlers::submit_location).get(location_handlers::list_locations),
        )
        .route(
            "/api/locations/{id}",
            get(location_handlers::get_location).delete(location_handlers::delete_location),
        )
        // Prediction API endpoints
        .route("/api/overpasses", get(overpass_handlers::list_overpasses))
        // Scheduler API endpoints
        .route("/api/scheduler/status", get(scheduler_handlers::status))
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(
    bind_addr: &str,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let app = build_router(state);

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}
