use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

use super::api::error::ErrorResponse;
use super::api::locations::SubmitLocationResponse;
use super::api::overpasses::OverpassResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::locations::submit_location,
        super::api::locations::list_locations,
        super::api::locations::get_location,
        super::api::locations::delete_location,
        super::api::overpasses::list_overpasses,
        super::api::scheduler::status,
    ),
    components(
        schemas(
            SubmitLocationResponse,
            OverpassResponse,
            ErrorResponse,
            crate::oracle::Overpass,
            crate::scheduler::NewLocation,
            crate::scheduler::WatchedLocation,
            crate::scheduler::Owner,
            crate::scheduler::SchedulerStatus,
            crate::scheduler::SchedulerMode,
            crate::scheduler::TickReport,
            crate::scheduler::runner::TickSummary,
        )
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Landsat Alert API",
        description = "API for registering locations and querying Landsat overpass predictions",
        version = "0.1.0"
    ),
    tags(
        (name = "locations", description = "Watched locations"),
        (name = "overpasses", description = "Overpass predictions"),
        (name = "scheduler", description = "Notification scheduler")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}
