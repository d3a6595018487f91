use axum::{extract::FromRequestParts, http::request::Parts};
use std::collections::HashSet;
use uuid::Uuid;

use crate::config::Permission;
use crate::scheduler::{FileLocationStore, Owner, WatchedLocation};
use crate::web::api::error::{ApiError, ApiResult};
use crate::web::AppState;

/// The caller behind a valid API key, with the owner identity their
/// locations are stored under.
#[derive(Clone)]
pub struct AuthenticatedUser {
    pub name: String,
    pub owner: Owner,
    permissions: HashSet<Permission>,
}

impl AuthenticatedUser {
    pub fn require(&self, permission: Permission) -> ApiResult<()> {
        if self.permissions.contains(&permission) {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }

    /// Loads a location the caller owns. Other users' locations are
    /// reported as missing.
    pub fn owned_location(
        &self,
        store: &FileLocationStore,
        id: Uuid,
    ) -> ApiResult<WatchedLocation> {
        let location = store.get_location(id)?;
        if location.owner != self.owner {
            return Err(ApiError::NotFound);
        }
        Ok(location)
    }
}

fn bearer_key(parts: &Parts) -> ApiResult<&str> {
    let header = parts
        .headers
        .get("Authorization")
        .ok_or(ApiError::Unauthorized("Missing Authorization header"))?;
    header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized("Invalid Authorization format"))
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let key = bearer_key(parts)?;
        let user = state
            .config
            .find_user(key)
            .ok_or(ApiError::Unauthorized("Invalid API key"))?;

        Ok(AuthenticatedUser {
            name: user.name.clone(),
            owner: Owner::User(user.name.clone()),
            permissions: user.permissions.clone(),
        })
    }
}
