//! Role-based authorization guards.
//!
//! Guards extract the authenticated user inserted by the auth middleware and
//! verify the required role. Category reads do not use guards; they derive a
//! [`ViewScope`](super::model::ViewScope) from the optional viewer instead.

use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;
use axum::{extract::FromRequestParts, http::request::Parts};

/// Guard for forum administration (category structure, settings).
///
/// # Example
/// ```ignore
/// pub async fn handler(RequireAdministrator(user): RequireAdministrator) { ... }
/// ```
pub struct RequireAdministrator(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireAdministrator
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))?;

        if !user.is_administrator() {
            return Err(AppError::Forbidden(
                "Administrator access required".to_string(),
            ));
        }

        Ok(RequireAdministrator(user.clone()))
    }
}
