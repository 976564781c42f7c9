use std::sync::Arc;

use axum::{routing::get, Router};

use super::handlers::{get_setting, list_settings, update_setting};
use super::services::SettingsService;

/// Create admin routes for forum settings (administrator only)
pub fn admin_routes(service: Arc<SettingsService>) -> Router {
    Router::new()
        .route("/api/admin/settings", get(list_settings))
        .route("/api/admin/settings/{key}", get(get_setting).put(update_setting))
        .with_state(service)
}
