use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::features::categories::handlers;
use crate::features::categories::services::CategoryService;

/// Create public routes for reading categories
///
/// Authentication is optional; the caller's roles decide which leaf
/// categories are visible.
pub fn routes(service: Arc<CategoryService>) -> Router {
    Router::new()
        .route("/api/categories", get(handlers::list_categories))
        .route("/api/categories/full", get(handlers::list_full_categories))
        .route(
            "/api/categories/full/by-name/{name}",
            get(handlers::get_full_category_by_name),
        )
        .route("/api/categories/{id}", get(handlers::get_category))
        .route("/api/categories/{id}/full", get(handlers::get_full_category))
        .route(
            "/api/categories/{id}/has-children",
            get(handlers::has_children),
        )
        .with_state(service)
}

/// Create admin routes for category management (administrator only)
pub fn admin_routes(service: Arc<CategoryService>) -> Router {
    Router::new()
        .route("/api/admin/categories", post(handlers::create_category))
        .route(
            "/api/admin/categories/organize",
            post(handlers::organize_categories),
        )
        .route(
            "/api/admin/categories/{id}",
            put(handlers::update_category).delete(handlers::delete_category),
        )
        .with_state(service)
}
