use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::core::error::{AppError, Result};
use crate::core::extractor::Viewer;
use crate::features::categories::dtos::{
    CategoryFullDto, CategoryResponseDto, CategoryTreeDto, ListCategoriesQuery,
};
use crate::features::categories::services::CategoryService;
use crate::shared::types::{ApiResponse, Meta};

/// List categories the caller may view
///
/// Returns viewable categories plus every parent category, in display order,
/// as a flat list or a tree based on the `tree` query param.
#[utoipa::path(
    get,
    path = "/api/categories",
    params(ListCategoriesQuery),
    responses(
        (status = 200, description = "List of categories", body = ApiResponse<Vec<CategoryResponseDto>>),
    ),
    tag = "categories"
)]
pub async fn list_categories(
    viewer: Viewer,
    State(service): State<Arc<CategoryService>>,
    Query(query): Query<ListCategoriesQuery>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    let scope = viewer.scope();
    let serialized = if query.tree {
        let tree: Vec<CategoryTreeDto> = service.get_tree(&scope).await?;
        serde_json::to_value(tree)
    } else {
        let categories = service.get(&scope).await?;
        serde_json::to_value(categories)
    };
    let value = serialized
        .map_err(|e| AppError::Internal(format!("Failed to serialize categories: {}", e)))?;

    Ok(Json(ApiResponse::success(Some(value), None, None)))
}

/// List viewable leaf categories with parent-qualified names
#[utoipa::path(
    get,
    path = "/api/categories/full",
    responses(
        (status = 200, description = "List of leaf categories", body = ApiResponse<Vec<CategoryFullDto>>),
    ),
    tag = "categories"
)]
pub async fn list_full_categories(
    viewer: Viewer,
    State(service): State<Arc<CategoryService>>,
) -> Result<Json<ApiResponse<Vec<CategoryFullDto>>>> {
    let categories = service.get_full(&viewer.scope()).await?;
    let meta = Meta {
        total: categories.len() as i64,
    };

    Ok(Json(ApiResponse::success(Some(categories), None, Some(meta))))
}

/// Get a viewable leaf category by its own name
#[utoipa::path(
    get,
    path = "/api/categories/full/by-name/{name}",
    params(
        ("name" = String, Path, description = "Category name, without the parent prefix")
    ),
    responses(
        (status = 200, description = "Category found", body = ApiResponse<CategoryFullDto>),
        (status = 404, description = "Category not found")
    ),
    tag = "categories"
)]
pub async fn get_full_category_by_name(
    viewer: Viewer,
    State(service): State<Arc<CategoryService>>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<CategoryFullDto>>> {
    let category = service.get_full_by_name(&viewer.scope(), &name).await?;
    Ok(Json(ApiResponse::success(Some(category), None, None)))
}

/// Get a parent category, or a leaf the caller may view, by ID
#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    params(
        ("id" = i64, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category found", body = ApiResponse<CategoryResponseDto>),
        (status = 404, description = "Category not found or not viewable")
    ),
    tag = "categories"
)]
pub async fn get_category(
    viewer: Viewer,
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<CategoryResponseDto>>> {
    let category = service.get_by_id(&viewer.scope(), id).await?;
    Ok(Json(ApiResponse::success(Some(category), None, None)))
}

/// Get a viewable leaf category by ID with its parent-qualified name
#[utoipa::path(
    get,
    path = "/api/categories/{id}/full",
    params(
        ("id" = i64, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category found", body = ApiResponse<CategoryFullDto>),
        (status = 404, description = "Category not found or not viewable")
    ),
    tag = "categories"
)]
pub async fn get_full_category(
    viewer: Viewer,
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<CategoryFullDto>>> {
    let category = service.get_full_by_id(&viewer.scope(), id).await?;
    Ok(Json(ApiResponse::success(Some(category), None, None)))
}

/// Whether any category uses this one as its parent
#[utoipa::path(
    get,
    path = "/api/categories/{id}/has-children",
    params(
        ("id" = i64, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Child check result", body = ApiResponse<bool>),
        (status = 404, description = "Category not found or not viewable")
    ),
    tag = "categories"
)]
pub async fn has_children(
    viewer: Viewer,
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<bool>>> {
    let has_children = service.has_children(&viewer.scope(), id).await?;
    Ok(Json(ApiResponse::success(Some(has_children), None, None)))
}
