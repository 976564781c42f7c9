use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::auth::guards::RequireAdministrator;
use crate::features::auth::ViewScope;
use crate::features::categories::dtos::{
    CategoryResponseDto, CreateCategoryDto, DeleteCategoryQuery, DeleteOutcome, OrganizeReport,
    UpdateCategoryDto,
};
use crate::features::categories::services::CategoryService;
use crate::shared::types::ApiResponse;

/// Create a category (administrator only)
///
/// `allow_discussions = false` creates a parent category that adopts every
/// leaf without a parent. The forest is organized afterwards.
#[utoipa::path(
    post,
    path = "/api/admin/categories",
    request_body = CreateCategoryDto,
    responses(
        (status = 201, description = "Category created", body = ApiResponse<CategoryResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Administrator access required")
    ),
    tag = "admin-categories",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_category(
    RequireAdministrator(user): RequireAdministrator,
    State(service): State<Arc<CategoryService>>,
    AppJson(dto): AppJson<CreateCategoryDto>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryResponseDto>>)> {
    let id = service.save(dto.into()).await?;
    let category = service.get_by_id(&ViewScope::Unrestricted, id).await?;

    tracing::info!("Category {} created by {}", id, user.user_id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(category),
            Some("Category created".to_string()),
            None,
        )),
    ))
}

/// Update a category's name and description (administrator only)
#[utoipa::path(
    put,
    path = "/api/admin/categories/{id}",
    params(
        ("id" = i64, Path, description = "Category ID")
    ),
    request_body = UpdateCategoryDto,
    responses(
        (status = 200, description = "Category updated", body = ApiResponse<CategoryResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Administrator access required"),
        (status = 404, description = "Category not found")
    ),
    tag = "admin-categories",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_category(
    RequireAdministrator(_user): RequireAdministrator,
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<i64>,
    AppJson(dto): AppJson<UpdateCategoryDto>,
) -> Result<Json<ApiResponse<CategoryResponseDto>>> {
    let id = service.save(dto.into_save(id)).await?;
    let category = service.get_by_id(&ViewScope::Unrestricted, id).await?;

    Ok(Json(ApiResponse::success(
        Some(category),
        Some("Category updated".to_string()),
        None,
    )))
}

/// Delete a category (administrator only)
///
/// With `replacement_category_id`, child categories and discussions move to
/// the replacement. Without it, the category's discussions and their comments
/// are deleted. The `categories.use` setting is updated in the same
/// transaction.
#[utoipa::path(
    delete,
    path = "/api/admin/categories/{id}",
    params(
        ("id" = i64, Path, description = "Category ID"),
        DeleteCategoryQuery
    ),
    responses(
        (status = 200, description = "Category deleted", body = ApiResponse<DeleteOutcome>),
        (status = 400, description = "Invalid category or replacement"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Administrator access required"),
        (status = 404, description = "Category not found")
    ),
    tag = "admin-categories",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_category(
    RequireAdministrator(user): RequireAdministrator,
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<i64>,
    Query(query): Query<DeleteCategoryQuery>,
) -> Result<Json<ApiResponse<DeleteOutcome>>> {
    let outcome = service
        .delete_by_id(id, query.replacement_category_id, &user.user_id)
        .await?;

    tracing::info!(
        "Category {} deleted by {} (categories in use: {})",
        id,
        user.user_id,
        outcome.categories_in_use
    );

    Ok(Json(ApiResponse::success(
        Some(outcome),
        Some("Category deleted".to_string()),
        None,
    )))
}

/// Re-run the organize pass over all categories (administrator only)
#[utoipa::path(
    post,
    path = "/api/admin/categories/organize",
    responses(
        (status = 200, description = "Categories organized", body = ApiResponse<OrganizeReport>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Administrator access required")
    ),
    tag = "admin-categories",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn organize_categories(
    RequireAdministrator(_user): RequireAdministrator,
    State(service): State<Arc<CategoryService>>,
) -> Result<Json<ApiResponse<OrganizeReport>>> {
    let report = service.organize().await?;
    Ok(Json(ApiResponse::success(Some(report), None, None)))
}
