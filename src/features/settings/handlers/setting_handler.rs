use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::auth::guards::RequireAdministrator;
use crate::features::settings::dtos::{SettingResponseDto, UpdateSettingDto};
use crate::features::settings::services::SettingsService;
use crate::shared::types::ApiResponse;

/// List all settings
#[utoipa::path(
    get,
    path = "/api/admin/settings",
    responses(
        (status = 200, description = "List of settings", body = ApiResponse<Vec<SettingResponseDto>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Administrator access required")
    ),
    tag = "settings",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_settings(
    RequireAdministrator(_user): RequireAdministrator,
    State(service): State<Arc<SettingsService>>,
) -> Result<Json<ApiResponse<Vec<SettingResponseDto>>>> {
    let settings = service.list_all().await?;
    let response: Vec<SettingResponseDto> = settings.into_iter().map(|s| s.into()).collect();

    Ok(Json(ApiResponse::success(Some(response), None, None)))
}

/// Get a setting by key
#[utoipa::path(
    get,
    path = "/api/admin/settings/{key}",
    params(
        ("key" = String, Path, description = "Setting key")
    ),
    responses(
        (status = 200, description = "Setting", body = ApiResponse<SettingResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Administrator access required"),
        (status = 404, description = "Setting not found")
    ),
    tag = "settings",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_setting(
    RequireAdministrator(_user): RequireAdministrator,
    State(service): State<Arc<SettingsService>>,
    Path(key): Path<String>,
) -> Result<Json<ApiResponse<SettingResponseDto>>> {
    let setting = service.get(&key).await?;

    Ok(Json(ApiResponse::success(Some(setting.into()), None, None)))
}

/// Update a boolean setting
#[utoipa::path(
    put,
    path = "/api/admin/settings/{key}",
    params(
        ("key" = String, Path, description = "Setting key")
    ),
    request_body = UpdateSettingDto,
    responses(
        (status = 200, description = "Updated setting", body = ApiResponse<SettingResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Administrator access required"),
        (status = 404, description = "Setting not found")
    ),
    tag = "settings",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_setting(
    RequireAdministrator(user): RequireAdministrator,
    State(service): State<Arc<SettingsService>>,
    Path(key): Path<String>,
    AppJson(dto): AppJson<UpdateSettingDto>,
) -> Result<Json<ApiResponse<SettingResponseDto>>> {
    // Only seeded settings can be changed
    service.get(&key).await?;
    let setting = service.set_bool(&key, dto.value, &user.user_id).await?;

    tracing::info!("Setting '{}' updated to {} by {}", key, dto.value, user.user_id);

    Ok(Json(ApiResponse::success(Some(setting.into()), None, None)))
}
