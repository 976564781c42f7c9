use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::auth;
use crate::features::categories::{dtos as categories_dtos, handlers as categories_handlers};
use crate::features::settings::{dtos as settings_dtos, handlers as settings_handlers};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Categories (public, optional auth)
        categories_handlers::category_handler::list_categories,
        categories_handlers::category_handler::list_full_categories,
        categories_handlers::category_handler::get_full_category_by_name,
        categories_handlers::category_handler::get_category,
        categories_handlers::category_handler::get_full_category,
        categories_handlers::category_handler::has_children,
        // Categories (administrator)
        categories_handlers::admin_category_handler::create_category,
        categories_handlers::admin_category_handler::update_category,
        categories_handlers::admin_category_handler::delete_category,
        categories_handlers::admin_category_handler::organize_categories,
        // Settings (administrator)
        settings_handlers::setting_handler::list_settings,
        settings_handlers::setting_handler::get_setting,
        settings_handlers::setting_handler::update_setting,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Auth
            auth::model::AuthenticatedUser,
            // Categories
            categories_dtos::CategoryResponseDto,
            categories_dtos::CategoryTreeDto,
            categories_dtos::CategoryFullDto,
            categories_dtos::CreateCategoryDto,
            categories_dtos::UpdateCategoryDto,
            categories_dtos::OrganizeReport,
            categories_dtos::DeleteOutcome,
            ApiResponse<Vec<categories_dtos::CategoryResponseDto>>,
            ApiResponse<categories_dtos::CategoryResponseDto>,
            ApiResponse<Vec<categories_dtos::CategoryFullDto>>,
            ApiResponse<categories_dtos::CategoryFullDto>,
            ApiResponse<categories_dtos::OrganizeReport>,
            ApiResponse<categories_dtos::DeleteOutcome>,
            ApiResponse<bool>,
            // Settings
            settings_dtos::SettingResponseDto,
            settings_dtos::UpdateSettingDto,
            ApiResponse<Vec<settings_dtos::SettingResponseDto>>,
            ApiResponse<settings_dtos::SettingResponseDto>,
        )
    ),
    tags(
        (name = "categories", description = "Forum categories visible to the caller"),
        (name = "admin-categories", description = "Category tree management (administrator only)"),
        (name = "settings", description = "Forum settings (administrator only)"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Forum Core API",
        version = "0.1.0",
        description = "API documentation for the forum category service",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
