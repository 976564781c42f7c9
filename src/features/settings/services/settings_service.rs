use sqlx::PgPool;

use crate::core::error::{AppError, Result};
use crate::features::settings::models::Setting;

/// Service for reading and writing forum settings
pub struct SettingsService {
    pool: PgPool,
}

impl SettingsService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get all settings
    pub async fn list_all(&self) -> Result<Vec<Setting>> {
        let settings = sqlx::query_as!(
            Setting,
            r#"
            SELECT key, value, description, updated_at, updated_by
            FROM settings
            ORDER BY key
            "#
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list settings: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(settings)
    }

    /// Get a setting by key
    pub async fn get(&self, key: &str) -> Result<Setting> {
        let setting = sqlx::query_as!(
            Setting,
            r#"
            SELECT key, value, description, updated_at, updated_by
            FROM settings
            WHERE key = $1
            "#,
            key
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get setting: {:?}", e);
            AppError::Database(e)
        })?;

        setting.ok_or_else(|| AppError::NotFound(format!("Setting '{}' not found", key)))
    }

    /// Get a boolean setting, falling back to `default` when absent or not a boolean
    pub async fn get_bool(&self, key: &str, default: bool) -> Result<bool> {
        match self.get(key).await {
            Ok(setting) => Ok(setting.as_bool().unwrap_or(default)),
            Err(AppError::NotFound(_)) => Ok(default),
            Err(e) => Err(e),
        }
    }

    /// Store a boolean setting, creating it if needed
    pub async fn set_bool(&self, key: &str, value: bool, updated_by: &str) -> Result<Setting> {
        let setting = sqlx::query_as!(
            Setting,
            r#"
            INSERT INTO settings (key, value, updated_at, updated_by)
            VALUES ($1, $2, NOW(), $3)
            ON CONFLICT (key) DO UPDATE
            SET value = EXCLUDED.value, updated_at = NOW(), updated_by = EXCLUDED.updated_by
            RETURNING key, value, description, updated_at, updated_by
            "#,
            key,
            serde_json::Value::Bool(value),
            updated_by
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update setting: {:?}", e);
            AppError::Database(e)
        })?;

        tracing::debug!("Setting {} = {} (by {})", key, value, updated_by);

        Ok(setting)
    }
}
