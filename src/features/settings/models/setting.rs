use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Persisted key/value setting
#[derive(Debug, Clone, FromRow)]
pub struct Setting {
    pub key: String,
    pub value: serde_json::Value,
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}

impl Setting {
    /// Value as a flag; anything other than a JSON boolean reads as `None`
    pub fn as_bool(&self) -> Option<bool> {
        self.value.as_bool()
    }
}
