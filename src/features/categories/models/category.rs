use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for category
///
/// `allow_discussions = false` marks a parent (grouping) category; leaves hold
/// discussions. `sort` is one global order across the whole forest.
#[derive(Debug, Clone, FromRow)]
pub struct Category {
    pub id: i64,
    pub parent_category_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub allow_discussions: bool,
    pub sort: i32,
    pub count_discussions: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
impl Category {
    pub fn is_parent(&self) -> bool {
        !self.allow_discussions
    }
}

/// Leaf category joined with its parent's name
#[derive(Debug, Clone, FromRow)]
pub struct CategoryFull {
    pub id: i64,
    /// `"Parent • Child"`, or just the category name at the root
    pub name: String,
    pub description: Option<String>,
    pub count_discussions: i32,
}

/// Insert payload; `sort` is assigned by the service
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub allow_discussions: bool,
    pub sort: i32,
}

/// Fields a plain update may rewrite
#[derive(Debug, Clone)]
pub struct CategoryDetails {
    pub name: String,
    pub description: Option<String>,
}

/// Separator used when rendering a leaf's full name
pub const FULL_NAME_SEPARATOR: &str = " • ";

#[cfg(test)]
pub fn full_name(parent: Option<&str>, name: &str) -> String {
    match parent {
        Some(parent) => format!("{}{}{}", parent, FULL_NAME_SEPARATOR, name),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name_joins_parent_with_separator() {
        assert_eq!(
            full_name(Some("Community"), "General"),
            format!("Community{}General", FULL_NAME_SEPARATOR)
        );
        assert_eq!(full_name(Some("Community"), "General"), "Community • General");
        assert_eq!(full_name(None, "Lobby"), "Lobby");
    }
}
