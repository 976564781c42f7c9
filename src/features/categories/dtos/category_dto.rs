use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::features::categories::models::{Category, CategoryFull};
use crate::shared::validation::DISPLAY_NAME_REGEX;

/// Posted category fields.
///
/// A missing or non-positive `id` creates a category; otherwise the stored
/// category is updated. `allow_discussions` is required on create and ignored
/// on update: a category never changes between parent and leaf.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct SaveCategoryDto {
    #[serde(default)]
    pub id: Option<i64>,

    #[validate(
        length(min = 1, max = 255),
        regex(
            path = *DISPLAY_NAME_REGEX,
            message = "name must not start or end with whitespace or contain control characters"
        )
    )]
    pub name: String,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    pub allow_discussions: Option<bool>,
}

impl SaveCategoryDto {
    /// Id of the category being updated, if any
    pub fn existing_id(&self) -> Option<i64> {
        self.id.filter(|id| *id > 0)
    }
}

/// Request body for creating a category
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateCategoryDto {
    pub name: String,
    pub description: Option<String>,
    /// `false` creates a parent (grouping) category
    pub allow_discussions: Option<bool>,
}

impl From<CreateCategoryDto> for SaveCategoryDto {
    fn from(dto: CreateCategoryDto) -> Self {
        Self {
            id: None,
            name: dto.name,
            description: dto.description,
            allow_discussions: dto.allow_discussions,
        }
    }
}

/// Request body for updating a category
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateCategoryDto {
    pub name: String,
    pub description: Option<String>,
    /// Accepted for form compatibility; the stored value always wins
    pub allow_discussions: Option<bool>,
}

impl UpdateCategoryDto {
    pub fn into_save(self, id: i64) -> SaveCategoryDto {
        SaveCategoryDto {
            id: Some(id),
            name: self.name,
            description: self.description,
            allow_discussions: self.allow_discussions,
        }
    }
}

/// Query params for deleting a category
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct DeleteCategoryQuery {
    /// Category receiving the children and discussions; absent or 0 deletes them
    pub replacement_category_id: Option<i64>,
}

/// Query params for listing categories
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListCategoriesQuery {
    /// If true, return tree structure. Default: false (flat list)
    #[serde(default)]
    pub tree: bool,
}

/// Response DTO for category
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponseDto {
    pub id: i64,
    pub parent_category_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub allow_discussions: bool,
    pub sort: i32,
    pub count_discussions: i32,
}

impl From<Category> for CategoryResponseDto {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            parent_category_id: c.parent_category_id,
            name: c.name,
            description: c.description,
            allow_discussions: c.allow_discussions,
            sort: c.sort,
            count_discussions: c.count_discussions,
        }
    }
}

/// Leaf category with its parent-qualified name
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryFullDto {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub count_discussions: i32,
}

impl From<CategoryFull> for CategoryFullDto {
    fn from(c: CategoryFull) -> Self {
        Self {
            id: c.id,
            name: c.name,
            description: c.description,
            count_discussions: c.count_discussions,
        }
    }
}

/// Response DTO for category tree (hierarchical structure)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(no_recursion)]
pub struct CategoryTreeDto {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub allow_discussions: bool,
    pub sort: i32,
    pub count_discussions: i32,
    pub children: Vec<CategoryTreeDto>,
}

impl CategoryTreeDto {
    /// Build tree from a flat list of categories in sort order
    ///
    /// Rows whose parent is not in the list (filtered out, or dangling) are
    /// shown at the root.
    pub fn build_tree(categories: Vec<Category>) -> Vec<CategoryTreeDto> {
        let is_root = |c: &Category| match c.parent_category_id {
            None => true,
            Some(parent_id) => !categories.iter().any(|p| p.id == parent_id),
        };

        categories
            .iter()
            .filter(|c| is_root(c))
            .map(|root| Self::build_node(root, &categories))
            .collect()
    }

    fn build_node(category: &Category, all_categories: &[Category]) -> CategoryTreeDto {
        let children: Vec<CategoryTreeDto> = all_categories
            .iter()
            .filter(|c| c.parent_category_id == Some(category.id) && c.id != category.id)
            .map(|child| Self::build_node(child, all_categories))
            .collect();

        CategoryTreeDto {
            id: category.id,
            name: category.name.clone(),
            description: category.description.clone(),
            allow_discussions: category.allow_discussions,
            sort: category.sort,
            count_discussions: category.count_discussions,
            children,
        }
    }
}

/// Result of an organize pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrganizeReport {
    /// Categories read
    pub scanned: usize,
    /// Categories whose sort or parent was rewritten
    pub updated: usize,
    /// True when no parent category exists and nothing was rewritten
    pub flat: bool,
}

/// Result of deleting a category
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteOutcome {
    pub deleted_category_id: i64,
    pub replacement_category_id: Option<i64>,
    pub permissions_revoked: u64,
    pub children_reassigned: u64,
    pub discussions_reassigned: u64,
    pub discussions_deleted: u64,
    pub comments_deleted: u64,
    /// True when the last parent category was deleted and the forest flattened
    pub flattened: bool,
    pub remaining_categories: i64,
    /// More than one category remains; feeds the `categories.use` setting
    pub categories_in_use: bool,
    pub organize: OrganizeReport,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fake::faker::lorem::en::Word;
    use fake::Fake;

    fn category(id: i64, parent: Option<i64>, allow_discussions: bool, sort: i32) -> Category {
        let name: String = Word().fake();
        Category {
            id,
            parent_category_id: parent,
            name,
            description: None,
            allow_discussions,
            sort,
            count_discussions: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_save_dto_validates_name() {
        let valid = SaveCategoryDto {
            name: "General".to_string(),
            allow_discussions: Some(true),
            ..Default::default()
        };
        assert!(valid.validate().is_ok());

        let blank = SaveCategoryDto {
            name: String::new(),
            ..Default::default()
        };
        let errors = blank.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));

        let padded = SaveCategoryDto {
            name: " General".to_string(),
            ..Default::default()
        };
        assert!(padded.validate().is_err());
    }

    #[test]
    fn test_save_dto_limits_description() {
        let dto = SaveCategoryDto {
            name: "General".to_string(),
            description: Some("x".repeat(1001)),
            ..Default::default()
        };
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("description"));
    }

    #[test]
    fn test_existing_id_ignores_non_positive_ids() {
        let mut dto = SaveCategoryDto::default();
        assert_eq!(dto.existing_id(), None);
        dto.id = Some(0);
        assert_eq!(dto.existing_id(), None);
        dto.id = Some(-4);
        assert_eq!(dto.existing_id(), None);
        dto.id = Some(9);
        assert_eq!(dto.existing_id(), Some(9));
    }

    #[test]
    fn test_build_tree_nests_leaves_under_parents() {
        let categories = vec![
            category(1, None, false, 1),
            category(2, Some(1), true, 2),
            category(3, None, false, 3),
            category(4, Some(3), true, 4),
            category(5, Some(3), true, 5),
        ];

        let tree = CategoryTreeDto::build_tree(categories);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].id, 1);
        assert_eq!(
            tree[0].children.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![2]
        );
        assert_eq!(
            tree[1].children.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![4, 5]
        );
    }

    #[test]
    fn test_build_tree_surfaces_leaves_with_hidden_parent() {
        let categories = vec![category(2, Some(1), true, 2)];
        let tree = CategoryTreeDto::build_tree(categories);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].id, 2);
    }
}
