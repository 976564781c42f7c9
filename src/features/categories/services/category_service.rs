use std::borrow::Cow;

use validator::{Validate, ValidationError, ValidationErrors};

use crate::core::error::{AppError, Result};
use crate::features::auth::ViewScope;
use crate::features::categories::dtos::{
    CategoryFullDto, CategoryResponseDto, CategoryTreeDto, DeleteOutcome, OrganizeReport,
    SaveCategoryDto,
};
use crate::features::categories::models::{Category, CategoryDetails, NewCategory};
use crate::features::categories::repositories::{
    CategoryRepository, CategoryTx, PgCategoryRepository,
};
use crate::features::categories::tree::{self, SortedNodes, TreeNode};
use crate::shared::validation::field_errors;

/// Service maintaining the category forest
pub struct CategoryService<R: CategoryRepository = PgCategoryRepository> {
    repo: R,
}

impl<R: CategoryRepository> CategoryService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// A parent category, or a leaf the scope may view
    pub async fn get_by_id(&self, scope: &ViewScope, id: i64) -> Result<CategoryResponseDto> {
        self.repo
            .find_visible_by_id(scope, id)
            .await?
            .map(CategoryResponseDto::from)
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))
    }

    /// Viewable categories plus all parent categories, in sort order
    pub async fn get(&self, scope: &ViewScope) -> Result<Vec<CategoryResponseDto>> {
        let categories = self.repo.list_visible(scope).await?;
        Ok(categories.into_iter().map(CategoryResponseDto::from).collect())
    }

    pub async fn get_tree(&self, scope: &ViewScope) -> Result<Vec<CategoryTreeDto>> {
        let categories = self.repo.list_visible(scope).await?;
        Ok(CategoryTreeDto::build_tree(categories))
    }

    pub async fn get_full(&self, scope: &ViewScope) -> Result<Vec<CategoryFullDto>> {
        let categories = self.repo.list_full(scope).await?;
        Ok(categories.into_iter().map(CategoryFullDto::from).collect())
    }

    pub async fn get_full_by_id(&self, scope: &ViewScope, id: i64) -> Result<CategoryFullDto> {
        self.repo
            .find_full_by_id(scope, id)
            .await?
            .map(CategoryFullDto::from)
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))
    }

    pub async fn get_full_by_name(&self, scope: &ViewScope, name: &str) -> Result<CategoryFullDto> {
        self.repo
            .find_full_by_name(scope, name)
            .await?
            .map(CategoryFullDto::from)
            .ok_or_else(|| AppError::NotFound(format!("Category '{}' not found", name)))
    }

    /// Hidden categories are reported as missing, like [`get_by_id`](Self::get_by_id)
    pub async fn has_children(&self, scope: &ViewScope, id: i64) -> Result<bool> {
        if self.repo.find_visible_by_id(scope, id).await?.is_none() {
            return Err(AppError::NotFound(format!("Category {} not found", id)));
        }
        self.repo.has_children(id).await
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Create or update a category and return its id.
    ///
    /// Validation failures are reported before anything is written.
    pub async fn save(&self, dto: SaveCategoryDto) -> Result<i64> {
        Self::validate(&dto)?;

        match dto.existing_id() {
            Some(id) => self.update(id, dto).await,
            None => self.insert(dto).await,
        }
    }

    fn validate(dto: &SaveCategoryDto) -> Result<()> {
        let mut errors = match dto.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };

        if dto.existing_id().is_none() && dto.allow_discussions.is_none() {
            errors.add(
                "allow_discussions",
                ValidationError::new("required")
                    .with_message(Cow::from("allow_discussions is required")),
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::InvalidFields(field_errors(&errors)))
        }
    }

    async fn insert(&self, dto: SaveCategoryDto) -> Result<i64> {
        let allow_discussions = dto.allow_discussions.unwrap_or(false);
        let mut tx = self.repo.begin().await?;

        // New categories go to the end of the order
        let sort = tx.max_sort().await?.map_or(1, |max| max + 1);
        let category = tx
            .insert(&NewCategory {
                name: dto.name,
                description: dto.description,
                allow_discussions,
                sort,
            })
            .await?;

        if allow_discussions {
            if let Some(parent) = tx.last_parent().await? {
                tx.set_parent(category.id, Some(parent.id)).await?;
            }
        } else {
            let adopted = tx.adopt_unparented_leaves(category.id).await?;
            tracing::debug!(
                "Parent category {} adopted {} unparented categories",
                category.id,
                adopted
            );
        }

        let report = Self::organize_in(&mut tx).await?;
        tx.commit().await?;

        tracing::info!(
            "Created category: {} (allow_discussions: {}, organized: {})",
            category.id,
            allow_discussions,
            report.updated
        );

        Ok(category.id)
    }

    async fn update(&self, id: i64, dto: SaveCategoryDto) -> Result<i64> {
        let mut tx = self.repo.begin().await?;

        let existing = tx
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))?;

        if dto.allow_discussions.is_some_and(|v| v != existing.allow_discussions) {
            tracing::debug!(
                "Ignoring allow_discussions change on category {}; the type is fixed at creation",
                id
            );
        }

        tx.update_details(
            id,
            &CategoryDetails {
                name: dto.name,
                description: dto.description,
            },
        )
        .await?;
        tx.commit().await?;

        tracing::info!("Updated category: {}", id);

        Ok(id)
    }

    /// Delete a category, moving or removing what depends on it.
    ///
    /// With a replacement, child categories and discussions move to it and its
    /// discussion count is recomputed. Without one, the category's discussions
    /// and their comments are deleted. The forest is flattened if no parent
    /// category remains, then organized. The `categories.use` setting is
    /// stored with `updated_by`. Everything runs in one transaction.
    pub async fn delete(
        &self,
        category: &Category,
        replacement: Option<i64>,
        updated_by: &str,
    ) -> Result<DeleteOutcome> {
        if category.id <= 0 {
            return Err(AppError::InvalidArgument(
                "Invalid category for deletion".to_string(),
            ));
        }
        let replacement = replacement.filter(|id| *id > 0);
        if replacement == Some(category.id) {
            return Err(AppError::InvalidArgument(
                "A category cannot replace itself".to_string(),
            ));
        }

        let mut tx = self.repo.begin().await?;

        if tx.find_by_id(category.id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Category {} not found",
                category.id
            )));
        }

        if let Some(replacement_id) = replacement {
            if tx.find_by_id(replacement_id).await?.is_none() {
                return Err(AppError::InvalidArgument(format!(
                    "Replacement category {} does not exist",
                    replacement_id
                )));
            }
        }

        let permissions_revoked = tx.revoke_category_permissions(category.id).await?;

        let mut children_reassigned = 0;
        let mut discussions_reassigned = 0;
        let mut discussions_deleted = 0;
        let mut comments_deleted = 0;

        match replacement {
            Some(replacement_id) => {
                children_reassigned = tx
                    .reassign_child_categories(category.id, replacement_id)
                    .await?;
                discussions_reassigned = tx
                    .reassign_discussions(category.id, replacement_id)
                    .await?;
                let count = tx.refresh_discussion_count(replacement_id).await?;
                tracing::debug!(
                    "Category {} now holds {} discussions",
                    replacement_id,
                    count
                );
            }
            None => {
                comments_deleted = tx.delete_comments_in(category.id).await?;
                discussions_deleted = tx.delete_discussions_in(category.id).await?;
            }
        }

        tx.delete_category(category.id).await?;

        let flattened = tx.count_parents().await? == 0;
        if flattened {
            let cleared = tx.clear_all_parents().await?;
            tracing::debug!("No parent categories left; cleared {} parent links", cleared);
        }

        let remaining_categories = tx.count_categories().await?;
        let organize = Self::organize_in(&mut tx).await?;
        let categories_in_use = remaining_categories > 1;
        tx.set_categories_in_use(categories_in_use, updated_by)
            .await?;
        tx.commit().await?;

        tracing::info!(
            "Deleted category: {} (replacement: {:?}, remaining: {})",
            category.id,
            replacement,
            remaining_categories
        );

        Ok(DeleteOutcome {
            deleted_category_id: category.id,
            replacement_category_id: replacement,
            permissions_revoked,
            children_reassigned,
            discussions_reassigned,
            discussions_deleted,
            comments_deleted,
            flattened,
            remaining_categories,
            categories_in_use,
            organize,
        })
    }

    /// Look the category up by id, then [`delete`](Self::delete) it
    pub async fn delete_by_id(
        &self,
        id: i64,
        replacement: Option<i64>,
        updated_by: &str,
    ) -> Result<DeleteOutcome> {
        let category = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))?;
        self.delete(&category, replacement, updated_by).await
    }

    /// Run an organize pass on its own (repair after manual edits)
    pub async fn organize(&self) -> Result<OrganizeReport> {
        let mut tx = self.repo.begin().await?;
        let report = Self::organize_in(&mut tx).await?;
        tx.commit().await?;

        tracing::info!(
            "Organized categories: scanned {}, updated {}, flat: {}",
            report.scanned,
            report.updated,
            report.flat
        );

        Ok(report)
    }

    async fn organize_in(tx: &mut R::Tx) -> Result<OrganizeReport> {
        let categories = tx.list_ordered().await?;
        let nodes: Vec<TreeNode> = categories.iter().map(TreeNode::from).collect();
        let sorted = SortedNodes::new(&nodes).map_err(|e| AppError::Internal(e.to_string()))?;

        let plan = tree::organize(sorted);
        let changes = plan.changes(&nodes);
        for placement in &changes {
            tx.apply_placement(placement).await?;
        }

        Ok(OrganizeReport {
            scanned: nodes.len(),
            updated: changes.len(),
            flat: plan.is_flat(),
        })
    }
}
