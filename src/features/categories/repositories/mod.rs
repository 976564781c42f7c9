//! Persistence seam for the category tree.
//!
//! Reads go straight to the repository. Every mutation runs through a
//! [`CategoryTx`] obtained from [`CategoryRepository::begin`]; dropping the
//! unit of work without calling [`CategoryTx::commit`] discards its writes.

mod pg;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;

use crate::core::error::Result;
use crate::features::auth::ViewScope;
use crate::features::categories::models::{Category, CategoryDetails, CategoryFull, NewCategory};
use crate::features::categories::tree::Placement;

pub use pg::PgCategoryRepository;

#[async_trait]
pub trait CategoryRepository: Send + Sync + 'static {
    type Tx: CategoryTx;

    async fn begin(&self) -> Result<Self::Tx>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Category>>;

    /// The category if it is a parent or the scope may view it
    async fn find_visible_by_id(&self, scope: &ViewScope, id: i64) -> Result<Option<Category>>;

    /// Categories the scope may view, plus every parent category, by sort
    async fn list_visible(&self, scope: &ViewScope) -> Result<Vec<Category>>;

    /// Viewable leaf categories with parent-qualified names, by sort
    async fn list_full(&self, scope: &ViewScope) -> Result<Vec<CategoryFull>>;

    async fn find_full_by_id(&self, scope: &ViewScope, id: i64) -> Result<Option<CategoryFull>>;

    async fn find_full_by_name(&self, scope: &ViewScope, name: &str)
        -> Result<Option<CategoryFull>>;

    async fn has_children(&self, id: i64) -> Result<bool>;
}

/// One store transaction over the category, discussion, comment and
/// permission tables.
#[async_trait]
pub trait CategoryTx: Send {
    /// All categories ordered by `(sort, id)`
    async fn list_ordered(&mut self) -> Result<Vec<Category>>;

    async fn find_by_id(&mut self, id: i64) -> Result<Option<Category>>;

    async fn max_sort(&mut self) -> Result<Option<i32>>;

    async fn insert(&mut self, category: &NewCategory) -> Result<Category>;

    /// Rewrite name and description; `allow_discussions` is never touched
    async fn update_details(&mut self, id: i64, details: &CategoryDetails) -> Result<u64>;

    /// Parent category with the highest sort
    async fn last_parent(&mut self) -> Result<Option<Category>>;

    async fn set_parent(&mut self, id: i64, parent_id: Option<i64>) -> Result<()>;

    /// Attach every leaf without a parent to `parent_id`
    async fn adopt_unparented_leaves(&mut self, parent_id: i64) -> Result<u64>;

    async fn apply_placement(&mut self, placement: &Placement) -> Result<()>;

    /// Remove the role grants of category-scoped permissions on `category_id`
    async fn revoke_category_permissions(&mut self, category_id: i64) -> Result<u64>;

    async fn reassign_child_categories(&mut self, from: i64, to: i64) -> Result<u64>;

    async fn reassign_discussions(&mut self, from: i64, to: i64) -> Result<u64>;

    /// Recount discussions under `category_id` and store the count
    async fn refresh_discussion_count(&mut self, category_id: i64) -> Result<i64>;

    async fn delete_comments_in(&mut self, category_id: i64) -> Result<u64>;

    async fn delete_discussions_in(&mut self, category_id: i64) -> Result<u64>;

    async fn delete_category(&mut self, id: i64) -> Result<u64>;

    async fn count_parents(&mut self) -> Result<i64>;

    /// Set every category's parent to null
    async fn clear_all_parents(&mut self) -> Result<u64>;

    async fn count_categories(&mut self) -> Result<i64>;

    /// Upsert the `categories.use` setting
    async fn set_categories_in_use(&mut self, in_use: bool, updated_by: &str) -> Result<()>;

    async fn commit(self) -> Result<()>;
}
