//! In-memory category store for service tests.
//!
//! A unit of work clones the committed state, mutates the clone and swaps it
//! back on commit, so an abandoned transaction leaves no trace. A named step
//! can be made to fail to exercise rollback paths.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::core::error::{AppError, Result};
use crate::features::auth::ViewScope;
use crate::features::categories::models::{
    full_name, Category, CategoryDetails, CategoryFull, NewCategory,
};
use crate::features::categories::repositories::{CategoryRepository, CategoryTx};
use crate::features::categories::tree::Placement;
use crate::shared::constants::{
    JUNCTION_CATEGORY, PERMISSION_DISCUSSIONS_VIEW, SETTING_CATEGORIES_USE,
};

#[derive(Debug, Clone)]
pub struct Discussion {
    pub id: i64,
    pub category_id: i64,
}

#[derive(Debug, Clone)]
pub struct Comment {
    pub id: i64,
    pub discussion_id: i64,
}

#[derive(Debug, Clone)]
pub struct Permission {
    pub id: i64,
    pub name: String,
    pub junction_table: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RolePermission {
    pub role: String,
    pub permission_id: i64,
    pub junction_id: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub categories: BTreeMap<i64, Category>,
    pub discussions: Vec<Discussion>,
    pub comments: Vec<Comment>,
    pub permissions: Vec<Permission>,
    pub role_permissions: Vec<RolePermission>,
    /// Setting key to `(value, updated_by)`
    pub settings: BTreeMap<String, (bool, String)>,
    next_id: i64,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn ordered(&self) -> Vec<Category> {
        let mut categories: Vec<Category> = self.categories.values().cloned().collect();
        categories.sort_by_key(|c| (c.sort, c.id));
        categories
    }

    fn viewable(&self, scope: &ViewScope, category_id: i64) -> bool {
        let granted: Vec<&str> = self
            .role_permissions
            .iter()
            .filter(|rp| rp.junction_id == Some(category_id))
            .filter(|rp| {
                self.permissions.iter().any(|p| {
                    p.id == rp.permission_id
                        && p.name == PERMISSION_DISCUSSIONS_VIEW
                        && p.junction_table.as_deref() == Some(JUNCTION_CATEGORY)
                })
            })
            .map(|rp| rp.role.as_str())
            .collect();
        scope.allows_any(&granted)
    }

    fn visible(&self, scope: &ViewScope, id: i64) -> Option<Category> {
        self.categories
            .get(&id)
            .filter(|c| c.is_parent() || self.viewable(scope, c.id))
            .cloned()
    }

    fn full(&self, category: &Category) -> CategoryFull {
        let parent = category
            .parent_category_id
            .and_then(|id| self.categories.get(&id))
            .map(|p| p.name.as_str());
        CategoryFull {
            id: category.id,
            name: full_name(parent, &category.name),
            description: category.description.clone(),
            count_discussions: category.count_discussions,
        }
    }

    fn list_full(&self, scope: &ViewScope) -> Vec<CategoryFull> {
        self.ordered()
            .iter()
            .filter(|c| c.allow_discussions && self.viewable(scope, c.id))
            .map(|c| self.full(c))
            .collect()
    }

    // Seeding helpers

    pub fn add_category(
        &mut self,
        name: &str,
        allow_discussions: bool,
        sort: i32,
        parent_category_id: Option<i64>,
    ) -> i64 {
        let id = self.next_id();
        let now = Utc::now();
        self.categories.insert(
            id,
            Category {
                id,
                parent_category_id,
                name: name.to_string(),
                description: None,
                allow_discussions,
                sort,
                count_discussions: 0,
                created_at: now,
                updated_at: now,
            },
        );
        id
    }

    pub fn add_discussion(&mut self, category_id: i64) -> i64 {
        let id = self.next_id();
        self.discussions.push(Discussion { id, category_id });
        if let Some(c) = self.categories.get_mut(&category_id) {
            c.count_discussions += 1;
        }
        id
    }

    pub fn add_comment(&mut self, discussion_id: i64) -> i64 {
        let id = self.next_id();
        self.comments.push(Comment { id, discussion_id });
        id
    }

    pub fn add_permission(&mut self, name: &str, junction_table: Option<&str>) -> i64 {
        let id = self.next_id();
        self.permissions.push(Permission {
            id,
            name: name.to_string(),
            junction_table: junction_table.map(str::to_string),
        });
        id
    }

    pub fn grant(&mut self, role: &str, permission_id: i64, junction_id: Option<i64>) {
        self.role_permissions.push(RolePermission {
            role: role.to_string(),
            permission_id,
            junction_id,
        });
    }

    /// Grant the category view permission, creating it on first use
    pub fn grant_view(&mut self, role: &str, category_id: i64) {
        let permission_id = match self
            .permissions
            .iter()
            .find(|p| p.name == PERMISSION_DISCUSSIONS_VIEW)
        {
            Some(p) => p.id,
            None => self.add_permission(PERMISSION_DISCUSSIONS_VIEW, Some(JUNCTION_CATEGORY)),
        };
        self.grant(role, permission_id, Some(category_id));
    }
}

#[derive(Clone, Default)]
pub struct MemoryCategoryRepository {
    state: Arc<Mutex<MemoryState>>,
    fail_on: Arc<Mutex<Option<&'static str>>>,
}

impl MemoryCategoryRepository {
    pub fn new(state: MemoryState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            fail_on: Arc::default(),
        }
    }

    /// Make the named unit-of-work step fail with a database error
    pub fn fail_on(&self, step: &'static str) {
        *self.fail_on.lock().unwrap() = Some(step);
    }

    pub fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap()
    }

    pub fn category(&self, id: i64) -> Option<Category> {
        self.state().categories.get(&id).cloned()
    }

    /// `(name, sort, parent name)` in sort order
    pub fn layout(&self) -> Vec<(String, i32, Option<String>)> {
        let state = self.state();
        state
            .ordered()
            .into_iter()
            .map(|c| {
                let parent = c
                    .parent_category_id
                    .and_then(|id| state.categories.get(&id))
                    .map(|p| p.name.clone());
                (c.name, c.sort, parent)
            })
            .collect()
    }
}

#[async_trait]
impl CategoryRepository for MemoryCategoryRepository {
    type Tx = MemoryCategoryTx;

    async fn begin(&self) -> Result<MemoryCategoryTx> {
        Ok(MemoryCategoryTx {
            working: self.state().clone(),
            committed: Arc::clone(&self.state),
            fail_on: *self.fail_on.lock().unwrap(),
        })
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Category>> {
        Ok(self.category(id))
    }

    async fn find_visible_by_id(&self, scope: &ViewScope, id: i64) -> Result<Option<Category>> {
        Ok(self.state().visible(scope, id))
    }

    async fn list_visible(&self, scope: &ViewScope) -> Result<Vec<Category>> {
        let state = self.state();
        Ok(state
            .ordered()
            .into_iter()
            .filter(|c| c.is_parent() || state.viewable(scope, c.id))
            .collect())
    }

    async fn list_full(&self, scope: &ViewScope) -> Result<Vec<CategoryFull>> {
        Ok(self.state().list_full(scope))
    }

    async fn find_full_by_id(&self, scope: &ViewScope, id: i64) -> Result<Option<CategoryFull>> {
        Ok(self.state().list_full(scope).into_iter().find(|c| c.id == id))
    }

    async fn find_full_by_name(
        &self,
        scope: &ViewScope,
        name: &str,
    ) -> Result<Option<CategoryFull>> {
        let state = self.state();
        let id = state
            .ordered()
            .into_iter()
            .find(|c| c.name == name && c.allow_discussions && state.viewable(scope, c.id))
            .map(|c| c.id);
        Ok(id.and_then(|id| state.categories.get(&id).map(|c| state.full(c))))
    }

    async fn has_children(&self, id: i64) -> Result<bool> {
        Ok(self
            .state()
            .categories
            .values()
            .any(|c| c.parent_category_id == Some(id)))
    }
}

pub struct MemoryCategoryTx {
    working: MemoryState,
    committed: Arc<Mutex<MemoryState>>,
    fail_on: Option<&'static str>,
}

impl MemoryCategoryTx {
    fn step(&mut self, name: &'static str) -> Result<&mut MemoryState> {
        if self.fail_on == Some(name) {
            return Err(AppError::Database(sqlx::Error::Protocol(format!(
                "injected failure in {}",
                name
            ))));
        }
        Ok(&mut self.working)
    }
}

#[async_trait]
impl CategoryTx for MemoryCategoryTx {
    async fn list_ordered(&mut self) -> Result<Vec<Category>> {
        Ok(self.step("list_ordered")?.ordered())
    }

    async fn find_by_id(&mut self, id: i64) -> Result<Option<Category>> {
        Ok(self.step("find_by_id")?.categories.get(&id).cloned())
    }

    async fn max_sort(&mut self) -> Result<Option<i32>> {
        Ok(self
            .step("max_sort")?
            .categories
            .values()
            .map(|c| c.sort)
            .max())
    }

    async fn insert(&mut self, category: &NewCategory) -> Result<Category> {
        let state = self.step("insert")?;
        let id = state.add_category(
            &category.name,
            category.allow_discussions,
            category.sort,
            None,
        );
        let row = state
            .categories
            .get_mut(&id)
            .ok_or_else(|| AppError::Internal("inserted row vanished".to_string()))?;
        row.description = category.description.clone();
        Ok(row.clone())
    }

    async fn update_details(&mut self, id: i64, details: &CategoryDetails) -> Result<u64> {
        let state = self.step("update_details")?;
        Ok(match state.categories.get_mut(&id) {
            Some(c) => {
                c.name = details.name.clone();
                c.description = details.description.clone();
                c.updated_at = Utc::now();
                1
            }
            None => 0,
        })
    }

    async fn last_parent(&mut self) -> Result<Option<Category>> {
        Ok(self
            .step("last_parent")?
            .ordered()
            .into_iter()
            .rev()
            .find(|c| c.is_parent()))
    }

    async fn set_parent(&mut self, id: i64, parent_id: Option<i64>) -> Result<()> {
        if let Some(c) = self.step("set_parent")?.categories.get_mut(&id) {
            c.parent_category_id = parent_id;
        }
        Ok(())
    }

    async fn adopt_unparented_leaves(&mut self, parent_id: i64) -> Result<u64> {
        let mut adopted = 0;
        for c in self.step("adopt_unparented_leaves")?.categories.values_mut() {
            if c.allow_discussions && c.parent_category_id.is_none() {
                c.parent_category_id = Some(parent_id);
                adopted += 1;
            }
        }
        Ok(adopted)
    }

    async fn apply_placement(&mut self, placement: &Placement) -> Result<()> {
        if let Some(c) = self
            .step("apply_placement")?
            .categories
            .get_mut(&placement.id)
        {
            c.sort = placement.sort;
            c.parent_category_id = placement.parent_id;
        }
        Ok(())
    }

    async fn revoke_category_permissions(&mut self, category_id: i64) -> Result<u64> {
        let state = self.step("revoke_category_permissions")?;
        let scoped: Vec<i64> = state
            .permissions
            .iter()
            .filter(|p| p.junction_table.as_deref() == Some(JUNCTION_CATEGORY))
            .map(|p| p.id)
            .collect();
        let before = state.role_permissions.len();
        state.role_permissions.retain(|rp| {
            !(rp.junction_id == Some(category_id) && scoped.contains(&rp.permission_id))
        });
        Ok((before - state.role_permissions.len()) as u64)
    }

    async fn reassign_child_categories(&mut self, from: i64, to: i64) -> Result<u64> {
        let mut moved = 0;
        for c in self
            .step("reassign_child_categories")?
            .categories
            .values_mut()
        {
            if c.parent_category_id == Some(from) {
                c.parent_category_id = Some(to);
                moved += 1;
            }
        }
        Ok(moved)
    }

    async fn reassign_discussions(&mut self, from: i64, to: i64) -> Result<u64> {
        let mut moved = 0;
        for d in self.step("reassign_discussions")?.discussions.iter_mut() {
            if d.category_id == from {
                d.category_id = to;
                moved += 1;
            }
        }
        Ok(moved)
    }

    async fn refresh_discussion_count(&mut self, category_id: i64) -> Result<i64> {
        let state = self.step("refresh_discussion_count")?;
        let count = state
            .discussions
            .iter()
            .filter(|d| d.category_id == category_id)
            .count();
        match state.categories.get_mut(&category_id) {
            Some(c) => {
                c.count_discussions = count as i32;
                Ok(count as i64)
            }
            None => Ok(0),
        }
    }

    async fn delete_comments_in(&mut self, category_id: i64) -> Result<u64> {
        let state = self.step("delete_comments_in")?;
        let discussions: Vec<i64> = state
            .discussions
            .iter()
            .filter(|d| d.category_id == category_id)
            .map(|d| d.id)
            .collect();
        let before = state.comments.len();
        state
            .comments
            .retain(|c| !discussions.contains(&c.discussion_id));
        Ok((before - state.comments.len()) as u64)
    }

    async fn delete_discussions_in(&mut self, category_id: i64) -> Result<u64> {
        let state = self.step("delete_discussions_in")?;
        let before = state.discussions.len();
        state.discussions.retain(|d| d.category_id != category_id);
        Ok((before - state.discussions.len()) as u64)
    }

    async fn delete_category(&mut self, id: i64) -> Result<u64> {
        let state = self.step("delete_category")?;
        if state.categories.remove(&id).is_none() {
            return Ok(0);
        }
        // Mirrors ON DELETE SET NULL on parent_category_id
        for c in state.categories.values_mut() {
            if c.parent_category_id == Some(id) {
                c.parent_category_id = None;
            }
        }
        Ok(1)
    }

    async fn count_parents(&mut self) -> Result<i64> {
        Ok(self
            .step("count_parents")?
            .categories
            .values()
            .filter(|c| c.is_parent())
            .count() as i64)
    }

    async fn clear_all_parents(&mut self) -> Result<u64> {
        let mut cleared = 0;
        for c in self.step("clear_all_parents")?.categories.values_mut() {
            if c.parent_category_id.take().is_some() {
                cleared += 1;
            }
        }
        Ok(cleared)
    }

    async fn count_categories(&mut self) -> Result<i64> {
        Ok(self.step("count_categories")?.categories.len() as i64)
    }

    async fn set_categories_in_use(&mut self, in_use: bool, updated_by: &str) -> Result<()> {
        self.step("set_categories_in_use")?.settings.insert(
            SETTING_CATEGORIES_USE.to_string(),
            (in_use, updated_by.to_string()),
        );
        Ok(())
    }

    async fn commit(mut self) -> Result<()> {
        self.step("commit")?;
        *self.committed.lock().unwrap() = self.working;
        Ok(())
    }
}
