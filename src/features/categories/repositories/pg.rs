use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::core::error::{AppError, Result};
use crate::features::auth::ViewScope;
use crate::features::categories::models::{
    Category, CategoryDetails, CategoryFull, NewCategory, FULL_NAME_SEPARATOR,
};
use crate::features::categories::repositories::{CategoryRepository, CategoryTx};
use crate::features::categories::tree::Placement;
use crate::shared::constants::{
    JUNCTION_CATEGORY, PERMISSION_DISCUSSIONS_VIEW, SETTING_CATEGORIES_USE,
};

// Scoped reads bind the view predicate as
// $1 = unrestricted, $2 = permission name, $3 = junction table, $4 = roles.

fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| {
        tracing::error!("Failed to {}: {:?}", context, e);
        AppError::Database(e)
    }
}

/// PostgreSQL-backed category store
#[derive(Clone)]
pub struct PgCategoryRepository {
    pool: PgPool,
}

impl PgCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    type Tx = PgCategoryTx;

    async fn begin(&self) -> Result<PgCategoryTx> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("begin category transaction"))?;
        Ok(PgCategoryTx { tx })
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Category>> {
        sqlx::query_as!(
            Category,
            r#"
            SELECT id, parent_category_id, name, description, allow_discussions,
                   sort, count_discussions, created_at, updated_at
            FROM categories
            WHERE id = $1
            "#,
            id
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("get category by id"))
    }

    async fn find_visible_by_id(&self, scope: &ViewScope, id: i64) -> Result<Option<Category>> {
        sqlx::query_as!(
            Category,
            r#"
            SELECT c.id, c.parent_category_id, c.name, c.description, c.allow_discussions,
                   c.sort, c.count_discussions, c.created_at, c.updated_at
            FROM categories c
            WHERE c.id = $5
              AND (
                  c.allow_discussions = FALSE
                  OR $1
                  OR EXISTS (
                      SELECT 1
                      FROM role_permissions rp
                      JOIN permissions p ON p.id = rp.permission_id
                      WHERE p.name = $2
                        AND p.junction_table = $3
                        AND rp.junction_id = c.id
                        AND rp.role = ANY($4::text[])
                  )
              )
            "#,
            scope.is_unrestricted(),
            PERMISSION_DISCUSSIONS_VIEW,
            JUNCTION_CATEGORY,
            scope.roles(),
            id
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("get visible category by id"))
    }

    async fn list_visible(&self, scope: &ViewScope) -> Result<Vec<Category>> {
        sqlx::query_as!(
            Category,
            r#"
            SELECT c.id, c.parent_category_id, c.name, c.description, c.allow_discussions,
                   c.sort, c.count_discussions, c.created_at, c.updated_at
            FROM categories c
            WHERE c.allow_discussions = FALSE
               OR $1
               OR EXISTS (
                   SELECT 1
                   FROM role_permissions rp
                   JOIN permissions p ON p.id = rp.permission_id
                   WHERE p.name = $2
                     AND p.junction_table = $3
                     AND rp.junction_id = c.id
                     AND rp.role = ANY($4::text[])
               )
            ORDER BY c.sort, c.id
            "#,
            scope.is_unrestricted(),
            PERMISSION_DISCUSSIONS_VIEW,
            JUNCTION_CATEGORY,
            scope.roles()
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list categories"))
    }

    async fn list_full(&self, scope: &ViewScope) -> Result<Vec<CategoryFull>> {
        sqlx::query_as!(
            CategoryFull,
            r#"
            SELECT c.id, concat_ws($5, p.name, c.name) AS "name!", c.description,
                   c.count_discussions
            FROM categories c
            LEFT JOIN categories p ON c.parent_category_id = p.id
            WHERE c.allow_discussions = TRUE
              AND (
                  $1
                  OR EXISTS (
                      SELECT 1
                      FROM role_permissions rp
                      JOIN permissions pm ON pm.id = rp.permission_id
                      WHERE pm.name = $2
                        AND pm.junction_table = $3
                        AND rp.junction_id = c.id
                        AND rp.role = ANY($4::text[])
                  )
              )
            ORDER BY c.sort, c.id
            "#,
            scope.is_unrestricted(),
            PERMISSION_DISCUSSIONS_VIEW,
            JUNCTION_CATEGORY,
            scope.roles(),
            FULL_NAME_SEPARATOR
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list full categories"))
    }

    async fn find_full_by_id(&self, scope: &ViewScope, id: i64) -> Result<Option<CategoryFull>> {
        sqlx::query_as!(
            CategoryFull,
            r#"
            SELECT c.id, concat_ws($5, p.name, c.name) AS "name!", c.description,
                   c.count_discussions
            FROM categories c
            LEFT JOIN categories p ON c.parent_category_id = p.id
            WHERE c.id = $6
              AND c.allow_discussions = TRUE
              AND (
                  $1
                  OR EXISTS (
                      SELECT 1
                      FROM role_permissions rp
                      JOIN permissions pm ON pm.id = rp.permission_id
                      WHERE pm.name = $2
                        AND pm.junction_table = $3
                        AND rp.junction_id = c.id
                        AND rp.role = ANY($4::text[])
                  )
              )
            "#,
            scope.is_unrestricted(),
            PERMISSION_DISCUSSIONS_VIEW,
            JUNCTION_CATEGORY,
            scope.roles(),
            FULL_NAME_SEPARATOR,
            id
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("get full category by id"))
    }

    async fn find_full_by_name(
        &self,
        scope: &ViewScope,
        name: &str,
    ) -> Result<Option<CategoryFull>> {
        // Names are not unique; the first in sort order wins
        sqlx::query_as!(
            CategoryFull,
            r#"
            SELECT c.id, concat_ws($5, p.name, c.name) AS "name!", c.description,
                   c.count_discussions
            FROM categories c
            LEFT JOIN categories p ON c.parent_category_id = p.id
            WHERE c.name = $6
              AND c.allow_discussions = TRUE
              AND (
                  $1
                  OR EXISTS (
                      SELECT 1
                      FROM role_permissions rp
                      JOIN permissions pm ON pm.id = rp.permission_id
                      WHERE pm.name = $2
                        AND pm.junction_table = $3
                        AND rp.junction_id = c.id
                        AND rp.role = ANY($4::text[])
                  )
              )
            ORDER BY c.sort, c.id
            LIMIT 1
            "#,
            scope.is_unrestricted(),
            PERMISSION_DISCUSSIONS_VIEW,
            JUNCTION_CATEGORY,
            scope.roles(),
            FULL_NAME_SEPARATOR,
            name
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("get full category by name"))
    }

    async fn has_children(&self, id: i64) -> Result<bool> {
        sqlx::query_scalar!(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM categories WHERE parent_category_id = $1
            ) AS "exists!"
            "#,
            id
        )
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("check category children"))
    }
}

/// Category unit of work; rolls back when dropped uncommitted
pub struct PgCategoryTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl CategoryTx for PgCategoryTx {
    async fn list_ordered(&mut self) -> Result<Vec<Category>> {
        sqlx::query_as!(
            Category,
            r#"
            SELECT id, parent_category_id, name, description, allow_discussions,
                   sort, count_discussions, created_at, updated_at
            FROM categories
            ORDER BY sort, id
            "#
        )
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_error("load categories for organize"))
    }

    async fn find_by_id(&mut self, id: i64) -> Result<Option<Category>> {
        sqlx::query_as!(
            Category,
            r#"
            SELECT id, parent_category_id, name, description, allow_discussions,
                   sort, count_discussions, created_at, updated_at
            FROM categories
            WHERE id = $1
            FOR UPDATE
            "#,
            id
        )
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("lock category"))
    }

    async fn max_sort(&mut self) -> Result<Option<i32>> {
        sqlx::query_scalar!("SELECT MAX(sort) FROM categories")
            .fetch_one(&mut *self.tx)
            .await
            .map_err(db_error("read max category sort"))
    }

    async fn insert(&mut self, category: &NewCategory) -> Result<Category> {
        sqlx::query_as!(
            Category,
            r#"
            INSERT INTO categories (name, description, allow_discussions, sort)
            VALUES ($1, $2, $3, $4)
            RETURNING id, parent_category_id, name, description, allow_discussions,
                      sort, count_discussions, created_at, updated_at
            "#,
            category.name,
            category.description.as_deref(),
            category.allow_discussions,
            category.sort
        )
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_error("insert category"))
    }

    async fn update_details(&mut self, id: i64, details: &CategoryDetails) -> Result<u64> {
        let result = sqlx::query!(
            r#"
            UPDATE categories
            SET name = $1, description = $2, updated_at = NOW()
            WHERE id = $3
            "#,
            details.name,
            details.description.as_deref(),
            id
        )
        .execute(&mut *self.tx)
        .await
        .map_err(db_error("update category"))?;
        Ok(result.rows_affected())
    }

    async fn last_parent(&mut self) -> Result<Option<Category>> {
        sqlx::query_as!(
            Category,
            r#"
            SELECT id, parent_category_id, name, description, allow_discussions,
                   sort, count_discussions, created_at, updated_at
            FROM categories
            WHERE allow_discussions = FALSE
            ORDER BY sort DESC, id DESC
            LIMIT 1
            "#
        )
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("find last parent category"))
    }

    async fn set_parent(&mut self, id: i64, parent_id: Option<i64>) -> Result<()> {
        sqlx::query!(
            "UPDATE categories SET parent_category_id = $1, updated_at = NOW() WHERE id = $2",
            parent_id,
            id
        )
        .execute(&mut *self.tx)
        .await
        .map_err(db_error("set category parent"))?;
        Ok(())
    }

    async fn adopt_unparented_leaves(&mut self, parent_id: i64) -> Result<u64> {
        let result = sqlx::query!(
            r#"
            UPDATE categories
            SET parent_category_id = $1, updated_at = NOW()
            WHERE parent_category_id IS NULL
              AND allow_discussions = TRUE
            "#,
            parent_id
        )
        .execute(&mut *self.tx)
        .await
        .map_err(db_error("adopt unparented categories"))?;
        Ok(result.rows_affected())
    }

    async fn apply_placement(&mut self, placement: &Placement) -> Result<()> {
        sqlx::query!(
            r#"
            UPDATE categories
            SET sort = $1, parent_category_id = $2, updated_at = NOW()
            WHERE id = $3
            "#,
            placement.sort,
            placement.parent_id,
            placement.id
        )
        .execute(&mut *self.tx)
        .await
        .map_err(db_error("apply category placement"))?;
        Ok(())
    }

    async fn revoke_category_permissions(&mut self, category_id: i64) -> Result<u64> {
        let result = sqlx::query!(
            r#"
            DELETE FROM role_permissions
            WHERE junction_id = $1
              AND permission_id IN (
                  SELECT id FROM permissions WHERE junction_table = $2
              )
            "#,
            category_id,
            JUNCTION_CATEGORY
        )
        .execute(&mut *self.tx)
        .await
        .map_err(db_error("revoke category permissions"))?;
        Ok(result.rows_affected())
    }

    async fn reassign_child_categories(&mut self, from: i64, to: i64) -> Result<u64> {
        let result = sqlx::query!(
            r#"
            UPDATE categories
            SET parent_category_id = $1, updated_at = NOW()
            WHERE parent_category_id = $2
            "#,
            to,
            from
        )
        .execute(&mut *self.tx)
        .await
        .map_err(db_error("reassign child categories"))?;
        Ok(result.rows_affected())
    }

    async fn reassign_discussions(&mut self, from: i64, to: i64) -> Result<u64> {
        let result = sqlx::query!(
            "UPDATE discussions SET category_id = $1, updated_at = NOW() WHERE category_id = $2",
            to,
            from
        )
        .execute(&mut *self.tx)
        .await
        .map_err(db_error("reassign discussions"))?;
        Ok(result.rows_affected())
    }

    async fn refresh_discussion_count(&mut self, category_id: i64) -> Result<i64> {
        let count = sqlx::query_scalar!(
            r#"
            UPDATE categories
            SET count_discussions = (
                    SELECT COUNT(*)::INTEGER FROM discussions WHERE category_id = $1
                ),
                updated_at = NOW()
            WHERE id = $1
            RETURNING count_discussions
            "#,
            category_id
        )
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("refresh discussion count"))?;
        Ok(count.map(i64::from).unwrap_or(0))
    }

    async fn delete_comments_in(&mut self, category_id: i64) -> Result<u64> {
        let result = sqlx::query!(
            r#"
            DELETE FROM comments cm
            USING discussions d
            WHERE cm.discussion_id = d.id
              AND d.category_id = $1
            "#,
            category_id
        )
        .execute(&mut *self.tx)
        .await
        .map_err(db_error("delete category comments"))?;
        Ok(result.rows_affected())
    }

    async fn delete_discussions_in(&mut self, category_id: i64) -> Result<u64> {
        let result = sqlx::query!("DELETE FROM discussions WHERE category_id = $1", category_id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_error("delete category discussions"))?;
        Ok(result.rows_affected())
    }

    async fn delete_category(&mut self, id: i64) -> Result<u64> {
        let result = sqlx::query!("DELETE FROM categories WHERE id = $1", id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_error("delete category"))?;
        Ok(result.rows_affected())
    }

    async fn count_parents(&mut self) -> Result<i64> {
        sqlx::query_scalar!(
            r#"SELECT COUNT(*) AS "count!" FROM categories WHERE allow_discussions = FALSE"#
        )
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_error("count parent categories"))
    }

    async fn clear_all_parents(&mut self) -> Result<u64> {
        let result = sqlx::query!(
            r#"
            UPDATE categories
            SET parent_category_id = NULL, updated_at = NOW()
            WHERE parent_category_id IS NOT NULL
            "#
        )
        .execute(&mut *self.tx)
        .await
        .map_err(db_error("flatten categories"))?;
        Ok(result.rows_affected())
    }

    async fn count_categories(&mut self) -> Result<i64> {
        sqlx::query_scalar!(r#"SELECT COUNT(*) AS "count!" FROM categories"#)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(db_error("count categories"))
    }

    async fn set_categories_in_use(&mut self, in_use: bool, updated_by: &str) -> Result<()> {
        sqlx::query!(
            r#"
            INSERT INTO settings (key, value, updated_at, updated_by)
            VALUES ($1, $2, NOW(), $3)
            ON CONFLICT (key) DO UPDATE
            SET value = EXCLUDED.value, updated_at = NOW(), updated_by = EXCLUDED.updated_by
            "#,
            SETTING_CATEGORIES_USE,
            serde_json::Value::Bool(in_use),
            updated_by
        )
        .execute(&mut *self.tx)
        .await
        .map_err(db_error("store categories-in-use flag"))?;
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        self.tx
            .commit()
            .await
            .map_err(db_error("commit category transaction"))
    }
}
