use anyhow::{bail, Result};

use super::schema::Database;
use super::types::Category;
use crate::util::strip_control_chars;

impl Database {
    // ========================================================================
    // Category Operations
    // ========================================================================

    /// Sanitize and validate a category title.
    ///
    /// Strips control characters (escape sequence injection), trims
    /// whitespace, and rejects empty/whitespace-only titles.
    fn sanitize_category_title(title: &str) -> Result<String> {
        let sanitized = strip_control_chars(title);
        let trimmed = sanitized.trim();
        if trimmed.is_empty() {
            bail!("Category title cannot be empty or whitespace-only");
        }
        Ok(trimmed.to_owned())
    }

    /// Create a category owned by `user_id`, returning its ID.
    pub async fn create_category(&self, user_id: i64, title: &str) -> Result<i64> {
        let clean_title = Self::sanitize_category_title(title)?;

        let row: (i64,) = sqlx::query_as(
            "INSERT INTO categories (user_id, title) VALUES (?, ?) RETURNING id",
        )
        .bind(user_id)
        .bind(&clean_title)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    /// Rename a category. Returns false if the user owns no such category.
    pub async fn rename_category(&self, user_id: i64, category_id: i64, title: &str) -> Result<bool> {
        let clean_title = Self::sanitize_category_title(title)?;

        let result = sqlx::query("UPDATE categories SET title = ? WHERE id = ? AND user_id = ?")
            .bind(&clean_title)
            .bind(category_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Hide or show a whole category in the user's unread aggregates.
    /// Returns false if the user owns no such category.
    pub async fn set_category_hide_globally(
        &self,
        user_id: i64,
        category_id: i64,
        hide: bool,
    ) -> Result<bool> {
        let result =
            sqlx::query("UPDATE categories SET hide_globally = ? WHERE id = ? AND user_id = ?")
                .bind(hide)
                .bind(category_id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All categories of a user, ordered by title
    pub async fn get_categories(&self, user_id: i64) -> Result<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, user_id, title, hide_globally
            FROM categories
            WHERE user_id = ?
            ORDER BY title
        "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }
}
