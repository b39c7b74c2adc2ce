use anyhow::Context;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub user_id: Option<Uuid>, // NULL for builtin
    pub builtin: bool,
}

impl Category {
    /// Builtin categories plus the ones owned by `user_id`.
    pub async fn list_visible(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, user_id, builtin
            FROM categories
            WHERE builtin OR user_id = $1
            ORDER BY name ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await
        .context("list categories")?;
        Ok(rows)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Category>> {
        let row = sqlx::query_as::<_, Category>(
            r#"SELECT id, name, user_id, builtin FROM categories WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
        .context("get category by id")?;
        Ok(row)
    }

    /// Looks a name up among the categories `user_id` may attach expenses to.
    pub async fn find_visible_by_name(
        db: &PgPool,
        user_id: Uuid,
        name: &str,
    ) -> anyhow::Result<Option<Category>> {
        let row = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, user_id, builtin
            FROM categories
            WHERE name = $2 AND (builtin OR user_id = $1)
            "#,
        )
        .bind(user_id)
        .bind(name)
        .fetch_optional(db)
        .await
        .context("get category by name")?;
        Ok(row)
    }

    /// Returns `None` when the name is already used by any category.
    pub async fn create(db: &PgPool, user_id: Uuid, name: &str) -> anyhow::Result<Option<Category>> {
        let row = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, user_id, builtin)
            VALUES ($1, $2, FALSE)
            ON CONFLICT (name) DO NOTHING
            RETURNING id, name, user_id, builtin
            "#,
        )
        .bind(name)
        .bind(user_id)
        .fetch_optional(db)
        .await
        .context("insert category")?;
        Ok(row)
    }

    /// True when at least one live expense references the category.
    pub async fn in_use(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let used: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM expenses WHERE category_id = $1 AND deleted_at IS NULL
            )
            "#,
        )
        .bind(id)
        .fetch_one(db)
        .await
        .context("check category usage")?;
        Ok(used)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM categories WHERE id = $1 AND NOT builtin")
            .bind(id)
            .execute(db)
            .await
            .context("delete category")?;
        Ok(())
    }
}
