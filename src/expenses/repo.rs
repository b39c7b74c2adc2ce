use anyhow::Context;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::dates::DateWindow;

/// Expense row joined with its category name.
#[derive(Debug, Clone, FromRow)]
pub struct Expense {
    pub id: Uuid,
    pub user_id: Uuid,
    pub travel_id: Uuid,
    pub category_id: Option<Uuid>,
    pub category: Option<String>,
    pub amount: Decimal,
    pub occurred_at: OffsetDateTime,
    pub note: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct ExpenseDraft {
    pub category_id: Uuid,
    pub amount: Decimal,
    pub occurred_at: OffsetDateTime,
    pub note: String,
}

#[derive(Debug, Clone, Default)]
pub struct ExpenseListFilter {
    pub travel_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub window: DateWindow,
}

const SELECT_JOINED: &str = r#"
    SELECT e.id, e.user_id, e.travel_id, e.category_id, c.name AS category,
           e.amount, e.occurred_at, e.note, e.created_at, e.updated_at
      FROM expenses e
      LEFT JOIN categories c ON c.id = e.category_id
"#;

impl Expense {
    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        travel_id: Uuid,
        draft: &ExpenseDraft,
    ) -> anyhow::Result<Expense> {
        let row = sqlx::query_as::<_, Expense>(
            r#"
            WITH e AS (
                INSERT INTO expenses (user_id, travel_id, category_id, amount, occurred_at, note)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
            )
            SELECT e.id, e.user_id, e.travel_id, e.category_id, c.name AS category,
                   e.amount, e.occurred_at, e.note, e.created_at, e.updated_at
              FROM e
              LEFT JOIN categories c ON c.id = e.category_id
            "#,
        )
        .bind(user_id)
        .bind(travel_id)
        .bind(draft.category_id)
        .bind(draft.amount)
        .bind(draft.occurred_at)
        .bind(&draft.note)
        .fetch_one(db)
        .await
        .context("insert expense")?;
        Ok(row)
    }

    /// Tombstoned rows are treated as missing.
    pub async fn find_live_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Expense>> {
        let sql = format!("{SELECT_JOINED} WHERE e.id = $1 AND e.deleted_at IS NULL");
        let row = sqlx::query_as::<_, Expense>(&sql)
            .bind(id)
            .fetch_optional(db)
            .await
            .context("get expense by id")?;
        Ok(row)
    }

    pub async fn list_by_user(
        db: &PgPool,
        user_id: Uuid,
        filter: &ExpenseListFilter,
    ) -> anyhow::Result<Vec<Expense>> {
        let sql = format!(
            r#"{SELECT_JOINED}
             WHERE e.user_id = $1
               AND e.deleted_at IS NULL
               AND ($2::uuid IS NULL OR e.travel_id = $2)
               AND ($3::uuid IS NULL OR e.category_id = $3)
               AND ($4::timestamptz IS NULL OR e.occurred_at >= $4)
               AND ($5::timestamptz IS NULL OR e.occurred_at < $5)
             ORDER BY e.occurred_at DESC, e.created_at DESC
            "#
        );
        let rows = sqlx::query_as::<_, Expense>(&sql)
            .bind(user_id)
            .bind(filter.travel_id)
            .bind(filter.category_id)
            .bind(filter.window.lower_bound())
            .bind(filter.window.upper_bound_exclusive())
            .fetch_all(db)
            .await
            .context("list expenses")?;
        Ok(rows)
    }

    pub async fn update(db: &PgPool, id: Uuid, draft: &ExpenseDraft) -> anyhow::Result<Option<Expense>> {
        let row = sqlx::query_as::<_, Expense>(
            r#"
            WITH e AS (
                UPDATE expenses
                   SET category_id = $2, amount = $3, occurred_at = $4, note = $5, updated_at = now()
                 WHERE id = $1 AND deleted_at IS NULL
                RETURNING *
            )
            SELECT e.id, e.user_id, e.travel_id, e.category_id, c.name AS category,
                   e.amount, e.occurred_at, e.note, e.created_at, e.updated_at
              FROM e
              LEFT JOIN categories c ON c.id = e.category_id
            "#,
        )
        .bind(id)
        .bind(draft.category_id)
        .bind(draft.amount)
        .bind(draft.occurred_at)
        .bind(&draft.note)
        .fetch_optional(db)
        .await
        .context("update expense")?;
        Ok(row)
    }

    /// Sets the tombstone. Returns false if the row was already gone.
    pub async fn soft_delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query(
            "UPDATE expenses SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(db)
        .await
        .context("soft delete expense")?;
        Ok(res.rows_affected() > 0)
    }
}
