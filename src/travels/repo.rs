use anyhow::Context;
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct Travel {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub start_date: Date,
    pub end_date: Date,
    pub created_at: OffsetDateTime,
}

impl Travel {
    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        title: &str,
        start_date: Date,
        end_date: Date,
    ) -> anyhow::Result<Travel> {
        let travel = sqlx::query_as::<_, Travel>(
            r#"
            INSERT INTO travels (user_id, title, start_date, end_date)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, title, start_date, end_date, created_at
            "#,
        )
        .bind(user_id)
        .bind(title)
        .bind(start_date)
        .bind(end_date)
        .fetch_one(db)
        .await
        .context("insert travel")?;
        Ok(travel)
    }

    pub async fn find_by_id(db: &PgPool, travel_id: Uuid) -> anyhow::Result<Option<Travel>> {
        let travel = sqlx::query_as::<_, Travel>(
            r#"
            SELECT id, user_id, title, start_date, end_date, created_at
            FROM travels
            WHERE id = $1
            "#,
        )
        .bind(travel_id)
        .fetch_optional(db)
        .await
        .context("get travel by id")?;
        Ok(travel)
    }

    pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Travel>> {
        let rows = sqlx::query_as::<_, Travel>(
            r#"
            SELECT id, user_id, title, start_date, end_date, created_at
            FROM travels
            WHERE user_id = $1
            ORDER BY start_date ASC, created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await
        .context("list travels by user")?;
        Ok(rows)
    }
}
