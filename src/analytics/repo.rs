use std::collections::BTreeMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use time::Date;
use tracing::debug;

use super::store::{ExpenseFilter, LedgerStore, StoreResult, UNCATEGORIZED_LABEL};
use crate::dates::format_date;

// $1 user_id, $2 travel_id, $3 inclusive lower bound, $4 exclusive upper bound.
const SCOPE: &str = r#"
      e.user_id = $1
  AND e.travel_id = $2
  AND e.deleted_at IS NULL
  AND ($3::timestamptz IS NULL OR e.occurred_at >= $3)
  AND ($4::timestamptz IS NULL OR e.occurred_at < $4)
"#;

/// Postgres-backed ledger. Each query runs on its own pooled connection.
#[derive(Clone)]
pub struct PgLedgerStore {
    db: PgPool,
}

impl PgLedgerStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn sum_total(&self, filter: &ExpenseFilter) -> StoreResult<Decimal> {
        let sql = format!(
            "SELECT COALESCE(SUM(e.amount), 0) FROM expenses e WHERE {SCOPE}"
        );
        let total: Decimal = sqlx::query_scalar(&sql)
            .bind(filter.user_id)
            .bind(filter.travel_id)
            .bind(filter.window.lower_bound())
            .bind(filter.window.upper_bound_exclusive())
            .fetch_one(&self.db)
            .await?;
        debug!(user_id = %filter.user_id, travel_id = %filter.travel_id, %total, "sum_total");
        Ok(total)
    }

    async fn sum_by_category(
        &self,
        filter: &ExpenseFilter,
    ) -> StoreResult<BTreeMap<String, Decimal>> {
        let sql = format!(
            r#"
            SELECT COALESCE(c.name, $5) AS category, SUM(e.amount) AS amount
              FROM expenses e
              LEFT JOIN categories c ON c.id = e.category_id
             WHERE {SCOPE}
             GROUP BY 1
            "#
        );
        let rows: Vec<(String, Decimal)> = sqlx::query_as(&sql)
            .bind(filter.user_id)
            .bind(filter.travel_id)
            .bind(filter.window.lower_bound())
            .bind(filter.window.upper_bound_exclusive())
            .bind(UNCATEGORIZED_LABEL)
            .fetch_all(&self.db)
            .await?;
        debug!(buckets = rows.len(), "sum_by_category");
        Ok(rows.into_iter().collect())
    }

    async fn sum_by_day(&self, filter: &ExpenseFilter) -> StoreResult<BTreeMap<String, Decimal>> {
        let sql = format!(
            r#"
            SELECT (e.occurred_at AT TIME ZONE 'UTC')::date AS day, SUM(e.amount) AS amount
              FROM expenses e
             WHERE {SCOPE}
             GROUP BY 1
            "#
        );
        let rows: Vec<(Date, Decimal)> = sqlx::query_as(&sql)
            .bind(filter.user_id)
            .bind(filter.travel_id)
            .bind(filter.window.lower_bound())
            .bind(filter.window.upper_bound_exclusive())
            .fetch_all(&self.db)
            .await?;
        debug!(buckets = rows.len(), "sum_by_day");
        Ok(rows
            .into_iter()
            .map(|(day, amount)| (format_date(day), amount))
            .collect())
    }
}
