use std::collections::BTreeMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::dates::DateWindow;

/// Bucket label for expenses whose category reference is NULL.
pub const UNCATEGORIZED_LABEL: &str = "Uncategorized";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Scope shared by all three aggregate queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpenseFilter {
    pub user_id: Uuid,
    pub travel_id: Uuid,
    pub window: DateWindow,
}

/// Grouped-sum queries over live expenses.
///
/// Implementations must restrict every query to `(user_id, travel_id)` jointly,
/// skip tombstoned rows and apply `window` inclusively on both ends.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn sum_total(&self, filter: &ExpenseFilter) -> StoreResult<Decimal>;

    async fn sum_by_category(&self, filter: &ExpenseFilter)
        -> StoreResult<BTreeMap<String, Decimal>>;

    /// Keys are `YYYY-MM-DD` of the UTC occurrence date.
    async fn sum_by_day(&self, filter: &ExpenseFilter) -> StoreResult<BTreeMap<String, Decimal>>;
}
