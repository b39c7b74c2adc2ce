use std::sync::Arc;

use tracing::{debug, instrument};
use uuid::Uuid;

use super::dto::AnalyticsResponse;
use super::store::{ExpenseFilter, LedgerStore, StoreError};
use crate::dates::DateWindow;

#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Computes total, per-category and per-day sums for one trip of one user.
///
/// The three queries are issued one after another without a shared transaction,
/// so a write landing between them can make the totals disagree for that response.
#[derive(Clone)]
pub struct AnalyticsEngine {
    store: Arc<dyn LedgerStore>,
}

impl AnalyticsEngine {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn aggregate(
        &self,
        user_id: Uuid,
        travel_id: Uuid,
        window: DateWindow,
    ) -> Result<AnalyticsResponse, AnalyticsError> {
        if travel_id.is_nil() {
            return Err(AnalyticsError::Validation("travel_id is required".into()));
        }
        window
            .validate()
            .map_err(|e| AnalyticsError::Validation(e.to_string()))?;

        let filter = ExpenseFilter {
            user_id,
            travel_id,
            window,
        };

        let total = self.store.sum_total(&filter).await?;
        let by_category = self.store.sum_by_category(&filter).await?;
        let by_day = self.store.sum_by_day(&filter).await?;

        debug!(
            %total,
            categories = by_category.len(),
            days = by_day.len(),
            "analytics aggregated"
        );
        Ok(AnalyticsResponse {
            total,
            by_category,
            by_day,
        })
    }
}
