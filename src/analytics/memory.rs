use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use rust_decimal::Decimal;
use time::OffsetDateTime;
use uuid::Uuid;

use super::store::{ExpenseFilter, LedgerStore, StoreResult, UNCATEGORIZED_LABEL};
use crate::dates::format_date;

/// Denormalised expense row held by [`MemoryLedger`].
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub user_id: Uuid,
    pub travel_id: Uuid,
    pub category: Option<String>,
    pub amount: Decimal,
    pub occurred_at: OffsetDateTime,
    pub deleted_at: Option<OffsetDateTime>,
}

impl LedgerEntry {
    fn matches(&self, filter: &ExpenseFilter) -> bool {
        self.deleted_at.is_none()
            && self.user_id == filter.user_id
            && self.travel_id == filter.travel_id
            && filter
                .window
                .contains(self.occurred_at.to_offset(time::UtcOffset::UTC).date())
    }
}

/// In-process ledger backing [`crate::state::AppState::fake`].
#[derive(Default)]
pub struct MemoryLedger {
    entries: RwLock<Vec<LedgerEntry>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<LedgerEntry>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    pub fn push(&self, entry: LedgerEntry) {
        let mut guard = self.entries.write().unwrap_or_else(|e| e.into_inner());
        guard.push(entry);
    }

    fn matching(&self, filter: &ExpenseFilter) -> Vec<LedgerEntry> {
        let guard = self.entries.read().unwrap_or_else(|e| e.into_inner());
        guard.iter().filter(|e| e.matches(filter)).cloned().collect()
    }
}

fn group_sum<K, F>(entries: &[LedgerEntry], key: F) -> BTreeMap<String, Decimal>
where
    F: Fn(&LedgerEntry) -> K,
    K: Into<String>,
{
    let mut sums = BTreeMap::new();
    for entry in entries {
        *sums.entry(key(entry).into()).or_insert(Decimal::ZERO) += entry.amount;
    }
    sums
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn sum_total(&self, filter: &ExpenseFilter) -> StoreResult<Decimal> {
        Ok(self.matching(filter).iter().map(|e| e.amount).sum())
    }

    async fn sum_by_category(
        &self,
        filter: &ExpenseFilter,
    ) -> StoreResult<BTreeMap<String, Decimal>> {
        let rows = self.matching(filter);
        Ok(group_sum(&rows, |e| {
            e.category
                .clone()
                .unwrap_or_else(|| UNCATEGORIZED_LABEL.to_string())
        }))
    }

    async fn sum_by_day(&self, filter: &ExpenseFilter) -> StoreResult<BTreeMap<String, Decimal>> {
        let rows = self.matching(filter);
        Ok(group_sum(&rows, |e| {
            format_date(e.occurred_at.to_offset(time::UtcOffset::UTC).date())
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::DateWindow;
    use time::macros::{date, datetime};

    fn entry(user: Uuid, travel: Uuid, cat: &str, amount: i64, at: OffsetDateTime) -> LedgerEntry {
        LedgerEntry {
            user_id: user,
            travel_id: travel,
            category: Some(cat.into()),
            amount: Decimal::from(amount),
            occurred_at: at,
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn day_bucket_uses_utc_date() {
        let (user, travel) = (Uuid::new_v4(), Uuid::new_v4());
        // 23:30 at UTC-02:00 is already the next day in UTC.
        let ledger = MemoryLedger::with_entries(vec![entry(
            user,
            travel,
            "Food",
            7,
            datetime!(2024-06-01 23:30 -2),
        )]);
        let filter = ExpenseFilter {
            user_id: user,
            travel_id: travel,
            window: DateWindow::unbounded(),
        };
        let by_day = ledger.sum_by_day(&filter).await.unwrap();
        assert_eq!(by_day.get("2024-06-02"), Some(&Decimal::from(7)));
    }

    #[tokio::test]
    async fn null_category_goes_to_uncategorized_bucket() {
        let (user, travel) = (Uuid::new_v4(), Uuid::new_v4());
        let mut e = entry(user, travel, "ignored", 4, datetime!(2024-06-01 10:00 UTC));
        e.category = None;
        let ledger = MemoryLedger::with_entries(vec![e]);
        let filter = ExpenseFilter {
            user_id: user,
            travel_id: travel,
            window: DateWindow::new(Some(date!(2024 - 06 - 01)), None),
        };
        let by_cat = ledger.sum_by_category(&filter).await.unwrap();
        assert_eq!(by_cat.get(UNCATEGORIZED_LABEL), Some(&Decimal::from(4)));
    }

    #[tokio::test]
    async fn push_makes_entry_visible() {
        let (user, travel) = (Uuid::new_v4(), Uuid::new_v4());
        let ledger = MemoryLedger::new();
        let filter = ExpenseFilter {
            user_id: user,
            travel_id: travel,
            window: DateWindow::unbounded(),
        };
        assert_eq!(ledger.sum_total(&filter).await.unwrap(), Decimal::ZERO);
        ledger.push(entry(user, travel, "Food", 3, datetime!(2024-06-01 10:00 UTC)));
        assert_eq!(ledger.sum_total(&filter).await.unwrap(), Decimal::from(3));
    }
}
