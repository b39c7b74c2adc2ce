use rust_decimal::{Decimal, RoundingStrategy};
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::{Expense, ExpenseDraft};
use crate::{
    categories::repo::Category,
    dates::{parse_date, start_of_day_utc},
    error::{bad_request, forbidden, internal, not_found, ApiError},
};

pub const MAX_COMMENT_LEN: usize = 500;

/// Largest value the `NUMERIC(14, 2)` amount column holds.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 2);

/// Field-level checks done before any database access.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckedFields {
    pub category: String,
    pub amount: Decimal,
    pub occurred_at: OffsetDateTime,
    pub note: String,
}

pub fn check_fields(
    category: &str,
    amount: Decimal,
    date: &str,
    comment: &str,
) -> Result<CheckedFields, ApiError> {
    let category = category.trim();
    if category.is_empty() {
        return Err(bad_request("category is required"));
    }
    if amount < Decimal::ZERO {
        return Err(bad_request("amount must not be negative"));
    }
    let amount = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if amount > MAX_AMOUNT {
        return Err(bad_request("amount is too large"));
    }
    let day = parse_date(date).map_err(|_| bad_request("invalid date"))?;
    let note = comment.trim();
    if note.chars().count() > MAX_COMMENT_LEN {
        return Err(bad_request("comment is too long"));
    }
    Ok(CheckedFields {
        category: category.to_string(),
        amount,
        occurred_at: start_of_day_utc(day),
        note: note.to_string(),
    })
}

/// Resolves the category name for `user_id` and turns checked fields into a draft.
pub async fn into_draft(
    db: &PgPool,
    user_id: Uuid,
    fields: CheckedFields,
) -> Result<ExpenseDraft, ApiError> {
    let category = Category::find_visible_by_name(db, user_id, &fields.category)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found("category not found or unavailable"))?;
    Ok(ExpenseDraft {
        category_id: category.id,
        amount: fields.amount,
        occurred_at: fields.occurred_at,
        note: fields.note,
    })
}

/// Loads a live expense and checks it belongs to `user_id`.
pub async fn load_owned(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<Expense, ApiError> {
    let expense = Expense::find_live_by_id(db, id)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found("expense not found"))?;
    ensure_owner(&expense, user_id)?;
    Ok(expense)
}

pub fn ensure_owner(expense: &Expense, user_id: Uuid) -> Result<(), ApiError> {
    if expense.user_id != user_id {
        return Err(forbidden("cannot modify another user's expense"));
    }
    Ok(())
}
