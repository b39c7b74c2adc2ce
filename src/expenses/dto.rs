use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo::Expense;
use crate::dates::format_date;

#[derive(Debug, Deserialize)]
pub struct CreateExpenseRequest {
    pub travel_id: Uuid,
    pub category: String,
    pub amount: Decimal,
    pub date: String, // YYYY-MM-DD
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateExpenseRequest {
    pub category: String,
    pub amount: Decimal,
    pub date: String,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListExpensesQuery {
    pub travel_id: Option<Uuid>,
    pub category: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExpenseResponse {
    pub id: Uuid,
    pub travel_id: Uuid,
    pub category: Option<String>,
    pub amount: Decimal,
    pub date: String,
    pub comment: String,
}

impl From<Expense> for ExpenseResponse {
    fn from(e: Expense) -> Self {
        Self {
            id: e.id,
            travel_id: e.travel_id,
            category: e.category,
            amount: e.amount,
            date: format_date(e.occurred_at.to_offset(time::UtcOffset::UTC).date()),
            comment: e.note,
        }
    }
}
