use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{CreateExpenseRequest, ExpenseResponse, ListExpensesQuery, UpdateExpenseRequest};
use super::repo::{Expense, ExpenseListFilter};
use super::services::{check_fields, into_draft, load_owned};
use crate::{
    auth::services::AuthUser,
    categories::repo::Category,
    dates::{parse_optional_date, DateWindow},
    error::{bad_request, forbidden, internal, not_found, ApiError},
    state::AppState,
    travels::repo::Travel,
};

pub fn expense_routes() -> Router<AppState> {
    Router::new()
        .route("/expenses", get(list_expenses).post(create_expense))
        .route("/expenses/:id", put(update_expense).delete(delete_expense))
}

#[instrument(skip(state, body))]
pub async fn create_expense(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreateExpenseRequest>,
) -> Result<(StatusCode, HeaderMap, Json<ExpenseResponse>), ApiError> {
    let fields = check_fields(&body.category, body.amount, &body.date, &body.comment)?;

    // Rows are only ever stored against a trip the caller owns.
    match Travel::find_by_id(&state.db, body.travel_id)
        .await
        .map_err(internal)?
    {
        Some(t) if t.user_id == user_id => {}
        _ => {
            warn!(%user_id, travel_id = %body.travel_id, "expense for foreign or unknown travel");
            return Err(forbidden("invalid travel"));
        }
    }

    let draft = into_draft(&state.db, user_id, fields).await?;
    let expense = Expense::create(&state.db, user_id, body.travel_id, &draft)
        .await
        .map_err(internal)?;
    info!(%user_id, expense_id = %expense.id, amount = %expense.amount, "expense created");

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/expenses/{}", expense.id)) {
        headers.insert(axum::http::header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(expense.into())))
}

#[instrument(skip(state))]
pub async fn list_expenses(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<ListExpensesQuery>,
) -> Result<Json<Vec<ExpenseResponse>>, ApiError> {
    let from = parse_optional_date(q.from.as_deref()).map_err(|_| bad_request("invalid from date"))?;
    let to = parse_optional_date(q.to.as_deref()).map_err(|_| bad_request("invalid to date"))?;
    let window = DateWindow::new(from, to);
    window.validate().map_err(|e| bad_request(e.to_string()))?;

    let category_id = match q.category.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(name) => Some(
            Category::find_visible_by_name(&state.db, user_id, name)
                .await
                .map_err(internal)?
                .ok_or_else(|| not_found("category not found"))?
                .id,
        ),
        None => None,
    };

    let filter = ExpenseListFilter {
        travel_id: q.travel_id,
        category_id,
        window,
    };
    let rows = Expense::list_by_user(&state.db, user_id, &filter)
        .await
        .map_err(internal)?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state, body))]
pub async fn update_expense(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateExpenseRequest>,
) -> Result<Json<ExpenseResponse>, ApiError> {
    let fields = check_fields(&body.category, body.amount, &body.date, &body.comment)?;
    load_owned(&state.db, user_id, id).await?;

    let draft = into_draft(&state.db, user_id, fields).await?;
    let updated = Expense::update(&state.db, id, &draft)
        .await
        .map_err(internal)?
        // deleted between the ownership check and the update
        .ok_or_else(|| not_found("expense not found"))?;
    info!(%user_id, expense_id = %id, "expense updated");
    Ok(Json(updated.into()))
}

#[instrument(skip(state))]
pub async fn delete_expense(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    load_owned(&state.db, user_id, id).await?;
    if !Expense::soft_delete(&state.db, id).await.map_err(internal)? {
        return Err(not_found("expense not found"));
    }
    info!(%user_id, expense_id = %id, "expense deleted");
    Ok(StatusCode::NO_CONTENT)
}
