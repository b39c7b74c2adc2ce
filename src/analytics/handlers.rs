use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use super::dto::{AnalyticsQuery, AnalyticsResponse};
use super::services::AnalyticsError;
use crate::{
    auth::services::AuthUser,
    dates::{parse_optional_date, DateWindow},
    error::{bad_request, internal, ApiError},
    state::AppState,
};

pub fn analytics_routes() -> Router<AppState> {
    Router::new().route("/analytics", get(get_analytics))
}

#[instrument(skip(state))]
pub async fn get_analytics(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<AnalyticsQuery>,
) -> Result<Json<AnalyticsResponse>, ApiError> {
    let travel_id = q
        .travel_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| bad_request("travel_id is required"))?;
    let travel_id =
        Uuid::parse_str(travel_id).map_err(|_| bad_request("invalid travel_id"))?;
    let from = parse_optional_date(q.from.as_deref()).map_err(|_| bad_request("invalid from date"))?;
    let to = parse_optional_date(q.to.as_deref()).map_err(|_| bad_request("invalid to date"))?;

    match state
        .analytics
        .aggregate(user_id, travel_id, DateWindow::new(from, to))
        .await
    {
        Ok(resp) => Ok(Json(resp)),
        Err(AnalyticsError::Validation(msg)) => {
            warn!(%user_id, %travel_id, %msg, "analytics rejected");
            Err(bad_request(msg))
        }
        Err(AnalyticsError::Store(e)) => Err(internal(e)),
    }
}
