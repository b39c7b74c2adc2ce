use axum::{
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use time::Date;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{CreateTravelRequest, TravelResponse};
use super::repo::Travel;
use crate::{
    auth::services::AuthUser,
    dates::parse_date,
    error::{bad_request, internal, not_found, ApiError},
    state::AppState,
};

const MAX_TITLE_LEN: usize = 200;

pub fn travel_routes() -> Router<AppState> {
    Router::new()
        .route("/travels", get(list_travels).post(create_travel))
        .route("/travels/:id", get(get_travel))
}

/// Checks a create request and returns `(title, start, end)`.
fn validate_new_travel(req: &CreateTravelRequest) -> Result<(String, Date, Date), ApiError> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(bad_request("title is required"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(bad_request("title is too long"));
    }
    let start = parse_date(&req.start_date).map_err(|_| bad_request("invalid start date"))?;
    let end = parse_date(&req.end_date).map_err(|_| bad_request("invalid end date"))?;
    if end < start {
        return Err(bad_request("end date must not be before start date"));
    }
    Ok((title.to_string(), start, end))
}

#[instrument(skip(state, body))]
pub async fn create_travel(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreateTravelRequest>,
) -> Result<(StatusCode, HeaderMap, Json<TravelResponse>), ApiError> {
    let (title, start, end) = validate_new_travel(&body).map_err(|e| {
        warn!(%user_id, reason = %e.1, "travel rejected");
        e
    })?;

    let travel = Travel::create(&state.db, user_id, &title, start, end)
        .await
        .map_err(internal)?;
    info!(%user_id, travel_id = %travel.id, "travel created");

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/travels/{}", travel.id)) {
        headers.insert(axum::http::header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(travel.into())))
}

#[instrument(skip(state))]
pub async fn list_travels(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<TravelResponse>>, ApiError> {
    let travels = Travel::list_by_user(&state.db, user_id)
        .await
        .map_err(internal)?;
    Ok(Json(travels.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state))]
pub async fn get_travel(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TravelResponse>, ApiError> {
    match Travel::find_by_id(&state.db, id).await.map_err(internal)? {
        // Someone else's trip looks exactly like a missing one.
        Some(t) if t.user_id == user_id => Ok(Json(t.into())),
        _ => Err(not_found("Travel not found")),
    }
}
