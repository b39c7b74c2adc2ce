use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{CategoryResponse, CreateCategoryRequest};
use super::repo::Category;
use crate::{
    analytics::store::UNCATEGORIZED_LABEL,
    auth::services::AuthUser,
    error::{bad_request, conflict, forbidden, internal, not_found, ApiError},
    state::AppState,
};

const MAX_NAME_LEN: usize = 64;

pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/:id", delete(delete_category))
}

fn normalize_name(raw: &str) -> Result<String, ApiError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(bad_request("name is required"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(bad_request("name is too long"));
    }
    // Analytics reports expenses without a category under this label.
    if name.eq_ignore_ascii_case(UNCATEGORIZED_LABEL) {
        return Err(bad_request("name is reserved"));
    }
    Ok(name.to_string())
}

/// Ownership rules for deletion; usage by expenses is checked separately.
fn check_deletable(category: &Category, user_id: Uuid) -> Result<(), ApiError> {
    if category.builtin {
        return Err(bad_request("cannot delete builtin category"));
    }
    if category.user_id != Some(user_id) {
        return Err(forbidden("cannot delete another user's category"));
    }
    Ok(())
}

#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let rows = Category::list_visible(&state.db, user_id)
        .await
        .map_err(internal)?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state, body))]
pub async fn create_category(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>), ApiError> {
    let name = normalize_name(&body.name)?;

    match Category::create(&state.db, user_id, &name).await.map_err(internal)? {
        Some(c) => {
            info!(%user_id, category_id = %c.id, name = %c.name, "category created");
            Ok((StatusCode::CREATED, Json(c.into())))
        }
        None => {
            warn!(%user_id, %name, "category name taken");
            Err(conflict("category already exists"))
        }
    }
}

#[instrument(skip(state))]
pub async fn delete_category(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let category = Category::find_by_id(&state.db, id)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found("category not found"))?;

    check_deletable(&category, user_id)?;

    if Category::in_use(&state.db, id).await.map_err(internal)? {
        return Err(conflict("category is used in expenses"));
    }

    Category::delete(&state.db, id).await.map_err(internal)?;
    info!(%user_id, category_id = %id, name = %category.name, "category deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(user_id: Option<Uuid>, builtin: bool) -> Category {
        Category {
            id: Uuid::new_v4(),
            name: "Snacks".into(),
            user_id,
            builtin,
        }
    }

    #[test]
    fn names_are_trimmed_and_bounded() {
        assert_eq!(normalize_name("  Souvenirs ").unwrap(), "Souvenirs");
        assert_eq!(normalize_name("").unwrap_err().0, StatusCode::BAD_REQUEST);
        assert_eq!(normalize_name("   ").unwrap_err().0, StatusCode::BAD_REQUEST);
        assert!(normalize_name(&"ы".repeat(MAX_NAME_LEN)).is_ok());
        assert!(normalize_name(&"ы".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn fallback_bucket_label_is_reserved() {
        for name in [UNCATEGORIZED_LABEL, " uncategorized ", "UNCATEGORIZED"] {
            let (status, msg) = normalize_name(name).unwrap_err();
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(msg, "name is reserved");
        }
        assert!(normalize_name("Uncategorized stuff").is_ok());
    }

    #[test]
    fn owner_may_delete_own_category() {
        let me = Uuid::new_v4();
        assert!(check_deletable(&category(Some(me), false), me).is_ok());
    }

    #[test]
    fn builtin_is_bad_request() {
        let me = Uuid::new_v4();
        let (status, _) = check_deletable(&category(None, true), me).unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn foreign_category_is_forbidden() {
        let (status, _) =
            check_deletable(&category(Some(Uuid::new_v4()), false), Uuid::new_v4()).unwrap_err();
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
