use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::Travel;
use crate::dates::format_date;

#[derive(Debug, Deserialize)]
pub struct CreateTravelRequest {
    pub title: String,
    pub start_date: String, // YYYY-MM-DD
    pub end_date: String,
}

#[derive(Debug, Serialize)]
pub struct TravelResponse {
    pub id: Uuid,
    pub title: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Travel> for TravelResponse {
    fn from(t: Travel) -> Self {
        Self {
            id: t.id,
            title: t.title,
            start_date: format_date(t.start_date),
            end_date: format_date(t.end_date),
            created_at: t.created_at,
        }
    }
}
