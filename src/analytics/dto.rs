use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Raw query string of `GET /analytics`; parsed in the handler so bad input maps to 400.
#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQuery {
    pub travel_id: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsResponse {
    pub total: Decimal,
    pub by_category: BTreeMap<String, Decimal>,
    pub by_day: BTreeMap<String, Decimal>,
}
