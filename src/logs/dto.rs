use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::foods::repo::NutrientValues;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// The food being logged: an already-resolved record, an external catalog
/// id, or an inline manual entry. Exactly one must be provided.
#[derive(Debug, Deserialize)]
pub struct CreateLogEntryRequest {
    pub food_id: Option<Uuid>,
    pub external_id: Option<i64>,
    pub manual: Option<ManualEntry>,

    pub quantity: f64,
    pub unit: String,
    #[serde(with = "time::serde::rfc3339")]
    pub logged_at: OffsetDateTime,
    /// User timezone as minutes east of UTC. Defaults to the offset
    /// carried by `logged_at`.
    pub tz_offset_minutes: Option<i32>,
    /// Optional client assertion; rejected if it disagrees with
    /// `logged_at` projected into the user's timezone.
    #[serde(default, with = "iso_date::option")]
    pub logged_date: Option<Date>,
}

#[derive(Debug, Deserialize)]
pub struct ManualEntry {
    pub description: String,
    pub brand_name: Option<String>,
    #[serde(default)]
    pub nutrients: NutrientValues,
}

#[derive(Debug, Deserialize)]
pub struct StreakQuery {
    pub tz_offset_minutes: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct StreakResponse {
    pub streak: u32,
    #[serde(with = "iso_date::option")]
    pub most_recent_date: Option<Date>,
}
