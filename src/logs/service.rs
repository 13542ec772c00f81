use time::{OffsetDateTime, UtcOffset};
use tracing::info;
use uuid::Uuid;

use crate::catalog::CatalogClient;
use crate::error::AppError;
use crate::foods::repo::FoodStore;
use crate::foods::resolver::{self, ManualFood};

use super::dto::CreateLogEntryRequest;
use super::repo::{LogEntry, LogStore, NewLogEntry};
use super::streak::{compute_streak, StreakResult};

/// Resolve the referenced food, derive the calendar date from the logged
/// instant, and write the entry.
pub async fn create_entry(
    foods: &dyn FoodStore,
    catalog: &dyn CatalogClient,
    logs: &dyn LogStore,
    user_id: Uuid,
    req: CreateLogEntryRequest,
) -> Result<LogEntry, AppError> {
    if !req.quantity.is_finite() || req.quantity <= 0.0 {
        return Err(AppError::InvalidInput(
            "quantity must be a positive number".into(),
        ));
    }
    if req.unit.trim().is_empty() {
        return Err(AppError::InvalidInput("unit must not be empty".into()));
    }

    let tz = user_offset(req.tz_offset_minutes, req.logged_at)?;
    let logged_date = req.logged_at.to_offset(tz).date();
    if let Some(claimed) = req.logged_date {
        if claimed != logged_date {
            return Err(AppError::InvalidInput(format!(
                "logged_date {claimed} does not match logged_at in the user's timezone ({logged_date})"
            )));
        }
    }

    let food = match (req.food_id, req.external_id, req.manual) {
        (Some(food_id), None, None) => foods
            .get(food_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("no food record {food_id}")))?,
        (None, Some(external_id), None) => {
            resolver::resolve_by_external_id(foods, catalog, external_id).await?
        }
        (None, None, Some(manual)) => {
            resolver::resolve_manual(
                foods,
                ManualFood {
                    description: manual.description,
                    brand_name: manual.brand_name,
                    serving_size: None,
                    serving_unit: None,
                    nutrients: manual.nutrients,
                },
            )
            .await?
        }
        _ => {
            return Err(AppError::InvalidInput(
                "provide exactly one of food_id, external_id, or manual".into(),
            ))
        }
    };

    let entry = logs
        .insert_entry(NewLogEntry {
            user_id,
            food_id: food.id,
            quantity: req.quantity,
            unit: req.unit,
            logged_at: req.logged_at,
            logged_date,
        })
        .await?;
    info!(%user_id, entry_id = %entry.id, %logged_date, "log entry created");
    Ok(entry)
}

/// Current streak for the user, with "today" taken in the user's timezone.
pub async fn streak_for_user(
    logs: &dyn LogStore,
    user_id: Uuid,
    tz_offset_minutes: Option<i32>,
    now: OffsetDateTime,
) -> Result<StreakResult, AppError> {
    let tz = user_offset(tz_offset_minutes, now)?;
    let today = now.to_offset(tz).date();
    let dates = logs.list_log_dates(user_id, None).await?;
    Ok(compute_streak(&dates, today))
}

fn user_offset(minutes: Option<i32>, fallback: OffsetDateTime) -> Result<UtcOffset, AppError> {
    match minutes {
        None => Ok(fallback.offset()),
        Some(m) => m
            .checked_mul(60)
            .and_then(|secs| UtcOffset::from_whole_seconds(secs).ok())
            .ok_or_else(|| AppError::InvalidInput(format!("invalid tz offset {m} minutes"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use time::macros::{date, datetime};
    use time::Date;

    use crate::catalog::{CatalogFood, CatalogSearchHit};
    use crate::foods::repo::{FoodRecord, InsertOutcome, NewFoodRecord};

    #[derive(Default)]
    struct MemLogStore {
        entries: Mutex<Vec<LogEntry>>,
    }

    #[async_trait]
    impl LogStore for MemLogStore {
        async fn insert_entry(&self, new: NewLogEntry) -> anyhow::Result<LogEntry> {
            let entry = LogEntry {
                id: Uuid::new_v4(),
                user_id: new.user_id,
                food_id: new.food_id,
                quantity: new.quantity,
                unit: new.unit,
                logged_at: new.logged_at,
                logged_date: new.logged_date,
            };
            self.entries.lock().unwrap().push(entry.clone());
            Ok(entry)
        }

        async fn list_log_dates(
            &self,
            user_id: Uuid,
            _since: Option<Date>,
        ) -> anyhow::Result<Vec<Date>> {
            Ok(self
                .entries
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.user_id == user_id)
                .map(|e| e.logged_date)
                .collect())
        }

        async fn soft_delete(&self, _user_id: Uuid, _entry_id: Uuid) -> anyhow::Result<bool> {
            Ok(false)
        }
    }

    struct SingleFoodStore {
        record: FoodRecord,
    }

    #[async_trait]
    impl FoodStore for SingleFoodStore {
        async fn get(&self, id: Uuid) -> anyhow::Result<Option<FoodRecord>> {
            Ok((self.record.id == id).then(|| self.record.clone()))
        }

        async fn find_by_external_id(&self, _: i64) -> anyhow::Result<Option<FoodRecord>> {
            Ok(None)
        }

        async fn find_manual_by_description(&self, _: &str) -> anyhow::Result<Option<FoodRecord>> {
            Ok(None)
        }

        async fn insert(&self, _: NewFoodRecord) -> anyhow::Result<InsertOutcome> {
            anyhow::bail!("unexpected insert")
        }
    }

    struct NoCatalog;

    #[async_trait]
    impl CatalogClient for NoCatalog {
        async fn search(&self, _: &str) -> Result<Vec<CatalogSearchHit>, AppError> {
            Ok(vec![])
        }

        async fn get_details(&self, _: i64) -> Result<Option<CatalogFood>, AppError> {
            Ok(None)
        }
    }

    fn oatmeal() -> FoodRecord {
        FoodRecord {
            id: Uuid::new_v4(),
            external_id: None,
            description: "Oatmeal".into(),
            brand_name: None,
            serving_size: None,
            serving_unit: None,
            calories: Some(380.0),
            protein_g: None,
            fat_g: None,
            carbs_g: None,
            fiber_g: None,
            sugar_g: None,
            sodium_mg: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn base_request(food_id: Uuid) -> CreateLogEntryRequest {
        CreateLogEntryRequest {
            food_id: Some(food_id),
            external_id: None,
            manual: None,
            quantity: 40.0,
            unit: "g".into(),
            logged_at: datetime!(2024-06-01 23:30 UTC),
            tz_offset_minutes: None,
            logged_date: None,
        }
    }

    #[tokio::test]
    async fn logged_date_is_projected_into_the_user_timezone() {
        let record = oatmeal();
        let foods = SingleFoodStore {
            record: record.clone(),
        };
        let logs = MemLogStore::default();

        // 23:30 UTC is already the next day at UTC+2.
        let mut req = base_request(record.id);
        req.tz_offset_minutes = Some(120);
        let entry = create_entry(&foods, &NoCatalog, &logs, Uuid::new_v4(), req)
            .await
            .expect("entry created");
        assert_eq!(entry.logged_date, date!(2024 - 06 - 02));
    }

    #[tokio::test]
    async fn mismatched_logged_date_is_rejected() {
        let record = oatmeal();
        let foods = SingleFoodStore {
            record: record.clone(),
        };
        let logs = MemLogStore::default();

        let mut req = base_request(record.id);
        req.tz_offset_minutes = Some(120);
        req.logged_date = Some(date!(2024 - 06 - 01));
        let err = create_entry(&foods, &NoCatalog, &logs, Uuid::new_v4(), req)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert!(logs.entries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn zero_quantity_is_rejected_before_any_io() {
        let record = oatmeal();
        let foods = SingleFoodStore {
            record: record.clone(),
        };
        let logs = MemLogStore::default();

        let mut req = base_request(record.id);
        req.quantity = 0.0;
        let err = create_entry(&foods, &NoCatalog, &logs, Uuid::new_v4(), req)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn exactly_one_food_reference_is_required() {
        let record = oatmeal();
        let foods = SingleFoodStore {
            record: record.clone(),
        };
        let logs = MemLogStore::default();

        let mut req = base_request(record.id);
        req.external_id = Some(42);
        let err = create_entry(&foods, &NoCatalog, &logs, Uuid::new_v4(), req)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn out_of_range_tz_offset_is_rejected_not_a_panic() {
        let logs = MemLogStore::default();
        let now = datetime!(2024-06-01 12:00 UTC);
        for minutes in [i32::MAX, i32::MIN, 100_000, -100_000] {
            let err = streak_for_user(&logs, Uuid::new_v4(), Some(minutes), now)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::InvalidInput(_)), "offset {minutes}");
        }
    }

    #[tokio::test]
    async fn streak_uses_today_in_the_user_timezone() {
        let record = oatmeal();
        let foods = SingleFoodStore {
            record: record.clone(),
        };
        let logs = MemLogStore::default();
        let user_id = Uuid::new_v4();

        let mut req = base_request(record.id);
        req.tz_offset_minutes = Some(120);
        create_entry(&foods, &NoCatalog, &logs, user_id, req)
            .await
            .expect("entry created");

        // Still 2024-06-01 in UTC, but 2024-06-02 for the user: the entry
        // counts as "today".
        let now = datetime!(2024-06-01 23:45 UTC);
        let result = streak_for_user(&logs, user_id, Some(120), now)
            .await
            .expect("streak");
        assert_eq!(result.streak, 1);
        assert_eq!(result.most_recent_date, Some(date!(2024 - 06 - 02)));

        let utc_view = streak_for_user(&logs, user_id, Some(0), now)
            .await
            .expect("streak in utc");
        assert_eq!(utc_view.streak, 0);
    }
}
