use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Canonical nutrition-facts entity. Values are per 100 units of the food
/// and fixed at creation time; rows are never mutated or hard-deleted by
/// this service.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FoodRecord {
    pub id: Uuid,
    pub external_id: Option<i64>,
    pub description: String,
    pub brand_name: Option<String>,
    pub serving_size: Option<f64>,
    pub serving_unit: Option<String>,
    pub calories: Option<f64>,
    pub protein_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fiber_g: Option<f64>,
    pub sugar_g: Option<f64>,
    pub sodium_mg: Option<f64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Per-100-units nutrient values, each optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NutrientValues {
    pub calories: Option<f64>,
    pub protein_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fiber_g: Option<f64>,
    pub sugar_g: Option<f64>,
    pub sodium_mg: Option<f64>,
}

impl NutrientValues {
    fn fields(&self) -> [(&'static str, Option<f64>); 7] {
        [
            ("calories", self.calories),
            ("protein_g", self.protein_g),
            ("fat_g", self.fat_g),
            ("carbs_g", self.carbs_g),
            ("fiber_g", self.fiber_g),
            ("sugar_g", self.sugar_g),
            ("sodium_mg", self.sodium_mg),
        ]
    }

    /// Name of the first negative or non-finite field, if any.
    pub fn first_invalid(&self) -> Option<&'static str> {
        self.fields()
            .into_iter()
            .find(|(_, v)| v.is_some_and(|v| !v.is_finite() || v < 0.0))
            .map(|(name, _)| name)
    }

    pub fn scale(&self, factor: f64) -> Self {
        Self {
            calories: self.calories.map(|v| v * factor),
            protein_g: self.protein_g.map(|v| v * factor),
            fat_g: self.fat_g.map(|v| v * factor),
            carbs_g: self.carbs_g.map(|v| v * factor),
            fiber_g: self.fiber_g.map(|v| v * factor),
            sugar_g: self.sugar_g.map(|v| v * factor),
            sodium_mg: self.sodium_mg.map(|v| v * factor),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewFoodRecord {
    pub external_id: Option<i64>,
    pub description: String,
    pub brand_name: Option<String>,
    pub serving_size: Option<f64>,
    pub serving_unit: Option<String>,
    pub nutrients: NutrientValues,
}

/// Result of an insert attempt. `Conflict` means a uniqueness constraint
/// fired; the caller re-fetches and decides what that means for its path.
#[derive(Debug)]
pub enum InsertOutcome {
    Inserted(FoodRecord),
    Conflict,
}

#[async_trait]
pub trait FoodStore: Send + Sync {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<FoodRecord>>;
    async fn find_by_external_id(&self, external_id: i64) -> anyhow::Result<Option<FoodRecord>>;
    async fn find_manual_by_description(
        &self,
        description: &str,
    ) -> anyhow::Result<Option<FoodRecord>>;
    async fn insert(&self, new: NewFoodRecord) -> anyhow::Result<InsertOutcome>;
}

pub struct PgFoodStore {
    db: PgPool,
}

impl PgFoodStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const SELECT_COLUMNS: &str = r#"
    id, external_id, description, brand_name, serving_size, serving_unit,
    calories, protein_g, fat_g, carbs_g, fiber_g, sugar_g, sodium_mg, created_at
"#;

#[async_trait]
impl FoodStore for PgFoodStore {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<FoodRecord>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM food_records WHERE id = $1");
        let record = sqlx::query_as::<_, FoodRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(record)
    }

    async fn find_by_external_id(&self, external_id: i64) -> anyhow::Result<Option<FoodRecord>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM food_records WHERE external_id = $1");
        let record = sqlx::query_as::<_, FoodRecord>(&sql)
            .bind(external_id)
            .fetch_optional(&self.db)
            .await?;
        Ok(record)
    }

    async fn find_manual_by_description(
        &self,
        description: &str,
    ) -> anyhow::Result<Option<FoodRecord>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM food_records
             WHERE external_id IS NULL AND description = $1"
        );
        let record = sqlx::query_as::<_, FoodRecord>(&sql)
            .bind(description)
            .fetch_optional(&self.db)
            .await?;
        Ok(record)
    }

    async fn insert(&self, new: NewFoodRecord) -> anyhow::Result<InsertOutcome> {
        let sql = format!(
            "INSERT INTO food_records
                (external_id, description, brand_name, serving_size, serving_unit,
                 calories, protein_g, fat_g, carbs_g, fiber_g, sugar_g, sodium_mg)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {SELECT_COLUMNS}"
        );
        let result = sqlx::query_as::<_, FoodRecord>(&sql)
        .bind(new.external_id)
        .bind(&new.description)
        .bind(&new.brand_name)
        .bind(new.serving_size)
        .bind(&new.serving_unit)
        .bind(new.nutrients.calories)
        .bind(new.nutrients.protein_g)
        .bind(new.nutrients.fat_g)
        .bind(new.nutrients.carbs_g)
        .bind(new.nutrients.fiber_g)
        .bind(new.nutrients.sugar_g)
        .bind(new.nutrients.sodium_mg)
        .fetch_one(&self.db)
        .await;

        match result {
            Ok(record) => Ok(InsertOutcome::Inserted(record)),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(InsertOutcome::Conflict),
            Err(e) => Err(e.into()),
        }
    }
}
