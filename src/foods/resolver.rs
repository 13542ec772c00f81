use tracing::{debug, info, warn};

use crate::catalog::{codes, CatalogClient, CatalogFood};
use crate::error::AppError;
use crate::foods::repo::{FoodRecord, FoodStore, InsertOutcome, NewFoodRecord, NutrientValues};

/// Free-form metadata a caller may attach to a manual record.
#[derive(Debug, Clone, Default)]
pub struct ManualFood {
    pub description: String,
    pub brand_name: Option<String>,
    pub serving_size: Option<f64>,
    pub serving_unit: Option<String>,
    pub nutrients: NutrientValues,
}

/// Resolve an external catalog item to the single canonical local record,
/// fetching and caching it on first use.
///
/// The lookup-then-fetch-then-insert sequence is deliberately not wrapped
/// in a lock; a concurrent resolution of the same unseen id loses the
/// insert race at the unique index and recovers by re-reading the row.
pub async fn resolve_by_external_id(
    foods: &dyn FoodStore,
    catalog: &dyn CatalogClient,
    external_id: i64,
) -> Result<FoodRecord, AppError> {
    if external_id <= 0 {
        return Err(AppError::InvalidInput(
            "external_id must be positive".into(),
        ));
    }

    if let Some(existing) = foods.find_by_external_id(external_id).await? {
        debug!(external_id, "catalog id already resolved");
        return Ok(existing);
    }

    let food = catalog
        .get_details(external_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no catalog food with id {external_id}")))?;

    let new = match validate_catalog_food(food) {
        Ok(new) => new,
        Err(e) => {
            warn!(external_id, error = %e, "rejected catalog payload");
            return Err(e);
        }
    };
    match foods.insert(new).await? {
        InsertOutcome::Inserted(record) => {
            info!(external_id, record_id = %record.id, "cached catalog food");
            Ok(record)
        }
        // Lost the race: someone else inserted between our lookup and
        // insert. The row they wrote is the canonical one.
        InsertOutcome::Conflict => foods
            .find_by_external_id(external_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "insert conflict for external id {external_id} but no row found"
                ))
            }),
    }
}

/// Create a manual (no external id) record, refusing exact-description
/// duplicates. The existing record rides along in the error so the caller
/// can offer reuse instead of a dead end.
pub async fn resolve_manual(
    foods: &dyn FoodStore,
    manual: ManualFood,
) -> Result<FoodRecord, AppError> {
    let description = validate_manual_input(&manual)?;

    if let Some(existing) = foods.find_manual_by_description(&description).await? {
        return Err(AppError::DuplicateRecord {
            existing: Box::new(existing),
        });
    }

    let new = NewFoodRecord {
        external_id: None,
        description: description.clone(),
        brand_name: manual.brand_name,
        serving_size: manual.serving_size,
        serving_unit: manual.serving_unit,
        nutrients: manual.nutrients,
    };
    match foods.insert(new).await? {
        InsertOutcome::Inserted(record) => Ok(record),
        InsertOutcome::Conflict => {
            // Race loser gets the same answer as a sequential duplicate.
            let existing = foods
                .find_manual_by_description(&description)
                .await?
                .ok_or_else(|| {
                    AppError::Internal(anyhow::anyhow!(
                        "insert conflict for manual description but no row found"
                    ))
                })?;
            Err(AppError::DuplicateRecord {
                existing: Box::new(existing),
            })
        }
    }
}

/// Build a record from absolute nutrient totals observed for a specific
/// logged quantity, normalizing to the per-100 basis first. With an
/// external id this behaves like `resolve_by_external_id` except the
/// normalized values stand in for an upstream fetch; without one it is a
/// manual insert.
pub async fn derive_from_logged_nutrients(
    foods: &dyn FoodStore,
    manual: ManualFood,
    quantity: f64,
    external_id: Option<i64>,
) -> Result<FoodRecord, AppError> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(AppError::InvalidInput(
            "quantity must be a positive number".into(),
        ));
    }
    let description = validate_manual_input(&manual)?;

    // v per `quantity` units -> v / (quantity / 100) per 100 units.
    let per_100 = manual.nutrients.scale(100.0 / quantity);

    let Some(external_id) = external_id else {
        return resolve_manual(
            foods,
            ManualFood {
                nutrients: per_100,
                ..manual
            },
        )
        .await;
    };

    if external_id <= 0 {
        return Err(AppError::InvalidInput(
            "external_id must be positive".into(),
        ));
    }
    if let Some(existing) = foods.find_by_external_id(external_id).await? {
        return Ok(existing);
    }
    let new = NewFoodRecord {
        external_id: Some(external_id),
        description,
        brand_name: manual.brand_name,
        serving_size: manual.serving_size,
        serving_unit: manual.serving_unit,
        nutrients: per_100,
    };
    match foods.insert(new).await? {
        InsertOutcome::Inserted(record) => Ok(record),
        InsertOutcome::Conflict => foods
            .find_by_external_id(external_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "insert conflict for external id {external_id} but no row found"
                ))
            }),
    }
}

fn validate_manual_input(manual: &ManualFood) -> Result<String, AppError> {
    let description = manual.description.trim().to_string();
    if description.is_empty() {
        return Err(AppError::InvalidInput("description must not be empty".into()));
    }
    if let Some(field) = manual.nutrients.first_invalid() {
        return Err(AppError::InvalidInput(format!(
            "nutrient {field} must be a non-negative number"
        )));
    }
    Ok(description)
}

/// Schema-check an upstream payload and shape it for insertion. Nothing is
/// cached locally when this fails.
fn validate_catalog_food(food: CatalogFood) -> Result<NewFoodRecord, AppError> {
    let external_id = food.external_id;
    let description = food
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| AppError::InvalidUpstreamData {
            external_id,
            reason: "missing description".into(),
        })?
        .to_string();

    let mut nutrients = NutrientValues::default();
    for n in &food.nutrients {
        if !n.value.is_finite() || n.value < 0.0 {
            return Err(AppError::InvalidUpstreamData {
                external_id,
                reason: format!("nutrient {} has invalid value {}", n.code, n.value),
            });
        }
        // Codes outside the fixed map are ignored.
        match n.code {
            codes::ENERGY_KCAL => nutrients.calories = Some(n.value),
            codes::PROTEIN_G => nutrients.protein_g = Some(n.value),
            codes::FAT_G => nutrients.fat_g = Some(n.value),
            codes::CARBS_G => nutrients.carbs_g = Some(n.value),
            codes::FIBER_G => nutrients.fiber_g = Some(n.value),
            codes::SUGAR_G => nutrients.sugar_g = Some(n.value),
            codes::SODIUM_MG => nutrients.sodium_mg = Some(n.value),
            _ => {}
        }
    }

    // Rescale when the catalog declared a non-100 basis for its values.
    if let Some(basis) = food.nutrient_basis {
        if !basis.is_finite() || basis <= 0.0 {
            return Err(AppError::InvalidUpstreamData {
                external_id,
                reason: format!("invalid nutrient basis {basis}"),
            });
        }
        if (basis - 100.0).abs() > f64::EPSILON {
            nutrients = nutrients.scale(100.0 / basis);
        }
    }

    Ok(NewFoodRecord {
        external_id: Some(external_id),
        description,
        brand_name: food.brand_name,
        serving_size: food.serving_size,
        serving_unit: food.serving_unit,
        nutrients,
    })
}
