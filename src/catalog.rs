use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::TtlCache;
use crate::config::CatalogConfig;
use crate::error::AppError;

/// Numeric nutrient codes used by the upstream catalog. Codes outside this
/// map are ignored, not an error.
pub mod codes {
    pub const ENERGY_KCAL: u32 = 1008;
    pub const PROTEIN_G: u32 = 1003;
    pub const FAT_G: u32 = 1004;
    pub const CARBS_G: u32 = 1005;
    pub const FIBER_G: u32 = 1079;
    pub const SUGAR_G: u32 = 2000;
    pub const SODIUM_MG: u32 = 1093;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSearchHit {
    pub external_id: i64,
    pub description: Option<String>,
    pub brand_name: Option<String>,
    pub data_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogNutrient {
    pub code: u32,
    pub value: f64,
}

/// Raw catalog detail payload. `description` stays optional here: schema
/// validation is the resolver's job, and an invalid payload must be
/// reportable rather than a deserialization dead end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFood {
    pub external_id: i64,
    pub description: Option<String>,
    pub brand_name: Option<String>,
    pub serving_size: Option<f64>,
    pub serving_unit: Option<String>,
    pub nutrients: Vec<CatalogNutrient>,
    /// Grams the nutrient values refer to. `None` means the catalog already
    /// reports per 100 units.
    pub nutrient_basis: Option<f64>,
}

/// External nutrient catalog. Implementations must surface transport
/// failures (`UpstreamUnavailable`) distinctly from "no such item"
/// (`Ok(None)` from `get_details`).
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<CatalogSearchHit>, AppError>;
    async fn get_details(&self, external_id: i64) -> Result<Option<CatalogFood>, AppError>;
}

// --- USDA FoodData Central client ---

pub struct FdcClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl FdcClient {
    pub fn new(config: &CatalogConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FdcSearchResponse {
    #[serde(default)]
    foods: Vec<FdcSearchFood>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FdcSearchFood {
    fdc_id: i64,
    description: Option<String>,
    brand_owner: Option<String>,
    data_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FdcFoodDetails {
    fdc_id: i64,
    description: Option<String>,
    brand_owner: Option<String>,
    serving_size: Option<f64>,
    serving_unit: Option<String>,
    #[serde(default)]
    food_nutrients: Vec<FdcFoodNutrient>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FdcFoodNutrient {
    nutrient: Option<FdcNutrient>,
    amount: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct FdcNutrient {
    id: u32,
}

impl From<FdcFoodDetails> for CatalogFood {
    fn from(raw: FdcFoodDetails) -> Self {
        let nutrients = raw
            .food_nutrients
            .into_iter()
            .filter_map(|n| {
                let code = n.nutrient?.id;
                let value = n.amount?;
                Some(CatalogNutrient { code, value })
            })
            .collect();
        Self {
            external_id: raw.fdc_id,
            description: raw.description,
            brand_name: raw.brand_owner,
            serving_size: raw.serving_size,
            serving_unit: raw.serving_unit,
            nutrients,
            // FDC reports foodNutrients per 100 g/ml across data types.
            nutrient_basis: None,
        }
    }
}

fn transport_error(context: &str, e: &reqwest::Error) -> AppError {
    warn!(error = %e, context, "catalog request failed");
    AppError::UpstreamUnavailable(format!("{context}: {e}"))
}

#[async_trait]
impl CatalogClient for FdcClient {
    async fn search(&self, query: &str) -> Result<Vec<CatalogSearchHit>, AppError> {
        let url = format!("{}/v1/foods/search", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("query", query),
                ("pageSize", "20"),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| transport_error("search", &e))?;

        if !resp.status().is_success() {
            return Err(AppError::UpstreamUnavailable(format!(
                "search returned {}",
                resp.status()
            )));
        }

        let body: FdcSearchResponse = resp
            .json()
            .await
            .map_err(|e| transport_error("search body", &e))?;
        Ok(body
            .foods
            .into_iter()
            .map(|f| CatalogSearchHit {
                external_id: f.fdc_id,
                description: f.description,
                brand_name: f.brand_owner,
                data_type: f.data_type,
            })
            .collect())
    }

    async fn get_details(&self, external_id: i64) -> Result<Option<CatalogFood>, AppError> {
        let url = format!("{}/v1/food/{}", self.base_url, external_id);
        let resp = self
            .http
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| transport_error("get_details", &e))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(AppError::UpstreamUnavailable(format!(
                "get_details returned {}",
                resp.status()
            )));
        }

        let raw: FdcFoodDetails = resp
            .json()
            .await
            .map_err(|e| transport_error("get_details body", &e))?;
        Ok(Some(raw.into()))
    }
}

// --- caching wrapper ---

/// Wraps any catalog client with the bounded TTL cache. Only successful
/// responses are stored; failures always go back upstream.
pub struct CachedCatalog<C> {
    inner: C,
    cache: TtlCache,
}

impl<C: CatalogClient> CachedCatalog<C> {
    pub fn new(inner: C, cache: TtlCache) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl<C: CatalogClient> CatalogClient for CachedCatalog<C> {
    async fn search(&self, query: &str) -> Result<Vec<CatalogSearchHit>, AppError> {
        if let Some(hits) = self.cache.get("search", query).await {
            debug!(query, "catalog search cache hit");
            return Ok(hits);
        }
        let hits = self.inner.search(query).await?;
        self.cache.put("search", query, &hits).await;
        Ok(hits)
    }

    async fn get_details(&self, external_id: i64) -> Result<Option<CatalogFood>, AppError> {
        let arg = external_id.to_string();
        if let Some(food) = self.cache.get("details", &arg).await {
            debug!(external_id, "catalog details cache hit");
            return Ok(Some(food));
        }
        let food = self.inner.get_details(external_id).await?;
        if let Some(ref f) = food {
            self.cache.put("details", &arg, f).await;
        }
        Ok(food)
    }
}
