use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    pub max_entries: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub catalog: CatalogConfig,
    pub cache: CacheConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "nutrilog".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "nutrilog-users".into()),
        };
        let catalog = CatalogConfig {
            base_url: std::env::var("CATALOG_BASE_URL")
                .unwrap_or_else(|_| "https://api.nal.usda.gov/fdc".into()),
            api_key: std::env::var("CATALOG_API_KEY").unwrap_or_else(|_| "DEMO_KEY".into()),
            timeout_secs: std::env::var("CATALOG_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(10),
        };
        let cache = CacheConfig {
            ttl_secs: std::env::var("CATALOG_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(3600),
            max_entries: std::env::var("CATALOG_CACHE_MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(1024),
        };
        Ok(Self {
            database_url,
            jwt,
            catalog,
            cache,
        })
    }
}
