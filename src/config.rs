use std::env;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub property_cache_ttl_secs: u64,
    pub import_max_attempts: u32,
    pub import_retry_base_ms: u64,
    pub import_chunk_size: usize,
    pub import_chunk_delay_ms: u64,
    pub import_conflict_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_or("PORT", 8080),
            database_url: env::var("DATABASE_URL")?,
            jwt_secret: env::var("JWT_SECRET")?,
            property_cache_ttl_secs: env_or("PROPERTY_CACHE_TTL_SECS", 300),
            import_max_attempts: env_or("IMPORT_MAX_ATTEMPTS", 3),
            import_retry_base_ms: env_or("IMPORT_RETRY_BASE_MS", 1000),
            import_chunk_size: env_or("IMPORT_CHUNK_SIZE", 3),
            import_chunk_delay_ms: env_or("IMPORT_CHUNK_DELAY_MS", 500),
            import_conflict_timeout_secs: env_or("IMPORT_CONFLICT_TIMEOUT_SECS", 15),
        })
    }
}

// Отсутствующее или нечитаемое значение заменяется значением по умолчанию
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}
