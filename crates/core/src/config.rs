use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database_url: String,
    pub adrotate_env: String,
    pub api_bind: String,
    pub db_max_connections: u32,
    pub sweep_interval_secs: u64,
    pub lookahead_days: i64,
}

impl Settings {
    pub fn from_env() -> Result<Self, std::env::VarError> {
        let database_url =
            std::env::var("ADROTATE_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL"))?;
        let adrotate_env = std::env::var("ADROTATE_ENV").unwrap_or_else(|_| "dev".to_string());
        let api_bind =
            std::env::var("ADROTATE_API_BIND").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let db_max_connections = std::env::var("ADROTATE_DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);
        let sweep_interval_secs = std::env::var("ADROTATE_SWEEP_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(300);
        let lookahead_days = std::env::var("ADROTATE_LOOKAHEAD_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(7);

        Ok(Self {
            database_url,
            adrotate_env,
            api_bind,
            db_max_connections,
            sweep_interval_secs,
            lookahead_days,
        })
    }
}
