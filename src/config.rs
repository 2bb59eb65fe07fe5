use crate::error::{AppError, Result};

/// Collection holding one document per played match.
pub const MATCHES_COLLECTION: &str = "matches";

/// Collection holding the aggregate snapshot, keyed by subject id.
pub const STATS_COLLECTION: &str = "player_stats";

/// Subject key used when SUBJECT_ID is not set. The tracker is single-user.
pub const DEFAULT_SUBJECT_ID: &str = "player";

/// Number of matches returned by the dashboard endpoint when no limit is given.
pub const RECENT_MATCHES_DEFAULT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StoreBackend::Sqlite),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(AppError::Config(format!(
                "STORE_BACKEND must be 'sqlite' or 'memory', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub db_path: String,
    pub api_port: u16,
    /// Identifier of the tracked player (SUBJECT_ID)
    pub subject_id: String,
    /// Where documents live (STORE_BACKEND): sqlite file or process memory
    pub store_backend: StoreBackend,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let subject_id = get("SUBJECT_ID")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SUBJECT_ID.to_string());

        Ok(Self {
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            db_path: get("DB_PATH").unwrap_or_else(|| "cricket.db".to_string()),
            api_port: get("API_PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            subject_id,
            store_backend: get("STORE_BACKEND")
                .unwrap_or_else(|| "sqlite".to_string())
                .parse()?,
        })
    }
}
