use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub stream: StreamConfig,
    pub batch: BatchSettings,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Heartbeat broadcast interval in seconds (default: 25)
    pub heartbeat_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSettings {
    pub max_batch_size: usize,
    /// Maximum age of the oldest pending item before a forced flush
    pub max_wait_secs: u64,
    /// Grouping strategy name; unrecognized names fall back to by_kind
    pub strategy: String,
    /// How often the expiry sweep runs
    pub flush_tick_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Notifications retained per user
    pub retention: usize,
    /// Maximum notifications returned by the unread-fetch endpoint
    pub feed_limit: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Config {
            app: AppConfig {
                env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                port: std::env::var("APP_PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()?,
            },
            stream: StreamConfig {
                heartbeat_secs: std::env::var("STREAM_HEARTBEAT_SECS")
                    .unwrap_or_else(|_| "25".to_string())
                    .parse()?,
            },
            batch: BatchSettings {
                max_batch_size: std::env::var("BATCH_MAX_SIZE")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()?,
                max_wait_secs: std::env::var("BATCH_MAX_WAIT_SECS")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()?,
                strategy: std::env::var("BATCH_STRATEGY")
                    .unwrap_or_else(|_| "by_kind".to_string()),
                flush_tick_secs: std::env::var("BATCH_FLUSH_TICK_SECS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()?,
            },
            store: StoreConfig {
                retention: std::env::var("STORE_RETENTION")
                    .unwrap_or_else(|_| "500".to_string())
                    .parse()?,
                feed_limit: std::env::var("STORE_FEED_LIMIT")
                    .unwrap_or_else(|_| "100".to_string())
                    .parse()?,
            },
        })
    }
}
