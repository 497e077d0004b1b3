use chrono_tz::Tz;

use crate::errors::{NewsreelError, NewsreelResult};

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub scheduler_enabled: bool,
    pub fetch_interval_secs: u64,
    pub cleanup_hour: u32,
    pub timezone: Tz,
    pub retention_days: u32,
    pub max_articles_per_feed: usize,
    pub request_timeout_secs: u64,
}

impl Config {
    /// Get the directory where the executable is located
    fn exe_dir() -> Option<std::path::PathBuf> {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    pub fn from_env() -> NewsreelResult<Self> {
        let exe_dir = Self::exe_dir();

        // Try to load .env from executable's directory first
        if let Some(ref dir) = exe_dir {
            let env_path = dir.join(".env");
            if env_path.exists() {
                dotenvy::from_path(&env_path).ok();
            }
        }
        // Fall back to current directory
        dotenvy::dotenv().ok();

        // Default db_path is relative to executable directory
        let db_path = std::env::var("NEWSREEL_DB_PATH").unwrap_or_else(|_| {
            exe_dir
                .map(|d| d.join("newsreel.db").to_string_lossy().into_owned())
                .unwrap_or_else(|| "./newsreel.db".to_string())
        });

        let scheduler_enabled = std::env::var("NEWSREEL_SCHEDULER_ENABLED")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let fetch_interval_secs = Self::parse_var("NEWSREEL_FETCH_INTERVAL_SECS", 3600u64)?;

        let cleanup_hour: u32 = Self::parse_var("NEWSREEL_CLEANUP_HOUR", 3u32)?;
        if cleanup_hour > 23 {
            return Err(NewsreelError::Config(format!(
                "NEWSREEL_CLEANUP_HOUR must be 0-23, got {}",
                cleanup_hour
            )));
        }

        let timezone: Tz = match std::env::var("NEWSREEL_TIMEZONE") {
            Ok(name) => name
                .parse()
                .map_err(|_| NewsreelError::Config(format!("Unknown timezone: {}", name)))?,
            Err(_) => chrono_tz::UTC,
        };

        let retention_days = Self::parse_var("NEWSREEL_RETENTION_DAYS", 30u32)?;
        let max_articles_per_feed = Self::parse_var("NEWSREEL_MAX_ARTICLES_PER_FEED", 200usize)?;
        let request_timeout_secs = Self::parse_var("NEWSREEL_REQUEST_TIMEOUT_SECS", 15u64)?;

        Ok(Self {
            db_path,
            scheduler_enabled,
            fetch_interval_secs,
            cleanup_hour,
            timezone,
            retention_days,
            max_articles_per_feed,
            request_timeout_secs,
        })
    }

    fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> NewsreelResult<T> {
        match std::env::var(name) {
            Ok(raw) => raw
                .parse()
                .map_err(|_| NewsreelError::Config(format!("Invalid value for {}: {}", name, raw))),
            Err(_) => Ok(default),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: "./newsreel.db".to_string(),
            scheduler_enabled: false,
            fetch_interval_secs: 3600,
            cleanup_hour: 3,
            timezone: chrono_tz::UTC,
            retention_days: 30,
            max_articles_per_feed: 200,
            request_timeout_secs: 15,
        }
    }
}
