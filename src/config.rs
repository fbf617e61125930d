use crate::locale::Locale;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub addr: SocketAddr,
    pub locale: Locale,
    pub assets_dir: PathBuf,
    /// How long an unused browser session and its dashboard are kept.
    pub idle_for: Duration,
}

impl Config {
    /// Reads the process environment; call `dotenvy::dotenv()` first to pick
    /// up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |primary: &'static str, fallback: &str| {
            lookup(primary)
                .or_else(|| lookup(fallback))
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(primary))
        };

        let supabase_url = var("SUPABASE_URL", "VITE_SUPABASE_URL")?;
        let supabase_anon_key = var("SUPABASE_ANON_KEY", "VITE_SUPABASE_ANON_KEY")?;

        let port = match lookup("PORT") {
            Some(port) => port.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: "PORT",
                reason: e.to_string(),
            })?,
            None => 3000,
        };

        let locale = match lookup("HORARIOS_LOCALE") {
            Some(locale) => locale.parse().map_err(|reason| ConfigError::Invalid {
                name: "HORARIOS_LOCALE",
                reason,
            })?,
            None => Locale::default(),
        };

        let idle_minutes = match lookup("HORARIOS_IDLE_MINUTES") {
            Some(minutes) => minutes.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                name: "HORARIOS_IDLE_MINUTES",
                reason: e.to_string(),
            })?,
            None => 24 * 60,
        };

        Ok(Self {
            supabase_url,
            supabase_anon_key,
            addr: SocketAddr::from(([0, 0, 0, 0], port)),
            locale,
            assets_dir: lookup("ASSETS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("assets")),
            idle_for: Duration::from_secs(idle_minutes.saturating_mul(60)),
        })
    }
}
