//! # trawl-config
//!
//! Layered configuration loading for Trawl using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`TRAWL_*` prefix, `__` as separator)
//! 2. Project-level `.trawl/config.toml`
//! 3. User-level `~/.config/trawl/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `TRAWL_API__BASE_URL` -> `api.base_url`,
//! `TRAWL_POLLING__INTERVAL_SECS` -> `polling.interval_secs`, etc.
//! The `__` (double underscore) separates nested config sections.
//!
//! # Usage
//!
//! ```no_run
//! use trawl_config::TrawlConfig;
//!
//! let config = TrawlConfig::load_with_dotenv().expect("config");
//! println!("polling every {:?}", config.polling.interval());
//! ```

mod api;
mod auth;
mod error;
mod general;
mod polling;

pub use api::ApiConfig;
pub use auth::AuthConfig;
pub use error::ConfigError;
pub use general::GeneralConfig;
pub use polling::PollingConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TrawlConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl TrawlConfig {
    /// Load configuration from all sources (TOML files + environment variables)
    /// and validate it.
    ///
    /// Does NOT call `dotenvy` -- use [`load_with_dotenv`](Self::load_with_dotenv)
    /// if you need `.env` file loading.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a source cannot be parsed or a value fails
    /// validation.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment())
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Extract and validate a config from an arbitrary figment.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Build the figment provider chain.
    ///
    /// This is public so tests can inspect the figment directly or add
    /// additional providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(".trawl/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Environment variables (highest priority)
        figment.merge(Env::prefixed("TRAWL_").split("__"))
    }

    /// Reject values the engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = self.api.normalized_base_url();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::invalid(
                "api.base_url",
                format!("'{}' is not an http(s) URL", self.api.base_url),
            ));
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::invalid("api.timeout_secs", "must be > 0"));
        }
        if self.polling.interval_secs == 0 {
            return Err(ConfigError::invalid("polling.interval_secs", "must be > 0"));
        }
        if self.polling.max_consecutive_failures == 0 {
            return Err(ConfigError::invalid(
                "polling.max_consecutive_failures",
                "must be > 0",
            ));
        }
        if self.general.default_max_results == 0 {
            return Err(ConfigError::invalid(
                "general.default_max_results",
                "must be > 0",
            ));
        }
        Ok(())
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("trawl").join("config.toml"))
    }
}
