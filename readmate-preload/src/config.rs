//! Configuration for chapter preloading

use crate::error::{PreloadError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

/// Environment variable toggling preloading
pub const ENV_ENABLED: &str = "READMATE_PRELOAD_ENABLED";
/// Environment variable for the number of chapters fetched ahead
pub const ENV_CHAPTERS: &str = "READMATE_PRELOAD_CHAPTERS";
/// Environment variable for the progress percentage that triggers preloading
pub const ENV_TRIGGER: &str = "READMATE_PRELOAD_TRIGGER";
/// Environment variable for the cache capacity in chapters
pub const ENV_MAX_CACHE: &str = "READMATE_PRELOAD_MAX_CACHE";

/// Preload settings supplied by the host
///
/// Values are not range-checked by the manager; call [`PreloadConfig::validate`]
/// at the boundary where settings enter the system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreloadConfig {
    /// Whether speculative preloading runs at all
    pub enabled: bool,

    /// How many chapters after the current one to fetch
    pub chapter_count: usize,

    /// Reading progress (0-100) within a chapter that triggers preloading
    pub trigger_progress: f64,

    /// Maximum number of chapters kept in the cache
    pub max_cache_size: usize,
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            chapter_count: 2,
            trigger_progress: 50.0,
            max_cache_size: 10,
        }
    }
}

impl PreloadConfig {
    /// Create a new builder for preload configuration
    pub fn builder() -> PreloadConfigBuilder {
        PreloadConfigBuilder::default()
    }

    /// Default settings with preloading switched off
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.chapter_count == 0 {
            return Err("chapter_count must be greater than 0".to_string());
        }

        if self.max_cache_size == 0 {
            return Err("max_cache_size must be greater than 0".to_string());
        }

        if !(0.0..=100.0).contains(&self.trigger_progress) {
            return Err("trigger_progress must be between 0 and 100".to_string());
        }

        Ok(())
    }

    /// Load settings from the environment (and a `.env` file if present)
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            enabled: parse_var(&lookup, ENV_ENABLED)?.unwrap_or(defaults.enabled),
            chapter_count: parse_var(&lookup, ENV_CHAPTERS)?.unwrap_or(defaults.chapter_count),
            trigger_progress: parse_var(&lookup, ENV_TRIGGER)?
                .unwrap_or(defaults.trigger_progress),
            max_cache_size: parse_var(&lookup, ENV_MAX_CACHE)?
                .unwrap_or(defaults.max_cache_size),
        };

        debug!("Loaded preload config from environment: {:?}", config);
        Ok(config)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| PreloadError::ConfigError(format!("{}={:?}: {}", key, raw, e))),
        None => Ok(None),
    }
}

/// Builder for preload configuration
#[derive(Debug, Default)]
pub struct PreloadConfigBuilder {
    enabled: Option<bool>,
    chapter_count: Option<usize>,
    trigger_progress: Option<f64>,
    max_cache_size: Option<usize>,
}

impl PreloadConfigBuilder {
    /// Enable or disable preloading
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Set how many chapters to fetch ahead
    pub fn chapter_count(mut self, count: usize) -> Self {
        self.chapter_count = Some(count);
        self
    }

    /// Set the progress percentage that triggers preloading
    pub fn trigger_progress(mut self, progress: f64) -> Self {
        self.trigger_progress = Some(progress);
        self
    }

    /// Set the cache capacity in chapters
    pub fn max_cache_size(mut self, size: usize) -> Self {
        self.max_cache_size = Some(size);
        self
    }

    /// Build the preload configuration
    pub fn build(self) -> PreloadConfig {
        let defaults = PreloadConfig::default();

        PreloadConfig {
            enabled: self.enabled.unwrap_or(defaults.enabled),
            chapter_count: self.chapter_count.unwrap_or(defaults.chapter_count),
            trigger_progress: self.trigger_progress.unwrap_or(defaults.trigger_progress),
            max_cache_size: self.max_cache_size.unwrap_or(defaults.max_cache_size),
        }
    }
}
