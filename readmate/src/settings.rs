//! Preload settings assembled from the environment and command-line flags

use anyhow::{anyhow, Result};
use readmate_preload::PreloadConfig;

/// Default reader server address
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

/// Command-line overrides; unset fields keep the environment's value
#[derive(Debug, Clone, Default)]
pub struct PreloadOverrides {
    pub no_preload: bool,
    pub chapters: Option<usize>,
    pub trigger: Option<f64>,
    pub max_cache: Option<usize>,
}

impl PreloadOverrides {
    /// Layer the overrides over `base` and validate the result
    pub fn apply(&self, base: PreloadConfig) -> Result<PreloadConfig> {
        let config = PreloadConfig::builder()
            .enabled(base.enabled && !self.no_preload)
            .chapter_count(self.chapters.unwrap_or(base.chapter_count))
            .trigger_progress(self.trigger.unwrap_or(base.trigger_progress))
            .max_cache_size(self.max_cache.unwrap_or(base.max_cache_size))
            .build();

        config
            .validate()
            .map_err(|e| anyhow!("invalid preload settings: {}", e))?;

        Ok(config)
    }
}
