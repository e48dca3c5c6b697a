//! Engine configuration
//!
//! Serde-backed so a host shell can ship overrides as JSON; every knob
//! has a builder method for programmatic setup. The remote API token is
//! never serialized and is read from the environment instead.

use compass_mapper::{IconNonePolicy, MapperPolicy};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable carrying the remote variables API token
pub const API_TOKEN_ENV: &str = "COMPASS_API_TOKEN";

/// Default number of instances migrated per batch
pub const DEFAULT_BATCH_SIZE: usize = 25;

/// Maximum attempts for one property application
pub const MAX_PROPERTY_RETRIES: u32 = 3;

/// Engine-wide settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Instances migrated concurrently per batch
    pub batch_size: usize,
    /// Pause between batches, milliseconds
    pub batch_pause_ms: u64,
    /// Maximum attempts for one property application
    pub max_property_retries: u32,
    /// Delay between retry attempts, milliseconds
    pub retry_delay_ms: u64,
    /// Property-mapper policy knobs
    pub mapper: MapperPolicy,
    /// Minimum mapping confidence for name-based classification fallback
    ///
    /// Name overlap is a weak signal; below this confidence the locator
    /// only classifies by key.
    pub name_fallback_min_confidence: u8,
    /// Source file for the live remote theme strategy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme_file_key: Option<String>,
    /// Cached bridge-variable file for the theme resolver
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable_cache_path: Option<PathBuf>,
    /// Base URL of the remote variables API
    pub api_base_url: String,
    /// Remote API token; environment-supplied, never serialized
    #[serde(skip)]
    pub api_token: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            batch_pause_ms: 500,
            max_property_retries: MAX_PROPERTY_RETRIES,
            retry_delay_ms: 250,
            mapper: MapperPolicy::default(),
            name_fallback_min_confidence: 80,
            theme_file_key: None,
            variable_cache_path: None,
            api_base_url: "https://api.figma.com/v1".to_string(),
            api_token: None,
        }
    }
}

impl EngineConfig {
    /// Default configuration with the API token taken from the environment
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            api_token: std::env::var(API_TOKEN_ENV).ok(),
            ..Self::default()
        }
    }

    /// Set the batch size (clamped to at least 1)
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Set the inter-batch pause
    #[must_use]
    pub fn with_batch_pause(mut self, pause: Duration) -> Self {
        self.batch_pause_ms = pause.as_millis() as u64;
        self
    }

    /// Set the per-property retry bound
    #[must_use]
    pub fn with_max_property_retries(mut self, retries: u32) -> Self {
        self.max_property_retries = retries.max(1);
        self
    }

    /// Set the delay between property retries
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Set the icon-none mapping policy
    #[must_use]
    pub fn with_icon_none_policy(mut self, policy: IconNonePolicy) -> Self {
        self.mapper.icon_none_policy = policy;
        self
    }

    /// Set the confidence gate for name-based classification
    #[must_use]
    pub fn with_name_fallback_min_confidence(mut self, confidence: u8) -> Self {
        self.name_fallback_min_confidence = confidence;
        self
    }

    /// Set the theme source file key
    #[must_use]
    pub fn with_theme_file_key(mut self, key: impl Into<String>) -> Self {
        self.theme_file_key = Some(key.into());
        self
    }

    /// Set the bridge-variable cache path
    #[must_use]
    pub fn with_variable_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.variable_cache_path = Some(path.into());
        self
    }

    /// Set the remote API base URL
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Set the remote API token
    #[must_use]
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Inter-batch pause as a [`Duration`]
    #[inline]
    #[must_use]
    pub fn batch_pause(&self) -> Duration {
        Duration::from_millis(self.batch_pause_ms)
    }

    /// Retry delay as a [`Duration`]
    #[inline]
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}
