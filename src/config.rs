//! Run configuration.
//!
//! A run is configured from JSON with camelCase keys and millisecond
//! durations. Every key is optional:
//!
//! ```json
//! {
//!   "pageLoadTimeout": 120000,
//!   "defaultCommandTimeout": 30000,
//!   "responseTimeout": 60000,
//!   "retries": { "runMode": 2, "openMode": 1 }
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

// ============================================================================
// RunMode
// ============================================================================

/// How the suite is being run; selects the retry budget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunMode {
    /// Unattended run (CI).
    #[default]
    Run,
    /// Interactive run.
    Open,
}

// ============================================================================
// Retries
// ============================================================================

/// Extra attempts per case after the first failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Retries {
    /// Retries in [`RunMode::Run`].
    pub run_mode: u32,
    /// Retries in [`RunMode::Open`].
    pub open_mode: u32,
}

impl Default for Retries {
    fn default() -> Self {
        Self {
            run_mode: 2,
            open_mode: 1,
        }
    }
}

impl Retries {
    /// Retries for `mode`.
    #[inline]
    #[must_use]
    pub fn for_mode(&self, mode: RunMode) -> u32 {
        match mode {
            RunMode::Run => self.run_mode,
            RunMode::Open => self.open_mode,
        }
    }
}

// ============================================================================
// RunConfig
// ============================================================================

/// Timeouts and retry policy for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunConfig {
    /// Budget for a full page load.
    #[serde(with = "millis")]
    pub page_load_timeout: Duration,
    /// Budget for element lookups and assertions.
    #[serde(with = "millis")]
    pub default_command_timeout: Duration,
    /// Budget for a single bridge response.
    #[serde(with = "millis")]
    pub response_timeout: Duration,
    /// Retry policy.
    pub retries: Retries,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            page_load_timeout: Duration::from_secs(120),
            default_command_timeout: Duration::from_secs(30),
            response_timeout: Duration::from_secs(60),
            retries: Retries::default(),
        }
    }
}

impl RunConfig {
    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the JSON is malformed
    /// - [`Error::Config`] if a timeout is zero
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// - [`Error::Io`] if the file cannot be read
    /// - See [`from_json_str`](Self::from_json_str)
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        debug!(path = %path.display(), ?config, "Loaded run configuration");
        Ok(config)
    }

    /// Checks that every timeout is non-zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first zero timeout.
    pub fn validate(&self) -> Result<()> {
        let timeouts = [
            ("pageLoadTimeout", self.page_load_timeout),
            ("defaultCommandTimeout", self.default_command_timeout),
            ("responseTimeout", self.response_timeout),
        ];
        for (name, value) in timeouts {
            if value.is_zero() {
                return Err(Error::config(format!("{name} must be greater than zero")));
            }
        }
        Ok(())
    }

    /// Total attempts per case in `mode`.
    #[inline]
    #[must_use]
    pub fn attempts(&self, mode: RunMode) -> u32 {
        1 + self.retries.for_mode(mode)
    }

    /// Sets the page load timeout.
    #[inline]
    #[must_use]
    pub fn with_page_load_timeout(mut self, timeout: Duration) -> Self {
        self.page_load_timeout = timeout;
        self
    }

    /// Sets the default command timeout.
    #[inline]
    #[must_use]
    pub fn with_default_command_timeout(mut self, timeout: Duration) -> Self {
        self.default_command_timeout = timeout;
        self
    }

    /// Sets the retry policy.
    #[inline]
    #[must_use]
    pub fn with_retries(mut self, retries: Retries) -> Self {
        self.retries = retries;
        self
    }
}

// ============================================================================
// millis
// ============================================================================

/// `Duration` as integer milliseconds.
mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

// ============================================================================
// Tests
// ============================================================================
