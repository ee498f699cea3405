//! Shared utilities for demos.
//!
//! Provides common functionality used across all demos:
//! - Browser and extension paths (overridable through the environment)
//! - Logging initialization
//! - Run configuration loading

#![allow(dead_code)]

// ============================================================================
// Imports
// ============================================================================

use std::path::PathBuf;

use nav_resolver::{RunConfig, RunMode};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Path Helpers
// ============================================================================

/// Firefox binary: `$NAV_RESOLVER_FIREFOX`, else `~/.local/firefox/firefox`.
pub fn firefox_binary() -> PathBuf {
    std::env::var_os("NAV_RESOLVER_FIREFOX")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::home_dir()
                .expect("Could not determine home directory")
                .join(".local/firefox/firefox")
        })
}

/// Bridge extension: `$NAV_RESOLVER_EXTENSION`, else
/// `~/.local/share/nav-resolver/bridge.xpi`.
pub fn extension_path() -> PathBuf {
    std::env::var_os("NAV_RESOLVER_EXTENSION")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::data_local_dir()
                .expect("Could not determine data directory")
                .join("nav-resolver/bridge.xpi")
        })
}

// ============================================================================
// Types
// ============================================================================

/// Command-line arguments for demos.
#[derive(Debug, Clone)]
pub struct Args {
    pub debug: bool,
    pub headed: bool,
    pub config: Option<PathBuf>,
}

impl Args {
    /// Parses `--debug`, `--headed` and `--config <path>`.
    pub fn parse() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let config = args
            .iter()
            .position(|a| a == "--config")
            .and_then(|i| args.get(i + 1))
            .map(PathBuf::from);

        Self {
            debug: args.iter().any(|a| a == "--debug"),
            headed: args.iter().any(|a| a == "--headed"),
            config,
        }
    }

    /// Run mode: headed runs are interactive.
    pub fn mode(&self) -> RunMode {
        if self.headed { RunMode::Open } else { RunMode::Run }
    }

    /// Loads `--config` or falls back to defaults.
    pub fn run_config(&self) -> anyhow::Result<RunConfig> {
        Ok(match &self.config {
            Some(path) => RunConfig::from_json_file(path)?,
            None => RunConfig::default(),
        })
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Initializes tracing; `RUST_LOG` wins over `--debug`.
pub fn init_logging(debug: bool) {
    let default = if debug {
        "nav_resolver=debug"
    } else {
        "nav_resolver=info"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
