//! Firefox launching.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Driver`] | Launches windows |
//! | [`DriverBuilder`] | Fluent configuration builder |
//! | [`BrowserOptions`] | Firefox command-line options |
//! | [`Profile`] | Profile preparation (prefs, extension) |
//! | [`ExtensionSource`] | Where the bridge extension comes from |
//!
//! # Example
//!
//! ```no_run
//! use nav_resolver::{Driver, Result};
//!
//! # async fn example() -> Result<()> {
//! let driver = Driver::builder()
//!     .binary("/usr/bin/firefox")
//!     .extension("./extension")
//!     .build()?;
//!
//! let window = driver.window().headless().spawn().await?;
//! window.page().goto("https://www.naukri.com/").await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Bootstrap page for the bridge handshake.
pub mod assets;

/// Fluent builder for driver configuration.
pub mod builder;

/// Core driver implementation.
pub mod core;

/// Bridge extension sources.
pub mod extension;

/// Firefox command-line options.
pub mod options;

/// Firefox profile preparation.
pub mod profile;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::DriverBuilder;
pub use core::Driver;
pub use extension::ExtensionSource;
pub use options::BrowserOptions;
pub use profile::{Pref, PrefValue, Profile};
