//! Browser entities module.
//!
//! This module provides the Firefox-backed automation types:
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Window`] | Browser window (owns Firefox process + WebSocket) |
//! | [`Page`] | The controlled browsing context |
//! | [`Element`] | DOM element reference |
//! | [`By`] | Element locator |
//!
//! # Example
//!
//! ```no_run
//! use nav_resolver::{By, Driver, Result};
//!
//! # async fn example() -> Result<()> {
//! let driver = Driver::builder()
//!     .binary("/usr/bin/firefox")
//!     .extension("./extension")
//!     .build()?;
//!
//! let window = driver.window().headless().spawn().await?;
//! let page = window.page();
//!
//! page.goto("https://www.naukri.com/").await?;
//! let link = page.find_element(By::id("register_Layer")).await?;
//! let href = link.get_attribute("href").await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// DOM element interaction.
pub mod element;

/// The controlled page.
pub mod page;

/// Element locator strategies.
pub mod selector;

/// Browser window management.
pub mod window;

// ============================================================================
// Re-exports
// ============================================================================

pub use element::Element;
pub use page::{LoadStatus, Page};
pub use selector::By;
pub use window::{Window, WindowBuilder};
