//! The controlled page.
//!
//! A [`Page`] is the single browsing context of a [`Window`](super::Window).
//! It implements [`AutomationContext`](crate::AutomationContext), so the
//! resolver and the case runner drive it the same way they drive the
//! in-memory model.
//!
//! # Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | `core` | Page struct and accessors |
//! | `navigation` | URL loading with status handling |
//! | `script` | JavaScript execution, call interception, error collection |
//! | `elements` | Element lookup and bounded waits |
//! | `context` | [`AutomationContext`](crate::AutomationContext) implementation |
//!
//! # Example
//!
//! ```ignore
//! let page = window.page();
//!
//! page.goto("https://www.naukri.com/").await?;
//! let link = page.wait_for_element(By::id("register_Layer"), Wait::default()).await?;
//! link.click().await?;
//! ```

// ============================================================================
// Submodules
// ============================================================================

mod context;
mod core;
mod elements;
mod navigation;
mod script;

// ============================================================================
// Re-exports
// ============================================================================

pub use core::Page;
pub use navigation::LoadStatus;
