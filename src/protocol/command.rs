//! Command definitions organized by module.
//!
//! Commands follow `module.methodName` format.
//!
//! # Command Modules
//!
//! | Module | Commands |
//! |--------|----------|
//! | `browsingContext` | Navigation, current URL, title |
//! | `element` | Find, properties, methods |
//! | `script` | JavaScript execution, preload scripts |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identifiers::ElementId;

// ============================================================================
// Command Wrapper
// ============================================================================

/// All protocol commands organized by module.
///
/// This enum wraps module-specific command enums for unified serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Command {
    /// BrowsingContext module commands.
    BrowsingContext(BrowsingContextCommand),
    /// Element module commands.
    Element(ElementCommand),
    /// Script module commands.
    Script(ScriptCommand),
}

impl Command {
    /// Returns the `module.methodName` string of this command.
    #[must_use]
    pub fn method(&self) -> &'static str {
        match self {
            Self::BrowsingContext(cmd) => match cmd {
                BrowsingContextCommand::Navigate { .. } => "browsingContext.navigate",
                BrowsingContextCommand::GetUrl => "browsingContext.getUrl",
                BrowsingContextCommand::GetTitle => "browsingContext.getTitle",
            },
            Self::Element(cmd) => match cmd {
                ElementCommand::Find { .. } => "element.find",
                ElementCommand::FindAll { .. } => "element.findAll",
                ElementCommand::GetProperty { .. } => "element.getProperty",
                ElementCommand::CallMethod { .. } => "element.callMethod",
            },
            Self::Script(cmd) => match cmd {
                ScriptCommand::Evaluate { .. } => "script.evaluate",
                ScriptCommand::AddPreloadScript { .. } => "script.addPreloadScript",
                ScriptCommand::RemovePreloadScript { .. } => "script.removePreloadScript",
            },
        }
    }
}

// ============================================================================
// BrowsingContext Commands
// ============================================================================

/// BrowsingContext module commands for navigation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum BrowsingContextCommand {
    /// Navigate to URL and wait for the load to finish.
    ///
    /// The extension answers with `{ "url", "status" }` where `status` is the
    /// HTTP status of the main document when known.
    #[serde(rename = "browsingContext.navigate")]
    Navigate {
        /// URL to navigate to.
        url: String,
        /// Load timeout in milliseconds.
        #[serde(rename = "timeoutMs", skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },

    /// Get current URL.
    #[serde(rename = "browsingContext.getUrl")]
    GetUrl,

    /// Get page title.
    #[serde(rename = "browsingContext.getTitle")]
    GetTitle,
}

// ============================================================================
// Element Commands
// ============================================================================

/// Element module commands for DOM interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum ElementCommand {
    /// Find the first element matching a locator.
    #[serde(rename = "element.find")]
    Find {
        /// Locator strategy (`css`, `xpath`, `text`, ...).
        strategy: String,
        /// Locator value.
        value: String,
        /// Parent element ID (optional).
        #[serde(rename = "parentId", skip_serializing_if = "Option::is_none")]
        parent_id: Option<ElementId>,
    },

    /// Find all elements matching a locator.
    #[serde(rename = "element.findAll")]
    FindAll {
        /// Locator strategy.
        strategy: String,
        /// Locator value.
        value: String,
        /// Parent element ID (optional).
        #[serde(rename = "parentId", skip_serializing_if = "Option::is_none")]
        parent_id: Option<ElementId>,
    },

    /// Get property via `element[name]`.
    #[serde(rename = "element.getProperty")]
    GetProperty {
        /// Element ID.
        #[serde(rename = "elementId")]
        element_id: ElementId,
        /// Property name.
        name: String,
    },

    /// Call method via `element[name](...args)`.
    #[serde(rename = "element.callMethod")]
    CallMethod {
        /// Element ID.
        #[serde(rename = "elementId")]
        element_id: ElementId,
        /// Method name.
        name: String,
        /// Method arguments.
        #[serde(default)]
        args: Vec<Value>,
    },
}

// ============================================================================
// Script Commands
// ============================================================================

/// Script module commands for JavaScript execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum ScriptCommand {
    /// Execute a synchronous script in the page's main world.
    #[serde(rename = "script.evaluate")]
    Evaluate {
        /// JavaScript code.
        script: String,
        /// Script arguments.
        #[serde(default)]
        args: Vec<Value>,
    },

    /// Register a script that runs before every document load.
    #[serde(rename = "script.addPreloadScript")]
    AddPreloadScript {
        /// Script to run before page load.
        script: String,
    },

    /// Remove a preload script.
    #[serde(rename = "script.removePreloadScript")]
    RemovePreloadScript {
        /// ID returned by `script.addPreloadScript`.
        #[serde(rename = "scriptId")]
        script_id: String,
    },
}

// ============================================================================
// Tests
// ============================================================================
