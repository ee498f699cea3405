//! WebSocket protocol message types.
//!
//! This module defines the message format for communication between
//! the local end (Rust) and the remote end (Firefox extension).
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `Request` | Local → Remote | Command request |
//! | `Response` | Remote → Local | Command response |
//!
//! The remote end may also push unsolicited notifications; the transport
//! logs and drops them since resolution never subscribes to events.
//!
//! # Command Naming
//!
//! Commands follow `module.methodName` format:
//!
//! - `browsingContext.navigate`
//! - `element.callMethod`
//! - `script.evaluate`

// ============================================================================
// Submodules
// ============================================================================

/// Command definitions organized by module.
pub mod command;

/// Request and Response message types.
pub mod request;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{BrowsingContextCommand, Command, ElementCommand, ScriptCommand};
pub use request::{Request, Response, ResponseType};
