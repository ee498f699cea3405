//! WebSocket transport layer.
//!
//! This module handles communication between the local end (Rust) and
//! the remote end (extension) via WebSocket.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Window (Rust)  │                              │  Extension      │
//! │                 │         WebSocket            │  (Background)   │
//! │  PendingServer  │◄────────────────────────────►│                 │
//! │  → Connection   │      127.0.0.1:PORT          │  WebSocket      │
//! │                 │                              │  Client         │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! One window owns one connection. Resolution is strictly sequential, so
//! there is no connection pool.

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket connection and I/O loop.
pub mod connection;

/// WebSocket server binding and acceptance.
pub mod server;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Connection, DEFAULT_COMMAND_TIMEOUT, ReadyData};
pub use server::{DEFAULT_ACCEPT_TIMEOUT, PendingServer};
