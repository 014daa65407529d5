//! System status and diagnostics.
//!
//! This module provides platform status tracking, feed connection status, and diagnostic logging.

pub mod system;

pub use system::{DiagnosticLevel, SharedSystemStatus, SystemStatus};
