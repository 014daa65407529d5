//! Network connectivity and connection management.
//!
//! This module owns the realtime feed client and keeps the shared system
//! status in sync with it.

pub mod supervisor;

pub use supervisor::FeedSupervisor;
