//! UI components for TelcoDash Desktop.
//!
//! This module contains reusable UI components and overlays.

pub mod alerts;
pub mod loading_modal;

pub use alerts::{AlertKind, AlertStack};
pub use loading_modal::LoadingModal;
