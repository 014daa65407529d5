// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Blocking progress overlay.
//!
//! One modal per app. `show` opens it with a message, `hide` closes it and is
//! a no-op when the modal is not open, so callers can hide unconditionally in
//! completion paths.

use egui;

/// Modal overlay for long-running operations.
#[derive(Debug, Default)]
pub struct LoadingModal {
    open: bool,
    message: String,
    progress: Option<u8>,
}

impl LoadingModal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the overlay with the given message and no progress bar yet.
    pub fn show(&mut self, message: impl Into<String>) {
        self.open = true;
        self.message = message.into();
        self.progress = None;
    }

    /// Close the overlay. No-op when it is not open.
    pub fn hide(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        self.progress = None;
    }

    /// Update the label and fill percentage.
    ///
    /// Recorded whether or not the overlay is currently open; the values
    /// become visible the next time it is shown. Progress is taken as-is
    /// (0-100, clamped by the emitter).
    pub fn set_progress(&mut self, message: impl Into<String>, progress: u8) {
        self.message = message.into();
        self.progress = Some(progress);
    }

    /// Whether the overlay is currently open.
    #[allow(dead_code)]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Current label text.
    #[allow(dead_code)]
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Current fill percentage, when a progress event has arrived.
    #[allow(dead_code)]
    #[must_use]
    pub fn progress(&self) -> Option<u8> {
        self.progress
    }

    /// Render the overlay centered on screen.
    pub fn ui(&self, ctx: &egui::Context) {
        if !self.open {
            return;
        }

        egui::Window::new("loading_modal")
            .title_bar(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .fixed_size(egui::vec2(280.0, 90.0))
            .resizable(false)
            .collapsible(false)
            .frame(
                egui::Frame::window(&ctx.style())
                    .fill(egui::Color32::from_rgba_unmultiplied(25, 30, 35, 245))
                    .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(60, 80, 100)))
                    .corner_radius(6.0),
            )
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.add_space(6.0);
                    ui.label(
                        egui::RichText::new(&self.message)
                            .color(egui::Color32::from_rgb(200, 200, 200))
                            .size(11.0),
                    );
                    ui.add_space(8.0);

                    match self.progress {
                        Some(progress) => {
                            ui.add(
                                egui::ProgressBar::new(f32::from(progress) / 100.0)
                                    .desired_width(240.0)
                                    .show_percentage(),
                            );
                        }
                        None => {
                            ui.add(egui::Spinner::new().size(22.0));
                        }
                    }
                    ui.add_space(6.0);
                });
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_opens_with_message() {
        let mut modal = LoadingModal::new();
        modal.show("Processing...");
        assert!(modal.is_open());
        assert_eq!(modal.message(), "Processing...");
        assert!(modal.progress().is_none());
    }

    #[test]
    fn test_hide_without_show_is_noop() {
        let mut modal = LoadingModal::new();
        modal.hide();
        assert!(!modal.is_open());
    }

    #[test]
    fn test_double_hide_is_safe() {
        let mut modal = LoadingModal::new();
        modal.show("Loading data...");
        modal.hide();
        modal.hide();
        assert!(!modal.is_open());
    }

    #[test]
    fn test_progress_updates_label_and_fill() {
        let mut modal = LoadingModal::new();
        modal.show("Starting...");
        modal.set_progress("Loading data to Cassandra...", 20);
        assert_eq!(modal.message(), "Loading data to Cassandra...");
        assert_eq!(modal.progress(), Some(20));
    }

    #[test]
    fn test_progress_recorded_while_closed() {
        let mut modal = LoadingModal::new();
        modal.set_progress("Setting up MongoDB collections...", 70);
        assert!(!modal.is_open());
        assert_eq!(modal.progress(), Some(70));
    }

    #[test]
    fn test_show_resets_stale_progress() {
        let mut modal = LoadingModal::new();
        modal.show("First run...");
        modal.set_progress("First run...", 90);
        modal.hide();

        modal.show("Second run...");
        assert_eq!(modal.progress(), None);
        assert_eq!(modal.message(), "Second run...");
    }
}
