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

use egui;

use crate::format;
use crate::status::{DiagnosticLevel, SystemStatus};
use feed_client::ConnectionState;

/// Success/danger styling for a boolean connection indicator.
///
/// Two visual states only: "Connected" (success) or "Disconnected" (danger).
pub fn indicator_visual(connected: bool) -> (&'static str, egui::Color32) {
    if connected {
        ("Connected", egui::Color32::from_rgb(100, 255, 100))
    } else {
        ("Disconnected", egui::Color32::from_rgb(255, 100, 100))
    }
}

pub struct StatusPane {
    pub visible: bool,
    pub collapsed: bool,
}

impl Default for StatusPane {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusPane {
    pub fn new() -> Self {
        Self {
            visible: true,
            collapsed: false,
        }
    }

    /// Render the status pane as a floating window
    pub fn render(&mut self, ctx: &egui::Context, status: &SystemStatus) {
        if !self.visible {
            // Show a small button to re-open the status pane when hidden
            egui::Window::new("show_status")
                .title_bar(false)
                .anchor(egui::Align2::LEFT_BOTTOM, egui::vec2(10.0, -10.0))
                .fixed_size(egui::vec2(140.0, 35.0))
                .resizable(false)
                .frame(egui::Frame::window(&ctx.style())
                    .fill(egui::Color32::from_rgba_unmultiplied(25, 30, 35, 200))
                    .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(60, 80, 100)))
                    .corner_radius(6.0))
                .show(ctx, |ui| {
                    if ui.button(egui::RichText::new("📊 Show Status")
                        .color(egui::Color32::from_rgb(150, 200, 220))
                        .size(11.0))
                        .clicked() {
                        self.visible = true;
                    }
                });
            return;
        }

        let screen_height = ctx.screen_rect().height();

        egui::Window::new("System Status")
            .anchor(egui::Align2::LEFT_BOTTOM, egui::vec2(10.0, -10.0))
            .fixed_size(egui::vec2(304.0, if self.collapsed { 40.0 } else { screen_height.min(440.0) }))
            .resizable(false)
            .collapsible(false)
            .frame(egui::Frame::window(&ctx.style())
                .fill(egui::Color32::from_rgba_unmultiplied(25, 30, 35, 230))
                .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(60, 80, 100)))
                .corner_radius(6.0))
            .show(ctx, |ui| {
                // Header with collapse and close buttons
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new("◈ STATUS")
                        .color(egui::Color32::from_rgb(100, 180, 220))
                        .size(12.0)
                        .strong());

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        // Close/hide button
                        if ui.button(egui::RichText::new("✕")
                            .size(12.0)
                            .color(egui::Color32::from_rgb(200, 100, 100)))
                            .on_hover_text("Hide status pane")
                            .clicked() {
                            self.visible = false;
                        }

                        ui.add_space(4.0);

                        // Collapse/expand button
                        let collapse_icon = if self.collapsed { "▼" } else { "▲" };
                        if ui.button(egui::RichText::new(collapse_icon).size(10.0))
                            .on_hover_text(if self.collapsed { "Expand" } else { "Collapse" })
                            .clicked() {
                            self.collapsed = !self.collapsed;
                        }
                    });
                });

                if self.collapsed {
                    return;
                }

                ui.separator();

                egui::ScrollArea::vertical()
                    .max_height(screen_height.min(400.0))
                    .show(ui, |ui| {
                        self.render_feed_section(ui, status);

                        ui.add_space(6.0);

                        self.render_services_section(ui, status);

                        ui.add_space(6.0);

                        self.render_metrics_section(ui, status);

                        ui.add_space(6.0);

                        self.render_diagnostics_section(ui, status);
                    });
            });
    }

    fn render_feed_section(&self, ui: &mut egui::Ui, status: &SystemStatus) {
        ui.label(egui::RichText::new("FEED")
            .color(egui::Color32::from_rgb(150, 150, 150))
            .size(9.0)
            .strong());

        ui.add_space(2.0);

        // Feed connection status with colored indicator
        ui.horizontal(|ui| {
            let (status_color, status_text, status_icon) = match &status.feed_state {
                ConnectionState::Connected => (
                    egui::Color32::from_rgb(100, 255, 100),
                    "CONNECTED",
                    "●"
                ),
                ConnectionState::Connecting => (
                    egui::Color32::from_rgb(255, 200, 100),
                    "CONNECTING",
                    "◐"
                ),
                ConnectionState::Disconnected => (
                    egui::Color32::from_rgb(150, 150, 150),
                    "DISCONNECTED",
                    "○"
                ),
                ConnectionState::Error(_) => (
                    egui::Color32::from_rgb(255, 100, 100),
                    "ERROR",
                    "✕"
                ),
            };

            ui.label(egui::RichText::new(status_icon)
                .color(status_color)
                .size(10.0));

            ui.label(egui::RichText::new(status_text)
                .color(status_color)
                .size(10.0)
                .monospace()
                .strong());
        });

        // Feed address (compact)
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(&status.feed_address)
                .color(egui::Color32::from_rgb(180, 180, 180))
                .size(8.0)
                .monospace());
        });

        // Uptime (only if connected)
        if status.feed_state == ConnectionState::Connected {
            if let Some(connected_at) = status.last_successful_connection {
                let seconds = (chrono::Utc::now() - connected_at).num_seconds().max(0) as u64;
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new("Up:")
                        .color(egui::Color32::from_rgb(130, 130, 130))
                        .size(9.0));
                    ui.label(egui::RichText::new(format_uptime(seconds))
                        .color(egui::Color32::from_rgb(200, 200, 200))
                        .size(9.0)
                        .monospace());
                });
            }
        }
    }

    fn render_services_section(&self, ui: &mut egui::Ui, status: &SystemStatus) {
        ui.label(egui::RichText::new("SERVICES")
            .color(egui::Color32::from_rgb(150, 150, 150))
            .size(10.0)
            .strong());

        ui.add_space(3.0);

        if status.services.is_empty() {
            ui.label(egui::RichText::new("No snapshot yet")
                .color(egui::Color32::from_rgb(100, 100, 100))
                .size(8.0)
                .italics());
        }

        for service in &status.services {
            ui.horizontal(|ui| {
                let (text, color) = indicator_visual(service.connected);

                ui.label(egui::RichText::new(if service.connected { "●" } else { "○" })
                    .color(color)
                    .size(10.0));

                ui.label(egui::RichText::new(format!("{}:", service.name))
                    .color(egui::Color32::from_rgb(130, 130, 130))
                    .size(9.0));

                ui.label(egui::RichText::new(text)
                    .color(color)
                    .size(9.0)
                    .monospace()
                    .strong());
            });
        }

        // Snapshot timestamp, rendered everywhere a timestamp shows
        if let Some(timestamp) = &status.last_timestamp {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("As of:")
                    .color(egui::Color32::from_rgb(130, 130, 130))
                    .size(9.0));
                ui.label(egui::RichText::new(format::format_date(timestamp))
                    .color(egui::Color32::from_rgb(200, 200, 200))
                    .size(9.0)
                    .monospace());
            });
        }

        if let Some(uptime) = &status.uptime {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("Uptime:")
                    .color(egui::Color32::from_rgb(130, 130, 130))
                    .size(9.0));
                ui.label(egui::RichText::new(uptime)
                    .color(egui::Color32::from_rgb(200, 200, 200))
                    .size(9.0)
                    .monospace());
            });
        }
    }

    fn render_metrics_section(&self, ui: &mut egui::Ui, status: &SystemStatus) {
        ui.label(egui::RichText::new("METRICS")
            .color(egui::Color32::from_rgb(150, 150, 150))
            .size(10.0)
            .strong());

        ui.add_space(3.0);

        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("Events:")
                .color(egui::Color32::from_rgb(130, 130, 130))
                .size(9.0));
            ui.label(egui::RichText::new(format::format_number(status.events_received as i64))
                .color(egui::Color32::from_rgb(200, 200, 200))
                .size(9.0)
                .monospace());
        });

        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("Snapshots:")
                .color(egui::Color32::from_rgb(130, 130, 130))
                .size(9.0));
            ui.label(egui::RichText::new(format::format_number(status.snapshots_received as i64))
                .color(egui::Color32::from_rgb(100, 200, 200))
                .size(9.0)
                .monospace());
        });
    }

    fn render_diagnostics_section(&self, ui: &mut egui::Ui, status: &SystemStatus) {
        ui.label(egui::RichText::new("DIAGNOSTICS")
            .color(egui::Color32::from_rgb(150, 150, 150))
            .size(10.0)
            .strong());

        ui.add_space(3.0);

        let total_diagnostics = status.diagnostics.len();

        if total_diagnostics == 0 {
            ui.label(egui::RichText::new("No messages")
                .color(egui::Color32::from_rgb(100, 100, 100))
                .size(8.0)
                .italics());
        } else {
            // Show truncation message if more than 8 entries
            if total_diagnostics > 8 {
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new("⋮")
                        .color(egui::Color32::from_rgb(150, 150, 150))
                        .size(10.0));
                    ui.label(egui::RichText::new(format!("Log truncated ({} older)", total_diagnostics - 6))
                        .color(egui::Color32::from_rgb(120, 120, 120))
                        .size(7.5)
                        .italics());
                });
            }

            // Scrollable area for diagnostics (max 6 lines visible)
            let line_height = 14.0;
            let max_visible_lines = 6;

            egui::ScrollArea::vertical()
                .max_height(line_height * max_visible_lines as f32)
                .auto_shrink([false, true])
                .show(ui, |ui| {
                    // Show all diagnostics in reverse order (newest first)
                    for diagnostic in status.diagnostics.iter().rev() {
                        ui.horizontal(|ui| {
                            // Level indicator
                            let (icon, color) = match diagnostic.level {
                                DiagnosticLevel::Info => ("ℹ", egui::Color32::from_rgb(100, 180, 255)),
                                DiagnosticLevel::Warning => ("⚠", egui::Color32::from_rgb(255, 200, 100)),
                                DiagnosticLevel::Error => ("✕", egui::Color32::from_rgb(255, 100, 100)),
                            };

                            ui.label(egui::RichText::new(icon)
                                .color(color)
                                .size(9.0));

                            // Timestamp
                            let time_str = diagnostic.timestamp.format("%H:%M:%S").to_string();
                            ui.label(egui::RichText::new(time_str)
                                .color(egui::Color32::from_rgb(100, 100, 100))
                                .size(8.0)
                                .monospace());

                            // Message (truncate if too long)
                            let max_len = 26;
                            let msg = if diagnostic.message.len() > max_len {
                                format!("{}...", &diagnostic.message[..max_len])
                            } else {
                                diagnostic.message.clone()
                            };

                            ui.label(egui::RichText::new(msg)
                                .color(egui::Color32::from_rgb(180, 180, 180))
                                .size(8.0));
                        });
                    }
                });
        }
    }
}

fn format_uptime(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(42), "42s");
        assert_eq!(format_uptime(125), "2m 5s");
        assert_eq!(format_uptime(3725), "1h 2m 5s");
    }

    #[test]
    fn test_disconnected_indicator_uses_danger_variant() {
        let (text, color) = indicator_visual(false);
        assert_eq!(text, "Disconnected");
        assert_eq!(color, egui::Color32::from_rgb(255, 100, 100));
    }

    #[test]
    fn test_connected_indicator_uses_success_variant() {
        let (text, color) = indicator_visual(true);
        assert_eq!(text, "Connected");
        assert_eq!(color, egui::Color32::from_rgb(100, 255, 100));
    }
}
