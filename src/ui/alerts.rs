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

//! Dismissible alert banners.
//!
//! Alerts stack at the top of the content area. Each alert carries its own
//! timer and auto-expires 5 seconds after it was pushed unless the user
//! dismisses it first.

use std::time::{Duration, Instant};

use egui;

/// How long an alert stays up before auto-dismissal.
pub const ALERT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Visual severity of an alert banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Success,
    Info,
    Warning,
    Danger,
}

impl AlertKind {
    fn accent(self) -> egui::Color32 {
        match self {
            Self::Success => egui::Color32::from_rgb(100, 255, 100),
            Self::Info => egui::Color32::from_rgb(100, 180, 255),
            Self::Warning => egui::Color32::from_rgb(255, 200, 100),
            Self::Danger => egui::Color32::from_rgb(255, 100, 100),
        }
    }

    fn fill(self) -> egui::Color32 {
        match self {
            Self::Success => egui::Color32::from_rgba_unmultiplied(30, 55, 35, 230),
            Self::Info => egui::Color32::from_rgba_unmultiplied(30, 45, 60, 230),
            Self::Warning => egui::Color32::from_rgba_unmultiplied(60, 50, 25, 230),
            Self::Danger => egui::Color32::from_rgba_unmultiplied(60, 30, 30, 230),
        }
    }

    fn icon(self) -> &'static str {
        match self {
            Self::Success => "✓",
            Self::Info => "ℹ",
            Self::Warning => "⚠",
            Self::Danger => "✕",
        }
    }
}

/// A single banner in the stack.
#[derive(Debug, Clone)]
pub struct Alert {
    id: u64,
    pub kind: AlertKind,
    pub message: String,
    created: Instant,
}

impl Alert {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created) >= ALERT_TIMEOUT
    }
}

/// Stack of active alert banners.
#[derive(Debug, Default)]
pub struct AlertStack {
    alerts: Vec<Alert>,
    next_id: u64,
}

impl AlertStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a new alert. Returns its id for manual dismissal.
    pub fn push(&mut self, kind: AlertKind, message: impl Into<String>) -> u64 {
        self.push_at(kind, message, Instant::now())
    }

    fn push_at(&mut self, kind: AlertKind, message: impl Into<String>, created: Instant) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.alerts.push(Alert {
            id,
            kind,
            message: message.into(),
            created,
        });
        id
    }

    /// Dismiss an alert by id. Unknown ids are ignored.
    pub fn dismiss(&mut self, id: u64) {
        self.alerts.retain(|alert| alert.id != id);
    }

    /// Drop alerts whose timer has run out.
    pub fn prune(&mut self, now: Instant) {
        self.alerts.retain(|alert| !alert.is_expired(now));
    }

    /// Number of active alerts.
    #[allow(dead_code)]
    #[must_use]
    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    #[allow(dead_code)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    /// Render the stack at the current Ui position.
    pub fn ui(&mut self, ui: &mut egui::Ui) {
        self.prune(Instant::now());

        let mut dismissed = None;
        for alert in &self.alerts {
            egui::Frame::new()
                .fill(alert.kind.fill())
                .stroke(egui::Stroke::new(1.0, alert.kind.accent()))
                .corner_radius(4.0)
                .inner_margin(egui::Margin::symmetric(8, 6))
                .show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.label(
                            egui::RichText::new(alert.kind.icon())
                                .color(alert.kind.accent())
                                .size(12.0),
                        );
                        ui.label(
                            egui::RichText::new(&alert.message)
                                .color(egui::Color32::from_rgb(220, 220, 220))
                                .size(11.0),
                        );

                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui
                                .button(
                                    egui::RichText::new("✕")
                                        .size(11.0)
                                        .color(egui::Color32::from_rgb(150, 150, 150)),
                                )
                                .on_hover_text("Dismiss")
                                .clicked()
                            {
                                dismissed = Some(alert.id);
                            }
                        });
                    });
                });
            ui.add_space(4.0);
        }

        if let Some(id) = dismissed {
            self.dismiss(id);
        }

        // Keep repainting while timers are running so expiry doesn't wait
        // for the next input event.
        if !self.alerts.is_empty() {
            ui.ctx().request_repaint_after(Duration::from_millis(250));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_expires_after_timeout() {
        let mut stack = AlertStack::new();
        let created = Instant::now();
        stack.push_at(AlertKind::Info, "databases ready", created);

        stack.prune(created + Duration::from_millis(4999));
        assert_eq!(stack.len(), 1);

        stack.prune(created + ALERT_TIMEOUT);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_manual_dismiss_before_timeout() {
        let mut stack = AlertStack::new();
        let id = stack.push(AlertKind::Danger, "An unexpected error occurred");
        assert_eq!(stack.len(), 1);

        stack.dismiss(id);
        assert!(stack.is_empty());

        // Dismissing again is harmless.
        stack.dismiss(id);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_stacked_alerts_expire_independently() {
        let mut stack = AlertStack::new();
        let first = Instant::now();
        let second = first + Duration::from_secs(3);
        stack.push_at(AlertKind::Success, "Indexes created", first);
        stack.push_at(AlertKind::Warning, "MongoDB disconnected", second);

        stack.prune(first + ALERT_TIMEOUT);
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.alerts[0].message, "MongoDB disconnected");

        stack.prune(second + ALERT_TIMEOUT);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_ids_are_unique_across_pushes() {
        let mut stack = AlertStack::new();
        let a = stack.push(AlertKind::Info, "one");
        let b = stack.push(AlertKind::Info, "two");
        assert_ne!(a, b);

        stack.dismiss(a);
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.alerts[0].id, b);
    }
}
