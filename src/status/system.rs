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

use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use feed_client::{ConnectionState, LoadingState, ServiceStatus};

/// Diagnostic message with timestamp
#[derive(Debug, Clone)]
pub struct DiagnosticMessage {
    pub timestamp: DateTime<Utc>,
    pub level: DiagnosticLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiagnosticLevel {
    Info,
    Warning,
    Error,
}

/// System status tracking platform state and diagnostics
#[derive(Debug)]
pub struct SystemStatus {
    // Feed connection status
    pub feed_state: ConnectionState,
    pub feed_address: String,
    pub last_successful_connection: Option<DateTime<Utc>>,

    // Per-service indicators from the last backend snapshot
    pub services: Vec<ServiceStatus>,

    // Raw timestamp of the last snapshot (rendered via format::format_date)
    pub last_timestamp: Option<String>,
    pub uptime: Option<String>,

    // Loading progress pushed by the backend
    pub loading: Option<LoadingState>,

    // Event statistics
    pub events_received: u64,
    pub snapshots_received: u64,

    // Diagnostic messages (keep last 50)
    pub diagnostics: VecDeque<DiagnosticMessage>,
    max_diagnostics: usize,
}

impl Default for SystemStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemStatus {
    pub fn new() -> Self {
        Self {
            feed_state: ConnectionState::Disconnected,
            feed_address: String::new(),
            last_successful_connection: None,

            services: Vec::new(),
            last_timestamp: None,
            uptime: None,
            loading: None,

            events_received: 0,
            snapshots_received: 0,

            diagnostics: VecDeque::with_capacity(50),
            max_diagnostics: 50,
        }
    }

    /// Update feed connection status
    pub fn set_feed_state(&mut self, state: ConnectionState) {
        match &state {
            ConnectionState::Connecting => {
                self.add_diagnostic(
                    DiagnosticLevel::Info,
                    format!("Connecting to {}...", self.feed_address),
                );
            }
            ConnectionState::Connected => {
                self.last_successful_connection = Some(Utc::now());
                self.add_diagnostic(
                    DiagnosticLevel::Info,
                    format!("Connected to {}", self.feed_address),
                );
            }
            ConnectionState::Disconnected => {
                self.add_diagnostic(
                    DiagnosticLevel::Warning,
                    "Disconnected from platform feed".to_string(),
                );
            }
            ConnectionState::Error(error) => {
                self.add_diagnostic(DiagnosticLevel::Error, format!("Feed error: {}", error));
            }
        }
        self.feed_state = state;
    }

    /// Record a service indicator flip
    pub fn record_service_change(&mut self, service: &str, connected: bool) {
        let level = if connected {
            DiagnosticLevel::Info
        } else {
            DiagnosticLevel::Warning
        };
        self.add_diagnostic(
            level,
            format!(
                "[{}] {}",
                service,
                if connected { "connected" } else { "disconnected" }
            ),
        );
    }

    /// Replace the indicator snapshot from the client tracker
    pub fn apply_snapshot(
        &mut self,
        services: Vec<ServiceStatus>,
        timestamp: Option<String>,
        uptime: Option<String>,
    ) {
        self.services = services;
        self.last_timestamp = timestamp;
        self.uptime = uptime;
        self.snapshots_received += 1;
    }

    /// Look up a service indicator. Absent names resolve to `None` and
    /// callers are expected to no-op.
    #[allow(dead_code)]
    pub fn service(&self, name: &str) -> Option<&ServiceStatus> {
        self.services.iter().find(|s| s.name == name)
    }

    /// Increment event counter
    pub fn increment_event_count(&mut self) {
        self.events_received += 1;
    }

    /// Get number of connected services
    #[allow(dead_code)]
    pub fn connected_service_count(&self) -> usize {
        self.services.iter().filter(|s| s.connected).count()
    }

    /// Add a diagnostic message
    pub fn add_diagnostic(&mut self, level: DiagnosticLevel, message: String) {
        let diagnostic = DiagnosticMessage {
            timestamp: Utc::now(),
            level,
            message,
        };

        self.diagnostics.push_back(diagnostic);

        // Keep only the last N messages
        while self.diagnostics.len() > self.max_diagnostics {
            self.diagnostics.pop_front();
        }
    }
}

/// Thread-safe wrapper for SystemStatus
pub type SharedSystemStatus = Arc<Mutex<SystemStatus>>;

#[cfg(test)]
mod tests {
    use super::*;

    fn service(name: &str, connected: bool) -> ServiceStatus {
        ServiceStatus {
            name: name.to_string(),
            connected,
            changed_at: None,
        }
    }

    #[test]
    fn test_apply_snapshot_tracks_indicators() {
        let mut status = SystemStatus::new();
        status.apply_snapshot(
            vec![service("cassandra", false), service("mongodb", true)],
            Some("2024-01-15T10:30:00".to_string()),
            Some("Running".to_string()),
        );

        assert!(!status.service("cassandra").unwrap().connected);
        assert!(status.service("mongodb").unwrap().connected);
        assert_eq!(status.connected_service_count(), 1);
        assert_eq!(status.snapshots_received, 1);
    }

    #[test]
    fn test_unknown_service_lookup_is_none() {
        let status = SystemStatus::new();
        assert!(status.service("redis").is_none());
    }

    #[test]
    fn test_diagnostics_capped_at_fifty() {
        let mut status = SystemStatus::new();
        for i in 0..60 {
            status.add_diagnostic(DiagnosticLevel::Info, format!("event {}", i));
        }
        assert_eq!(status.diagnostics.len(), 50);
        assert_eq!(status.diagnostics.front().unwrap().message, "event 10");
    }

    #[test]
    fn test_feed_state_changes_log_diagnostics() {
        let mut status = SystemStatus::new();
        status.feed_address = "localhost:9009".to_string();
        status.set_feed_state(ConnectionState::Connected);
        assert_eq!(status.feed_state, ConnectionState::Connected);
        assert!(status.last_successful_connection.is_some());
        assert!(status
            .diagnostics
            .back()
            .unwrap()
            .message
            .contains("Connected to localhost:9009"));
    }
}
