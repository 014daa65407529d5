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

//! Platform status tracking and state management.
//!
//! This module maintains per-service connection state from feed events and
//! emits change events. Updates for services that were never registered are
//! ignored: the indicator set is fixed at construction and unknown names are
//! a documented no-op.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use log::{debug, info};
use tokio::sync::broadcast;

use crate::protocol::FeedEvent;

/// Connection state of a single backend service indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceStatus {
    /// Service name (e.g. "cassandra").
    pub name: String,
    /// Whether the service reported connected in the last snapshot.
    pub connected: bool,
    /// Raw timestamp of the snapshot that last changed this flag.
    pub changed_at: Option<String>,
}

/// Progress of a long-running backend operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadingState {
    /// Operation description.
    pub message: String,
    /// Completion percentage, 0-100.
    pub progress: u8,
}

/// Events emitted by the tracker when platform state changes.
#[derive(Debug, Clone)]
pub enum StatusEvent {
    /// The backend acknowledged the channel with a greeting.
    FeedConnected(String),
    /// A service indicator flipped between connected and disconnected.
    ServiceChanged {
        /// Service name.
        service: String,
        /// New connection flag.
        connected: bool,
    },
    /// A loading progress update arrived.
    ProgressUpdated(LoadingState),
    /// A status snapshot arrived (timestamps should refresh).
    SnapshotUpdated,
}

/// Configuration for the status tracker.
#[derive(Debug, Clone)]
pub struct StatusTrackerConfig {
    /// Service names to track as indicators.
    pub services: Vec<String>,
    /// Broadcast channel capacity for events.
    pub event_channel_capacity: usize,
}

impl Default for StatusTrackerConfig {
    fn default() -> Self {
        Self {
            services: vec!["cassandra".to_string(), "mongodb".to_string()],
            event_channel_capacity: 256,
        }
    }
}

/// Status tracker that maintains service state and emits events.
pub struct StatusTracker {
    services: HashMap<String, ServiceStatus>,
    last_update: Option<NaiveDateTime>,
    raw_timestamp: Option<String>,
    uptime: Option<String>,
    loading: Option<LoadingState>,
    greeting: Option<String>,
    event_tx: broadcast::Sender<StatusEvent>,
}

impl std::fmt::Debug for StatusTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusTracker")
            .field("services", &self.services)
            .field("last_update", &self.last_update)
            .finish_non_exhaustive()
    }
}

impl StatusTracker {
    /// Create a new tracker with the given configuration.
    #[must_use]
    pub fn new(config: StatusTrackerConfig) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_channel_capacity);

        let services = config
            .services
            .into_iter()
            .map(|name| {
                (
                    name.clone(),
                    ServiceStatus {
                        name,
                        connected: false,
                        changed_at: None,
                    },
                )
            })
            .collect();

        Self {
            services,
            last_update: None,
            raw_timestamp: None,
            uptime: None,
            loading: None,
            greeting: None,
            event_tx,
        }
    }

    /// Subscribe to status events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.event_tx.subscribe()
    }

    /// Process a single feed event, updating state and emitting changes.
    pub fn process_event(&mut self, event: FeedEvent) {
        match event {
            FeedEvent::Connected { message } => {
                info!("Feed connected: {}", message);
                self.greeting = Some(message.clone());
                let _ = self.event_tx.send(StatusEvent::FeedConnected(message));
            }
            FeedEvent::LoadingProgress { message, progress } => {
                let state = LoadingState { message, progress };
                self.loading = Some(state.clone());
                let _ = self.event_tx.send(StatusEvent::ProgressUpdated(state));
            }
            FeedEvent::SystemStatusUpdate(update) => {
                for (name, connected) in update.services() {
                    match self.services.get_mut(name) {
                        Some(service) => {
                            if service.connected != connected {
                                service.connected = connected;
                                service.changed_at = Some(update.timestamp.clone());
                                let _ = self.event_tx.send(StatusEvent::ServiceChanged {
                                    service: name.to_string(),
                                    connected,
                                });
                            }
                        }
                        None => {
                            debug!("Ignoring status for unregistered service '{}'", name);
                        }
                    }
                }

                self.last_update = update.timestamp.parse().ok();
                self.raw_timestamp = Some(update.timestamp);
                self.uptime = update.uptime;
                let _ = self.event_tx.send(StatusEvent::SnapshotUpdated);
            }
        }
    }

    /// Clear the loading progress state (e.g. when the operation finishes).
    pub fn clear_loading(&mut self) {
        self.loading = None;
    }

    /// Get all tracked service indicators, sorted by name.
    #[must_use]
    pub fn services(&self) -> Vec<&ServiceStatus> {
        let mut services: Vec<_> = self.services.values().collect();
        services.sort_by(|a, b| a.name.cmp(&b.name));
        services
    }

    /// Get a specific service indicator.
    #[must_use]
    pub fn service(&self, name: &str) -> Option<&ServiceStatus> {
        self.services.get(name)
    }

    /// Get the raw timestamp of the last snapshot.
    #[must_use]
    pub fn last_timestamp(&self) -> Option<&str> {
        self.raw_timestamp.as_deref()
    }

    /// Get the parsed timestamp of the last snapshot, when parseable.
    #[must_use]
    pub fn last_update(&self) -> Option<NaiveDateTime> {
        self.last_update
    }

    /// Get the backend-reported uptime, when present.
    #[must_use]
    pub fn uptime(&self) -> Option<&str> {
        self.uptime.as_deref()
    }

    /// Get the current loading progress, when an operation is running.
    #[must_use]
    pub fn loading(&self) -> Option<&LoadingState> {
        self.loading.as_ref()
    }

    /// Get the greeting from the last `connected` event.
    #[must_use]
    pub fn greeting(&self) -> Option<&str> {
        self.greeting.as_deref()
    }
}

impl Default for StatusTracker {
    fn default() -> Self {
        Self::new(StatusTrackerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::SystemStatusUpdate;

    fn snapshot(cassandra: bool, mongodb: bool, timestamp: &str) -> FeedEvent {
        FeedEvent::SystemStatusUpdate(SystemStatusUpdate {
            cassandra_connected: cassandra,
            mongodb_connected: mongodb,
            timestamp: timestamp.to_string(),
            uptime: Some("Running".to_string()),
        })
    }

    #[test]
    fn test_snapshot_updates_indicators() {
        let mut tracker = StatusTracker::default();
        tracker.process_event(snapshot(true, false, "2024-01-15T10:30:00"));

        assert!(tracker.service("cassandra").unwrap().connected);
        assert!(!tracker.service("mongodb").unwrap().connected);
        assert_eq!(tracker.last_timestamp(), Some("2024-01-15T10:30:00"));
        assert_eq!(tracker.uptime(), Some("Running"));
        assert!(tracker.last_update().is_some());
    }

    #[test]
    fn test_service_change_emits_event_only_on_flip() {
        let mut tracker = StatusTracker::default();
        let mut rx = tracker.subscribe();

        tracker.process_event(snapshot(true, false, "2024-01-15T10:30:00"));
        tracker.process_event(snapshot(true, false, "2024-01-15T10:30:05"));

        let mut flips = 0;
        let mut snapshots = 0;
        while let Ok(event) = rx.try_recv() {
            match event {
                StatusEvent::ServiceChanged { .. } => flips += 1,
                StatusEvent::SnapshotUpdated => snapshots += 1,
                _ => {}
            }
        }
        // Only cassandra flipped (false -> true); the repeat snapshot changes nothing.
        assert_eq!(flips, 1);
        assert_eq!(snapshots, 2);
    }

    #[test]
    fn test_unregistered_service_is_ignored() {
        let mut tracker = StatusTracker::new(StatusTrackerConfig {
            services: vec!["mongodb".to_string()],
            ..Default::default()
        });
        tracker.process_event(snapshot(true, true, "2024-01-15T10:30:00"));

        assert!(tracker.service("cassandra").is_none());
        assert!(tracker.service("mongodb").unwrap().connected);
    }

    #[test]
    fn test_loading_progress_is_stored_and_cleared() {
        let mut tracker = StatusTracker::default();
        tracker.process_event(FeedEvent::LoadingProgress {
            message: "Setting up Cassandra keyspace and tables...".to_string(),
            progress: 30,
        });

        let loading = tracker.loading().unwrap();
        assert_eq!(loading.progress, 30);
        assert_eq!(loading.message, "Setting up Cassandra keyspace and tables...");

        tracker.clear_loading();
        assert!(tracker.loading().is_none());
    }

    #[test]
    fn test_greeting_recorded() {
        let mut tracker = StatusTracker::default();
        tracker.process_event(FeedEvent::Connected {
            message: "Connected to Telco NoSQL Platform".to_string(),
        });
        assert_eq!(tracker.greeting(), Some("Connected to Telco NoSQL Platform"));
    }

    #[test]
    fn test_unparseable_timestamp_keeps_raw_string() {
        let mut tracker = StatusTracker::default();
        tracker.process_event(snapshot(false, false, "not-a-timestamp"));
        assert_eq!(tracker.last_timestamp(), Some("not-a-timestamp"));
        assert!(tracker.last_update().is_none());
    }

    #[test]
    fn test_services_sorted_by_name() {
        let tracker = StatusTracker::default();
        let names: Vec<_> = tracker.services().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["cassandra", "mongodb"]);
    }
}
