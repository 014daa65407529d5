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

//! Feed client library for connecting to the platform realtime channel.
//!
//! This library provides a modular, reusable architecture for receiving and
//! processing platform dashboard events. It supports multiple layers that
//! can be used independently or composed together:
//!
//! - **Protocol layer**: Event parsing (line-delimited JSON envelopes)
//! - **Status layer**: Per-service connection state, loading progress, and
//!   change events
//! - **Connection layer**: Async bidirectional TCP with automatic
//!   reconnection and address hot-reload
//!
//! # Quick Start
//!
//! Use the [`Client`] type for full-stack operation:
//!
//! ```no_run
//! use feed_client::{Client, ClientConfig, ConnectionConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut client = Client::spawn(ClientConfig {
//!         connection: ConnectionConfig {
//!             address: "localhost:9009".to_string(),
//!             ..Default::default()
//!         },
//!         ..Default::default()
//!     });
//!
//!     while client.process_next().await {
//!         for service in client.services() {
//!             println!("{}: {}", service.name, service.connected);
//!         }
//!     }
//! }
//! ```
//!
//! # Using Individual Layers
//!
//! Each layer can be used independently for custom integrations:
//!
//! ## Protocol Layer Only
//!
//! ```
//! use feed_client::protocol::{JsonLineParser, Protocol};
//!
//! let mut parser = JsonLineParser::new();
//! let line = br#"{"event":"loading_progress","data":{"message":"Loading...","progress":40}}"#;
//! if let Ok(Some(event)) = parser.parse(line) {
//!     println!("Got event: {:?}", event);
//! }
//! ```
//!
//! ## Status Layer Only
//!
//! ```
//! use feed_client::status::{StatusTracker, StatusTrackerConfig};
//! use feed_client::protocol::{FeedEvent, SystemStatusUpdate};
//!
//! let mut tracker = StatusTracker::new(StatusTrackerConfig::default());
//!
//! tracker.process_event(FeedEvent::SystemStatusUpdate(SystemStatusUpdate {
//!     cassandra_connected: true,
//!     mongodb_connected: true,
//!     timestamp: "2024-01-15T10:30:00".to_string(),
//!     uptime: None,
//! }));
//!
//! println!("Tracking {} services", tracker.services().len());
//! ```

pub mod protocol;
pub mod status;
pub mod tcp;

use std::sync::{Arc, RwLock};

use log::warn;
use tokio::sync::broadcast;

pub use protocol::{FeedEvent, FeedRequest, JsonLineParser, ParseError, Protocol, SystemStatusUpdate};
pub use status::{LoadingState, ServiceStatus, StatusEvent, StatusTracker, StatusTrackerConfig};
pub use tcp::{Connection, ConnectionConfig, ConnectionEvent, ConnectionState};

/// Configuration for the full-stack client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Connection configuration.
    pub connection: ConnectionConfig,
    /// Status tracker configuration.
    pub status: StatusTrackerConfig,
    /// Request a fresh status snapshot each time the channel (re)connects.
    pub request_status_on_connect: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            status: StatusTrackerConfig::default(),
            request_status_on_connect: true,
        }
    }
}

/// Full-stack feed client that wires all layers together.
///
/// The client manages a TCP connection, parses incoming events, and maintains
/// platform status in a tracker. There is one client per process: the
/// connection lives for the lifetime of the application that spawned it.
pub struct Client {
    tracker: Arc<RwLock<StatusTracker>>,
    connection: Connection,
    connection_state: Arc<RwLock<ConnectionState>>,
    parser: JsonLineParser,
    request_status_on_connect: bool,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("connection", &self.connection)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Spawn a new client with the given configuration.
    ///
    /// This starts the background connection task. Call
    /// [`Client::process_next`] in a loop to drive event processing.
    #[must_use]
    pub fn spawn(config: ClientConfig) -> Self {
        let tracker = Arc::new(RwLock::new(StatusTracker::new(config.status)));
        let connection = Connection::spawn(config.connection);
        let connection_state = Arc::new(RwLock::new(ConnectionState::Disconnected));

        Self {
            tracker,
            connection,
            connection_state,
            parser: JsonLineParser::new(),
            request_status_on_connect: config.request_status_on_connect,
        }
    }

    /// Process the next event from the connection.
    ///
    /// Returns `false` once the connection has shut down:
    ///
    /// ```no_run
    /// # use feed_client::{Client, ClientConfig};
    /// # async fn example() {
    /// let mut client = Client::spawn(ClientConfig::default());
    /// while client.process_next().await {}
    /// # }
    /// ```
    pub async fn process_next(&mut self) -> bool {
        let event = match self.connection.recv().await {
            Some(event) => event,
            None => return false,
        };

        match event {
            ConnectionEvent::StateChanged(state) => {
                let connected = state == ConnectionState::Connected;
                if let Ok(mut s) = self.connection_state.write() {
                    *s = state;
                }
                if connected && self.request_status_on_connect {
                    self.request_status();
                }
            }
            ConnectionEvent::DataReceived(data) => match self.parser.parse(&data) {
                Ok(Some(event)) => {
                    if let Ok(mut tracker) = self.tracker.write() {
                        tracker.process_event(event);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("Parse error: {}", e);
                }
            },
        }

        true
    }

    /// Get all tracked service indicators.
    #[must_use]
    pub fn services(&self) -> Vec<ServiceStatus> {
        self.tracker
            .read()
            .map(|t| t.services().into_iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Get a specific service indicator by name.
    #[must_use]
    pub fn service(&self, name: &str) -> Option<ServiceStatus> {
        self.tracker
            .read()
            .ok()
            .and_then(|t| t.service(name).cloned())
    }

    /// Get the current loading progress, when an operation is running.
    #[must_use]
    pub fn loading(&self) -> Option<LoadingState> {
        self.tracker.read().ok().and_then(|t| t.loading().cloned())
    }

    /// Get the raw timestamp of the last status snapshot.
    #[must_use]
    pub fn last_timestamp(&self) -> Option<String> {
        self.tracker
            .read()
            .ok()
            .and_then(|t| t.last_timestamp().map(ToOwned::to_owned))
    }

    /// Get the backend-reported uptime, when present.
    #[must_use]
    pub fn uptime(&self) -> Option<String> {
        self.tracker
            .read()
            .ok()
            .and_then(|t| t.uptime().map(ToOwned::to_owned))
    }

    /// Subscribe to status events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.tracker
            .read()
            .map(|t| t.subscribe())
            .unwrap_or_else(|_| {
                let (tx, rx) = broadcast::channel(1);
                drop(tx);
                rx
            })
    }

    /// Get the current connection state.
    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.connection_state
            .read()
            .map(|s| s.clone())
            .unwrap_or(ConnectionState::Disconnected)
    }

    /// Ask the backend to push a fresh status snapshot.
    pub fn request_status(&self) {
        if !self.connection.send_line(FeedRequest::SystemStatus.encode()) {
            warn!("Status request dropped: outbound queue unavailable");
        }
    }

    /// Change the server address.
    ///
    /// The connection will disconnect and reconnect to the new address.
    pub fn set_address(&self, address: String) {
        self.connection.set_address(address);
    }

    /// Get the current server address.
    #[must_use]
    pub fn current_address(&self) -> String {
        self.connection.current_address()
    }

    /// Shut down the client.
    pub fn shutdown(&self) {
        self.connection.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_full_stack_status_update() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let mut client = Client::spawn(ClientConfig {
            connection: ConnectionConfig {
                address,
                reconnect_delay: Duration::from_secs(60),
                ..Default::default()
            },
            request_status_on_connect: false,
            ..Default::default()
        });

        let (mut socket, _) = timeout(Duration::from_secs(5), listener.accept())
            .await
            .unwrap()
            .unwrap();
        socket
            .write_all(b"{\"event\":\"system_status_update\",\"data\":{\"cassandra_connected\":true,\"mongodb_connected\":false,\"timestamp\":\"2024-01-15T10:30:00\"}}\n")
            .await
            .unwrap();

        // Drive Connecting, Connected, and the data line.
        for _ in 0..3 {
            assert!(timeout(Duration::from_secs(5), client.process_next())
                .await
                .unwrap());
        }

        assert_eq!(client.connection_state(), ConnectionState::Connected);
        assert!(client.service("cassandra").unwrap().connected);
        assert!(!client.service("mongodb").unwrap().connected);
        assert_eq!(client.last_timestamp().as_deref(), Some("2024-01-15T10:30:00"));

        client.shutdown();
    }
}
