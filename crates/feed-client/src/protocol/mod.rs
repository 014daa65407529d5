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

//! Protocol layer for platform feed event parsing.
//!
//! This module provides a trait-based abstraction for extensible protocol
//! support. Currently implements the line-delimited JSON event format emitted
//! by the platform backend.

mod jsonline;

pub use jsonline::JsonLineParser;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during event parsing.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid event format: {0}")]
    InvalidFormat(String),

    #[error("missing payload for event '{0}'")]
    MissingPayload(String),

    #[error("invalid payload for event '{event}': {source}")]
    InvalidPayload {
        event: String,
        #[source]
        source: serde_json::Error,
    },
}

/// System status snapshot pushed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStatusUpdate {
    /// Whether the Cassandra store is reachable.
    pub cassandra_connected: bool,
    /// Whether the MongoDB store is reachable.
    pub mongodb_connected: bool,
    /// Snapshot time as an RFC 3339 string.
    pub timestamp: String,
    /// Human-readable backend uptime, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime: Option<String>,
}

impl SystemStatusUpdate {
    /// Iterate the per-service connection flags by service name.
    pub fn services(&self) -> impl Iterator<Item = (&'static str, bool)> {
        [
            ("cassandra", self.cassandra_connected),
            ("mongodb", self.mongodb_connected),
        ]
        .into_iter()
    }
}

/// Unified event type for the platform feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// Greeting sent by the backend once the channel is established.
    Connected {
        /// Server-provided welcome message.
        message: String,
    },

    /// Progress update for a long-running backend operation.
    LoadingProgress {
        /// Operation description to display.
        message: String,
        /// Completion percentage, 0-100. Clamped by the emitter, passed
        /// through unvalidated here.
        progress: u8,
    },

    /// Per-service connection snapshot.
    SystemStatusUpdate(SystemStatusUpdate),
}

/// Trait for feed protocol parsers.
///
/// Implement this trait to add support for new feed wire formats.
pub trait Protocol {
    /// The event type produced by this parser.
    type Event;
    /// The error type for parsing failures.
    type Error;

    /// Parse input bytes into an event.
    ///
    /// Returns `Ok(Some(event))` if parsing succeeded,
    /// `Ok(None)` if the input is valid but doesn't produce an event,
    /// or `Err(error)` if parsing failed.
    fn parse(&mut self, input: &[u8]) -> Result<Option<Self::Event>, Self::Error>;
}

/// Requests the client can send to the backend over the feed channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedRequest {
    /// Ask the backend to push a fresh `system_status_update`.
    SystemStatus,
}

impl FeedRequest {
    /// Encode the request as a single feed line (without trailing newline).
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::SystemStatus => r#"{"event":"request_system_status"}"#.to_string(),
        }
    }
}
