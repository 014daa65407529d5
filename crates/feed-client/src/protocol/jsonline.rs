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

//! Line-delimited JSON event parser.
//!
//! Parses the envelope format emitted by the platform backend, one event
//! per line:
//!
//! ```text
//! {"event":"<name>","data":{...}}
//! ```
//!
//! Unknown event names are skipped rather than rejected so the backend can
//! add event types without breaking older clients.

use serde::Deserialize;
use serde_json::Value;

use super::{FeedEvent, ParseError, Protocol, SystemStatusUpdate};

/// Parser for line-delimited JSON feed events.
#[derive(Debug, Default)]
pub struct JsonLineParser;

impl JsonLineParser {
    /// Create a new JSON line parser.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Wire envelope wrapping every event.
#[derive(Debug, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ConnectedPayload {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct LoadingProgressPayload {
    message: String,
    progress: u8,
}

impl Protocol for JsonLineParser {
    type Event = FeedEvent;
    type Error = ParseError;

    fn parse(&mut self, input: &[u8]) -> Result<Option<FeedEvent>, ParseError> {
        let line = std::str::from_utf8(input)
            .map_err(|_| ParseError::InvalidFormat("invalid UTF-8".to_string()))?;

        parse_event_line(line)
    }
}

/// Parse a single feed event line.
fn parse_event_line(line: &str) -> Result<Option<FeedEvent>, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let envelope: Envelope = serde_json::from_str(line)
        .map_err(|e| ParseError::InvalidFormat(e.to_string()))?;

    match envelope.event.as_str() {
        "connected" => {
            // Greeting payload is optional; a bare event still counts.
            let payload: ConnectedPayload = match envelope.data {
                Some(data) => serde_json::from_value(data).map_err(|e| {
                    ParseError::InvalidPayload {
                        event: envelope.event.clone(),
                        source: e,
                    }
                })?,
                None => ConnectedPayload {
                    message: String::new(),
                },
            };
            Ok(Some(FeedEvent::Connected {
                message: payload.message,
            }))
        }
        "loading_progress" => {
            let data = envelope
                .data
                .ok_or_else(|| ParseError::MissingPayload(envelope.event.clone()))?;
            let payload: LoadingProgressPayload =
                serde_json::from_value(data).map_err(|e| ParseError::InvalidPayload {
                    event: envelope.event.clone(),
                    source: e,
                })?;
            Ok(Some(FeedEvent::LoadingProgress {
                message: payload.message,
                progress: payload.progress,
            }))
        }
        "system_status_update" => {
            let data = envelope
                .data
                .ok_or_else(|| ParseError::MissingPayload(envelope.event.clone()))?;
            let payload: SystemStatusUpdate =
                serde_json::from_value(data).map_err(|e| ParseError::InvalidPayload {
                    event: envelope.event.clone(),
                    source: e,
                })?;
            Ok(Some(FeedEvent::SystemStatusUpdate(payload)))
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::FeedRequest;

    #[test]
    fn test_parse_connected() {
        let mut parser = JsonLineParser::new();
        let line = br#"{"event":"connected","data":{"message":"Connected to Telco NoSQL Platform"}}"#;
        let result = parser.parse(line).unwrap();
        assert!(matches!(
            result,
            Some(FeedEvent::Connected { message })
            if message == "Connected to Telco NoSQL Platform"
        ));
    }

    #[test]
    fn test_parse_connected_without_payload() {
        let mut parser = JsonLineParser::new();
        let result = parser.parse(br#"{"event":"connected"}"#).unwrap();
        assert!(matches!(
            result,
            Some(FeedEvent::Connected { message }) if message.is_empty()
        ));
    }

    #[test]
    fn test_parse_loading_progress() {
        let mut parser = JsonLineParser::new();
        let line =
            br#"{"event":"loading_progress","data":{"message":"Loading data to Cassandra...","progress":20}}"#;
        let result = parser.parse(line).unwrap();
        assert!(matches!(
            result,
            Some(FeedEvent::LoadingProgress { message, progress })
            if message == "Loading data to Cassandra..." && progress == 20
        ));
    }

    #[test]
    fn test_parse_loading_progress_missing_payload() {
        let mut parser = JsonLineParser::new();
        let result = parser.parse(br#"{"event":"loading_progress"}"#);
        assert!(matches!(result, Err(ParseError::MissingPayload(event)) if event == "loading_progress"));
    }

    #[test]
    fn test_parse_system_status_update() {
        let mut parser = JsonLineParser::new();
        let line = br#"{"event":"system_status_update","data":{"cassandra_connected":true,"mongodb_connected":false,"timestamp":"2024-01-15T10:30:00","uptime":"Running"}}"#;
        let result = parser.parse(line).unwrap();
        assert!(matches!(
            result,
            Some(FeedEvent::SystemStatusUpdate(status))
            if status.cassandra_connected
                && !status.mongodb_connected
                && status.timestamp == "2024-01-15T10:30:00"
                && status.uptime.as_deref() == Some("Running")
        ));
    }

    #[test]
    fn test_parse_status_update_without_uptime() {
        let mut parser = JsonLineParser::new();
        let line = br#"{"event":"system_status_update","data":{"cassandra_connected":false,"mongodb_connected":true,"timestamp":"2024-01-15T10:30:00"}}"#;
        let result = parser.parse(line).unwrap();
        assert!(matches!(
            result,
            Some(FeedEvent::SystemStatusUpdate(status)) if status.uptime.is_none()
        ));
    }

    #[test]
    fn test_status_update_services_iterates_both_stores() {
        let status = SystemStatusUpdate {
            cassandra_connected: false,
            mongodb_connected: true,
            timestamp: "2024-01-15T10:30:00".to_string(),
            uptime: None,
        };
        let services: Vec<_> = status.services().collect();
        assert_eq!(services, vec![("cassandra", false), ("mongodb", true)]);
    }

    #[test]
    fn test_parse_unknown_event_skipped() {
        let mut parser = JsonLineParser::new();
        let result = parser
            .parse(br#"{"event":"query_completed","data":{"rows":5}}"#)
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_parse_empty_line() {
        let mut parser = JsonLineParser::new();
        let result = parser.parse(b"").unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_parse_malformed_json() {
        let mut parser = JsonLineParser::new();
        let result = parser.parse(b"{not json");
        assert!(matches!(result, Err(ParseError::InvalidFormat(_))));
    }

    #[test]
    fn test_parse_invalid_payload() {
        let mut parser = JsonLineParser::new();
        let line = br#"{"event":"loading_progress","data":{"message":"x","progress":"half"}}"#;
        let result = parser.parse(line);
        assert!(matches!(
            result,
            Err(ParseError::InvalidPayload { event, .. }) if event == "loading_progress"
        ));
    }

    #[test]
    fn test_request_encoding_round_trips_as_envelope() {
        let encoded = FeedRequest::SystemStatus.encode();
        let envelope: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(envelope["event"], "request_system_status");
    }
}
