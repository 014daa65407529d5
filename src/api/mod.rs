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

//! HTTP client for the platform backend API.
//!
//! A thin JSON wrapper: requests are serialized with an
//! `application/json` content type, non-2xx responses surface as
//! [`ApiError::Http`] with the status code, and successful bodies are parsed
//! as JSON. No retries, no caching; callers decide how to handle failures.

pub mod types;

use log::debug;
use reqwest::blocking::Client as HttpClient;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

pub use types::{
    BackendStatus, DataSummary, IndexTarget, LoadDataResponse, MessageResponse,
    PerformanceResponse, PerformanceResults, QueryRequest, QueryResponse, SetupResponse,
    VerifyDataResponse,
};

/// Errors from platform API calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend answered with a non-2xx status.
    #[error("HTTP error: status {status}")]
    Http {
        /// HTTP status code of the failed response.
        status: u16,
    },

    /// The request never completed (connect, DNS, I/O).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not the expected JSON shape.
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Client for the platform backend API.
///
/// Cheap to clone; clones share the underlying connection pool, so worker
/// threads can each take their own handle.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: HttpClient,
}

impl ApiClient {
    /// Create a client for the backend at `base_url` (e.g. "http://localhost:5000").
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: HttpClient::new(),
        }
    }

    /// The configured backend base URL.
    #[allow(dead_code)]
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue a JSON request against an API path.
    ///
    /// The body, when present, is serialized as JSON. Returns the parsed
    /// response body on any 2xx status and [`ApiError::Http`] otherwise.
    pub fn call(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value, ApiError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        debug!("{} {}", method, url);

        let mut request = self
            .http
            .request(method, &url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send()?;
        let status = response.status();

        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
            });
        }

        Ok(response.json()?)
    }

    fn post<T: DeserializeOwned>(&self, path: &str, body: Option<&Value>) -> Result<T, ApiError> {
        let value = self.call(Method::POST, path, body)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Set up backend database connections and schemas.
    pub fn setup_databases(&self) -> Result<SetupResponse, ApiError> {
        self.post("/api/setup-databases", None)
    }

    /// Load data from an existing export directory into both stores.
    pub fn load_existing_data(&self, data_directory: &str) -> Result<LoadDataResponse, ApiError> {
        let body = serde_json::json!({ "data_directory": data_directory });
        self.post("/api/load-existing-data", Some(&body))
    }

    /// Verify an export directory and fetch its summary.
    pub fn verify_data_directory(&self, data_directory: &str) -> Result<VerifyDataResponse, ApiError> {
        let body = serde_json::json!({ "data_directory": data_directory });
        self.post("/api/verify-data-directory", Some(&body))
    }

    /// Execute a query through the aggregation endpoint.
    pub fn execute_query(&self, request: &QueryRequest) -> Result<QueryResponse, ApiError> {
        self.post("/api/execute-query", Some(&request.to_body()))
    }

    /// Run the with/without-indexes performance comparison.
    pub fn performance_test(&self) -> Result<PerformanceResponse, ApiError> {
        self.post("/api/performance-test", None)
    }

    /// Create indexes on the targeted store(s).
    pub fn create_indexes(&self, target: IndexTarget) -> Result<MessageResponse, ApiError> {
        let body = serde_json::json!({ "database": target.as_str() });
        self.post("/api/create-indexes", Some(&body))
    }

    /// Drop indexes from the targeted store(s).
    pub fn drop_indexes(&self, target: IndexTarget) -> Result<MessageResponse, ApiError> {
        let body = serde_json::json!({ "database": target.as_str() });
        self.post("/api/drop-indexes", Some(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    /// Serve exactly one canned HTTP response, returning the base URL and a
    /// channel that yields the raw request once it arrives.
    fn mock_server(status_line: &str, body: &str) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let (request_tx, request_rx) = mpsc::channel();
        let response = format!(
            "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );

        thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).unwrap();
                raw.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&raw);
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text
                        .lines()
                        .find_map(|line| {
                            line.to_ascii_lowercase()
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                        })
                        .unwrap_or(0);
                    if raw.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            let _ = request_tx.send(String::from_utf8_lossy(&raw).into_owned());
            socket.write_all(response.as_bytes()).unwrap();
        });

        (base_url, request_rx)
    }

    #[test]
    fn test_call_success_returns_parsed_body() {
        let (base_url, _rx) = mock_server("HTTP/1.1 200 OK", r#"{"status":"success","count":3}"#);
        let client = ApiClient::new(&base_url);

        let value = client.call(Method::GET, "/api/anything", None).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["count"], 3);
    }

    #[test]
    fn test_call_non_2xx_fails_with_status() {
        let (base_url, _rx) = mock_server("HTTP/1.1 404 Not Found", r#"{"status":"error"}"#);
        let client = ApiClient::new(&base_url);

        let result = client.call(Method::GET, "/api/missing", None);
        assert!(matches!(result, Err(ApiError::Http { status: 404 })));
    }

    #[test]
    fn test_call_serializes_json_body() {
        let (base_url, request_rx) = mock_server("HTTP/1.1 200 OK", r#"{"status":"success"}"#);
        let client = ApiClient::new(&base_url);

        let body = serde_json::json!({ "data_directory": "telco_data_export" });
        client
            .call(Method::POST, "/api/verify-data-directory", Some(&body))
            .unwrap();

        let raw = request_rx.recv().unwrap();
        assert!(raw.starts_with("POST /api/verify-data-directory"));
        assert!(raw.to_ascii_lowercase().contains("content-type: application/json"));
        assert!(raw.contains(r#""data_directory":"telco_data_export""#));
    }

    #[test]
    fn test_execute_query_decodes_response() {
        let (base_url, _rx) = mock_server(
            "HTTP/1.1 200 OK",
            r#"{"status":"success","result":{"record_count":42},"execution_time":0.125}"#,
        );
        let client = ApiClient::new(&base_url);

        let response = client
            .execute_query(&QueryRequest::CombinedBehavior {
                month: "2024-01".to_string(),
                limit: 50,
            })
            .unwrap();
        assert!(response.status.is_success());
        assert_eq!(response.result["record_count"], 42);
        assert!((response.execution_time - 0.125).abs() < f64::EPSILON);
    }

    #[test]
    fn test_base_url_trailing_slash_normalized() {
        let client = ApiClient::new("http://localhost:5000/");
        assert_eq!(client.base_url(), "http://localhost:5000");
    }
}
