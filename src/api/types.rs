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

//! Request and response types for the platform HTTP API.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{json, Value};

/// Outcome flag carried by every backend response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendStatus {
    Success,
    Error,
}

impl BackendStatus {
    /// Whether the backend reported success.
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Connection details returned by database setup.
#[derive(Debug, Clone, Deserialize)]
pub struct SetupDetails {
    pub cassandra_keyspace: String,
    pub mongodb_database: String,
}

/// Response from `POST /api/setup-databases`.
#[derive(Debug, Clone, Deserialize)]
pub struct SetupResponse {
    pub status: BackendStatus,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: Option<SetupDetails>,
}

/// Response from `POST /api/load-existing-data`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoadDataResponse {
    pub status: BackendStatus,
    #[serde(default)]
    pub message: String,
    /// Records loaded per Cassandra table.
    #[serde(default)]
    pub cassandra_results: HashMap<String, u64>,
    /// Records loaded per MongoDB collection.
    #[serde(default)]
    pub mongodb_results: HashMap<String, u64>,
    #[serde(default)]
    pub total_records: u64,
}

/// Summary of an export directory, as reported by the backend.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataSummary {
    #[serde(default)]
    pub directory: String,
    #[serde(default)]
    pub files_found: u32,
    #[serde(default)]
    pub total_files: u32,
    /// Size in bytes per export file.
    #[serde(default)]
    pub file_sizes: HashMap<String, u64>,
    /// Record count per export file (a string when the file failed to load).
    #[serde(default)]
    pub estimated_records: HashMap<String, Value>,
}

/// Response from `POST /api/verify-data-directory`.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyDataResponse {
    pub status: BackendStatus,
    #[serde(default)]
    pub message: String,
    /// Summary of the export directory contents.
    #[serde(default)]
    pub summary: DataSummary,
}

/// Response from `POST /api/execute-query`.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    pub status: BackendStatus,
    #[serde(default)]
    pub message: String,
    /// Query result payload, shaped per query kind.
    #[serde(default)]
    pub result: Value,
    /// Server-side execution time in seconds.
    #[serde(default)]
    pub execution_time: f64,
}

/// Per-query timings from the index performance comparison.
#[allow(dead_code)]
#[derive(Debug, Clone, Deserialize)]
pub struct PerformanceQueryResult {
    pub without_index: f64,
    pub with_index: f64,
    pub improvement_percent: f64,
    #[serde(default)]
    pub records_processed: u64,
}

/// Aggregate statistics from the index performance comparison.
#[allow(dead_code)]
#[derive(Debug, Clone, Deserialize)]
pub struct PerformanceSummary {
    pub average_improvement: f64,
    pub total_time_without_indexes: f64,
    pub total_time_with_indexes: f64,
    pub total_time_saved: f64,
    pub best_improvement: f64,
    pub worst_improvement: f64,
    pub queries_tested: u32,
}

/// Full result set from `POST /api/performance-test`.
#[derive(Debug, Clone, Deserialize)]
pub struct PerformanceResults {
    pub individual_queries: HashMap<String, PerformanceQueryResult>,
    pub summary: PerformanceSummary,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// Response from `POST /api/performance-test`.
#[derive(Debug, Clone, Deserialize)]
pub struct PerformanceResponse {
    pub status: BackendStatus,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub results: Option<PerformanceResults>,
}

/// Response carrying only a status and message (index management).
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub status: BackendStatus,
    #[serde(default)]
    pub message: String,
}

/// Which store(s) an index operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexTarget {
    Cassandra,
    Mongodb,
    #[default]
    Both,
}

impl IndexTarget {
    /// Wire name expected by the backend.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cassandra => "cassandra",
            Self::Mongodb => "mongodb",
            Self::Both => "both",
        }
    }
}

/// A query to run through the aggregation endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryRequest {
    /// Call record analytics over a date range (Cassandra).
    CallAnalytics {
        /// Range start, "YYYY-MM-DD".
        start_date: String,
        /// Range end, "YYYY-MM-DD".
        end_date: String,
        /// Optional call type filter.
        call_type: Option<String>,
    },
    /// Customer segment insights (MongoDB).
    CustomerInsights {
        segment: Option<String>,
        plan_type: Option<String>,
    },
    /// Cross-store customer behavior for one month.
    CombinedBehavior {
        /// Month key, "YYYY-MM".
        month: String,
        /// Maximum rows to return.
        limit: u32,
    },
}

impl QueryRequest {
    /// Wire name of the query kind.
    #[must_use]
    pub fn query_type(&self) -> &'static str {
        match self {
            Self::CallAnalytics { .. } => "call_analytics",
            Self::CustomerInsights { .. } => "customer_insights",
            Self::CombinedBehavior { .. } => "combined_behavior",
        }
    }

    /// Build the request body expected by the backend.
    #[must_use]
    pub fn to_body(&self) -> Value {
        let parameters = match self {
            Self::CallAnalytics {
                start_date,
                end_date,
                call_type,
            } => {
                let mut params = json!({
                    "start_date": start_date,
                    "end_date": end_date,
                });
                if let Some(call_type) = call_type {
                    params["call_type"] = json!(call_type);
                }
                params
            }
            Self::CustomerInsights { segment, plan_type } => {
                let mut params = json!({});
                if let Some(segment) = segment {
                    params["segment"] = json!(segment);
                }
                if let Some(plan_type) = plan_type {
                    params["plan_type"] = json!(plan_type);
                }
                params
            }
            Self::CombinedBehavior { month, limit } => json!({
                "month": month,
                "limit": limit,
            }),
        };

        json!({
            "query_type": self.query_type(),
            "parameters": parameters,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_request_body_call_analytics() {
        let request = QueryRequest::CallAnalytics {
            start_date: "2024-01-01".to_string(),
            end_date: "2024-01-31".to_string(),
            call_type: Some("voice".to_string()),
        };
        let body = request.to_body();
        assert_eq!(body["query_type"], "call_analytics");
        assert_eq!(body["parameters"]["start_date"], "2024-01-01");
        assert_eq!(body["parameters"]["call_type"], "voice");
    }

    #[test]
    fn test_query_request_omits_absent_filters() {
        let request = QueryRequest::CustomerInsights {
            segment: None,
            plan_type: Some("prepaid".to_string()),
        };
        let body = request.to_body();
        assert!(body["parameters"].get("segment").is_none());
        assert_eq!(body["parameters"]["plan_type"], "prepaid");
    }

    #[test]
    fn test_index_target_wire_names() {
        assert_eq!(IndexTarget::Cassandra.as_str(), "cassandra");
        assert_eq!(IndexTarget::Mongodb.as_str(), "mongodb");
        assert_eq!(IndexTarget::Both.as_str(), "both");
    }

    #[test]
    fn test_backend_status_parses_lowercase() {
        let response: MessageResponse =
            serde_json::from_str(r#"{"status":"success","message":"ok"}"#).unwrap();
        assert!(response.status.is_success());

        let response: MessageResponse =
            serde_json::from_str(r#"{"status":"error","message":"boom"}"#).unwrap();
        assert!(!response.status.is_success());
    }

    #[test]
    fn test_data_summary_deserialize() {
        let raw = r#"{
            "status": "success",
            "summary": {
                "directory": "telco_data_export",
                "files_found": 2,
                "total_files": 7,
                "file_sizes": {"customers.json": 1536},
                "estimated_records": {"customers.json": 1200}
            }
        }"#;
        let response: VerifyDataResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.summary.files_found, 2);
        assert_eq!(response.summary.file_sizes["customers.json"], 1536);
    }

    #[test]
    fn test_performance_results_deserialize() {
        let raw = r#"{
            "status": "success",
            "results": {
                "individual_queries": {
                    "query1_call_analytics": {
                        "without_index": 1.2345,
                        "with_index": 0.4321,
                        "improvement_percent": 65.0,
                        "records_processed": 1000
                    }
                },
                "summary": {
                    "average_improvement": 65.0,
                    "total_time_without_indexes": 1.2345,
                    "total_time_with_indexes": 0.4321,
                    "total_time_saved": 0.8024,
                    "best_improvement": 65.0,
                    "worst_improvement": 65.0,
                    "queries_tested": 1
                },
                "recommendations": ["Keep indexes on call_records"]
            }
        }"#;
        let response: PerformanceResponse = serde_json::from_str(raw).unwrap();
        let results = response.results.unwrap();
        assert_eq!(results.summary.queries_tested, 1);
        assert_eq!(
            results.individual_queries["query1_call_analytics"].records_processed,
            1000
        );
    }
}
