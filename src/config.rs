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

//! Application configuration management.
//!
//! This module handles persistent configuration storage using TOML format.
//! It covers backend endpoints and UI preferences, with per-field serde
//! defaults so partial configs load cleanly.

use serde::{Deserialize, Serialize};

/// Default address for the platform realtime feed
pub const DEFAULT_FEED_ADDRESS: &str = "localhost:9009";

/// Default base URL for the platform HTTP API
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    /// Configuration schema version for migrations
    #[serde(default = "default_config_version")]
    pub config_version: u32,

    /// Realtime feed address in host:port format
    #[serde(default = "default_feed_address")]
    pub feed_address: String,

    /// Backend API base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Export directory offered when loading existing data
    #[serde(default = "default_data_directory")]
    pub data_directory: String,

    /// Status pane visible on startup
    #[serde(default = "default_true")]
    pub status_pane_visible: bool,

    /// Row limit offered for combined behavior queries
    #[serde(default = "default_query_limit")]
    pub default_query_limit: u32,

    /// Days covered by the default analytics date range
    #[serde(default = "default_range_days")]
    pub default_range_days: i64,
}

// Default value functions for serde
fn default_config_version() -> u32 {
    1
}

fn default_feed_address() -> String {
    DEFAULT_FEED_ADDRESS.to_string()
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_data_directory() -> String {
    "telco_data_export".to_string()
}

fn default_true() -> bool {
    true
}

fn default_query_limit() -> u32 {
    50
}

fn default_range_days() -> i64 {
    7
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            feed_address: default_feed_address(),
            api_base_url: default_api_base_url(),
            data_directory: default_data_directory(),
            status_pane_visible: true,
            default_query_limit: default_query_limit(),
            default_range_days: default_range_days(),
        }
    }
}

impl AppConfig {
    /// Load configuration from disk
    pub fn load() -> Result<Self, confy::ConfyError> {
        confy::load("telcodash-desktop", "config")
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store("telcodash-desktop", "config", self)
    }

    /// Get the config file path for display to user
    #[allow(dead_code)]
    pub fn get_config_path() -> Result<std::path::PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path("telcodash-desktop", "config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.feed_address, "localhost:9009");
        assert_eq!(config.api_base_url, "http://localhost:5000");
        assert_eq!(config.default_range_days, 7);
        assert!(config.status_pane_visible);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: AppConfig = toml::from_str("feed_address = \"feed.example:9009\"").unwrap();
        assert_eq!(config.feed_address, "feed.example:9009");
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.default_query_limit, 50);
    }
}
