/*
 *  Copyright 2025 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Configuration
//!
//! All options are plain serde-deserializable structs with defaults, so a
//! host can embed them in its own config tree, load them from TOML, or
//! construct them directly in code.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level configuration for the telemetry layer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SignalboxConfig {
    /// Durable storage options.
    pub storage: StorageConfig,
    /// Job-lifecycle recorder options.
    pub jobs: JobsConfig,
    /// Exceptions recorder options.
    pub exceptions: ExceptionsConfig,
}

impl SignalboxConfig {
    /// Parses a TOML document into a config, filling defaults for any
    /// omitted sections.
    pub fn from_toml(document: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(document)
    }

    /// Loads defaults with environment overrides applied.
    ///
    /// Reads `.env` if present and honors `SIGNALBOX_DATABASE_URL`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();
        if let Ok(url) = std::env::var("SIGNALBOX_DATABASE_URL") {
            config.storage.url = url;
        }
        config
    }
}

/// Durable storage options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database path, `sqlite://` URL, or `:memory:`.
    pub url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            url: "signalbox.sqlite".to_string(),
        }
    }
}

/// Job-lifecycle recorder options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JobsConfig {
    /// Destination table for job attempt rows.
    pub table: String,
    /// Minimum elapsed milliseconds below which an attempt's duration is
    /// not persisted. Zero disables the floor.
    pub threshold_ms: u64,
    /// Regex patterns matched against a job's display name. A match
    /// suppresses every signal for that job's entire life.
    pub ignore: Vec<String>,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            table: "signalbox_jobs".to_string(),
            threshold_ms: 1000,
            ignore: Vec::new(),
        }
    }
}

/// Exceptions recorder options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExceptionsConfig {
    /// Destination table for exception records.
    pub table: String,
    /// The host application's root path; stripped from reported locations.
    pub base_path: PathBuf,
    /// Directory under `base_path` holding third-party code. Frames inside
    /// it are skipped when locating the application-side origin of a fault.
    pub vendor_dir: String,
}

impl Default for ExceptionsConfig {
    fn default() -> Self {
        Self {
            table: "signalbox_exceptions".to_string(),
            base_path: PathBuf::new(),
            vendor_dir: "vendor".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SignalboxConfig::default();

        assert_eq!(config.storage.url, "signalbox.sqlite");
        assert_eq!(config.jobs.table, "signalbox_jobs");
        assert_eq!(config.jobs.threshold_ms, 1000);
        assert!(config.jobs.ignore.is_empty());
        assert_eq!(config.exceptions.table, "signalbox_exceptions");
        assert_eq!(config.exceptions.vendor_dir, "vendor");
    }

    #[test]
    fn test_from_toml_with_partial_document() {
        let config = SignalboxConfig::from_toml(
            r#"
            [jobs]
            threshold_ms = 0
            ignore = ["^Internal"]

            [exceptions]
            base_path = "/srv/app"
            "#,
        )
        .unwrap();

        assert_eq!(config.jobs.threshold_ms, 0);
        assert_eq!(config.jobs.ignore, vec!["^Internal".to_string()]);
        assert_eq!(config.exceptions.base_path, PathBuf::from("/srv/app"));
        // Omitted sections keep their defaults.
        assert_eq!(config.storage.url, "signalbox.sqlite");
    }

    #[test]
    fn test_from_toml_rejects_malformed_documents() {
        assert!(SignalboxConfig::from_toml("jobs = 3").is_err());
    }
}
