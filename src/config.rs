//! # Loader Configuration
//!
//! Configuration management for the relationship-loader library and CLI.
//! Supports config files, environment variables, and command-line overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{LoaderError, LoaderResult};

/// Loader configuration for store connections and ingestion behavior
///
/// # Examples
///
/// ```rust
/// use relationship_loader::config::LoaderConfig;
///
/// // Default configuration
/// let config = LoaderConfig::default();
/// assert_eq!(config.store.endpoint, "http://localhost:50051");
/// assert_eq!(config.ingest.batch_size, 1000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Relationship store connection settings
    pub store: StoreConfig,
    /// Ingestion pipeline settings
    pub ingest: IngestConfig,
    /// Edge schema applied to every record
    pub schema: SchemaConfig,
}

/// Connection settings for the relationship store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store gRPC endpoint (e.g., "http://localhost:50051")
    pub endpoint: String,
    /// Bearer credential presented on every request (if required)
    pub token: Option<String>,
    /// Transport security mode
    pub security: TransportSecurity,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// Connection timeout in milliseconds
    pub connect_timeout_ms: u64,
}

/// Transport security mode for the store channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportSecurity {
    /// Plaintext HTTP/2
    Plaintext,
    /// TLS with native roots
    Tls,
}

/// Ingestion pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Input edge-list file path
    pub input: Option<PathBuf>,
    /// Records per write batch
    pub batch_size: usize,
    /// Maximum concurrent write requests; absent means unbounded fan-out
    pub max_in_flight: Option<usize>,
    /// What to do with a malformed input line
    pub on_malformed: MalformedPolicy,
    /// What to do when a batch write fails
    pub on_write_error: WriteErrorPolicy,
}

/// Policy for malformed input lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MalformedPolicy {
    /// Stop reading and fail the run; records decoded before the bad line
    /// are still written
    Abort,
    /// Warn, count the line, and keep reading
    Skip,
}

/// Policy for failed batch writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriteErrorPolicy {
    /// Stop dispatching new batches after the first failure; in-flight
    /// writers run to completion
    FailFast,
    /// Attempt every batch and report failures at the end
    Continue,
}

/// Edge schema applied to every record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Object type assigned to both endpoints of an edge
    pub object_type: String,
    /// Relation label assigned to every edge
    pub relation: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:50051".to_string(),
            token: None,
            security: TransportSecurity::Plaintext,
            timeout_ms: 30_000,
            connect_timeout_ms: 10_000,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            input: None,
            batch_size: 1000,
            max_in_flight: Some(32),
            on_malformed: MalformedPolicy::Abort,
            on_write_error: WriteErrorPolicy::FailFast,
        }
    }
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            object_type: "node".to_string(),
            relation: "edge".to_string(),
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            ingest: IngestConfig::default(),
            schema: SchemaConfig::default(),
        }
    }
}

impl LoaderConfig {
    /// Load configuration from environment variables and config file
    ///
    /// Precedence (highest to lowest):
    /// 1. Environment variables
    /// 2. Config file (see [`LoaderConfig::find_config_file`] locations)
    /// 3. Default values
    pub fn load() -> LoaderResult<Self> {
        let mut config = Self::default();

        if let Some(config_path) = Self::find_config_file() {
            debug!("Loading config from: {}", config_path.display());
            match Self::load_from_file(&config_path) {
                Ok(file_config) => config = file_config,
                Err(e) => {
                    debug!("Failed to load config file: {}", e);
                    // Continue with defaults if config file fails
                }
            }
        }

        config.apply_env_overrides();

        debug!("Loaded loader configuration: {:?}", config);
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> LoaderResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LoaderError::config_error(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            LoaderError::config_error(format!("Failed to parse config file: {}", e))
        })?;

        Ok(config)
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let possible_paths = [
            // Current directory
            Path::new("./relationship-loader.toml"),
            Path::new("./config/relationship-loader.toml"),
            // User home directory
            &dirs::home_dir()?.join(".relationship-loader").join("config.toml"),
            &dirs::config_dir()?.join("relationship-loader").join("config.toml"),
        ];

        for path in &possible_paths {
            if path.exists() && path.is_file() {
                return Some(path.to_path_buf());
            }
        }

        None
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(endpoint) = std::env::var("RELOADER_ENDPOINT") {
            self.store.endpoint = endpoint;
        }
        if let Ok(token) = std::env::var("RELOADER_TOKEN") {
            self.store.token = Some(token);
        }
        if let Ok(security) = std::env::var("RELOADER_SECURITY") {
            match security.as_str() {
                "tls" => self.store.security = TransportSecurity::Tls,
                "plaintext" => self.store.security = TransportSecurity::Plaintext,
                other => debug!("Ignoring unknown RELOADER_SECURITY value: {}", other),
            }
        }
        if let Ok(timeout) = std::env::var("RELOADER_TIMEOUT_MS") {
            if let Ok(timeout_ms) = timeout.parse() {
                self.store.timeout_ms = timeout_ms;
            }
        }

        if let Ok(input) = std::env::var("RELOADER_INPUT") {
            self.ingest.input = Some(PathBuf::from(input));
        }
        if let Ok(batch_size) = std::env::var("RELOADER_BATCH_SIZE") {
            if let Ok(batch_size) = batch_size.parse() {
                self.ingest.batch_size = batch_size;
            }
        }
        if let Ok(max_in_flight) = std::env::var("RELOADER_MAX_IN_FLIGHT") {
            if let Ok(max_in_flight) = max_in_flight.parse() {
                self.ingest.max_in_flight = Some(max_in_flight);
            }
        }

        if let Ok(object_type) = std::env::var("RELOADER_OBJECT_TYPE") {
            self.schema.object_type = object_type;
        }
        if let Ok(relation) = std::env::var("RELOADER_RELATION") {
            self.schema.relation = relation;
        }
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: &Path) -> LoaderResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                LoaderError::config_error(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| LoaderError::config_error(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            LoaderError::config_error(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    /// Validate the configuration before a run
    pub fn validate(&self) -> LoaderResult<()> {
        if self.store.endpoint.is_empty() {
            return Err(LoaderError::config_error("store endpoint must not be empty"));
        }
        if self.ingest.batch_size == 0 {
            return Err(LoaderError::config_error("batch_size must be at least 1"));
        }
        if self.ingest.max_in_flight == Some(0) {
            return Err(LoaderError::config_error(
                "max_in_flight must be at least 1 when set",
            ));
        }
        if self.schema.object_type.is_empty() {
            return Err(LoaderError::config_error("object_type must not be empty"));
        }
        if self.schema.relation.is_empty() {
            return Err(LoaderError::config_error("relation must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = LoaderConfig::default();
        assert_eq!(config.store.endpoint, "http://localhost:50051");
        assert_eq!(config.store.security, TransportSecurity::Plaintext);
        assert_eq!(config.ingest.batch_size, 1000);
        assert_eq!(config.ingest.max_in_flight, Some(32));
        assert_eq!(config.ingest.on_malformed, MalformedPolicy::Abort);
        assert_eq!(config.ingest.on_write_error, WriteErrorPolicy::FailFast);
        assert_eq!(config.schema.object_type, "node");
        assert_eq!(config.schema.relation, "edge");
    }

    #[test]
    fn test_config_serialization() {
        let config = LoaderConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: LoaderConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.store.endpoint, deserialized.store.endpoint);
        assert_eq!(config.ingest.batch_size, deserialized.ingest.batch_size);
        assert_eq!(config.schema.relation, deserialized.schema.relation);
    }

    #[test]
    fn test_partial_config_file() {
        let parsed: LoaderConfig = toml::from_str(
            r#"
            [store]
            endpoint = "http://spicedb.internal:50051"
            security = "tls"

            [ingest]
            batch_size = 500
            on_malformed = "skip"
            "#,
        )
        .unwrap();

        assert_eq!(parsed.store.endpoint, "http://spicedb.internal:50051");
        assert_eq!(parsed.store.security, TransportSecurity::Tls);
        assert_eq!(parsed.ingest.batch_size, 500);
        assert_eq!(parsed.ingest.on_malformed, MalformedPolicy::Skip);
        // Unspecified sections fall back to defaults
        assert_eq!(parsed.ingest.on_write_error, WriteErrorPolicy::FailFast);
        assert_eq!(parsed.schema.object_type, "node");
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("loader.toml");

        let mut config = LoaderConfig::default();
        config.store.endpoint = "http://store.example.com:50051".to_string();
        config.ingest.batch_size = 250;

        config.save_to_file(&config_path).unwrap();
        let loaded = LoaderConfig::load_from_file(&config_path).unwrap();

        assert_eq!(loaded.store.endpoint, "http://store.example.com:50051");
        assert_eq!(loaded.ingest.batch_size, 250);
    }

    #[test]
    fn test_env_overrides() {
        std::env::set_var("RELOADER_ENDPOINT", "http://override:50051");
        std::env::set_var("RELOADER_BATCH_SIZE", "77");

        let mut config = LoaderConfig::default();
        config.apply_env_overrides();

        assert_eq!(config.store.endpoint, "http://override:50051");
        assert_eq!(config.ingest.batch_size, 77);

        std::env::remove_var("RELOADER_ENDPOINT");
        std::env::remove_var("RELOADER_BATCH_SIZE");
    }

    #[test]
    fn test_validate_rejects_zero_batch_size() {
        let mut config = LoaderConfig::default();
        config.ingest.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_in_flight_bound() {
        let mut config = LoaderConfig::default();
        config.ingest.max_in_flight = Some(0);
        assert!(config.validate().is_err());
    }
}
