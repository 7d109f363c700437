//! Writer configuration
//!
//! Both writer configurations derive serde and can be loaded from YAML:
//!
//! ```rust
//! use pktlog::config::MetaPacketLogWriterConfig;
//! use pktlog::types::LogType;
//!
//! let config = MetaPacketLogWriterConfig::from_yaml_str(
//!     r#"
//! log_type: TLM
//! meta_target_name: META
//! meta_packet_name: DATA
//! log_meta_before_write: true
//! writer:
//!   log_name: hk
//!   log_directory: /var/log/pktlog
//!   cycle_time_secs: 3600
//! "#,
//! )?;
//! assert_eq!(config.log_type, LogType::Tlm);
//! assert_eq!(config.writer.cycle_size, Some(2_000_000_000));
//! # Ok::<(), pktlog::LogError>(())
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::types::LogType;
use crate::{LogError, Result};

/// Default size at which a log file is closed and a new one started.
pub const DEFAULT_CYCLE_SIZE: u64 = 2_000_000_000;

/// Configuration of a [`PacketLogWriter`](crate::log::PacketLogWriter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacketLogWriterConfig {
    /// Inserted into file names and stored as the file label
    pub log_name: Option<String>,
    pub log_directory: PathBuf,
    pub logging_enabled: bool,
    /// Start a new file before a record would push the file past this many bytes
    pub cycle_size: Option<u64>,
    /// Start a new file once the current one has been open this long
    pub cycle_time_secs: Option<u64>,
}

impl Default for PacketLogWriterConfig {
    fn default() -> Self {
        Self {
            log_name: None,
            log_directory: PathBuf::from("logs"),
            logging_enabled: true,
            cycle_size: Some(DEFAULT_CYCLE_SIZE),
            cycle_time_secs: None,
        }
    }
}

impl PacketLogWriterConfig {
    pub fn new(log_directory: impl Into<PathBuf>) -> Self {
        Self { log_directory: log_directory.into(), ..Self::default() }
    }

    pub fn with_log_name(mut self, log_name: impl Into<String>) -> Self {
        self.log_name = Some(log_name.into());
        self
    }

    pub fn with_logging_enabled(mut self, enabled: bool) -> Self {
        self.logging_enabled = enabled;
        self
    }

    pub fn with_cycle_size(mut self, cycle_size: Option<u64>) -> Self {
        self.cycle_size = cycle_size;
        self
    }

    pub fn with_cycle_time(mut self, cycle_time: Option<Duration>) -> Self {
        self.cycle_time_secs = cycle_time.map(|t| t.as_secs());
        self
    }

    pub fn cycle_time(&self) -> Option<Duration> {
        self.cycle_time_secs.map(Duration::from_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cycle_size == Some(0) {
            return Err(LogError::Config {
                reason: "cycle_size must be greater than zero".to_string(),
                source: None,
            });
        }
        if self.cycle_time_secs == Some(0) {
            return Err(LogError::Config {
                reason: "cycle_time_secs must be greater than zero".to_string(),
                source: None,
            });
        }
        if let Some(name) = self.log_name.as_ref().filter(|n| n.is_empty() || n.contains(['/', '\\'])) {
            return Err(LogError::Config {
                reason: format!("log_name {:?} cannot be used in a file name", name),
                source: None,
            });
        }
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = parse_yaml(yaml, "packet log writer")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_yaml_str(&read_config(path.as_ref())?)
    }
}

/// Configuration of a [`MetaPacketLogWriter`](crate::log::MetaPacketLogWriter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaPacketLogWriterConfig {
    pub log_type: LogType,
    pub meta_target_name: String,
    pub meta_packet_name: String,
    /// Seed file applied to the metadata packet at construction
    #[serde(default)]
    pub init_data_file_path: Option<PathBuf>,
    /// Write the metadata packet before every other packet
    #[serde(default)]
    pub log_meta_before_write: bool,
    /// Write the metadata packet at the start of every new file
    #[serde(default = "default_true")]
    pub log_meta_on_new_file: bool,
    #[serde(default)]
    pub writer: PacketLogWriterConfig,
}

fn default_true() -> bool {
    true
}

impl MetaPacketLogWriterConfig {
    pub fn new(
        log_type: LogType,
        meta_target_name: impl Into<String>,
        meta_packet_name: impl Into<String>,
        writer: PacketLogWriterConfig,
    ) -> Self {
        Self {
            log_type,
            meta_target_name: meta_target_name.into(),
            meta_packet_name: meta_packet_name.into(),
            init_data_file_path: None,
            log_meta_before_write: false,
            log_meta_on_new_file: true,
            writer,
        }
    }

    pub fn with_init_data_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.init_data_file_path = Some(path.into());
        self
    }

    pub fn with_log_meta_before_write(mut self, enabled: bool) -> Self {
        self.log_meta_before_write = enabled;
        self
    }

    pub fn with_log_meta_on_new_file(mut self, enabled: bool) -> Self {
        self.log_meta_on_new_file = enabled;
        self
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = parse_yaml(yaml, "meta packet log writer")?;
        config.writer.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_yaml_str(&read_config(path.as_ref())?)
    }
}

fn parse_yaml<T: DeserializeOwned>(yaml: &str, what: &str) -> Result<T> {
    debug!("Parsing {} configuration ({} bytes)", what, yaml.len());
    serde_yaml_ng::from_str(yaml)
        .map_err(|e| LogError::config_with_source(format!("Invalid {} configuration", what), Box::new(e)))
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        LogError::config_with_source(format!("Cannot read {}", path.display()), Box::new(e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_defaults_fill_missing_fields() {
        let config = PacketLogWriterConfig::from_yaml_str("log_directory: /tmp/logs\n").unwrap();
        assert_eq!(config.log_directory, PathBuf::from("/tmp/logs"));
        assert!(config.logging_enabled);
        assert_eq!(config.cycle_size, Some(DEFAULT_CYCLE_SIZE));
        assert_eq!(config.cycle_time(), None);
    }

    #[test]
    fn meta_config_defaults() {
        let config = MetaPacketLogWriterConfig::from_yaml_str(
            "log_type: CMD\nmeta_target_name: META\nmeta_packet_name: DATA\n",
        )
        .unwrap();
        assert_eq!(config.log_type, LogType::Cmd);
        assert!(!config.log_meta_before_write);
        assert!(config.log_meta_on_new_file);
        assert_eq!(config.init_data_file_path, None);
        assert_eq!(config.writer, PacketLogWriterConfig::default());
    }

    #[test]
    fn invalid_yaml_is_a_config_error() {
        let result = MetaPacketLogWriterConfig::from_yaml_str("log_type: BOTH\n");
        match result.unwrap_err() {
            LogError::Config { source, .. } => assert!(source.is_some()),
            other => panic!("Expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn zero_limits_are_rejected() {
        assert!(PacketLogWriterConfig::from_yaml_str("cycle_size: 0\n").is_err());
        assert!(PacketLogWriterConfig::from_yaml_str("cycle_time_secs: 0\n").is_err());
        assert!(PacketLogWriterConfig::from_yaml_str("cycle_size: null\n").is_ok());
        assert!(PacketLogWriterConfig::new("x").with_log_name("a/b").validate().is_err());
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let result = PacketLogWriterConfig::from_yaml_file("/nonexistent/pktlog.yaml");
        assert!(matches!(result, Err(LogError::Config { .. })));
    }
}
