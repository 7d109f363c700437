//! Packet log writer
//!
//! Appends packets to timestamped binary log files, one writer per file.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pktlog::config::PacketLogWriterConfig;
//! use pktlog::definition::DefinitionRegistry;
//! use pktlog::log::PacketLogWriter;
//! use pktlog::types::LogType;
//! use pktlog::Packet;
//!
//! fn log_one(registry: Arc<DefinitionRegistry>) -> pktlog::Result<()> {
//!     let config = PacketLogWriterConfig::new("/var/log/pktlog").with_log_name("hk");
//!     let mut writer = PacketLogWriter::new(LogType::Tlm, config, Arc::clone(&registry))?;
//!
//!     let packet = Packet::new(registry.packet(LogType::Tlm, "INST", "ADCS")?);
//!     writer.write(&packet)?;
//!     writer.stop()
//! }
//! ```

use chrono::Utc;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, trace, warn};

use super::format::{LogFileHeader, LogRecord};
use crate::config::PacketLogWriterConfig;
use crate::definition::DefinitionRegistry;
use crate::packet::Packet;
use crate::types::LogType;
use crate::{LogError, Result};

const FILE_EXTENSION: &str = "bin";

struct OpenLog {
    path: PathBuf,
    file: BufWriter<File>,
    size: u64,
    records: u64,
    opened_at: Instant,
}

/// Writes packets of one log category to binary log files.
///
/// Files are opened lazily on the first write and rotated when the configured size or
/// age limit is reached. [`stop`](Self::stop) flushes and syncs the open file.
pub struct PacketLogWriter {
    log_type: LogType,
    config: PacketLogWriterConfig,
    registry: Arc<DefinitionRegistry>,
    logging_enabled: bool,
    current: Option<OpenLog>,
    last_filename: Option<PathBuf>,
}

impl PacketLogWriter {
    /// Create a writer. No file is created until the first write.
    pub fn new(
        log_type: LogType,
        config: PacketLogWriterConfig,
        registry: Arc<DefinitionRegistry>,
    ) -> Result<Self> {
        config.validate()?;
        debug!(
            "Created {} log writer for {} (log name {:?})",
            log_type,
            config.log_directory.display(),
            config.log_name
        );
        Ok(Self {
            log_type,
            logging_enabled: config.logging_enabled,
            config,
            registry,
            current: None,
            last_filename: None,
        })
    }

    /// Append a packet to the log.
    ///
    /// The packet's identity must be registered in this writer's namespace. Nothing is
    /// written while logging is disabled.
    pub fn write(&mut self, packet: &Packet) -> Result<()> {
        if !self.logging_enabled {
            trace!("Logging disabled, dropping {}", packet.definition().display_name());
            return Ok(());
        }

        let record = self.encode(packet)?;
        if self.current.is_some() && self.rotation_pending(record.len() as u64) {
            self.start_new_file()?;
        }
        self.append(packet, &record)
    }

    /// Append a packet without checking the rotation limits.
    ///
    /// Opens a file when none is open. Callers that keep several records together in one
    /// file decide rotation for the whole group first.
    pub(crate) fn write_in_current_file(&mut self, packet: &Packet) -> Result<()> {
        if !self.logging_enabled {
            trace!("Logging disabled, dropping {}", packet.definition().display_name());
            return Ok(());
        }
        let record = self.encode(packet)?;
        self.append(packet, &record)
    }

    /// On-disk size of the record `packet` would produce. Fails for unregistered packets.
    pub(crate) fn record_len(&self, packet: &Packet) -> Result<u64> {
        self.registry.packet(self.log_type, packet.target_name(), packet.packet_name())?;
        Ok(LogRecord::from_packet(packet, self.log_type)?.encoded_len() as u64)
    }

    fn encode(&self, packet: &Packet) -> Result<Vec<u8>> {
        self.registry.packet(self.log_type, packet.target_name(), packet.packet_name())?;
        LogRecord::from_packet(packet, self.log_type)?.encode()
    }

    fn append(&mut self, packet: &Packet, record: &[u8]) -> Result<()> {
        let log = match self.current.take() {
            Some(log) => log,
            None => Self::open_file(&self.config, self.log_type)?,
        };
        let log = self.current.insert(log);

        log.file.write_all(record).map_err(|e| LogError::file_error(&log.path, e))?;
        log.size += record.len() as u64;
        log.records += 1;
        trace!(
            "Wrote {} ({} bytes) to {}",
            packet.definition().display_name(),
            record.len(),
            log.path.display()
        );
        Ok(())
    }

    /// Whether writing a record of `next_len` bytes would begin a new file.
    pub fn rotation_pending(&self, next_len: u64) -> bool {
        if !self.logging_enabled {
            return false;
        }
        let Some(log) = &self.current else {
            return true;
        };
        if log.records == 0 {
            return false;
        }
        if let Some(limit) = self.config.cycle_size.filter(|limit| log.size + next_len > *limit) {
            debug!("{} reached cycle size {} bytes", log.path.display(), limit);
            return true;
        }
        if let Some(limit) = self.config.cycle_time().filter(|limit| log.opened_at.elapsed() >= *limit) {
            debug!("{} reached cycle time {:?}", log.path.display(), limit);
            return true;
        }
        false
    }

    /// Whether writing `packet` would begin a new file.
    pub fn rotation_pending_for(&self, packet: &Packet) -> Result<bool> {
        if !self.logging_enabled {
            return Ok(false);
        }
        let record = LogRecord::from_packet(packet, self.log_type)?;
        Ok(self.rotation_pending(record.encoded_len() as u64))
    }

    /// Close the current file. The next write opens a new one.
    pub fn start_new_file(&mut self) -> Result<()> {
        self.close_file()
    }

    /// Flush, sync and close the current file. Calling it again does nothing.
    pub fn stop(&mut self) -> Result<()> {
        self.close_file()
    }

    /// Path of the open file, or of the last file closed.
    pub fn filename(&self) -> Option<&Path> {
        match &self.current {
            Some(log) => Some(&log.path),
            None => self.last_filename.as_deref(),
        }
    }

    /// Bytes written to the open file, header included.
    pub fn file_size(&self) -> u64 {
        self.current.as_ref().map(|log| log.size).unwrap_or(0)
    }

    pub fn log_type(&self) -> LogType {
        self.log_type
    }

    pub fn logging_enabled(&self) -> bool {
        self.logging_enabled
    }

    pub fn enable_logging(&mut self) {
        self.logging_enabled = true;
    }

    /// Stop accepting packets and close the open file.
    pub fn disable_logging(&mut self) -> Result<()> {
        self.logging_enabled = false;
        self.close_file()
    }

    fn open_file(config: &PacketLogWriterConfig, log_type: LogType) -> Result<OpenLog> {
        fs::create_dir_all(&config.log_directory)
            .map_err(|e| LogError::file_error(&config.log_directory, e))?;

        let timestamp = Utc::now().format("%Y_%m_%d_%H_%M_%S").to_string();
        let mut sequence = 0u32;
        let (path, file) = loop {
            let path = config.log_directory.join(file_name(
                &timestamp,
                sequence,
                config.log_name.as_deref(),
                log_type,
            ));
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => break (path, file),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => sequence += 1,
                Err(e) => return Err(LogError::file_error(path, e)),
            }
        };

        let header = LogFileHeader::new(log_type, config.log_name.clone().unwrap_or_default());
        let mut file = BufWriter::new(file);
        header.write_to(&mut file).map_err(|e| LogError::file_error(&path, e))?;

        info!("Opened {} log {}", log_type, path.display());
        Ok(OpenLog {
            path,
            file,
            size: header.encoded_len() as u64,
            records: 0,
            opened_at: Instant::now(),
        })
    }

    fn close_file(&mut self) -> Result<()> {
        let Some(mut log) = self.current.take() else {
            return Ok(());
        };
        let result = log
            .file
            .flush()
            .and_then(|_| log.file.get_ref().sync_all())
            .map_err(|e| LogError::file_error(&log.path, e));
        info!(
            "Closed {} log {} ({} records, {} bytes)",
            self.log_type,
            log.path.display(),
            log.records,
            log.size
        );
        self.last_filename = Some(log.path);
        result
    }
}

impl Drop for PacketLogWriter {
    fn drop(&mut self) {
        if let Err(e) = self.close_file() {
            warn!("Failed to close packet log on drop: {}", e);
        }
    }
}

// The fixed-width sequence keeps names created within one second sorted by creation.
fn file_name(timestamp: &str, sequence: u32, log_name: Option<&str>, log_type: LogType) -> String {
    let mut name = format!("{}_{:03}", timestamp, sequence);
    if let Some(log_name) = log_name {
        name.push('_');
        name.push_str(log_name);
    }
    format!("{}_{}.{}", name, log_type.suffix(), FILE_EXTENSION)
}
