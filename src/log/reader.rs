//! Packet log reader
//!
//! Reads a packet log back as a lazy sequence of decoded packets.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pktlog::definition::DefinitionRegistry;
//! use pktlog::log::{DecodePolicy, PacketLogReader};
//!
//! fn dump(registry: Arc<DefinitionRegistry>) -> pktlog::Result<()> {
//!     let reader = PacketLogReader::new(registry).with_policy(DecodePolicy::Skip);
//!     for packet in reader.each("2026_10_17_12_00_00_000_tlm.bin")? {
//!         let packet = packet?;
//!         println!("{} {}", packet.target_name(), packet.packet_name());
//!         for (item, value) in packet.values() {
//!             println!("  {} = {}", item, value);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Records are read one at a time through a buffered reader, so memory use does not grow
//! with the file size.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace, warn};

use super::format::{LogFileHeader, LogRecord, RecordRead};
use crate::definition::DefinitionRegistry;
use crate::packet::Packet;
use crate::types::LogType;
use crate::{LogError, Result};

/// What to do with a record that cannot be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodePolicy {
    /// Yield the error and end the stream
    #[default]
    Abort,
    /// Log a warning and continue with the next record
    Skip,
}

/// Reads packet logs using a shared definition registry.
#[derive(Debug, Clone)]
pub struct PacketLogReader {
    registry: Arc<DefinitionRegistry>,
    policy: DecodePolicy,
}

impl PacketLogReader {
    pub fn new(registry: Arc<DefinitionRegistry>) -> Self {
        Self { registry, policy: DecodePolicy::default() }
    }

    pub fn with_policy(mut self, policy: DecodePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> DecodePolicy {
        self.policy
    }

    /// Open a log and iterate over its packets in file order.
    ///
    /// Fails immediately if the file cannot be opened or its header is invalid.
    pub fn each<P: AsRef<Path>>(&self, path: P) -> Result<PacketIter> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| LogError::file_error(&path, e))?;
        let mut reader = BufReader::new(file);

        let header = LogFileHeader::parse_from_reader(&mut reader)?;
        header.validate()?;
        debug!("Reading {} log {} (label {:?})", header.log_type, path.display(), header.label);

        Ok(PacketIter {
            reader,
            path,
            header,
            registry: Arc::clone(&self.registry),
            policy: self.policy,
            records_read: 0,
            finished: false,
        })
    }

    /// Read every packet of a log into memory.
    pub fn read_all<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Packet>> {
        self.each(path)?.collect()
    }
}

/// Forward-only iterator over the packets of one log file.
pub struct PacketIter {
    reader: BufReader<File>,
    path: PathBuf,
    header: LogFileHeader,
    registry: Arc<DefinitionRegistry>,
    policy: DecodePolicy,
    records_read: u64,
    finished: bool,
}

impl PacketIter {
    pub fn log_type(&self) -> LogType {
        self.header.log_type
    }

    /// Log name the writer stored in the file header.
    pub fn label(&self) -> &str {
        &self.header.label
    }

    /// Records consumed so far, including skipped ones.
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn decode(&self, record: LogRecord) -> Result<Packet> {
        let definition = match &record.identity {
            Some((target_name, packet_name)) => {
                self.registry.packet(self.header.log_type, target_name, packet_name)?
            }
            None => self.registry.identify(self.header.log_type, &record.payload).ok_or_else(|| {
                LogError::unknown_packet(
                    "UNIDENTIFIED",
                    format!("{}-byte record {}", record.payload.len(), self.records_read),
                )
            })?,
        };
        let mut packet = Packet::from_bytes(definition, &record.payload)?;
        packet.set_received_time(Some(record.time));
        Ok(packet)
    }
}

impl Iterator for PacketIter {
    type Item = Result<Packet>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            let decoded = match LogRecord::read_from(&mut self.reader, self.header.log_type) {
                Ok(RecordRead::Record(record)) => Ok(record),
                Ok(RecordRead::Malformed(e)) => Err(e),
                Ok(RecordRead::EndOfStream) => {
                    debug!("Finished {} after {} records", self.path.display(), self.records_read);
                    self.finished = true;
                    return None;
                }
                Ok(RecordRead::Truncated { expected, found }) => {
                    warn!(
                        "Truncated record at end of {} ({} of {} bytes), ignoring it",
                        self.path.display(),
                        found,
                        expected
                    );
                    self.finished = true;
                    return None;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            };

            self.records_read += 1;
            match decoded.and_then(|record| self.decode(record)) {
                Ok(packet) => {
                    trace!("Read {} from {}", packet.definition().display_name(), self.path.display());
                    return Some(Ok(packet));
                }
                Err(e) if self.policy == DecodePolicy::Skip => {
                    warn!("Skipping record {} of {}: {}", self.records_read, self.path.display(), e);
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}

impl std::iter::FusedIterator for PacketIter {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PacketLogWriterConfig;
    use crate::log::PacketLogWriter;
    use crate::test_utils::{command_packet, sample_registry, telemetry_packet};
    use std::io::Write;

    #[test]
    fn reads_back_telemetry_with_label() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(sample_registry());
        let mut writer = PacketLogWriter::new(
            LogType::Tlm,
            PacketLogWriterConfig::new(dir.path()).with_log_name("hk"),
            Arc::clone(&registry),
        )
        .unwrap();
        let mut adcs = telemetry_packet(&registry, "INST", "ADCS");
        adcs.write("Q1", 0.5f64).unwrap();
        writer.write(&adcs).unwrap();
        writer.stop().unwrap();

        let path = writer.filename().unwrap().to_path_buf();
        let mut packets = PacketLogReader::new(registry).each(&path).unwrap();
        assert_eq!(packets.log_type(), LogType::Tlm);
        assert_eq!(packets.label(), "hk");

        let packet = packets.next().unwrap().unwrap();
        assert!(packet.matches("INST", "ADCS"));
        assert_eq!(packet.read_as::<f64>("Q1").unwrap(), 0.5);
        assert!(packet.received_time().is_some());
        assert!(packets.next().is_none());
        assert_eq!(packets.records_read(), 1);
    }

    #[test]
    fn identifies_commands_by_id_items() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(sample_registry());
        let mut writer =
            PacketLogWriter::new(LogType::Cmd, PacketLogWriterConfig::new(dir.path()), Arc::clone(&registry))
                .unwrap();
        writer.write(&command_packet(&registry, "INST", "ABORT")).unwrap();
        writer.write(&command_packet(&registry, "INST", "CLEAR")).unwrap();
        writer.stop().unwrap();

        let names: Vec<String> = PacketLogReader::new(registry)
            .read_all(writer.filename().unwrap())
            .unwrap()
            .iter()
            .map(|p| p.packet_name().to_string())
            .collect();
        assert_eq!(names, vec!["ABORT", "CLEAR"]);
    }

    #[test]
    fn truncated_tail_ends_stream() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(sample_registry());
        let mut writer =
            PacketLogWriter::new(LogType::Tlm, PacketLogWriterConfig::new(dir.path()), Arc::clone(&registry))
                .unwrap();
        writer.write(&telemetry_packet(&registry, "INST", "ADCS")).unwrap();
        writer.stop().unwrap();

        let path = writer.filename().unwrap().to_path_buf();
        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&[0, 0, 0, 40, 1, 2, 3]).unwrap();
        drop(file);

        let packets = PacketLogReader::new(registry).read_all(&path).unwrap();
        assert_eq!(packets.len(), 1);
    }

    #[test]
    fn not_a_log_fails_up_front() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.bin");
        std::fs::write(&path, b"definitely not a packet log").unwrap();
        let result = PacketLogReader::new(Arc::new(sample_registry())).each(&path);
        assert!(matches!(result, Err(LogError::Parse { .. })));
    }
}
