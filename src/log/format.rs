//! Packet log file format
//!
//! A packet log is a file header followed by a sequence of records:
//!
//! 1. **File header** - magic `PKTLOG`, format version (u16), log type (u8), one reserved
//!    byte, label length (u16) and the UTF-8 label
//! 2. **Records** - each prefixed with a u32 length covering the rest of the record:
//!    - received time as u64 nanoseconds since the Unix epoch
//!    - telemetry logs only: target name and packet name, each a u8 length plus bytes
//!    - the encoded packet buffer
//!
//! All integers are big-endian. Command records carry no names; readers identify them
//! from their identity items.

use std::io::{self, Read, Write};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, trace};

use crate::packet::Packet;
use crate::types::LogType;
use crate::{LogError, Result};

/// Magic bytes at the start of every packet log.
pub const FILE_MAGIC: &[u8; 6] = b"PKTLOG";
/// Current format version.
pub const FORMAT_VERSION: u16 = 1;

const FIXED_HEADER_SIZE: usize = 12;
const LENGTH_PREFIX_SIZE: usize = 4;
const TIMESTAMP_SIZE: usize = 8;
const MAX_NAME_LENGTH: usize = u8::MAX as usize;
const INITIAL_BODY_CAPACITY: usize = 64 * 1024;

/// Header at the start of a packet log file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFileHeader {
    pub version: u16,
    pub log_type: LogType,
    /// Log name given to the writer, empty when unnamed
    pub label: String,
}

impl LogFileHeader {
    pub fn new(log_type: LogType, label: impl Into<String>) -> Self {
        Self { version: FORMAT_VERSION, log_type, label: label.into() }
    }

    /// Number of bytes `write_to` produces.
    pub fn encoded_len(&self) -> usize {
        FIXED_HEADER_SIZE + self.label.len()
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let label_len = u16::try_from(self.label.len()).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "log label longer than 65535 bytes")
        })?;
        let mut header = Vec::with_capacity(self.encoded_len());
        header.extend_from_slice(FILE_MAGIC);
        header.extend_from_slice(&self.version.to_be_bytes());
        header.push(self.log_type.to_byte());
        header.push(0);
        header.extend_from_slice(&label_len.to_be_bytes());
        header.extend_from_slice(self.label.as_bytes());
        writer.write_all(&header)
    }

    pub fn parse_from_reader<R: Read>(reader: &mut R) -> Result<Self> {
        trace!("Reading packet log header ({} bytes)", FIXED_HEADER_SIZE);
        let mut fixed = [0u8; FIXED_HEADER_SIZE];
        reader.read_exact(&mut fixed).map_err(|e| {
            LogError::parse(
                "Log header reading",
                format!("Failed to read {} header bytes: {}", FIXED_HEADER_SIZE, e),
            )
        })?;

        if &fixed[..6] != FILE_MAGIC {
            return Err(LogError::parse(
                "Log header validation",
                format!("Bad magic {:02X?}, not a packet log", &fixed[..6]),
            ));
        }

        let version = parse_u16_be(&fixed, 6)?;
        let log_type = LogType::from_byte(fixed[8]).ok_or_else(|| {
            LogError::parse("Log header validation", format!("Unknown log type byte {}", fixed[8]))
        })?;
        let label_len = parse_u16_be(&fixed, 10)? as usize;

        let mut label = vec![0u8; label_len];
        reader.read_exact(&mut label).map_err(|e| {
            LogError::parse(
                "Log header reading",
                format!("Failed to read {} label bytes: {}", label_len, e),
            )
        })?;
        let label = String::from_utf8(label)
            .map_err(|e| LogError::parse("Log header validation", format!("Label is not UTF-8: {}", e)))?;

        let header = Self { version, log_type, label };
        debug!(
            "Parsed packet log header: version={}, log_type={}, label={:?}",
            header.version, header.log_type, header.label
        );
        Ok(header)
    }

    pub fn validate(&self) -> Result<()> {
        if self.version != FORMAT_VERSION {
            return Err(LogError::parse(
                "Log header validation",
                format!("Unsupported format version {} (expected {})", self.version, FORMAT_VERSION),
            ));
        }
        Ok(())
    }
}

/// One record as stored in a log file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub time: SystemTime,
    /// Target and packet name, present in telemetry logs only
    pub identity: Option<(String, String)>,
    pub payload: Vec<u8>,
}

/// Outcome of reading the next record from a stream.
#[derive(Debug)]
pub enum RecordRead {
    Record(LogRecord),
    /// Clean end of stream on a record boundary
    EndOfStream,
    /// The stream ended inside a record
    Truncated { expected: usize, found: usize },
    /// A complete record whose body could not be parsed. The stream stays positioned at
    /// the next record.
    Malformed(LogError),
}

impl LogRecord {
    /// Build the record for `packet` in a log of `log_type`.
    ///
    /// Packets without a received time are stamped with the current time.
    pub fn from_packet(packet: &Packet, log_type: LogType) -> Result<Self> {
        let identity = match log_type {
            LogType::Cmd => None,
            LogType::Tlm => Some((packet.target_name().to_string(), packet.packet_name().to_string())),
        };
        Ok(Self {
            time: packet.received_time().unwrap_or_else(SystemTime::now),
            identity,
            payload: packet.to_bytes()?,
        })
    }

    /// Total on-disk size, including the length prefix.
    pub fn encoded_len(&self) -> usize {
        LENGTH_PREFIX_SIZE + self.body_len()
    }

    fn body_len(&self) -> usize {
        let names = self
            .identity
            .as_ref()
            .map(|(target, packet)| 2 + target.len() + packet.len())
            .unwrap_or(0);
        TIMESTAMP_SIZE + names + self.payload.len()
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let body_len = u32::try_from(self.body_len()).map_err(|_| {
            LogError::invalid_parameter(
                "record length",
                self.body_len().to_string(),
                "exceeds the u32 length prefix",
            )
        })?;

        let mut record = Vec::with_capacity(self.encoded_len());
        record.extend_from_slice(&body_len.to_be_bytes());
        record.extend_from_slice(&time_to_nanos(self.time).to_be_bytes());
        if let Some((target, packet)) = &self.identity {
            push_name(&mut record, target)?;
            push_name(&mut record, packet)?;
        }
        record.extend_from_slice(&self.payload);
        Ok(record)
    }

    /// Read the next record.
    ///
    /// I/O failures are errors; running out of bytes and unparseable bodies are reported
    /// through [`RecordRead`]. The body is read incrementally, so a corrupt length prefix
    /// costs no more memory than the bytes actually left in the stream.
    pub fn read_from<R: Read>(reader: &mut R, log_type: LogType) -> Result<RecordRead> {
        let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
        let found = read_fully(reader, &mut prefix)?;
        if found == 0 {
            return Ok(RecordRead::EndOfStream);
        }
        if found < LENGTH_PREFIX_SIZE {
            return Ok(RecordRead::Truncated { expected: LENGTH_PREFIX_SIZE, found });
        }

        let body_len = u32::from_be_bytes(prefix) as usize;
        let mut body = Vec::with_capacity(body_len.min(INITIAL_BODY_CAPACITY));
        let found = reader.by_ref().take(body_len as u64).read_to_end(&mut body)?;
        if found < body_len {
            return Ok(RecordRead::Truncated { expected: body_len, found });
        }

        Ok(match Self::parse_body(&body, log_type) {
            Ok(record) => RecordRead::Record(record),
            Err(e) => RecordRead::Malformed(e),
        })
    }

    fn parse_body(body: &[u8], log_type: LogType) -> Result<Self> {
        let nanos = parse_u64_be(body, 0)?;
        let mut offset = TIMESTAMP_SIZE;
        let identity = match log_type {
            LogType::Cmd => None,
            LogType::Tlm => {
                let target = parse_name(body, &mut offset)?;
                let packet = parse_name(body, &mut offset)?;
                Some((target, packet))
            }
        };
        Ok(Self { time: nanos_to_time(nanos), identity, payload: body[offset..].to_vec() })
    }
}

/// Nanoseconds since the Unix epoch, saturating at the u64 range.
pub fn time_to_nanos(time: SystemTime) -> u64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(elapsed) => u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX),
        Err(_) => 0,
    }
}

pub fn nanos_to_time(nanos: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_nanos(nanos)
}

fn push_name(record: &mut Vec<u8>, name: &str) -> Result<()> {
    if name.len() > MAX_NAME_LENGTH {
        return Err(LogError::invalid_parameter(
            "name",
            name,
            format!("longer than {} bytes", MAX_NAME_LENGTH),
        ));
    }
    record.push(name.len() as u8);
    record.extend_from_slice(name.as_bytes());
    Ok(())
}

fn parse_name(data: &[u8], offset: &mut usize) -> Result<String> {
    let len = *data.get(*offset).ok_or_else(|| {
        LogError::parse("Record parsing", format!("Missing name length at offset {}", offset))
    })? as usize;
    let start = *offset + 1;
    let bytes = data.get(start..start + len).ok_or_else(|| {
        LogError::parse(
            "Record parsing",
            format!(
                "Name at offset {} needs {} bytes, have {}",
                start,
                len,
                data.len().saturating_sub(start)
            ),
        )
    })?;
    *offset = start + len;
    String::from_utf8(bytes.to_vec())
        .map_err(|e| LogError::parse("Record parsing", format!("Name is not UTF-8: {}", e)))
}

/// Read until `buf` is full or the stream ends, returning the bytes read.
fn read_fully<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

/// Safe byte parsing helpers with bounds checking
fn parse_u16_be(data: &[u8], offset: usize) -> Result<u16> {
    if offset + 2 > data.len() {
        return Err(LogError::parse(
            "Integer parsing",
            format!(
                "Insufficient data for u16 at offset {} (need 2 bytes, have {})",
                offset,
                data.len().saturating_sub(offset)
            ),
        ));
    }
    Ok(u16::from_be_bytes([data[offset], data[offset + 1]]))
}

fn parse_u64_be(data: &[u8], offset: usize) -> Result<u64> {
    if offset + 8 > data.len() {
        return Err(LogError::parse(
            "Timestamp parsing",
            format!(
                "Insufficient data for u64 at offset {} (need 8 bytes, have {})",
                offset,
                data.len().saturating_sub(offset)
            ),
        ));
    }
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&data[offset..offset + 8]);
    Ok(u64::from_be_bytes(raw))
}
