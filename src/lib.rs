//! Packet and table definitions with a compact binary packet log.
//!
//! `pktlog` holds the definition model and logging layer of a command and telemetry
//! ground system: every packet sent to or received from a spacecraft can be described,
//! recorded and read back with its fields decoded.
//!
//! # Features
//!
//! - **Definitions**: Tables and packets built from tokenized configuration keywords,
//!   held in an explicit [`DefinitionRegistry`](definition::DefinitionRegistry)
//! - **Packet logs**: Timestamped binary files per log category (`_cmd` / `_tlm`) with
//!   size and age based rotation
//! - **Metadata injection**: A session metadata packet written at the start of every file
//!   or before every packet
//! - **Reading and replay**: Lazy decoding iterators and a paced async replay stream
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pktlog::config::{MetaPacketLogWriterConfig, PacketLogWriterConfig};
//! use pktlog::definition::{DefinitionRegistry, ItemParser, PacketParser, ParameterList};
//! use pktlog::log::{MetaPacketLogWriter, PacketLogReader};
//! use pktlog::types::LogType;
//! use pktlog::Packet;
//!
//! fn main() -> pktlog::Result<()> {
//!     let mut registry = DefinitionRegistry::new();
//!     let mut warnings = Vec::new();
//!
//!     let mut meta = PacketParser::parse(&ParameterList::new(
//!         "TELEMETRY",
//!         ["META", "DATA", "BIG_ENDIAN"],
//!     ))?;
//!     ItemParser::parse(&ParameterList::new("APPEND_ITEM", ["VERSION", "256", "STRING"]), &mut meta)?;
//!     meta.finish(&mut registry, &mut warnings);
//!
//!     let mut adcs = PacketParser::parse(&ParameterList::new(
//!         "TELEMETRY",
//!         ["INST", "ADCS", "BIG_ENDIAN"],
//!     ))?;
//!     ItemParser::parse(&ParameterList::new("APPEND_ITEM", ["Q1", "32", "FLOAT"]), &mut adcs)?;
//!     adcs.finish(&mut registry, &mut warnings);
//!
//!     let registry = Arc::new(registry);
//!     let config = MetaPacketLogWriterConfig::new(
//!         LogType::Tlm,
//!         "META",
//!         "DATA",
//!         PacketLogWriterConfig::new("logs"),
//!     );
//!     let mut writer = MetaPacketLogWriter::new(config, Arc::clone(&registry))?;
//!     let mut packet = Packet::new(registry.packet(LogType::Tlm, "INST", "ADCS")?);
//!     packet.write("Q1", 0.5f32)?;
//!     writer.write(&packet)?;
//!     writer.stop()?;
//!
//!     let path = writer.writer().filename().expect("a file was written").to_path_buf();
//!     for packet in PacketLogReader::new(registry).each(path)? {
//!         let packet = packet?;
//!         println!("{} {}", packet.target_name(), packet.packet_name());
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
pub mod codec;
pub mod config;
pub mod definition;
mod error;
pub mod packet;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Logging and replay
pub mod log;
pub mod replay;

// Core exports
pub use error::*;
pub use packet::Packet;

// Main API exports
pub use config::{MetaPacketLogWriterConfig, PacketLogWriterConfig};
pub use definition::{Definition, DefinitionRegistry};
pub use log::{DecodePolicy, MetaPacketLogWriter, PacketLogReader, PacketLogWriter};
pub use replay::{ReplayConnection, ReplayOptions};
pub use types::LogType;
