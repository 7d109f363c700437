//! Packet log writer that interleaves a metadata packet
//!
//! The metadata packet describes the logging session (software version, configuration
//! identifiers, operator notes). Readers of any file can recover the context because the
//! snapshot is written at the start of every file, or before every packet.

use std::sync::Arc;
use tracing::{debug, info};

use super::seed;
use super::writer::PacketLogWriter;
use crate::config::MetaPacketLogWriterConfig;
use crate::definition::DefinitionRegistry;
use crate::packet::Packet;
use crate::types::LogType;
use crate::Result;

/// A [`PacketLogWriter`] that keeps a live metadata packet and injects it into the log.
pub struct MetaPacketLogWriter {
    writer: PacketLogWriter,
    meta_packet: Packet,
    log_meta_before_write: bool,
    log_meta_on_new_file: bool,
}

impl MetaPacketLogWriter {
    /// Resolve the metadata packet, apply the seed file and create the wrapped writer.
    ///
    /// Fails with `UnknownPacket` if the metadata packet is not registered in the
    /// namespace of the configured log type, and with `FieldNotFound` if the seed file
    /// names an item the metadata packet lacks. No file is created on failure.
    pub fn new(config: MetaPacketLogWriterConfig, registry: Arc<DefinitionRegistry>) -> Result<Self> {
        let definition =
            registry.packet(config.log_type, &config.meta_target_name, &config.meta_packet_name)?;
        let mut meta_packet = Packet::new(definition);

        if let Some(path) = &config.init_data_file_path {
            seed::apply_seed_file(&mut meta_packet, path)?;
        }

        let writer = PacketLogWriter::new(config.log_type, config.writer, registry)?;
        info!(
            "Metadata {} logged {}{}",
            meta_packet.definition().display_name(),
            if config.log_meta_on_new_file { "at file start" } else { "never at file start" },
            if config.log_meta_before_write { ", before every packet" } else { "" }
        );

        Ok(Self {
            writer,
            meta_packet,
            log_meta_before_write: config.log_meta_before_write,
            log_meta_on_new_file: config.log_meta_on_new_file,
        })
    }

    /// Write a packet, injecting the metadata packet as configured.
    ///
    /// Writing the metadata packet itself replaces the live snapshot and logs it once.
    /// With both injection flags set, a new file starts with two metadata records.
    pub fn write(&mut self, packet: &Packet) -> Result<()> {
        if packet.matches(self.meta_packet.target_name(), self.meta_packet.packet_name()) {
            self.meta_packet.copy_values_from(packet)?;
            return self.writer.write(packet);
        }

        let injecting = self.log_meta_on_new_file || self.log_meta_before_write;
        if !injecting || !self.writer.logging_enabled() {
            return self.writer.write(packet);
        }

        // The injected records and the packet land in the same file, so rotation is
        // decided once for the whole group.
        let mut group_len = self.writer.record_len(packet)?;
        if self.log_meta_before_write {
            group_len += self.writer.record_len(&self.meta_packet)?;
        }
        if self.writer.rotation_pending(group_len) {
            self.writer.start_new_file()?;
            if self.log_meta_on_new_file {
                debug!("Writing {} at start of new file", self.meta_packet.definition().display_name());
                self.write_meta()?;
            }
        }
        if self.log_meta_before_write {
            self.write_meta()?;
        }
        self.writer.write_in_current_file(packet)
    }

    // Injected records are stamped when written, not when the snapshot last changed.
    fn write_meta(&mut self) -> Result<()> {
        self.meta_packet.set_received_time(None);
        self.writer.write_in_current_file(&self.meta_packet)
    }

    /// Live metadata snapshot.
    pub fn meta_packet(&self) -> &Packet {
        &self.meta_packet
    }

    /// Mutable access to the live snapshot. Changes appear in the next injected record.
    pub fn meta_packet_mut(&mut self) -> &mut Packet {
        &mut self.meta_packet
    }

    pub fn writer(&self) -> &PacketLogWriter {
        &self.writer
    }

    pub fn log_type(&self) -> LogType {
        self.writer.log_type()
    }

    /// Close the current file. The next write starts a new one.
    pub fn start_new_file(&mut self) -> Result<()> {
        self.writer.start_new_file()
    }

    pub fn stop(&mut self) -> Result<()> {
        self.writer.stop()
    }
}
