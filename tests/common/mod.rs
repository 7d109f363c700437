//! Shared fixtures for integration tests

#![allow(dead_code)]

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pktlog::definition::{DefinitionBuilder, DefinitionRegistry, Namespace};
use pktlog::types::{ByteOrder, DataType, LogType, Value};
use pktlog::{Packet, PacketLogReader};

/// Install a test subscriber once; `RUST_LOG` controls the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn meta_data(namespace: Namespace) -> Result<DefinitionBuilder> {
    let mut builder = DefinitionBuilder::packet(namespace, "META", "DATA", ByteOrder::BigEndian);
    if namespace == Namespace::Command {
        builder = builder
            .append_id_item("CCSDSAPID", DataType::UInt { bits: 16 }, Value::UInt(1), None)?
            .append_id_item("PKTID", DataType::UInt { bits: 8 }, Value::UInt(0), None)?;
    }
    Ok(builder
        .append_item("VERSION", DataType::String { bytes: 32 }, Some(Value::from("Default")), None)?
        .append_item("NUMBER", DataType::UInt { bits: 32 }, None, None)?)
}

/// Registry with `INST ADCS` and `META DATA` telemetry and `INST ABORT` and `META DATA`
/// commands.
pub fn registry() -> Result<Arc<DefinitionRegistry>> {
    let mut registry = DefinitionRegistry::new();
    let mut warnings = Vec::new();

    DefinitionBuilder::packet(Namespace::Telemetry, "INST", "ADCS", ByteOrder::BigEndian)
        .append_id_item("CCSDSAPID", DataType::UInt { bits: 16 }, Value::UInt(2), None)?
        .append_item("POSX", DataType::Float { bits: 32 }, None, None)?
        .append_item("POSY", DataType::Float { bits: 32 }, None, None)?
        .append_item("STATE", DataType::Int { bits: 8 }, Some(Value::Int(-1)), None)?
        .finish(&mut registry, &mut warnings);

    DefinitionBuilder::packet(Namespace::Command, "INST", "ABORT", ByteOrder::BigEndian)
        .append_id_item("CCSDSAPID", DataType::UInt { bits: 16 }, Value::UInt(1), None)?
        .append_id_item("PKTID", DataType::UInt { bits: 8 }, Value::UInt(2), None)?
        .finish(&mut registry, &mut warnings);

    meta_data(Namespace::Telemetry)?.finish(&mut registry, &mut warnings);
    meta_data(Namespace::Command)?.finish(&mut registry, &mut warnings);

    anyhow::ensure!(warnings.is_empty(), "unexpected redefinitions: {:?}", warnings);
    Ok(Arc::new(registry))
}

pub fn packet(registry: &DefinitionRegistry, log_type: LogType, target: &str, name: &str) -> Result<Packet> {
    Ok(Packet::new(registry.packet(log_type, target, name)?))
}

/// Every log file in `dir`, sorted by name.
pub fn log_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    files.sort();
    Ok(files)
}

/// `TARGET PACKET` names of every packet in a log.
pub fn packet_names(registry: &Arc<DefinitionRegistry>, path: &Path) -> Result<Vec<String>> {
    PacketLogReader::new(Arc::clone(registry))
        .each(path)?
        .map(|packet| -> Result<String> {
            let packet = packet?;
            Ok(format!("{} {}", packet.target_name(), packet.packet_name()))
        })
        .collect()
}
