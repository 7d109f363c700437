//! Test utilities: a sample definition set and packet helpers
//!
//! The sample definitions are written in the same keyword form the configuration parser
//! hands over, so loading them exercises the definition parsers as well.

#![cfg(any(test, feature = "benchmark"))]

use std::path::{Path, PathBuf};

use crate::definition::{
    DefinitionBuilder, DefinitionRegistry, ItemParser, PacketParser, ParameterList, TableParser,
};
use crate::packet::Packet;
use crate::types::LogType;
use crate::Result;

/// Definitions used throughout the tests and benchmarks.
pub const SAMPLE_DEFINITIONS: &str = r#"
# Telemetry
TELEMETRY INST ADCS BIG_ENDIAN "Attitude determination"
  APPEND_ID_ITEM CCSDSAPID 16 UINT 2
  APPEND_ID_ITEM PKTID 8 UINT 1
  APPEND_ITEM Q1 64 FLOAT 0.0 "Quaternion 1"
  APPEND_ITEM Q2 32 FLOAT
  APPEND_ITEM MODE 64 STRING SAFE
TELEMETRY INST HEALTH_STATUS LITTLE_ENDIAN
  APPEND_ID_ITEM CCSDSAPID 16 UINT 2
  APPEND_ID_ITEM PKTID 8 UINT 2
  APPEND_ITEM TEMP1 16 INT -1
  APPEND_ITEM COLLECTS 16 UINT
TELEMETRY META DATA BIG_ENDIAN "Logging session metadata"
  APPEND_ITEM VERSION 256 STRING Default
  APPEND_ITEM NUMBER 32 UINT
  APPEND_ITEM RATE 16 UINT 1

# Commands
COMMAND INST ABORT BIG_ENDIAN "Abort the current activity"
  APPEND_ID_PARAMETER CCSDSAPID 16 UINT 1
  APPEND_ID_PARAMETER PKTID 8 UINT 2
COMMAND INST CLEAR BIG_ENDIAN
  APPEND_ID_PARAMETER CCSDSAPID 16 UINT 1
  APPEND_ID_PARAMETER PKTID 8 UINT 3
COMMAND INST COLLECT BIG_ENDIAN
  APPEND_ID_PARAMETER CCSDSAPID 16 UINT 1
  APPEND_ID_PARAMETER PKTID 8 UINT 4
  APPEND_PARAMETER DURATION 32 FLOAT 1.0
  APPEND_PARAMETER TYPE 16 UINT
COMMAND META DATA BIG_ENDIAN
  APPEND_ID_PARAMETER CCSDSAPID 16 UINT 1
  APPEND_ID_PARAMETER PKTID 8 UINT 0
  APPEND_PARAMETER VERSION 256 STRING Default
  APPEND_PARAMETER NUMBER 32 UINT
  APPEND_PARAMETER RATE 16 UINT 1

# Tables
TABLE LIMITS BIG_ENDIAN TWO_DIMENSIONAL 4 "Limit table"
  APPEND_PARAMETER LOW 16 INT
  APPEND_PARAMETER HIGH 16 INT 100
"#;

/// Load definitions written in keyword form, one keyword per line.
///
/// Tokens are separated by whitespace; double-quoted tokens may contain spaces.
pub fn load_definitions(
    text: &str,
    registry: &mut DefinitionRegistry,
    warnings: &mut Vec<String>,
) -> Result<()> {
    let mut current: Option<DefinitionBuilder> = None;

    for (index, line) in text.lines().enumerate() {
        let mut tokens = tokenize(line).into_iter();
        let Some(keyword) = tokens.next() else {
            continue;
        };
        if keyword.starts_with('#') {
            continue;
        }
        let params = ParameterList::new(&keyword, tokens).at("sample_definitions", index + 1);

        match params.keyword() {
            "TABLE" | "COMMAND" | "TELEMETRY" => {
                if let Some(builder) = current.take() {
                    builder.finish(registry, warnings);
                }
                current = Some(if params.keyword() == "TABLE" {
                    TableParser::parse(&params)?
                } else {
                    PacketParser::parse(&params)?
                });
            }
            _ => match current.as_mut() {
                Some(builder) => ItemParser::parse(&params, builder)?,
                None => {
                    return Err(crate::LogError::parse(
                        params.source_location().to_string(),
                        format!("{} outside of a definition", params.keyword()),
                    ));
                }
            },
        }
    }

    if let Some(builder) = current {
        builder.finish(registry, warnings);
    }
    Ok(())
}

fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut rest = line.trim();
    while !rest.is_empty() {
        if let Some(quoted) = rest.strip_prefix('"') {
            let end = quoted.find('"').unwrap_or(quoted.len());
            tokens.push(quoted[..end].to_string());
            rest = quoted.get(end + 1..).unwrap_or("").trim_start();
        } else {
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            tokens.push(rest[..end].to_string());
            rest = rest[end..].trim_start();
        }
    }
    tokens
}

/// Registry holding [`SAMPLE_DEFINITIONS`].
pub fn sample_registry() -> DefinitionRegistry {
    let mut registry = DefinitionRegistry::new();
    let mut warnings = Vec::new();
    load_definitions(SAMPLE_DEFINITIONS, &mut registry, &mut warnings)
        .expect("sample definitions are valid");
    assert!(warnings.is_empty(), "sample definitions redefine {:?}", warnings);
    registry
}

/// Fresh telemetry packet with default values.
pub fn telemetry_packet(registry: &DefinitionRegistry, target: &str, packet: &str) -> Packet {
    Packet::new(registry.packet(LogType::Tlm, target, packet).expect("sample telemetry packet"))
}

/// Fresh command packet with default values.
pub fn command_packet(registry: &DefinitionRegistry, target: &str, packet: &str) -> Packet {
    Packet::new(registry.packet(LogType::Cmd, target, packet).expect("sample command packet"))
}

/// Write a seed file into `dir` and return its path.
pub fn write_seed_file(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("meta_init.txt");
    std::fs::write(&path, contents).expect("seed file is writable");
    path
}
