//! Metadata seed files
//!
//! A seed file sets initial values of the metadata packet, one `<ITEM> <value>` pair per
//! line:
//!
//! ```text
//! # operator supplied defaults
//! VERSION 'Ok Version'
//! NUMBER 0x0B
//! ```
//!
//! Values are quoted strings or bare numbers. Blank lines and `#` comments are skipped.

use std::path::Path;
use tracing::{debug, trace};

use crate::packet::Packet;
use crate::types::Value;
use crate::{LogError, Result};

/// Apply a seed file to `packet`, returning the number of items set.
pub fn apply_seed_file(packet: &mut Packet, path: &Path) -> Result<usize> {
    let text = std::fs::read_to_string(path).map_err(|e| LogError::file_error(path, e))?;
    let applied = apply_seed(packet, &text, &path.display().to_string())?;
    debug!(
        "Applied {} seed values from {} to {}",
        applied,
        path.display(),
        packet.definition().display_name()
    );
    Ok(applied)
}

/// Apply seed text to `packet`. `origin` names the source in error messages.
pub fn apply_seed(packet: &mut Packet, text: &str, origin: &str) -> Result<usize> {
    let mut applied = 0;
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (name, literal) = match line.split_once(char::is_whitespace) {
            Some((name, literal)) if !literal.trim().is_empty() => (name, literal.trim()),
            _ => {
                return Err(LogError::parse(
                    format!("Seed file {} line {}", origin, index + 1),
                    format!("Expected '<ITEM> <value>', found {:?}", line),
                ));
            }
        };

        let data_type = packet
            .definition()
            .item(name)
            .map(|item| item.data_type)
            .ok_or_else(|| LogError::field_not_found(name, packet.definition().display_name()))?;
        let value = Value::parse_literal(literal, &data_type)?;
        trace!("Seeding {} = {}", name, value);
        packet.write(name, value)?;
        applied += 1;
    }
    Ok(applied)
}
