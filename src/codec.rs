//! Packet buffer encoding and decoding
//!
//! Items are laid out back to back in definition order. Multi-byte numeric items use the
//! definition's byte order; strings are NUL padded to their fixed size and blocks are
//! copied verbatim. Two-dimensional definitions repeat the item layout once per row.

use crate::definition::{Definition, ItemDefinition};
use crate::types::{ByteOrder, DataType, Value};
use crate::{LogError, Result};

/// Encode one value per item into a buffer of `definition.buffer_length()` bytes.
pub fn encode(definition: &Definition, values: &[Value]) -> Result<Vec<u8>> {
    if values.len() != definition.items().len() {
        return Err(LogError::parse(
            "Packet encoding",
            format!(
                "{} has {} items but {} values were supplied",
                definition.display_name(),
                definition.items().len(),
                values.len()
            ),
        ));
    }

    let mut buffer = vec![0u8; definition.buffer_length()];
    let rows = definition.shape().repetitions();
    let two_dimensional = definition.shape().is_two_dimensional();

    for (item, value) in definition.items().iter().zip(values) {
        if two_dimensional {
            let elements = match value {
                Value::Array(elements) if elements.len() == rows => elements,
                other => {
                    return Err(LogError::TypeConversion {
                        details: format!(
                            "{} in {} expects {} rows, got {}",
                            item.name,
                            definition.display_name(),
                            rows,
                            other
                        ),
                    });
                }
            };
            for (row, element) in elements.iter().enumerate() {
                let offset = row * definition.row_length() + item.offset;
                write_scalar(&mut buffer, offset, item, definition.byte_order(), element)?;
            }
        } else {
            write_scalar(&mut buffer, item.offset, item, definition.byte_order(), value)?;
        }
    }

    Ok(buffer)
}

/// Decode a buffer into one value per item.
///
/// The buffer must be exactly `definition.buffer_length()` bytes long.
pub fn decode(definition: &Definition, bytes: &[u8]) -> Result<Vec<Value>> {
    if bytes.len() != definition.buffer_length() {
        return Err(LogError::parse(
            "Packet decoding",
            format!(
                "{} expects {} bytes, found {}",
                definition.display_name(),
                definition.buffer_length(),
                bytes.len()
            ),
        ));
    }

    definition
        .items()
        .iter()
        .map(|item| {
            if definition.shape().is_two_dimensional() {
                (0..definition.shape().repetitions())
                    .map(|row| decode_item(definition, item, bytes, row))
                    .collect::<Result<Vec<_>>>()
                    .map(Value::Array)
            } else {
                decode_item(definition, item, bytes, 0)
            }
        })
        .collect()
}

/// Decode a single item of `row` from an encoded buffer.
pub(crate) fn decode_item(
    definition: &Definition,
    item: &ItemDefinition,
    bytes: &[u8],
    row: usize,
) -> Result<Value> {
    let offset = row * definition.row_length() + item.offset;
    let size = item.data_type.size();
    let field = bytes.get(offset..offset + size).ok_or_else(|| {
        LogError::parse(
            "Item decoding",
            format!(
                "Insufficient data for {} at offset {} (need {} bytes, have {})",
                item.name,
                offset,
                size,
                bytes.len().saturating_sub(offset)
            ),
        )
    })?;

    let order = definition.byte_order();
    let value = match item.data_type {
        DataType::Int { .. } => {
            let raw = read_uint(field, order);
            let shift = 64 - 8 * size as u32;
            Value::Int(((raw << shift) as i64) >> shift)
        }
        DataType::UInt { .. } => Value::UInt(read_uint(field, order)),
        DataType::Float { bits: 32 } => {
            let raw = [field[0], field[1], field[2], field[3]];
            let single = match order {
                ByteOrder::BigEndian => f32::from_be_bytes(raw),
                ByteOrder::LittleEndian => f32::from_le_bytes(raw),
            };
            Value::Float(single as f64)
        }
        DataType::Float { .. } => Value::Float(f64::from_bits(read_uint(field, order))),
        DataType::String { .. } => {
            let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
            Value::String(String::from_utf8_lossy(&field[..end]).to_string())
        }
        DataType::Block { .. } => Value::Block(field.to_vec()),
    };
    Ok(value)
}

fn write_scalar(
    buffer: &mut [u8],
    offset: usize,
    item: &ItemDefinition,
    order: ByteOrder,
    value: &Value,
) -> Result<()> {
    let value = value.clone().coerce(&item.data_type).map_err(|e| LogError::TypeConversion {
        details: format!("{}: {}", item.name, e),
    })?;
    let size = item.data_type.size();
    let field = buffer.get_mut(offset..offset + size).ok_or_else(|| {
        LogError::parse(
            "Item encoding",
            format!("{} at offset {} exceeds the buffer", item.name, offset),
        )
    })?;

    match (&item.data_type, value) {
        (DataType::Int { .. }, Value::Int(v)) => write_uint(field, v as u64, order),
        (DataType::UInt { .. }, Value::UInt(v)) => write_uint(field, v, order),
        (DataType::Float { bits: 32 }, Value::Float(v)) => {
            let bytes = match order {
                ByteOrder::BigEndian => (v as f32).to_be_bytes(),
                ByteOrder::LittleEndian => (v as f32).to_le_bytes(),
            };
            field.copy_from_slice(&bytes);
        }
        (DataType::Float { .. }, Value::Float(v)) => write_uint(field, v.to_bits(), order),
        (DataType::String { .. }, Value::String(s)) => {
            field[..s.len()].copy_from_slice(s.as_bytes());
        }
        (DataType::Block { .. }, Value::Block(b)) => field.copy_from_slice(&b),
        (data_type, other) => {
            return Err(LogError::TypeConversion {
                details: format!("{}: cannot encode {} as {:?}", item.name, other, data_type),
            });
        }
    }
    Ok(())
}

/// Read an unsigned integer of `bytes.len()` (1..=8) bytes.
fn read_uint(bytes: &[u8], order: ByteOrder) -> u64 {
    let n = bytes.len();
    let mut wide = [0u8; 8];
    match order {
        ByteOrder::BigEndian => {
            wide[8 - n..].copy_from_slice(bytes);
            u64::from_be_bytes(wide)
        }
        ByteOrder::LittleEndian => {
            wide[..n].copy_from_slice(bytes);
            u64::from_le_bytes(wide)
        }
    }
}

/// Write the low `field.len()` bytes of `value`.
fn write_uint(field: &mut [u8], value: u64, order: ByteOrder) {
    let n = field.len();
    match order {
        ByteOrder::BigEndian => field.copy_from_slice(&value.to_be_bytes()[8 - n..]),
        ByteOrder::LittleEndian => field.copy_from_slice(&value.to_le_bytes()[..n]),
    }
}
