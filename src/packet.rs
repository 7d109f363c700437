//! Packet instances
//!
//! A [`Packet`] pairs a shared [`Definition`] with the current value of every item.
//! Values are type checked on write, so a packet can always be encoded.

use std::sync::Arc;
use std::time::SystemTime;

use crate::codec;
use crate::definition::Definition;
use crate::types::{ItemData, Value};
use crate::{LogError, Result};

/// A named, ordered set of item values conforming to one definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    definition: Arc<Definition>,
    values: Vec<Value>,
    received_time: Option<SystemTime>,
}

impl Packet {
    /// Create a packet holding the definition's default values.
    pub fn new(definition: Arc<Definition>) -> Self {
        let values = definition.default_values();
        Self { definition, values, received_time: None }
    }

    /// Decode a packet from an encoded buffer.
    pub fn from_bytes(definition: Arc<Definition>, bytes: &[u8]) -> Result<Self> {
        let values = codec::decode(&definition, bytes)?;
        Ok(Self { definition, values, received_time: None })
    }

    pub fn definition(&self) -> &Arc<Definition> {
        &self.definition
    }

    pub fn target_name(&self) -> &str {
        self.definition.target_name()
    }

    pub fn packet_name(&self) -> &str {
        self.definition.name()
    }

    /// Whether this packet has the given identity (case-insensitive).
    pub fn matches(&self, target_name: &str, packet_name: &str) -> bool {
        self.target_name().eq_ignore_ascii_case(target_name)
            && self.packet_name().eq_ignore_ascii_case(packet_name)
    }

    /// Whether an encoded buffer carries this packet's identity items.
    pub fn identifies(&self, bytes: &[u8]) -> bool {
        self.definition.identifies(bytes)
    }

    pub fn received_time(&self) -> Option<SystemTime> {
        self.received_time
    }

    pub fn set_received_time(&mut self, time: Option<SystemTime>) {
        self.received_time = time;
    }

    /// Current value of an item.
    pub fn read(&self, item: &str) -> Result<&Value> {
        let index = self.position(item)?;
        Ok(&self.values[index])
    }

    /// Current value of an item converted to a Rust type.
    pub fn read_as<T: ItemData>(&self, item: &str) -> Result<T> {
        T::from_value(self.read(item)?)
    }

    /// Set an item, converting the value to the item's data type.
    ///
    /// Items of two-dimensional tables take a [`Value::Array`] with one element per row.
    pub fn write(&mut self, item: &str, value: impl Into<Value>) -> Result<()> {
        let index = self.position(item)?;
        let item_definition = &self.definition.items()[index];
        let value = match (value.into(), self.definition.shape().row_count()) {
            (Value::Array(elements), Some(rows)) if elements.len() == rows as usize => {
                Value::Array(
                    elements
                        .into_iter()
                        .map(|element| element.coerce(&item_definition.data_type))
                        .collect::<Result<Vec<_>>>()?,
                )
            }
            (other, Some(rows)) => {
                return Err(LogError::TypeConversion {
                    details: format!(
                        "{} expects an array of {} rows, got {}",
                        item_definition.name, rows, other
                    ),
                });
            }
            (other, None) => other.coerce(&item_definition.data_type)?,
        };
        self.values[index] = value;
        Ok(())
    }

    /// Reset every item to its definition default.
    pub fn restore_defaults(&mut self) {
        self.values = self.definition.default_values();
    }

    /// Copy all values from another packet with the same identity.
    pub fn copy_values_from(&mut self, other: &Packet) -> Result<()> {
        if !Arc::ptr_eq(&self.definition, &other.definition)
            && !other.matches(self.target_name(), self.packet_name())
        {
            return Err(LogError::unknown_packet(other.target_name(), other.packet_name()));
        }
        if other.values.len() != self.values.len() {
            return Err(LogError::parse(
                "Packet copy",
                format!(
                    "{} and its source disagree on item count ({} vs {})",
                    self.definition.display_name(),
                    self.values.len(),
                    other.values.len()
                ),
            ));
        }
        self.values.clone_from(&other.values);
        Ok(())
    }

    /// Item names and values in definition order.
    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.definition.items().iter().map(|item| item.name.as_str()).zip(self.values.iter())
    }

    /// Encode the current values.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        codec::encode(&self.definition, &self.values)
    }

    fn position(&self, item: &str) -> Result<usize> {
        self.definition
            .item_position(item)
            .ok_or_else(|| LogError::field_not_found(item, self.definition.display_name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{DefinitionBuilder, Namespace};
    use crate::types::{ByteOrder, DataType, Shape};

    fn meta() -> Arc<Definition> {
        Arc::new(
            DefinitionBuilder::packet(Namespace::Telemetry, "META", "DATA", ByteOrder::BigEndian)
                .append_item(
                    "VERSION",
                    DataType::String { bytes: 32 },
                    Some(Value::from("Default")),
                    None,
                )
                .and_then(|b| b.append_item("NUMBER", DataType::UInt { bits: 16 }, None, None))
                .unwrap()
                .build(),
        )
    }

    #[test]
    fn starts_with_defaults_and_restores_them() {
        let mut packet = Packet::new(meta());
        assert_eq!(packet.read_as::<String>("VERSION").unwrap(), "Default");

        packet.write("version", "Great Version").unwrap();
        packet.write("NUMBER", 5u16).unwrap();
        assert_eq!(packet.read("VERSION").unwrap(), &Value::from("Great Version"));
        assert_eq!(packet.read_as::<u16>("NUMBER").unwrap(), 5);

        packet.restore_defaults();
        assert_eq!(packet.read_as::<u64>("NUMBER").unwrap(), 0);
    }

    #[test]
    fn write_checks_names_and_types() {
        let mut packet = Packet::new(meta());
        assert!(matches!(packet.write("MISSING", 1u8), Err(LogError::FieldNotFound { .. })));
        assert!(matches!(packet.write("NUMBER", 70_000u32), Err(LogError::TypeConversion { .. })));
        assert!(matches!(packet.write("NUMBER", "five"), Err(LogError::TypeConversion { .. })));
    }

    #[test]
    fn bytes_round_trip() {
        let mut packet = Packet::new(meta());
        packet.write("NUMBER", 11u8).unwrap();
        let decoded = Packet::from_bytes(meta(), &packet.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded.read_as::<u16>("NUMBER").unwrap(), 11);
        assert!(decoded.matches("meta", "data"));
    }

    #[test]
    fn table_rows_take_arrays() {
        let definition = Arc::new(
            DefinitionBuilder::table("GRID", ByteOrder::BigEndian, Shape::TwoDimensional { rows: 2 })
                .append_item("X", DataType::Int { bits: 8 }, None, None)
                .unwrap()
                .build(),
        );
        let mut table = Packet::new(definition);
        table.write("X", Value::Array(vec![Value::Int(-1), Value::Int(7)])).unwrap();
        assert_eq!(table.read_as::<Vec<i8>>("X").unwrap(), vec![-1, 7]);
        assert!(table.write("X", 3i8).is_err());
    }
}
