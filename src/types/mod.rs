//! Core value types for definitions and packets.
//!
//! ## Architecture
//!
//! - [`ByteOrder`] and [`Shape`] describe the layout of a whole definition
//! - [`DataType`] describes one item and its size in bytes
//! - [`Value`] holds the runtime value of one item
//! - [`ItemData`] provides typed extraction from a [`Value`]
//! - [`LogType`] selects command or telemetry semantics for a log
//!
//! All tokens coming from definition parameter lists map onto closed enums, so an
//! unknown keyword is a parse error rather than a lookup miss at runtime.
//!
//! ## Usage Example
//!
//! ```rust
//! use pktlog::types::{DataType, ItemData, Value};
//!
//! let data_type = DataType::from_token("UINT", 16)?;
//! let value = Value::parse_literal("0x2A", &data_type)?;
//! assert_eq!(u16::from_value(&value)?, 42);
//! # Ok::<(), pktlog::LogError>(())
//! ```

mod data_type;
mod item_data;
mod layout;
mod log_type;

pub(crate) use data_type::unquote;
pub use data_type::{DataType, Value};
pub use item_data::ItemData;
pub use layout::{ByteOrder, Shape};
pub use log_type::LogType;

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    fn arb_integer_type() -> impl Strategy<Value = DataType> {
        prop::sample::select(vec![
            DataType::Int { bits: 8 },
            DataType::Int { bits: 16 },
            DataType::Int { bits: 32 },
            DataType::Int { bits: 64 },
            DataType::UInt { bits: 8 },
            DataType::UInt { bits: 16 },
            DataType::UInt { bits: 32 },
            DataType::UInt { bits: 64 },
        ])
    }

    proptest! {
        #[test]
        fn prop_integer_sizes_match_bits(data_type in arb_integer_type()) {
            let size = data_type.size();
            prop_assert!(size == 1 || size == 2 || size == 4 || size == 8);
            match data_type {
                DataType::Int { bits } | DataType::UInt { bits } => {
                    prop_assert_eq!(size * 8, bits as usize);
                }
                _ => prop_assert!(false, "integer strategy produced {:?}", data_type),
            }
        }

        #[test]
        fn prop_decimal_literals_parse_as_u16(value in any::<u16>()) {
            let parsed = Value::parse_literal(&value.to_string(), &DataType::UInt { bits: 16 });
            prop_assert_eq!(parsed.unwrap(), Value::UInt(value as u64));
        }

        #[test]
        fn prop_i8_range_is_enforced(value in -1000i64..1000) {
            let result = Value::Int(value).coerce(&DataType::Int { bits: 8 });
            prop_assert_eq!(result.is_ok(), (-128..=127).contains(&value));
        }
    }

    #[test]
    fn zero_values_match_types() {
        assert_eq!(DataType::Int { bits: 32 }.zero_value(), Value::Int(0));
        assert_eq!(DataType::String { bytes: 8 }.zero_value(), Value::String(String::new()));
        assert_eq!(DataType::Block { bytes: 2 }.zero_value(), Value::Block(vec![0, 0]));
    }

    #[test]
    fn log_type_suffixes() {
        assert_eq!(LogType::Cmd.suffix(), "cmd");
        assert_eq!(LogType::Tlm.suffix(), "tlm");
        assert_eq!(LogType::from_byte(LogType::Tlm.to_byte()), Some(LogType::Tlm));
        assert_eq!(LogType::from_byte(7), None);
    }
}
