//! Item data types and runtime values

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{LogError, Result};

/// Supported item data types.
///
/// Integer and float sizes are expressed in bits, string and block sizes in bytes.
/// Every type occupies a whole number of bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Two's complement signed integer (8, 16, 32 or 64 bits)
    Int { bits: u8 },
    /// Unsigned integer (8, 16, 32 or 64 bits)
    UInt { bits: u8 },
    /// IEEE-754 float (32 or 64 bits)
    Float { bits: u8 },
    /// Fixed length, NUL padded text
    String { bytes: usize },
    /// Fixed length raw bytes
    Block { bytes: usize },
}

impl DataType {
    /// Build a data type from its keyword and bit size as written in a definition.
    pub fn from_token(token: &str, bit_size: usize) -> Result<Self> {
        let keyword = token.to_ascii_uppercase();
        let integer_bits = |bit_size: usize| -> Result<u8> {
            match bit_size {
                8 | 16 | 32 | 64 => Ok(bit_size as u8),
                _ => Err(LogError::invalid_parameter(
                    "bit size",
                    bit_size.to_string(),
                    format!("{} items must be 8, 16, 32 or 64 bits", keyword),
                )),
            }
        };

        match keyword.as_str() {
            "INT" => Ok(DataType::Int { bits: integer_bits(bit_size)? }),
            "UINT" => Ok(DataType::UInt { bits: integer_bits(bit_size)? }),
            "FLOAT" => match bit_size {
                32 | 64 => Ok(DataType::Float { bits: bit_size as u8 }),
                _ => Err(LogError::invalid_parameter(
                    "bit size",
                    bit_size.to_string(),
                    "FLOAT items must be 32 or 64 bits",
                )),
            },
            "STRING" | "BLOCK" => {
                if bit_size == 0 || bit_size % 8 != 0 {
                    return Err(LogError::invalid_parameter(
                        "bit size",
                        bit_size.to_string(),
                        format!("{} items must be a positive multiple of 8 bits", keyword),
                    ));
                }
                if keyword == "STRING" {
                    Ok(DataType::String { bytes: bit_size / 8 })
                } else {
                    Ok(DataType::Block { bytes: bit_size / 8 })
                }
            }
            _ => Err(LogError::invalid_parameter(
                "data type",
                token,
                "must be INT, UINT, FLOAT, STRING or BLOCK",
            )),
        }
    }

    /// Returns the size in bytes of one element of this type.
    pub const fn size(&self) -> usize {
        match self {
            DataType::Int { bits } | DataType::UInt { bits } | DataType::Float { bits } => {
                *bits as usize / 8
            }
            DataType::String { bytes } | DataType::Block { bytes } => *bytes,
        }
    }

    /// Zero value used when a definition declares no default.
    pub fn zero_value(&self) -> Value {
        match self {
            DataType::Int { .. } => Value::Int(0),
            DataType::UInt { .. } => Value::UInt(0),
            DataType::Float { .. } => Value::Float(0.0),
            DataType::String { .. } => Value::String(String::new()),
            DataType::Block { bytes } => Value::Block(vec![0; *bytes]),
        }
    }

    /// Keyword used in definition parameter lists.
    pub fn keyword(&self) -> &'static str {
        match self {
            DataType::Int { .. } => "INT",
            DataType::UInt { .. } => "UINT",
            DataType::Float { .. } => "FLOAT",
            DataType::String { .. } => "STRING",
            DataType::Block { .. } => "BLOCK",
        }
    }
}

/// Runtime value of a packet item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    Block(Vec<u8>),
    /// One element per row of a two-dimensional table
    Array(Vec<Value>),
}

impl Value {
    /// Parse a literal from a definition or seed file into a value of `data_type`.
    ///
    /// Quoted literals (`'text'` or `"text"`) are unquoted first. Integers accept a
    /// `0x` hex prefix, blocks are always given as hex.
    pub fn parse_literal(literal: &str, data_type: &DataType) -> Result<Value> {
        let text = unquote(literal.trim());
        let conversion_error = |reason: &str| LogError::TypeConversion {
            details: format!("Cannot parse '{}' as {}: {}", literal, data_type.keyword(), reason),
        };

        let value = match data_type {
            DataType::Int { .. } => {
                let parsed = match strip_hex(text) {
                    Some((negative, hex)) => i64::from_str_radix(hex, 16)
                        .map(|v| if negative { -v } else { v })
                        .map_err(|e| conversion_error(&e.to_string()))?,
                    None => match text.parse::<i64>() {
                        Ok(v) => v,
                        Err(_) => parse_integral_float(text).ok_or_else(|| {
                            conversion_error("not an integer")
                        })?,
                    },
                };
                Value::Int(parsed)
            }
            DataType::UInt { .. } => {
                let parsed = match strip_hex(text) {
                    Some((false, hex)) => {
                        u64::from_str_radix(hex, 16).map_err(|e| conversion_error(&e.to_string()))?
                    }
                    Some((true, _)) => return Err(conversion_error("negative value")),
                    None => match text.parse::<u64>() {
                        Ok(v) => v,
                        Err(_) => parse_integral_float(text)
                            .and_then(|v| u64::try_from(v).ok())
                            .ok_or_else(|| conversion_error("not an unsigned integer"))?,
                    },
                };
                Value::UInt(parsed)
            }
            DataType::Float { .. } => {
                Value::Float(text.parse::<f64>().map_err(|e| conversion_error(&e.to_string()))?)
            }
            DataType::String { .. } => Value::String(text.to_string()),
            DataType::Block { .. } => {
                let hex = text
                    .strip_prefix("0x")
                    .or_else(|| text.strip_prefix("0X"))
                    .unwrap_or(text);
                if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                    return Err(conversion_error("not a hex string"));
                }
                if hex.len() % 2 != 0 {
                    return Err(conversion_error("odd number of hex digits"));
                }
                let bytes = hex
                    .as_bytes()
                    .chunks(2)
                    .map(|pair| (hex_digit(pair[0]) << 4) | hex_digit(pair[1]))
                    .collect();
                Value::Block(bytes)
            }
        };

        value.coerce(data_type)
    }

    /// Convert this value into the representation used for `data_type`, checking that it
    /// fits the item size.
    pub fn coerce(self, data_type: &DataType) -> Result<Value> {
        let mismatch = |value: &Value| LogError::TypeConversion {
            details: format!("Value {} does not fit {:?}", value, data_type),
        };

        match (data_type, self) {
            (DataType::Int { bits }, Value::Int(v)) => {
                if fits_signed(v, *bits) { Ok(Value::Int(v)) } else { Err(mismatch(&Value::Int(v))) }
            }
            (DataType::Int { bits }, Value::UInt(v)) => match i64::try_from(v) {
                Ok(signed) if fits_signed(signed, *bits) => Ok(Value::Int(signed)),
                _ => Err(mismatch(&Value::UInt(v))),
            },
            (DataType::UInt { bits }, Value::UInt(v)) => {
                if fits_unsigned(v, *bits) {
                    Ok(Value::UInt(v))
                } else {
                    Err(mismatch(&Value::UInt(v)))
                }
            }
            (DataType::UInt { bits }, Value::Int(v)) => match u64::try_from(v) {
                Ok(unsigned) if fits_unsigned(unsigned, *bits) => Ok(Value::UInt(unsigned)),
                _ => Err(mismatch(&Value::Int(v))),
            },
            (DataType::Float { bits }, Value::Float(v)) => Ok(Value::Float(stored_float(v, *bits))),
            (DataType::Float { bits }, Value::Int(v)) => Ok(Value::Float(stored_float(v as f64, *bits))),
            (DataType::Float { bits }, Value::UInt(v)) => Ok(Value::Float(stored_float(v as f64, *bits))),
            (DataType::String { bytes }, Value::String(s)) => {
                if s.len() <= *bytes {
                    Ok(Value::String(s))
                } else {
                    Err(mismatch(&Value::String(s)))
                }
            }
            (DataType::Block { bytes }, Value::Block(mut b)) => {
                if b.len() > *bytes {
                    return Err(mismatch(&Value::Block(b)));
                }
                b.resize(*bytes, 0);
                Ok(Value::Block(b))
            }
            (_, other) => Err(mismatch(&other)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::UInt(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Block(b) => {
                f.write_str("0x")?;
                for byte in b {
                    write!(f, "{:02X}", byte)?;
                }
                Ok(())
            }
            Value::Array(values) => {
                f.write_str("[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                f.write_str("]")
            }
        }
    }
}

macro_rules! value_from {
    ($variant:ident, $target:ty, $($source:ty),+) => {
        $(impl From<$source> for Value {
            fn from(v: $source) -> Self {
                Value::$variant(v as $target)
            }
        })+
    };
}

value_from!(Int, i64, i8, i16, i32, i64);
value_from!(UInt, u64, u8, u16, u32, u64);
value_from!(Float, f64, f32, f64);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Block(v)
    }
}

// Values of 32-bit items are held at the precision they are stored with.
fn stored_float(value: f64, bits: u8) -> f64 {
    if bits == 32 { value as f32 as f64 } else { value }
}

fn hex_digit(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        _ => digit - b'A' + 10,
    }
}

fn fits_signed(v: i64, bits: u8) -> bool {
    if bits >= 64 {
        return true;
    }
    let limit = 1i64 << (bits - 1);
    (-limit..limit).contains(&v)
}

fn fits_unsigned(v: u64, bits: u8) -> bool {
    bits >= 64 || v < (1u64 << bits)
}

/// Strip matching single or double quotes around a literal.
pub(crate) fn unquote(text: &str) -> &str {
    let bytes = text.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'\'' || first == b'"') && first == last {
            return &text[1..text.len() - 1];
        }
    }
    text
}

fn strip_hex(text: &str) -> Option<(bool, &str)> {
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")).map(|hex| (negative, hex))
}

fn parse_integral_float(text: &str) -> Option<i64> {
    let value = text.parse::<f64>().ok()?;
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 { Some(value as i64) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_token_sizes() {
        assert_eq!(DataType::from_token("uint", 16).unwrap(), DataType::UInt { bits: 16 });
        assert_eq!(DataType::from_token("STRING", 256).unwrap().size(), 32);
        assert_eq!(DataType::from_token("FLOAT", 64).unwrap().size(), 8);
        assert!(DataType::from_token("FLOAT", 16).is_err());
        assert!(DataType::from_token("INT", 12).is_err());
        assert!(DataType::from_token("BLOCK", 0).is_err());
        assert!(matches!(
            DataType::from_token("DERIVED", 0),
            Err(LogError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn parse_literal_handles_quotes_and_hex() {
        let string = DataType::String { bytes: 32 };
        assert_eq!(
            Value::parse_literal("'Ok Version'", &string).unwrap(),
            Value::String("Ok Version".into())
        );
        assert_eq!(
            Value::parse_literal("\"quoted\"", &string).unwrap(),
            Value::String("quoted".into())
        );

        let uint = DataType::UInt { bits: 16 };
        assert_eq!(Value::parse_literal("11", &uint).unwrap(), Value::UInt(11));
        assert_eq!(Value::parse_literal("0x1F", &uint).unwrap(), Value::UInt(31));
        assert!(Value::parse_literal("70000", &uint).is_err());
        assert!(Value::parse_literal("-1", &uint).is_err());

        let int = DataType::Int { bits: 8 };
        assert_eq!(Value::parse_literal("-128", &int).unwrap(), Value::Int(-128));
        assert!(Value::parse_literal("128", &int).is_err());

        let block = DataType::Block { bytes: 4 };
        assert_eq!(
            Value::parse_literal("0xDEAD", &block).unwrap(),
            Value::Block(vec![0xDE, 0xAD, 0, 0])
        );
    }

    #[test]
    fn block_literals_must_be_ascii_hex() {
        let block = DataType::Block { bytes: 4 };
        for literal in ["a\u{e9}a", "0x\u{e9}\u{e9}", "zz", "0xABC"] {
            assert!(
                matches!(Value::parse_literal(literal, &block), Err(LogError::TypeConversion { .. })),
                "{:?} should be rejected",
                literal
            );
        }
        assert_eq!(
            Value::parse_literal("0xa0Ff", &block).unwrap(),
            Value::Block(vec![0xA0, 0xFF, 0, 0])
        );
    }

    #[test]
    fn single_precision_items_hold_stored_precision() {
        let single = DataType::Float { bits: 32 };
        assert_eq!(Value::Float(0.1).coerce(&single).unwrap(), Value::Float(0.1f32 as f64));
        assert_eq!(
            Value::UInt(16_777_217).coerce(&single).unwrap(),
            Value::Float(16_777_216.0)
        );
        assert_eq!(Value::parse_literal("0.1", &single).unwrap(), Value::Float(0.1f32 as f64));

        let double = DataType::Float { bits: 64 };
        assert_eq!(Value::Float(0.1).coerce(&double).unwrap(), Value::Float(0.1));
    }

    #[test]
    fn coerce_rejects_oversized_strings() {
        let err = Value::from("too long").coerce(&DataType::String { bytes: 3 });
        assert!(matches!(err, Err(LogError::TypeConversion { .. })));
    }

    #[test]
    fn display_formats() {
        assert_eq!(Value::Block(vec![0xAB, 0x01]).to_string(), "0xAB01");
        assert_eq!(Value::Array(vec![Value::UInt(1), Value::UInt(2)]).to_string(), "[1, 2]");
    }
}
