//! Byte order and display shape of a definition

use serde::{Deserialize, Serialize};
use std::fmt;

/// Byte order used for multi-byte items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ByteOrder {
    BigEndian,
    LittleEndian,
}

impl ByteOrder {
    /// Parse a byte order keyword, ignoring case.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_uppercase().as_str() {
            "BIG_ENDIAN" => Some(ByteOrder::BigEndian),
            "LITTLE_ENDIAN" => Some(ByteOrder::LittleEndian),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ByteOrder::BigEndian => "BIG_ENDIAN",
            ByteOrder::LittleEndian => "LITTLE_ENDIAN",
        }
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural shape of a definition.
///
/// Only two-dimensional definitions carry a row count, so a row count without the
/// matching shape cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Shape {
    OneDimensional,
    TwoDimensional { rows: u32 },
}

impl Shape {
    /// Number of rows, present only for two-dimensional definitions.
    pub fn row_count(&self) -> Option<u32> {
        match self {
            Shape::OneDimensional => None,
            Shape::TwoDimensional { rows } => Some(*rows),
        }
    }

    /// Number of times the item layout repeats in a buffer.
    pub fn repetitions(&self) -> usize {
        self.row_count().map_or(1, |rows| rows as usize)
    }

    pub fn is_two_dimensional(&self) -> bool {
        matches!(self, Shape::TwoDimensional { .. })
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Shape::OneDimensional => "ONE_DIMENSIONAL",
            Shape::TwoDimensional { .. } => "TWO_DIMENSIONAL",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_order_tokens_are_case_insensitive() {
        assert_eq!(ByteOrder::from_token("big_endian"), Some(ByteOrder::BigEndian));
        assert_eq!(ByteOrder::from_token("Little_Endian"), Some(ByteOrder::LittleEndian));
        assert_eq!(ByteOrder::from_token("MIDDLE_ENDIAN"), None);
    }

    #[test]
    fn row_count_only_for_two_dimensional() {
        assert_eq!(Shape::OneDimensional.row_count(), None);
        assert_eq!(Shape::TwoDimensional { rows: 4 }.row_count(), Some(4));
        assert_eq!(Shape::TwoDimensional { rows: 4 }.repetitions(), 4);
        assert_eq!(Shape::OneDimensional.repetitions(), 1);
    }
}
