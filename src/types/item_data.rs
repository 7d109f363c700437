//! Typed extraction of item values

use super::Value;

/// Trait for Rust types that can be read out of a packet item value.
pub trait ItemData: Sized {
    /// Convert the item value into this type.
    fn from_value(value: &Value) -> crate::Result<Self>;
}

fn conversion_error(expected: &str, value: &Value) -> crate::LogError {
    crate::LogError::TypeConversion { details: format!("Expected {}, got {}", expected, value) }
}

macro_rules! integer_item_data {
    ($($ty:ty),+) => {
        $(impl ItemData for $ty {
            fn from_value(value: &Value) -> crate::Result<Self> {
                let wide = match value {
                    Value::Int(v) => i128::from(*v),
                    Value::UInt(v) => i128::from(*v),
                    other => return Err(conversion_error(stringify!($ty), other)),
                };
                <$ty>::try_from(wide).map_err(|_| conversion_error(stringify!($ty), value))
            }
        })+
    };
}

integer_item_data!(i8, i16, i32, i64, u8, u16, u32, u64);

impl ItemData for f64 {
    fn from_value(value: &Value) -> crate::Result<Self> {
        match value {
            Value::Float(v) => Ok(*v),
            Value::Int(v) => Ok(*v as f64),
            Value::UInt(v) => Ok(*v as f64),
            other => Err(conversion_error("f64", other)),
        }
    }
}

impl ItemData for f32 {
    fn from_value(value: &Value) -> crate::Result<Self> {
        f64::from_value(value).map(|v| v as f32)
    }
}

impl ItemData for String {
    fn from_value(value: &Value) -> crate::Result<Self> {
        match value {
            Value::String(s) => Ok(s.clone()),
            other => Err(conversion_error("String", other)),
        }
    }
}

// Blocks come back as raw bytes. Byte arrays from two-dimensional tables also land here,
// other element types go through `array_item_data!` below.
impl ItemData for Vec<u8> {
    fn from_value(value: &Value) -> crate::Result<Self> {
        match value {
            Value::Block(bytes) => Ok(bytes.clone()),
            Value::Array(values) => values.iter().map(u8::from_value).collect(),
            other => Err(conversion_error("Vec<u8>", other)),
        }
    }
}

macro_rules! array_item_data {
    ($($ty:ty),+) => {
        $(impl ItemData for Vec<$ty> {
            fn from_value(value: &Value) -> crate::Result<Self> {
                match value {
                    Value::Array(values) => values.iter().map(<$ty>::from_value).collect(),
                    other => Err(conversion_error("array", other)),
                }
            }
        })+
    };
}

array_item_data!(i8, i16, i32, i64, u16, u32, u64, f32, f64, String);
