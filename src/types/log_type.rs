//! Log category

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a packet log: commands sent or telemetry received.
///
/// The category selects the definition namespace, the identity strategy used when
/// reading and the literal `_cmd`/`_tlm` file name suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogType {
    Cmd,
    Tlm,
}

impl LogType {
    /// File name suffix without the leading underscore.
    pub fn suffix(&self) -> &'static str {
        match self {
            LogType::Cmd => "cmd",
            LogType::Tlm => "tlm",
        }
    }

    pub(crate) fn to_byte(self) -> u8 {
        match self {
            LogType::Cmd => 0,
            LogType::Tlm => 1,
        }
    }

    pub(crate) fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(LogType::Cmd),
            1 => Some(LogType::Tlm),
            _ => None,
        }
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogType::Cmd => f.write_str("CMD"),
            LogType::Tlm => f.write_str("TLM"),
        }
    }
}
