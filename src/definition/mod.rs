//! Table and packet definitions.
//!
//! A [`Definition`] describes the binary layout of a table or a packet: its name, byte
//! order, shape and ordered items. Definitions are immutable once built and are shared
//! through a [`DefinitionRegistry`] as `Arc<Definition>`.
//!
//! Definitions are created from parameter lists that an external configuration parser
//! has already tokenized:
//!
//! ```rust
//! use pktlog::definition::{DefinitionRegistry, ParameterList, TableParser};
//! use pktlog::types::Shape;
//!
//! let mut registry = DefinitionRegistry::new();
//! let mut warnings = Vec::new();
//! let params = ParameterList::new(
//!     "TABLE",
//!     ["limits", "big_endian", "TWO_DIMENSIONAL", "8", "Limit table"],
//! );
//! let table = TableParser::parse_table(&params, &mut registry, &mut warnings)?;
//! assert_eq!(table.name(), "LIMITS");
//! assert_eq!(table.shape(), Shape::TwoDimensional { rows: 8 });
//! assert!(warnings.is_empty());
//! # Ok::<(), pktlog::LogError>(())
//! ```

mod builder;
mod parser;
mod registry;

pub use builder::DefinitionBuilder;
pub use parser::{ItemParser, PacketParser, ParameterList, TableParser};
pub use registry::{DefinitionKey, DefinitionRegistry};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use crate::codec;
use crate::types::{ByteOrder, DataType, LogType, Shape, Value};

/// Pseudo-target that owns every table definition.
pub const TABLE_TARGET: &str = "TABLE";

/// Behavioral variant of a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefinitionKind {
    Table,
    Packet,
}

/// Namespace in which definition names must be unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Namespace {
    Table,
    Command,
    Telemetry,
}

impl From<LogType> for Namespace {
    fn from(log_type: LogType) -> Self {
        match log_type {
            LogType::Cmd => Namespace::Command,
            LogType::Tlm => Namespace::Telemetry,
        }
    }
}

/// Where a definition was declared. Used for diagnostics only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceLocation {
    pub filename: Option<PathBuf>,
    pub line: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.filename {
            Some(filename) => write!(f, "{}:{}", filename.display(), self.line),
            None => write!(f, "<memory>:{}", self.line),
        }
    }
}

/// One item (field) of a definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDefinition {
    /// Upper-cased item name
    pub name: String,
    /// Byte offset within one row
    pub offset: usize,
    pub data_type: DataType,
    /// Value a freshly created packet holds for this item
    pub default: Value,
    /// Expected value when this item identifies a packet in a command log
    pub id_value: Option<Value>,
    pub description: Option<String>,
}

impl ItemDefinition {
    pub fn is_id_item(&self) -> bool {
        self.id_value.is_some()
    }
}

/// Immutable description of a table or packet layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    kind: DefinitionKind,
    namespace: Namespace,
    target_name: String,
    name: String,
    byte_order: ByteOrder,
    shape: Shape,
    description: Option<String>,
    source: SourceLocation,
    items: Vec<ItemDefinition>,
    item_index: HashMap<String, usize>,
    row_length: usize,
}

impl Definition {
    pub fn kind(&self) -> DefinitionKind {
        self.kind
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    /// Owning target, [`TABLE_TARGET`] for tables.
    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn row_count(&self) -> Option<u32> {
        self.shape.row_count()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn source(&self) -> &SourceLocation {
        &self.source
    }

    /// Items in definition order.
    pub fn items(&self) -> &[ItemDefinition] {
        &self.items
    }

    /// Look up an item by name (case-insensitive).
    pub fn item(&self, name: &str) -> Option<&ItemDefinition> {
        self.item_position(name).map(|index| &self.items[index])
    }

    pub(crate) fn item_position(&self, name: &str) -> Option<usize> {
        match self.item_index.get(name) {
            Some(index) => Some(*index),
            None => self.item_index.get(&name.to_ascii_uppercase()).copied(),
        }
    }

    /// Items that identify this packet inside a command log.
    pub fn id_items(&self) -> impl Iterator<Item = &ItemDefinition> {
        self.items.iter().filter(|item| item.is_id_item())
    }

    /// Whether an encoded buffer carries this definition's identity.
    ///
    /// The buffer must have exactly this definition's length and every identity item must
    /// decode to its identifying value. Definitions without identity items never match.
    pub fn identifies(&self, bytes: &[u8]) -> bool {
        if bytes.len() != self.buffer_length() {
            return false;
        }
        let mut id_items = self.id_items().peekable();
        if id_items.peek().is_none() {
            return false;
        }
        id_items.all(|item| {
            codec::decode_item(self, item, bytes, 0).ok().as_ref() == item.id_value.as_ref()
        })
    }

    /// Size in bytes of one row of items.
    pub fn row_length(&self) -> usize {
        self.row_length
    }

    /// Size in bytes of a complete encoded buffer.
    pub fn buffer_length(&self) -> usize {
        self.row_length * self.shape.repetitions()
    }

    /// Registry key of this definition.
    pub fn key(&self) -> DefinitionKey {
        DefinitionKey::new(self.namespace, &self.target_name, &self.name)
    }

    /// Human readable identity, e.g. `Table LIMITS` or `Packet INST ADCS`.
    pub fn display_name(&self) -> String {
        match self.kind {
            DefinitionKind::Table => format!("Table {}", self.name),
            DefinitionKind::Packet => format!("Packet {} {}", self.target_name, self.name),
        }
    }

    /// Default value of every item, shaped for this definition.
    pub fn default_values(&self) -> Vec<Value> {
        self.items.iter().map(|item| self.shaped_default(item)).collect()
    }

    pub(crate) fn shaped_default(&self, item: &ItemDefinition) -> Value {
        match self.shape {
            Shape::OneDimensional => item.default.clone(),
            Shape::TwoDimensional { rows } => {
                Value::Array(vec![item.default.clone(); rows as usize])
            }
        }
    }
}
