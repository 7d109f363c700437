//! Incremental construction of definitions

use std::collections::HashMap;
use std::sync::Arc;

use super::{
    Definition, DefinitionKind, DefinitionRegistry, ItemDefinition, Namespace, SourceLocation,
    TABLE_TARGET,
};
use crate::types::{ByteOrder, DataType, Shape, Value};
use crate::{LogError, Result};

/// Collects the header and items of a definition before it is registered.
///
/// Items are laid out back to back in append order. Nothing is visible in a registry
/// until [`DefinitionBuilder::finish`] is called.
#[derive(Debug, Clone)]
pub struct DefinitionBuilder {
    kind: DefinitionKind,
    namespace: Namespace,
    target_name: String,
    name: String,
    byte_order: ByteOrder,
    shape: Shape,
    description: Option<String>,
    source: SourceLocation,
    items: Vec<ItemDefinition>,
    next_offset: usize,
}

impl DefinitionBuilder {
    /// Start a table definition owned by the [`TABLE_TARGET`] pseudo-target.
    pub fn table(name: &str, byte_order: ByteOrder, shape: Shape) -> Self {
        Self::new(DefinitionKind::Table, Namespace::Table, TABLE_TARGET, name, byte_order, shape)
    }

    /// Start a command or telemetry packet definition.
    pub fn packet(
        namespace: Namespace,
        target_name: &str,
        packet_name: &str,
        byte_order: ByteOrder,
    ) -> Self {
        Self::new(
            DefinitionKind::Packet,
            namespace,
            target_name,
            packet_name,
            byte_order,
            Shape::OneDimensional,
        )
    }

    fn new(
        kind: DefinitionKind,
        namespace: Namespace,
        target_name: &str,
        name: &str,
        byte_order: ByteOrder,
        shape: Shape,
    ) -> Self {
        Self {
            kind,
            namespace,
            target_name: target_name.to_ascii_uppercase(),
            name: name.to_ascii_uppercase(),
            byte_order,
            shape,
            description: None,
            source: SourceLocation::default(),
            items: Vec::new(),
            next_offset: 0,
        }
    }

    /// Attach a description. Empty descriptions are dropped.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.description = if description.is_empty() { None } else { Some(description) };
        self
    }

    pub fn with_source(mut self, source: SourceLocation) -> Self {
        self.source = source;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    /// Append a regular item, consuming and returning the builder.
    pub fn append_item(
        mut self,
        name: &str,
        data_type: DataType,
        default: Option<Value>,
        description: Option<String>,
    ) -> Result<Self> {
        self.push_item(name, data_type, default, None, description)?;
        Ok(self)
    }

    /// Append an identity item whose default is its identifying value.
    pub fn append_id_item(
        mut self,
        name: &str,
        data_type: DataType,
        id_value: Value,
        description: Option<String>,
    ) -> Result<Self> {
        self.push_item(name, data_type, None, Some(id_value), description)?;
        Ok(self)
    }

    /// Append an item in place.
    pub fn push_item(
        &mut self,
        name: &str,
        data_type: DataType,
        default: Option<Value>,
        id_value: Option<Value>,
        description: Option<String>,
    ) -> Result<()> {
        let name = name.to_ascii_uppercase();
        if self.items.iter().any(|item| item.name == name) {
            return Err(LogError::invalid_parameter(
                "item name",
                name,
                format!("already defined in {} {}", self.target_name, self.name),
            ));
        }

        let id_value = id_value.map(|v| v.coerce(&data_type)).transpose()?;
        let default = match (default, &id_value) {
            (Some(value), _) => value.coerce(&data_type)?,
            (None, Some(id)) => id.clone(),
            (None, None) => data_type.zero_value(),
        };

        let offset = self.next_offset;
        self.next_offset += data_type.size();
        self.items.push(ItemDefinition {
            name,
            offset,
            data_type,
            default,
            id_value,
            description: description.filter(|d| !d.is_empty()),
        });
        Ok(())
    }

    /// Freeze the builder into a definition without registering it.
    pub fn build(self) -> Definition {
        let item_index: HashMap<String, usize> =
            self.items.iter().enumerate().map(|(i, item)| (item.name.clone(), i)).collect();

        Definition {
            kind: self.kind,
            namespace: self.namespace,
            target_name: self.target_name,
            name: self.name,
            byte_order: self.byte_order,
            shape: self.shape,
            description: self.description,
            source: self.source,
            items: self.items,
            item_index,
            row_length: self.next_offset,
        }
    }

    /// Build and register the definition, recording a warning if it replaces an
    /// existing one.
    pub fn finish(
        self,
        registry: &mut DefinitionRegistry,
        warnings: &mut Vec<String>,
    ) -> Arc<Definition> {
        registry.register(self.build(), warnings)
    }
}
