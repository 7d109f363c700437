//! Registry of loaded definitions

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};

use super::{Definition, Namespace, TABLE_TARGET};
use crate::types::LogType;
use crate::{LogError, Result};

/// Key of a definition: namespace, target and name, all upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DefinitionKey {
    pub namespace: Namespace,
    pub target_name: String,
    pub name: String,
}

impl DefinitionKey {
    pub fn new(namespace: Namespace, target_name: &str, name: &str) -> Self {
        Self {
            namespace,
            target_name: target_name.to_ascii_uppercase(),
            name: name.to_ascii_uppercase(),
        }
    }
}

/// All tables and packets known to the process.
///
/// The registry is filled during a single-threaded load phase and then shared read-only,
/// typically as `Arc<DefinitionRegistry>`. Registration overwrites existing entries;
/// iteration order is sorted by key so identification is deterministic.
#[derive(Debug, Clone, Default)]
pub struct DefinitionRegistry {
    definitions: BTreeMap<DefinitionKey, Arc<Definition>>,
}

impl DefinitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition, replacing any existing one under the same key.
    ///
    /// A replacement pushes `"<Name> redefined."` onto `warnings` and logs it. It is never
    /// an error.
    pub fn register(&mut self, definition: Definition, warnings: &mut Vec<String>) -> Arc<Definition> {
        if let Some(warning) = self.check_for_duplicate(&definition) {
            warnings.push(warning);
        }

        let definition = Arc::new(definition);
        debug!(
            "Registered {} ({} items, {} bytes) from {}",
            definition.display_name(),
            definition.items().len(),
            definition.buffer_length(),
            definition.source()
        );
        self.definitions.insert(definition.key(), Arc::clone(&definition));
        definition
    }

    /// Returns the redefinition warning if `definition` would replace an entry.
    pub fn check_for_duplicate(&self, definition: &Definition) -> Option<String> {
        if self.definitions.contains_key(&definition.key()) {
            let msg = format!("{} redefined.", definition.display_name());
            warn!("{}", msg);
            Some(msg)
        } else {
            None
        }
    }

    pub fn get(&self, namespace: Namespace, target_name: &str, name: &str) -> Option<&Arc<Definition>> {
        self.definitions.get(&DefinitionKey::new(namespace, target_name, name))
    }

    /// Look up a table by name.
    pub fn table(&self, name: &str) -> Result<Arc<Definition>> {
        self.get(Namespace::Table, TABLE_TARGET, name)
            .cloned()
            .ok_or_else(|| LogError::unknown_packet(TABLE_TARGET, name.to_ascii_uppercase()))
    }

    /// Look up a packet in the namespace of `log_type`.
    pub fn packet(&self, log_type: LogType, target_name: &str, packet_name: &str) -> Result<Arc<Definition>> {
        self.get(log_type.into(), target_name, packet_name).cloned().ok_or_else(|| {
            LogError::unknown_packet(
                target_name.to_ascii_uppercase(),
                packet_name.to_ascii_uppercase(),
            )
        })
    }

    /// Definitions of one namespace in key order.
    pub fn definitions(&self, namespace: Namespace) -> impl Iterator<Item = &Arc<Definition>> {
        self.definitions.iter().filter(move |(key, _)| key.namespace == namespace).map(|(_, d)| d)
    }

    /// Identify an encoded buffer by its identity items.
    ///
    /// The first definition in key order that [`Definition::identifies`] the buffer wins.
    pub fn identify(&self, log_type: LogType, bytes: &[u8]) -> Option<Arc<Definition>> {
        self.definitions(log_type.into())
            .find(|definition| definition.identifies(bytes))
            .inspect(|definition| {
                trace!("Identified {} bytes as {}", bytes.len(), definition.display_name())
            })
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
