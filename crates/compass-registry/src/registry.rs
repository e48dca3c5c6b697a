//! Registry container with JSON persistence

use crate::error::RegistryError;
use crate::types::{
    ComponentDescriptor, ComponentMapping, RegistryMetadata, ValidationStatus,
    VALIDATION_THRESHOLD,
};
use chrono::Utc;
use compass_host::ComponentKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// The component registry: descriptors, mappings, derived metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRegistry {
    /// Schema version
    pub version: String,
    /// Timestamp of the last write
    pub last_updated: chrono::DateTime<Utc>,
    /// Descriptors by registry-local id
    pub components: BTreeMap<String, ComponentDescriptor>,
    /// Replacement mappings
    pub mappings: Vec<ComponentMapping>,
    /// Derived counts, recomputed on every write
    pub metadata: RegistryMetadata,
}

impl ComponentRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn empty() -> Self {
        Self {
            version: "1.0.0".to_string(),
            last_updated: Utc::now(),
            components: BTreeMap::new(),
            mappings: Vec::new(),
            metadata: RegistryMetadata::default(),
        }
    }

    /// Parse a registry from a JSON string
    ///
    /// Metadata is recounted after parsing so a stale file cannot carry
    /// wrong counts into a running engine.
    pub fn from_json_str(json: &str) -> Result<Self, RegistryError> {
        let mut registry: Self = serde_json::from_str(json)?;
        registry.recount();
        Ok(registry)
    }

    /// Load a registry file, creating an empty one if it does not exist
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        match tokio::fs::read_to_string(path).await {
            Ok(data) => Self::from_json_str(&data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "registry file missing, starting empty");
                Ok(Self::empty())
            }
            Err(e) => Err(RegistryError::Io(e)),
        }
    }

    /// Write the registry to disk, refreshing `last_updated` and metadata
    pub async fn save(&mut self, path: impl AsRef<Path>) -> Result<(), RegistryError> {
        self.last_updated = Utc::now();
        self.recount();

        let json = serde_json::to_string_pretty(self)?;
        if let Some(dir) = path.as_ref().parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(path.as_ref(), json).await?;
        Ok(())
    }

    /// Recompute derived metadata from the current contents
    pub fn recount(&mut self) {
        self.metadata = RegistryMetadata {
            total_components: self.components.len(),
            deprecated_components: self.components.values().filter(|c| c.deprecated).count(),
            validated_mappings: self
                .mappings
                .iter()
                .filter(|m| m.validation_status == ValidationStatus::Validated)
                .count(),
            pending_mappings: self
                .mappings
                .iter()
                .filter(|m| m.validation_status == ValidationStatus::Pending)
                .count(),
        };
    }

    /// Insert or replace a descriptor
    pub fn add_component(&mut self, component: ComponentDescriptor) {
        self.components.insert(component.id.clone(), component);
        self.recount();
    }

    /// Apply a closure to an existing descriptor
    pub fn update_component(
        &mut self,
        id: &str,
        update: impl FnOnce(&mut ComponentDescriptor),
    ) -> Result<(), RegistryError> {
        let component = self
            .components
            .get_mut(id)
            .ok_or_else(|| RegistryError::ComponentNotFound(id.to_string()))?;
        update(component);
        self.recount();
        Ok(())
    }

    /// Add a mapping after checking the non-deprecated-target invariant
    pub fn add_mapping(&mut self, mapping: ComponentMapping) -> Result<(), RegistryError> {
        if let Some(target) = self.components.get(&mapping.target_component.id) {
            if target.deprecated {
                return Err(RegistryError::DeprecatedTarget(target.id.clone()));
            }
        }
        self.mappings.push(mapping);
        self.recount();
        Ok(())
    }

    /// Mark a mapping validated
    ///
    /// Refused when confidence is below [`VALIDATION_THRESHOLD`].
    pub fn validate_mapping(&mut self, index: usize) -> Result<(), RegistryError> {
        let mapping = self
            .mappings
            .get_mut(index)
            .ok_or(RegistryError::InvalidMappingIndex(index))?;
        if mapping.confidence < VALIDATION_THRESHOLD {
            return Err(RegistryError::ConfidenceTooLow {
                confidence: mapping.confidence,
                threshold: VALIDATION_THRESHOLD,
            });
        }
        mapping.validation_status = ValidationStatus::Validated;
        mapping.last_validated = Some(Utc::now());
        self.recount();
        Ok(())
    }

    /// Descriptor by registry-local id
    #[inline]
    #[must_use]
    pub fn component(&self, id: &str) -> Option<&ComponentDescriptor> {
        self.components.get(id)
    }

    /// All deprecated descriptors
    pub fn deprecated_components(&self) -> impl Iterator<Item = &ComponentDescriptor> {
        self.components.values().filter(|c| c.deprecated)
    }

    /// Deprecated descriptor matching a component key, if any
    #[must_use]
    pub fn deprecated_by_key(&self, key: &ComponentKey) -> Option<&ComponentDescriptor> {
        self.components
            .values()
            .find(|c| c.deprecated && &c.key == key)
    }

    /// Whether a key belongs to a deprecated entry
    #[inline]
    #[must_use]
    pub fn is_deprecated_key(&self, key: &ComponentKey) -> bool {
        self.deprecated_by_key(key).is_some()
    }

    /// Mappings originating from a source component id
    pub fn mappings_by_source<'a>(
        &'a self,
        source_id: &'a str,
    ) -> impl Iterator<Item = &'a ComponentMapping> + 'a {
        self.mappings
            .iter()
            .filter(move |m| m.source_component.id == source_id)
    }

    /// Mappings pointing at a target component id
    pub fn mappings_by_target<'a>(
        &'a self,
        target_id: &'a str,
    ) -> impl Iterator<Item = &'a ComponentMapping> + 'a {
        self.mappings
            .iter()
            .filter(move |m| m.target_component.id == target_id)
    }

    /// Mappings awaiting review
    pub fn pending_mappings(&self) -> impl Iterator<Item = &ComponentMapping> {
        self.mappings
            .iter()
            .filter(|m| m.validation_status == ValidationStatus::Pending)
    }

    /// The default (validated) mapping for a deprecated source key
    ///
    /// Used by the migration engine when a request does not name an
    /// explicit target.
    #[must_use]
    pub fn default_mapping_for(&self, source_key: &ComponentKey) -> Option<&ComponentMapping> {
        self.mappings
            .iter()
            .filter(|m| &m.source_component.key == source_key)
            .find(|m| m.is_validated())
            .or_else(|| {
                self.mappings
                    .iter()
                    .find(|m| &m.source_component.key == source_key)
            })
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::empty()
    }
}
