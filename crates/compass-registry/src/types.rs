//! Registry data model

use chrono::{DateTime, Utc};
use compass_host::ComponentKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mappings below this confidence must not be auto-validated
pub const VALIDATION_THRESHOLD: u8 = 50;

/// Whether an entry describes a component or a component set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    /// Standalone component
    Component,
    /// Family of variants
    ComponentSet,
}

/// Identifies a component or component set by its stable key
///
/// Created by registry authoring/regeneration; immutable at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDescriptor {
    /// Registry-local identifier
    pub id: String,
    /// Full component name as published
    pub name: String,
    /// Human-friendly name, when the published name carries markers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Stable key, unique within the source file
    pub key: ComponentKey,
    /// Component or component set
    #[serde(rename = "type")]
    pub kind: ComponentKind,
    /// Whether this entry is deprecated
    #[serde(default)]
    pub deprecated: bool,
    /// Last modification timestamp from the source file
    pub last_modified: DateTime<Utc>,
    /// Key of the file publishing this component
    pub file_key: String,
}

/// Validation lifecycle of a mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    /// Authored but not yet reviewed
    Pending,
    /// Reviewed and approved for migration
    Validated,
    /// Reviewed and rejected
    Rejected,
}

/// One side of a mapping (source or target component identity)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEndpoint {
    /// Registry-local identifier
    pub id: String,
    /// Component name
    pub name: String,
    /// Stable component key
    pub key: ComponentKey,
}

/// How one source property translates to a target property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyMapping {
    /// Target property name
    pub target_property: String,
    /// Named transform to apply, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<String>,
    /// Authoring note
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Replacement mapping from a deprecated source to a current target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentMapping {
    /// Deprecated source component
    pub source_component: MappingEndpoint,
    /// Replacement target component (must be non-deprecated)
    pub target_component: MappingEndpoint,
    /// Per-property translations
    #[serde(default)]
    pub property_mappings: BTreeMap<String, PropertyMapping>,
    /// Authoring confidence, 0-100
    pub confidence: u8,
    /// Validation lifecycle state
    pub validation_status: ValidationStatus,
    /// When the mapping was last validated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_validated: Option<DateTime<Utc>>,
    /// Free-form notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ComponentMapping {
    /// Whether the mapping has been reviewed and approved
    #[inline]
    #[must_use]
    pub fn is_validated(&self) -> bool {
        self.validation_status == ValidationStatus::Validated
    }

    /// Whether confidence meets the auto-validation threshold
    #[inline]
    #[must_use]
    pub fn meets_threshold(&self) -> bool {
        self.confidence >= VALIDATION_THRESHOLD
    }
}

/// Derived counts over the registry contents
///
/// Always recomputed on write; never hand-edited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryMetadata {
    /// Number of descriptors
    pub total_components: usize,
    /// Number of deprecated descriptors
    pub deprecated_components: usize,
    /// Number of validated mappings
    pub validated_mappings: usize,
    /// Number of pending mappings
    pub pending_mappings: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_serde_uses_camel_case() {
        let json = r#"{
            "id": "button-deprecated",
            "name": "Button (Deprecated)",
            "displayName": "Button",
            "key": "8f646f204ad2",
            "type": "component_set",
            "deprecated": true,
            "lastModified": "2024-03-01T00:00:00Z",
            "fileKey": "file-key"
        }"#;

        let descriptor: ComponentDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(descriptor.kind, ComponentKind::ComponentSet);
        assert!(descriptor.deprecated);
        assert_eq!(descriptor.display_name.as_deref(), Some("Button"));
    }

    #[test]
    fn threshold_check() {
        let mapping = ComponentMapping {
            source_component: MappingEndpoint {
                id: "a".into(),
                name: "A".into(),
                key: ComponentKey::new("ka"),
            },
            target_component: MappingEndpoint {
                id: "b".into(),
                name: "B".into(),
                key: ComponentKey::new("kb"),
            },
            property_mappings: BTreeMap::new(),
            confidence: 49,
            validation_status: ValidationStatus::Pending,
            last_validated: None,
            notes: None,
        };

        assert!(!mapping.meets_threshold());
        assert!(!mapping.is_validated());
    }
}
