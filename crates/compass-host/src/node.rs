//! Node and component identity types
//!
//! The host addresses everything by opaque string identifiers. Node ids
//! are only stable within a session; component keys are stable across
//! files and are what the registry stores.

use serde::{Deserialize, Serialize};

/// Opaque node identifier within the current document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl NodeId {
    /// Create a node id from any string-like value
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Stable cross-file component key
///
/// Unlike [`NodeId`], a key survives restarts and identifies the same
/// component (or component set) from any consuming file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentKey(pub String);

impl ComponentKey {
    /// Create a key from any string-like value
    #[inline]
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Borrow the raw key
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ComponentKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Node type as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// A placed, configurable occurrence of a component
    Instance,
    /// A standalone component definition
    Component,
    /// A family of component variants
    ComponentSet,
    /// A grouping frame
    Frame,
    /// A document page
    Page,
    /// Anything else (vectors, text layers, ...)
    Other,
}

/// Lightweight reference to a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRef {
    /// Node identifier
    pub id: NodeId,
    /// Display name
    pub name: String,
    /// Node type
    pub kind: NodeKind,
}

/// Reference to a document page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRef {
    /// Page node identifier
    pub id: NodeId,
    /// Page name
    pub name: String,
}

/// Resolved component (a single variant or standalone component)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRef {
    /// Component node identifier
    pub id: NodeId,
    /// Stable component key
    pub key: ComponentKey,
    /// Component name (variant names encode their property values)
    pub name: String,
}

/// Resolved component set with its variants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentSetRef {
    /// Set node identifier
    pub id: NodeId,
    /// Stable set key
    pub key: ComponentKey,
    /// Set name
    pub name: String,
    /// Member variants, in document order
    pub variants: Vec<ComponentRef>,
    /// The set's designated default variant, if any
    pub default_variant: Option<NodeId>,
}

impl ComponentSetRef {
    /// Find a variant whose name contains `needle` (case-insensitive)
    #[must_use]
    pub fn variant_containing(&self, needle: &str) -> Option<&ComponentRef> {
        let needle = needle.to_lowercase();
        self.variants
            .iter()
            .find(|v| v.name.to_lowercase().contains(&needle))
    }
}

/// A named property value on an instance
///
/// Property names are the host's on-the-wire contract: free-form strings,
/// often carrying punctuation suffixes (`Action Text#12254:9`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// Free text (labels)
    Text(String),
    /// Boolean toggle (icon visibility)
    Bool(bool),
    /// Instance-swap slot holding a component key, or empty
    InstanceRef(Option<String>),
    /// Variant property value
    Variant(String),
}

impl PropertyValue {
    /// Text payload, if this is a text value
    #[inline]
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Instance-swap payload, if this is an instance slot
    #[inline]
    #[must_use]
    pub fn as_instance_ref(&self) -> Option<&str> {
        match self {
            Self::InstanceRef(Some(s)) => Some(s),
            _ => None,
        }
    }
}
