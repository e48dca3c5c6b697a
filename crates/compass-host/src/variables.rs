//! Variable collection capability interface
//!
//! Theme/brand modes live in variable collections. A collection that is
//! not local can be reached by importing any of its variables ("bridge"
//! variables), which establishes local access to the whole collection.

use crate::error::HostError;
use crate::node::NodeId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A named mode within a variable collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableMode {
    /// Mode identifier
    #[serde(rename = "modeId")]
    pub id: String,
    /// Mode name (e.g. `Brand - Light`)
    pub name: String,
}

/// A variable collection and its modes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableCollection {
    /// Collection identifier
    pub id: String,
    /// Collection name
    pub name: String,
    /// Available modes
    pub modes: Vec<VariableMode>,
}

impl VariableCollection {
    /// Find a mode by exact name
    #[inline]
    #[must_use]
    pub fn mode_named(&self, name: &str) -> Option<&VariableMode> {
        self.modes.iter().find(|m| m.name == name)
    }
}

/// A single variable, locally accessible after import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableRef {
    /// Variable identifier
    pub id: String,
    /// Stable cross-file key
    pub key: String,
    /// Variable name
    pub name: String,
    /// Owning collection identifier
    #[serde(rename = "variableCollectionId")]
    pub collection_id: String,
}

/// A variable collection shared through a team library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryCollection {
    /// Stable collection key
    pub key: String,
    /// Collection name
    pub name: String,
    /// Name of the publishing library
    pub library_name: String,
}

/// A variable inside a library collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryVariable {
    /// Stable variable key (importable)
    pub key: String,
    /// Variable name
    pub name: String,
}

/// Access to the host's variable collections
#[async_trait]
pub trait VariableHost: Send + Sync {
    /// Variable collections local to the current file
    async fn local_collections(&self) -> Result<Vec<VariableCollection>, HostError>;

    /// Import a variable by key, establishing access to its collection
    async fn import_variable(&self, key: &str) -> Result<VariableRef, HostError>;

    /// Resolve the collection owning an imported variable
    async fn collection_of(&self, variable_id: &str) -> Result<VariableCollection, HostError>;

    /// Bind a collection mode on an instance
    async fn set_explicit_mode(
        &self,
        instance: &NodeId,
        collection_id: &str,
        mode_id: &str,
    ) -> Result<(), HostError>;

    /// Variable collections shared by enabled team libraries
    async fn library_collections(&self) -> Result<Vec<LibraryCollection>, HostError>;

    /// Variables inside a library collection
    async fn library_variables(
        &self,
        collection_key: &str,
    ) -> Result<Vec<LibraryVariable>, HostError>;
}
