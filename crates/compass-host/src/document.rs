//! Document tree capability interface

use crate::error::HostError;
use crate::node::{
    ComponentKey, ComponentRef, ComponentSetRef, NodeId, NodeRef, PageRef, PropertyValue,
};
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Access to the host's document tree
///
/// All mutation happens through this trait. The host serializes actual
/// mutations internally; callers may issue calls concurrently but must
/// treat every returned node reference as invalidated by a later
/// [`swap`](DocumentHost::swap) on an ancestor.
#[async_trait]
pub trait DocumentHost: Send + Sync {
    /// Currently selected nodes
    async fn selection(&self) -> Result<Vec<NodeRef>, HostError>;

    /// The page the user is looking at
    async fn current_page(&self) -> Result<PageRef, HostError>;

    /// Force-load every page
    ///
    /// Cross-page access may be lazy; this must be called before
    /// enumerating nodes outside the current page.
    async fn load_all_pages(&self) -> Result<(), HostError>;

    /// All pages in the document (requires [`load_all_pages`](DocumentHost::load_all_pages))
    async fn pages(&self) -> Result<Vec<PageRef>, HostError>;

    /// All instance nodes on a page, including nested ones
    async fn instances_in_page(&self, page: &NodeId) -> Result<Vec<NodeRef>, HostError>;

    /// Nested sub-instances of a node, root instance first
    async fn descendant_instances(&self, node: &NodeId) -> Result<Vec<NodeRef>, HostError>;

    /// Display name of a node
    async fn node_name(&self, node: &NodeId) -> Result<String, HostError>;

    /// The page containing a node
    async fn page_of(&self, node: &NodeId) -> Result<PageRef, HostError>;

    /// Resolve an instance's originating component
    ///
    /// Resolution happens over a remote/cached component graph and may
    /// fail transiently.
    async fn main_component(&self, instance: &NodeId) -> Result<ComponentRef, HostError>;

    /// The component set a component belongs to, if it is a variant
    async fn parent_set(&self, component: &NodeId)
        -> Result<Option<ComponentSetRef>, HostError>;

    /// An instance's variant properties (`Size`, `State`, ...)
    async fn variant_properties(
        &self,
        instance: &NodeId,
    ) -> Result<BTreeMap<String, String>, HostError>;

    /// An instance's free-form component properties
    async fn component_properties(
        &self,
        instance: &NodeId,
    ) -> Result<BTreeMap<String, PropertyValue>, HostError>;

    /// Read one named property
    async fn get_property(
        &self,
        instance: &NodeId,
        name: &str,
    ) -> Result<PropertyValue, HostError>;

    /// Write one named property
    async fn set_property(
        &self,
        instance: &NodeId,
        name: &str,
        value: PropertyValue,
    ) -> Result<(), HostError>;

    /// Replace the instance's underlying component
    ///
    /// Invalidates all previously obtained references to the instance's
    /// descendants. They must be re-discovered afterwards.
    async fn swap(&self, instance: &NodeId, component: &NodeId) -> Result<(), HostError>;

    /// Import a component set from another file by its stable key
    async fn import_component_set(
        &self,
        key: &ComponentKey,
    ) -> Result<ComponentSetRef, HostError>;
}
