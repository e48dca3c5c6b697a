//! In-memory host implementation
//!
//! Models just enough of a design document for engine tests: pages, placed
//! instances with nested sub-instances, component sets with variant
//! templates, importable sets, and variable collections. Swapping an
//! instance rebuilds its sub-instances with fresh ids, so references
//! captured before the swap die exactly like they do against the real
//! host.

use async_trait::async_trait;
use compass_host::{
    ComponentKey, ComponentRef, ComponentSetRef, DocumentHost, HostError, LibraryCollection,
    LibraryVariable, NodeId, NodeKind, NodeRef, PageRef, PropertyValue, VariableCollection,
    VariableHost, VariableRef,
};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};

/// Template for one nested sub-instance of a variant
#[derive(Debug, Clone)]
pub struct SubInstanceSpec {
    pub name: String,
    pub properties: BTreeMap<String, PropertyValue>,
}

impl SubInstanceSpec {
    pub fn new(name: impl Into<String>, properties: BTreeMap<String, PropertyValue>) -> Self {
        Self {
            name: name.into(),
            properties,
        }
    }
}

/// One variant of a component set
#[derive(Debug, Clone)]
pub struct VariantSpec {
    pub key: String,
    pub name: String,
    pub subs: Vec<SubInstanceSpec>,
    pub is_default: bool,
}

#[derive(Debug, Clone)]
struct Component {
    id: NodeId,
    key: ComponentKey,
    name: String,
    set: Option<NodeId>,
    template: Vec<SubInstanceSpec>,
}

#[derive(Debug, Clone)]
struct Set {
    id: NodeId,
    key: ComponentKey,
    name: String,
    variants: Vec<NodeId>,
    default_variant: Option<NodeId>,
}

#[derive(Debug, Clone)]
struct SubInstance {
    id: NodeId,
    name: String,
    properties: BTreeMap<String, PropertyValue>,
}

#[derive(Debug, Clone)]
struct Instance {
    id: NodeId,
    name: String,
    page: NodeId,
    main_component: Option<NodeId>,
    variant_props: BTreeMap<String, String>,
    properties: BTreeMap<String, PropertyValue>,
    subs: Vec<SubInstance>,
}

#[derive(Debug, Default)]
struct State {
    pages: Vec<PageRef>,
    pages_loaded: bool,
    selection: Vec<NodeId>,
    instances: Vec<Instance>,
    components: HashMap<NodeId, Component>,
    sets: HashMap<NodeId, Set>,
    importable_sets: HashMap<ComponentKey, NodeId>,
    next_id: u64,
    local_collections: Vec<VariableCollection>,
    importable_variables: HashMap<String, (VariableRef, VariableCollection)>,
    library: Vec<(LibraryCollection, Vec<LibraryVariable>)>,
    applied_modes: HashMap<(NodeId, String), String>,
    // property name -> remaining failures before a set succeeds
    set_failures: HashMap<String, u32>,
}

/// In-memory [`DocumentHost`] + [`VariableHost`] with scriptable faults
#[derive(Debug)]
pub struct FakeHost {
    state: Mutex<State>,
}

impl FakeHost {
    pub fn new() -> Self {
        let host = Self {
            state: Mutex::new(State::default()),
        };
        host.add_page("Page 1");
        host
    }

    fn fresh_id(state: &mut State) -> NodeId {
        state.next_id += 1;
        NodeId::new(format!("{}:{}", state.next_id / 1000, state.next_id % 1000))
    }

    pub fn add_page(&self, name: impl Into<String>) -> NodeId {
        let mut state = self.state.lock();
        let id = Self::fresh_id(&mut state);
        state.pages.push(PageRef {
            id: id.clone(),
            name: name.into(),
        });
        id
    }

    /// Register a component set whose variants can be swapped to.
    ///
    /// The set is importable by key; its variant components are created
    /// alongside it.
    pub fn add_component_set(
        &self,
        key: impl Into<String>,
        name: impl Into<String>,
        variants: Vec<VariantSpec>,
    ) -> NodeId {
        let mut state = self.state.lock();
        let set_id = Self::fresh_id(&mut state);
        let key = ComponentKey::new(key);

        let mut variant_ids = Vec::new();
        let mut default_variant = None;
        for spec in variants {
            let variant_id = Self::fresh_id(&mut state);
            if spec.is_default {
                default_variant = Some(variant_id.clone());
            }
            state.components.insert(
                variant_id.clone(),
                Component {
                    id: variant_id.clone(),
                    key: ComponentKey::new(spec.key),
                    name: spec.name,
                    set: Some(set_id.clone()),
                    template: spec.subs,
                },
            );
            variant_ids.push(variant_id);
        }

        state.sets.insert(
            set_id.clone(),
            Set {
                id: set_id.clone(),
                key: key.clone(),
                name: name.into(),
                variants: variant_ids,
                default_variant,
            },
        );
        state.importable_sets.insert(key, set_id.clone());
        set_id
    }

    /// Register a standalone component (e.g. an icon)
    pub fn add_component(&self, key: impl Into<String>, name: impl Into<String>) -> NodeId {
        let mut state = self.state.lock();
        let id = Self::fresh_id(&mut state);
        state.components.insert(
            id.clone(),
            Component {
                id: id.clone(),
                key: ComponentKey::new(key),
                name: name.into(),
                set: None,
                template: Vec::new(),
            },
        );
        id
    }

    /// Place an instance of a component on a page
    pub fn add_instance(
        &self,
        page: &NodeId,
        name: impl Into<String>,
        main_component: Option<NodeId>,
        variant_props: BTreeMap<String, String>,
        properties: BTreeMap<String, PropertyValue>,
    ) -> NodeId {
        let mut state = self.state.lock();
        let id = Self::fresh_id(&mut state);
        let subs = main_component
            .as_ref()
            .and_then(|c| state.components.get(c).cloned())
            .map(|c| c.template)
            .unwrap_or_default();
        let subs = subs
            .into_iter()
            .map(|spec| SubInstance {
                id: Self::fresh_id(&mut state),
                name: spec.name,
                properties: spec.properties,
            })
            .collect();
        state.instances.push(Instance {
            id: id.clone(),
            name: name.into(),
            page: page.clone(),
            main_component,
            variant_props,
            properties,
            subs,
        });
        id
    }

    pub fn select(&self, ids: Vec<NodeId>) {
        self.state.lock().selection = ids;
    }

    /// Make the next `times` writes to `property` fail with a stale error
    ///
    /// Pass `u32::MAX` to fail every attempt.
    pub fn fail_set_property(&self, property: impl Into<String>, times: u32) {
        self.state.lock().set_failures.insert(property.into(), times);
    }

    pub fn add_local_collection(&self, collection: VariableCollection) {
        self.state.lock().local_collections.push(collection);
    }

    /// Register a variable that `import_variable` can resolve
    ///
    /// Importing it makes `collection` reachable via `collection_of`.
    pub fn add_importable_variable(&self, variable: VariableRef, collection: VariableCollection) {
        self.state
            .lock()
            .importable_variables
            .insert(variable.key.clone(), (variable, collection));
    }

    /// Register a team-library collection with importable variables
    pub fn add_library_collection(
        &self,
        listing: LibraryCollection,
        variables: Vec<LibraryVariable>,
        backing: VariableCollection,
    ) {
        let mut state = self.state.lock();
        for var in &variables {
            let var_ref = VariableRef {
                id: format!("imported-{}", var.key),
                key: var.key.clone(),
                name: var.name.clone(),
                collection_id: backing.id.clone(),
            };
            state
                .importable_variables
                .insert(var.key.clone(), (var_ref, backing.clone()));
        }
        state.library.push((listing, variables));
    }

    // ---- assertion helpers ----

    /// Id of the first page (created by `new`)
    pub fn first_page(&self) -> NodeId {
        self.state.lock().pages[0].id.clone()
    }

    /// Variant component ids of an importable set, in declaration order
    pub fn variant_ids(&self, key: &ComponentKey) -> Vec<NodeId> {
        let state = self.state.lock();
        state
            .importable_sets
            .get(key)
            .and_then(|set_id| state.sets.get(set_id))
            .map(|set| set.variants.clone())
            .unwrap_or_default()
    }

    /// Current value of `name` anywhere in the instance's subtree
    pub fn property_on_subtree(&self, root: &NodeId, name: &str) -> Option<PropertyValue> {
        let state = self.state.lock();
        let instance = state.instances.iter().find(|i| &i.id == root)?;
        if let Some(value) = instance.properties.get(name) {
            return Some(value.clone());
        }
        instance
            .subs
            .iter()
            .find_map(|s| s.properties.get(name).cloned())
    }

    pub fn main_component_id(&self, instance: &NodeId) -> Option<NodeId> {
        let state = self.state.lock();
        state
            .instances
            .iter()
            .find(|i| &i.id == instance)
            .and_then(|i| i.main_component.clone())
    }

    pub fn applied_mode(&self, instance: &NodeId, collection_id: &str) -> Option<String> {
        self.state
            .lock()
            .applied_modes
            .get(&(instance.clone(), collection_id.to_string()))
            .cloned()
    }

    fn component_ref(component: &Component) -> ComponentRef {
        ComponentRef {
            id: component.id.clone(),
            key: component.key.clone(),
            name: component.name.clone(),
        }
    }

    fn set_ref(state: &State, set: &Set) -> ComponentSetRef {
        ComponentSetRef {
            id: set.id.clone(),
            key: set.key.clone(),
            name: set.name.clone(),
            variants: set
                .variants
                .iter()
                .filter_map(|v| state.components.get(v))
                .map(Self::component_ref)
                .collect(),
            default_variant: set.default_variant.clone(),
        }
    }
}

impl Default for FakeHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentHost for FakeHost {
    async fn selection(&self) -> Result<Vec<NodeRef>, HostError> {
        let state = self.state.lock();
        Ok(state
            .selection
            .iter()
            .filter_map(|id| state.instances.iter().find(|i| &i.id == id))
            .map(|i| NodeRef {
                id: i.id.clone(),
                name: i.name.clone(),
                kind: NodeKind::Instance,
            })
            .collect())
    }

    async fn current_page(&self) -> Result<PageRef, HostError> {
        self.state
            .lock()
            .pages
            .first()
            .cloned()
            .ok_or_else(|| HostError::NotFound("no pages".to_string()))
    }

    async fn load_all_pages(&self) -> Result<(), HostError> {
        self.state.lock().pages_loaded = true;
        Ok(())
    }

    async fn pages(&self) -> Result<Vec<PageRef>, HostError> {
        let state = self.state.lock();
        if !state.pages_loaded {
            return Err(HostError::Unsupported(
                "pages not loaded; call load_all_pages first".to_string(),
            ));
        }
        Ok(state.pages.clone())
    }

    async fn instances_in_page(&self, page: &NodeId) -> Result<Vec<NodeRef>, HostError> {
        let state = self.state.lock();
        Ok(state
            .instances
            .iter()
            .filter(|i| &i.page == page)
            .map(|i| NodeRef {
                id: i.id.clone(),
                name: i.name.clone(),
                kind: NodeKind::Instance,
            })
            .collect())
    }

    async fn descendant_instances(&self, node: &NodeId) -> Result<Vec<NodeRef>, HostError> {
        let state = self.state.lock();
        let instance = state
            .instances
            .iter()
            .find(|i| &i.id == node)
            .ok_or_else(|| HostError::NotFound(node.to_string()))?;
        let mut out = vec![NodeRef {
            id: instance.id.clone(),
            name: instance.name.clone(),
            kind: NodeKind::Instance,
        }];
        out.extend(instance.subs.iter().map(|s| NodeRef {
            id: s.id.clone(),
            name: s.name.clone(),
            kind: NodeKind::Instance,
        }));
        Ok(out)
    }

    async fn node_name(&self, node: &NodeId) -> Result<String, HostError> {
        let state = self.state.lock();
        state
            .instances
            .iter()
            .find(|i| &i.id == node)
            .map(|i| i.name.clone())
            .ok_or_else(|| HostError::NotFound(node.to_string()))
    }

    async fn page_of(&self, node: &NodeId) -> Result<PageRef, HostError> {
        let state = self.state.lock();
        let instance = state
            .instances
            .iter()
            .find(|i| &i.id == node)
            .ok_or_else(|| HostError::NotFound(node.to_string()))?;
        state
            .pages
            .iter()
            .find(|p| p.id == instance.page)
            .cloned()
            .ok_or_else(|| HostError::NotFound(instance.page.to_string()))
    }

    async fn main_component(&self, instance: &NodeId) -> Result<ComponentRef, HostError> {
        let state = self.state.lock();
        let node = state
            .instances
            .iter()
            .find(|i| &i.id == instance)
            .ok_or_else(|| HostError::NotFound(instance.to_string()))?;
        let component_id = node
            .main_component
            .as_ref()
            .ok_or_else(|| HostError::NotFound(format!("{instance} is detached")))?;
        state
            .components
            .get(component_id)
            .map(Self::component_ref)
            .ok_or_else(|| HostError::NotFound(component_id.to_string()))
    }

    async fn parent_set(
        &self,
        component: &NodeId,
    ) -> Result<Option<ComponentSetRef>, HostError> {
        let state = self.state.lock();
        let comp = state
            .components
            .get(component)
            .ok_or_else(|| HostError::NotFound(component.to_string()))?;
        Ok(comp
            .set
            .as_ref()
            .and_then(|set_id| state.sets.get(set_id))
            .map(|set| Self::set_ref(&state, set)))
    }

    async fn variant_properties(
        &self,
        instance: &NodeId,
    ) -> Result<BTreeMap<String, String>, HostError> {
        let state = self.state.lock();
        state
            .instances
            .iter()
            .find(|i| &i.id == instance)
            .map(|i| i.variant_props.clone())
            .ok_or_else(|| HostError::NotFound(instance.to_string()))
    }

    async fn component_properties(
        &self,
        instance: &NodeId,
    ) -> Result<BTreeMap<String, PropertyValue>, HostError> {
        let state = self.state.lock();
        if let Some(node) = state.instances.iter().find(|i| &i.id == instance) {
            return Ok(node.properties.clone());
        }
        for node in &state.instances {
            if let Some(sub) = node.subs.iter().find(|s| &s.id == instance) {
                return Ok(sub.properties.clone());
            }
        }
        Err(HostError::NotFound(instance.to_string()))
    }

    async fn get_property(
        &self,
        instance: &NodeId,
        name: &str,
    ) -> Result<PropertyValue, HostError> {
        let props = self.component_properties(instance).await?;
        props
            .get(name)
            .cloned()
            .ok_or_else(|| HostError::PropertyNotFound(name.to_string()))
    }

    async fn set_property(
        &self,
        instance: &NodeId,
        name: &str,
        value: PropertyValue,
    ) -> Result<(), HostError> {
        let mut state = self.state.lock();

        if let Some(remaining) = state.set_failures.get_mut(name) {
            if *remaining > 0 {
                *remaining = remaining.saturating_sub(1);
                return Err(HostError::Stale(format!(
                    "stale reference while setting {name}"
                )));
            }
        }

        for node in &mut state.instances {
            if &node.id == instance {
                if let Some(slot) = node.properties.get_mut(name) {
                    *slot = value;
                    return Ok(());
                }
                return Err(HostError::PropertyNotFound(name.to_string()));
            }
            if let Some(sub) = node.subs.iter_mut().find(|s| &s.id == instance) {
                if let Some(slot) = sub.properties.get_mut(name) {
                    *slot = value;
                    return Ok(());
                }
                return Err(HostError::PropertyNotFound(name.to_string()));
            }
        }
        Err(HostError::NotFound(instance.to_string()))
    }

    async fn swap(&self, instance: &NodeId, component: &NodeId) -> Result<(), HostError> {
        let mut state = self.state.lock();
        let template = state
            .components
            .get(component)
            .ok_or_else(|| HostError::NotFound(component.to_string()))?
            .template
            .clone();

        let subs: Vec<SubInstance> = template
            .into_iter()
            .map(|spec| SubInstance {
                id: Self::fresh_id(&mut state),
                name: spec.name,
                properties: spec.properties,
            })
            .collect();

        let node = state
            .instances
            .iter_mut()
            .find(|i| &i.id == instance)
            .ok_or_else(|| HostError::NotFound(instance.to_string()))?;
        node.main_component = Some(component.clone());
        // Old sub-instance ids are gone: captured references go stale.
        node.subs = subs;
        node.properties.clear();
        Ok(())
    }

    async fn import_component_set(
        &self,
        key: &ComponentKey,
    ) -> Result<ComponentSetRef, HostError> {
        let state = self.state.lock();
        let set_id = state
            .importable_sets
            .get(key)
            .ok_or_else(|| HostError::ImportFailed(key.to_string()))?;
        let set = state
            .sets
            .get(set_id)
            .ok_or_else(|| HostError::ImportFailed(key.to_string()))?;
        Ok(Self::set_ref(&state, set))
    }
}

#[async_trait]
impl VariableHost for FakeHost {
    async fn local_collections(&self) -> Result<Vec<VariableCollection>, HostError> {
        Ok(self.state.lock().local_collections.clone())
    }

    async fn import_variable(&self, key: &str) -> Result<VariableRef, HostError> {
        self.state
            .lock()
            .importable_variables
            .get(key)
            .map(|(var, _)| var.clone())
            .ok_or_else(|| HostError::ImportFailed(key.to_string()))
    }

    async fn collection_of(&self, variable_id: &str) -> Result<VariableCollection, HostError> {
        self.state
            .lock()
            .importable_variables
            .values()
            .find(|(var, _)| var.id == variable_id)
            .map(|(_, collection)| collection.clone())
            .ok_or_else(|| HostError::NotFound(variable_id.to_string()))
    }

    async fn set_explicit_mode(
        &self,
        instance: &NodeId,
        collection_id: &str,
        mode_id: &str,
    ) -> Result<(), HostError> {
        let mut state = self.state.lock();
        if !state.instances.iter().any(|i| &i.id == instance) {
            return Err(HostError::NotFound(instance.to_string()));
        }
        state.applied_modes.insert(
            (instance.clone(), collection_id.to_string()),
            mode_id.to_string(),
        );
        Ok(())
    }

    async fn library_collections(&self) -> Result<Vec<LibraryCollection>, HostError> {
        Ok(self
            .state
            .lock()
            .library
            .iter()
            .map(|(listing, _)| listing.clone())
            .collect())
    }

    async fn library_variables(
        &self,
        collection_key: &str,
    ) -> Result<Vec<LibraryVariable>, HostError> {
        self.state
            .lock()
            .library
            .iter()
            .find(|(listing, _)| listing.key == collection_key)
            .map(|(_, vars)| vars.clone())
            .ok_or_else(|| HostError::NotFound(collection_key.to_string()))
    }
}
