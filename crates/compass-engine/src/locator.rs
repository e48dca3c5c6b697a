//! Instance locator
//!
//! Walks a search scope, classifies instances against the registry, and
//! groups hits by their deprecated component. Classification is key-first;
//! name overlap is only consulted when the registry mapping is confident
//! enough to survive a weak signal.

use crate::config::EngineConfig;
use crate::error::EngineError;
use chrono::{DateTime, Utc};
use compass_host::{ComponentKey, DocumentHost, HostError, NodeKind, NodeRef};
use compass_registry::ComponentRegistry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Which part of the document to search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    /// The current selection only
    Selection,
    /// The current page
    Page,
    /// Every page (forces a full document load first)
    File,
}

/// One located instance of a deprecated component
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FoundInstance {
    /// The instance node
    pub node: NodeRef,
    /// Name of the page containing it
    pub page_name: String,
}

/// All located instances of one deprecated component
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeprecatedComponentGroup {
    /// Stable key of the deprecated component (set key when available)
    pub key: ComponentKey,
    /// Registry name of the component
    pub name: String,
    /// Human-friendly name, if the registry carries one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// When the component was last modified before deprecation
    pub deprecated_date: DateTime<Utc>,
    /// Number of located instances
    pub instance_count: usize,
    /// The located instances
    pub instances: Vec<FoundInstance>,
}

/// Scoped search over the document for deprecated component instances
pub struct InstanceLocator<'a, H> {
    host: &'a H,
    registry: &'a ComponentRegistry,
    config: &'a EngineConfig,
}

impl<'a, H: DocumentHost> InstanceLocator<'a, H> {
    /// Create a locator over a host and registry
    pub fn new(host: &'a H, registry: &'a ComponentRegistry, config: &'a EngineConfig) -> Self {
        Self {
            host,
            registry,
            config,
        }
    }

    /// Find all deprecated component instances in `scope`, grouped
    ///
    /// Detached and otherwise unresolvable instances are excluded without
    /// comment; transient resolution failures are logged and the instance
    /// skipped rather than failing the search.
    pub async fn search(
        &self,
        scope: SearchScope,
    ) -> Result<Vec<DeprecatedComponentGroup>, EngineError> {
        let candidates = self.candidates(scope).await?;
        tracing::debug!(?scope, candidates = candidates.len(), "search started");

        let groups: DashMap<ComponentKey, Vec<FoundInstance>> = DashMap::new();
        futures::future::join_all(candidates.into_iter().map(|node| {
            let groups = &groups;
            async move {
                if node.kind != NodeKind::Instance {
                    return;
                }
                match self.classify(&node).await {
                    Ok(Some(key)) => {
                        let page_name = self
                            .host
                            .page_of(&node.id)
                            .await
                            .map(|p| p.name)
                            .unwrap_or_default();
                        groups
                            .entry(key)
                            .or_default()
                            .push(FoundInstance { node, page_name });
                    }
                    Ok(None) => {}
                    Err(e) if e.is_transient() => {
                        tracing::warn!(node = %node.id, error = %e, "skipping instance, resolution failed transiently");
                    }
                    Err(_) => {}
                }
            }
        }))
        .await;

        let mut result: Vec<DeprecatedComponentGroup> = groups
            .into_iter()
            .filter_map(|(key, mut instances)| {
                let descriptor = self.registry.deprecated_by_key(&key)?;
                instances.sort_by(|a, b| a.node.id.as_str().cmp(b.node.id.as_str()));
                Some(DeprecatedComponentGroup {
                    key,
                    name: descriptor.name.clone(),
                    display_name: descriptor.display_name.clone(),
                    deprecated_date: descriptor.last_modified,
                    instance_count: instances.len(),
                    instances,
                })
            })
            .collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));

        tracing::info!(
            groups = result.len(),
            instances = result.iter().map(|g| g.instance_count).sum::<usize>(),
            "search complete"
        );
        Ok(result)
    }

    async fn candidates(&self, scope: SearchScope) -> Result<Vec<NodeRef>, HostError> {
        match scope {
            SearchScope::Selection => self.host.selection().await,
            SearchScope::Page => {
                let page = self.host.current_page().await?;
                self.host.instances_in_page(&page.id).await
            }
            SearchScope::File => {
                self.host.load_all_pages().await?;
                let mut all = Vec::new();
                for page in self.host.pages().await? {
                    all.extend(self.host.instances_in_page(&page.id).await?);
                }
                Ok(all)
            }
        }
    }

    /// Classify one instance, returning the deprecated key it belongs to
    ///
    /// Both key checks run before any name matching; a registered key is
    /// authoritative and must never lose to a name overlap.
    async fn classify(&self, node: &NodeRef) -> Result<Option<ComponentKey>, HostError> {
        let component = self.host.main_component(&node.id).await?;
        let set = self.host.parent_set(&component.id).await?;

        if let Some(set) = &set {
            if self.registry.is_deprecated_key(&set.key) {
                return Ok(Some(set.key.clone()));
            }
        }
        if self.registry.is_deprecated_key(&component.key) {
            return Ok(Some(component.key));
        }

        if let Some(set) = &set {
            if let Some(key) = self.name_fallback(&set.name) {
                return Ok(Some(key));
            }
        }
        Ok(self.name_fallback(&component.name))
    }

    /// Name-overlap classification, gated by mapping confidence
    fn name_fallback(&self, name: &str) -> Option<ComponentKey> {
        let name = name.to_lowercase();
        for descriptor in self.registry.deprecated_components() {
            let confident = self
                .registry
                .default_mapping_for(&descriptor.key)
                .is_some_and(|m| m.confidence >= self.config.name_fallback_min_confidence);
            if !confident {
                continue;
            }

            let registered = descriptor.name.to_lowercase();
            let overlap = name.contains(&registered) || registered.contains(&name);
            let same_category = name.contains("button") && registered.contains("button");
            if overlap || same_category {
                tracing::debug!(instance_name = %name, component = %descriptor.name, "classified by name fallback");
                return Some(descriptor.key.clone());
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compass_test_utils::{button_fixture, button_set_key, sample_registry, ButtonSpec};
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn groups_by_set_key_and_skips_unrelated() {
        let fixture = button_fixture();
        fixture.add_button(ButtonSpec::new("b1"));
        fixture.add_button(ButtonSpec::new("b2"));
        fixture.add_button(ButtonSpec::new("b3"));
        // detached instance: silently excluded
        fixture.host.add_instance(
            &fixture.page,
            "loose frame instance",
            None,
            BTreeMap::new(),
            BTreeMap::new(),
        );
        // instance of the (non-deprecated) replacement set: never grouped
        let action_variant =
            fixture.host.variant_ids(&compass_test_utils::action_set_key())[0].clone();
        fixture.host.add_instance(
            &fixture.page,
            "already migrated",
            Some(action_variant),
            BTreeMap::new(),
            BTreeMap::new(),
        );

        let registry = sample_registry();
        let config = EngineConfig::default();
        let locator = InstanceLocator::new(&fixture.host, &registry, &config);

        let groups = locator.search(SearchScope::Page).await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, button_set_key());
        assert_eq!(groups[0].instance_count, 3);
        assert_eq!(groups[0].instances.len(), 3);
        assert_eq!(groups[0].display_name.as_deref(), Some("Button"));
    }

    #[tokio::test]
    async fn file_scope_covers_every_page() {
        let fixture = button_fixture();
        fixture.add_button(ButtonSpec::new("front"));
        let second_page = fixture.host.add_page("Page 2");
        let component = fixture.button_variant.clone();
        fixture.host.add_instance(
            &second_page,
            "back",
            Some(component),
            BTreeMap::new(),
            BTreeMap::new(),
        );

        let registry = sample_registry();
        let config = EngineConfig::default();
        let locator = InstanceLocator::new(&fixture.host, &registry, &config);

        let page_only = locator.search(SearchScope::Page).await.unwrap();
        assert_eq!(page_only[0].instance_count, 1);

        let whole_file = locator.search(SearchScope::File).await.unwrap();
        assert_eq!(whole_file[0].instance_count, 2);
    }

    #[tokio::test]
    async fn registered_variant_key_beats_set_name_overlap() {
        use compass_host::PropertyValue;
        use compass_registry::{ComponentDescriptor, ComponentKind};
        use compass_test_utils::{SubInstanceSpec, VariantSpec};

        let fixture = button_fixture();
        // A set whose NAME overlaps the Button entry by category, but
        // whose variant KEY is registered under its own entry.
        fixture.host.add_component_set(
            "shell-set-key",
            "Button Shell",
            vec![VariantSpec {
                key: "cta-variant-key".into(),
                name: "Variant=Default".into(),
                subs: vec![SubInstanceSpec::new(
                    "Base",
                    BTreeMap::<String, PropertyValue>::new(),
                )],
                is_default: true,
            }],
        );
        let cta = fixture.host.variant_ids(&ComponentKey::new("shell-set-key"))[0].clone();
        fixture.host.add_instance(
            &fixture.page,
            "call to action",
            Some(cta),
            BTreeMap::new(),
            BTreeMap::new(),
        );

        let mut registry = sample_registry();
        registry.add_component(ComponentDescriptor {
            id: "cta-deprecated".to_string(),
            name: "CTA (Deprecated)".to_string(),
            display_name: None,
            key: ComponentKey::new("cta-variant-key"),
            kind: ComponentKind::Component,
            deprecated: true,
            last_modified: chrono::Utc::now(),
            file_key: "fixture-library".to_string(),
        });

        let config = EngineConfig::default();
        let locator = InstanceLocator::new(&fixture.host, &registry, &config);

        let groups = locator.search(SearchScope::Page).await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups[0].key,
            ComponentKey::new("cta-variant-key"),
            "the registered key wins over the set-name overlap"
        );
    }

    #[tokio::test]
    async fn name_fallback_is_confidence_gated() {
        let fixture = button_fixture();
        // A standalone component that only matches by the shared
        // "button" category, never by key.
        let lookalike = fixture.host.add_component("unregistered-key", "Button Old");
        fixture.host.add_instance(
            &fixture.page,
            "legacy",
            Some(lookalike),
            BTreeMap::new(),
            BTreeMap::new(),
        );

        let registry = sample_registry(); // mapping confidence 95

        let permissive = EngineConfig::default().with_name_fallback_min_confidence(80);
        let locator = InstanceLocator::new(&fixture.host, &registry, &permissive);
        let groups = locator.search(SearchScope::Page).await.unwrap();
        assert_eq!(groups.len(), 1, "name fallback classified the lookalike");
        assert_eq!(groups[0].instance_count, 1);

        let strict = EngineConfig::default().with_name_fallback_min_confidence(99);
        let locator = InstanceLocator::new(&fixture.host, &registry, &strict);
        let groups = locator.search(SearchScope::Page).await.unwrap();
        assert!(groups.is_empty(), "fallback disabled below the gate");
    }

    #[tokio::test]
    async fn selection_scope_only_sees_selected() {
        let fixture = button_fixture();
        let selected = fixture.add_button(ButtonSpec::new("picked"));
        fixture.add_button(ButtonSpec::new("ignored"));
        fixture.host.select(vec![selected]);

        let registry = sample_registry();
        let config = EngineConfig::default();
        let locator = InstanceLocator::new(&fixture.host, &registry, &config);

        let groups = locator.search(SearchScope::Selection).await.unwrap();
        assert_eq!(groups[0].instance_count, 1);
        assert_eq!(groups[0].instances[0].node.name, "picked");
    }
}
