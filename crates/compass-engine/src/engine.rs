//! Migration engine
//!
//! Drives one instance through the migration phases: capture the source
//! configuration, resolve and import the replacement set, pick a variant,
//! swap, then apply properties, icon, and theme. The swap is the point of
//! no return; everything after it is recoverable and degrades to warnings
//! on the outcome.

use crate::config::EngineConfig;
use crate::error::MigrationError;
use crate::remote::VariablesApi;
use crate::setter::PropertySetter;
use crate::subtree::SubtreeView;
use crate::theme::{ThemeContext, ThemeResolver};
use compass_host::{
    ComponentKey, ComponentRef, ComponentSetRef, DocumentHost, NodeId, PropertyValue,
    VariableHost,
};
use compass_mapper::{
    map_properties, IconRef, LogicalProperty, MappingResult, PropertyTable, SourceProperties,
    TargetVariant,
};
use compass_registry::ComponentRegistry;
use serde::Serialize;
use std::sync::Arc;

/// Migration phase reached by an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MigrationPhase {
    /// Source configuration captured
    Captured,
    /// Replacement set resolved and imported
    TargetResolved,
    /// Target variant chosen
    VariantSelected,
    /// Component swapped (point of no return)
    Swapped,
    /// Applying translated properties
    PropertiesApplying,
    /// Transferring the icon
    IconApplying,
    /// Binding the theme mode
    ThemeApplying,
    /// Finished
    Done,
}

/// Result of migrating one instance
///
/// `success` means the swap went through; post-swap problems appear as
/// warnings instead of flipping it back.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationOutcome {
    /// The migrated instance
    pub node: NodeId,
    /// Whether the instance now points at the replacement component
    pub success: bool,
    /// Last phase reached
    pub phase: MigrationPhase,
    /// Fatal error message, when `success` is false
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Recoverable problems encountered along the way
    pub warnings: Vec<String>,
}

/// Captured pre-swap state of a source instance
#[derive(Debug, Clone)]
struct CapturedInstance {
    source: SourceProperties,
    source_set_key: Option<ComponentKey>,
    /// Pre-swap descendant components, for icon reference resolution
    icon_candidates: Vec<(NodeId, ComponentKey)>,
}

/// Migrates instances from deprecated components to their replacements
pub struct MigrationEngine<H> {
    host: Arc<H>,
    registry: Arc<ComponentRegistry>,
    config: EngineConfig,
    table: PropertyTable,
    import_cache: moka::future::Cache<ComponentKey, ComponentSetRef>,
    themes: ThemeResolver<H>,
}

impl<H: DocumentHost + VariableHost + 'static> MigrationEngine<H> {
    /// Create an engine over a host, registry, and remote API client
    #[must_use]
    pub fn new(
        host: Arc<H>,
        registry: Arc<ComponentRegistry>,
        config: EngineConfig,
        api: Arc<dyn VariablesApi>,
    ) -> Self {
        Self {
            host,
            registry,
            config,
            table: PropertyTable::action(),
            import_cache: moka::future::Cache::new(64),
            themes: ThemeResolver::standard(api),
        }
    }

    /// Engine configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Migrate one instance, optionally to an explicit target set
    ///
    /// Never returns an error: fatal failures produce an unsuccessful
    /// outcome so batch runs keep going.
    pub async fn migrate_instance(
        &self,
        instance: &NodeId,
        target: Option<&ComponentKey>,
    ) -> MigrationOutcome {
        let mut phase = MigrationPhase::Captured;
        let mut warnings = Vec::new();

        match self.run(instance, target, &mut phase, &mut warnings).await {
            Ok(()) => {
                tracing::debug!(node = %instance, warnings = warnings.len(), "instance migrated");
                MigrationOutcome {
                    node: instance.clone(),
                    success: true,
                    phase,
                    error: None,
                    warnings,
                }
            }
            Err(e) => {
                tracing::warn!(node = %instance, ?phase, error = %e, "instance migration failed");
                MigrationOutcome {
                    node: instance.clone(),
                    success: false,
                    phase,
                    error: Some(e.to_string()),
                    warnings,
                }
            }
        }
    }

    async fn run(
        &self,
        instance: &NodeId,
        target: Option<&ComponentKey>,
        phase: &mut MigrationPhase,
        warnings: &mut Vec<String>,
    ) -> Result<(), MigrationError> {
        let captured = self.capture(instance).await?;
        *phase = MigrationPhase::Captured;

        let set = self.resolve_target(&captured, target).await?;
        *phase = MigrationPhase::TargetResolved;

        let mapped = map_properties(&captured.source, &self.config.mapper);
        warnings.extend(mapped.warnings.iter().cloned());

        let variant = self.select_variant(&set, mapped.target_variant)?;
        *phase = MigrationPhase::VariantSelected;

        self.host
            .swap(instance, &variant.id)
            .await
            .map_err(|e| MigrationError::SwapFailed(format!("{instance}: {e}")))?;
        *phase = MigrationPhase::Swapped;

        let mut view = SubtreeView::new(instance.clone());
        view.advance();

        *phase = MigrationPhase::PropertiesApplying;
        self.apply_properties(&mut view, &mapped, warnings).await;

        *phase = MigrationPhase::IconApplying;
        self.apply_icon(&mut view, &captured, &mapped, warnings)
            .await;

        *phase = MigrationPhase::ThemeApplying;
        self.apply_theme(instance, &mapped, warnings).await;

        *phase = MigrationPhase::Done;
        Ok(())
    }

    /// Read everything needed from the instance before it is touched
    async fn capture(&self, instance: &NodeId) -> Result<CapturedInstance, MigrationError> {
        let variant_props = self.host.variant_properties(instance).await?;
        let component_props = self.host.component_properties(instance).await?;

        let pick = |key: &str| variant_props.get(key).cloned().unwrap_or_default();

        // The label lives under a free-form property name; scan for the
        // conventional fragments and fall back to the node name.
        let label = component_props
            .iter()
            .find(|(name, value)| {
                let name = name.to_lowercase();
                (name.contains("text") || name.contains("label")) && value.as_text().is_some()
            })
            .and_then(|(_, value)| value.as_text().map(str::to_string));
        let label = match label {
            Some(label) => label,
            None => self.host.node_name(instance).await.unwrap_or_default(),
        };

        let icon_instance = component_props
            .iter()
            .find(|(name, value)| {
                name.to_lowercase().contains("icon") && value.as_instance_ref().is_some()
            })
            .and_then(|(_, value)| value.as_instance_ref().map(IconRef::new));

        let source = SourceProperties {
            variant: pick("Variant"),
            size: pick("Size"),
            state: pick("State"),
            icon: pick("Icon"),
            color: pick("Color"),
            label,
            icon_instance,
        };

        let component = self.host.main_component(instance).await?;
        let source_set_key = self
            .host
            .parent_set(&component.id)
            .await?
            .map(|set| set.key);

        // Pre-swap descendants: an icon reference captured as a node id
        // can only be resolved against these.
        let mut icon_candidates = Vec::new();
        if let Ok(descendants) = self.host.descendant_instances(instance).await {
            for node in descendants.iter().skip(1) {
                if let Ok(sub_component) = self.host.main_component(&node.id).await {
                    icon_candidates.push((node.id.clone(), sub_component.key));
                }
            }
        }

        Ok(CapturedInstance {
            source,
            source_set_key,
            icon_candidates,
        })
    }

    /// Resolve the replacement set: explicit key, or registry default
    async fn resolve_target(
        &self,
        captured: &CapturedInstance,
        explicit: Option<&ComponentKey>,
    ) -> Result<ComponentSetRef, MigrationError> {
        let key = match explicit {
            Some(key) => key.clone(),
            None => {
                let source_key = captured.source_set_key.as_ref().ok_or_else(|| {
                    MigrationError::NoMapping("source has no component set".to_string())
                })?;
                self.registry
                    .default_mapping_for(source_key)
                    .map(|m| m.target_component.key.clone())
                    .ok_or_else(|| MigrationError::NoMapping(source_key.to_string()))?
            }
        };

        let host = Arc::clone(&self.host);
        self.import_cache
            .try_get_with(key.clone(), async move {
                host.import_component_set(&key).await
            })
            .await
            .map_err(|e| MigrationError::TargetUnavailable(e.to_string()))
    }

    /// Pick the target variant by name, falling back to the set default
    fn select_variant(
        &self,
        set: &ComponentSetRef,
        wanted: TargetVariant,
    ) -> Result<ComponentRef, MigrationError> {
        let by_name = match wanted {
            TargetVariant::IconOnly => set.variant_containing("icon only"),
            TargetVariant::TextAndIcons => set.variant_containing("text and icons"),
            // "Text" also substring-matches "Text and Icons"; require a
            // name without icons.
            TargetVariant::Text => set.variants.iter().find(|v| {
                let name = v.name.to_lowercase();
                name.contains("text") && !name.contains("icon")
            }),
        };

        by_name
            .or_else(|| {
                let default = set.default_variant.as_ref()?;
                set.variants.iter().find(|v| &v.id == default)
            })
            .cloned()
            .ok_or_else(|| {
                MigrationError::TargetUnavailable(format!(
                    "set '{}' has no variant for '{}'",
                    set.name,
                    wanted.label()
                ))
            })
    }

    async fn apply_properties(
        &self,
        view: &mut SubtreeView,
        mapped: &MappingResult,
        warnings: &mut Vec<String>,
    ) {
        let setter = PropertySetter::new(
            self.host.as_ref(),
            &self.table,
            self.config.max_property_retries,
            self.config.retry_delay(),
        );

        let mut writes: Vec<(LogicalProperty, PropertyValue)> = vec![
            (
                LogicalProperty::Style,
                PropertyValue::Variant(mapped.props.style.physical().to_string()),
            ),
            (
                LogicalProperty::State,
                PropertyValue::Variant(mapped.props.state.physical().to_string()),
            ),
            (
                LogicalProperty::Size,
                PropertyValue::Variant(mapped.props.size.physical().to_string()),
            ),
        ];
        // Icon-only targets expose neither a text slot nor the
        // visibility flags; skipping them avoids guaranteed warnings.
        if let Some(label) = &mapped.props.label {
            writes.push((LogicalProperty::Label, PropertyValue::Text(label.clone())));
        }
        if let Some(show) = mapped.props.show_left_icon {
            writes.push((LogicalProperty::ShowLeftIcon, PropertyValue::Bool(show)));
        }
        if let Some(show) = mapped.props.show_right_icon {
            writes.push((LogicalProperty::ShowRightIcon, PropertyValue::Bool(show)));
        }

        for (logical, value) in writes {
            if let Some(warning) = setter.apply(view, logical, value).await {
                warnings.push(warning);
            }
        }
    }

    async fn apply_icon(
        &self,
        view: &mut SubtreeView,
        captured: &CapturedInstance,
        mapped: &MappingResult,
        warnings: &mut Vec<String>,
    ) {
        let Some(plan) = &mapped.icon_plan else {
            return;
        };

        let key = resolve_icon_key(captured, &plan.source);
        let setter = PropertySetter::new(
            self.host.as_ref(),
            &self.table,
            self.config.max_property_retries,
            self.config.retry_delay(),
        );
        let logical = LogicalProperty::for_slot(plan.slot);
        if let Some(warning) = setter
            .apply(
                view,
                logical,
                PropertyValue::InstanceRef(Some(key.0.clone())),
            )
            .await
        {
            warnings.push(format!("icon transfer incomplete: {warning}"));
        }
    }

    async fn apply_theme(
        &self,
        instance: &NodeId,
        mapped: &MappingResult,
        warnings: &mut Vec<String>,
    ) {
        let Some(mode) = mapped.theme_mode else {
            return;
        };

        let ctx = ThemeContext {
            host: self.host.as_ref(),
            instance,
            mode,
            config: &self.config,
        };
        if let Err(reasons) = self.themes.apply(&ctx).await {
            warnings.push(format!(
                "theme '{}' not applied ({})",
                mode.mode_name(),
                reasons.join("; ")
            ));
        }
    }
}

/// Resolve a captured icon reference to an importable component key
///
/// The reference may be a node id of the original icon sub-instance, an
/// already resolved component key of one, or a raw key from elsewhere.
fn resolve_icon_key(captured: &CapturedInstance, source: &IconRef) -> ComponentKey {
    if let Some((_, key)) = captured
        .icon_candidates
        .iter()
        .find(|(id, _)| id.as_str() == source.as_str())
    {
        return key.clone();
    }
    if let Some((_, key)) = captured
        .icon_candidates
        .iter()
        .find(|(_, key)| key.as_str() == source.as_str())
    {
        return key.clone();
    }
    ComponentKey::new(source.as_str())
}
