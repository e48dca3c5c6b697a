//! Shared document and registry fixtures
//!
//! Builds a document with the deprecated Button set placed as instances
//! and the replacement Action set available for import, matching the
//! published components' variant names and property suffixes.

use crate::fake_host::{FakeHost, SubInstanceSpec, VariantSpec};
use chrono::Utc;
use compass_host::{ComponentKey, NodeId, PropertyValue};
use compass_registry::{
    ComponentDescriptor, ComponentKind, ComponentMapping, ComponentRegistry, MappingEndpoint,
    ValidationStatus,
};
use std::collections::BTreeMap;

/// Stable key of the deprecated Button component set
#[must_use]
pub fn button_set_key() -> ComponentKey {
    ComponentKey::new("8f646f204ad2ebcd7e0d74b92b23d1e0a2f4e6b1")
}

/// Stable key of the replacement Action component set
#[must_use]
pub fn action_set_key() -> ComponentKey {
    ComponentKey::new("1c8bb1f9d75f3a3e1d42e8f6a9b0c4d5e6f7a8b9")
}

/// Registry with the Button -> Action mapping validated at high confidence
#[must_use]
pub fn sample_registry() -> ComponentRegistry {
    let mut registry = ComponentRegistry::empty();

    registry.add_component(ComponentDescriptor {
        id: "button-deprecated".to_string(),
        name: "Button (Deprecated)".to_string(),
        display_name: Some("Button".to_string()),
        key: button_set_key(),
        kind: ComponentKind::ComponentSet,
        deprecated: true,
        last_modified: Utc::now(),
        file_key: "fixture-library".to_string(),
    });
    registry.add_component(ComponentDescriptor {
        id: "action".to_string(),
        name: "Action".to_string(),
        display_name: None,
        key: action_set_key(),
        kind: ComponentKind::ComponentSet,
        deprecated: false,
        last_modified: Utc::now(),
        file_key: "fixture-library".to_string(),
    });

    registry
        .add_mapping(ComponentMapping {
            source_component: MappingEndpoint {
                id: "button-deprecated".to_string(),
                name: "Button (Deprecated)".to_string(),
                key: button_set_key(),
            },
            target_component: MappingEndpoint {
                id: "action".to_string(),
                name: "Action".to_string(),
                key: action_set_key(),
            },
            property_mappings: BTreeMap::new(),
            confidence: 95,
            validation_status: ValidationStatus::Pending,
            last_validated: None,
            notes: Some("authored from component structure analysis".to_string()),
        })
        .expect("target is not deprecated");
    registry.validate_mapping(0).expect("confidence 95");

    registry
}

/// Builder for one deprecated Button instance placed in a fixture
#[derive(Debug, Clone)]
pub struct ButtonSpec {
    name: String,
    variant: String,
    size: String,
    state: String,
    icon: String,
    color: String,
    label: String,
    icon_ref: Option<String>,
}

impl ButtonSpec {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variant: "● Filled".to_string(),
            size: "Medium".to_string(),
            state: "Default".to_string(),
            icon: "None".to_string(),
            color: "Brand".to_string(),
            label: "Click me".to_string(),
            icon_ref: None,
        }
    }

    #[must_use]
    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = variant.into();
        self
    }

    #[must_use]
    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = size.into();
        self
    }

    #[must_use]
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = state.into();
        self
    }

    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn with_icon_ref(mut self, icon_ref: impl Into<String>) -> Self {
        self.icon_ref = Some(icon_ref.into());
        self
    }
}

/// A fake document with the Button and Action sets wired up
#[derive(Debug)]
pub struct Fixture {
    pub host: FakeHost,
    pub page: NodeId,
    /// The deprecated Button variant that placed instances point at
    pub button_variant: NodeId,
    /// The importable Action set
    pub action_set: NodeId,
}

impl Fixture {
    /// Place a Button instance on the fixture page
    pub fn add_button(&self, spec: ButtonSpec) -> NodeId {
        let mut variant_props = BTreeMap::new();
        variant_props.insert("Variant".to_string(), spec.variant);
        variant_props.insert("Size".to_string(), spec.size);
        variant_props.insert("State".to_string(), spec.state);
        variant_props.insert("Icon".to_string(), spec.icon);
        variant_props.insert("Color".to_string(), spec.color);

        let mut properties = BTreeMap::new();
        properties.insert(
            "Button Text#9:0".to_string(),
            PropertyValue::Text(spec.label),
        );
        properties.insert(
            "Swap Icon#9:1".to_string(),
            PropertyValue::InstanceRef(spec.icon_ref),
        );

        self.host.add_instance(
            &self.page,
            spec.name,
            Some(self.button_variant.clone()),
            variant_props,
            properties,
        )
    }
}

fn variant_axes() -> BTreeMap<String, PropertyValue> {
    let mut props = BTreeMap::new();
    props.insert(
        "Style".to_string(),
        PropertyValue::Variant("● Filled".to_string()),
    );
    props.insert(
        "State".to_string(),
        PropertyValue::Variant("Enabled".to_string()),
    );
    props.insert(
        "Size".to_string(),
        PropertyValue::Variant("Medium (Default)".to_string()),
    );
    props.insert(
        "Theme".to_string(),
        PropertyValue::Variant("Brand".to_string()),
    );
    props
}

fn text_content() -> BTreeMap<String, PropertyValue> {
    let mut props = BTreeMap::new();
    props.insert(
        "Action Text#12254:9".to_string(),
        PropertyValue::Text(String::new()),
    );
    props.insert(
        "Show 'Left icon'#12254:10".to_string(),
        PropertyValue::Bool(false),
    );
    props.insert(
        "Show 'Right icon'#12254:11".to_string(),
        PropertyValue::Bool(false),
    );
    props
}

fn icons_content() -> BTreeMap<String, PropertyValue> {
    let mut props = text_content();
    props.insert(
        "Select 'Left' Icon#12538:1".to_string(),
        PropertyValue::InstanceRef(None),
    );
    props.insert(
        "Select 'Right' Icon#12538:5".to_string(),
        PropertyValue::InstanceRef(None),
    );
    props
}

fn icon_only_content() -> BTreeMap<String, PropertyValue> {
    let mut props = BTreeMap::new();
    props.insert(
        "Select Icon#12307:1".to_string(),
        PropertyValue::InstanceRef(None),
    );
    props.insert(
        "Select Icon#12307:2".to_string(),
        PropertyValue::InstanceRef(None),
    );
    props.insert(
        "Select Icon#12307:3".to_string(),
        PropertyValue::InstanceRef(None),
    );
    props
}

/// A fake document ready for a Button -> Action migration
#[must_use]
pub fn button_fixture() -> Fixture {
    let host = FakeHost::new();
    let page = host.first_page();

    host.add_component_set(
        button_set_key().as_str(),
        "Button (Deprecated)",
        vec![VariantSpec {
            key: "button-variant-filled".to_string(),
            name: "Variant=● Filled, Size=Medium".to_string(),
            subs: Vec::new(),
            is_default: true,
        }],
    );
    let button_variant = host
        .variant_ids(&button_set_key())
        .first()
        .cloned()
        .expect("button set has one variant");

    let action_set = host.add_component_set(
        action_set_key().as_str(),
        "Action",
        vec![
            VariantSpec {
                key: "action-variant-text".to_string(),
                name: "Variant=Text".to_string(),
                subs: vec![
                    SubInstanceSpec::new("Base", variant_axes()),
                    SubInstanceSpec::new("Content", text_content()),
                ],
                is_default: true,
            },
            VariantSpec {
                key: "action-variant-text-and-icons".to_string(),
                name: "Variant=Text and Icons".to_string(),
                subs: vec![
                    SubInstanceSpec::new("Base", variant_axes()),
                    SubInstanceSpec::new("Content", icons_content()),
                ],
                is_default: false,
            },
            VariantSpec {
                key: "action-variant-icon-only".to_string(),
                name: "Variant=Icon Only".to_string(),
                subs: vec![
                    SubInstanceSpec::new("Base", variant_axes()),
                    SubInstanceSpec::new("Content", icon_only_content()),
                ],
                is_default: false,
            },
        ],
    );

    Fixture {
        host,
        page,
        button_variant,
        action_set,
    }
}
