//! End-to-end migrations against the in-memory host

use compass_engine::{
    EngineConfig, MigrationEngine, MigrationPhase, NoRemote, THEME_COLLECTION_NAME,
};
use compass_host::{ComponentKey, NodeId, PropertyValue, VariableCollection, VariableMode};
use compass_test_utils::{action_set_key, button_fixture, sample_registry, ButtonSpec, Fixture};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

fn add_theme_collection(fixture: &Fixture) {
    fixture.host.add_local_collection(VariableCollection {
        id: "themes".to_string(),
        name: THEME_COLLECTION_NAME.to_string(),
        modes: vec![
            VariableMode {
                id: "themes:light".to_string(),
                name: "Brand - Light".to_string(),
            },
            VariableMode {
                id: "themes:dark".to_string(),
                name: "Brand - Dark".to_string(),
            },
            VariableMode {
                id: "themes:partner".to_string(),
                name: "Partner - Light".to_string(),
            },
        ],
    });
}

fn engine_over(
    host: Arc<compass_test_utils::FakeHost>,
) -> MigrationEngine<compass_test_utils::FakeHost> {
    MigrationEngine::new(
        host,
        Arc::new(sample_registry()),
        EngineConfig::default().with_retry_delay(Duration::from_millis(1)),
        Arc::new(NoRemote),
    )
}

#[tokio::test]
async fn text_button_migrates_cleanly() {
    let fixture = button_fixture();
    add_theme_collection(&fixture);
    let instance = fixture.add_button(ButtonSpec::new("submit button").with_label("Submit"));

    let action_variants = fixture.host.variant_ids(&action_set_key());
    let host = Arc::new(fixture.host);
    let engine = engine_over(Arc::clone(&host));

    let outcome = engine.migrate_instance(&instance, None).await;

    assert!(outcome.success, "warnings: {:?}", outcome.warnings);
    assert_eq!(outcome.phase, MigrationPhase::Done);
    assert_eq!(outcome.warnings, Vec::<String>::new());

    // Swapped to the Text variant.
    assert_eq!(host.main_component_id(&instance), Some(action_variants[0].clone()));
    // Label carried, icons hidden.
    assert_eq!(
        host.property_on_subtree(&instance, "Action Text#12254:9"),
        Some(PropertyValue::Text("Submit".to_string()))
    );
    assert_eq!(
        host.property_on_subtree(&instance, "Show 'Left icon'#12254:10"),
        Some(PropertyValue::Bool(false))
    );
    assert_eq!(
        host.property_on_subtree(&instance, "Show 'Right icon'#12254:11"),
        Some(PropertyValue::Bool(false))
    );
    // Variant axes remapped.
    assert_eq!(
        host.property_on_subtree(&instance, "Style"),
        Some(PropertyValue::Variant("Filled".to_string()))
    );
    assert_eq!(
        host.property_on_subtree(&instance, "Size"),
        Some(PropertyValue::Variant("Medium (Default)".to_string()))
    );
    // Default color "Brand" selected the light brand theme.
    assert_eq!(
        host.applied_mode(&instance, "themes").as_deref(),
        Some("themes:light")
    );
}

#[tokio::test]
async fn left_icon_button_transfers_the_icon() {
    let fixture = button_fixture();
    add_theme_collection(&fixture);
    let instance = fixture.add_button(
        ButtonSpec::new("go button")
            .with_label("Go")
            .with_icon("❖ Left")
            .with_icon_ref("icon-arrow-key"),
    );

    let action_variants = fixture.host.variant_ids(&action_set_key());
    let host = Arc::new(fixture.host);
    let engine = engine_over(Arc::clone(&host));

    let outcome = engine.migrate_instance(&instance, None).await;

    assert!(outcome.success, "warnings: {:?}", outcome.warnings);
    assert_eq!(host.main_component_id(&instance), Some(action_variants[1].clone()));
    assert_eq!(
        host.property_on_subtree(&instance, "Show 'Left icon'#12254:10"),
        Some(PropertyValue::Bool(true))
    );
    assert_eq!(
        host.property_on_subtree(&instance, "Show 'Right icon'#12254:11"),
        Some(PropertyValue::Bool(false))
    );
    assert_eq!(
        host.property_on_subtree(&instance, "Select 'Left' Icon#12538:1"),
        Some(PropertyValue::InstanceRef(Some("icon-arrow-key".to_string())))
    );
}

#[tokio::test]
async fn icon_only_button_uses_the_size_keyed_slot() {
    let fixture = button_fixture();
    add_theme_collection(&fixture);
    let instance = fixture.add_button(
        ButtonSpec::new("gear")
            .with_icon("Icon ❖ only")
            .with_icon_ref("icon-gear-key"),
    );

    let action_variants = fixture.host.variant_ids(&action_set_key());
    let host = Arc::new(fixture.host);
    let engine = engine_over(Arc::clone(&host));

    let outcome = engine.migrate_instance(&instance, None).await;

    assert!(outcome.success, "warnings: {:?}", outcome.warnings);
    assert_eq!(outcome.warnings, Vec::<String>::new(), "label and visibility skipped");
    assert_eq!(host.main_component_id(&instance), Some(action_variants[2].clone()));
    // Medium source size lands in the medium slot.
    assert_eq!(
        host.property_on_subtree(&instance, "Select Icon#12307:3"),
        Some(PropertyValue::InstanceRef(Some("icon-gear-key".to_string())))
    );
    // No label was written anywhere.
    assert_eq!(host.property_on_subtree(&instance, "Action Text#12254:9"), None);
}

#[tokio::test]
async fn unavailable_target_is_fatal_for_the_instance() {
    let fixture = button_fixture();
    let instance = fixture.add_button(ButtonSpec::new("b"));

    let host = Arc::new(fixture.host);
    let engine = engine_over(Arc::clone(&host));

    let missing = ComponentKey::new("no-such-set");
    let outcome = engine.migrate_instance(&instance, Some(&missing)).await;

    assert!(!outcome.success);
    assert_eq!(outcome.phase, MigrationPhase::Captured, "failed before resolution");
    assert!(outcome.error.as_deref().unwrap().contains("unavailable"));
    // The instance was never touched.
    assert_eq!(
        host.main_component_id(&instance),
        Some(fixture_button_variant(&host)),
    );
}

fn fixture_button_variant(host: &compass_test_utils::FakeHost) -> NodeId {
    host.variant_ids(&compass_test_utils::button_set_key())[0].clone()
}

#[tokio::test]
async fn property_retry_exhaustion_warns_but_succeeds() {
    let fixture = button_fixture();
    add_theme_collection(&fixture);
    let instance = fixture.add_button(ButtonSpec::new("stubborn").with_label("Save"));
    fixture
        .host
        .fail_set_property("Action Text#12254:9", u32::MAX);

    let host = Arc::new(fixture.host);
    let engine = engine_over(Arc::clone(&host));

    let outcome = engine.migrate_instance(&instance, None).await;

    assert!(outcome.success, "post-swap failures are recoverable");
    let label_warnings: Vec<_> = outcome
        .warnings
        .iter()
        .filter(|w| w.contains("Action Text#12254:9"))
        .collect();
    assert_eq!(label_warnings.len(), 1, "exactly one warning per property");
}

#[tokio::test]
async fn transient_property_failures_heal_within_the_retry_budget() {
    let fixture = button_fixture();
    add_theme_collection(&fixture);
    let instance = fixture.add_button(ButtonSpec::new("flaky").with_label("Retry me"));
    fixture.host.fail_set_property("Action Text#12254:9", 2);

    let host = Arc::new(fixture.host);
    let engine = engine_over(Arc::clone(&host));

    let outcome = engine.migrate_instance(&instance, None).await;

    assert!(outcome.success);
    assert_eq!(outcome.warnings, Vec::<String>::new());
    assert_eq!(
        host.property_on_subtree(&instance, "Action Text#12254:9"),
        Some(PropertyValue::Text("Retry me".to_string()))
    );
}

#[tokio::test]
async fn theme_exhaustion_is_a_single_warning() {
    // No theme sources anywhere.
    let fixture = button_fixture();
    let instance = fixture.add_button(ButtonSpec::new("plain").with_label("Ok"));

    let host = Arc::new(fixture.host);
    let engine = engine_over(Arc::clone(&host));

    let outcome = engine.migrate_instance(&instance, None).await;

    assert!(outcome.success);
    let theme_warnings: Vec<_> = outcome
        .warnings
        .iter()
        .filter(|w| w.contains("theme 'Brand - Light' not applied"))
        .collect();
    assert_eq!(theme_warnings.len(), 1);
}

#[tokio::test]
async fn unknown_enum_values_surface_mapper_warnings() {
    let fixture = button_fixture();
    add_theme_collection(&fixture);
    let instance = fixture.add_button(
        ButtonSpec::new("odd")
            .with_variant("Ghost")
            .with_color("Teal"),
    );

    let host = Arc::new(fixture.host);
    let engine = engine_over(Arc::clone(&host));

    let outcome = engine.migrate_instance(&instance, None).await;

    assert!(outcome.success);
    assert!(outcome.warnings.iter().any(|w| w.contains("Ghost")));
    assert!(outcome.warnings.iter().any(|w| w.contains("Teal")));
    // Defaults still applied.
    assert_eq!(
        host.property_on_subtree(&instance, "Style"),
        Some(PropertyValue::Variant("Filled".to_string()))
    );
}
