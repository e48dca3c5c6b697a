use clap::{value_parser, Arg, ArgAction, Command};
use compass_engine::{
    BatchOrchestrator, EngineConfig, InstanceLocator, NoRemote, SearchScope, Session,
};
use compass_registry::ComponentRegistry;
use compass_test_utils::{button_fixture, sample_registry, ButtonSpec};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Command::new("compass")
        .version(compass_engine::VERSION)
        .about("Deprecated-component discovery and migration engine")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("simulate")
                .about("Run a full search + migration against a synthetic document")
                .arg(
                    Arg::new("instances")
                        .long("instances")
                        .default_value("60")
                        .value_parser(value_parser!(usize))
                        .help("Number of deprecated instances to place"),
                )
                .arg(
                    Arg::new("batch-size")
                        .long("batch-size")
                        .default_value("25")
                        .value_parser(value_parser!(usize))
                        .help("Instances migrated per batch"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the report as JSON"),
                ),
        )
        .subcommand(
            Command::new("validate-registry")
                .about("Load a registry file and report metadata drift")
                .arg(
                    Arg::new("path")
                        .long("path")
                        .required(true)
                        .help("Path to the registry JSON file"),
                ),
        )
        .subcommand(
            Command::new("diagnose-themes")
                .about("Inventory theme sources on a synthetic document"),
        );

    match cli.get_matches().subcommand() {
        Some(("simulate", args)) => {
            let instances = *args.get_one::<usize>("instances").unwrap();
            let batch_size = *args.get_one::<usize>("batch-size").unwrap();
            let as_json = args.get_flag("json");
            simulate(instances, batch_size, as_json).await
        }
        Some(("validate-registry", args)) => {
            let path = args.get_one::<String>("path").unwrap();
            validate_registry(path).await
        }
        Some(("diagnose-themes", _)) => diagnose_themes().await,
        _ => unreachable!("arg_required_else_help"),
    }
}

/// Place synthetic deprecated instances, search, migrate, print the report
async fn simulate(instances: usize, batch_size: usize, as_json: bool) -> anyhow::Result<()> {
    let fixture = button_fixture();
    for i in 0..instances {
        let spec = match i % 4 {
            0 => ButtonSpec::new(format!("button-{i}")).with_label(format!("Button {i}")),
            1 => ButtonSpec::new(format!("button-{i}"))
                .with_icon("❖ Left")
                .with_icon_ref("icon-arrow-left"),
            2 => ButtonSpec::new(format!("button-{i}"))
                .with_variant("○ Outlined")
                .with_size("Large")
                .with_color("White"),
            _ => ButtonSpec::new(format!("button-{i}"))
                .with_icon("Icon ❖ only")
                .with_icon_ref("icon-gear"),
        };
        fixture.add_button(spec);
    }

    let host = Arc::new(fixture.host);
    let registry = Arc::new(sample_registry());
    let config = EngineConfig::from_env()
        .with_batch_size(batch_size)
        .with_batch_pause(std::time::Duration::from_millis(10))
        .with_retry_delay(std::time::Duration::from_millis(5));

    let locator = InstanceLocator::new(host.as_ref(), &registry, &config);
    let groups = locator.search(SearchScope::Page).await?;
    println!("Search found {} group(s):", groups.len());
    for group in &groups {
        println!("  {} - {} instance(s)", group.name, group.instance_count);
    }
    println!();

    let targets: Vec<_> = groups
        .iter()
        .flat_map(|g| g.instances.iter().map(|i| i.node.id.clone()))
        .collect();
    let orchestrator =
        BatchOrchestrator::with_engine(host, registry, config, Arc::new(NoRemote));
    let report = orchestrator.run(targets, None, None).await;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Migration report:");
        println!("  Total:     {}", report.progress.total);
        println!("  Completed: {}", report.progress.completed);
        println!("  Failed:    {}", report.progress.failed);
        println!("  Batches:   {}", report.progress.current_batch);
        println!("  Elapsed:   {} ms", report.elapsed_ms);
        if let (Some(fastest), Some(slowest)) = (report.fastest_ms, report.slowest_ms) {
            println!("  Fastest:   {fastest} ms");
            println!("  Slowest:   {slowest} ms");
        }
        let warned = report
            .outcomes
            .iter()
            .filter(|o| !o.warnings.is_empty())
            .count();
        println!("  Instances with warnings: {warned}");
    }

    std::process::exit(if report.progress.failed == 0 { 0 } else { 1 });
}

/// Load a registry file and compare stored metadata against a recount
async fn validate_registry(path: &str) -> anyhow::Result<()> {
    let raw = tokio::fs::read_to_string(path).await?;
    let stored: serde_json::Value = serde_json::from_str(&raw)?;
    let registry = ComponentRegistry::from_json_str(&raw)?;

    println!("Registry {} (updated {})", registry.version, registry.last_updated);
    println!("  Components: {}", registry.metadata.total_components);
    println!("  Deprecated: {}", registry.metadata.deprecated_components);
    println!("  Validated mappings: {}", registry.metadata.validated_mappings);
    println!("  Pending mappings:   {}", registry.metadata.pending_mappings);

    let recounted = serde_json::to_value(&registry.metadata)?;
    let drift = stored.get("metadata") != Some(&recounted);
    if drift {
        println!();
        println!("WARNING: stored metadata does not match a recount");
        println!("  stored:    {}", stored.get("metadata").unwrap_or(&serde_json::Value::Null));
        println!("  recounted: {recounted}");
    }

    std::process::exit(if drift { 1 } else { 0 });
}

/// Run the theme diagnostics request against a synthetic document
async fn diagnose_themes() -> anyhow::Result<()> {
    let fixture = button_fixture();
    fixture
        .host
        .add_local_collection(compass_host::VariableCollection {
            id: "VariableCollectionId:demo".to_string(),
            name: compass_engine::THEME_COLLECTION_NAME.to_string(),
            modes: vec![
                compass_host::VariableMode {
                    id: "demo:0".to_string(),
                    name: "Brand - Light".to_string(),
                },
                compass_host::VariableMode {
                    id: "demo:1".to_string(),
                    name: "Brand - Dark".to_string(),
                },
            ],
        });

    let session = Session::new(
        Arc::new(fixture.host),
        Arc::new(sample_registry()),
        EngineConfig::from_env(),
        Arc::new(NoRemote),
    );
    let responses = session
        .handle(compass_engine::Request::DiagnoseThemes)
        .await;
    for response in responses {
        println!("{}", serde_json::to_string_pretty(&response)?);
    }
    Ok(())
}
