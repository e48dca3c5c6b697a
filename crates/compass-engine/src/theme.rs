//! Theme resolver
//!
//! Selecting a theme mode on a migrated instance requires a variable
//! collection the document can actually reach. Documents differ wildly in
//! how that access exists, so resolution runs an ordered chain of
//! strategies, each encapsulating one acquisition path:
//!
//! 1. a collection already local to the file;
//! 2. bridge variables from the offline cache file;
//! 3. a live fetch of the source file's variables over the remote API;
//! 4. a team-library collection search.
//!
//! The first strategy that binds a mode wins. Exhausting all of them is a
//! warning on the migration, never a failure.

use crate::config::EngineConfig;
use crate::remote::VariablesApi;
use async_trait::async_trait;
use compass_host::{
    HostError, LibraryCollection, NodeId, VariableCollection, VariableHost,
};
use compass_mapper::ThemeMode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Name of the published theme variable collection
pub const THEME_COLLECTION_NAME: &str = "System Tokens and Themes";

/// Bridge variables cached per collection; importing any one of them
/// establishes access to the whole collection
pub const MAX_BRIDGE_VARIABLES: usize = 3;

/// Offline-generated cache of bridge variables for the theme collection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableCache {
    /// Source file the cache was generated from
    pub file_key: String,
    /// Name of the cached collection
    pub collection_name: String,
    /// Importable variables, at most [`MAX_BRIDGE_VARIABLES`]
    pub bridge_variables: Vec<CachedVariable>,
}

/// One cached importable variable
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedVariable {
    /// Stable cross-file key
    pub key: String,
    /// Variable name
    pub name: String,
}

/// Everything a strategy needs to attempt a theme binding
pub struct ThemeContext<'a, H> {
    /// Host variable capabilities
    pub host: &'a H,
    /// The migrated instance receiving the mode
    pub instance: &'a NodeId,
    /// The mode to bind
    pub mode: ThemeMode,
    /// Engine configuration (cache path, file key, remote settings)
    pub config: &'a EngineConfig,
}

/// Successful theme binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedTheme {
    /// Which strategy succeeded
    pub strategy: &'static str,
    /// Collection the mode was bound from
    pub collection: String,
    /// Bound mode name
    pub mode: String,
}

/// Why a strategy did not apply; the chain moves on
#[derive(Debug, Clone)]
pub struct Skip(pub String);

/// One acquisition path for the theme collection
#[async_trait]
pub trait ThemeStrategy<H: VariableHost>: Send + Sync {
    /// Short strategy name for logs and warnings
    fn name(&self) -> &'static str;

    /// Try to bind the requested mode on the instance
    async fn attempt(&self, ctx: &ThemeContext<'_, H>) -> Result<AppliedTheme, Skip>;
}

/// Bind `mode` from `collection`, the shared tail of every strategy
async fn bind<H: VariableHost>(
    strategy: &'static str,
    ctx: &ThemeContext<'_, H>,
    collection: &VariableCollection,
) -> Result<AppliedTheme, Skip> {
    let wanted = ctx.mode.mode_name();
    let mode = collection.mode_named(wanted).ok_or_else(|| {
        Skip(format!(
            "collection '{}' has no mode '{wanted}'",
            collection.name
        ))
    })?;
    ctx.host
        .set_explicit_mode(ctx.instance, &collection.id, &mode.id)
        .await
        .map_err(|e| Skip(format!("binding '{wanted}' failed: {e}")))?;
    Ok(AppliedTheme {
        strategy,
        collection: collection.name.clone(),
        mode: wanted.to_string(),
    })
}

/// Strategy 1: a collection already local to the document
pub struct LocalCollectionStrategy;

#[async_trait]
impl<H: VariableHost> ThemeStrategy<H> for LocalCollectionStrategy {
    fn name(&self) -> &'static str {
        "local-collection"
    }

    async fn attempt(&self, ctx: &ThemeContext<'_, H>) -> Result<AppliedTheme, Skip> {
        let collections = ctx
            .host
            .local_collections()
            .await
            .map_err(|e| Skip(format!("listing local collections failed: {e}")))?;

        let wanted = ctx.mode.mode_name();
        let collection = collections
            .iter()
            .find(|c| c.name == THEME_COLLECTION_NAME)
            .or_else(|| collections.iter().find(|c| c.mode_named(wanted).is_some()))
            .ok_or_else(|| Skip("no usable local collection".to_string()))?;

        bind("local-collection", ctx, collection).await
    }
}

/// Strategy 2: bridge variables from the offline cache file
pub struct CachedBridgeStrategy;

#[async_trait]
impl<H: VariableHost> ThemeStrategy<H> for CachedBridgeStrategy {
    fn name(&self) -> &'static str {
        "cached-bridge"
    }

    async fn attempt(&self, ctx: &ThemeContext<'_, H>) -> Result<AppliedTheme, Skip> {
        let path = ctx
            .config
            .variable_cache_path
            .as_ref()
            .ok_or_else(|| Skip("no variable cache configured".to_string()))?;

        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Skip(format!("cache unreadable: {e}")))?;
        let cache: VariableCache =
            serde_json::from_str(&raw).map_err(|e| Skip(format!("cache malformed: {e}")))?;

        let mut reasons = Vec::new();
        for cached in cache.bridge_variables.iter().take(MAX_BRIDGE_VARIABLES) {
            match import_and_bind("cached-bridge", ctx, &cached.key).await {
                Ok(applied) => return Ok(applied),
                Err(Skip(reason)) => reasons.push(format!("{}: {reason}", cached.name)),
            }
        }
        Err(Skip(if reasons.is_empty() {
            "cache holds no bridge variables".to_string()
        } else {
            reasons.join("; ")
        }))
    }
}

/// Strategy 3: live fetch from the source file's variables endpoint
pub struct LiveRemoteStrategy {
    api: Arc<dyn VariablesApi>,
}

impl LiveRemoteStrategy {
    /// Create the strategy over a remote API client
    #[must_use]
    pub fn new(api: Arc<dyn VariablesApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl<H: VariableHost> ThemeStrategy<H> for LiveRemoteStrategy {
    fn name(&self) -> &'static str {
        "live-remote"
    }

    async fn attempt(&self, ctx: &ThemeContext<'_, H>) -> Result<AppliedTheme, Skip> {
        let file_key = ctx
            .config
            .theme_file_key
            .as_deref()
            .ok_or_else(|| Skip("no theme source file configured".to_string()))?;

        let remote = self
            .api
            .local_variables(file_key)
            .await
            .map_err(|e| Skip(format!("remote fetch failed: {e}")))?;

        let variable = remote
            .variables_in_collection(|name| {
                name == THEME_COLLECTION_NAME || name.to_lowercase().contains("theme")
            })
            .next()
            .ok_or_else(|| Skip("source file has no theme collection".to_string()))?;

        import_and_bind("live-remote", ctx, &variable.key).await
    }
}

/// Strategy 4: search enabled team libraries for the collection
pub struct TeamLibraryStrategy;

#[async_trait]
impl<H: VariableHost> ThemeStrategy<H> for TeamLibraryStrategy {
    fn name(&self) -> &'static str {
        "team-library"
    }

    async fn attempt(&self, ctx: &ThemeContext<'_, H>) -> Result<AppliedTheme, Skip> {
        let libraries = ctx
            .host
            .library_collections()
            .await
            .map_err(|e| Skip(format!("listing libraries failed: {e}")))?;

        let collection = libraries
            .iter()
            .find(|c| {
                let name = c.name.to_lowercase();
                c.name == THEME_COLLECTION_NAME
                    || name.contains("theme")
                    || name.contains("token")
            })
            .ok_or_else(|| Skip("no theme collection in team libraries".to_string()))?;

        let variables = ctx
            .host
            .library_variables(&collection.key)
            .await
            .map_err(|e| Skip(format!("listing library variables failed: {e}")))?;
        let first = variables
            .first()
            .ok_or_else(|| Skip(format!("library collection '{}' is empty", collection.name)))?;

        import_and_bind("team-library", ctx, &first.key).await
    }
}

/// Import a bridge variable by key, then bind from its collection
async fn import_and_bind<H: VariableHost>(
    strategy: &'static str,
    ctx: &ThemeContext<'_, H>,
    key: &str,
) -> Result<AppliedTheme, Skip> {
    let variable = ctx
        .host
        .import_variable(key)
        .await
        .map_err(|e| Skip(format!("import failed: {e}")))?;
    let collection = ctx
        .host
        .collection_of(&variable.id)
        .await
        .map_err(|e| Skip(format!("collection lookup failed: {e}")))?;
    bind(strategy, ctx, &collection).await
}

/// Ordered strategy chain
pub struct ThemeResolver<H> {
    strategies: Vec<Box<dyn ThemeStrategy<H>>>,
}

impl<H: VariableHost> ThemeResolver<H> {
    /// Resolver with an explicit strategy list (tests, custom chains)
    #[must_use]
    pub fn new(strategies: Vec<Box<dyn ThemeStrategy<H>>>) -> Self {
        Self { strategies }
    }

    /// The standard four-strategy chain
    #[must_use]
    pub fn standard(api: Arc<dyn VariablesApi>) -> Self {
        Self::new(vec![
            Box::new(LocalCollectionStrategy),
            Box::new(CachedBridgeStrategy),
            Box::new(LiveRemoteStrategy::new(api)),
            Box::new(TeamLibraryStrategy),
        ])
    }

    /// Run the chain until a strategy binds the mode
    ///
    /// `Err` carries one reason per exhausted strategy.
    pub async fn apply(&self, ctx: &ThemeContext<'_, H>) -> Result<AppliedTheme, Vec<String>> {
        let mut reasons = Vec::with_capacity(self.strategies.len());
        for strategy in &self.strategies {
            match strategy.attempt(ctx).await {
                Ok(applied) => {
                    tracing::debug!(
                        strategy = strategy.name(),
                        collection = %applied.collection,
                        mode = %applied.mode,
                        "theme bound"
                    );
                    return Ok(applied);
                }
                Err(Skip(reason)) => {
                    tracing::debug!(strategy = strategy.name(), %reason, "theme strategy skipped");
                    reasons.push(format!("{}: {reason}", strategy.name()));
                }
            }
        }
        Err(reasons)
    }
}

/// Inventory of reachable theme sources, for diagnostics requests
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeDiagnostics {
    /// Collections local to the document, with their modes
    pub local_collections: Vec<VariableCollection>,
    /// Collections shared by enabled team libraries
    pub library_collections: Vec<LibraryCollection>,
}

/// Collect the theme source inventory from the host
pub async fn diagnose<H: VariableHost>(host: &H) -> Result<ThemeDiagnostics, HostError> {
    Ok(ThemeDiagnostics {
        local_collections: host.local_collections().await?,
        library_collections: host.library_collections().await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{
        MockVariablesApi, NoRemote, RemoteCollection, RemoteVariable, RemoteVariables,
    };
    use compass_host::{LibraryVariable, VariableMode, VariableRef};
    use compass_test_utils::FakeHost;
    use std::collections::{BTreeMap, HashMap};

    fn theme_collection(id: &str) -> VariableCollection {
        VariableCollection {
            id: id.to_string(),
            name: THEME_COLLECTION_NAME.to_string(),
            modes: vec![
                VariableMode {
                    id: format!("{id}:light"),
                    name: "Brand - Light".to_string(),
                },
                VariableMode {
                    id: format!("{id}:dark"),
                    name: "Brand - Dark".to_string(),
                },
            ],
        }
    }

    fn host_with_instance() -> (FakeHost, compass_host::NodeId) {
        let host = FakeHost::new();
        let page = host.first_page();
        let id = host.add_instance(&page, "migrated", None, BTreeMap::new(), BTreeMap::new());
        (host, id)
    }

    #[tokio::test]
    async fn local_collection_wins_first() {
        let (host, instance) = host_with_instance();
        host.add_local_collection(theme_collection("c1"));

        let config = EngineConfig::default();
        let resolver = ThemeResolver::standard(Arc::new(NoRemote));
        let ctx = ThemeContext {
            host: &host,
            instance: &instance,
            mode: ThemeMode::BrandLight,
            config: &config,
        };

        let applied = resolver.apply(&ctx).await.unwrap();
        assert_eq!(applied.strategy, "local-collection");
        assert_eq!(applied.mode, "Brand - Light");
        assert_eq!(host.applied_mode(&instance, "c1").as_deref(), Some("c1:light"));
    }

    #[tokio::test]
    async fn falls_through_to_cached_bridge() {
        let (host, instance) = host_with_instance();
        host.add_importable_variable(
            VariableRef {
                id: "v1".to_string(),
                key: "bridge-key-1".to_string(),
                name: "color/surface".to_string(),
                collection_id: "c2".to_string(),
            },
            theme_collection("c2"),
        );

        let dir = tempfile::tempdir().unwrap();
        let cache_path = dir.path().join("variables.json");
        let cache = VariableCache {
            file_key: "source-file".to_string(),
            collection_name: THEME_COLLECTION_NAME.to_string(),
            bridge_variables: vec![CachedVariable {
                key: "bridge-key-1".to_string(),
                name: "color/surface".to_string(),
            }],
        };
        std::fs::write(&cache_path, serde_json::to_string(&cache).unwrap()).unwrap();

        let config = EngineConfig::default().with_variable_cache_path(&cache_path);
        let resolver = ThemeResolver::standard(Arc::new(NoRemote));
        let ctx = ThemeContext {
            host: &host,
            instance: &instance,
            mode: ThemeMode::BrandDark,
            config: &config,
        };

        let applied = resolver.apply(&ctx).await.unwrap();
        assert_eq!(applied.strategy, "cached-bridge");
        assert_eq!(host.applied_mode(&instance, "c2").as_deref(), Some("c2:dark"));
    }

    #[tokio::test]
    async fn live_remote_imports_first_theme_variable() {
        let (host, instance) = host_with_instance();
        host.add_importable_variable(
            VariableRef {
                id: "v-remote".to_string(),
                key: "remote-key".to_string(),
                name: "color/primary".to_string(),
                collection_id: "c3".to_string(),
            },
            theme_collection("c3"),
        );

        let mut api = MockVariablesApi::new();
        api.expect_local_variables()
            .withf(|file_key| file_key == "source-file")
            .returning(|_| {
                let mut collections = HashMap::new();
                collections.insert(
                    "rc1".to_string(),
                    RemoteCollection {
                        id: "rc1".to_string(),
                        name: THEME_COLLECTION_NAME.to_string(),
                    },
                );
                let mut variables = HashMap::new();
                variables.insert(
                    "rv1".to_string(),
                    RemoteVariable {
                        id: "rv1".to_string(),
                        key: "remote-key".to_string(),
                        name: "color/primary".to_string(),
                        collection_id: "rc1".to_string(),
                    },
                );
                Ok(RemoteVariables {
                    collections,
                    variables,
                })
            });

        let config = EngineConfig::default().with_theme_file_key("source-file");
        let resolver = ThemeResolver::standard(Arc::new(api));
        let ctx = ThemeContext {
            host: &host,
            instance: &instance,
            mode: ThemeMode::BrandLight,
            config: &config,
        };

        let applied = resolver.apply(&ctx).await.unwrap();
        assert_eq!(applied.strategy, "live-remote");
        assert_eq!(host.applied_mode(&instance, "c3").as_deref(), Some("c3:light"));
    }

    #[tokio::test]
    async fn team_library_is_the_last_resort() {
        let (host, instance) = host_with_instance();
        host.add_library_collection(
            LibraryCollection {
                key: "lib-col-key".to_string(),
                name: THEME_COLLECTION_NAME.to_string(),
                library_name: "Design System".to_string(),
            },
            vec![LibraryVariable {
                key: "lib-var-key".to_string(),
                name: "color/surface".to_string(),
            }],
            theme_collection("c4"),
        );

        let config = EngineConfig::default();
        let resolver = ThemeResolver::standard(Arc::new(NoRemote));
        let ctx = ThemeContext {
            host: &host,
            instance: &instance,
            mode: ThemeMode::BrandLight,
            config: &config,
        };

        let applied = resolver.apply(&ctx).await.unwrap();
        assert_eq!(applied.strategy, "team-library");
        assert_eq!(host.applied_mode(&instance, "c4").as_deref(), Some("c4:light"));
    }

    #[tokio::test]
    async fn exhaustion_reports_every_strategy() {
        let (host, instance) = host_with_instance();

        let config = EngineConfig::default();
        let resolver = ThemeResolver::standard(Arc::new(NoRemote));
        let ctx = ThemeContext {
            host: &host,
            instance: &instance,
            mode: ThemeMode::PartnerLight,
            config: &config,
        };

        let reasons = resolver.apply(&ctx).await.unwrap_err();
        assert_eq!(reasons.len(), 4);
        assert!(reasons[0].starts_with("local-collection:"));
        assert!(reasons[3].starts_with("team-library:"));
        assert!(host.applied_mode(&instance, "c1").is_none());
    }

    #[tokio::test]
    async fn diagnose_inventories_sources() {
        let (host, _) = host_with_instance();
        host.add_local_collection(theme_collection("c1"));
        host.add_library_collection(
            LibraryCollection {
                key: "lib".to_string(),
                name: "Tokens".to_string(),
                library_name: "DS".to_string(),
            },
            vec![],
            theme_collection("c9"),
        );

        let diagnostics = diagnose(&host).await.unwrap();
        assert_eq!(diagnostics.local_collections.len(), 1);
        assert_eq!(diagnostics.library_collections.len(), 1);
    }
}
