//! Compass Migration Engine
//!
//! Finds instances of deprecated components in a design document and
//! migrates them to their registered replacements: variant-aware swap,
//! translated property application with bounded retries, icon transfer,
//! and theme-mode binding, orchestrated in concurrent batches.
//!
//! # Core Concepts
//!
//! - [`InstanceLocator`]: scoped search, registry classification, grouping
//! - [`MigrationEngine`]: the per-instance phase machine
//! - [`ThemeResolver`]: ordered acquisition strategies for theme modes
//! - [`BatchOrchestrator`]: bounded concurrency and progress accounting
//! - [`Session`]: the message-protocol surface; no error escapes uncaught

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod batch;
mod config;
mod engine;
mod error;
mod locator;
mod protocol;
mod remote;
mod setter;
mod subtree;
mod theme;

pub use batch::{BatchOrchestrator, BatchReport, MigrationProgress};
pub use config::{EngineConfig, API_TOKEN_ENV, DEFAULT_BATCH_SIZE, MAX_PROPERTY_RETRIES};
pub use engine::{MigrationEngine, MigrationOutcome, MigrationPhase};
pub use error::{EngineError, MigrationError};
pub use locator::{DeprecatedComponentGroup, FoundInstance, InstanceLocator, SearchScope};
pub use protocol::{Request, Response, Session};
pub use remote::{
    HttpVariablesApi, NoRemote, RemoteCollection, RemoteVariable, RemoteVariables, VariablesApi,
};
pub use subtree::SwapGeneration;
pub use theme::{
    diagnose, AppliedTheme, CachedBridgeStrategy, CachedVariable, LiveRemoteStrategy,
    LocalCollectionStrategy, Skip, TeamLibraryStrategy, ThemeContext, ThemeDiagnostics,
    ThemeResolver, ThemeStrategy, VariableCache, MAX_BRIDGE_VARIABLES, THEME_COLLECTION_NAME,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
