//! Engine error taxonomy
//!
//! Two tiers: [`MigrationError`] is fatal for a single instance (the
//! batch keeps going), [`EngineError`] is fatal for a whole request and
//! is what protocol handlers convert into an `error` response.

use compass_host::HostError;
use compass_registry::RegistryError;

/// Failure that aborts migrating one instance
#[derive(Debug, Clone, thiserror::Error)]
pub enum MigrationError {
    /// The replacement component could not be located or imported
    #[error("target component unavailable: {0}")]
    TargetUnavailable(String),

    /// The component swap itself failed; the instance is untouched
    #[error("component swap failed: {0}")]
    SwapFailed(String),

    /// No replacement mapping is registered for the source component
    #[error("no mapping registered for source key {0}")]
    NoMapping(String),

    /// A host call failed in a non-recoverable way
    #[error(transparent)]
    Host(#[from] HostError),
}

/// Failure that aborts a whole engine request
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Instance migration failure surfaced at request level
    #[error(transparent)]
    Migration(#[from] MigrationError),

    /// Registry load or mutation failure
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Host capability failure outside a migration
    #[error("host error: {0}")]
    Host(HostError),

    /// A request payload could not be decoded
    #[error("malformed request: {0}")]
    BadRequest(#[from] serde_json::Error),
}

impl From<HostError> for EngineError {
    fn from(e: HostError) -> Self {
        Self::Host(e)
    }
}
