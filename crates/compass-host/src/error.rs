//! Host error taxonomy
//!
//! Distinguishes transient failures (worth retrying) from permanent ones.

/// Errors surfaced by host capability calls
#[derive(Debug, Clone, thiserror::Error)]
pub enum HostError {
    /// The addressed node does not exist (detached, deleted, wrong id)
    #[error("node not found: {0}")]
    NotFound(String),

    /// A previously valid node reference went stale (typically after a swap)
    #[error("stale node reference: {0}")]
    Stale(String),

    /// No property with the given name exists on the node
    #[error("property not found: {0}")]
    PropertyNotFound(String),

    /// Importing a component or variable by key failed
    #[error("import failed: {0}")]
    ImportFailed(String),

    /// The host does not support the requested operation in this context
    #[error("operation not supported: {0}")]
    Unsupported(String),

    /// Network failure while reaching the host's remote services
    #[error("network error: {0}")]
    Network(String),
}

impl HostError {
    /// Whether a retry of the same call may succeed
    ///
    /// Stale references heal once the subtree is re-fetched; network
    /// failures may clear. Everything else is permanent for this call.
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Stale(_) | Self::Network(_))
    }
}
