//! Registry error types

/// Errors raised by registry loading and mutation
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Registry file could not be read or written
    #[error("registry io error: {0}")]
    Io(#[from] std::io::Error),

    /// Registry file is not valid JSON or violates the schema
    #[error("registry parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Referenced component id does not exist
    #[error("component not found: {0}")]
    ComponentNotFound(String),

    /// Mapping index out of range
    #[error("invalid mapping index: {0}")]
    InvalidMappingIndex(usize),

    /// Confidence is below the auto-validation threshold
    #[error("confidence {confidence} below validation threshold {threshold}")]
    ConfidenceTooLow {
        /// The mapping's confidence
        confidence: u8,
        /// Required minimum
        threshold: u8,
    },

    /// Mapping targets a deprecated component
    #[error("mapping target {0} is deprecated")]
    DeprecatedTarget(String),
}
