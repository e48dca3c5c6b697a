//! Compass Component Registry
//!
//! The read-only-at-runtime table of known deprecated components and their
//! replacement mappings. A separate offline tool regenerates the JSON file
//! this crate loads; at engine runtime the registry only answers queries.
//!
//! # Invariants
//!
//! - Derived metadata counts always equal counts over `components` and
//!   `mappings` (recomputed on every write).
//! - A mapping below the validation confidence threshold cannot be
//!   auto-validated.
//! - Mapping targets must be non-deprecated.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod registry;
mod types;

pub use error::RegistryError;
pub use registry::ComponentRegistry;
pub use types::{
    ComponentDescriptor, ComponentKind, ComponentMapping, MappingEndpoint, PropertyMapping,
    RegistryMetadata, ValidationStatus, VALIDATION_THRESHOLD,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
