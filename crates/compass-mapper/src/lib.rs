//! Compass Property Mapper
//!
//! Pure translation of a deprecated Button-shaped property bag into an
//! Action-shaped one. Deterministic, no I/O, safe to unit test directly.
//!
//! # Core Concepts
//!
//! - [`map_properties`]: the mapping function
//! - [`SourceProperties`]: captured Button configuration (raw host strings)
//! - [`TargetProperties`] / [`TargetVariant`]: derived Action configuration
//! - [`IconPlan`]: which target slot receives the source icon
//! - [`PropertyTable`]: typed lookup from logical properties to the host's
//!   punctuation-suffixed physical property names
//!
//! Mapping never fails: unrecognized enum values fall back to documented
//! defaults and append a warning naming the bad value.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod mapping;
mod source;
mod table;
mod target;

pub use mapping::{map_properties, IconNonePolicy, MapperPolicy, MappingResult};
pub use source::{IconKind, IconRef, SourceProperties};
pub use table::{LogicalProperty, PropertyTable};
pub use target::{
    IconPlan, IconSlot, TargetProperties, TargetSize, TargetState, TargetStyle, TargetVariant,
    ThemeMode,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
