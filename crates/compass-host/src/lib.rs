//! Compass Host Interfaces
//!
//! Capability seams between the migration engine and the design-document
//! host. The engine never touches the document tree directly; everything
//! goes through these traits:
//!
//! - [`DocumentHost`]: node enumeration, component resolution, property
//!   read/write, instance swapping, component import
//! - [`VariableHost`]: variable collections, modes, and library access
//!
//! The host owns the document. Calls may fail transiently (stale node
//! references after a swap) and callers are expected to retry.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod document;
mod error;
mod node;
mod variables;

pub use document::DocumentHost;
pub use error::HostError;
pub use node::{
    ComponentKey, ComponentRef, ComponentSetRef, NodeId, NodeKind, NodeRef, PageRef,
    PropertyValue,
};
pub use variables::{
    LibraryCollection, LibraryVariable, VariableCollection, VariableHost, VariableMode,
    VariableRef,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
