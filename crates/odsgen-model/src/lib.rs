//! Entity metamodel for the odsgen table generator.
//!
//! The graph produced here is the already-linked, already-validated input of the
//! relational compiler: namespaces, entities of every kind and their properties,
//! stored in an arena and addressed by [`EntityId`]. Nothing in this crate mutates
//! a graph after construction.

pub mod entity;
pub mod error;
pub mod graph;
pub mod namespace;
pub mod property;
pub mod types;

pub use entity::{Entity, EntityKind, EnumerationItem, MapType};
pub use error::ModelError;
pub use graph::{EntityGraph, EntityId, GraphDocument, NamespaceId};
pub use namespace::Namespace;
pub use property::{EntityRef, MergeDirective, Property, PropertyKind};
pub use types::ScalarType;
