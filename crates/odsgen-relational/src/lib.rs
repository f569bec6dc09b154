//! Entity-to-relational schema compiler.
//!
//! Takes a resolved [`EntityGraph`](odsgen_model::EntityGraph) and produces a
//! [`RelationalSchema`]: tables, columns, primary keys and foreign keys with
//! explicit cascade-delete semantics, grouped by namespace.
//!
//! # Example
//!
//! ```
//! use odsgen_model::{Entity, EntityGraph, Namespace, Property, ScalarType};
//! use odsgen_relational::{compile, CompileConfig};
//!
//! let graph = EntityGraph::new(
//!     vec![Namespace::core("EdFi")],
//!     vec![Entity::domain_entity("EdFi", "School")
//!         .with_property(Property::simple("SchoolId", ScalarType::Integer).identity())],
//! )
//! .unwrap();
//!
//! let schema = compile(&graph, &CompileConfig::default()).unwrap();
//! let school = schema.get_table("EdFi", "School").unwrap();
//! assert_eq!(school.primary_key, vec!["SchoolId"]);
//! ```

pub mod assembler;
pub mod builder;
pub mod config;
pub mod context;
pub mod error;
pub mod foreign_key;
pub mod identity;
pub mod merge;
pub mod naming;
pub mod preconditions;
pub mod resource;
pub mod schema;
pub mod update_cascade;

pub use assembler::{compile, SchemaAssembler};
pub use config::{CompileConfig, Dialect};
pub use context::{SchemaContext, TableRef};
pub use error::{CompileError, CompileErrorKind, CompileErrors, OdsError};
pub use foreign_key::Relationship;
pub use identity::{IdentityColumn, IdentityPropagator, PropertyPath};
pub use schema::{
    Column, ForeignKey, InvariantViolation, NamespaceSchema, RelationalSchema, SeedRow, Table,
    TableKind,
};
pub use update_cascade::UpdateCascades;
