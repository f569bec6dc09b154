//! Immutable lookup context shared by every compiler component.

use crate::config::CompileConfig;
use crate::error::CompileError;
use crate::naming;
use crate::update_cascade::UpdateCascades;
use odsgen_model::{Entity, EntityGraph, EntityId, EntityKind, NamespaceId, Property};

/// Namespace-qualified table name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    /// Namespace of the table.
    pub namespace: String,
    /// Table name.
    pub name: String,
}

impl TableRef {
    /// Create a table reference.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

/// Read-only view of the graph, its dependency order and the compile settings.
///
/// Built once per compile after the precondition pass, then passed explicitly to
/// every component instead of being held in shared state.
#[derive(Debug)]
pub struct SchemaContext<'g> {
    graph: &'g EntityGraph,
    config: &'g CompileConfig,
    namespace_order: Vec<NamespaceId>,
    update_cascades: UpdateCascades,
}

impl<'g> SchemaContext<'g> {
    /// Create a context. `namespace_order` must be a topological order of the graph's namespaces.
    pub fn new(
        graph: &'g EntityGraph,
        config: &'g CompileConfig,
        namespace_order: Vec<NamespaceId>,
    ) -> Self {
        Self {
            graph,
            config,
            namespace_order,
            update_cascades: UpdateCascades::analyze(graph),
        }
    }

    /// The entity graph.
    pub fn graph(&self) -> &'g EntityGraph {
        self.graph
    }

    /// The compile settings.
    pub fn config(&self) -> &'g CompileConfig {
        self.config
    }

    /// Namespaces in dependency order.
    pub fn namespace_order(&self) -> &[NamespaceId] {
        &self.namespace_order
    }

    /// Namespace names in dependency order.
    pub fn namespace_names(&self) -> Vec<&'g str> {
        self.namespace_order
            .iter()
            .map(|id| self.graph.namespace(*id).name.as_str())
            .collect()
    }

    /// Whether the reference declared at `origin` cascades key updates of `target`.
    pub fn cascades_key_updates(&self, target: EntityId, origin: &str) -> bool {
        self.update_cascades.cascades_through(target, origin)
    }

    /// Get an entity by id.
    pub fn entity(&self, id: EntityId) -> &'g Entity {
        self.graph.entity(id)
    }

    /// Resolve the target of a property declared on `owner`.
    pub fn resolve_target(
        &self,
        owner: &Entity,
        property: &Property,
    ) -> Result<EntityId, CompileError> {
        let path = format!("{}.{}", owner.qualified_name(), property.full_name());
        let target = property.kind.target().ok_or_else(|| {
            CompileError::internal(format!("{} has no target entity", path))
        })?;
        self.graph
            .lookup(target, property.kind.accepted_target_kinds())
            .ok_or_else(|| {
                CompileError::unresolved_reference(&path, &target.to_string(), property.kind.name())
            })
    }

    /// Resolve the base entity of a subclass or extension.
    pub fn resolve_base(&self, id: EntityId) -> Result<EntityId, CompileError> {
        let entity = self.entity(id);
        let path = entity.qualified_name();
        let base = entity.base_entity.as_ref().ok_or_else(|| {
            CompileError::invalid_base(&path, format!("{} has no base entity", entity.kind))
        })?;
        self.graph
            .lookup(base, entity.kind.accepted_base_kinds())
            .ok_or_else(|| {
                CompileError::invalid_base(
                    &path,
                    format!("base '{}' is not a valid base for a {}", base, entity.kind),
                )
            })
    }

    /// The table holding an entity's rows and primary key.
    pub fn main_table(&self, id: EntityId) -> Result<TableRef, CompileError> {
        let entity = self.entity(id);
        let table = match entity.kind {
            EntityKind::DomainEntity
            | EntityKind::Association
            | EntityKind::AbstractEntity
            | EntityKind::DomainEntitySubclass
            | EntityKind::AssociationSubclass => TableRef::new(&entity.namespace, &entity.name),
            EntityKind::Descriptor => {
                TableRef::new(&entity.namespace, naming::descriptor_table_name(&entity.name))
            }
            EntityKind::Enumeration => {
                TableRef::new(&entity.namespace, naming::type_table_name(&entity.name))
            }
            EntityKind::DomainEntityExtension | EntityKind::AssociationExtension => {
                return self.main_table(self.resolve_base(id)?);
            }
            EntityKind::Common
            | EntityKind::InlineCommon
            | EntityKind::Choice
            | EntityKind::CommonExtension => {
                return Err(CompileError::internal(format!(
                    "{} {} has no main table",
                    entity.kind,
                    entity.qualified_name()
                )))
            }
        };
        Ok(table)
    }

    /// Namespace receiving the shared `Descriptor` table.
    pub fn base_descriptor_namespace(&self) -> Option<&'g str> {
        if let Some(name) = &self.config.base_descriptor_namespace {
            return self.graph.get_namespace(name).map(|ns| ns.name.as_str());
        }
        self.namespace_order
            .iter()
            .map(|id| self.graph.namespace(*id))
            .find(|ns| !ns.is_extension)
            .or_else(|| self.namespace_order.first().map(|id| self.graph.namespace(*id)))
            .map(|ns| ns.name.as_str())
    }
}
