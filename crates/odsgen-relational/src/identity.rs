//! Identity Propagator: primary-key contributions of entities and properties.
//!
//! An entity's identity is the key of its main table. It is computed by running
//! the table builder over the entity's identity properties only, so references,
//! flattened structures, merges and subclass renames compose exactly as they do
//! when the full table is built. Results are memoized per entity.

use crate::builder::columns::{self, ChildRequest};
use crate::builder::draft::TableDraft;
use crate::builder::strategy::BuildStrategy;
use crate::context::{SchemaContext, TableRef};
use crate::error::{CompileError, CompileErrorKind};
use crate::naming;
use crate::schema::TableKind;
use odsgen_model::{Entity, EntityId, EntityKind, Property, PropertyKind, ScalarType};
use std::collections::HashMap;
use tracing::trace;

/// Chain of property full names leading to a column, starting at the table's root entity.
pub type PropertyPath = Vec<String>;

/// One column of an identity.
///
/// A column can be reached by more than one property path once merge directives
/// or subclass renames have collapsed duplicates; the first path is canonical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityColumn {
    /// Final column name.
    pub name: String,
    /// Column type.
    pub data_type: ScalarType,
    paths: Vec<PropertyPath>,
}

impl IdentityColumn {
    /// Create an identity column reached by one path.
    pub fn new(name: impl Into<String>, data_type: ScalarType, path: PropertyPath) -> Self {
        Self {
            name: name.into(),
            data_type,
            paths: vec![path],
        }
    }

    /// Add another path reaching this column.
    pub fn with_alias(mut self, path: PropertyPath) -> Self {
        if !self.paths.contains(&path) {
            self.paths.push(path);
        }
        self
    }

    /// The canonical path.
    pub fn path(&self) -> &PropertyPath {
        &self.paths[0]
    }

    /// Every path reaching this column.
    pub fn paths(&self) -> &[PropertyPath] {
        &self.paths
    }

    /// Every path, each prefixed with `prefix`.
    pub fn prefixed_paths(&self, prefix: &[String]) -> Vec<PropertyPath> {
        self.paths
            .iter()
            .map(|path| [prefix, path.as_slice()].concat())
            .collect()
    }

    /// Check whether `path` reaches this column.
    pub fn has_path(&self, path: &[String]) -> bool {
        self.paths.iter().any(|p| p == path)
    }
}

/// Computes and caches entity identities.
pub struct IdentityPropagator<'c> {
    ctx: &'c SchemaContext<'c>,
    cache: HashMap<EntityId, Vec<IdentityColumn>>,
    visiting: Vec<EntityId>,
}

impl<'c> IdentityPropagator<'c> {
    /// Create a propagator over `ctx`.
    pub fn new(ctx: &'c SchemaContext<'c>) -> Self {
        Self {
            ctx,
            cache: HashMap::new(),
            visiting: Vec::new(),
        }
    }

    /// The shared context.
    pub fn context(&self) -> &'c SchemaContext<'c> {
        self.ctx
    }

    /// Primary key of an entity's main table, sorted by column name.
    pub fn entity_identity(&mut self, id: EntityId) -> Result<Vec<IdentityColumn>, CompileError> {
        if let Some(key) = self.cache.get(&id) {
            return Ok(key.clone());
        }

        if let Some(start) = self.visiting.iter().position(|v| *v == id) {
            let chain: Vec<String> = self.visiting[start..]
                .iter()
                .chain(std::iter::once(&id))
                .map(|v| self.ctx.entity(*v).qualified_name())
                .collect();
            return Err(CompileError::identity_cycle(&chain));
        }

        let max_depth = self.ctx.config().max_identity_depth;
        if self.visiting.len() >= max_depth {
            return Err(CompileError::new(
                format!("identity nests deeper than {} entities", max_depth),
                self.ctx.entity(id).qualified_name(),
                CompileErrorKind::IdentityCycle,
            ));
        }

        self.visiting.push(id);
        let result = self.compute(id);
        self.visiting.pop();

        let key = result?;
        trace!(
            entity = %self.ctx.entity(id).qualified_name(),
            columns = key.len(),
            "computed identity"
        );
        self.cache.insert(id, key.clone());
        Ok(key)
    }

    /// Identity columns contributed by `property` as if it were an identity property of `owner`.
    ///
    /// Collections and commons contribute nothing to their owner's key.
    pub fn property_identity(
        &mut self,
        owner: &'c Entity,
        property: &Property,
    ) -> Result<Vec<IdentityColumn>, CompileError> {
        if property.is_collection || matches!(property.kind, PropertyKind::Common { .. }) {
            return Ok(Vec::new());
        }

        let mut as_key = property.clone();
        as_key.is_identity = true;
        as_key.is_required = true;
        as_key.merge_directives.clear();
        as_key.renames_identity = None;

        let mut draft = TableDraft::new(
            TableRef::new(&owner.namespace, &owner.name),
            TableKind::Entity,
            owner.qualified_name(),
        );
        let mut children = Vec::new();
        columns::emit_property(
            self,
            &mut draft,
            owner,
            &as_key,
            &BuildStrategy::identity_only(),
            &mut children,
        )?;
        Ok(draft.finish()?.key)
    }

    fn compute(&mut self, id: EntityId) -> Result<Vec<IdentityColumn>, CompileError> {
        let ctx = self.ctx;
        let entity = ctx.entity(id);
        match entity.kind {
            EntityKind::DomainEntity | EntityKind::Association | EntityKind::AbstractEntity => {
                let table = ctx.main_table(id)?;
                let mut draft = TableDraft::new(table, TableKind::Entity, entity.qualified_name());
                let strategy = BuildStrategy::identity_only();
                let mut children: Vec<ChildRequest<'c>> = Vec::new();
                for property in &entity.properties {
                    columns::emit_property(
                        self,
                        &mut draft,
                        entity,
                        property,
                        &strategy,
                        &mut children,
                    )?;
                }
                Ok(draft.finish()?.key)
            }
            EntityKind::DomainEntitySubclass | EntityKind::AssociationSubclass => {
                let base_id = ctx.resolve_base(id)?;
                let base_key = self.entity_identity(base_id)?;
                let table = ctx.main_table(id)?;
                let mut draft =
                    TableDraft::new(table, TableKind::Subclass, entity.qualified_name());
                let strategy = BuildStrategy::identity_only();
                let mut children: Vec<ChildRequest<'c>> = Vec::new();
                columns::seed_subclass_key(
                    self,
                    &mut draft,
                    entity,
                    ctx.entity(base_id),
                    &base_key,
                    &strategy,
                    &mut children,
                )?;
                for property in entity.properties.iter().filter(|p| p.renames_identity.is_none()) {
                    columns::emit_property(
                        self,
                        &mut draft,
                        entity,
                        property,
                        &strategy,
                        &mut children,
                    )?;
                }
                Ok(draft.finish()?.key)
            }
            EntityKind::Descriptor => {
                let name = naming::descriptor_column_name("", &entity.name);
                Ok(vec![IdentityColumn::new(
                    name.clone(),
                    ScalarType::Integer,
                    vec![name],
                )])
            }
            EntityKind::Enumeration => {
                let name = naming::surrogate_key_name(&naming::type_table_name(&entity.name));
                Ok(vec![IdentityColumn::new(
                    name.clone(),
                    ScalarType::Integer,
                    vec![name],
                )])
            }
            EntityKind::DomainEntityExtension | EntityKind::AssociationExtension => {
                let base_id = ctx.resolve_base(id)?;
                self.entity_identity(base_id)
            }
            EntityKind::Common
            | EntityKind::InlineCommon
            | EntityKind::Choice
            | EntityKind::CommonExtension => Err(CompileError::internal(format!(
                "{} {} has no identity of its own",
                entity.kind,
                entity.qualified_name()
            ))),
        }
    }
}
