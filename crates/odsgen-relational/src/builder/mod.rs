//! Table Builder: materializes the tables of each buildable entity.

pub mod children;
pub mod columns;
pub mod draft;
pub mod lookup;
pub mod strategy;

pub use children::{BuildOutput, CommonUsage, Owner};
pub use draft::{BuiltTable, TableDraft};
pub use strategy::BuildStrategy;

use crate::context::{SchemaContext, TableRef};
use crate::error::CompileError;
use crate::foreign_key::{PendingForeignKey, Relationship};
use crate::identity::{IdentityColumn, IdentityPropagator};
use crate::naming;
use crate::schema::{Column, TableKind};
use odsgen_model::{Entity, EntityId, EntityKind, ScalarType};
use tracing::debug;

/// Builds tables entity by entity, remembering common tables for later extensions.
pub struct TableBuilder<'c> {
    identity: IdentityPropagator<'c>,
    common_usages: Vec<CommonUsage>,
}

impl<'c> TableBuilder<'c> {
    /// Create a builder over `ctx`.
    pub fn new(ctx: &'c SchemaContext<'c>) -> Self {
        Self {
            identity: IdentityPropagator::new(ctx),
            common_usages: Vec::new(),
        }
    }

    /// The identity propagator shared by every table built.
    pub fn identity(&mut self) -> &mut IdentityPropagator<'c> {
        &mut self.identity
    }

    /// Tables built from commons so far.
    pub fn common_usages(&self) -> &[CommonUsage] {
        &self.common_usages
    }

    /// Build every table owned by an entity.
    ///
    /// Composition entities produce nothing on their own; they are built where used.
    pub fn build_entity(&mut self, id: EntityId) -> Result<Vec<BuiltTable>, CompileError> {
        let ctx = self.identity.context();
        let entity = ctx.entity(id);
        debug!(entity = %entity.qualified_name(), kind = %entity.kind, "building entity");

        match entity.kind {
            EntityKind::DomainEntity | EntityKind::Association | EntityKind::AbstractEntity => {
                self.build_main(id, entity)
            }
            EntityKind::DomainEntitySubclass | EntityKind::AssociationSubclass => {
                self.build_subclass(id, entity)
            }
            EntityKind::DomainEntityExtension | EntityKind::AssociationExtension => {
                self.build_extension(id, entity)
            }
            EntityKind::CommonExtension => self.build_common_extension(id, entity),
            EntityKind::Descriptor => self.build_descriptor(id, entity),
            EntityKind::Enumeration => {
                let name = naming::type_table_name(&entity.name);
                let key = self.identity.entity_identity(id)?;
                let table = lookup::type_table(
                    &entity.namespace,
                    &name,
                    &entity.enumeration_items,
                    TableKind::Enumeration,
                    &entity.documentation,
                );
                Ok(vec![BuiltTable {
                    table,
                    key,
                    origin: entity.qualified_name(),
                }])
            }
            EntityKind::Common | EntityKind::InlineCommon | EntityKind::Choice => Ok(Vec::new()),
        }
    }

    fn build_main(
        &mut self,
        id: EntityId,
        entity: &'c Entity,
    ) -> Result<Vec<BuiltTable>, CompileError> {
        let ctx = self.identity.context();
        let mut draft =
            TableDraft::new(ctx.main_table(id)?, TableKind::Entity, entity.qualified_name())
                .with_documentation(&entity.documentation);
        let strategy = BuildStrategy::root();
        let mut requests = Vec::new();
        for property in &entity.properties {
            columns::emit_property(
                &mut self.identity,
                &mut draft,
                entity,
                property,
                &strategy,
                &mut requests,
            )?;
        }
        let built = draft.finish()?;
        let owner = Owner::of(&built);
        self.with_children(&entity.namespace, vec![built], &owner, requests)
    }

    fn build_subclass(
        &mut self,
        id: EntityId,
        entity: &'c Entity,
    ) -> Result<Vec<BuiltTable>, CompileError> {
        let ctx = self.identity.context();
        let base_id = ctx.resolve_base(id)?;
        let base_key = self.identity.entity_identity(base_id)?;

        let mut draft =
            TableDraft::new(ctx.main_table(id)?, TableKind::Subclass, entity.qualified_name())
                .with_documentation(&entity.documentation);
        let strategy = BuildStrategy::root();
        let mut requests = Vec::new();
        columns::seed_subclass_key(
            &mut self.identity,
            &mut draft,
            entity,
            ctx.entity(base_id),
            &base_key,
            &strategy,
            &mut requests,
        )?;
        draft.add_key_reference(Relationship::Subclass, ctx.main_table(base_id)?, &base_key);
        for property in entity.properties.iter().filter(|p| p.renames_identity.is_none()) {
            columns::emit_property(
                &mut self.identity,
                &mut draft,
                entity,
                property,
                &strategy,
                &mut requests,
            )?;
        }
        let built = draft.finish()?;
        let owner = Owner::of(&built);
        self.with_children(&entity.namespace, vec![built], &owner, requests)
    }

    /// `<Base>Extension` plus the extension's child tables, which hang off the base table.
    fn build_extension(
        &mut self,
        id: EntityId,
        entity: &'c Entity,
    ) -> Result<Vec<BuiltTable>, CompileError> {
        let ctx = self.identity.context();
        let base_id = ctx.resolve_base(id)?;
        let owner = Owner {
            table: ctx.main_table(base_id)?,
            key: self.identity.entity_identity(base_id)?,
        };
        let table = TableRef::new(
            &entity.namespace,
            naming::extension_table_name(&owner.table.name),
        );
        self.build_extension_of(entity, table, TableKind::Extension, &owner, &BuildStrategy::root())
    }

    fn build_common_extension(
        &mut self,
        id: EntityId,
        entity: &'c Entity,
    ) -> Result<Vec<BuiltTable>, CompileError> {
        let ctx = self.identity.context();
        let common = ctx.resolve_base(id)?;
        let usages: Vec<CommonUsage> = self
            .common_usages
            .iter()
            .filter(|usage| usage.common == common)
            .cloned()
            .collect();
        if usages.is_empty() {
            debug!(entity = %entity.qualified_name(), "extended common is never used");
        }

        let mut tables = Vec::new();
        for usage in usages {
            let owner = Owner {
                table: usage.table.clone(),
                key: usage.key.clone(),
            };
            let table = TableRef::new(
                &entity.namespace,
                naming::extension_table_name(&usage.table.name),
            );
            tables.extend(self.build_extension_of(
                entity,
                table,
                TableKind::CommonExtension,
                &owner,
                &usage.strategy,
            )?);
        }
        Ok(tables)
    }

    fn build_extension_of(
        &mut self,
        entity: &'c Entity,
        table: TableRef,
        kind: TableKind,
        owner: &Owner,
        strategy: &BuildStrategy,
    ) -> Result<Vec<BuiltTable>, CompileError> {
        let origin = entity.qualified_name();
        let mut draft =
            TableDraft::new(table, kind, origin.as_str()).with_documentation(&entity.documentation);
        draft.seed_key(&owner.key, &origin)?;
        draft.add_key_reference(Relationship::Owned, owner.table.clone(), &owner.key);
        let seeded = draft.column_count();

        let mut requests = Vec::new();
        for property in &entity.properties {
            columns::emit_property(
                &mut self.identity,
                &mut draft,
                entity,
                property,
                strategy,
                &mut requests,
            )?;
        }
        let has_columns = draft.column_count() > seeded;
        let built = draft.finish()?;

        let tables = if has_columns {
            vec![built]
        } else {
            debug!(
                table = %built.table.qualified_name(),
                "extension adds no columns, table skipped"
            );
            Vec::new()
        };
        self.with_children(&entity.namespace, tables, owner, requests)
    }

    /// `<Name>Descriptor` keyed by the shared descriptor id, plus its map-type table.
    fn build_descriptor(
        &mut self,
        id: EntityId,
        entity: &'c Entity,
    ) -> Result<Vec<BuiltTable>, CompileError> {
        let ctx = self.identity.context();
        let origin = entity.qualified_name();
        let table = ctx.main_table(id)?;
        let key = self.identity.entity_identity(id)?;
        let base_namespace = ctx.base_descriptor_namespace().ok_or_else(|| {
            CompileError::internal(format!(
                "no namespace can hold the descriptor table for {}",
                origin
            ))
        })?;

        let mut draft = TableDraft::new(table, TableKind::Descriptor, origin.as_str())
            .with_documentation(&entity.documentation);
        draft.seed_key(&key, &origin)?;
        draft.add_foreign_key(PendingForeignKey::new(
            Relationship::DescriptorBase,
            TableRef::new(base_namespace, lookup::DESCRIPTOR_TABLE),
            key.iter()
                .map(|k| (k.path().clone(), lookup::DESCRIPTOR_ID.to_string()))
                .collect(),
        ));

        let mut map_table = None;
        if let Some(map_type) = &entity.map_type {
            let name = naming::type_table_name(&entity.name);
            let column_name = naming::surrogate_key_name(&name);
            let column = Column::new(&column_name, ScalarType::Integer)
                .with_nullable(!map_type.is_required);
            draft.add_column(column, false, vec![vec![column_name.clone()]], &origin)?;
            draft.add_foreign_key(PendingForeignKey::new(
                Relationship::Lookup,
                TableRef::new(&entity.namespace, &name),
                vec![(vec![column_name.clone()], column_name.clone())],
            ));
            let map = lookup::type_table(
                &entity.namespace,
                &name,
                &map_type.items,
                TableKind::MapType,
                &entity.documentation,
            );
            map_table = Some(BuiltTable {
                table: map,
                key: vec![IdentityColumn::new(
                    column_name.clone(),
                    ScalarType::Integer,
                    vec![column_name],
                )],
                origin: origin.clone(),
            });
        }

        let strategy = BuildStrategy::root().suppressing_primary_key();
        let mut requests = Vec::new();
        for property in &entity.properties {
            columns::emit_property(
                &mut self.identity,
                &mut draft,
                entity,
                property,
                &strategy,
                &mut requests,
            )?;
        }
        let built = draft.finish()?;
        let owner = Owner::of(&built);
        let mut tables = vec![built];
        tables.extend(map_table);
        self.with_children(&entity.namespace, tables, &owner, requests)
    }

    fn with_children(
        &mut self,
        namespace: &str,
        mut tables: Vec<BuiltTable>,
        owner: &Owner,
        requests: Vec<columns::ChildRequest<'c>>,
    ) -> Result<Vec<BuiltTable>, CompileError> {
        let mut out = BuildOutput::default();
        children::build_children(&mut self.identity, namespace, owner, requests, &mut out)?;
        self.common_usages.extend(out.common_usages);
        tables.extend(out.tables);
        Ok(tables)
    }
}
