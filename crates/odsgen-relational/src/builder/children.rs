//! Child tables for commons and collections.

use super::columns::{self, ChildRequest};
use super::draft::{BuiltTable, TableDraft};
use super::strategy::BuildStrategy;
use crate::context::TableRef;
use crate::error::CompileError;
use crate::foreign_key::{PendingForeignKey, Relationship};
use crate::identity::{IdentityColumn, IdentityPropagator};
use crate::naming;
use crate::schema::{Column, TableKind};
use odsgen_model::{EntityId, PropertyKind, ScalarType};
use tracing::debug;

/// The table a child table hangs off.
#[derive(Debug, Clone)]
pub struct Owner {
    /// The owning table.
    pub table: TableRef,
    /// Its primary key.
    pub key: Vec<IdentityColumn>,
}

impl Owner {
    /// Owner for a finished table.
    pub fn of(built: &BuiltTable) -> Self {
        Self {
            table: built.table_ref(),
            key: built.key.clone(),
        }
    }
}

/// A table built from a common, remembered so common extensions can find it.
#[derive(Debug, Clone)]
pub struct CommonUsage {
    /// The common entity.
    pub common: EntityId,
    /// Table built for it.
    pub table: TableRef,
    /// Primary key of that table.
    pub key: Vec<IdentityColumn>,
    /// Strategy its members were emitted with.
    pub strategy: BuildStrategy,
}

/// Tables produced while building one entity.
#[derive(Debug, Default)]
pub struct BuildOutput {
    /// Finished tables, parents before children.
    pub tables: Vec<BuiltTable>,
    /// Tables built from commons.
    pub common_usages: Vec<CommonUsage>,
}

/// Build the child tables queued by the owner's properties, depth first.
pub fn build_children<'c>(
    identity: &mut IdentityPropagator<'c>,
    namespace: &str,
    owner: &Owner,
    requests: Vec<ChildRequest<'c>>,
    out: &mut BuildOutput,
) -> Result<(), CompileError> {
    for request in requests {
        build_child(identity, namespace, owner, request, out)?;
    }
    Ok(())
}

fn build_child<'c>(
    identity: &mut IdentityPropagator<'c>,
    namespace: &str,
    owner: &Owner,
    request: ChildRequest<'c>,
    out: &mut BuildOutput,
) -> Result<(), CompileError> {
    let ctx = identity.context();
    let ChildRequest {
        owner: declaring,
        property,
        strategy,
    } = request;
    let origin = format!("{}.{}", declaring.qualified_name(), property.full_name());

    let mut chain: Vec<&str> = vec![owner.table.name.as_str()];
    chain.extend(strategy.name_segments.iter().map(String::as_str));
    chain.push(property.name.as_str());
    let context = property.context.as_deref();

    let is_structure = matches!(
        property.kind,
        PropertyKind::Common { .. }
            | PropertyKind::InlineCommon { .. }
            | PropertyKind::Choice { .. }
    );
    let (name, kind) = match property.kind {
        PropertyKind::Reference { .. } => {
            (naming::concat_table_name(&chain, context), TableKind::Collection)
        }
        _ if is_structure => (naming::table_name(&chain, context), TableKind::Common),
        _ => (naming::table_name(&chain, context), TableKind::Collection),
    };

    let table = TableRef::new(namespace, name);
    debug!(table = %table, owner = %owner.table, origin = %origin, "building child table");

    let mut draft = TableDraft::new(table, kind, origin.as_str())
        .with_documentation(&property.documentation);
    draft.seed_key(&owner.key, &origin)?;
    draft.add_key_reference(Relationship::Owned, owner.table.clone(), &owner.key);
    draft
        .merges_mut()
        .add_directives(&strategy.path_prefix, &property, &origin)?;

    let child = strategy.child_table(&property);
    let path = strategy.property_path(&property);
    let mut grandchildren = Vec::new();
    let mut common = None;

    match &property.kind {
        PropertyKind::Common { .. }
        | PropertyKind::InlineCommon { .. }
        | PropertyKind::Choice { .. } => {
            let target = ctx.resolve_target(declaring, &property)?;
            let inner = ctx.entity(target);
            for member in &inner.properties {
                columns::emit_property(
                    identity,
                    &mut draft,
                    inner,
                    member,
                    &child,
                    &mut grandchildren,
                )?;
            }
            common = Some(target);
        }
        PropertyKind::Simple { scalar } | PropertyKind::SharedSimple { scalar, .. } => {
            let column = Column::new(naming::column_name(&property.name, context), *scalar)
                .with_documentation(&property.documentation);
            draft.add_column(column, true, vec![path], &origin)?;
        }
        PropertyKind::Reference { .. } => {
            let target = ctx.resolve_target(declaring, &property)?;
            let key = identity.entity_identity(target)?;
            for key_column in &key {
                let column = Column::new(
                    naming::column_name(&key_column.name, context),
                    key_column.data_type,
                );
                draft.add_column(column, true, key_column.prefixed_paths(&path), &origin)?;
            }
            let pairs = key
                .iter()
                .map(|k| ([path.as_slice(), k.path().as_slice()].concat(), k.name.clone()))
                .collect();
            draft.add_foreign_key(
                PendingForeignKey::new(Relationship::Reference, ctx.main_table(target)?, pairs)
                    .with_update_cascade(ctx.cascades_key_updates(target, &origin)),
            );
        }
        PropertyKind::Enumeration { .. } | PropertyKind::Descriptor { .. } => {
            let target = ctx.resolve_target(declaring, &property)?;
            let column = Column::new(
                columns::lookup_column_name(property.context_prefix(), &property),
                ScalarType::Integer,
            );
            draft.add_column(column, true, vec![path.clone()], &origin)?;
            let key = identity.entity_identity(target)?;
            let pairs = key.iter().map(|k| (path.clone(), k.name.clone())).collect();
            draft.add_foreign_key(PendingForeignKey::new(
                Relationship::Lookup,
                ctx.main_table(target)?,
                pairs,
            ));
        }
    }

    let built = draft.finish()?;
    let next_owner = Owner::of(&built);
    if let Some(common) = common {
        out.common_usages.push(CommonUsage {
            common,
            table: next_owner.table.clone(),
            key: next_owner.key.clone(),
            strategy: child,
        });
    }
    out.tables.push(built);
    build_children(identity, namespace, &next_owner, grandchildren, out)
}
