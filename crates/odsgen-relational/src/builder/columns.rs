//! Column emission for single-valued properties.

use super::draft::TableDraft;
use super::strategy::BuildStrategy;
use crate::error::{CompileError, CompileErrorKind};
use crate::foreign_key::{PendingForeignKey, Relationship};
use crate::identity::{IdentityColumn, IdentityPropagator};
use crate::naming;
use crate::schema::Column;
use odsgen_model::{Entity, Property, PropertyKind, ScalarType};

/// A property that gets a table of its own, to be built once its owner is finished.
#[derive(Debug, Clone)]
pub struct ChildRequest<'c> {
    /// Entity declaring the property.
    pub owner: &'c Entity,
    /// The property.
    pub property: Property,
    /// Strategy in effect where the property was declared.
    pub strategy: BuildStrategy,
}

fn origin_of(owner: &Entity, property: &Property) -> String {
    format!("{}.{}", owner.qualified_name(), property.full_name())
}

/// Emit the columns of `property` into `draft`.
///
/// Collections and commons are queued in `children` instead.
pub fn emit_property<'c>(
    identity: &mut IdentityPropagator<'c>,
    draft: &mut TableDraft,
    owner: &'c Entity,
    property: &Property,
    strategy: &BuildStrategy,
    children: &mut Vec<ChildRequest<'c>>,
) -> Result<(), CompileError> {
    if strategy.skips(property) {
        return Ok(());
    }
    if property.is_collection || matches!(property.kind, PropertyKind::Common { .. }) {
        if !strategy.identity_only {
            children.push(ChildRequest {
                owner,
                property: property.clone(),
                strategy: strategy.clone(),
            });
        }
        return Ok(());
    }

    let ctx = identity.context();
    let origin = origin_of(owner, property);
    let path = strategy.property_path(property);
    let prefix = strategy.property_prefix(property);
    let primary_key = strategy.is_primary_key(property);
    let nullable = strategy.is_nullable(property);

    draft
        .merges_mut()
        .add_directives(&strategy.path_prefix, property, &origin)?;

    match &property.kind {
        PropertyKind::Simple { scalar } | PropertyKind::SharedSimple { scalar, .. } => {
            let column = Column::new(format!("{}{}", prefix, property.name), *scalar)
                .with_nullable(nullable)
                .with_documentation(&property.documentation);
            draft.add_column(column, primary_key, vec![path], &origin)?;
        }
        PropertyKind::Reference { .. } => {
            let target = ctx.resolve_target(owner, property)?;
            let key = identity.entity_identity(target)?;
            for key_column in &key {
                let name = format!("{}{}", prefix, key_column.name);
                let column = Column::new(name, key_column.data_type)
                    .with_nullable(nullable)
                    .with_documentation(&property.documentation);
                draft.add_column(column, primary_key, key_column.prefixed_paths(&path), &origin)?;
            }
            let pairs = key
                .iter()
                .map(|k| ([path.as_slice(), k.path().as_slice()].concat(), k.name.clone()))
                .collect();
            draft.add_foreign_key(
                PendingForeignKey::new(
                    Relationship::for_reference(primary_key),
                    ctx.main_table(target)?,
                    pairs,
                )
                .with_update_cascade(ctx.cascades_key_updates(target, &origin)),
            );
        }
        PropertyKind::Enumeration { .. } | PropertyKind::Descriptor { .. } => {
            let target = ctx.resolve_target(owner, property)?;
            let name = lookup_column_name(&prefix, property);
            let column = Column::new(&name, ScalarType::Integer)
                .with_nullable(nullable)
                .with_documentation(&property.documentation);
            draft.add_column(column, primary_key, vec![path.clone()], &origin)?;
            let key = identity.entity_identity(target)?;
            let pairs = key.iter().map(|k| (path.clone(), k.name.clone())).collect();
            draft.add_foreign_key(PendingForeignKey::new(
                Relationship::Lookup,
                ctx.main_table(target)?,
                pairs,
            ));
        }
        PropertyKind::InlineCommon { .. } | PropertyKind::Choice { .. } => {
            let max_depth = ctx.config().max_identity_depth;
            if strategy.depth >= max_depth {
                return Err(CompileError::new(
                    format!("structures nest deeper than {}", max_depth),
                    origin,
                    CompileErrorKind::IdentityCycle,
                ));
            }
            let target = ctx.resolve_target(owner, property)?;
            let inner = ctx.entity(target);
            let is_choice = matches!(property.kind, PropertyKind::Choice { .. });
            let nested = strategy.flatten_into(property, is_choice);
            for member in &inner.properties {
                emit_property(identity, draft, inner, member, &nested, children)?;
            }
        }
        PropertyKind::Common { .. } => {}
    }
    Ok(())
}

/// Column name of an enumeration or descriptor property.
pub fn lookup_column_name(prefix: &str, property: &Property) -> String {
    match property.kind {
        PropertyKind::Descriptor { .. } => naming::descriptor_column_name(prefix, &property.name),
        _ => naming::enumeration_column_name(prefix, &property.name),
    }
}

/// Seed a subclass table with its base key, applying identity renames.
///
/// Base key columns produced by a renamed base property are not copied; their
/// paths become aliases of the renaming property's columns instead.
pub fn seed_subclass_key<'c>(
    identity: &mut IdentityPropagator<'c>,
    draft: &mut TableDraft,
    entity: &'c Entity,
    base: &Entity,
    base_key: &[IdentityColumn],
    strategy: &BuildStrategy,
    children: &mut Vec<ChildRequest<'c>>,
) -> Result<(), CompileError> {
    let renames: Vec<(String, &Property)> = entity
        .properties
        .iter()
        .filter_map(|p| {
            let renamed = p.renames_identity.as_ref()?;
            let full_name = base
                .get_property(renamed)
                .map(Property::full_name)
                .unwrap_or_else(|| renamed.clone());
            Some((full_name, p))
        })
        .collect();

    let origin = entity.qualified_name();
    for column in base_key {
        let renamed_by = renames.iter().find(|(base_name, _)| {
            column
                .paths()
                .iter()
                .any(|path| path.first() == Some(base_name))
        });
        match renamed_by {
            Some((base_name, renamer)) => {
                let renamed = column
                    .paths()
                    .iter()
                    .find(|path| path.first() == Some(base_name))
                    .map(|path| [&[renamer.full_name()][..], &path[1..]].concat())
                    .unwrap_or_else(|| vec![renamer.full_name()]);
                for path in column.paths() {
                    draft.merges_mut().add_alias(
                        path.clone(),
                        renamed.clone(),
                        column.data_type,
                        &origin,
                    );
                }
            }
            None => {
                draft.add_column(
                    Column::new(&column.name, column.data_type),
                    true,
                    column.paths().to_vec(),
                    &origin,
                )?;
            }
        }
    }

    for (_, renamer) in &renames {
        emit_property(identity, draft, entity, renamer, strategy, children)?;
    }
    Ok(())
}
