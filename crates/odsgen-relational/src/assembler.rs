//! Schema Assembler: the top-level compile driver.

use crate::builder::{lookup, BuiltTable, TableBuilder};
use crate::config::CompileConfig;
use crate::context::SchemaContext;
use crate::error::{CompileError, CompileErrors};
use crate::preconditions;
use crate::resource::ResourceColumnInjector;
use crate::schema::{check_invariants, NamespaceSchema, RelationalSchema};
use odsgen_model::{EntityGraph, EntityId, EntityKind};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Compile an entity graph into a relational schema.
pub fn compile(
    graph: &EntityGraph,
    config: &CompileConfig,
) -> Result<RelationalSchema, CompileErrors> {
    SchemaAssembler::new(graph, config).compile()
}

/// Drives one compile: preconditions, identity, table building, resource columns
/// and final assembly.
#[derive(Debug)]
pub struct SchemaAssembler<'g> {
    graph: &'g EntityGraph,
    config: &'g CompileConfig,
}

impl<'g> SchemaAssembler<'g> {
    /// Create an assembler.
    pub fn new(graph: &'g EntityGraph, config: &'g CompileConfig) -> Self {
        Self { graph, config }
    }

    /// Run the compile.
    ///
    /// Either every table of the graph is returned or every error found.
    pub fn compile(&self) -> Result<RelationalSchema, CompileErrors> {
        let order = preconditions::check(self.graph, self.config)?;
        let ctx = SchemaContext::new(self.graph, self.config, order);
        info!(
            namespaces = ctx.namespace_order().len(),
            entities = self.graph.len(),
            dialect = %self.config.dialect,
            "compiling entity graph"
        );

        let mut builder = TableBuilder::new(&ctx);
        let mut errors = Vec::new();

        for (id, entity) in self.graph.entities() {
            if has_identity(entity.kind) {
                if let Err(error) = builder.identity().entity_identity(id) {
                    errors.push(error);
                }
            }
        }
        if !errors.is_empty() {
            return Err(CompileErrors::new(errors));
        }

        let mut tables = build_in_order(&ctx, &mut builder, &mut errors);

        if self.graph.contains_kind(EntityKind::Descriptor) {
            match ctx.base_descriptor_namespace() {
                Some(namespace) => tables.push(BuiltTable {
                    table: lookup::descriptor_base_table(namespace),
                    key: Vec::new(),
                    origin: lookup::DESCRIPTOR_TABLE.to_string(),
                }),
                None => errors.push(CompileError::internal(
                    "no namespace can hold the shared descriptor table",
                )),
            }
        }

        let injector = ResourceColumnInjector::new(self.config);
        for built in &mut tables {
            injector.inject(&mut built.table);
        }

        let mut origins: HashMap<(String, String), String> = HashMap::new();
        let mut unique = Vec::with_capacity(tables.len());
        for built in tables {
            let key = (built.table.namespace.clone(), built.table.name.clone());
            if let Some(first) = origins.get(&key) {
                errors.push(CompileError::name_collision(
                    &built.table.qualified_name(),
                    first,
                    &built.origin,
                ));
                continue;
            }
            origins.insert(key, built.origin.clone());
            unique.push(built);
        }

        if !errors.is_empty() {
            return Err(CompileErrors::new(errors));
        }

        let schema = group_by_namespace(&ctx, unique);

        let violations = check_invariants(&schema);
        debug_assert!(violations.is_empty(), "schema invariants broken: {:?}", violations);
        if let Some(first) = violations.first() {
            return Err(CompileError::internal(format!(
                "assembled schema is inconsistent: {} ({} violations)",
                first,
                violations.len()
            ))
            .into());
        }

        info!(
            namespaces = schema.namespaces.len(),
            tables = schema.table_count(),
            "compiled relational schema"
        );
        Ok(schema)
    }
}

/// Entities other tables may reference by key.
fn has_identity(kind: EntityKind) -> bool {
    matches!(
        kind,
        EntityKind::DomainEntity
            | EntityKind::Association
            | EntityKind::AbstractEntity
            | EntityKind::DomainEntitySubclass
            | EntityKind::AssociationSubclass
            | EntityKind::Descriptor
            | EntityKind::Enumeration
    )
}

/// Build every entity, deferring those whose base has not been built yet.
///
/// Common extensions wait until everything else is built, since they extend every
/// table built from their common.
fn build_in_order(
    ctx: &SchemaContext<'_>,
    builder: &mut TableBuilder<'_>,
    errors: &mut Vec<CompileError>,
) -> Vec<BuiltTable> {
    let graph = ctx.graph();
    let mut pending: Vec<EntityId> = ctx
        .namespace_names()
        .into_iter()
        .flat_map(|namespace| graph.entities_in(namespace))
        .filter(|(_, entity)| !entity.kind.is_composition())
        .map(|(id, _)| id)
        .collect();
    let mut built: HashSet<EntityId> = HashSet::new();
    let mut tables = Vec::new();

    while !pending.is_empty() {
        let others_pending = pending
            .iter()
            .any(|id| graph.entity(*id).kind != EntityKind::CommonExtension);
        let mut deferred = Vec::new();

        for id in pending.iter().copied() {
            if let Some(waiting_on) = waiting_on(ctx, id, &built, others_pending) {
                debug!(
                    entity = %graph.entity(id).qualified_name(),
                    waiting_on = %waiting_on,
                    "deferring entity"
                );
                deferred.push((id, waiting_on));
                continue;
            }
            match builder.build_entity(id) {
                Ok(entity_tables) => {
                    for table in &entity_tables {
                        debug!(
                            table = %table.table.qualified_name(),
                            columns = table.table.columns.len(),
                            "built table"
                        );
                    }
                    tables.extend(entity_tables);
                }
                Err(error) => errors.push(error),
            }
            built.insert(id);
        }

        if deferred.len() == pending.len() {
            for (id, waiting_on) in deferred {
                errors.push(CompileError::unresolvable_dependency(
                    &graph.entity(id).qualified_name(),
                    &waiting_on,
                ));
            }
            break;
        }
        pending = deferred.into_iter().map(|(id, _)| id).collect();
    }
    tables
}

/// What an entity still waits for, if anything.
fn waiting_on(
    ctx: &SchemaContext<'_>,
    id: EntityId,
    built: &HashSet<EntityId>,
    others_pending: bool,
) -> Option<String> {
    let entity = ctx.entity(id);
    if entity.kind == EntityKind::CommonExtension {
        return others_pending.then(|| "every non-extension entity".to_string());
    }
    if !(entity.kind.is_subclass() || entity.kind.is_extension()) {
        return None;
    }
    // An unresolvable base is reported by the builder.
    let base = ctx.resolve_base(id).ok()?;
    (!built.contains(&base)).then(|| ctx.entity(base).qualified_name())
}

fn group_by_namespace(ctx: &SchemaContext<'_>, tables: Vec<BuiltTable>) -> RelationalSchema {
    let mut by_namespace: HashMap<String, Vec<_>> = HashMap::new();
    for built in tables {
        by_namespace
            .entry(built.table.namespace.clone())
            .or_default()
            .push(built.table);
    }

    let namespaces = ctx
        .namespace_names()
        .into_iter()
        .map(|namespace| {
            let mut tables = by_namespace.remove(namespace).unwrap_or_default();
            tables.sort_by(|a, b| a.name.cmp(&b.name));
            NamespaceSchema {
                namespace: namespace.to_string(),
                tables,
            }
        })
        .collect();
    RelationalSchema { namespaces }
}
