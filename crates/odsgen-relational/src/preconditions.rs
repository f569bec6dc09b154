//! Graph precondition checks run before any table is built.
//!
//! Every violation in the graph is collected so one compile reports them all.

use crate::config::CompileConfig;
use crate::error::{CompileError, CompileErrorKind, CompileErrors};
use odsgen_model::{Entity, EntityGraph, Namespace, NamespaceId};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Validate the graph and return its namespaces in dependency order.
pub fn check(
    graph: &EntityGraph,
    config: &CompileConfig,
) -> Result<Vec<NamespaceId>, CompileErrors> {
    let mut errors = Vec::new();
    let order = namespace_order(graph, &mut errors);

    if let Some(namespace) = &config.base_descriptor_namespace {
        if graph.get_namespace(namespace).is_none() {
            errors.push(CompileError::new(
                format!("descriptor namespace '{}' is not defined", namespace),
                namespace.as_str(),
                CompileErrorKind::UnknownNamespace,
            ));
        }
    }

    let visible = visibility(graph);
    for (_, entity) in graph.entities() {
        check_entity(graph, &visible, entity, &mut errors);
    }

    if errors.is_empty() {
        debug!(namespaces = order.len(), "graph preconditions hold");
        Ok(order)
    } else {
        Err(CompileErrors::new(errors))
    }
}

/// Topological order of namespaces; ties keep declaration order.
fn namespace_order(graph: &EntityGraph, errors: &mut Vec<CompileError>) -> Vec<NamespaceId> {
    let namespaces: Vec<(NamespaceId, &Namespace)> = graph.namespaces().collect();

    for (_, namespace) in &namespaces {
        for dependency in &namespace.dependencies {
            match graph.get_namespace(dependency) {
                None => errors.push(CompileError::unknown_namespace(&namespace.name, dependency)),
                Some(target) if !namespace.is_extension && target.is_extension => errors.push(
                    CompileError::invalid_namespace_dependency(&namespace.name, dependency),
                ),
                Some(_) => {}
            }
        }
    }

    let mut order = Vec::with_capacity(namespaces.len());
    let mut placed: HashSet<&str> = HashSet::new();
    while let Some((id, namespace)) = namespaces.iter().find(|(_, ns)| {
        !placed.contains(ns.name.as_str())
            && ns.dependencies.iter().all(|dep| {
                placed.contains(dep.as_str()) || graph.get_namespace(dep).is_none()
            })
    }) {
        order.push(*id);
        placed.insert(namespace.name.as_str());
    }

    if order.len() < namespaces.len() {
        let remaining: Vec<String> = namespaces
            .iter()
            .filter(|(_, ns)| !placed.contains(ns.name.as_str()))
            .map(|(_, ns)| ns.name.clone())
            .collect();
        errors.push(CompileError::namespace_cycle(&remaining));
    }
    order
}

/// Namespaces visible from each namespace: itself and its transitive dependencies.
fn visibility(graph: &EntityGraph) -> HashMap<&str, HashSet<&str>> {
    let mut visible = HashMap::new();
    for (_, namespace) in graph.namespaces() {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut stack = vec![namespace];
        while let Some(current) = stack.pop() {
            if !seen.insert(current.name.as_str()) {
                continue;
            }
            stack.extend(
                current
                    .dependencies
                    .iter()
                    .filter_map(|dep| graph.get_namespace(dep)),
            );
        }
        visible.insert(namespace.name.as_str(), seen);
    }
    visible
}

fn check_entity(
    graph: &EntityGraph,
    visible: &HashMap<&str, HashSet<&str>>,
    entity: &Entity,
    errors: &mut Vec<CompileError>,
) {
    let path = entity.qualified_name();
    let is_visible = |namespace: &str| {
        visible
            .get(entity.namespace.as_str())
            .is_some_and(|v| v.contains(namespace))
    };

    let mut base_entity = None;
    match (&entity.base_entity, entity.kind.requires_base()) {
        (None, true) => errors.push(CompileError::invalid_base(
            &path,
            format!("a {} needs a base entity", entity.kind),
        )),
        (Some(base), true) => match graph.lookup(base, entity.kind.accepted_base_kinds()) {
            None => errors.push(CompileError::invalid_base(
                &path,
                format!("'{}' is not a valid base for a {}", base, entity.kind),
            )),
            Some(id) if !is_visible(&graph.entity(id).namespace) => {
                errors.push(CompileError::invalid_base(
                    &path,
                    format!(
                        "base '{}' is not visible from namespace '{}'",
                        base, entity.namespace
                    ),
                ))
            }
            Some(id) => base_entity = Some(graph.entity(id)),
        },
        (Some(base), false) => errors.push(CompileError::invalid_base(
            &path,
            format!("a {} cannot have base '{}'", entity.kind, base),
        )),
        (None, false) => {}
    }

    for property in &entity.properties {
        let property_path = format!("{}.{}", path, property.full_name());

        if let Some(target) = property.kind.target() {
            match graph.lookup(target, property.kind.accepted_target_kinds()) {
                None => errors.push(CompileError::unresolved_reference(
                    &property_path,
                    &target.to_string(),
                    property.kind.name(),
                )),
                Some(id) if !is_visible(&graph.entity(id).namespace) => {
                    errors.push(CompileError::unresolved_reference(
                        &property_path,
                        &target.to_string(),
                        &format!(
                            "{} visible from namespace '{}'",
                            property.kind.name(),
                            entity.namespace
                        ),
                    ))
                }
                Some(_) => {}
            }
        }

        if property.is_collection && property.is_identity {
            errors.push(CompileError::collection_identity(&property_path));
        }

        for directive in &property.merge_directives {
            if directive.source_segments().first() != Some(&property.full_name()) {
                errors.push(CompileError::invalid_merge(
                    &property_path,
                    format!(
                        "merge source '{}' must start with '{}'",
                        directive.source_path,
                        property.full_name()
                    ),
                ));
            }
            if directive.target_segments().is_empty() {
                errors.push(CompileError::invalid_merge(
                    &property_path,
                    "merge target path is empty",
                ));
            }
        }

        if let Some(renamed) = &property.renames_identity {
            if !entity.kind.is_subclass() {
                errors.push(CompileError::unresolved_reference(
                    &property_path,
                    renamed,
                    "base identity property (only subclasses rename identities)",
                ));
            } else if let Some(base) = base_entity {
                let renames_identity = base.get_property(renamed).is_some_and(|p| p.is_identity);
                if !renames_identity {
                    errors.push(CompileError::unresolved_reference(
                        &property_path,
                        &format!("{}.{}", base.qualified_name(), renamed),
                        "base identity property",
                    ));
                }
            }
        }
    }
}
