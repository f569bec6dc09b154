//! Key-update cascade analysis.
//!
//! An entity's key changes when it allows primary key updates itself, or when
//! its key contains the key of an entity whose key changes. References to such
//! an entity cascade updates, except where a second reference of the same
//! entity would carry updates from an origin an earlier reference already
//! carries: two cascade paths into one table are rejected by the database.

use odsgen_model::{Entity, EntityGraph, EntityId, PropertyKind};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Which references cascade key updates.
#[derive(Debug, Clone, Default)]
pub struct UpdateCascades {
    /// Entities whose key updates originate at the given entities.
    origins: HashMap<EntityId, BTreeSet<EntityId>>,
    /// `Namespace.Entity.Property` of references whose update cascade is suppressed.
    suppressed: HashSet<String>,
}

impl UpdateCascades {
    /// Analyze a graph.
    pub fn analyze(graph: &EntityGraph) -> Self {
        let mut origins = HashMap::new();
        let mut visiting = Vec::new();
        for (id, _) in graph.entities() {
            origins_of(graph, id, &mut origins, &mut visiting);
        }

        let mut suppressed = HashSet::new();
        for (_, entity) in graph.entities() {
            let mut carried: BTreeSet<EntityId> = BTreeSet::new();
            for (property, target) in references(graph, entity) {
                let Some(from) = origins.get(&target).filter(|o| !o.is_empty()) else {
                    continue;
                };
                if from.iter().any(|origin| carried.contains(origin)) {
                    suppressed.insert(format!("{}.{}", entity.qualified_name(), property));
                } else {
                    carried.extend(from.iter().copied());
                }
            }
        }

        Self {
            origins,
            suppressed,
        }
    }

    /// Check whether the key of `entity` can change.
    pub fn cascades(&self, entity: EntityId) -> bool {
        self.origins.get(&entity).is_some_and(|o| !o.is_empty())
    }

    /// Whether the reference declared at `origin` to `target` cascades key updates.
    pub fn cascades_through(&self, target: EntityId, origin: &str) -> bool {
        self.cascades(target) && !self.suppressed.contains(origin)
    }
}

/// Single-valued references declared directly on `entity`, with their resolved targets.
fn references<'g>(
    graph: &'g EntityGraph,
    entity: &'g Entity,
) -> impl Iterator<Item = (String, EntityId)> + 'g {
    entity
        .properties
        .iter()
        .filter(|p| !p.is_collection && matches!(p.kind, PropertyKind::Reference { .. }))
        .filter_map(move |p| {
            let target = p.kind.target()?;
            let id = graph.lookup(target, p.kind.accepted_target_kinds())?;
            Some((p.full_name(), id))
        })
}

fn origins_of(
    graph: &EntityGraph,
    id: EntityId,
    memo: &mut HashMap<EntityId, BTreeSet<EntityId>>,
    visiting: &mut Vec<EntityId>,
) -> BTreeSet<EntityId> {
    if let Some(found) = memo.get(&id) {
        return found.clone();
    }
    if visiting.contains(&id) {
        return BTreeSet::new();
    }

    visiting.push(id);
    let entity = graph.entity(id);
    let mut found = BTreeSet::new();
    if entity.allow_primary_key_updates {
        found.insert(id);
    }
    if entity.kind.is_subclass() {
        let base = entity
            .base_entity
            .as_ref()
            .and_then(|base| graph.lookup(base, entity.kind.accepted_base_kinds()));
        if let Some(base) = base {
            found.extend(origins_of(graph, base, memo, visiting));
        }
    }
    let identity_targets: Vec<EntityId> = entity
        .properties
        .iter()
        .filter(|p| p.is_identity && matches!(p.kind, PropertyKind::Reference { .. }))
        .filter_map(|p| graph.lookup(p.kind.target()?, p.kind.accepted_target_kinds()))
        .collect();
    for target in identity_targets {
        found.extend(origins_of(graph, target, memo, visiting));
    }
    visiting.pop();

    memo.insert(id, found.clone());
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use odsgen_model::{EntityKind, EntityRef, Namespace, Property, ScalarType};

    fn keyed(name: &str) -> Entity {
        Entity::domain_entity("EdFi", name)
            .with_property(Property::simple(format!("{}Id", name), ScalarType::Integer).identity())
    }

    fn graph(entities: Vec<Entity>) -> EntityGraph {
        EntityGraph::new(vec![Namespace::core("EdFi")], entities).unwrap()
    }

    #[test]
    fn test_updates_flow_through_identity_references() {
        let graph = graph(vec![
            keyed("Student").allowing_primary_key_updates(),
            keyed("Enrollment").with_property(Property::reference("EdFi", "Student").identity()),
            keyed("Grade").with_property(Property::reference("EdFi", "Enrollment").identity()),
            keyed("School"),
        ]);
        let cascades = UpdateCascades::analyze(&graph);

        assert!(cascades.cascades(EntityId(0)));
        assert!(cascades.cascades(EntityId(1)));
        assert!(cascades.cascades(EntityId(2)));
        assert!(!cascades.cascades(EntityId(3)));
        assert!(cascades.cascades_through(EntityId(1), "EdFi.Grade.Enrollment"));
    }

    #[test]
    fn test_non_identity_reference_does_not_propagate() {
        let graph = graph(vec![
            keyed("Student").allowing_primary_key_updates(),
            keyed("Contact").with_property(Property::reference("EdFi", "Student")),
            keyed("Visit").with_property(Property::reference("EdFi", "Contact").identity()),
        ]);
        let cascades = UpdateCascades::analyze(&graph);

        assert!(cascades.cascades_through(EntityId(0), "EdFi.Contact.Student"));
        assert!(!cascades.cascades(EntityId(1)));
        assert!(!cascades.cascades(EntityId(2)));
    }

    #[test]
    fn test_second_path_from_same_origin_is_suppressed() {
        let graph = graph(vec![
            keyed("Student").allowing_primary_key_updates(),
            keyed("Left").with_property(Property::reference("EdFi", "Student").identity()),
            keyed("Right").with_property(Property::reference("EdFi", "Student").identity()),
            Entity::domain_entity("EdFi", "Join").with_properties([
                Property::reference("EdFi", "Left").identity(),
                Property::reference("EdFi", "Right").identity(),
            ]),
        ]);
        let cascades = UpdateCascades::analyze(&graph);

        assert!(cascades.cascades(EntityId(3)));
        assert!(cascades.cascades_through(EntityId(1), "EdFi.Join.Left"));
        assert!(!cascades.cascades_through(EntityId(2), "EdFi.Join.Right"));
    }

    #[test]
    fn test_subclass_inherits_base_updates() {
        let graph = graph(vec![
            Entity::abstract_entity("EdFi", "EducationOrganization")
                .allowing_primary_key_updates()
                .with_property(
                    Property::simple("EducationOrganizationId", ScalarType::Integer).identity(),
                ),
            Entity::derived(
                EntityKind::DomainEntitySubclass,
                "EdFi",
                "School",
                EntityRef::new("EdFi", "EducationOrganization"),
            ),
        ]);
        let cascades = UpdateCascades::analyze(&graph);
        assert!(cascades.cascades(EntityId(1)));
    }

    #[test]
    fn test_reference_cycle_terminates() {
        let graph = graph(vec![
            Entity::domain_entity("EdFi", "A")
                .with_property(Property::reference("EdFi", "B").identity()),
            Entity::domain_entity("EdFi", "B")
                .allowing_primary_key_updates()
                .with_property(Property::reference("EdFi", "A").identity()),
        ]);
        let cascades = UpdateCascades::analyze(&graph);
        assert!(cascades.cascades(EntityId(0)));
        assert!(cascades.cascades(EntityId(1)));
    }
}
