//! Arena-backed entity graph.

use crate::entity::{Entity, EntityKind};
use crate::error::ModelError;
use crate::namespace::Namespace;
use crate::property::EntityRef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Stable index of an entity within an [`EntityGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub usize);

/// Stable index of a namespace within an [`EntityGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespaceId(pub usize);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Serialized form of a graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    /// Namespaces in declaration order.
    pub namespaces: Vec<Namespace>,
    /// Entities in declaration order.
    pub entities: Vec<Entity>,
}

/// The resolved metamodel: namespaces and entities stored in arenas with name indexes.
///
/// A graph is immutable once built. References between entities stay by-name
/// ([`EntityRef`]) and are resolved through [`EntityGraph::lookup`].
#[derive(Debug, Clone)]
pub struct EntityGraph {
    namespaces: Vec<Namespace>,
    entities: Vec<Entity>,
    namespace_index: HashMap<String, NamespaceId>,
    entity_index: HashMap<(String, String, u8), EntityId>,
}

impl EntityGraph {
    /// Build a graph, indexing namespaces and entities.
    pub fn new(namespaces: Vec<Namespace>, entities: Vec<Entity>) -> Result<Self, ModelError> {
        let mut namespace_index = HashMap::with_capacity(namespaces.len());
        for (idx, namespace) in namespaces.iter().enumerate() {
            if namespace_index
                .insert(namespace.name.clone(), NamespaceId(idx))
                .is_some()
            {
                return Err(ModelError::DuplicateNamespace(namespace.name.clone()));
            }
        }

        let mut entity_index = HashMap::with_capacity(entities.len());
        for (idx, entity) in entities.iter().enumerate() {
            if !namespace_index.contains_key(&entity.namespace) {
                return Err(ModelError::UnknownNamespace {
                    entity: entity.name.clone(),
                    namespace: entity.namespace.clone(),
                });
            }
            let key = (
                entity.namespace.clone(),
                entity.name.clone(),
                entity.kind.name_group(),
            );
            if entity_index.insert(key, EntityId(idx)).is_some() {
                return Err(ModelError::DuplicateEntity {
                    namespace: entity.namespace.clone(),
                    name: entity.name.clone(),
                });
            }
        }

        Ok(Self {
            namespaces,
            entities,
            namespace_index,
            entity_index,
        })
    }

    /// Build a graph from a serialized document.
    pub fn from_document(document: GraphDocument) -> Result<Self, ModelError> {
        Self::new(document.namespaces, document.entities)
    }

    /// Parse a JSON graph document.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let document: GraphDocument = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    /// Serializable copy of this graph.
    pub fn to_document(&self) -> GraphDocument {
        GraphDocument {
            namespaces: self.namespaces.clone(),
            entities: self.entities.clone(),
        }
    }

    /// Get an entity by id.
    ///
    /// Ids are only handed out by this graph, so they are always in bounds.
    pub fn entity(&self, id: EntityId) -> &Entity {
        &self.entities[id.0]
    }

    /// Get a namespace by id.
    pub fn namespace(&self, id: NamespaceId) -> &Namespace {
        &self.namespaces[id.0]
    }

    /// Look up a namespace id by name.
    pub fn namespace_id(&self, name: &str) -> Option<NamespaceId> {
        self.namespace_index.get(name).copied()
    }

    /// Look up a namespace by name.
    pub fn get_namespace(&self, name: &str) -> Option<&Namespace> {
        self.namespace_id(name).map(|id| self.namespace(id))
    }

    /// All namespaces with their ids, in declaration order.
    pub fn namespaces(&self) -> impl Iterator<Item = (NamespaceId, &Namespace)> {
        self.namespaces
            .iter()
            .enumerate()
            .map(|(idx, ns)| (NamespaceId(idx), ns))
    }

    /// All entities with their ids, in declaration order.
    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities
            .iter()
            .enumerate()
            .map(|(idx, entity)| (EntityId(idx), entity))
    }

    /// Entities of one namespace, in declaration order.
    pub fn entities_in<'a>(
        &'a self,
        namespace: &'a str,
    ) -> impl Iterator<Item = (EntityId, &'a Entity)> + 'a {
        self.entities()
            .filter(move |(_, entity)| entity.namespace == namespace)
    }

    /// Resolve a reference to an entity whose kind is one of `kinds`.
    pub fn lookup(&self, target: &EntityRef, kinds: &[EntityKind]) -> Option<EntityId> {
        let mut groups: Vec<u8> = kinds.iter().map(EntityKind::name_group).collect();
        groups.dedup();
        groups.into_iter().find_map(|group| {
            self.entity_index
                .get(&(target.namespace.clone(), target.name.clone(), group))
                .copied()
                .filter(|id| kinds.contains(&self.entity(*id).kind))
        })
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check whether the graph has no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Check whether any entity has the given kind.
    pub fn contains_kind(&self, kind: EntityKind) -> bool {
        self.entities.iter().any(|e| e.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::Property;
    use crate::types::ScalarType;
    use pretty_assertions::assert_eq;

    fn sample_graph() -> EntityGraph {
        EntityGraph::new(
            vec![Namespace::core("EdFi")],
            vec![
                Entity::domain_entity("EdFi", "School").with_property(
                    Property::simple("SchoolId", ScalarType::Integer).identity(),
                ),
                Entity::descriptor("EdFi", "School"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_lookup_by_kind_group() {
        let graph = sample_graph();
        let target = EntityRef::new("EdFi", "School");

        let entity = graph
            .lookup(&target, &[EntityKind::DomainEntity, EntityKind::Association])
            .unwrap();
        assert_eq!(graph.entity(entity).kind, EntityKind::DomainEntity);

        let descriptor = graph.lookup(&target, &[EntityKind::Descriptor]).unwrap();
        assert_eq!(graph.entity(descriptor).kind, EntityKind::Descriptor);

        assert!(graph.lookup(&target, &[EntityKind::Common]).is_none());
        assert!(graph
            .lookup(&EntityRef::new("Other", "School"), &[EntityKind::DomainEntity])
            .is_none());
    }

    #[test]
    fn test_lookup_filters_kind_within_group() {
        let graph = sample_graph();
        let target = EntityRef::new("EdFi", "School");
        assert!(graph
            .lookup(&target, &[EntityKind::AbstractEntity])
            .is_none());
    }

    #[test]
    fn test_duplicate_entity_rejected() {
        let err = EntityGraph::new(
            vec![Namespace::core("EdFi")],
            vec![
                Entity::domain_entity("EdFi", "Student"),
                Entity::association("EdFi", "Student"),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::DuplicateEntity { .. }));
    }

    #[test]
    fn test_unknown_namespace_rejected() {
        let err = EntityGraph::new(
            vec![Namespace::core("EdFi")],
            vec![Entity::domain_entity("Sample", "Bus")],
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::UnknownNamespace { .. }));
    }

    #[test]
    fn test_duplicate_namespace_rejected() {
        let err = EntityGraph::new(
            vec![Namespace::core("EdFi"), Namespace::core("EdFi")],
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::DuplicateNamespace(name) if name == "EdFi"));
    }

    #[test]
    fn test_json_document() {
        let json = r#"{
            "namespaces": [
                { "name": "EdFi" },
                { "name": "Sample", "isExtension": true, "dependencies": ["EdFi"] }
            ],
            "entities": [
                {
                    "kind": "domainEntity",
                    "name": "Student",
                    "namespace": "EdFi",
                    "allowPrimaryKeyUpdates": true,
                    "properties": [
                        {
                            "name": "StudentUniqueId",
                            "kind": {
                                "kind": "simple",
                                "scalar": { "type": "string", "max_length": 32 }
                            },
                            "isIdentity": true,
                            "isRequired": true
                        }
                    ]
                },
                {
                    "kind": "domainEntityExtension",
                    "name": "Student",
                    "namespace": "Sample",
                    "baseEntity": { "namespace": "EdFi", "name": "Student" }
                }
            ]
        }"#;
        let graph = EntityGraph::from_json(json).unwrap();
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.entities_in("Sample").count(), 1);
        assert!(graph.get_namespace("Sample").unwrap().is_extension);

        let document = graph.to_document();
        assert_eq!(document.entities[0].properties[0].name, "StudentUniqueId");
        assert!(document.entities[0].allow_primary_key_updates);
        assert!(!document.entities[1].allow_primary_key_updates);

        let reloaded = EntityGraph::from_json(&serde_json::to_string(&document).unwrap()).unwrap();
        assert_eq!(reloaded.to_document().entities, document.entities);
    }

    #[test]
    fn test_malformed_json() {
        let err = EntityGraph::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ModelError::Json(_)));
    }
}
