//! Genogram aggregate
//!
//! Owns the persons, fetuses and relationships of one document and enforces the
//! structural invariants:
//! - every relationship and fetus references only nodes present in the graph
//! - siblings are never linked directly, only through a shared parent-child link
//! - removing a person cascades to every relationship and fetus referencing it
//!
//! The aggregate has no layout knowledge. Each document owns its own instance.

use crate::aggregate::person::{Fetus, Person, PersonAttributes};
use crate::aggregate::relationship::{Relationship, RelationshipKind};
use crate::errors::{GenogramError, GenogramResult};
use crate::value_objects::{
    EmotionalStatus, FetusStatus, NodeId, ParentChildStatus, PartnerStatus, RelationshipId,
};
use std::collections::{BTreeMap, BTreeSet};

/// Everything removed by a cascading person removal
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedPerson {
    pub person: Person,
    pub relationships: Vec<Relationship>,
    pub fetuses: Vec<Fetus>,
}

/// The genogram aggregate
#[derive(Debug, Clone, Default)]
pub struct Genogram {
    persons: BTreeMap<NodeId, Person>,
    fetuses: BTreeMap<NodeId, Fetus>,
    relationships: BTreeMap<RelationshipId, Relationship>,
    next_node: u64,
    next_relationship: u64,
}

// Id allocators are bookkeeping; two graphs with the same content are equal.
impl PartialEq for Genogram {
    fn eq(&self, other: &Self) -> bool {
        self.persons == other.persons
            && self.fetuses == other.fetuses
            && self.relationships == other.relationships
    }
}

impl Genogram {
    /// Create an empty genogram
    pub fn new() -> Self {
        Self {
            next_node: 1,
            next_relationship: 1,
            ..Self::default()
        }
    }

    /// Add a person and return its id
    pub fn add_person(&mut self, attributes: PersonAttributes) -> NodeId {
        let id = self.allocate_node_id();
        tracing::debug!(person = %id, gender = %attributes.gender, "Person added");
        self.persons.insert(id, Person::new(id, attributes));
        id
    }

    /// Insert a person with a fixed id (restore, decode)
    pub fn insert_person(&mut self, person: Person) -> GenogramResult<()> {
        if self.contains_node(person.id) {
            return Err(GenogramError::InvalidRelationship(format!(
                "Node {} already exists",
                person.id
            )));
        }
        self.reserve_node_id(person.id);
        self.persons.insert(person.id, person);
        Ok(())
    }

    /// Replace a person's attributes, returning the previous ones
    pub fn update_person(
        &mut self,
        id: NodeId,
        attributes: PersonAttributes,
    ) -> GenogramResult<PersonAttributes> {
        let person = self
            .persons
            .get_mut(&id)
            .ok_or_else(|| GenogramError::EntityNotFound(format!("person {id}")))?;
        tracing::debug!(person = %id, "Person updated");
        Ok(std::mem::replace(&mut person.attributes, attributes))
    }

    /// Remove a person together with every relationship and fetus referencing it
    pub fn remove_person(&mut self, id: NodeId) -> GenogramResult<RemovedPerson> {
        if !self.persons.contains_key(&id) {
            return Err(GenogramError::EntityNotFound(format!("person {id}")));
        }

        let relationship_ids: Vec<RelationshipId> = self
            .relationships
            .values()
            .filter(|rel| rel.kind.involves(id))
            .map(|rel| rel.id)
            .collect();
        let relationships = relationship_ids
            .iter()
            .filter_map(|rel_id| self.relationships.remove(rel_id))
            .collect::<Vec<_>>();

        let fetus_ids: Vec<NodeId> = self
            .fetuses
            .values()
            .filter(|fetus| fetus.has_parent(id))
            .map(|fetus| fetus.id)
            .collect();
        let fetuses = fetus_ids
            .iter()
            .filter_map(|fetus_id| self.fetuses.remove(fetus_id))
            .collect::<Vec<_>>();

        let person = self
            .persons
            .remove(&id)
            .ok_or_else(|| GenogramError::EntityNotFound(format!("person {id}")))?;

        tracing::debug!(
            person = %id,
            relationships = relationships.len(),
            fetuses = fetuses.len(),
            "Person removed with cascade"
        );

        Ok(RemovedPerson {
            person,
            relationships,
            fetuses,
        })
    }

    /// Add a partner relationship; the male (or lower-ranked) partner is stored first
    pub fn add_partner(
        &mut self,
        a: NodeId,
        b: NodeId,
        status: PartnerStatus,
    ) -> GenogramResult<RelationshipId> {
        self.add_relationship(RelationshipKind::Partner { a, b, status }, None)
    }

    /// Link a child to one or both parents
    pub fn add_parent_child(
        &mut self,
        father: Option<NodeId>,
        mother: Option<NodeId>,
        child: NodeId,
        status: ParentChildStatus,
    ) -> GenogramResult<RelationshipId> {
        self.add_relationship(
            RelationshipKind::ParentChild {
                father,
                mother,
                child,
                status,
            },
            None,
        )
    }

    /// Add an emotional-quality link
    pub fn add_emotional(
        &mut self,
        a: NodeId,
        b: NodeId,
        status: EmotionalStatus,
    ) -> GenogramResult<RelationshipId> {
        self.add_relationship(RelationshipKind::Emotional { a, b, status }, None)
    }

    /// Direct sibling links are never stored
    ///
    /// Callers connect siblings through a shared parent pair instead, synthesizing
    /// one when absent.
    pub fn add_sibling(&mut self, a: NodeId, b: NodeId) -> GenogramResult<RelationshipId> {
        Err(GenogramError::InvalidRelationship(format!(
            "Sibling link between {a} and {b} must go through a shared parent pair"
        )))
    }

    /// Validate and add a relationship of any kind
    pub fn add_relationship(
        &mut self,
        kind: RelationshipKind,
        label: Option<String>,
    ) -> GenogramResult<RelationshipId> {
        let kind = self.validate_kind(kind)?;
        let id = RelationshipId::new(self.next_relationship.max(1));
        self.next_relationship = id.raw() + 1;
        tracing::debug!(relationship = %id, kind = kind.tag(), "Relationship added");
        self.relationships.insert(id, Relationship { id, kind, label });
        Ok(id)
    }

    /// Insert a relationship with a fixed id (restore, decode)
    pub fn insert_relationship(&mut self, relationship: Relationship) -> GenogramResult<()> {
        if self.relationships.contains_key(&relationship.id) {
            return Err(GenogramError::InvalidRelationship(format!(
                "Relationship {} already exists",
                relationship.id
            )));
        }
        let kind = self.validate_kind(relationship.kind)?;
        let id = relationship.id;
        self.next_relationship = self.next_relationship.max(id.raw() + 1);
        self.relationships.insert(
            id,
            Relationship {
                id,
                kind,
                label: relationship.label,
            },
        );
        Ok(())
    }

    /// Remove a single relationship
    pub fn remove_relationship(&mut self, id: RelationshipId) -> GenogramResult<Relationship> {
        let removed = self
            .relationships
            .remove(&id)
            .ok_or_else(|| GenogramError::EntityNotFound(format!("relationship {id}")))?;
        tracing::debug!(relationship = %id, "Relationship removed");
        Ok(removed)
    }

    /// Attach a fetus to a parent pair
    pub fn add_fetus(
        &mut self,
        father: Option<NodeId>,
        mother: Option<NodeId>,
        status: FetusStatus,
    ) -> GenogramResult<NodeId> {
        self.validate_parents(father, mother, None)?;
        let id = self.allocate_node_id();
        tracing::debug!(fetus = %id, status = %status, "Fetus added");
        self.fetuses.insert(
            id,
            Fetus {
                id,
                father,
                mother,
                status,
            },
        );
        Ok(id)
    }

    /// Insert a fetus with a fixed id (restore, decode)
    pub fn insert_fetus(&mut self, fetus: Fetus) -> GenogramResult<()> {
        if self.contains_node(fetus.id) {
            return Err(GenogramError::InvalidRelationship(format!(
                "Node {} already exists",
                fetus.id
            )));
        }
        self.validate_parents(fetus.father, fetus.mother, None)?;
        self.reserve_node_id(fetus.id);
        self.fetuses.insert(fetus.id, fetus);
        Ok(())
    }

    /// Remove a fetus
    pub fn remove_fetus(&mut self, id: NodeId) -> GenogramResult<Fetus> {
        self.fetuses
            .remove(&id)
            .ok_or_else(|| GenogramError::EntityNotFound(format!("fetus {id}")))
    }

    // ---- lookups ----

    /// Get a person by id
    pub fn person(&self, id: NodeId) -> Option<&Person> {
        self.persons.get(&id)
    }

    /// All persons in id order
    pub fn persons(&self) -> impl Iterator<Item = &Person> {
        self.persons.values()
    }

    /// Get a fetus by id
    pub fn fetus(&self, id: NodeId) -> Option<&Fetus> {
        self.fetuses.get(&id)
    }

    /// All fetuses in id order
    pub fn fetuses(&self) -> impl Iterator<Item = &Fetus> {
        self.fetuses.values()
    }

    /// Get a relationship by id
    pub fn relationship(&self, id: RelationshipId) -> Option<&Relationship> {
        self.relationships.get(&id)
    }

    /// All relationships in id order
    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.values()
    }

    /// Relationships referencing `id`
    pub fn relationships_of(&self, id: NodeId) -> Vec<&Relationship> {
        self.relationships
            .values()
            .filter(|rel| rel.kind.involves(id))
            .collect()
    }

    /// Fetuses attached to `id`
    pub fn fetuses_of(&self, id: NodeId) -> Vec<&Fetus> {
        self.fetuses.values().filter(|f| f.has_parent(id)).collect()
    }

    /// Children whose known parents are exactly `parents`
    pub fn children_of(&self, parents: &[NodeId]) -> Vec<NodeId> {
        let wanted: BTreeSet<NodeId> = parents.iter().copied().collect();
        self.relationships
            .values()
            .filter_map(|rel| match rel.kind {
                RelationshipKind::ParentChild {
                    father,
                    mother,
                    child,
                    ..
                } => {
                    let known: BTreeSet<NodeId> = father.into_iter().chain(mother).collect();
                    (known == wanted).then_some(child)
                }
                _ => None,
            })
            .collect()
    }

    /// Children with at least one known parent among `parents`
    pub fn children_of_any(&self, parents: &[NodeId]) -> Vec<NodeId> {
        self.relationships
            .values()
            .filter_map(|rel| match rel.kind {
                RelationshipKind::ParentChild {
                    father,
                    mother,
                    child,
                    ..
                } if father.into_iter().chain(mother).any(|p| parents.contains(&p)) => Some(child),
                _ => None,
            })
            .collect()
    }

    /// First partner of `id` by relationship id
    pub fn spouse_of(&self, id: NodeId) -> Option<NodeId> {
        self.partners_of(id).into_iter().next()
    }

    /// Every partner of `id` by relationship id
    pub fn partners_of(&self, id: NodeId) -> Vec<NodeId> {
        self.relationships
            .values()
            .filter_map(|rel| match rel.kind {
                RelationshipKind::Partner { a, b, .. } if a == id => Some(b),
                RelationshipKind::Partner { a, b, .. } if b == id => Some(a),
                _ => None,
            })
            .collect()
    }

    /// The parent-child link in which `child` is the child
    pub fn parent_link_of(&self, child: NodeId) -> Option<&Relationship> {
        self.relationships.values().find(|rel| {
            matches!(rel.kind, RelationshipKind::ParentChild { child: c, .. } if c == child)
        })
    }

    /// Persons sharing `id`'s parent pair, excluding `id`
    pub fn siblings_of(&self, id: NodeId) -> Vec<NodeId> {
        let Some((father, mother)) = self.parent_link_of(id).and_then(|rel| rel.parents()) else {
            return Vec::new();
        };
        let parents: Vec<NodeId> = father.into_iter().chain(mother).collect();
        self.children_of(&parents)
            .into_iter()
            .filter(|child| *child != id)
            .collect()
    }

    /// Whether a person or fetus with this id exists
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.persons.contains_key(&id) || self.fetuses.contains_key(&id)
    }

    /// Number of persons
    pub fn person_count(&self) -> usize {
        self.persons.len()
    }

    /// Number of relationships
    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    /// Whether the graph holds nothing at all
    pub fn is_empty(&self) -> bool {
        self.persons.is_empty() && self.fetuses.is_empty() && self.relationships.is_empty()
    }

    // ---- validation ----

    fn require_person(&self, id: NodeId) -> GenogramResult<()> {
        if self.persons.contains_key(&id) {
            Ok(())
        } else {
            Err(GenogramError::InvalidRelationship(format!(
                "Unknown person {id}"
            )))
        }
    }

    fn validate_parents(
        &self,
        father: Option<NodeId>,
        mother: Option<NodeId>,
        child: Option<NodeId>,
    ) -> GenogramResult<()> {
        if father.is_none() && mother.is_none() {
            return Err(GenogramError::InvalidRelationship(
                "At least one parent is required".to_string(),
            ));
        }
        if father.is_some() && father == mother {
            return Err(GenogramError::InvalidRelationship(
                "Father and mother must differ".to_string(),
            ));
        }
        for parent in father.into_iter().chain(mother) {
            self.require_person(parent)?;
            if Some(parent) == child {
                return Err(GenogramError::InvalidRelationship(format!(
                    "Person {parent} cannot be their own parent"
                )));
            }
        }
        Ok(())
    }

    /// Check a relationship kind against the current graph, normalizing partner order
    fn validate_kind(&self, kind: RelationshipKind) -> GenogramResult<RelationshipKind> {
        let others = || self.relationships.values();

        match kind {
            RelationshipKind::Partner { a, b, status } => {
                self.require_person(a)?;
                self.require_person(b)?;
                if a == b {
                    return Err(GenogramError::InvalidRelationship(format!(
                        "Person {a} cannot partner with themselves"
                    )));
                }
                let duplicate = others().any(|rel| {
                    matches!(rel.kind, RelationshipKind::Partner { a: x, b: y, .. }
                        if (x == a && y == b) || (x == b && y == a))
                });
                if duplicate {
                    return Err(GenogramError::InvalidRelationship(format!(
                        "{a} and {b} are already partners"
                    )));
                }
                let (a, b) = self.couple_order(a, b);
                Ok(RelationshipKind::Partner { a, b, status })
            }
            RelationshipKind::ParentChild {
                father,
                mother,
                child,
                status,
            } => {
                self.require_person(child)?;
                self.validate_parents(father, mother, Some(child))?;
                let linked = others().any(|rel| {
                    matches!(rel.kind, RelationshipKind::ParentChild { child: c, .. } if c == child)
                });
                if linked {
                    return Err(GenogramError::InvalidRelationship(format!(
                        "Person {child} already has a parent link"
                    )));
                }
                Ok(RelationshipKind::ParentChild {
                    father,
                    mother,
                    child,
                    status,
                })
            }
            RelationshipKind::Emotional { a, b, status } => {
                self.require_person(a)?;
                self.require_person(b)?;
                if a == b {
                    return Err(GenogramError::InvalidRelationship(format!(
                        "Emotional link of {a} with themselves"
                    )));
                }
                let duplicate = others().any(|rel| {
                    matches!(rel.kind, RelationshipKind::Emotional { a: x, b: y, .. }
                        if (x == a && y == b) || (x == b && y == a))
                });
                if duplicate {
                    return Err(GenogramError::InvalidRelationship(format!(
                        "{a} and {b} already have an emotional link"
                    )));
                }
                Ok(RelationshipKind::Emotional { a, b, status })
            }
        }
    }

    /// Left/right order of a couple: male left, female right, lower id first otherwise
    pub fn couple_order(&self, a: NodeId, b: NodeId) -> (NodeId, NodeId) {
        let rank = |id: NodeId| {
            self.persons
                .get(&id)
                .map(|p| p.gender().couple_rank())
                .unwrap_or(1)
        };
        if (rank(a), a) <= (rank(b), b) {
            (a, b)
        } else {
            (b, a)
        }
    }

    fn allocate_node_id(&mut self) -> NodeId {
        let id = NodeId::new(self.next_node.max(1));
        self.next_node = id.raw() + 1;
        id
    }

    fn reserve_node_id(&mut self, id: NodeId) {
        self.next_node = self.next_node.max(id.raw() + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::Gender;

    fn family() -> (Genogram, NodeId, NodeId, NodeId, NodeId) {
        let mut graph = Genogram::new();
        let father = graph.add_person(PersonAttributes::new(Gender::Male));
        let mother = graph.add_person(PersonAttributes::new(Gender::Female));
        let first = graph.add_person(PersonAttributes::new(Gender::Female).with_birth_order(1));
        let second = graph.add_person(PersonAttributes::new(Gender::Male).with_birth_order(2));
        graph
            .add_partner(mother, father, PartnerStatus::Married)
            .unwrap();
        graph
            .add_parent_child(Some(father), Some(mother), first, ParentChildStatus::Biological)
            .unwrap();
        graph
            .add_parent_child(Some(father), Some(mother), second, ParentChildStatus::Biological)
            .unwrap();
        (graph, father, mother, first, second)
    }

    #[test]
    fn test_partner_is_normalized_male_first() {
        let (graph, father, mother, _, _) = family();
        let partner = graph
            .relationships()
            .find(|rel| matches!(rel.kind, RelationshipKind::Partner { .. }))
            .unwrap();
        match partner.kind {
            RelationshipKind::Partner { a, b, .. } => {
                assert_eq!(a, father);
                assert_eq!(b, mother);
            }
            _ => unreachable!(),
        }
        assert_eq!(graph.spouse_of(mother), Some(father));
    }

    #[test]
    fn test_lookups() {
        let (graph, father, mother, first, second) = family();
        assert_eq!(graph.children_of(&[mother, father]), vec![first, second]);
        assert_eq!(graph.children_of(&[father]), Vec::<NodeId>::new());
        assert_eq!(graph.children_of_any(&[father]), vec![first, second]);
        assert_eq!(graph.siblings_of(first), vec![second]);
        assert_eq!(graph.relationships_of(first).len(), 1);
        assert_eq!(graph.relationships_of(father).len(), 3);
    }

    #[test]
    fn test_rejects_unknown_ids() {
        let (mut graph, father, _, _, _) = family();
        let ghost = NodeId::new(99);
        let result = graph.add_partner(father, ghost, PartnerStatus::Dating);
        assert!(matches!(result, Err(GenogramError::InvalidRelationship(_))));
        let result = graph.add_emotional(ghost, father, EmotionalStatus::Close);
        assert!(matches!(result, Err(GenogramError::InvalidRelationship(_))));
        assert_eq!(graph.relationship_count(), 3);
    }

    #[test]
    fn test_rejects_direct_sibling_link() {
        let (mut graph, _, _, first, second) = family();
        let before = graph.clone();
        let result = graph.add_sibling(first, second);
        assert!(matches!(result, Err(GenogramError::InvalidRelationship(_))));
        assert_eq!(graph, before);
    }

    #[test]
    fn test_rejects_second_parent_link_and_self_parenting() {
        let (mut graph, father, mother, first, _) = family();
        let result =
            graph.add_parent_child(Some(father), None, first, ParentChildStatus::Adopted);
        assert!(result.is_err());
        let result =
            graph.add_parent_child(Some(mother), None, mother, ParentChildStatus::Biological);
        assert!(result.is_err());
        let result = graph.add_parent_child(None, None, father, ParentChildStatus::Biological);
        assert!(result.is_err());
    }

    #[test]
    fn test_remove_person_cascades() {
        let (mut graph, father, mother, first, second) = family();
        let fetus = graph
            .add_fetus(Some(father), Some(mother), FetusStatus::Miscarriage)
            .unwrap();
        graph
            .add_emotional(first, second, EmotionalStatus::Hostile)
            .unwrap();

        let removed = graph.remove_person(first).unwrap();
        assert_eq!(removed.person.id, first);
        assert_eq!(removed.relationships.len(), 2);
        assert!(removed.fetuses.is_empty());
        assert!(graph.relationships_of(first).is_empty());

        let removed = graph.remove_person(mother).unwrap();
        assert_eq!(removed.fetuses.len(), 1);
        assert!(graph.fetus(fetus).is_none());
        for rel in graph.relationships() {
            for id in rel.kind.participants() {
                assert!(graph.person(id).is_some());
            }
        }
    }

    #[test]
    fn test_insert_restores_ids_and_allocator() {
        let (mut graph, _, _, first, _) = family();
        let before = graph.clone();
        let removed = graph.remove_person(first).unwrap();
        graph.insert_person(removed.person).unwrap();
        for rel in removed.relationships {
            graph.insert_relationship(rel).unwrap();
        }
        assert_eq!(graph, before);

        let next = graph.add_person(PersonAttributes::default());
        assert!(next.raw() > first.raw());
    }

    #[test]
    fn test_fetus_requires_a_parent() {
        let mut graph = Genogram::new();
        assert!(graph.add_fetus(None, None, FetusStatus::Pregnancy).is_err());
    }
}
