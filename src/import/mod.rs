//! Fact import
//!
//! An extraction step elsewhere produces a flat list of persons and relationship
//! tuples whose ids are small integers local to the batch. The builder loads every
//! person first, so relationships may name ids that appear later in the list, and
//! only then validates. Sibling facts are satisfied through a shared parent pair,
//! synthesizing one when neither sibling has parents yet.

use crate::aggregate::{Genogram, PersonAttributes};
use crate::errors::{GenogramError, GenogramResult};
use crate::value_objects::{
    EmotionalStatus, FetusStatus, Gender, NodeId, ParentChildStatus, PartnerStatus,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A person as extracted from the source material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactPerson {
    /// Batch-local id
    pub id: u32,
    #[serde(flatten)]
    pub attributes: PersonAttributes,
}

/// A relationship tuple as extracted from the source material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FactRelationship {
    Partner {
        a: u32,
        b: u32,
        status: PartnerStatus,
    },
    ParentChild {
        #[serde(default)]
        father: Option<u32>,
        #[serde(default)]
        mother: Option<u32>,
        child: u32,
        status: ParentChildStatus,
    },
    Emotional {
        a: u32,
        b: u32,
        status: EmotionalStatus,
    },
    Fetus {
        #[serde(default)]
        father: Option<u32>,
        #[serde(default)]
        mother: Option<u32>,
        status: FetusStatus,
    },
    Sibling {
        a: u32,
        b: u32,
    },
}

/// One extraction batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactBatch {
    pub persons: Vec<FactPerson>,
    #[serde(default)]
    pub relationships: Vec<FactRelationship>,
}

/// Result of an import: the graph and where each batch id ended up
#[derive(Debug, Clone)]
pub struct ImportedGenogram {
    pub graph: Genogram,
    /// Batch-local id to graph node id, in batch order
    pub ids: IndexMap<u32, NodeId>,
    /// Parent pairs created to connect siblings
    pub synthesized: Vec<NodeId>,
}

impl ImportedGenogram {
    /// Graph node for a batch-local id
    pub fn node(&self, local: u32) -> Option<NodeId> {
        self.ids.get(&local).copied()
    }
}

/// Builds a `Genogram` from a fact batch
#[derive(Debug, Default)]
pub struct GenogramBuilder {
    graph: Genogram,
    ids: IndexMap<u32, NodeId>,
    synthesized: Vec<NodeId>,
}

impl GenogramBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self {
            graph: Genogram::new(),
            ..Self::default()
        }
    }

    /// Load a whole batch and validate it
    pub fn build(mut self, batch: &FactBatch) -> GenogramResult<ImportedGenogram> {
        for person in &batch.persons {
            if self.ids.contains_key(&person.id) {
                return Err(GenogramError::InvalidRelationship(format!(
                    "Duplicate fact person {}",
                    person.id
                )));
            }
            let node = self.graph.add_person(person.attributes.clone());
            self.ids.insert(person.id, node);
        }

        // Structural links first so sibling facts can reuse existing parents.
        let (siblings, others): (Vec<_>, Vec<_>) = batch
            .relationships
            .iter()
            .partition(|fact| matches!(fact, FactRelationship::Sibling { .. }));
        for fact in others {
            self.apply(fact)?;
        }
        for fact in siblings {
            self.apply(fact)?;
        }

        tracing::info!(
            persons = self.graph.person_count(),
            relationships = self.graph.relationship_count(),
            synthesized = self.synthesized.len(),
            "Fact batch imported"
        );

        Ok(ImportedGenogram {
            graph: self.graph,
            ids: self.ids,
            synthesized: self.synthesized,
        })
    }

    fn node(&self, local: u32) -> GenogramResult<NodeId> {
        self.ids.get(&local).copied().ok_or_else(|| {
            GenogramError::InvalidRelationship(format!("Fact references unknown person {local}"))
        })
    }

    fn optional_node(&self, local: Option<u32>) -> GenogramResult<Option<NodeId>> {
        local.map(|id| self.node(id)).transpose()
    }

    fn apply(&mut self, fact: &FactRelationship) -> GenogramResult<()> {
        match *fact {
            FactRelationship::Partner { a, b, status } => {
                let (a, b) = (self.node(a)?, self.node(b)?);
                self.graph.add_partner(a, b, status)?;
            }
            FactRelationship::ParentChild {
                father,
                mother,
                child,
                status,
            } => {
                let father = self.optional_node(father)?;
                let mother = self.optional_node(mother)?;
                let child = self.node(child)?;
                self.graph.add_parent_child(father, mother, child, status)?;
            }
            FactRelationship::Emotional { a, b, status } => {
                let (a, b) = (self.node(a)?, self.node(b)?);
                self.graph.add_emotional(a, b, status)?;
            }
            FactRelationship::Fetus {
                father,
                mother,
                status,
            } => {
                let father = self.optional_node(father)?;
                let mother = self.optional_node(mother)?;
                self.graph.add_fetus(father, mother, status)?;
            }
            FactRelationship::Sibling { a, b } => {
                let (a, b) = (self.node(a)?, self.node(b)?);
                let created = link_siblings(&mut self.graph, a, b)?;
                self.synthesized.extend(created);
            }
        }
        Ok(())
    }
}

/// Connect two persons as siblings through a shared parent pair
///
/// Reuses the parent link of whichever sibling has one; otherwise synthesizes an
/// unknown-status couple. Returns the ids of any synthesized parents.
pub fn link_siblings(graph: &mut Genogram, a: NodeId, b: NodeId) -> GenogramResult<Vec<NodeId>> {
    if a == b {
        return Err(GenogramError::InvalidRelationship(format!(
            "Person {a} cannot be their own sibling"
        )));
    }
    let parents_of = |graph: &Genogram, id: NodeId| {
        graph
            .parent_link_of(id)
            .and_then(|rel| rel.parents().map(|parents| (parents, rel.kind.clone())))
    };

    match (parents_of(graph, a), parents_of(graph, b)) {
        (Some(((fa, ma), _)), Some(((fb, mb), _))) => {
            if (fa, ma) == (fb, mb) {
                Ok(Vec::new())
            } else {
                Err(GenogramError::InvalidRelationship(format!(
                    "{a} and {b} already have different parents"
                )))
            }
        }
        (Some(((father, mother), kind)), None) | (None, Some(((father, mother), kind))) => {
            let orphan = if graph.parent_link_of(a).is_some() { b } else { a };
            let status = match kind {
                crate::aggregate::RelationshipKind::ParentChild { status, .. } => status,
                _ => ParentChildStatus::Biological,
            };
            graph.add_parent_child(father, mother, orphan, status)?;
            Ok(Vec::new())
        }
        (None, None) => {
            let father = graph.add_person(PersonAttributes::new(Gender::Male));
            let mother = graph.add_person(PersonAttributes::new(Gender::Female));
            graph.add_partner(father, mother, PartnerStatus::Unknown)?;
            graph.add_parent_child(Some(father), Some(mother), a, ParentChildStatus::Biological)?;
            graph.add_parent_child(Some(father), Some(mother), b, ParentChildStatus::Biological)?;
            tracing::debug!(sibling_a = %a, sibling_b = %b, "Synthesized parent pair for siblings");
            Ok(vec![father, mother])
        }
    }
}
