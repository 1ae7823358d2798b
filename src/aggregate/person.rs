//! Persons and fetus nodes

use crate::value_objects::{FetusStatus, Gender, NodeId, VitalStatus};
use serde::{Deserialize, Serialize};

/// Descriptive attributes of a person
///
/// Free-text fields are opaque to the core; they are carried through to
/// render records and the transport form unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonAttributes {
    pub gender: Gender,
    pub vital_status: VitalStatus,
    pub age: Option<u32>,
    pub birth_year: Option<i32>,
    /// 1-based position among siblings; unknown sorts last
    pub birth_order: Option<u32>,
    pub name: Option<String>,
    pub occupation: Option<String>,
    pub region: Option<String>,
}

impl PersonAttributes {
    /// Attributes for a person of the given gender with everything else unknown
    pub fn new(gender: Gender) -> Self {
        Self {
            gender,
            ..Self::default()
        }
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the birth order among siblings
    pub fn with_birth_order(mut self, order: u32) -> Self {
        self.birth_order = Some(order);
        self
    }

    /// Set the age in years
    pub fn with_age(mut self, age: u32) -> Self {
        self.age = Some(age);
        self
    }

    /// Mark the person as deceased
    pub fn deceased(mut self) -> Self {
        self.vital_status = VitalStatus::Deceased;
        self
    }
}

/// A person in the genogram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    /// Unique identifier for the person
    pub id: NodeId,
    /// Descriptive attributes
    pub attributes: PersonAttributes,
}

impl Person {
    /// Create a person
    pub fn new(id: NodeId, attributes: PersonAttributes) -> Self {
        Self { id, attributes }
    }

    /// Shortcut for the person's gender
    pub fn gender(&self) -> Gender {
        self.attributes.gender
    }
}

/// A pregnancy outcome attached to exactly one parent pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fetus {
    /// Identifier shared with the person id space
    pub id: NodeId,
    pub father: Option<NodeId>,
    pub mother: Option<NodeId>,
    pub status: FetusStatus,
}

impl Fetus {
    /// Known parents, father first
    pub fn parents(&self) -> impl Iterator<Item = NodeId> {
        self.father.into_iter().chain(self.mother)
    }

    /// Whether the fetus is attached to `person`
    pub fn has_parent(&self, person: NodeId) -> bool {
        self.father == Some(person) || self.mother == Some(person)
    }
}
