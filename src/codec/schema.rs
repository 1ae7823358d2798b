//! Transport schema
//!
//! The stable contract consumed by the rendering layer and by storage. Ids are
//! strings (`n12` for nodes, `r4` for relationships), enum fields use the fixed
//! vocabularies of the value objects and coordinates are integers.

use crate::value_objects::{
    EmotionalStatus, FetusStatus, Gender, ParentChildStatus, PartnerStatus, VitalStatus,
};
use serde::{Deserialize, Serialize};

/// Current transport schema version
pub const SCHEMA_VERSION: u32 = 1;

/// A complete genogram snapshot: graph plus layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenogramDocument {
    pub version: u32,
    pub nodes: Vec<NodeRecord>,
    pub relationships: Vec<RelationshipRecord>,
}

impl GenogramDocument {
    /// An empty document at the current schema version
    pub fn empty() -> Self {
        Self {
            version: SCHEMA_VERSION,
            nodes: Vec::new(),
            relationships: Vec::new(),
        }
    }
}

/// A positioned person or fetus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum NodeRecord {
    Person {
        id: String,
        gender: Gender,
        vital_status: VitalStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        age: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        birth_year: Option<i32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        birth_order: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        occupation: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        region: Option<String>,
        x: i64,
        y: i64,
    },
    Fetus {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        father: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mother: Option<String>,
        status: FetusStatus,
        x: i64,
        y: i64,
    },
}

impl NodeRecord {
    /// The record's id
    pub fn id(&self) -> &str {
        match self {
            NodeRecord::Person { id, .. } | NodeRecord::Fetus { id, .. } => id,
        }
    }
}

/// A relationship between persons
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum RelationshipRecord {
    Partner {
        id: String,
        a: String,
        b: String,
        status: PartnerStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    ParentChild {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        father: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mother: Option<String>,
        child: String,
        status: ParentChildStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    Emotional {
        id: String,
        a: String,
        b: String,
        status: EmotionalStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
}
