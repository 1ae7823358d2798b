//! Relationships between persons
//!
//! A relationship is a closed sum over the three kinds a genogram draws. There is
//! no sibling kind: siblings connect only through a shared parent-child link.

use crate::value_objects::{
    EmotionalStatus, NodeId, ParentChildStatus, PartnerStatus, RelationshipId,
};
use serde::{Deserialize, Serialize};

/// The kind-specific payload of a relationship
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RelationshipKind {
    /// A couple; `a` is the left-hand partner once normalized by the graph
    Partner {
        a: NodeId,
        b: NodeId,
        status: PartnerStatus,
    },
    /// A child linked to one or both parents
    ParentChild {
        father: Option<NodeId>,
        mother: Option<NodeId>,
        child: NodeId,
        status: ParentChildStatus,
    },
    /// An unordered emotional-quality link
    Emotional {
        a: NodeId,
        b: NodeId,
        status: EmotionalStatus,
    },
}

impl RelationshipKind {
    /// Transport tag of the kind
    pub fn tag(&self) -> &'static str {
        match self {
            RelationshipKind::Partner { .. } => "partner",
            RelationshipKind::ParentChild { .. } => "parent_child",
            RelationshipKind::Emotional { .. } => "emotional",
        }
    }

    /// Every person referenced by this relationship
    pub fn participants(&self) -> Vec<NodeId> {
        match self {
            RelationshipKind::Partner { a, b, .. } | RelationshipKind::Emotional { a, b, .. } => {
                vec![*a, *b]
            }
            RelationshipKind::ParentChild {
                father,
                mother,
                child,
                ..
            } => father.iter().chain(mother.iter()).copied().chain([*child]).collect(),
        }
    }

    /// Whether `person` takes part in this relationship
    pub fn involves(&self, person: NodeId) -> bool {
        self.participants().contains(&person)
    }

    /// Status vocabulary tag
    pub fn status_tag(&self) -> &'static str {
        match self {
            RelationshipKind::Partner { status, .. } => status.as_str(),
            RelationshipKind::ParentChild { status, .. } => status.as_str(),
            RelationshipKind::Emotional { status, .. } => status.as_str(),
        }
    }
}

/// A relationship stored in the genogram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Unique identifier for the relationship
    pub id: RelationshipId,
    /// Kind-specific payload
    pub kind: RelationshipKind,
    /// Optional free-text label shown next to the line
    pub label: Option<String>,
}

impl Relationship {
    /// Create a relationship without a label
    pub fn new(id: RelationshipId, kind: RelationshipKind) -> Self {
        Self {
            id,
            kind,
            label: None,
        }
    }

    /// Attach a label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Parents of a parent-child link, `None` for the other kinds
    pub fn parents(&self) -> Option<(Option<NodeId>, Option<NodeId>)> {
        match self.kind {
            RelationshipKind::ParentChild { father, mother, .. } => Some((father, mother)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_child_participants() {
        let kind = RelationshipKind::ParentChild {
            father: None,
            mother: Some(NodeId::new(2)),
            child: NodeId::new(3),
            status: ParentChildStatus::Adopted,
        };
        assert_eq!(kind.participants(), vec![NodeId::new(2), NodeId::new(3)]);
        assert!(!kind.involves(NodeId::new(1)));
        assert_eq!(kind.tag(), "parent_child");
        assert_eq!(kind.status_tag(), "adopted");
    }
}
