//! Node render records

use crate::aggregate::Genogram;
use crate::layout::Layout;
use crate::value_objects::{FetusStatus, Gender, NodeId, Position2D, VitalStatus};
use serde::{Deserialize, Serialize};

/// Symbol to draw for a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum RenderNodeKind {
    /// Square, circle or diamond by gender; crossed out when deceased
    Person {
        gender: Gender,
        vital_status: VitalStatus,
        age: Option<u32>,
    },
    /// Small triangle or cross by outcome
    Fetus { status: FetusStatus },
}

/// A positioned node record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderNode {
    pub id: NodeId,
    pub kind: RenderNodeKind,
    pub position: Position2D,
    /// Caption under the symbol
    pub label: Option<String>,
}

/// Render records of every placed person and fetus, persons first
pub fn render_nodes(graph: &Genogram, layout: &Layout) -> Vec<RenderNode> {
    let persons = graph.persons().filter_map(|person| {
        let attributes = &person.attributes;
        Some(RenderNode {
            id: person.id,
            kind: RenderNodeKind::Person {
                gender: attributes.gender,
                vital_status: attributes.vital_status,
                age: attributes.age,
            },
            position: layout.get(person.id)?,
            label: attributes.name.clone(),
        })
    });
    let fetuses = graph.fetuses().filter_map(|fetus| {
        Some(RenderNode {
            id: fetus.id,
            kind: RenderNodeKind::Fetus {
                status: fetus.status,
            },
            position: layout.get(fetus.id)?,
            label: None,
        })
    });
    persons.chain(fetuses).collect()
}
