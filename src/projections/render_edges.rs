//! Edge render records
//!
//! Parent-child and fetus lines start at the midpoint between the parents, or
//! at the single known parent.

use crate::aggregate::{Genogram, RelationshipKind};
use crate::layout::Layout;
use crate::value_objects::{NodeId, Position2D, RelationshipId};
use serde::{Deserialize, Serialize};

/// Line style family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderEdgeKind {
    Partner,
    ParentChild,
    Emotional,
    Fetus,
}

/// A positioned line segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderEdge {
    /// Backing relationship; fetus lines have none
    pub relationship: Option<RelationshipId>,
    pub kind: RenderEdgeKind,
    /// Status vocabulary tag selecting the line decoration
    pub status: String,
    pub from: Position2D,
    pub to: Position2D,
    pub label: Option<String>,
}

/// Render records of every relationship whose endpoints are placed
pub fn render_edges(graph: &Genogram, layout: &Layout) -> Vec<RenderEdge> {
    let mut edges = Vec::new();

    for rel in graph.relationships() {
        let endpoints = match rel.kind {
            RelationshipKind::Partner { a, b, .. } => {
                layout.get(a).zip(layout.get(b)).map(|ends| (RenderEdgeKind::Partner, ends))
            }
            RelationshipKind::Emotional { a, b, .. } => layout
                .get(a)
                .zip(layout.get(b))
                .map(|ends| (RenderEdgeKind::Emotional, ends)),
            RelationshipKind::ParentChild {
                father,
                mother,
                child,
                ..
            } => parents_anchor(layout, father, mother)
                .zip(layout.get(child))
                .map(|ends| (RenderEdgeKind::ParentChild, ends)),
        };
        if let Some((kind, (from, to))) = endpoints {
            edges.push(RenderEdge {
                relationship: Some(rel.id),
                kind,
                status: rel.kind.status_tag().to_string(),
                from,
                to,
                label: rel.label.clone(),
            });
        }
    }

    for fetus in graph.fetuses() {
        let from = parents_anchor(layout, fetus.father, fetus.mother);
        if let Some((from, to)) = from.zip(layout.get(fetus.id)) {
            edges.push(RenderEdge {
                relationship: None,
                kind: RenderEdgeKind::Fetus,
                status: fetus.status.as_str().to_string(),
                from,
                to,
                label: None,
            });
        }
    }

    edges
}

fn parents_anchor(
    layout: &Layout,
    father: Option<NodeId>,
    mother: Option<NodeId>,
) -> Option<Position2D> {
    let placed: Vec<Position2D> = father
        .into_iter()
        .chain(mother)
        .map(|parent| layout.get(parent))
        .collect::<Option<_>>()?;
    match placed.as_slice() {
        [one] => Some(*one),
        [a, b] => Some(Position2D::new((a.x + b.x) / 2.0, a.y.max(b.y))),
        _ => None,
    }
}
