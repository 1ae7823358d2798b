//! Render projections
//!
//! Flattens a positioned genogram into the records the canvas draws: one node
//! per person or fetus and one edge per line segment. Entities without a
//! coordinate are left out.

pub mod render_edges;
pub mod render_nodes;

pub use render_edges::*;
pub use render_nodes::*;

use crate::aggregate::Genogram;
use crate::layout::Layout;
use crate::value_objects::NodeId;
use serde::{Deserialize, Serialize};

/// Everything the rendering layer needs for one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderProjection {
    pub nodes: Vec<RenderNode>,
    pub edges: Vec<RenderEdge>,
}

impl RenderProjection {
    /// Project a graph and its layout
    pub fn build(graph: &Genogram, layout: &Layout) -> Self {
        let nodes = render_nodes(graph, layout);
        let edges = render_edges(graph, layout);
        let skipped = graph.person_count() + graph.fetuses().count() - nodes.len();
        if skipped > 0 {
            tracing::debug!(skipped, "Unplaced nodes left out of render projection");
        }
        Self { nodes, edges }
    }

    /// Render record of a node
    pub fn node(&self, id: NodeId) -> Option<&RenderNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Edges of one kind
    pub fn edges_of_kind(&self, kind: RenderEdgeKind) -> impl Iterator<Item = &RenderEdge> {
        self.edges.iter().filter(move |edge| edge.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::PersonAttributes;
    use crate::layout::TreeLayoutEngine;
    use crate::value_objects::{
        EmotionalStatus, FetusStatus, Gender, ParentChildStatus, PartnerStatus, Position2D,
    };

    #[test]
    fn test_projection_covers_every_line() {
        let mut graph = Genogram::new();
        let f = graph.add_person(PersonAttributes::new(Gender::Male).with_name("Abe"));
        let m = graph.add_person(PersonAttributes::new(Gender::Female));
        let c = graph.add_person(PersonAttributes::new(Gender::Female).deceased());
        graph.add_partner(f, m, PartnerStatus::Separated).unwrap();
        graph
            .add_parent_child(Some(f), Some(m), c, ParentChildStatus::Foster)
            .unwrap();
        graph.add_emotional(m, c, EmotionalStatus::Hostile).unwrap();
        let fetus = graph.add_fetus(Some(f), Some(m), FetusStatus::Miscarriage).unwrap();
        let layout = TreeLayoutEngine::default().layout(&graph);

        let projection = RenderProjection::build(&graph, &layout);
        assert_eq!(projection.nodes.len(), 4);
        assert_eq!(projection.edges.len(), 4);
        assert_eq!(projection.node(f).unwrap().label.as_deref(), Some("Abe"));

        let child_line = projection
            .edges_of_kind(RenderEdgeKind::ParentChild)
            .next()
            .unwrap();
        let fp = layout.get(f).unwrap();
        let mp = layout.get(m).unwrap();
        assert_eq!(child_line.from, Position2D::new((fp.x + mp.x) / 2.0, fp.y));
        assert_eq!(child_line.to, layout.get(c).unwrap());
        assert_eq!(child_line.status, "foster");

        let fetus_line = projection.edges_of_kind(RenderEdgeKind::Fetus).next().unwrap();
        assert_eq!(fetus_line.to, layout.get(fetus).unwrap());
        assert_eq!(fetus_line.relationship, None);
    }

    #[test]
    fn test_unplaced_nodes_are_skipped() {
        let mut graph = Genogram::new();
        let a = graph.add_person(PersonAttributes::new(Gender::Male));
        let b = graph.add_person(PersonAttributes::new(Gender::Female));
        graph.add_partner(a, b, PartnerStatus::Married).unwrap();
        let layout: Layout = [(a, Position2D::new(15.0, 15.0))].into_iter().collect();

        let projection = RenderProjection::build(&graph, &layout);
        assert_eq!(projection.nodes.len(), 1);
        assert!(projection.edges.is_empty());
    }
}
