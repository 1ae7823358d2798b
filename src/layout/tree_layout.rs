//! Constraint-based family tree layout
//!
//! Turns an unordered set of persons and relationships into generation-banded,
//! non-overlapping, grid-aligned coordinates:
//!
//! 1. Root discovery walks parent links upward (father first) with a visited set.
//! 2. Placement descends from the root couple with an explicit work stack. Leaf
//!    families consume x-space left to right; a couple with children is centered
//!    over them and pushed right if it would overlap its generation band.
//! 3. At most two trees are composed: the subject's and the subject's partner's.
//! 4. Everything unreached lands in one orphan row.
//! 5. Fetuses sit below their parents.
//! 6. All coordinates are snapped, then shifted so the leftmost x is the origin.

use crate::aggregate::Genogram;
use crate::errors::{GenogramError, GenogramResult};
use crate::layout::{Layout, LayoutConfig};
use crate::value_objects::{NodeId, Position2D};
use std::collections::{HashMap, HashSet};

/// Tree layout engine
#[derive(Debug, Clone, Default)]
pub struct TreeLayoutEngine {
    config: LayoutConfig,
}

/// Work items of the placement stack
enum Frame {
    Enter {
        person: NodeId,
        depth: usize,
    },
    Exit {
        members: Vec<NodeId>,
        children: Vec<NodeId>,
        depth: usize,
        mark: usize,
    },
}

/// A node placed by one tree pass, before snapping
#[derive(Debug, Clone, Copy)]
struct Placed {
    id: NodeId,
    x: f64,
    depth: usize,
}

/// State of one tree placement
struct TreePass<'a> {
    graph: &'a Genogram,
    config: &'a LayoutConfig,
    claimed: &'a mut HashSet<NodeId>,
    placed: Vec<Placed>,
    index: HashMap<NodeId, usize>,
    /// Rightmost x per generation band
    contour: HashMap<usize, f64>,
    cursor: f64,
}

impl<'a> TreePass<'a> {
    fn new(
        graph: &'a Genogram,
        config: &'a LayoutConfig,
        claimed: &'a mut HashSet<NodeId>,
    ) -> Self {
        Self {
            graph,
            config,
            claimed,
            placed: Vec::new(),
            index: HashMap::new(),
            contour: HashMap::new(),
            cursor: config.origin_x,
        }
    }

    /// Place the family tree hanging from `root`
    fn run(mut self, root: NodeId) -> Vec<Placed> {
        self.claimed.insert(root);
        let mut stack = vec![Frame::Enter {
            person: root,
            depth: 0,
        }];

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter { person, depth } => {
                    let members = self.claim_family_unit(person);
                    let children = self.claim_children(&members);
                    if children.is_empty() {
                        self.place_leaf_unit(&members, depth);
                    } else {
                        stack.push(Frame::Exit {
                            members,
                            children: children.clone(),
                            depth,
                            mark: self.placed.len(),
                        });
                        for child in children.into_iter().rev() {
                            stack.push(Frame::Enter {
                                person: child,
                                depth: depth + 1,
                            });
                        }
                    }
                }
                Frame::Exit {
                    members,
                    children,
                    depth,
                    mark,
                } => self.place_parent_unit(&members, &children, depth, mark),
            }
        }

        self.placed
    }

    /// The person plus every unclaimed partner, ordered male left, female right
    fn claim_family_unit(&mut self, person: NodeId) -> Vec<NodeId> {
        claim_partner_chain(self.graph, person, self.claimed)
    }

    /// Unclaimed children of the unit in birth order; unknown order sorts last
    fn claim_children(&mut self, members: &[NodeId]) -> Vec<NodeId> {
        let mut children: Vec<NodeId> = Vec::new();
        for child in self.graph.children_of_any(members) {
            if self.claimed.insert(child) {
                children.push(child);
            }
        }
        let order = |id: &NodeId| {
            self.graph
                .person(*id)
                .and_then(|p| p.attributes.birth_order)
                .unwrap_or(u32::MAX)
        };
        children.sort_by_key(|id| (order(id), *id));
        children
    }

    fn band_limit(&self, depth: usize) -> Option<f64> {
        self.contour
            .get(&depth)
            .map(|right| right + self.config.sibling_gap)
    }

    fn record(&mut self, id: NodeId, x: f64, depth: usize) {
        self.index.insert(id, self.placed.len());
        self.placed.push(Placed { id, x, depth });
        let right = self.contour.entry(depth).or_insert(x);
        *right = right.max(x);
    }

    /// A person or couple without children: placed at the cursor
    fn place_leaf_unit(&mut self, members: &[NodeId], depth: usize) {
        let start = match self.band_limit(depth) {
            Some(limit) => self.cursor.max(limit),
            None => self.cursor,
        };
        let mut x = start;
        for (i, id) in members.iter().enumerate() {
            if i > 0 {
                x += self.config.min_couple_gap;
            }
            self.record(*id, x, depth);
        }
        self.cursor = x + self.config.sibling_gap;
    }

    /// A unit whose children are already placed: centered over them
    fn place_parent_unit(
        &mut self,
        members: &[NodeId],
        children: &[NodeId],
        depth: usize,
        mark: usize,
    ) {
        let xs: Vec<f64> = children
            .iter()
            .filter_map(|child| self.index.get(child).map(|i| self.placed[*i].x))
            .collect();
        let min = xs.iter().copied().fold(f64::INFINITY, f64::min);
        let max = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let lattice = lattice_step(self.config);
        let mid = (min + max) / 2.0;
        let positions: Vec<f64> = if members.len() == 1 {
            vec![to_lattice(self.config, mid)]
        } else {
            let gaps = (members.len() - 1) as f64;
            let width = max - min + 2.0 * self.config.parent_overhang;
            let step = (width / gaps).max(self.config.min_couple_gap);
            let step = (step / lattice).ceil() * lattice;
            let left = to_lattice(self.config, mid - step * gaps / 2.0);
            (0..members.len()).map(|i| left + step * i as f64).collect()
        };

        // Push the whole subtree right if the unit would crowd its band.
        let shift = match self.band_limit(depth) {
            Some(limit) if positions[0] < limit => limit - positions[0],
            _ => 0.0,
        };

        for (id, x) in members.iter().zip(positions) {
            self.index.insert(*id, self.placed.len());
            self.placed.push(Placed { id: *id, x, depth });
        }

        if shift > 0.0 {
            for placed in &mut self.placed[mark..] {
                placed.x += shift;
            }
            self.cursor += shift;
        }

        for i in mark..self.placed.len() {
            let Placed { x, depth, .. } = self.placed[i];
            let right = self.contour.entry(depth).or_insert(x);
            *right = right.max(x);
        }
    }
}

/// Claim `person`'s unclaimed partners, their partners in turn and so on
///
/// Remarriage chains form one unit. Members are ordered male left, female
/// right, lower id first within a rank, which is the stored partner order.
fn claim_partner_chain(
    graph: &Genogram,
    person: NodeId,
    claimed: &mut HashSet<NodeId>,
) -> Vec<NodeId> {
    let mut members = vec![person];
    let mut next = 0;
    while next < members.len() {
        for partner in graph.partners_of(members[next]) {
            if claimed.insert(partner) {
                members.push(partner);
            }
        }
        next += 1;
    }
    members.sort_by_key(|id| {
        let rank = graph
            .person(*id)
            .map(|p| p.gender().couple_rank())
            .unwrap_or(1);
        (rank, *id)
    });
    members
}

/// Spacing unit of unsnapped coordinates
///
/// Points `origin_x + k * 1.5 * grid_size` all move the same way under snapping
/// when `k` has the same parity, so gaps of two steps or more never shrink
/// below the configured spacing.
fn lattice_step(config: &LayoutConfig) -> f64 {
    config.grid_size * 1.5
}

fn to_lattice(config: &LayoutConfig, v: f64) -> f64 {
    let step = lattice_step(config);
    config.origin_x + ((v - config.origin_x) / step).round() * step
}

impl TreeLayoutEngine {
    /// Create an engine with the given spacing
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    /// The engine's spacing constants
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Lay out the graph with the lowest-id person as subject
    pub fn layout(&self, graph: &Genogram) -> Layout {
        let subject = graph.persons().next().map(|p| p.id);
        self.layout_for_subject(graph, subject)
    }

    /// Lay out the subject's tree, the subject's partner's tree and the orphans
    pub fn layout_for_subject(&self, graph: &Genogram, subject: Option<NodeId>) -> Layout {
        let config = &self.config;
        let mut claimed: HashSet<NodeId> = HashSet::new();
        let mut rows: Vec<(NodeId, f64, f64)> = Vec::new();
        let mut right_edge: Option<f64> = None;

        let subject = subject.filter(|id| graph.person(*id).is_some());
        let starts = subject
            .into_iter()
            .chain(subject.and_then(|id| graph.spouse_of(id)));

        for start in starts {
            let root = self.resolve_root(graph, start);
            if claimed.contains(&root) {
                continue;
            }
            let tree = TreePass::new(graph, config, &mut claimed).run(root);
            let tree_min = tree.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
            let shift = match right_edge {
                Some(edge) => edge + config.tree_gap - tree_min,
                None => 0.0,
            };
            for placed in tree {
                let x = placed.x + shift;
                let y = config.origin_y + placed.depth as f64 * config.generation_gap;
                right_edge = Some(right_edge.map_or(x, |edge: f64| edge.max(x)));
                rows.push((placed.id, x, y));
            }
            tracing::debug!(root = %root, nodes = rows.len(), "Family tree placed");
        }

        self.place_orphans(graph, &mut claimed, &mut rows, right_edge);

        let mut raw: HashMap<NodeId, Position2D> = rows
            .into_iter()
            .map(|(id, x, y)| (id, Position2D::new(x, y)))
            .collect();
        self.place_fetuses(graph, &mut raw);

        let layout = self.finalize(raw);
        tracing::info!(
            persons = graph.person_count(),
            placed = layout.len(),
            "Genogram layout computed"
        );
        layout
    }

    /// Walk parent links upward from `start`, preferring the father
    ///
    /// A cyclic parent chain stops the walk; the error names the person at which
    /// the cycle was detected.
    pub fn discover_root(&self, graph: &Genogram, start: NodeId) -> GenogramResult<NodeId> {
        let mut visited = HashSet::from([start]);
        let mut current = start;
        loop {
            let Some((father, mother)) = graph.parent_link_of(current).and_then(|r| r.parents())
            else {
                return Ok(current);
            };
            let next = father
                .into_iter()
                .chain(mother)
                .find(|parent| !visited.contains(parent));
            match next {
                Some(parent) => {
                    visited.insert(parent);
                    current = parent;
                }
                None => return Err(GenogramError::LayoutUnresolvable { person: current }),
            }
        }
    }

    /// The root couple reached from `start`, left member first
    pub fn root_couple(&self, graph: &Genogram, start: NodeId) -> Vec<NodeId> {
        let root = self.resolve_root(graph, start);
        match graph.spouse_of(root) {
            Some(spouse) => {
                let (left, right) = graph.couple_order(root, spouse);
                vec![left, right]
            }
            None => vec![root],
        }
    }

    fn resolve_root(&self, graph: &Genogram, start: NodeId) -> NodeId {
        match self.discover_root(graph, start) {
            Ok(root) => root,
            Err(GenogramError::LayoutUnresolvable { person }) => {
                tracing::warn!(
                    start = %start,
                    stopped_at = %person,
                    "Cyclic parent chain during root discovery"
                );
                person
            }
            Err(_) => start,
        }
    }

    /// One row after the composed trees; partners stay adjacent and ordered
    fn place_orphans(
        &self,
        graph: &Genogram,
        claimed: &mut HashSet<NodeId>,
        rows: &mut Vec<(NodeId, f64, f64)>,
        right_edge: Option<f64>,
    ) {
        let config = &self.config;
        let mut x = right_edge.map_or(config.origin_x, |edge| edge + config.tree_gap);
        let mut orphans = 0usize;

        for person in graph.persons() {
            if !claimed.insert(person.id) {
                continue;
            }
            let unit = claim_partner_chain(graph, person.id, claimed);
            for (i, id) in unit.into_iter().enumerate() {
                if i > 0 {
                    x += config.min_couple_gap - config.sibling_gap;
                }
                rows.push((id, x, config.origin_y));
                x += config.sibling_gap;
                orphans += 1;
            }
        }

        if orphans > 0 {
            tracing::debug!(orphans, "Orphan row placed");
        }
    }

    /// Where a fetus hangs given its placed parents, before snapping
    ///
    /// Midpoint of two parents, or offset right of a single parent, one
    /// generation below the lower parent.
    pub fn fetus_position(&self, parents: &[Position2D]) -> Option<Position2D> {
        let config = &self.config;
        match parents {
            [one] => Some(Position2D::new(
                one.x + config.single_parent_fetus_offset,
                one.y + config.generation_gap,
            )),
            [a, b] => Some(Position2D::new(
                (a.x + b.x) / 2.0,
                a.y.max(b.y) + config.generation_gap,
            )),
            _ => None,
        }
    }

    fn place_fetuses(&self, graph: &Genogram, raw: &mut HashMap<NodeId, Position2D>) {
        for fetus in graph.fetuses() {
            let parents: Vec<Position2D> =
                fetus.parents().filter_map(|p| raw.get(&p).copied()).collect();
            if let Some(position) = self.fetus_position(&parents) {
                raw.insert(fetus.id, position);
            }
        }
    }

    /// Snap everything, then shift so the leftmost x equals the origin
    fn finalize(&self, raw: HashMap<NodeId, Position2D>) -> Layout {
        let config = &self.config;
        let snapped: Vec<(NodeId, Position2D)> = raw
            .into_iter()
            .map(|(id, pos)| (id, config.snap_position(pos)))
            .collect();
        let min_x = snapped
            .iter()
            .map(|(_, p)| p.x)
            .fold(f64::INFINITY, f64::min);
        if !min_x.is_finite() {
            return Layout::new();
        }
        let shift = config.origin_x - min_x;
        snapped
            .into_iter()
            .map(|(id, pos)| (id, pos.offset(shift, 0.0)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::PersonAttributes;
    use crate::value_objects::{FetusStatus, Gender, ParentChildStatus, PartnerStatus};

    fn person(graph: &mut Genogram, gender: Gender) -> NodeId {
        graph.add_person(PersonAttributes::new(gender))
    }

    fn x(layout: &Layout, id: NodeId) -> f64 {
        layout.get(id).unwrap().x
    }

    fn y(layout: &Layout, id: NodeId) -> f64 {
        layout.get(id).unwrap().y
    }

    #[test]
    fn test_two_children_scenario() {
        let mut graph = Genogram::new();
        let father = person(&mut graph, Gender::Male);
        let mother = person(&mut graph, Gender::Female);
        let c2 = graph.add_person(PersonAttributes::new(Gender::Male).with_birth_order(2));
        let c1 = graph.add_person(PersonAttributes::new(Gender::Female).with_birth_order(1));
        graph.add_partner(father, mother, PartnerStatus::Married).unwrap();
        graph
            .add_parent_child(Some(father), Some(mother), c2, ParentChildStatus::Biological)
            .unwrap();
        graph
            .add_parent_child(Some(father), Some(mother), c1, ParentChildStatus::Biological)
            .unwrap();

        let layout = TreeLayoutEngine::default().layout_for_subject(&graph, Some(c1));

        assert_eq!((x(&layout, c1), y(&layout, c1)), (45.0, 165.0));
        assert_eq!((x(&layout, c2), y(&layout, c2)), (135.0, 165.0));
        assert_eq!((x(&layout, father), y(&layout, father)), (15.0, 15.0));
        assert_eq!((x(&layout, mother), y(&layout, mother)), (195.0, 15.0));
    }

    #[test]
    fn test_root_discovery_prefers_father() {
        let mut graph = Genogram::new();
        let grandfather = person(&mut graph, Gender::Male);
        let father = person(&mut graph, Gender::Male);
        let mother = person(&mut graph, Gender::Female);
        let maternal_grandmother = person(&mut graph, Gender::Female);
        let child = person(&mut graph, Gender::Female);
        graph
            .add_parent_child(Some(grandfather), None, father, ParentChildStatus::Biological)
            .unwrap();
        graph
            .add_parent_child(
                None,
                Some(maternal_grandmother),
                mother,
                ParentChildStatus::Biological,
            )
            .unwrap();
        graph
            .add_parent_child(Some(father), Some(mother), child, ParentChildStatus::Biological)
            .unwrap();

        let engine = TreeLayoutEngine::default();
        assert_eq!(engine.discover_root(&graph, child), Ok(grandfather));
        assert_eq!(engine.discover_root(&graph, mother), Ok(maternal_grandmother));
    }

    #[test]
    fn test_cycle_is_detected_and_layout_completes() {
        let mut graph = Genogram::new();
        let a = person(&mut graph, Gender::Male);
        let b = person(&mut graph, Gender::Male);
        let loner = person(&mut graph, Gender::Female);
        graph
            .add_parent_child(Some(a), None, b, ParentChildStatus::Biological)
            .unwrap();
        graph
            .add_parent_child(Some(b), None, a, ParentChildStatus::Biological)
            .unwrap();

        let engine = TreeLayoutEngine::default();
        assert_eq!(
            engine.discover_root(&graph, a),
            Err(GenogramError::LayoutUnresolvable { person: b })
        );

        let layout = engine.layout(&graph);
        assert_eq!(layout.len(), 3);
        assert!(layout.is_grid_aligned(engine.config()));
        assert!(layout.get(loner).is_some());
    }

    #[test]
    fn test_partner_tree_is_composed_to_the_right() {
        let mut graph = Genogram::new();
        let subject = person(&mut graph, Gender::Male);
        let wife = person(&mut graph, Gender::Female);
        let his_father = person(&mut graph, Gender::Male);
        let her_mother = person(&mut graph, Gender::Female);
        graph.add_partner(subject, wife, PartnerStatus::Married).unwrap();
        graph
            .add_parent_child(Some(his_father), None, subject, ParentChildStatus::Biological)
            .unwrap();
        graph
            .add_parent_child(None, Some(her_mother), wife, ParentChildStatus::Biological)
            .unwrap();

        let engine = TreeLayoutEngine::default();
        let layout = engine.layout_for_subject(&graph, Some(subject));

        assert!(x(&layout, subject) < x(&layout, wife));
        assert!(x(&layout, her_mother) >= x(&layout, his_father) + 180.0);
        assert_eq!(y(&layout, her_mother), 15.0);
        assert_eq!(engine.root_couple(&graph, wife), vec![her_mother]);
    }

    #[test]
    fn test_orphans_follow_the_trees() {
        let mut graph = Genogram::new();
        let father = person(&mut graph, Gender::Male);
        let child = person(&mut graph, Gender::Male);
        let stranger = person(&mut graph, Gender::Female);
        let stranger_husband = person(&mut graph, Gender::Male);
        graph
            .add_parent_child(Some(father), None, child, ParentChildStatus::Biological)
            .unwrap();
        graph
            .add_partner(stranger, stranger_husband, PartnerStatus::Dating)
            .unwrap();

        let layout = TreeLayoutEngine::default().layout_for_subject(&graph, Some(child));
        assert_eq!(y(&layout, stranger), 15.0);
        assert!(x(&layout, stranger_husband) < x(&layout, stranger));
        assert!(x(&layout, stranger_husband) >= x(&layout, father) + 180.0);
    }

    #[test]
    fn test_fetus_placement() {
        let mut graph = Genogram::new();
        let father = person(&mut graph, Gender::Male);
        let mother = person(&mut graph, Gender::Female);
        let single = person(&mut graph, Gender::Female);
        graph.add_partner(father, mother, PartnerStatus::Married).unwrap();
        let shared = graph
            .add_fetus(Some(father), Some(mother), FetusStatus::Miscarriage)
            .unwrap();
        let alone = graph.add_fetus(None, Some(single), FetusStatus::Pregnancy).unwrap();

        let layout = TreeLayoutEngine::default().layout(&graph);
        assert_eq!(x(&layout, father), 15.0);
        assert_eq!(x(&layout, mother), 105.0);
        assert_eq!(x(&layout, shared), 75.0);
        assert_eq!(y(&layout, shared), 165.0);
        assert_eq!(x(&layout, alone), x(&layout, single) + 90.0);
        assert!(layout.is_grid_aligned(&LayoutConfig::default()));
    }

    #[test]
    fn test_married_child_does_not_crowd_next_sibling() {
        let mut graph = Genogram::new();
        let father = person(&mut graph, Gender::Male);
        let mother = person(&mut graph, Gender::Female);
        let son = graph.add_person(PersonAttributes::new(Gender::Male).with_birth_order(1));
        let daughter = graph.add_person(PersonAttributes::new(Gender::Female).with_birth_order(2));
        let daughter_in_law = person(&mut graph, Gender::Female);
        let grandchild = person(&mut graph, Gender::Male);
        graph.add_partner(father, mother, PartnerStatus::Married).unwrap();
        graph.add_partner(son, daughter_in_law, PartnerStatus::Married).unwrap();
        for child in [son, daughter] {
            graph
                .add_parent_child(Some(father), Some(mother), child, ParentChildStatus::Biological)
                .unwrap();
        }
        graph
            .add_parent_child(
                Some(son),
                Some(daughter_in_law),
                grandchild,
                ParentChildStatus::Biological,
            )
            .unwrap();

        let layout = TreeLayoutEngine::default().layout(&graph);
        assert!(x(&layout, daughter_in_law) - x(&layout, son) >= 90.0);
        assert!(x(&layout, daughter) - x(&layout, daughter_in_law) >= 90.0);
        assert!(x(&layout, mother) - x(&layout, father) >= 90.0);
        assert_eq!(y(&layout, grandchild), 315.0);
        assert_eq!(layout.min_x(), Some(15.0));
    }

    #[test]
    fn test_remarriage_chain_keeps_partner_order() {
        let mut graph = Genogram::new();
        let first_husband = person(&mut graph, Gender::Male);
        let wife = person(&mut graph, Gender::Female);
        let second_husband = person(&mut graph, Gender::Male);
        graph.add_partner(first_husband, wife, PartnerStatus::Divorced).unwrap();
        graph.add_partner(wife, second_husband, PartnerStatus::Married).unwrap();

        let layout = TreeLayoutEngine::default().layout(&graph);
        assert!(x(&layout, first_husband) < x(&layout, wife));
        assert!(x(&layout, second_husband) < x(&layout, wife));
        assert_eq!(y(&layout, second_husband), y(&layout, wife));
        assert!(layout.is_grid_aligned(&LayoutConfig::default()));
    }

    #[test]
    fn test_stepfather_joins_the_parent_unit() {
        let mut graph = Genogram::new();
        let father = person(&mut graph, Gender::Male);
        let mother = person(&mut graph, Gender::Female);
        let child = person(&mut graph, Gender::Female);
        let stepfather = person(&mut graph, Gender::Male);
        graph.add_partner(father, mother, PartnerStatus::Divorced).unwrap();
        graph.add_partner(stepfather, mother, PartnerStatus::Married).unwrap();
        graph
            .add_parent_child(Some(father), Some(mother), child, ParentChildStatus::Biological)
            .unwrap();

        let layout = TreeLayoutEngine::default().layout(&graph);
        assert_eq!(x(&layout, father), 15.0);
        assert_eq!(x(&layout, stepfather), 105.0);
        assert_eq!(x(&layout, mother), 195.0);
        assert_eq!((x(&layout, child), y(&layout, child)), (105.0, 165.0));
    }

    #[test]
    fn test_orphan_partner_chain_stays_together() {
        let mut graph = Genogram::new();
        let subject = person(&mut graph, Gender::Unknown);
        let wife = person(&mut graph, Gender::Female);
        let first_husband = person(&mut graph, Gender::Male);
        let second_husband = person(&mut graph, Gender::Male);
        graph.add_partner(wife, first_husband, PartnerStatus::Widowed).unwrap();
        graph.add_partner(second_husband, wife, PartnerStatus::Married).unwrap();

        let layout = TreeLayoutEngine::default().layout_for_subject(&graph, Some(subject));
        let row = [first_husband, second_husband, wife].map(|id| x(&layout, id));
        assert_eq!(row, [195.0, 285.0, 375.0]);
    }
}
