//! Genogram layout
//!
//! The `Layout` maps every person and fetus to a grid-aligned coordinate. It is
//! derived data: recomputed wholesale by the tree layout engine and patched
//! incrementally by the editor on drag.

pub mod grid;
pub mod tree_layout;

pub use grid::{is_aligned, snap, snap_to};
pub use tree_layout::TreeLayoutEngine;

use crate::value_objects::{NodeId, Position2D};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Spacing constants of the tree layout, in canvas units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Left edge after normalization
    pub origin_x: f64,
    /// Y of the topmost generation
    pub origin_y: f64,
    pub grid_size: f64,
    pub grid_offset: f64,
    /// Horizontal advance between siblings and orphans
    pub sibling_gap: f64,
    /// Minimum distance between partners
    pub min_couple_gap: f64,
    /// Vertical distance between generation bands
    pub generation_gap: f64,
    /// Horizontal gap between composed family trees
    pub tree_gap: f64,
    /// How far a couple extends past its outermost children
    pub parent_overhang: f64,
    /// Fetus offset when only one parent is known
    pub single_parent_fetus_offset: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            origin_x: 15.0,
            origin_y: 15.0,
            grid_size: grid::GRID_SIZE,
            grid_offset: grid::GRID_OFFSET,
            sibling_gap: 90.0,
            min_couple_gap: 90.0,
            generation_gap: 150.0,
            tree_gap: 180.0,
            parent_overhang: 45.0,
            single_parent_fetus_offset: 90.0,
        }
    }
}

impl LayoutConfig {
    /// Snap a value to this configuration's grid
    pub fn snap(&self, v: f64) -> f64 {
        snap_to(v, self.grid_size, self.grid_offset)
    }

    /// Snap both axes of a position
    pub fn snap_position(&self, position: Position2D) -> Position2D {
        Position2D::new(self.snap(position.x), self.snap(position.y))
    }
}

/// Coordinates of persons and fetuses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    positions: BTreeMap<NodeId, Position2D>,
}

impl Layout {
    /// Create an empty layout
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the coordinate of a node
    pub fn get(&self, id: NodeId) -> Option<Position2D> {
        self.positions.get(&id).copied()
    }

    /// Set a coordinate, returning the previous one
    pub fn set(&mut self, id: NodeId, position: Position2D) -> Option<Position2D> {
        self.positions.insert(id, position)
    }

    /// Drop a coordinate
    pub fn remove(&mut self, id: NodeId) -> Option<Position2D> {
        self.positions.remove(&id)
    }

    /// Iterate coordinates in id order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, Position2D)> + '_ {
        self.positions.iter().map(|(id, pos)| (*id, *pos))
    }

    /// Number of placed nodes
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether nothing is placed
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Largest x of any placed node
    pub fn max_x(&self) -> Option<f64> {
        self.positions.values().map(|p| p.x).reduce(f64::max)
    }

    /// Smallest x of any placed node
    pub fn min_x(&self) -> Option<f64> {
        self.positions.values().map(|p| p.x).reduce(f64::min)
    }

    /// Whether every coordinate lies on the configured grid
    pub fn is_grid_aligned(&self, config: &LayoutConfig) -> bool {
        self.positions.values().all(|p| {
            is_aligned(p.x, config.grid_size, config.grid_offset)
                && is_aligned(p.y, config.grid_size, config.grid_offset)
        })
    }
}

impl FromIterator<(NodeId, Position2D)> for Layout {
    fn from_iter<I: IntoIterator<Item = (NodeId, Position2D)>>(iter: I) -> Self {
        Self {
            positions: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_bounds_and_alignment() {
        let config = LayoutConfig::default();
        let layout: Layout = [
            (NodeId::new(1), Position2D::new(15.0, 15.0)),
            (NodeId::new(2), Position2D::new(195.0, 165.0)),
        ]
        .into_iter()
        .collect();

        assert_eq!(layout.min_x(), Some(15.0));
        assert_eq!(layout.max_x(), Some(195.0));
        assert!(layout.is_grid_aligned(&config));

        let mut layout = layout;
        layout.set(NodeId::new(3), Position2D::new(20.0, 15.0));
        assert!(!layout.is_grid_aligned(&config));
    }

    #[test]
    fn test_config_deserializes_partial_json() {
        let config: LayoutConfig = serde_json::from_str(r#"{"sibling_gap": 120.0}"#).unwrap();
        assert_eq!(config.sibling_gap, 120.0);
        assert_eq!(config.generation_gap, 150.0);
    }
}
