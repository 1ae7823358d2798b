//! Grid alignment
//!
//! Finalized coordinates sit on a 30-unit grid offset by 15, so every value
//! satisfies `v mod 30 == 15`.

/// Default grid pitch
pub const GRID_SIZE: f64 = 30.0;

/// Default grid offset
pub const GRID_OFFSET: f64 = 15.0;

/// Snap to the default grid, rounding halves toward positive infinity
pub fn snap(v: f64) -> f64 {
    snap_to(v, GRID_SIZE, GRID_OFFSET)
}

/// Snap to an arbitrary grid, rounding halves toward positive infinity
pub fn snap_to(v: f64, grid_size: f64, offset: f64) -> f64 {
    ((v - offset) / grid_size + 0.5).floor() * grid_size + offset
}

/// Whether `v` already lies on the grid
pub fn is_aligned(v: f64, grid_size: f64, offset: f64) -> bool {
    (v - offset).rem_euclid(grid_size) == 0.0
}
