//! Genogram aggregates

pub mod genogram;
pub mod person;
pub mod relationship;

pub use genogram::*;
pub use person::*;
pub use relationship::*;
