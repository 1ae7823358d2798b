//! Genogram domain
//!
//! Family-relationship graphs with a deterministic tree layout, a stable
//! transport codec, an undoable command editor and debounced autosave.
//!
//! A fact list or a manual construction produces a `Genogram`; the
//! `TreeLayoutEngine` computes grid-aligned coordinates; the `codec` emits the
//! transport form consumed by renderers and storage. Interactive sessions go
//! through `GenogramEditor`, whose change events feed `AutosaveCoordinator`.

pub mod aggregate;
pub mod autosave;
pub mod codec;
pub mod commands;
pub mod config;
pub mod editor;
pub mod errors;
pub mod import;
pub mod infrastructure;
pub mod layout;
pub mod projections;
pub mod value_objects;

// Re-export main types
pub use aggregate::*;
pub use errors::{GenogramError, GenogramResult};
pub use value_objects::*;

pub use autosave::{AutosaveConfig, AutosaveCoordinator, AutosavePhase, SaveStatus};
pub use codec::{GenogramDocument, NodeRecord, RelationshipRecord, SCHEMA_VERSION};
pub use commands::{CommandHistory, EditCommand, FetusMove};
pub use config::GenogramConfig;
pub use editor::{ChangeCause, EditorConfig, EditorEvent, GenogramEditor};
pub use import::{FactBatch, FactPerson, FactRelationship, GenogramBuilder, ImportedGenogram};
pub use infrastructure::{GenogramStore, InMemoryGenogramStore};
pub use layout::{Layout, LayoutConfig, TreeLayoutEngine};
pub use projections::{RenderEdge, RenderEdgeKind, RenderNode, RenderNodeKind, RenderProjection};
