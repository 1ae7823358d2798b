//! Interactive genogram editor
//!
//! Wraps one document's graph and layout with reversible commands, a bounded
//! undo/redo history and change notification. Every successful mutation
//! publishes an `EditorEvent` carrying the new transport snapshot after the
//! graph and layout are consistent again.

use crate::aggregate::{Genogram, PersonAttributes, RelationshipKind};
use crate::codec::{self, GenogramDocument};
use crate::commands::{CommandHistory, EditCommand, FetusMove};
use crate::errors::{GenogramError, GenogramResult};
use crate::layout::{Layout, LayoutConfig, TreeLayoutEngine};
use crate::value_objects::{
    EmotionalStatus, FetusStatus, Gender, NodeId, ParentChildStatus, PartnerStatus, Position2D,
    RelationshipId,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 64;

/// Editor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Capacity of each of the undo and redo stacks
    pub max_history_size: usize,
    pub layout: LayoutConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_history_size: 100,
            layout: LayoutConfig::default(),
        }
    }
}

/// What produced a change notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeCause {
    Edit,
    Undo,
    Redo,
    /// A snapshot was loaded; the state already matches storage
    Load,
}

/// State-change notification
#[derive(Debug, Clone)]
pub struct EditorEvent {
    /// Monotonic per editor
    pub revision: u64,
    pub cause: ChangeCause,
    pub snapshot: Arc<GenogramDocument>,
}

/// Ids created by a command
#[derive(Debug, Clone, Copy, Default)]
struct Created {
    node: Option<NodeId>,
    relationship: Option<RelationshipId>,
}

impl Created {
    fn of(command: &EditCommand) -> Self {
        Self {
            node: command.created_node(),
            relationship: command.created_relationship(),
        }
    }

    fn node(self) -> GenogramResult<NodeId> {
        self.node
            .ok_or_else(|| GenogramError::InvalidCommand("Command created no node".to_string()))
    }

    fn relationship(self) -> GenogramResult<RelationshipId> {
        self.relationship.ok_or_else(|| {
            GenogramError::InvalidCommand("Command created no relationship".to_string())
        })
    }
}

/// Command-driven editor over one genogram document
pub struct GenogramEditor {
    graph: Genogram,
    layout: Layout,
    history: CommandHistory,
    engine: TreeLayoutEngine,
    revision: u64,
    events: broadcast::Sender<EditorEvent>,
}

impl GenogramEditor {
    /// Create an editor over an empty document
    pub fn new(config: EditorConfig) -> Self {
        Self::with_layout(Genogram::new(), Layout::new(), config)
    }

    /// Create an editor over a graph, computing its initial layout
    pub fn from_graph(graph: Genogram, config: EditorConfig) -> Self {
        let layout = TreeLayoutEngine::new(config.layout.clone()).layout(&graph);
        Self::with_layout(graph, layout, config)
    }

    /// Create an editor over an already laid-out graph
    pub fn with_layout(graph: Genogram, layout: Layout, config: EditorConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            graph,
            layout,
            history: CommandHistory::new(config.max_history_size),
            engine: TreeLayoutEngine::new(config.layout),
            revision: 0,
            events,
        }
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.events.subscribe()
    }

    pub fn graph(&self) -> &Genogram {
        &self.graph
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Number of changes published so far
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Add a person at a (snapped) position
    pub fn add_person(
        &mut self,
        attributes: PersonAttributes,
        position: Position2D,
    ) -> GenogramResult<NodeId> {
        let position = self.engine.config().snap_position(position);
        self.execute(EditCommand::AddPerson {
            id: None,
            attributes,
            position,
        })?
        .node()
    }

    /// Replace a person's attributes
    pub fn update_person(
        &mut self,
        id: NodeId,
        attributes: PersonAttributes,
    ) -> GenogramResult<()> {
        self.execute(EditCommand::UpdatePerson {
            id,
            after: attributes,
            before: None,
        })?;
        Ok(())
    }

    /// Drag a person to a new position; attached fetuses follow
    ///
    /// Fetuses themselves cannot be dragged. A move onto the current grid cell
    /// changes nothing and is not recorded.
    pub fn move_person(&mut self, id: NodeId, to: Position2D) -> GenogramResult<()> {
        if self.graph.fetus(id).is_some() {
            return Err(GenogramError::InvalidCommand(format!(
                "Fetus {id} follows its parents and cannot be moved"
            )));
        }
        if self.graph.person(id).is_none() {
            return Err(GenogramError::EntityNotFound(format!("person {id}")));
        }
        let from = self.position_of(id)?;
        let to = self.engine.config().snap_position(to);
        if from == to {
            return Ok(());
        }

        let mut fetus_moves = Vec::new();
        for fetus in self.graph.fetuses_of(id) {
            let parents: Vec<Position2D> = fetus
                .parents()
                .filter_map(|parent| {
                    if parent == id {
                        Some(to)
                    } else {
                        self.layout.get(parent)
                    }
                })
                .collect();
            let target = self
                .engine
                .fetus_position(&parents)
                .map(|p| self.engine.config().snap_position(p));
            if let (Some(from), Some(to)) = (self.layout.get(fetus.id), target) {
                if from != to {
                    fetus_moves.push(FetusMove {
                        fetus: fetus.id,
                        from,
                        to,
                    });
                }
            }
        }

        self.execute(EditCommand::MovePerson {
            id,
            from,
            to,
            fetus_moves,
        })?;
        Ok(())
    }

    /// Delete a person with everything referencing it
    pub fn delete_person(&mut self, id: NodeId) -> GenogramResult<()> {
        self.execute(EditCommand::DeletePerson {
            id,
            removed: None,
            positions: Vec::new(),
        })?;
        Ok(())
    }

    /// Add a partner relationship
    pub fn add_partner(
        &mut self,
        a: NodeId,
        b: NodeId,
        status: PartnerStatus,
    ) -> GenogramResult<RelationshipId> {
        self.add_relationship(RelationshipKind::Partner { a, b, status }, None)
    }

    /// Link a child to one or both parents
    pub fn add_parent_child(
        &mut self,
        father: Option<NodeId>,
        mother: Option<NodeId>,
        child: NodeId,
        status: ParentChildStatus,
    ) -> GenogramResult<RelationshipId> {
        self.add_relationship(
            RelationshipKind::ParentChild {
                father,
                mother,
                child,
                status,
            },
            None,
        )
    }

    /// Add an emotional-quality link
    pub fn add_emotional(
        &mut self,
        a: NodeId,
        b: NodeId,
        status: EmotionalStatus,
    ) -> GenogramResult<RelationshipId> {
        self.add_relationship(RelationshipKind::Emotional { a, b, status }, None)
    }

    /// Add a relationship of any kind with an optional label
    pub fn add_relationship(
        &mut self,
        kind: RelationshipKind,
        label: Option<String>,
    ) -> GenogramResult<RelationshipId> {
        self.execute(EditCommand::AddRelationship {
            kind,
            label,
            id: None,
        })?
        .relationship()
    }

    /// Remove a single relationship
    pub fn remove_relationship(&mut self, id: RelationshipId) -> GenogramResult<()> {
        self.execute(EditCommand::RemoveRelationship { id, removed: None })?;
        Ok(())
    }

    /// Attach a fetus below its placed parents
    pub fn add_fetus(
        &mut self,
        father: Option<NodeId>,
        mother: Option<NodeId>,
        status: FetusStatus,
    ) -> GenogramResult<NodeId> {
        let mut parents = Vec::new();
        for parent in father.into_iter().chain(mother) {
            // Unknown persons and a missing pair are reported by the graph.
            if self.graph.person(parent).is_some() {
                parents.push(self.position_of(parent)?);
            }
        }
        let position = self
            .engine
            .fetus_position(&parents)
            .map(|p| self.engine.config().snap_position(p))
            .unwrap_or_default();
        self.execute(EditCommand::AddFetus {
            father,
            mother,
            status,
            position,
            id: None,
        })?
        .node()
    }

    /// Add a sibling of `of`, sharing its parent pair
    ///
    /// When `of` has no parents yet an unknown-status couple of placeholder
    /// parents is synthesized above both siblings. The whole edit undoes as one
    /// step.
    pub fn add_sibling(
        &mut self,
        of: NodeId,
        attributes: PersonAttributes,
    ) -> GenogramResult<NodeId> {
        let mut steps = Vec::new();
        match self.sibling_steps(of, attributes, &mut steps) {
            Ok(sibling) => {
                self.commit(EditCommand::Batch(steps), ChangeCause::Edit);
                Ok(sibling)
            }
            Err(error) => {
                self.rollback(steps);
                Err(error)
            }
        }
    }

    /// Recompute the whole layout from the lowest-id person
    pub fn relayout(&mut self) -> GenogramResult<()> {
        let subject = self.graph.persons().next().map(|p| p.id);
        self.relayout_for_subject(subject)
    }

    /// Recompute the whole layout around `subject`
    pub fn relayout_for_subject(&mut self, subject: Option<NodeId>) -> GenogramResult<()> {
        let after = self.engine.layout_for_subject(&self.graph, subject);
        if after == self.layout {
            return Ok(());
        }
        self.execute(EditCommand::Relayout {
            before: self.layout.clone(),
            after,
        })?;
        Ok(())
    }

    /// Reverse the most recent command; `false` when there is nothing to undo
    pub fn undo(&mut self) -> GenogramResult<bool> {
        let Some(mut command) = self.history.pop_undo() else {
            return Ok(false);
        };
        if let Err(error) = command.revert(&mut self.graph, &mut self.layout) {
            tracing::error!(command = command.name(), error = %error, "Undo failed");
            self.history.push_undo(command);
            return Err(error);
        }
        tracing::debug!(command = command.name(), "Command undone");
        self.history.push_redo(command);
        self.notify(ChangeCause::Undo);
        Ok(true)
    }

    /// Reapply the most recently undone command; `false` when there is nothing to redo
    pub fn redo(&mut self) -> GenogramResult<bool> {
        let Some(mut command) = self.history.pop_redo() else {
            return Ok(false);
        };
        if let Err(error) = command.apply(&mut self.graph, &mut self.layout) {
            tracing::error!(command = command.name(), error = %error, "Redo failed");
            self.history.push_redo(command);
            return Err(error);
        }
        tracing::debug!(command = command.name(), "Command redone");
        self.history.push_undo(command);
        self.notify(ChangeCause::Redo);
        Ok(true)
    }

    /// The current graph and layout in transport form; history is not included
    pub fn to_document(&self) -> GenogramResult<GenogramDocument> {
        codec::encode(&self.graph, &self.layout)
    }

    /// The current snapshot as JSON
    pub fn to_json(&self) -> GenogramResult<String> {
        codec::to_json(&self.graph, &self.layout)
    }

    /// Replace the document with a snapshot and reset history
    ///
    /// On a malformed snapshot the current state is left untouched.
    pub fn load_document(&mut self, document: &GenogramDocument) -> GenogramResult<()> {
        let (graph, layout) = codec::decode(document, self.engine.config())?;
        self.replace(graph, layout);
        Ok(())
    }

    /// Replace the document with a JSON snapshot and reset history
    pub fn load_json(&mut self, json: &str) -> GenogramResult<()> {
        let (graph, layout) = codec::from_json(json, self.engine.config())?;
        self.replace(graph, layout);
        Ok(())
    }

    fn replace(&mut self, graph: Genogram, layout: Layout) {
        self.graph = graph;
        self.layout = layout;
        self.history.clear();
        tracing::info!(
            persons = self.graph.person_count(),
            relationships = self.graph.relationship_count(),
            "Snapshot loaded into editor"
        );
        self.notify(ChangeCause::Load);
    }

    fn position_of(&self, id: NodeId) -> GenogramResult<Position2D> {
        self.layout
            .get(id)
            .ok_or_else(|| GenogramError::EntityNotFound(format!("coordinate of {id}")))
    }

    fn execute(&mut self, mut command: EditCommand) -> GenogramResult<Created> {
        command.apply(&mut self.graph, &mut self.layout)?;
        let created = Created::of(&command);
        self.commit(command, ChangeCause::Edit);
        Ok(created)
    }

    fn commit(&mut self, command: EditCommand, cause: ChangeCause) {
        tracing::debug!(command = command.name(), "Command executed");
        self.history.record(command);
        self.notify(cause);
    }

    fn step(
        &mut self,
        steps: &mut Vec<EditCommand>,
        mut command: EditCommand,
    ) -> GenogramResult<Created> {
        command.apply(&mut self.graph, &mut self.layout)?;
        let created = Created::of(&command);
        steps.push(command);
        Ok(created)
    }

    fn rollback(&mut self, steps: Vec<EditCommand>) {
        for mut step in steps.into_iter().rev() {
            if let Err(error) = step.revert(&mut self.graph, &mut self.layout) {
                tracing::error!(command = step.name(), error = %error, "Rollback step failed");
            }
        }
    }

    fn sibling_steps(
        &mut self,
        of: NodeId,
        attributes: PersonAttributes,
        steps: &mut Vec<EditCommand>,
    ) -> GenogramResult<NodeId> {
        if self.graph.person(of).is_none() {
            return Err(GenogramError::EntityNotFound(format!("person {of}")));
        }
        let anchor = self.position_of(of)?;
        let config = self.engine.config().clone();

        let existing_link = self.graph.parent_link_of(of).and_then(|rel| match rel.kind {
            RelationshipKind::ParentChild {
                father,
                mother,
                status,
                ..
            } => Some((father, mother, status)),
            _ => None,
        });

        let row_right = self
            .graph
            .siblings_of(of)
            .into_iter()
            .filter_map(|id| self.layout.get(id))
            .map(|p| p.x)
            .fold(anchor.x, f64::max);
        let position =
            config.snap_position(Position2D::new(row_right + config.sibling_gap, anchor.y));

        let sibling = self
            .step(
                steps,
                EditCommand::AddPerson {
                    id: None,
                    attributes,
                    position,
                },
            )?
            .node()?;

        let (father, mother, status) = match existing_link {
            Some(link) => link,
            None => {
                let center = (anchor.x + position.x) / 2.0;
                let y = anchor.y - config.generation_gap;
                let half = config.min_couple_gap / 2.0;
                let father = self
                    .step(
                        steps,
                        EditCommand::AddPerson {
                            id: None,
                            attributes: PersonAttributes::new(Gender::Male),
                            position: config.snap_position(Position2D::new(center - half, y)),
                        },
                    )?
                    .node()?;
                let mother = self
                    .step(
                        steps,
                        EditCommand::AddPerson {
                            id: None,
                            attributes: PersonAttributes::new(Gender::Female),
                            position: config.snap_position(Position2D::new(center + half, y)),
                        },
                    )?
                    .node()?;
                self.step(
                    steps,
                    EditCommand::AddRelationship {
                        kind: RelationshipKind::Partner {
                            a: father,
                            b: mother,
                            status: PartnerStatus::Unknown,
                        },
                        label: None,
                        id: None,
                    },
                )?;
                self.step(
                    steps,
                    EditCommand::AddRelationship {
                        kind: RelationshipKind::ParentChild {
                            father: Some(father),
                            mother: Some(mother),
                            child: of,
                            status: ParentChildStatus::Biological,
                        },
                        label: None,
                        id: None,
                    },
                )?;
                tracing::debug!(sibling_of = %of, "Synthesized parent pair for new sibling");
                (Some(father), Some(mother), ParentChildStatus::Biological)
            }
        };

        self.step(
            steps,
            EditCommand::AddRelationship {
                kind: RelationshipKind::ParentChild {
                    father,
                    mother,
                    child: sibling,
                    status,
                },
                label: None,
                id: None,
            },
        )?;
        Ok(sibling)
    }

    fn notify(&mut self, cause: ChangeCause) {
        self.revision += 1;
        match codec::encode(&self.graph, &self.layout) {
            Ok(snapshot) => {
                // No subscribers is fine.
                let _ = self.events.send(EditorEvent {
                    revision: self.revision,
                    cause,
                    snapshot: Arc::new(snapshot),
                });
            }
            Err(error) => {
                tracing::error!(
                    revision = self.revision,
                    error = %error,
                    "Snapshot encoding failed"
                );
            }
        }
    }
}

impl Default for GenogramEditor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::Gender;

    /// F, M married with children C1 (birth order 1) and C2 (birth order 2)
    fn family() -> (GenogramEditor, [NodeId; 4]) {
        let mut graph = Genogram::new();
        let f = graph.add_person(PersonAttributes::new(Gender::Male));
        let m = graph.add_person(PersonAttributes::new(Gender::Female));
        let c1 = graph.add_person(PersonAttributes::new(Gender::Female).with_birth_order(1));
        let c2 = graph.add_person(PersonAttributes::new(Gender::Male).with_birth_order(2));
        graph.add_partner(f, m, PartnerStatus::Married).unwrap();
        graph
            .add_parent_child(Some(f), Some(m), c1, ParentChildStatus::Biological)
            .unwrap();
        graph
            .add_parent_child(Some(f), Some(m), c2, ParentChildStatus::Biological)
            .unwrap();
        let editor = GenogramEditor::from_graph(graph, EditorConfig::default());
        (editor, [f, m, c1, c2])
    }

    #[test]
    fn test_delete_then_undo_restores_everything() {
        let (mut editor, [_, _, c1, _]) = family();
        let graph = editor.graph().clone();
        let layout = editor.layout().clone();

        editor.delete_person(c1).unwrap();
        assert!(editor.graph().person(c1).is_none());
        assert_eq!(editor.graph().relationship_count(), 2);

        assert!(editor.undo().unwrap());
        assert_eq!(editor.graph(), &graph);
        assert_eq!(editor.layout(), &layout);
        assert!(editor.can_redo());
    }

    #[test]
    fn test_undo_and_redo_on_empty_history_are_noops() {
        let mut editor = GenogramEditor::default();
        assert!(!editor.undo().unwrap());
        assert!(!editor.redo().unwrap());
        assert_eq!(editor.revision(), 0);
    }

    #[test]
    fn test_history_discards_oldest_entries() {
        let mut editor = GenogramEditor::new(EditorConfig {
            max_history_size: 3,
            ..EditorConfig::default()
        });
        for i in 0..5 {
            editor
                .add_person(
                    PersonAttributes::new(Gender::Unknown),
                    Position2D::new(15.0 + 90.0 * i as f64, 15.0),
                )
                .unwrap();
        }
        let mut undone = 0;
        while editor.undo().unwrap() {
            undone += 1;
        }
        assert_eq!(undone, 3);
        assert_eq!(editor.graph().person_count(), 2);
    }

    #[test]
    fn test_new_command_clears_redo() {
        let mut editor = GenogramEditor::default();
        editor
            .add_person(PersonAttributes::new(Gender::Male), Position2D::new(15.0, 15.0))
            .unwrap();
        editor.undo().unwrap();
        assert!(editor.can_redo());
        editor
            .add_person(PersonAttributes::new(Gender::Female), Position2D::new(105.0, 15.0))
            .unwrap();
        assert!(!editor.can_redo());
    }

    #[test]
    fn test_move_snaps_and_drags_fetus() {
        let (mut editor, [f, m, _, _]) = family();
        let fetus = editor
            .add_fetus(Some(f), Some(m), FetusStatus::Miscarriage)
            .unwrap();
        let before = editor.layout().get(fetus).unwrap();

        editor.move_person(m, Position2D::new(370.0, 20.0)).unwrap();
        assert_eq!(editor.layout().get(m), Some(Position2D::new(375.0, 15.0)));
        let after = editor.layout().get(fetus).unwrap();
        assert_ne!(after, before);
        let father_x = editor.layout().get(f).unwrap().x;
        assert_eq!(after.x, editor.engine.config().snap((father_x + 375.0) / 2.0));

        editor.undo().unwrap();
        assert_eq!(editor.layout().get(fetus), Some(before));
    }

    #[test]
    fn test_fetus_cannot_be_moved() {
        let (mut editor, [f, m, _, _]) = family();
        let fetus = editor.add_fetus(Some(f), Some(m), FetusStatus::Pregnancy).unwrap();
        let result = editor.move_person(fetus, Position2D::new(500.0, 500.0));
        assert!(matches!(result, Err(GenogramError::InvalidCommand(_))));
    }

    #[test]
    fn test_add_sibling_synthesizes_parents_as_one_step() {
        let mut editor = GenogramEditor::default();
        let only = editor
            .add_person(PersonAttributes::new(Gender::Female), Position2D::new(15.0, 165.0))
            .unwrap();
        let sibling = editor
            .add_sibling(only, PersonAttributes::new(Gender::Male))
            .unwrap();

        assert_eq!(editor.graph().siblings_of(only), vec![sibling]);
        assert_eq!(editor.graph().person_count(), 4);
        assert_eq!(editor.layout().get(sibling), Some(Position2D::new(105.0, 165.0)));

        editor.undo().unwrap();
        assert_eq!(editor.graph().person_count(), 1);
        assert_eq!(editor.graph().relationship_count(), 0);
        assert_eq!(editor.layout().len(), 1);
    }

    #[test]
    fn test_add_sibling_reuses_parents() {
        let (mut editor, [f, m, c1, c2]) = family();
        let sibling = editor
            .add_sibling(c1, PersonAttributes::new(Gender::Female))
            .unwrap();
        let children = editor.graph().children_of(&[f, m]);
        assert_eq!(children.len(), 3);
        assert!(children.contains(&sibling));
        let rightmost = editor.layout().get(c2).unwrap().x;
        assert!(editor.layout().get(sibling).unwrap().x > rightmost);
    }

    #[test]
    fn test_rejected_mutations_publish_nothing() {
        let (mut editor, [_, _, c1, c2]) = family();
        let revision = editor.revision();
        let result = editor.add_emotional(c1, c1, EmotionalStatus::Close);
        assert!(result.is_err());
        assert!(editor.graph().clone().add_sibling(c1, c2).is_err());
        assert_eq!(editor.revision(), revision);
    }

    #[test]
    fn test_notifications_follow_successful_mutations() {
        let mut editor = GenogramEditor::default();
        let mut events = editor.subscribe();

        let id = editor
            .add_person(PersonAttributes::new(Gender::Male), Position2D::new(15.0, 15.0))
            .unwrap();
        let event = events.try_recv().unwrap();
        assert_eq!(event.revision, 1);
        assert_eq!(event.cause, ChangeCause::Edit);
        assert_eq!(event.snapshot.nodes.len(), 1);
        assert_eq!(event.snapshot.nodes[0].id(), id.to_string());

        assert!(editor.delete_person(NodeId::new(42)).is_err());
        assert!(events.try_recv().is_err());

        editor.undo().unwrap();
        assert_eq!(events.try_recv().unwrap().cause, ChangeCause::Undo);
    }

    #[test]
    fn test_load_resets_history_and_bad_load_preserves_state() {
        let (mut editor, [_, _, c1, _]) = family();
        let json = editor.to_json().unwrap();
        editor.delete_person(c1).unwrap();
        assert!(editor.can_undo());

        editor.load_json(&json).unwrap();
        assert!(!editor.can_undo());
        assert!(!editor.can_redo());
        assert!(editor.graph().person(c1).is_some());

        let graph = editor.graph().clone();
        assert!(editor.load_json(r#"{"version": 9}"#).is_err());
        assert_eq!(editor.graph(), &graph);
    }

    #[test]
    fn test_relayout_is_undoable() {
        let (mut editor, [f, _, _, _]) = family();
        let original = editor.layout().clone();
        editor.move_person(f, Position2D::new(615.0, 315.0)).unwrap();
        editor.relayout().unwrap();
        assert_eq!(editor.layout(), &original);
        editor.undo().unwrap();
        assert_eq!(editor.layout().get(f), Some(Position2D::new(615.0, 315.0)));
    }

    #[test]
    fn test_fetus_needs_placed_parents() {
        let mut graph = Genogram::new();
        let f = graph.add_person(PersonAttributes::new(Gender::Male));
        let m = graph.add_person(PersonAttributes::new(Gender::Female));
        graph.add_partner(f, m, PartnerStatus::Married).unwrap();
        let mut layout = Layout::new();
        layout.set(f, Position2D::new(15.0, 15.0));
        let mut editor = GenogramEditor::with_layout(graph, layout, EditorConfig::default());

        let result = editor.add_fetus(Some(f), Some(m), FetusStatus::Pregnancy);
        assert!(matches!(result, Err(GenogramError::EntityNotFound(_))));
        assert_eq!(editor.graph().fetuses().count(), 0);
        assert!(!editor.can_undo());

        let missing = NodeId::new(99);
        let result = editor.add_fetus(Some(f), Some(missing), FetusStatus::Pregnancy);
        assert!(matches!(result, Err(GenogramError::InvalidRelationship(_))));
    }
}
