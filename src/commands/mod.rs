//! Reversible edit commands
//!
//! Each command mirrors one mutation of the genogram and carries the data needed
//! to reverse itself. Inverse data is captured the first time a command is
//! applied, so a command is built from intent and becomes undoable once it has
//! run. Ids assigned on the first application are kept, which makes redo restore
//! exactly the same nodes and relationships.

use crate::aggregate::{
    Fetus, Genogram, Person, PersonAttributes, Relationship, RelationshipKind, RemovedPerson,
};
use crate::errors::{GenogramError, GenogramResult};
use crate::layout::Layout;
use crate::value_objects::{FetusStatus, NodeId, Position2D, RelationshipId};
use std::collections::VecDeque;

/// A fetus repositioned because one of its parents moved
#[derive(Debug, Clone, PartialEq)]
pub struct FetusMove {
    pub fetus: NodeId,
    pub from: Position2D,
    pub to: Position2D,
}

/// The closed set of undoable edits
#[derive(Debug, Clone, PartialEq)]
pub enum EditCommand {
    /// Add a person at a position
    AddPerson {
        /// Assigned on first application
        id: Option<NodeId>,
        attributes: PersonAttributes,
        position: Position2D,
    },

    /// Replace a person's attributes
    UpdatePerson {
        id: NodeId,
        after: PersonAttributes,
        /// Captured on first application
        before: Option<PersonAttributes>,
    },

    /// Drag a person; attached fetuses follow
    MovePerson {
        id: NodeId,
        from: Position2D,
        to: Position2D,
        fetus_moves: Vec<FetusMove>,
    },

    /// Delete a person with cascade
    DeletePerson {
        id: NodeId,
        /// Everything the cascade removed, captured on first application
        removed: Option<RemovedPerson>,
        /// Coordinates of the person and of the removed fetuses
        positions: Vec<(NodeId, Position2D)>,
    },

    /// Add a relationship of any kind
    AddRelationship {
        kind: RelationshipKind,
        label: Option<String>,
        /// Assigned on first application
        id: Option<RelationshipId>,
    },

    /// Remove a single relationship
    RemoveRelationship {
        id: RelationshipId,
        /// Captured on first application
        removed: Option<Relationship>,
    },

    /// Attach a fetus to a parent pair
    AddFetus {
        father: Option<NodeId>,
        mother: Option<NodeId>,
        status: FetusStatus,
        position: Position2D,
        /// Assigned on first application
        id: Option<NodeId>,
    },

    /// Replace the whole layout
    Relayout { before: Layout, after: Layout },

    /// Several commands applied and reverted as one step
    Batch(Vec<EditCommand>),
}

impl EditCommand {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            EditCommand::AddPerson { .. } => "add_person",
            EditCommand::UpdatePerson { .. } => "update_person",
            EditCommand::MovePerson { .. } => "move_person",
            EditCommand::DeletePerson { .. } => "delete_person",
            EditCommand::AddRelationship { .. } => "add_relationship",
            EditCommand::RemoveRelationship { .. } => "remove_relationship",
            EditCommand::AddFetus { .. } => "add_fetus",
            EditCommand::Relayout { .. } => "relayout",
            EditCommand::Batch(_) => "batch",
        }
    }

    /// Node created by this command once applied
    pub fn created_node(&self) -> Option<NodeId> {
        match self {
            EditCommand::AddPerson { id, .. } | EditCommand::AddFetus { id, .. } => *id,
            _ => None,
        }
    }

    /// Relationship created by this command once applied
    pub fn created_relationship(&self) -> Option<RelationshipId> {
        match self {
            EditCommand::AddRelationship { id, .. } => *id,
            _ => None,
        }
    }

    /// Apply the command; on error the graph and layout are unchanged
    pub fn apply(&mut self, graph: &mut Genogram, layout: &mut Layout) -> GenogramResult<()> {
        match self {
            EditCommand::AddPerson {
                id,
                attributes,
                position,
            } => {
                let assigned = match *id {
                    Some(existing) => {
                        graph.insert_person(Person::new(existing, attributes.clone()))?;
                        existing
                    }
                    None => graph.add_person(attributes.clone()),
                };
                *id = Some(assigned);
                layout.set(assigned, *position);
            }
            EditCommand::UpdatePerson { id, after, before } => {
                let previous = graph.update_person(*id, after.clone())?;
                *before = Some(previous);
            }
            EditCommand::MovePerson {
                id,
                to,
                fetus_moves,
                ..
            } => {
                if graph.person(*id).is_none() {
                    return Err(GenogramError::EntityNotFound(format!("person {id}")));
                }
                layout.set(*id, *to);
                for step in fetus_moves.iter() {
                    layout.set(step.fetus, step.to);
                }
            }
            EditCommand::DeletePerson {
                id,
                removed,
                positions,
            } => {
                let cascade = graph.remove_person(*id)?;
                positions.clear();
                positions.extend(layout.remove(*id).map(|pos| (*id, pos)));
                for fetus in &cascade.fetuses {
                    positions.extend(layout.remove(fetus.id).map(|pos| (fetus.id, pos)));
                }
                *removed = Some(cascade);
            }
            EditCommand::AddRelationship { kind, label, id } => {
                let assigned = match *id {
                    Some(existing) => {
                        graph.insert_relationship(Relationship {
                            id: existing,
                            kind: kind.clone(),
                            label: label.clone(),
                        })?;
                        existing
                    }
                    None => graph.add_relationship(kind.clone(), label.clone())?,
                };
                *id = Some(assigned);
            }
            EditCommand::RemoveRelationship { id, removed } => {
                *removed = Some(graph.remove_relationship(*id)?);
            }
            EditCommand::AddFetus {
                father,
                mother,
                status,
                position,
                id,
            } => {
                let assigned = match *id {
                    Some(existing) => {
                        graph.insert_fetus(Fetus {
                            id: existing,
                            father: *father,
                            mother: *mother,
                            status: *status,
                        })?;
                        existing
                    }
                    None => graph.add_fetus(*father, *mother, *status)?,
                };
                *id = Some(assigned);
                layout.set(assigned, *position);
            }
            EditCommand::Relayout { after, .. } => {
                *layout = after.clone();
            }
            EditCommand::Batch(steps) => {
                for index in 0..steps.len() {
                    if let Err(error) = steps[index].apply(graph, layout) {
                        for done in steps[..index].iter_mut().rev() {
                            done.revert(graph, layout)?;
                        }
                        return Err(error);
                    }
                }
            }
        }
        Ok(())
    }

    /// Reverse a previously applied command
    pub fn revert(&mut self, graph: &mut Genogram, layout: &mut Layout) -> GenogramResult<()> {
        match self {
            EditCommand::AddPerson { id, .. } => {
                let id = applied(*id, "add_person")?;
                graph.remove_person(id)?;
                layout.remove(id);
            }
            EditCommand::UpdatePerson { id, before, .. } => {
                let previous = before
                    .clone()
                    .ok_or_else(|| not_applied("update_person"))?;
                graph.update_person(*id, previous)?;
            }
            EditCommand::MovePerson {
                id,
                from,
                fetus_moves,
                ..
            } => {
                layout.set(*id, *from);
                for step in fetus_moves.iter() {
                    layout.set(step.fetus, step.from);
                }
            }
            EditCommand::DeletePerson {
                removed, positions, ..
            } => {
                let cascade = removed
                    .clone()
                    .ok_or_else(|| not_applied("delete_person"))?;
                graph.insert_person(cascade.person)?;
                for fetus in cascade.fetuses {
                    graph.insert_fetus(fetus)?;
                }
                for relationship in cascade.relationships {
                    graph.insert_relationship(relationship)?;
                }
                for (node, position) in positions.iter() {
                    layout.set(*node, *position);
                }
            }
            EditCommand::AddRelationship { id, .. } => {
                graph.remove_relationship(applied(*id, "add_relationship")?)?;
            }
            EditCommand::RemoveRelationship { removed, .. } => {
                let relationship = removed
                    .clone()
                    .ok_or_else(|| not_applied("remove_relationship"))?;
                graph.insert_relationship(relationship)?;
            }
            EditCommand::AddFetus { id, .. } => {
                let id = applied(*id, "add_fetus")?;
                graph.remove_fetus(id)?;
                layout.remove(id);
            }
            EditCommand::Relayout { before, .. } => {
                *layout = before.clone();
            }
            EditCommand::Batch(steps) => {
                for step in steps.iter_mut().rev() {
                    step.revert(graph, layout)?;
                }
            }
        }
        Ok(())
    }
}

fn applied<T>(id: Option<T>, command: &str) -> GenogramResult<T> {
    id.ok_or_else(|| not_applied(command))
}

fn not_applied(command: &str) -> GenogramError {
    GenogramError::InvalidCommand(format!("{command} was never applied"))
}

/// Bounded undo and redo stacks
#[derive(Debug, Clone)]
pub struct CommandHistory {
    undo: VecDeque<EditCommand>,
    redo: Vec<EditCommand>,
    capacity: usize,
}

impl CommandHistory {
    /// Create a history holding at most `capacity` entries per stack
    pub fn new(capacity: usize) -> Self {
        Self {
            undo: VecDeque::with_capacity(capacity.min(128)),
            redo: Vec::new(),
            capacity,
        }
    }

    /// Record a freshly executed command; clears redo
    pub fn record(&mut self, command: EditCommand) {
        self.redo.clear();
        self.push_undo(command);
    }

    /// Take the most recent command to undo
    pub fn pop_undo(&mut self) -> Option<EditCommand> {
        self.undo.pop_back()
    }

    /// Take the most recently undone command
    pub fn pop_redo(&mut self) -> Option<EditCommand> {
        self.redo.pop()
    }

    /// Park an undone command for redo
    pub fn push_redo(&mut self, command: EditCommand) {
        if self.capacity > 0 {
            self.redo.push(command);
        }
    }

    /// Put a command back on the undo stack without touching redo
    pub fn push_undo(&mut self, command: EditCommand) {
        if self.capacity == 0 {
            return;
        }
        self.undo.push_back(command);
        while self.undo.len() > self.capacity {
            self.undo.pop_front();
        }
    }

    /// Whether undo has anything to do
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Whether redo has anything to do
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Entries on the undo stack
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    /// Entries on the redo stack
    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Configured capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop both stacks
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
