//! Genogram domain errors

use crate::value_objects::NodeId;

/// Errors that can occur while building, editing, decoding or persisting a genogram
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenogramError {
    /// A mutation would violate a structural invariant; the graph is left unchanged
    #[error("Invalid relationship: {0}")]
    InvalidRelationship(String),

    /// A referenced person, fetus or relationship does not exist
    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    /// The command is well-formed but cannot be applied to this entity
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Transport data failed validation; nothing was constructed
    #[error("Malformed genogram: {0}")]
    MalformedGenogram(String),

    /// Root discovery hit a cyclic parent chain and stopped at `person`
    #[error("Layout unresolvable: cyclic parent chain at {person}")]
    LayoutUnresolvable { person: NodeId },

    /// The external store rejected a save or load
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),
}

/// Result type for genogram operations
pub type GenogramResult<T> = Result<T, GenogramError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = GenogramError::LayoutUnresolvable {
            person: NodeId::new(3),
        };
        assert_eq!(
            error.to_string(),
            "Layout unresolvable: cyclic parent chain at n3"
        );

        let error = GenogramError::InvalidRelationship("sibling link".to_string());
        assert!(error.to_string().contains("Invalid relationship"));
    }
}
