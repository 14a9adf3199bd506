//! Error types for Stitchflow operations.
//!
//! This module provides the main error type [`StitchflowError`] which wraps
//! the error conditions of the engine's components:
//!
//! - [`GraphError`] - a structural mutation was rejected by the Graph Store
//! - [`ValidationError`] - a confirmation was blocked by a settings field
//! - [`TransitionError`] - a confirm/edit call does not fit the target's state
//!
//! Recomputation itself never fails; dangling references it meets are reported
//! as [`InconsistentGraphWarning`] values instead.

use std::{fmt, io};

use thiserror::Error;

use stitchflow_core::{identifier::Id, settings::SettingsField};

/// The main error type for Stitchflow operations.
#[derive(Debug, Error)]
pub enum StitchflowError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Transition error: {0}")]
    Transition(#[from] TransitionError),
}

/// A structural mutation the Graph Store refused to apply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("node `{0}` does not exist")]
    UnknownNode(Id),

    #[error("edge `{0}` does not exist")]
    UnknownEdge(Id),

    #[error("id `{0}` is already in use")]
    DuplicateId(Id),

    #[error("edge `{edge}` would connect `{node}` to itself")]
    SelfLoop { edge: Id, node: Id },
}

/// A settings field blocking confirmation.
///
/// The field is reported so the settings form can focus it. `part` names the
/// text-only part whose text is missing when `field` is
/// [`SettingsField::Text`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ValidationError {
    field: SettingsField,
    part: Option<Id>,
}

impl ValidationError {
    pub fn new(field: SettingsField) -> Self {
        Self { field, part: None }
    }

    pub fn missing_text(part: Id) -> Self {
        Self {
            field: SettingsField::Text,
            part: Some(part),
        }
    }

    pub fn field(&self) -> SettingsField {
        self.field
    }

    pub fn part(&self) -> Option<Id> {
        self.part
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.part {
            Some(part) => write!(f, "Validation error: `{}` is required for part `{part}`", self.field),
            None => write!(f, "Validation error: `{}` is required", self.field),
        }
    }
}

/// A confirm or edit request that does not fit the target's current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("`{0}` does not resolve to a part, edge or connector")]
    UnknownTarget(Id),

    #[error("`{0}` is already confirmed")]
    AlreadyConfirmed(Id),

    #[error("`{0}` is not confirmed")]
    NotConfirmed(Id),
}

/// A dangling reference met during recomputation.
///
/// The offending item is filtered out and recomputation continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InconsistentGraphWarning {
    /// An edge names an endpoint that is not in the graph.
    DanglingEdge { edge: Id, missing: Id },
    /// A connector lists a member that is not in the graph.
    DanglingMember { connector: Id, member: Id },
}

impl fmt::Display for InconsistentGraphWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingEdge { edge, missing } => {
                write!(f, "edge `{edge}` references missing node `{missing}`")
            }
            Self::DanglingMember { connector, member } => {
                write!(f, "connector `{connector}` references missing member `{member}`")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        let step = ValidationError::new(SettingsField::Step);
        assert_eq!(step.to_string(), "Validation error: `step` is required");
        assert_eq!(step.part(), None);

        let text = ValidationError::missing_text(Id::new("care-label"));
        assert_eq!(text.field(), SettingsField::Text);
        assert_eq!(
            text.to_string(),
            "Validation error: `text` is required for part `care-label`"
        );
    }

    #[test]
    fn test_graph_error_converts() {
        let err: StitchflowError = GraphError::UnknownNode(Id::new("ghost")).into();
        assert!(matches!(err, StitchflowError::Graph(GraphError::UnknownNode(_))));
        assert_eq!(err.to_string(), "Graph error: node `ghost` does not exist");
    }

    #[test]
    fn test_warning_display() {
        let warning = InconsistentGraphWarning::DanglingEdge {
            edge: Id::new("e9"),
            missing: Id::new("gone"),
        };
        assert_eq!(warning.to_string(), "edge `e9` references missing node `gone`");
    }
}
