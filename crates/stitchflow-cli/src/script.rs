//! Gesture scripts.
//!
//! A script is a JSON list of user gestures replayed against an [`Engine`]:
//!
//! ```json
//! [
//!   { "op": "add_part", "id": "front", "label": "Front", "x": 0, "y": 0 },
//!   { "op": "add_part", "id": "back", "label": "Back", "x": 300, "y": 0 },
//!   { "op": "connect", "source": "front", "target": "back" },
//!   { "op": "confirm", "target": "front", "settings": { "step": "STEP 01", "process": "stitching" } }
//! ]
//! ```

use log::{debug, info};
use serde::Deserialize;

use stitchflow::{
    Engine, StitchflowError,
    confirm::ConfirmOutcome,
    geometry::Point,
    identifier::Id,
    model::{PartKind, PartNode},
    settings::Settings,
};

/// One user gesture on the canvas.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Gesture {
    /// Places a part; the id is generated when omitted.
    AddPart {
        #[serde(default)]
        id: Option<Id>,
        label: String,
        x: f32,
        y: f32,
        #[serde(default)]
        kind: PartKind,
        #[serde(default)]
        text: Option<String>,
    },
    /// Draws an edge between two nodes.
    Connect {
        source: Id,
        target: Id,
        #[serde(default)]
        id: Option<Id>,
    },
    Move { id: Id, x: f32, y: f32 },
    /// Types a step value into an edge label.
    SetPendingStep {
        edge: Id,
        #[serde(default)]
        value: Option<String>,
    },
    Confirm {
        target: Id,
        #[serde(default)]
        settings: Settings,
    },
    Edit { target: Id },
    Delete { id: Id },
}

impl Gesture {
    /// The `op` tag of this gesture.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddPart { .. } => "add_part",
            Self::Connect { .. } => "connect",
            Self::Move { .. } => "move",
            Self::SetPendingStep { .. } => "set_pending_step",
            Self::Confirm { .. } => "confirm",
            Self::Edit { .. } => "edit",
            Self::Delete { .. } => "delete",
        }
    }

    /// Replays the gesture against `engine`.
    pub fn apply(self, engine: &mut Engine) -> Result<(), StitchflowError> {
        match self {
            Self::AddPart {
                id,
                label,
                x,
                y,
                kind,
                text,
            } => {
                let id = id.unwrap_or_else(|| engine.next_part_id());
                let mut part = PartNode::new(id, label, Point::new(x, y)).with_kind(kind);
                if let Some(text) = text {
                    part = part.with_text(text);
                }
                engine.add_node(part)?;
            }
            Self::Connect { source, target, id } => {
                let edge = match id {
                    Some(id) => engine.connect_with_id(id, source, target)?,
                    None => engine.connect(source, target)?,
                };
                debug!(edge:% = edge; "Connected");
            }
            Self::Move { id, x, y } => engine.move_node(id, Point::new(x, y))?,
            Self::SetPendingStep { edge, value } => engine.set_pending_step(edge, value)?,
            Self::Confirm { target, settings } => match engine.confirm(target, settings)? {
                ConfirmOutcome::Confirmed { target, .. } => {
                    info!(target:% = target; "Group confirmed");
                }
                ConfirmOutcome::Skipped => {
                    info!(target:% = target; "Confirmation already in progress, skipped");
                }
            },
            Self::Edit { target } => {
                let outcome = engine.edit(target)?;
                info!(target:% = outcome.target; "Group reopened");
            }
            Self::Delete { id } => {
                engine.delete(id)?;
            }
        }
        Ok(())
    }
}

/// Parses a gesture script.
pub fn parse_script(src: &str) -> Result<Vec<Gesture>, serde_json::Error> {
    serde_json::from_str(src)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_gestures() {
        let src = r#"[
            {"op": "add_part", "label": "Front", "x": 0, "y": 0},
            {"op": "add_part", "id": "care", "label": "Care", "x": 1, "y": 2, "kind": "text", "text": "wash cold"},
            {"op": "connect", "source": "part-1", "target": "care", "id": "seam"},
            {"op": "move", "id": "care", "x": 5, "y": 5},
            {"op": "set_pending_step", "edge": "seam", "value": "4"},
            {"op": "confirm", "target": "seam", "settings": {"step": "STEP 01", "process": "stitching"}},
            {"op": "edit", "target": "seam"},
            {"op": "delete", "id": "seam"}
        ]"#;

        let gestures = parse_script(src).unwrap();

        let names: Vec<_> = gestures.iter().map(Gesture::name).collect();
        assert_eq!(
            names,
            [
                "add_part",
                "add_part",
                "connect",
                "move",
                "set_pending_step",
                "confirm",
                "edit",
                "delete"
            ]
        );
        let Gesture::AddPart { kind, text, .. } = &gestures[1] else {
            panic!("expected add_part");
        };
        assert_eq!(*kind, PartKind::Text);
        assert_eq!(text.as_deref(), Some("wash cold"));
    }

    #[test]
    fn test_unknown_op_is_rejected() {
        assert!(parse_script(r#"[{"op": "explode", "id": "a"}]"#).is_err());
    }

    #[test]
    fn test_replay_confirms_group() {
        let src = r#"[
            {"op": "add_part", "label": "Front", "x": 0, "y": 0},
            {"op": "add_part", "label": "Back", "x": 300, "y": 0},
            {"op": "connect", "source": "part-1", "target": "part-2"},
            {"op": "set_pending_step", "edge": "edge-1", "value": "7"},
            {"op": "confirm", "target": "edge-1", "settings": {"step": "STEP 01", "process": "stitching"}}
        ]"#;
        let mut engine = Engine::default();

        for gesture in parse_script(src).unwrap() {
            gesture.apply(&mut engine).unwrap();
        }

        let graph = engine.graph();
        let edge = graph.edge(Id::new("edge-1")).unwrap();
        assert!(edge.is_confirmed());
        let saved = edge.saved_settings().unwrap();
        assert_eq!(saved.settings().step_value(), Some("7"));
        assert!(graph.part(Id::new("part-1")).unwrap().is_confirmed());
    }

    #[test]
    fn test_replay_rejects_self_loop() {
        let mut engine = Engine::default();
        Gesture::AddPart {
            id: Some(Id::new("a")),
            label: "A".to_string(),
            x: 0.0,
            y: 0.0,
            kind: PartKind::Pattern,
            text: None,
        }
        .apply(&mut engine)
        .unwrap();

        let err = Gesture::Connect {
            source: Id::new("a"),
            target: Id::new("a"),
            id: None,
        }
        .apply(&mut engine)
        .unwrap_err();

        assert!(matches!(err, StitchflowError::Graph(_)));
    }
}
