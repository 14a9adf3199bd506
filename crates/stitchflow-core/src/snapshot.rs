//! Persisted diagram shape exchanged with the session storage.

use serde::{Deserialize, Serialize};

use crate::model::{Edge, Node};

/// Canvas viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

/// Everything needed to restore a diagram: nodes, edges and the viewport.
///
/// Confirmed entities carry their settings snapshot inline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub viewport: Viewport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let snapshot: Snapshot = serde_json::from_str("{}").unwrap();

        assert!(snapshot.nodes.is_empty());
        assert!(snapshot.edges.is_empty());
        assert_eq!(snapshot.viewport, Viewport::default());
        assert_eq!(snapshot.viewport.zoom, 1.0);
    }

    #[test]
    fn test_viewport_serde() {
        let json = r#"{"viewport": {"x": 12.5, "y": -4.0, "zoom": 0.75}}"#;
        let snapshot: Snapshot = serde_json::from_str(json).unwrap();

        assert_eq!(
            snapshot.viewport,
            Viewport {
                x: 12.5,
                y: -4.0,
                zoom: 0.75
            }
        );
    }
}
