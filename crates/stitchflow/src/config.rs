//! Configuration types for the Stitchflow engine.
//!
//! All types implement [`serde::Deserialize`] with defaults for every field so
//! partial configuration files are accepted.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining layout and validation settings.
//! - [`LayoutConfig`] - Node geometry and connector anchor offsets used by the
//!   analytic position estimate, and the tick budget of the position oracle.
//! - [`ValidationConfig`] - Which settings fields block a confirmation.
//!
//! # Example
//!
//! ```
//! # use stitchflow::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.layout().max_position_ticks(), 10);
//! assert!(!config.validation().require_step_value());
//! ```

use serde::Deserialize;

use stitchflow_core::geometry::{Point, Size};

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Layout configuration section.
    #[serde(default)]
    layout: LayoutConfig,

    /// Validation configuration section.
    #[serde(default)]
    validation: ValidationConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] with the specified sections.
    pub fn new(layout: LayoutConfig, validation: ValidationConfig) -> Self {
        Self { layout, validation }
    }

    /// Returns the layout configuration.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Returns the validation configuration.
    pub fn validation(&self) -> &ValidationConfig {
        &self.validation
    }
}

/// Geometry used when the rendered position of a label is unknown.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Rendered width of a part node.
    node_width: f32,

    /// Rendered height of a part node.
    node_height: f32,

    /// Horizontal offset from the members' centroid to the connector anchor.
    anchor_offset_x: f32,

    /// Vertical offset from the members' centroid to the connector anchor.
    anchor_offset_y: f32,

    /// Rendering ticks the position oracle waits before falling back.
    max_position_ticks: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 140.0,
            node_height: 60.0,
            anchor_offset_x: 0.0,
            anchor_offset_y: -40.0,
            max_position_ticks: 10,
        }
    }
}

impl LayoutConfig {
    /// Returns a copy with a different tick budget.
    pub fn with_max_position_ticks(mut self, ticks: usize) -> Self {
        self.max_position_ticks = ticks;
        self
    }

    /// Size of a rendered part node.
    pub fn node_size(&self) -> Size {
        Size::new(self.node_width, self.node_height)
    }

    /// Offset added to the members' centroid by the analytic estimate.
    pub fn anchor_offset(&self) -> Point {
        Point::new(self.anchor_offset_x, self.anchor_offset_y)
    }

    pub fn max_position_ticks(&self) -> usize {
        self.max_position_ticks
    }
}

/// Rules checked before a group is confirmed.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ValidationConfig {
    /// Whether a step value must be entered (in the form or on the label).
    #[serde(default)]
    require_step_value: bool,
}

impl ValidationConfig {
    pub fn new(require_step_value: bool) -> Self {
        Self { require_step_value }
    }

    pub fn require_step_value(&self) -> bool {
        self.require_step_value
    }
}
