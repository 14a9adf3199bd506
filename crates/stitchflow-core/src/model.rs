//! Data model for routing diagrams.
//!
//! The canvas holds two kinds of nodes, modelled as the [`Node`] tagged union:
//!
//! - [`PartNode`]: a user-placed pattern piece (or a text-only part)
//! - [`Connector`]: a synthetic endpoint standing for a group of connected
//!   nodes, or for a single locked part
//!
//! [`Edge`]s connect any two nodes. Connector entities are owned by the
//! engine; callers only ever create parts and edges.

use serde::{Deserialize, Serialize};

use crate::{
    geometry::{Point, Size},
    identifier::Id,
    settings::SavedSettings,
};

/// Whether a part represents a physical piece or a free-text annotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PartKind {
    #[default]
    Pattern,
    /// A text-only part; confirming a group containing it requires its text.
    Text,
}

/// A part placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartNode {
    id: Id,
    position: Point,
    #[serde(default)]
    label: String,
    #[serde(default)]
    order: u32,
    #[serde(default)]
    kind: PartKind,
    #[serde(default)]
    confirmed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    saved_settings: Option<SavedSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default)]
    has_connected_edge: bool,
}

impl PartNode {
    /// Creates an unconfirmed pattern part. Order `0` means "assign on insert".
    pub fn new(id: Id, label: impl Into<String>, position: Point) -> Self {
        Self {
            id,
            position,
            label: label.into(),
            order: 0,
            kind: PartKind::Pattern,
            confirmed: false,
            saved_settings: None,
            text: None,
            has_connected_edge: false,
        }
    }

    pub fn with_kind(mut self, kind: PartKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    pub fn kind(&self) -> PartKind {
        self.kind
    }

    pub fn is_text_only(&self) -> bool {
        self.kind == PartKind::Text
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    pub fn saved_settings(&self) -> Option<&SavedSettings> {
        self.saved_settings.as_ref()
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Whether any live edge touches this part. Derived on every recomputation.
    pub fn has_connected_edge(&self) -> bool {
        self.has_connected_edge
    }

    /// Center of the part given the rendered node size.
    pub fn center(&self, size: Size) -> Point {
        self.position.add_point(size.half())
    }

    pub fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    pub fn set_order(&mut self, order: u32) {
        self.order = order;
    }

    pub fn set_confirmed(&mut self, confirmed: bool) {
        self.confirmed = confirmed;
    }

    pub fn set_saved_settings(&mut self, saved: Option<SavedSettings>) {
        self.saved_settings = saved;
    }

    pub fn set_text(&mut self, text: Option<String>) {
        self.text = text;
    }

    pub fn set_has_connected_edge(&mut self, connected: bool) {
        self.has_connected_edge = connected;
    }
}

/// A connection between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    id: Id,
    source: Id,
    target: Id,
    #[serde(default)]
    confirmed: bool,
    #[serde(default)]
    show_label: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pending_step: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    saved_settings: Option<SavedSettings>,
}

impl Edge {
    pub fn new(id: Id, source: Id, target: Id) -> Self {
        Self {
            id,
            source,
            target,
            confirmed: false,
            show_label: false,
            pending_step: None,
            saved_settings: None,
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn source(&self) -> Id {
        self.source
    }

    pub fn target(&self) -> Id {
        self.target
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    /// Whether this edge is the label-bearing edge of its group.
    pub fn show_label(&self) -> bool {
        self.show_label
    }

    /// Step value typed into the label before the group was confirmed.
    pub fn pending_step(&self) -> Option<&str> {
        self.pending_step.as_deref()
    }

    pub fn saved_settings(&self) -> Option<&SavedSettings> {
        self.saved_settings.as_ref()
    }

    /// Returns true if `node_id` is either endpoint.
    pub fn touches(&self, node_id: Id) -> bool {
        self.source == node_id || self.target == node_id
    }

    /// Both endpoints, source first.
    pub fn endpoints(&self) -> [Id; 2] {
        [self.source, self.target]
    }

    pub fn set_confirmed(&mut self, confirmed: bool) {
        self.confirmed = confirmed;
    }

    pub fn set_show_label(&mut self, show_label: bool) {
        self.show_label = show_label;
    }

    pub fn set_pending_step(&mut self, value: Option<String>) {
        self.pending_step = value;
    }

    pub fn set_saved_settings(&mut self, saved: Option<SavedSettings>) {
        self.saved_settings = saved;
    }
}

/// Synthetic endpoint representing a group, or a single locked part.
///
/// Group connectors (`is_group_box`) list every member node and edge of the
/// group. Single-node connectors list exactly one part and no edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connector {
    id: Id,
    group_id: Id,
    #[serde(default)]
    node_ids: Vec<Id>,
    #[serde(default)]
    edge_ids: Vec<Id>,
    #[serde(default)]
    confirmed: bool,
    #[serde(default)]
    hidden: bool,
    #[serde(default = "default_group_box")]
    is_group_box: bool,
    #[serde(default)]
    position: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    saved_settings: Option<SavedSettings>,
}

fn default_group_box() -> bool {
    true
}

impl Connector {
    /// Creates an unconfirmed, hidden connector for a multi-node group.
    pub fn new_group(
        id: Id,
        group_id: Id,
        node_ids: Vec<Id>,
        edge_ids: Vec<Id>,
        position: Point,
    ) -> Self {
        Self {
            id,
            group_id,
            node_ids,
            edge_ids,
            confirmed: false,
            hidden: true,
            is_group_box: true,
            position,
            saved_settings: None,
        }
    }

    /// Creates a confirmed, visible connector standing for one locked part.
    pub fn new_single(
        id: Id,
        part_id: Id,
        position: Point,
        saved_settings: Option<SavedSettings>,
    ) -> Self {
        Self {
            id,
            group_id: part_id,
            node_ids: vec![part_id],
            edge_ids: Vec::new(),
            confirmed: true,
            hidden: false,
            is_group_box: false,
            position,
            saved_settings,
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn group_id(&self) -> Id {
        self.group_id
    }

    pub fn node_ids(&self) -> &[Id] {
        &self.node_ids
    }

    pub fn edge_ids(&self) -> &[Id] {
        &self.edge_ids
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn is_group_box(&self) -> bool {
        self.is_group_box
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn saved_settings(&self) -> Option<&SavedSettings> {
        self.saved_settings.as_ref()
    }

    pub fn contains_node(&self, node_id: Id) -> bool {
        self.node_ids.contains(&node_id)
    }

    pub fn contains_edge(&self, edge_id: Id) -> bool {
        self.edge_ids.contains(&edge_id)
    }

    /// True when the connector references no members at all.
    pub fn is_empty(&self) -> bool {
        self.node_ids.is_empty() && self.edge_ids.is_empty()
    }

    /// Replaces the membership of the connector.
    pub fn set_members(&mut self, group_id: Id, node_ids: Vec<Id>, edge_ids: Vec<Id>) {
        self.group_id = group_id;
        self.node_ids = node_ids;
        self.edge_ids = edge_ids;
    }

    /// Keeps only members accepted by the predicates.
    pub fn retain_members(&mut self, keep_node: impl Fn(Id) -> bool, keep_edge: impl Fn(Id) -> bool) {
        self.node_ids.retain(|id| keep_node(*id));
        self.edge_ids.retain(|id| keep_edge(*id));
    }

    pub fn set_confirmed(&mut self, confirmed: bool) {
        self.confirmed = confirmed;
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    pub fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    pub fn set_saved_settings(&mut self, saved: Option<SavedSettings>) {
        self.saved_settings = saved;
    }
}

/// A canvas node: either a part or a synthetic connector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    Part(PartNode),
    Connector(Connector),
}

impl Node {
    pub fn id(&self) -> Id {
        match self {
            Self::Part(part) => part.id(),
            Self::Connector(connector) => connector.id(),
        }
    }

    pub fn as_part(&self) -> Option<&PartNode> {
        match self {
            Self::Part(part) => Some(part),
            Self::Connector(_) => None,
        }
    }

    pub fn as_part_mut(&mut self) -> Option<&mut PartNode> {
        match self {
            Self::Part(part) => Some(part),
            Self::Connector(_) => None,
        }
    }

    pub fn as_connector(&self) -> Option<&Connector> {
        match self {
            Self::Connector(connector) => Some(connector),
            Self::Part(_) => None,
        }
    }

    pub fn as_connector_mut(&mut self) -> Option<&mut Connector> {
        match self {
            Self::Connector(connector) => Some(connector),
            Self::Part(_) => None,
        }
    }

    pub fn is_connector(&self) -> bool {
        matches!(self, Self::Connector(_))
    }

    /// Center of the node: part centers use the rendered node size, connectors
    /// are already anchored at their label point.
    pub fn center(&self, part_size: Size) -> Point {
        match self {
            Self::Part(part) => part.center(part_size),
            Self::Connector(connector) => connector.position(),
        }
    }
}
