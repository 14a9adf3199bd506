//! The canonical diagram snapshot.
//!
//! [`Graph`] holds parts, connectors and edges in insertion order. Readers
//! (partitioner, label assignment, synthesizer) only ever see `&Graph`; the
//! mutating accessors are crate-private and used by the Graph Store inside a
//! transaction.

use indexmap::IndexMap;

use stitchflow_core::{
    identifier::Id,
    model::{Connector, Edge, Node, PartNode},
    snapshot::{Snapshot, Viewport},
};

use crate::error::GraphError;

/// Nodes, edges and connectors as one coherent snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    nodes: IndexMap<Id, Node>,
    edges: IndexMap<Id, Edge>,
    viewport: Viewport,
}

impl Graph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from a persisted snapshot.
    ///
    /// Edges naming missing nodes are accepted here and filtered by the next
    /// recomputation.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateId`] if two entities share an id.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, GraphError> {
        let mut graph = Self {
            viewport: snapshot.viewport,
            ..Self::default()
        };
        for node in snapshot.nodes {
            let id = node.id();
            if graph.contains_id(id) {
                return Err(GraphError::DuplicateId(id));
            }
            graph.nodes.insert(id, node);
        }
        for edge in snapshot.edges {
            let id = edge.id();
            if graph.contains_id(id) {
                return Err(GraphError::DuplicateId(id));
            }
            graph.edges.insert(id, edge);
        }
        Ok(graph)
    }

    /// Returns the persisted form of this graph.
    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            nodes: self.nodes.values().cloned().collect(),
            edges: self.edges.values().cloned().collect(),
            viewport: self.viewport,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn node(&self, id: Id) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn part(&self, id: Id) -> Option<&PartNode> {
        self.node(id).and_then(Node::as_part)
    }

    pub fn connector(&self, id: Id) -> Option<&Connector> {
        self.node(id).and_then(Node::as_connector)
    }

    pub fn edge(&self, id: Id) -> Option<&Edge> {
        self.edges.get(&id)
    }

    /// Returns all nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn parts(&self) -> impl Iterator<Item = &PartNode> {
        self.nodes.values().filter_map(Node::as_part)
    }

    pub fn connectors(&self) -> impl Iterator<Item = &Connector> {
        self.nodes.values().filter_map(Node::as_connector)
    }

    /// Returns all edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn contains_node(&self, id: Id) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn contains_edge(&self, id: Id) -> bool {
        self.edges.contains_key(&id)
    }

    /// True if `id` names a node or an edge.
    pub fn contains_id(&self, id: Id) -> bool {
        self.contains_node(id) || self.contains_edge(id)
    }

    /// Position of the edge in insertion order.
    pub fn edge_order(&self, id: Id) -> Option<usize> {
        self.edges.get_index_of(&id)
    }

    /// Edges having `node_id` as either endpoint.
    pub fn incident_edges(&self, node_id: Id) -> impl Iterator<Item = &Edge> {
        self.edges.values().filter(move |edge| edge.touches(node_id))
    }

    pub fn has_incident_edge(&self, node_id: Id) -> bool {
        self.incident_edges(node_id).next().is_some()
    }

    /// The group connector listing `edge_id` as a member, if any.
    pub fn connector_with_edge(&self, edge_id: Id) -> Option<&Connector> {
        self.connectors().find(|c| c.contains_edge(edge_id))
    }

    /// The first confirmed connector other than `except` listing `node_id`.
    pub fn confirmed_holder(&self, node_id: Id, except: Option<Id>) -> Option<&Connector> {
        self.connectors()
            .find(|c| c.is_confirmed() && Some(c.id()) != except && c.contains_node(node_id))
    }

    pub(crate) fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub(crate) fn part_mut(&mut self, id: Id) -> Option<&mut PartNode> {
        self.nodes.get_mut(&id).and_then(Node::as_part_mut)
    }

    pub(crate) fn connector_mut(&mut self, id: Id) -> Option<&mut Connector> {
        self.nodes.get_mut(&id).and_then(Node::as_connector_mut)
    }

    pub(crate) fn edge_mut(&mut self, id: Id) -> Option<&mut Edge> {
        self.edges.get_mut(&id)
    }

    pub(crate) fn parts_mut(&mut self) -> impl Iterator<Item = &mut PartNode> {
        self.nodes.values_mut().filter_map(Node::as_part_mut)
    }

    pub(crate) fn connectors_mut(&mut self) -> impl Iterator<Item = &mut Connector> {
        self.nodes.values_mut().filter_map(Node::as_connector_mut)
    }

    pub(crate) fn edges_mut(&mut self) -> impl Iterator<Item = &mut Edge> {
        self.edges.values_mut()
    }

    /// Inserts a node, or replaces it in place keeping its insertion slot.
    pub(crate) fn put_node(&mut self, node: Node) {
        self.nodes.insert(node.id(), node);
    }

    pub(crate) fn put_edge(&mut self, edge: Edge) {
        self.edges.insert(edge.id(), edge);
    }

    /// Removes a node keeping the order of the remaining nodes.
    pub(crate) fn take_node(&mut self, id: Id) -> Option<Node> {
        self.nodes.shift_remove(&id)
    }

    /// Removes an edge keeping the order of the remaining edges.
    pub(crate) fn take_edge(&mut self, id: Id) -> Option<Edge> {
        self.edges.shift_remove(&id)
    }

    /// Keeps only the edges accepted by `keep`.
    pub(crate) fn retain_edges(&mut self, mut keep: impl FnMut(&Edge) -> bool) {
        self.edges.retain(|_, edge| keep(edge));
    }
}
