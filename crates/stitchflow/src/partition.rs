//! Component partitioning over the live edge set.
//!
//! The partitioner splits the edges of a [`Graph`] into groups:
//!
//! - every confirmed connector is reported as its own frozen group, unchanged;
//! - the remaining edges are split into connected components where frozen
//!   nodes act as walls. A wall is recorded as a member of the component that
//!   touches it, but traversal never continues through it, so confirmed
//!   territory is never re-absorbed.
//!
//! Group identity is the sorted member ids joined with
//! [`GROUP_SEPARATOR`](stitchflow_core::identifier::GROUP_SEPARATOR), which
//! makes it stable across recomputation passes.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use log::trace;
use petgraph::{
    graph::{EdgeIndex, NodeIndex, UnGraph},
    visit::EdgeRef,
};

use stitchflow_core::{
    identifier::{GROUP_SEPARATOR, Id},
    model::Connector,
};

use crate::graph::Graph;

/// Node and edge ids owned by confirmed connectors.
#[derive(Debug, Clone, Default)]
pub struct FrozenSet {
    nodes: HashSet<Id>,
    edges: HashSet<Id>,
}

impl FrozenSet {
    /// Collects the members of every confirmed connector in `graph`.
    pub fn collect(graph: &Graph) -> Self {
        let mut frozen = Self::default();
        for connector in graph.connectors().filter(|c| c.is_confirmed()) {
            frozen.nodes.extend(connector.node_ids().iter().copied());
            frozen.edges.extend(connector.edge_ids().iter().copied());
        }
        frozen
    }

    pub fn contains_node(&self, id: Id) -> bool {
        self.nodes.contains(&id)
    }

    pub fn contains_edge(&self, id: Id) -> bool {
        self.edges.contains(&id)
    }
}

/// A connected set of edges and the nodes they touch.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    group_id: Id,
    node_ids: Vec<Id>,
    edge_ids: Vec<Id>,
    frozen_by: Option<Id>,
}

impl Group {
    fn live(node_ids: Vec<Id>, edge_ids: Vec<Id>) -> Self {
        Self {
            group_id: Id::join(node_ids.iter().copied(), GROUP_SEPARATOR),
            node_ids,
            edge_ids,
            frozen_by: None,
        }
    }

    fn frozen(connector: &Connector) -> Self {
        Self {
            group_id: connector.group_id(),
            node_ids: connector.node_ids().to_vec(),
            edge_ids: connector.edge_ids().to_vec(),
            frozen_by: Some(connector.id()),
        }
    }

    pub fn group_id(&self) -> Id {
        self.group_id
    }

    /// Member node ids; sorted for live groups, as stored for frozen ones.
    pub fn node_ids(&self) -> &[Id] {
        &self.node_ids
    }

    /// Member edge ids in graph insertion order.
    pub fn edge_ids(&self) -> &[Id] {
        &self.edge_ids
    }

    /// The confirmed connector this group was read from.
    pub fn frozen_by(&self) -> Option<Id> {
        self.frozen_by
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen_by.is_some()
    }
}

/// Result of a partitioning pass.
#[derive(Debug, Clone, Default)]
pub struct Partition {
    groups: Vec<Group>,
    frozen: FrozenSet,
}

impl Partition {
    /// All groups: frozen groups first, then live groups in discovery order.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn live_groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter().filter(|g| !g.is_frozen())
    }

    pub fn frozen_groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter().filter(|g| g.is_frozen())
    }

    pub fn frozen(&self) -> &FrozenSet {
        &self.frozen
    }

    /// The group that lists `edge_id`, if any.
    pub fn group_of_edge(&self, edge_id: Id) -> Option<&Group> {
        self.groups.iter().find(|g| g.edge_ids.contains(&edge_id))
    }
}

/// Partitions the edges of `graph` into groups.
///
/// Edges whose endpoints are missing are skipped; the recomputation pass
/// reports them separately. The input is never modified.
pub fn partition(graph: &Graph) -> Partition {
    let frozen = FrozenSet::collect(graph);

    let mut groups: Vec<Group> = graph
        .connectors()
        .filter(|c| c.is_confirmed())
        .map(Group::frozen)
        .collect();

    let mut live: UnGraph<Id, Id> = UnGraph::new_undirected();
    let mut indices: HashMap<Id, NodeIndex> = HashMap::new();

    for edge in graph.edges() {
        if frozen.contains_edge(edge.id()) {
            continue;
        }
        if !graph.contains_node(edge.source()) || !graph.contains_node(edge.target()) {
            continue;
        }
        let source = *indices
            .entry(edge.source())
            .or_insert_with(|| live.add_node(edge.source()));
        let target = *indices
            .entry(edge.target())
            .or_insert_with(|| live.add_node(edge.target()));
        live.add_edge(source, target, edge.id());
    }

    let mut assigned = vec![false; live.edge_count()];
    for start in live.edge_indices() {
        if assigned[start.index()] {
            continue;
        }
        if let Some(group) = collect_component(&live, start, &frozen, &mut assigned) {
            trace!(group_id:% = group.group_id, edges = group.edge_ids.len(); "Live group found");
            groups.push(group);
        }
    }

    Partition { groups, frozen }
}

/// Breadth-first walk from `start` that records walls but never expands them.
fn collect_component(
    live: &UnGraph<Id, Id>,
    start: EdgeIndex,
    frozen: &FrozenSet,
    assigned: &mut [bool],
) -> Option<Group> {
    let (a, b) = live.edge_endpoints(start)?;

    let mut members: BTreeSet<Id> = BTreeSet::new();
    let mut edges: Vec<EdgeIndex> = vec![start];
    let mut visited: HashSet<NodeIndex> = HashSet::new();
    let mut queue: VecDeque<NodeIndex> = VecDeque::new();

    assigned[start.index()] = true;
    for endpoint in [a, b] {
        let id = live[endpoint];
        members.insert(id);
        if !frozen.contains_node(id) && visited.insert(endpoint) {
            queue.push_back(endpoint);
        }
    }

    while let Some(current) = queue.pop_front() {
        for edge_ref in live.edges(current) {
            let idx = edge_ref.id();
            if assigned[idx.index()] {
                continue;
            }
            assigned[idx.index()] = true;
            edges.push(idx);

            let other = if edge_ref.source() == current {
                edge_ref.target()
            } else {
                edge_ref.source()
            };
            let other_id = live[other];
            members.insert(other_id);
            if !frozen.contains_node(other_id) && visited.insert(other) {
                queue.push_back(other);
            }
        }
    }

    edges.sort_by_key(|idx| idx.index());
    let edge_ids = edges.into_iter().map(|idx| live[idx]).collect();

    Some(Group::live(members.into_iter().collect(), edge_ids))
}
