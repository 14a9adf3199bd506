//! Structural mutations and their cascades.
//!
//! A [`Mutation`] is applied to a scratch copy of the graph inside a store
//! transaction. Cascades keep the graph referentially sound before the
//! recomputation pass runs:
//!
//! - removing an edge strips it from every connector; a confirmed connector
//!   left without edges is dissolved, otherwise members no longer touched by
//!   its edges are released;
//! - removing a part removes its edges and its single-node connector, then
//!   renumbers the remaining parts;
//! - removing a connector dissolves it.

use std::collections::HashSet;

use log::{debug, info};

use stitchflow_core::{
    geometry::Point,
    identifier::Id,
    model::{Connector, Edge, Node, PartNode},
};

use crate::{error::GraphError, graph::Graph};

/// A single structural change to the graph.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Places a part. An order of `0` is replaced by the next free number.
    AddNode(PartNode),
    AddEdge(Edge),
    /// Removes a part (with cascades) or dissolves a connector.
    RemoveNode(Id),
    RemoveEdge(Id),
    UpsertConnector(Connector),
    MoveNode { id: Id, position: Point },
    /// Step value typed into an edge label; an empty value clears it.
    SetPendingStep { edge: Id, value: Option<String> },
}

impl Mutation {
    /// Applies the mutation and its cascades to `graph`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] when the mutation refers to missing entities or
    /// would break an identity rule. `graph` may be partially modified in that
    /// case; callers work on a copy.
    pub fn apply_to(self, graph: &mut Graph) -> Result<(), GraphError> {
        match self {
            Self::AddNode(part) => add_node(graph, part),
            Self::AddEdge(edge) => add_edge(graph, edge),
            Self::RemoveNode(id) => remove_node(graph, id),
            Self::RemoveEdge(id) => remove_edge(graph, id),
            Self::UpsertConnector(connector) => upsert_connector(graph, connector),
            Self::MoveNode { id, position } => move_node(graph, id, position),
            Self::SetPendingStep { edge, value } => set_pending_step(graph, edge, value),
        }
    }
}

fn add_node(graph: &mut Graph, mut part: PartNode) -> Result<(), GraphError> {
    if graph.contains_id(part.id()) {
        return Err(GraphError::DuplicateId(part.id()));
    }
    if part.order() == 0 {
        let next = graph.parts().map(PartNode::order).max().unwrap_or(0) + 1;
        part.set_order(next);
    }
    debug!(part:% = part.id(), order = part.order(); "Adding part");
    graph.put_node(Node::Part(part));
    Ok(())
}

fn add_edge(graph: &mut Graph, edge: Edge) -> Result<(), GraphError> {
    if graph.contains_id(edge.id()) {
        return Err(GraphError::DuplicateId(edge.id()));
    }
    if edge.source() == edge.target() {
        return Err(GraphError::SelfLoop {
            edge: edge.id(),
            node: edge.source(),
        });
    }
    if let Some(missing) = edge
        .endpoints()
        .into_iter()
        .find(|id| !graph.contains_node(*id))
    {
        return Err(GraphError::UnknownNode(missing));
    }
    debug!(edge:% = edge.id(), source:% = edge.source(), target:% = edge.target(); "Adding edge");
    graph.put_edge(edge);
    Ok(())
}

/// Removes an edge and updates the connectors that listed it.
pub(crate) fn remove_edge(graph: &mut Graph, edge_id: Id) -> Result<(), GraphError> {
    graph
        .take_edge(edge_id)
        .ok_or(GraphError::UnknownEdge(edge_id))?;
    debug!(edge:% = edge_id; "Removing edge");

    let owners: Vec<Id> = graph
        .connectors()
        .filter(|c| c.contains_edge(edge_id))
        .map(Connector::id)
        .collect();

    for owner in owners {
        let Some(connector) = graph.connector_mut(owner) else {
            continue;
        };
        connector.retain_members(|_| true, |id| id != edge_id);
        if !connector.is_confirmed() {
            continue;
        }
        if connector.edge_ids().is_empty() {
            dissolve_connector(graph, owner)?;
        } else {
            shrink_to_touched(graph, owner);
        }
    }
    Ok(())
}

/// Drops members of a confirmed connector no longer touched by its edges.
fn shrink_to_touched(graph: &mut Graph, connector_id: Id) {
    let Some(connector) = graph.connector(connector_id) else {
        return;
    };
    let touched: HashSet<Id> = connector
        .edge_ids()
        .iter()
        .filter_map(|id| graph.edge(*id))
        .flat_map(Edge::endpoints)
        .collect();
    let released: Vec<Id> = connector
        .node_ids()
        .iter()
        .copied()
        .filter(|id| !touched.contains(id))
        .collect();
    if released.is_empty() {
        return;
    }

    if let Some(connector) = graph.connector_mut(connector_id) {
        connector.retain_members(|id| touched.contains(&id), |_| true);
    }
    for part_id in released {
        debug!(connector:% = connector_id, part:% = part_id; "Member released");
        release_part(graph, part_id, Some(connector_id));
    }
}

/// Reverts a part to unconfirmed unless another confirmed connector holds it.
///
/// A part that stays confirmed gets the snapshot of the connector holding it
/// back, replacing the one of the group it is released from.
fn release_part(graph: &mut Graph, part_id: Id, except: Option<Id>) {
    let holder_saved = graph
        .confirmed_holder(part_id, except)
        .map(|holder| holder.saved_settings().cloned());
    let Some(part) = graph.part_mut(part_id) else {
        return;
    };
    match holder_saved {
        Some(Some(saved)) => part.set_saved_settings(Some(saved)),
        Some(None) => {}
        None => {
            part.set_confirmed(false);
            part.set_saved_settings(None);
        }
    }
}

/// Removes a connector, releases its members and deletes its incident edges.
pub(crate) fn dissolve_connector(graph: &mut Graph, connector_id: Id) -> Result<(), GraphError> {
    let Some(Node::Connector(connector)) = graph.take_node(connector_id) else {
        return Err(GraphError::UnknownNode(connector_id));
    };
    info!(connector:% = connector_id, confirmed = connector.is_confirmed(); "Dissolving connector");

    for part_id in connector.node_ids() {
        release_part(graph, *part_id, Some(connector_id));
    }
    for edge_id in connector.edge_ids() {
        if let Some(edge) = graph.edge_mut(*edge_id) {
            edge.set_confirmed(false);
            edge.set_saved_settings(None);
        }
    }

    let incident: Vec<Id> = graph.incident_edges(connector_id).map(Edge::id).collect();
    for edge_id in incident {
        remove_edge(graph, edge_id)?;
    }
    Ok(())
}

fn remove_node(graph: &mut Graph, id: Id) -> Result<(), GraphError> {
    match graph.node(id) {
        None => Err(GraphError::UnknownNode(id)),
        Some(Node::Connector(_)) => dissolve_connector(graph, id),
        Some(Node::Part(_)) => remove_part(graph, id),
    }
}

fn remove_part(graph: &mut Graph, part_id: Id) -> Result<(), GraphError> {
    let incident: Vec<Id> = graph.incident_edges(part_id).map(Edge::id).collect();
    for edge_id in incident {
        // An earlier cascade may already have removed it
        if graph.contains_edge(edge_id) {
            remove_edge(graph, edge_id)?;
        }
    }

    graph.take_node(part_id);
    info!(part:% = part_id; "Part removed");

    let singles: Vec<Id> = graph
        .connectors()
        .filter(|c| !c.is_group_box() && c.contains_node(part_id))
        .map(Connector::id)
        .collect();
    for connector_id in singles {
        dissolve_connector(graph, connector_id)?;
    }

    for connector in graph.connectors_mut() {
        connector.retain_members(|id| id != part_id, |_| true);
    }

    renumber_parts(graph);
    Ok(())
}

/// Renumbers parts `1..=n` keeping their relative order.
fn renumber_parts(graph: &mut Graph) {
    let mut ordered: Vec<(u32, usize, Id)> = graph
        .parts()
        .enumerate()
        .map(|(slot, part)| (part.order(), slot, part.id()))
        .collect();
    ordered.sort();

    for (order, (_, _, id)) in (1..).zip(ordered) {
        if let Some(part) = graph.part_mut(id) {
            part.set_order(order);
        }
    }
}

fn upsert_connector(graph: &mut Graph, connector: Connector) -> Result<(), GraphError> {
    let id = connector.id();
    let clashes = graph.contains_edge(id) || graph.part(id).is_some();
    if clashes {
        return Err(GraphError::DuplicateId(id));
    }
    graph.put_node(Node::Connector(connector));
    Ok(())
}

fn move_node(graph: &mut Graph, id: Id, position: Point) -> Result<(), GraphError> {
    if let Some(part) = graph.part_mut(id) {
        part.set_position(position);
        return Ok(());
    }
    let connector = graph.connector_mut(id).ok_or(GraphError::UnknownNode(id))?;
    connector.set_position(position);
    Ok(())
}

fn set_pending_step(graph: &mut Graph, edge_id: Id, value: Option<String>) -> Result<(), GraphError> {
    let edge = graph.edge_mut(edge_id).ok_or(GraphError::UnknownEdge(edge_id))?;
    edge.set_pending_step(value.filter(|v| !v.trim().is_empty()));
    Ok(())
}
