//! Label-bearing edge selection.
//!
//! Every group with at least one edge shows exactly one label. The chosen edge
//! is stable across passes:
//!
//! 1. a confirmed edge already showing the label keeps it;
//! 2. otherwise an edge already showing the label keeps it;
//! 3. otherwise the first edge in insertion order is picked.
//!
//! Edges outside any group are not touched.

use log::debug;

use stitchflow_core::identifier::Id;

use crate::{
    graph::Graph,
    partition::{Group, Partition},
};

/// The label edge chosen for one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelChoice {
    group_id: Id,
    edge_id: Id,
}

impl LabelChoice {
    pub fn group_id(&self) -> Id {
        self.group_id
    }

    pub fn edge_id(&self) -> Id {
        self.edge_id
    }
}

/// Sets `show_label` on the edges of every group in `partition`.
///
/// For frozen groups whose label edge carries no settings snapshot, the
/// owning connector's snapshot is copied onto it.
pub fn assign_labels(graph: &mut Graph, partition: &Partition) -> Vec<LabelChoice> {
    let mut choices = Vec::new();

    for group in partition.groups() {
        let Some(edge_id) = pick_label_edge(graph, group) else {
            continue;
        };

        for member in group.edge_ids() {
            if let Some(edge) = graph.edge_mut(*member) {
                edge.set_show_label(*member == edge_id);
            }
        }

        if let Some(connector_id) = group.frozen_by() {
            inherit_saved_settings(graph, connector_id, edge_id);
        }

        choices.push(LabelChoice {
            group_id: group.group_id(),
            edge_id,
        });
    }

    choices
}

fn pick_label_edge(graph: &Graph, group: &Group) -> Option<Id> {
    let edges: Vec<_> = group
        .edge_ids()
        .iter()
        .filter_map(|id| graph.edge(*id))
        .collect();

    edges
        .iter()
        .find(|e| e.is_confirmed() && e.show_label())
        .or_else(|| edges.iter().find(|e| e.show_label()))
        .or_else(|| edges.first())
        .map(|e| e.id())
}

fn inherit_saved_settings(graph: &mut Graph, connector_id: Id, edge_id: Id) {
    let Some(saved) = graph
        .connector(connector_id)
        .and_then(|c| c.saved_settings())
        .cloned()
    else {
        return;
    };

    let Some(edge) = graph.edge_mut(edge_id) else {
        return;
    };
    if edge.saved_settings().is_none() {
        debug!(connector:% = connector_id, edge:% = edge_id; "Label edge inherits connector settings");
        edge.set_saved_settings(Some(saved));
    }
}
