//! The recomputation pass run after every mutation.
//!
//! [`recompute`] is pure: it reads a graph and returns a new one together with
//! a [`RecomputeReport`]. The pass runs, in order:
//!
//! 1. sanitize: edges with a missing endpoint and connector members that no
//!    longer exist are dropped and reported as warnings;
//! 2. partition into groups;
//! 3. label assignment;
//! 4. connector synthesis;
//! 5. the derived `has_connected_edge` flag of every part.
//!
//! Running it twice yields the same graph as running it once.

use std::collections::HashSet;

use log::{debug, trace, warn};

use stitchflow_core::identifier::Id;

use crate::{
    config::LayoutConfig,
    connector::synthesize,
    error::InconsistentGraphWarning,
    graph::Graph,
    label::{LabelChoice, assign_labels},
    partition::{Group, partition},
};

/// What one recomputation pass found and changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecomputeReport {
    /// Groups of the final round, frozen groups first.
    pub groups: Vec<Group>,
    /// Label edge chosen per group.
    pub labels: Vec<LabelChoice>,
    /// Connectors created by this pass.
    pub created: Vec<Id>,
    /// Connectors removed by this pass.
    pub retired: Vec<Id>,
    /// Unconfirmed connectors whose position should be refreshed.
    pub scheduled: Vec<Id>,
    /// Dangling references dropped while sanitizing.
    pub warnings: Vec<InconsistentGraphWarning>,
}

/// Output of [`recompute`].
#[derive(Debug, Clone)]
pub struct Recomputed {
    pub graph: Graph,
    pub report: RecomputeReport,
}

/// Derives groups, labels and connectors for `graph`.
pub fn recompute(graph: &Graph, layout: &LayoutConfig) -> Recomputed {
    let mut next = graph.clone();
    let mut report = RecomputeReport {
        warnings: sanitize(&mut next),
        ..RecomputeReport::default()
    };

    // Every round that retires a connector drops at least one edge
    let max_rounds = next.edges().count() + 1;
    for round in 1..=max_rounds {
        let partition = partition(&next);
        let labels = assign_labels(&mut next, &partition);
        let synthesis = synthesize(&mut next, &partition, layout);

        report.created.extend(synthesis.created);
        report.retired.extend(synthesis.retired);
        report.groups = partition.groups().to_vec();
        report.labels = labels;
        report.scheduled = synthesis.scheduled;

        if synthesis.orphaned_edges.is_empty() {
            break;
        }
        debug!(round = round, edges = synthesis.orphaned_edges.len(); "Dropping edges of retired connectors");
        drop_edges(&mut next, &synthesis.orphaned_edges);
    }

    report.created.retain(|id| next.contains_node(*id));
    report.scheduled.retain(|id| next.contains_node(*id));
    update_connected_flags(&mut next);

    trace!(
        groups = report.groups.len(),
        created = report.created.len(),
        retired = report.retired.len();
        "Recomputation finished"
    );

    Recomputed {
        graph: next,
        report,
    }
}

/// Removes dangling edges and connector members.
fn sanitize(graph: &mut Graph) -> Vec<InconsistentGraphWarning> {
    let mut warnings = Vec::new();

    let dangling: Vec<(Id, Id)> = graph
        .edges()
        .filter_map(|edge| {
            edge.endpoints()
                .into_iter()
                .find(|id| !graph.contains_node(*id))
                .map(|missing| (edge.id(), missing))
        })
        .collect();
    for (edge, missing) in dangling {
        warn!(edge:% = edge, missing:% = missing; "Dropping edge with missing endpoint");
        graph.take_edge(edge);
        warnings.push(InconsistentGraphWarning::DanglingEdge { edge, missing });
    }

    let node_ids: HashSet<Id> = graph.nodes().map(|n| n.id()).collect();
    let edge_ids: HashSet<Id> = graph.edges().map(|e| e.id()).collect();
    let mut emptied = Vec::new();

    for connector in graph.connectors_mut() {
        let connector_id = connector.id();
        let missing: Vec<Id> = connector
            .node_ids()
            .iter()
            .filter(|id| !node_ids.contains(id))
            .chain(connector.edge_ids().iter().filter(|id| !edge_ids.contains(id)))
            .copied()
            .collect();
        if missing.is_empty() {
            continue;
        }

        for member in missing {
            warn!(connector:% = connector_id, member:% = member; "Dropping missing connector member");
            warnings.push(InconsistentGraphWarning::DanglingMember {
                connector: connector_id,
                member,
            });
        }
        connector.retain_members(|id| node_ids.contains(&id), |id| edge_ids.contains(&id));
        if connector.node_ids().is_empty() {
            emptied.push(connector_id);
        }
    }

    for id in emptied {
        debug!(connector:% = id; "Removing connector without members");
        graph.take_node(id);
    }

    warnings
}

fn drop_edges(graph: &mut Graph, edge_ids: &[Id]) {
    let dropped: HashSet<Id> = edge_ids.iter().copied().collect();
    graph.retain_edges(|edge| !dropped.contains(&edge.id()));
    for connector in graph.connectors_mut() {
        connector.retain_members(|_| true, |id| !dropped.contains(&id));
    }
}

fn update_connected_flags(graph: &mut Graph) {
    let connected: HashSet<Id> = graph.edges().flat_map(|e| e.endpoints()).collect();
    for part in graph.parts_mut() {
        let id = part.id();
        part.set_has_connected_edge(connected.contains(&id));
    }
}

#[cfg(test)]
mod tests {
    use stitchflow_core::{
        geometry::Point,
        model::{Connector, Edge, Node, PartNode},
    };

    use super::*;

    fn graph_with(parts: &[&str], edges: &[(&str, &str, &str)]) -> Graph {
        let mut graph = Graph::new();
        for id in parts {
            graph.put_node(Node::Part(PartNode::new(Id::new(id), *id, Point::default())));
        }
        for (id, source, target) in edges {
            graph.put_edge(Edge::new(Id::new(id), Id::new(source), Id::new(target)));
        }
        graph
    }

    #[test]
    fn test_recompute_connected_pair() {
        let graph = graph_with(&["a", "b", "c"], &[("e1", "a", "b")]);

        let Recomputed { graph, report } = recompute(&graph, &LayoutConfig::default());

        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.created, vec![Id::new("connector::a+b")]);
        assert_eq!(report.scheduled, vec![Id::new("connector::a+b")]);
        assert!(report.warnings.is_empty());
        assert!(graph.edge(Id::new("e1")).unwrap().show_label());
        assert!(graph.part(Id::new("a")).unwrap().has_connected_edge());
        assert!(!graph.part(Id::new("c")).unwrap().has_connected_edge());
    }

    #[test]
    fn test_recompute_does_not_touch_input() {
        let graph = graph_with(&["a", "b"], &[("e1", "a", "b")]);
        let before = graph.clone();

        let _ = recompute(&graph, &LayoutConfig::default());

        assert_eq!(graph, before);
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let graph = graph_with(
            &["a", "b", "c", "d"],
            &[("e1", "a", "b"), ("e2", "c", "d"), ("e3", "b", "c")],
        );
        let layout = LayoutConfig::default();

        let once = recompute(&graph, &layout).graph;
        let twice = recompute(&once, &layout);

        assert_eq!(twice.graph, once);
        assert!(twice.report.created.is_empty());
        assert!(twice.report.retired.is_empty());
    }

    #[test]
    fn test_dangling_edge_warned_and_dropped() {
        let mut graph = graph_with(&["a", "b"], &[("e1", "a", "b")]);
        graph.put_edge(Edge::new(Id::new("e2"), Id::new("b"), Id::new("gone")));

        let Recomputed { graph, report } = recompute(&graph, &LayoutConfig::default());

        assert!(!graph.contains_edge(Id::new("e2")));
        assert_eq!(
            report.warnings,
            vec![InconsistentGraphWarning::DanglingEdge {
                edge: Id::new("e2"),
                missing: Id::new("gone"),
            }]
        );
    }

    #[test]
    fn test_dangling_member_warned_and_dropped() {
        let mut graph = graph_with(&["a", "b"], &[("e1", "a", "b")]);
        let mut connector = Connector::new_group(
            Id::new("c1"),
            Id::new("a+b+ghost"),
            vec![Id::new("a"), Id::new("b"), Id::new("ghost")],
            vec![Id::new("e1")],
            Point::default(),
        );
        connector.set_confirmed(true);
        graph.put_node(Node::Connector(connector));

        let Recomputed { graph, report } = recompute(&graph, &LayoutConfig::default());

        assert_eq!(
            report.warnings,
            vec![InconsistentGraphWarning::DanglingMember {
                connector: Id::new("c1"),
                member: Id::new("ghost"),
            }]
        );
        let connector = graph.connector(Id::new("c1")).unwrap();
        assert_eq!(connector.node_ids(), &[Id::new("a"), Id::new("b")]);
    }

    #[test]
    fn test_retired_connector_edges_are_dropped() {
        // An unconfirmed connector whose group is gone but which still has an
        // edge to `d`
        let mut graph = graph_with(&["a", "b", "d"], &[]);
        graph.put_node(Node::Connector(Connector::new_group(
            Id::new("stale"),
            Id::new("a+b"),
            vec![Id::new("a"), Id::new("b")],
            vec![Id::new("e-gone")],
            Point::default(),
        )));
        graph.put_edge(Edge::new(Id::new("e2"), Id::new("stale"), Id::new("d")));

        let Recomputed { graph, report } = recompute(&graph, &LayoutConfig::default());

        assert!(report.retired.contains(&Id::new("stale")));
        assert!(report.created.is_empty());
        assert!(!graph.contains_edge(Id::new("e2")));
        assert!(graph.connectors().next().is_none());
        assert!(!graph.part(Id::new("d")).unwrap().has_connected_edge());
    }
}
