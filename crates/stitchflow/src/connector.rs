//! Connector synthesis.
//!
//! After partitioning, every group must be represented by exactly one
//! connector. The synthesizer reconciles the connectors already in the graph
//! with the groups of the current pass:
//!
//! - frozen groups keep the confirmed connector they were read from;
//! - live groups reuse an existing unconfirmed connector when one can be
//!   matched, otherwise a new hidden connector is created;
//! - confirmed parts without edges get a single-node connector;
//! - unconfirmed connectors left without a group are retired.
//!
//! Matching a live group against existing connectors tries, in order:
//!
//! 1. identity: the connector id derived from the group id, or the same
//!    stored `group_id`;
//! 2. the same edge set;
//! 3. containment: every member of the connector is a member of the group.
//!
//! Within each rule the first connector in graph order wins.

use std::collections::HashSet;

use log::{debug, info};

use stitchflow_core::{
    identifier::Id,
    model::{Connector, Node},
};

use crate::{
    config::LayoutConfig,
    graph::Graph,
    partition::{Group, Partition},
    position::analytic_anchor,
};

/// Connectors touched by one synthesis pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Synthesis {
    /// Connectors created in this pass.
    pub created: Vec<Id>,
    /// Connectors removed in this pass.
    pub retired: Vec<Id>,
    /// Unconfirmed connectors whose position should be refreshed.
    pub scheduled: Vec<Id>,
    /// Retired connectors that still had incident edges.
    pub orphaned_edges: Vec<Id>,
}

/// Reconciles the connectors of `graph` with the groups in `partition`.
pub fn synthesize(graph: &mut Graph, partition: &Partition, layout: &LayoutConfig) -> Synthesis {
    let mut synthesis = Synthesis::default();
    let mut claimed: HashSet<Id> = partition.frozen_groups().filter_map(Group::frozen_by).collect();

    for group in partition.live_groups() {
        let connector_id = match resolve_existing(graph, group, &claimed) {
            Some(id) => {
                refresh_connector(graph, id, group);
                id
            }
            None => {
                let id = create_connector(graph, group, layout);
                synthesis.created.push(id);
                id
            }
        };
        claimed.insert(connector_id);
        if graph.connector(connector_id).is_some_and(|c| !c.is_confirmed()) {
            synthesis.scheduled.push(connector_id);
        }
    }

    claim_single_node_connectors(graph, layout, &mut claimed, &mut synthesis);
    update_visibility(graph);
    retire_unclaimed(graph, &claimed, &mut synthesis);

    synthesis
}

fn resolve_existing(graph: &Graph, group: &Group, claimed: &HashSet<Id>) -> Option<Id> {
    let derived_id = Id::connector_for(group.group_id());
    let candidates: Vec<&Connector> = graph
        .connectors()
        .filter(|c| c.is_group_box() && !claimed.contains(&c.id()))
        .collect();

    let by_identity = || {
        candidates
            .iter()
            .find(|c| c.id() == derived_id || c.group_id() == group.group_id())
    };
    let by_edges = || {
        let group_edges: HashSet<Id> = group.edge_ids().iter().copied().collect();
        candidates.iter().find(|c| {
            !c.is_confirmed()
                && !c.edge_ids().is_empty()
                && c.edge_ids().len() == group_edges.len()
                && c.edge_ids().iter().all(|e| group_edges.contains(e))
        })
    };
    let by_containment = || {
        candidates.iter().find(|c| {
            !c.is_confirmed()
                && !c.node_ids().is_empty()
                && c.node_ids().iter().all(|n| group.node_ids().contains(n))
        })
    };

    by_identity()
        .or_else(by_edges)
        .or_else(by_containment)
        .map(|c| c.id())
}

fn refresh_connector(graph: &mut Graph, connector_id: Id, group: &Group) {
    let Some(connector) = graph.connector_mut(connector_id) else {
        return;
    };
    if connector.group_id() != group.group_id() {
        debug!(
            connector:% = connector_id,
            from:% = connector.group_id(),
            to:% = group.group_id();
            "Connector follows its group"
        );
    }
    connector.set_members(
        group.group_id(),
        group.node_ids().to_vec(),
        group.edge_ids().to_vec(),
    );
    let hidden = !connector.is_confirmed();
    connector.set_hidden(hidden);
}

fn create_connector(graph: &mut Graph, group: &Group, layout: &LayoutConfig) -> Id {
    let id = unused_id(graph, Id::connector_for(group.group_id()));
    let position = analytic_anchor(graph, group.node_ids(), layout);
    graph.put_node(Node::Connector(Connector::new_group(
        id,
        group.group_id(),
        group.node_ids().to_vec(),
        group.edge_ids().to_vec(),
        position,
    )));
    info!(connector:% = id, members = group.node_ids().len(); "Connector created");
    id
}

fn unused_id(graph: &Graph, base: Id) -> Id {
    if !graph.contains_id(base) {
        return base;
    }
    (1..)
        .map(|n| base.with_suffix(n))
        .find(|candidate| !graph.contains_id(*candidate))
        .unwrap_or(base)
}

/// Confirmed parts keep a single-node connector. It is created when the part
/// has no edges, and kept (hidden) while it has some.
fn claim_single_node_connectors(
    graph: &mut Graph,
    layout: &LayoutConfig,
    claimed: &mut HashSet<Id>,
    synthesis: &mut Synthesis,
) {
    let confirmed_parts: Vec<Id> = graph
        .parts()
        .filter(|p| p.is_confirmed())
        .map(|p| p.id())
        .collect();

    for part_id in confirmed_parts {
        let existing = graph
            .connectors()
            .find(|c| !c.is_group_box() && c.is_confirmed() && c.node_ids() == [part_id])
            .map(Connector::id);

        if let Some(id) = existing {
            claimed.insert(id);
            continue;
        }
        if graph.has_incident_edge(part_id) {
            continue;
        }

        let saved = graph.part(part_id).and_then(|p| p.saved_settings()).cloned();
        let id = unused_id(graph, Id::connector_for(part_id));
        let position = analytic_anchor(graph, &[part_id], layout);
        graph.put_node(Node::Connector(Connector::new_single(
            id, part_id, position, saved,
        )));
        info!(connector:% = id, part:% = part_id; "Single-node connector created");

        claimed.insert(id);
        synthesis.created.push(id);
    }
}

/// Hides confirmed connectors absorbed by another confirmed group, and
/// single-node connectors whose part has edges.
fn update_visibility(graph: &mut Graph) {
    let absorbed: HashSet<Id> = graph
        .connectors()
        .filter(|c| c.is_confirmed() && c.is_group_box())
        .flat_map(|c| c.node_ids().iter().copied())
        .collect();
    let parts_with_edges: HashSet<Id> = graph
        .edges()
        .flat_map(|e| e.endpoints())
        .collect();

    for connector in graph.connectors_mut().filter(|c| c.is_confirmed()) {
        let hidden = if connector.is_group_box() {
            absorbed.contains(&connector.id())
        } else {
            absorbed.contains(&connector.id())
                || connector.node_ids().iter().any(|id| parts_with_edges.contains(id))
        };
        connector.set_hidden(hidden);
    }
}

fn retire_unclaimed(graph: &mut Graph, claimed: &HashSet<Id>, synthesis: &mut Synthesis) {
    let retired: Vec<Id> = graph
        .connectors()
        .filter(|c| !c.is_confirmed() && !claimed.contains(&c.id()))
        .map(Connector::id)
        .collect();

    for id in retired {
        graph.take_node(id);
        let orphaned: Vec<Id> = graph.incident_edges(id).map(|e| e.id()).collect();
        if !orphaned.is_empty() {
            debug!(connector:% = id, edges = orphaned.len(); "Retired connector left edges behind");
        }
        synthesis.orphaned_edges.extend(orphaned);
        info!(connector:% = id; "Connector retired");
        synthesis.retired.push(id);
    }
}

#[cfg(test)]
mod tests {
    use stitchflow_core::{
        geometry::Point,
        identifier::GROUP_SEPARATOR,
        model::{Edge, PartNode},
        settings::{SavedSettings, Settings},
    };

    use super::*;
    use crate::partition::partition;

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

    fn ids(names: &[&str]) -> Vec<Id> {
        names.iter().map(|n| Id::new(n)).collect()
    }

    fn run(graph: &mut Graph) -> Synthesis {
        let partition = partition(graph);
        synthesize(graph, &partition, &LayoutConfig::default())
    }

    fn group_connector(id: &str, nodes: &[&str], edges: &[&str]) -> Connector {
        Connector::new_group(
            Id::new(id),
            Id::join(ids(nodes), GROUP_SEPARATOR),
            ids(nodes),
            ids(edges),
            Point::default(),
        )
    }

    #[test]
    fn test_new_group_gets_hidden_connector() {
        let mut graph = graph_with(&["a", "b"], &[("e1", "a", "b")]);

        let synthesis = run(&mut graph);

        let id = Id::new("connector::a+b");
        assert_eq!(synthesis.created, vec![id]);
        assert_eq!(synthesis.scheduled, vec![id]);
        let connector = graph.connector(id).unwrap();
        assert!(connector.is_hidden());
        assert!(!connector.is_confirmed());
        assert_eq!(connector.node_ids(), ids(&["a", "b"]).as_slice());
        assert_eq!(connector.edge_ids(), ids(&["e1"]).as_slice());
    }

    #[test]
    fn test_second_pass_is_stable() {
        let mut graph = graph_with(&["a", "b"], &[("e1", "a", "b")]);
        run(&mut graph);
        let before = graph.clone();

        let synthesis = run(&mut graph);

        assert!(synthesis.created.is_empty());
        assert!(synthesis.retired.is_empty());
        assert_eq!(graph, before);
    }

    #[test]
    fn test_growing_group_keeps_connector_by_containment() {
        let mut graph = graph_with(&["a", "b", "c"], &[("e1", "a", "b")]);
        graph.put_node(Node::Connector(group_connector("c1", &["a", "b"], &["e1"])));
        graph.put_edge(Edge::new(Id::new("e2"), Id::new("b"), Id::new("c")));

        let synthesis = run(&mut graph);

        assert!(synthesis.created.is_empty());
        let connector = graph.connector(Id::new("c1")).unwrap();
        assert_eq!(connector.group_id(), "a+b+c");
        assert_eq!(connector.node_ids(), ids(&["a", "b", "c"]).as_slice());
    }

    #[test]
    fn test_renamed_members_matched_by_edge_set() {
        let mut graph = graph_with(&["a", "b"], &[("e1", "a", "b")]);
        // Stored membership is stale but the edge set still matches
        graph.put_node(Node::Connector(group_connector("c1", &["x", "y"], &["e1"])));

        let synthesis = run(&mut graph);

        assert!(synthesis.created.is_empty());
        assert_eq!(graph.connector(Id::new("c1")).unwrap().group_id(), "a+b");
    }

    #[test]
    fn test_orphan_unconfirmed_connector_retired() {
        let mut graph = graph_with(&["a", "b"], &[]);
        graph.put_node(Node::Connector(group_connector("connector::a+b", &["a", "b"], &["e1"])));

        let synthesis = run(&mut graph);

        assert_eq!(synthesis.retired, ids(&["connector::a+b"]));
        assert!(!graph.contains_node(Id::new("connector::a+b")));
    }

    #[test]
    fn test_confirmed_connector_never_retired() {
        let mut graph = graph_with(&["a", "b"], &[("e1", "a", "b")]);
        let mut connector = group_connector("connector::a+b", &["a", "b"], &["e1"]);
        connector.set_confirmed(true);
        graph.put_node(Node::Connector(connector));

        let synthesis = run(&mut graph);

        assert!(synthesis.retired.is_empty());
        assert!(synthesis.scheduled.is_empty());
        assert!(!graph.connector(Id::new("connector::a+b")).unwrap().is_hidden());
    }

    #[test]
    fn test_id_collision_gets_suffix() {
        let mut graph = graph_with(&["a", "b"], &[("e1", "a", "b")]);
        // A part squats the derived connector id
        graph.put_node(Node::Part(PartNode::new(
            Id::new("connector::a+b"),
            "odd",
            Point::default(),
        )));

        let synthesis = run(&mut graph);

        assert_eq!(synthesis.created, ids(&["connector::a+b~1"]));
    }

    #[test]
    fn test_isolated_confirmed_part_gets_single_node_connector() {
        let mut graph = graph_with(&["a"], &[]);
        let saved = SavedSettings::new(Settings::new("STEP 01", "cutting"), ids(&["a"]));
        let part = graph.part_mut(Id::new("a")).unwrap();
        part.set_confirmed(true);
        part.set_saved_settings(Some(saved.clone()));

        let synthesis = run(&mut graph);

        let id = Id::new("connector::a");
        assert_eq!(synthesis.created, vec![id]);
        assert!(synthesis.scheduled.is_empty());
        let connector = graph.connector(id).unwrap();
        assert!(!connector.is_group_box());
        assert!(connector.is_confirmed());
        assert!(!connector.is_hidden());
        assert_eq!(connector.saved_settings(), Some(&saved));
    }

    #[test]
    fn test_single_node_connector_hidden_while_part_has_edges() {
        let mut graph = graph_with(&["a", "b"], &[]);
        graph.part_mut(Id::new("a")).unwrap().set_confirmed(true);
        run(&mut graph);

        graph.put_edge(Edge::new(Id::new("e1"), Id::new("a"), Id::new("b")));
        run(&mut graph);
        assert!(graph.connector(Id::new("connector::a")).unwrap().is_hidden());

        graph.take_edge(Id::new("e1"));
        run(&mut graph);
        assert!(!graph.connector(Id::new("connector::a")).unwrap().is_hidden());
    }

    #[test]
    fn test_absorbed_confirmed_connector_is_hidden() {
        let mut graph = graph_with(&["a", "b", "d"], &[("e1", "a", "b")]);
        let mut child = group_connector("c1", &["a", "b"], &["e1"]);
        child.set_confirmed(true);
        graph.put_node(Node::Connector(child));
        graph.put_edge(Edge::new(Id::new("e2"), Id::new("c1"), Id::new("d")));
        let mut parent = group_connector("c2", &["c1", "d"], &["e2"]);
        parent.set_confirmed(true);
        graph.put_node(Node::Connector(parent));

        run(&mut graph);

        assert!(graph.connector(Id::new("c1")).unwrap().is_hidden());
        assert!(!graph.connector(Id::new("c2")).unwrap().is_hidden());

        // Reopening the parent makes the child visible again
        graph.connector_mut(Id::new("c2")).unwrap().set_confirmed(false);
        run(&mut graph);

        assert!(!graph.connector(Id::new("c1")).unwrap().is_hidden());
        assert!(graph.connector(Id::new("c2")).unwrap().is_hidden());
    }
}
