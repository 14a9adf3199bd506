//! The Graph Store: the single owner of the committed graph.
//!
//! Every change runs as one transaction: the committed graph is cloned, the
//! change is applied to the clone, [`recompute`] derives groups and
//! connectors, and only then is the result committed. A failing change leaves
//! the store untouched.
//!
//! Recomputation schedules a position refresh for every unconfirmed
//! connector. Each schedule bumps the connector's epoch, so a
//! [`PositionTicket`] handed out earlier becomes stale and its result is
//! dropped by [`GraphStore::apply_position`].

use std::collections::HashMap;

use log::{debug, trace};

use stitchflow_core::{geometry::Point, identifier::Id};

use crate::{
    config::LayoutConfig,
    error::GraphError,
    graph::Graph,
    mutation::Mutation,
    recompute::{RecomputeReport, Recomputed, recompute},
};

/// A pending request to reposition one connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PositionTicket {
    connector_id: Id,
    epoch: u64,
}

impl PositionTicket {
    pub fn connector_id(&self) -> Id {
        self.connector_id
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// Owns the committed graph and the outstanding position tickets.
#[derive(Debug, Clone)]
pub struct GraphStore {
    graph: Graph,
    layout: LayoutConfig,
    epochs: HashMap<Id, u64>,
    next_epoch: u64,
    pending: Vec<PositionTicket>,
}

impl GraphStore {
    /// Creates a store holding an empty graph.
    pub fn new(layout: LayoutConfig) -> Self {
        Self {
            graph: Graph::new(),
            layout,
            epochs: HashMap::new(),
            next_epoch: 1,
            pending: Vec::new(),
        }
    }

    /// Creates a store from an existing graph, running one recomputation.
    pub fn from_graph(graph: Graph, layout: LayoutConfig) -> (Self, RecomputeReport) {
        let mut store = Self::new(layout);
        let recomputed = recompute(&graph, &store.layout);
        let report = store.commit(recomputed);
        (store, report)
    }

    /// The committed graph.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Applies one mutation as a transaction.
    ///
    /// # Errors
    ///
    /// Returns the [`GraphError`] of the mutation; the store is unchanged.
    pub fn apply(&mut self, mutation: Mutation) -> Result<RecomputeReport, GraphError> {
        trace!(mutation:?; "Applying mutation");
        self.transact(|graph| mutation.apply_to(graph))
    }

    /// Runs `change` against a copy of the graph and commits the
    /// recomputed result when it succeeds.
    pub(crate) fn transact<E>(
        &mut self,
        change: impl FnOnce(&mut Graph) -> Result<(), E>,
    ) -> Result<RecomputeReport, E> {
        let mut scratch = self.graph.clone();
        change(&mut scratch)?;
        let recomputed = recompute(&scratch, &self.layout);
        Ok(self.commit(recomputed))
    }

    fn commit(&mut self, recomputed: Recomputed) -> RecomputeReport {
        let Recomputed { graph, report } = recomputed;
        self.graph = graph;

        for retired in &report.retired {
            self.epochs.remove(retired);
        }
        self.pending
            .retain(|ticket| self.graph.contains_node(ticket.connector_id));

        for connector_id in &report.scheduled {
            let epoch = self.next_epoch;
            self.next_epoch += 1;
            self.epochs.insert(*connector_id, epoch);
            self.pending.retain(|t| t.connector_id != *connector_id);
            self.pending.push(PositionTicket {
                connector_id: *connector_id,
                epoch,
            });
        }

        report
    }

    /// Tickets scheduled since the last call to
    /// [`take_position_requests`](Self::take_position_requests).
    pub fn pending_positions(&self) -> &[PositionTicket] {
        &self.pending
    }

    /// Hands out the pending tickets.
    pub fn take_position_requests(&mut self) -> Vec<PositionTicket> {
        std::mem::take(&mut self.pending)
    }

    /// Writes a resolved connector position.
    ///
    /// The result is discarded, and `false` returned, when the connector no
    /// longer exists, has been confirmed, or was rescheduled after the ticket
    /// was issued.
    pub fn apply_position(&mut self, ticket: PositionTicket, position: Point) -> bool {
        let current = self.epochs.get(&ticket.connector_id).copied();
        if current != Some(ticket.epoch) {
            debug!(connector:% = ticket.connector_id, epoch = ticket.epoch; "Discarding stale position");
            return false;
        }
        let Some(connector) = self.graph.connector_mut(ticket.connector_id) else {
            debug!(connector:% = ticket.connector_id; "Discarding position of removed connector");
            return false;
        };
        if connector.is_confirmed() {
            debug!(connector:% = ticket.connector_id; "Discarding position of confirmed connector");
            return false;
        }

        connector.set_position(position);
        self.epochs.remove(&ticket.connector_id);
        true
    }
}
