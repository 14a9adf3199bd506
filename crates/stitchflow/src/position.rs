//! Connector anchor positions.
//!
//! A connector sits at the centre of its group's rendered label. The label
//! extent is only known once the rendering surface has laid it out, so the
//! [`PositionOracle`] polls a [`LayoutProvider`] for a bounded number of
//! rendering ticks and falls back to [`analytic_anchor`] when the labels never
//! report a usable extent.

use std::future::Future;

use log::{debug, trace};

use stitchflow_core::{
    geometry::{Bounds, Point},
    identifier::Id,
};

use crate::{config::LayoutConfig, graph::Graph};

/// The rendering surface as seen by the oracle.
pub trait LayoutProvider {
    /// Rendered bounds of the label attached to `edge_id`, if it is mounted.
    fn label_bounds(&self, edge_id: Id) -> Option<Bounds>;

    /// Resolves after the surface has rendered one more frame.
    fn next_tick(&self) -> impl Future<Output = ()>;
}

/// A provider with no rendering surface. Every request falls back.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessLayout;

impl LayoutProvider for HeadlessLayout {
    fn label_bounds(&self, _edge_id: Id) -> Option<Bounds> {
        None
    }

    fn next_tick(&self) -> impl Future<Output = ()> {
        futures::future::ready(())
    }
}

/// What the oracle needs to place one connector.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionRequest {
    connector_id: Id,
    label_edges: Vec<Id>,
    fallback: Point,
}

impl PositionRequest {
    pub fn new(connector_id: Id, label_edges: Vec<Id>, fallback: Point) -> Self {
        Self {
            connector_id,
            label_edges,
            fallback,
        }
    }

    /// Builds the request for `connector_id` from the current graph.
    ///
    /// The labels measured are the connector's label-bearing edges; the
    /// fallback is the analytic anchor of its members.
    pub fn for_connector(graph: &Graph, connector_id: Id, layout: &LayoutConfig) -> Option<Self> {
        let connector = graph.connector(connector_id)?;
        let label_edges = connector
            .edge_ids()
            .iter()
            .copied()
            .filter(|id| graph.edge(*id).is_some_and(|e| e.show_label()))
            .collect();
        let fallback = analytic_anchor(graph, connector.node_ids(), layout);
        Some(Self::new(connector_id, label_edges, fallback))
    }

    pub fn connector_id(&self) -> Id {
        self.connector_id
    }

    pub fn label_edges(&self) -> &[Id] {
        &self.label_edges
    }

    pub fn fallback(&self) -> Point {
        self.fallback
    }
}

/// Bounded-retry adapter around a [`LayoutProvider`].
#[derive(Debug, Clone, Copy)]
pub struct PositionOracle {
    max_ticks: usize,
}

impl Default for PositionOracle {
    fn default() -> Self {
        Self::new(LayoutConfig::default().max_position_ticks())
    }
}

impl PositionOracle {
    pub fn new(max_ticks: usize) -> Self {
        Self { max_ticks }
    }

    pub fn from_config(layout: &LayoutConfig) -> Self {
        Self::new(layout.max_position_ticks())
    }

    pub fn max_ticks(&self) -> usize {
        self.max_ticks
    }

    /// Waits for every label in `edge_ids` to report a non-zero extent.
    ///
    /// Returns the centre of the union of the label bounds, or `None` when
    /// the tick budget runs out or there is nothing to measure.
    pub async fn request_position<P: LayoutProvider>(
        &self,
        provider: &P,
        edge_ids: &[Id],
    ) -> Option<Point> {
        if edge_ids.is_empty() {
            return None;
        }

        for tick in 1..=self.max_ticks {
            provider.next_tick().await;
            if let Some(bounds) = measured_bounds(provider, edge_ids) {
                trace!(tick = tick; "Label bounds available");
                return Some(bounds.center());
            }
        }

        debug!(labels = edge_ids.len(), ticks = self.max_ticks; "Label bounds never settled");
        None
    }

    /// Resolves a request, using its fallback when the labels never settle.
    pub async fn resolve<P: LayoutProvider>(&self, provider: &P, request: &PositionRequest) -> Point {
        match self.request_position(provider, request.label_edges()).await {
            Some(point) => point,
            None => {
                debug!(connector:% = request.connector_id(); "Using analytic connector position");
                request.fallback()
            }
        }
    }
}

fn measured_bounds<P: LayoutProvider>(provider: &P, edge_ids: &[Id]) -> Option<Bounds> {
    let mut union: Option<Bounds> = None;
    for edge_id in edge_ids {
        let bounds = provider.label_bounds(*edge_id).filter(|b| b.has_extent())?;
        union = Some(match union {
            Some(acc) => acc.merge(&bounds),
            None => bounds,
        });
    }
    union
}

/// Centroid of the members' centres plus the configured anchor offset.
///
/// Missing members are ignored; with no members left the offset alone is
/// returned.
pub fn analytic_anchor(graph: &Graph, node_ids: &[Id], layout: &LayoutConfig) -> Point {
    let size = layout.node_size();
    let centers = node_ids
        .iter()
        .filter_map(|id| graph.node(*id))
        .map(|node| node.center(size));

    Point::centroid(centers)
        .unwrap_or_default()
        .add_point(layout.anchor_offset())
}
