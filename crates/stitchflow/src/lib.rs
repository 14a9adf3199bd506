//! Stitchflow - group consolidation and connector synchronization for process
//! routing diagrams.
//!
//! Parts are placed on a canvas and connected by edges. Every connected set of
//! edges forms a group, represented by a synthetic connector node carrying the
//! group's label. Groups are confirmed with a settings payload, after which
//! they are frozen: later connections never re-absorb confirmed members.
//!
//! The [`Engine`] is the entry point. Every change goes through one store
//! transaction that re-derives groups, label edges and connectors.

pub mod config;
pub mod confirm;
pub mod connector;
pub mod graph;
pub mod label;
pub mod mutation;
pub mod partition;
pub mod persistence;
pub mod position;
pub mod recompute;
pub mod store;

mod error;

pub use stitchflow_core::{geometry, identifier, model, settings, snapshot};

pub use error::{GraphError, InconsistentGraphWarning, StitchflowError, TransitionError, ValidationError};

use log::{debug, info, warn};

use config::AppConfig;
use confirm::{ConfirmOutcome, ConfirmationMachine, EditOutcome};
use geometry::Point;
use graph::Graph;
use identifier::Id;
use model::{Edge, PartNode};
use mutation::Mutation;
use persistence::SnapshotStore;
use position::{LayoutProvider, PositionOracle, PositionRequest};
use recompute::RecomputeReport;
use settings::Settings;
use snapshot::Snapshot;
use store::{GraphStore, PositionTicket};

/// The settings form state: which entity it edits and its current payload.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsPanel {
    target: Id,
    settings: Settings,
    added_parts_ids: Vec<Id>,
}

impl SettingsPanel {
    pub fn target(&self) -> Id {
        self.target
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Members at the time the group was last confirmed; empty for new groups.
    pub fn added_parts_ids(&self) -> &[Id] {
        &self.added_parts_ids
    }
}

/// Routing diagram engine.
///
/// Owns the [`GraphStore`], the confirmation state machine and the settings
/// panel state.
///
/// # Examples
///
/// ```
/// use stitchflow::{Engine, config::AppConfig, geometry::Point, settings::Settings};
///
/// let mut engine = Engine::new(AppConfig::default());
/// let front = engine.add_part("Front", Point::new(0.0, 0.0)).unwrap();
/// let back = engine.add_part("Back", Point::new(200.0, 0.0)).unwrap();
/// let edge = engine.connect(front, back).unwrap();
///
/// engine
///     .confirm(edge, Settings::new("STEP 01", "stitching"))
///     .unwrap();
///
/// let connector = engine.graph().connector_with_edge(edge).unwrap();
/// assert!(connector.is_confirmed());
/// ```
#[derive(Debug)]
pub struct Engine {
    store: GraphStore,
    machine: ConfirmationMachine,
    oracle: PositionOracle,
    panel: Option<SettingsPanel>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl Engine {
    /// Creates an engine with an empty canvas.
    pub fn new(config: AppConfig) -> Self {
        Self {
            store: GraphStore::new(config.layout().clone()),
            machine: ConfirmationMachine::new(config.validation().clone()),
            oracle: PositionOracle::from_config(config.layout()),
            panel: None,
        }
    }

    /// Re-attaches an engine to a persisted snapshot.
    ///
    /// One recomputation runs immediately; dangling references in the
    /// snapshot are dropped and logged.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateId`] when two entities share an id.
    pub fn from_snapshot(snapshot: Snapshot, config: AppConfig) -> Result<Self, StitchflowError> {
        let graph = Graph::from_snapshot(snapshot)?;
        let (store, report) = GraphStore::from_graph(graph, config.layout().clone());
        if !report.warnings.is_empty() {
            warn!(warnings = report.warnings.len(); "Snapshot had dangling references");
        }
        info!(
            nodes = store.graph().nodes().count(),
            edges = store.graph().edges().count();
            "Engine attached to snapshot"
        );

        Ok(Self {
            store,
            machine: ConfirmationMachine::new(config.validation().clone()),
            oracle: PositionOracle::from_config(config.layout()),
            panel: None,
        })
    }

    /// Loads a snapshot from `source` and attaches to it.
    pub fn load(source: &impl SnapshotStore, config: AppConfig) -> Result<Self, StitchflowError> {
        Self::from_snapshot(source.load()?, config)
    }

    /// Saves the current snapshot to `sink`.
    pub fn save(&self, sink: &impl SnapshotStore) -> Result<(), StitchflowError> {
        sink.save(&self.snapshot())
    }

    pub fn snapshot(&self) -> Snapshot {
        self.store.graph().to_snapshot()
    }

    pub fn graph(&self) -> &Graph {
        self.store.graph()
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    /// Applies a raw mutation.
    pub fn apply(&mut self, mutation: Mutation) -> Result<RecomputeReport, StitchflowError> {
        let report = self.store.apply(mutation)?;
        self.sync_panel();
        Ok(report)
    }

    /// Places a pattern part with a generated `part-N` id.
    pub fn add_part(&mut self, label: &str, position: Point) -> Result<Id, StitchflowError> {
        let id = self.next_part_id();
        self.add_node(PartNode::new(id, label, position))
    }

    /// The id [`Engine::add_part`] assigns next.
    pub fn next_part_id(&self) -> Id {
        self.next_free_id("part", self.graph().parts().count())
    }

    /// Places a prepared part.
    pub fn add_node(&mut self, part: PartNode) -> Result<Id, StitchflowError> {
        let id = part.id();
        self.apply(Mutation::AddNode(part))?;
        Ok(id)
    }

    /// Connects two nodes with a generated `edge-N` id.
    pub fn connect(&mut self, source: Id, target: Id) -> Result<Id, StitchflowError> {
        let id = self.next_free_id("edge", self.graph().edges().count());
        self.connect_with_id(id, source, target)
    }

    pub fn connect_with_id(&mut self, id: Id, source: Id, target: Id) -> Result<Id, StitchflowError> {
        self.apply(Mutation::AddEdge(Edge::new(id, source, target)))?;
        Ok(id)
    }

    pub fn move_node(&mut self, id: Id, position: Point) -> Result<(), StitchflowError> {
        self.apply(Mutation::MoveNode { id, position })?;
        Ok(())
    }

    /// Stores a step value typed into an edge label before confirmation.
    pub fn set_pending_step(&mut self, edge: Id, value: Option<String>) -> Result<(), StitchflowError> {
        self.apply(Mutation::SetPendingStep { edge, value })?;
        Ok(())
    }

    /// Deletes a part, edge or connector with the store cascades.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownNode`] when `id` names nothing in the graph.
    pub fn delete(&mut self, id: Id) -> Result<RecomputeReport, StitchflowError> {
        let mutation = if self.graph().contains_edge(id) {
            Mutation::RemoveEdge(id)
        } else if self.graph().contains_node(id) {
            Mutation::RemoveNode(id)
        } else {
            return Err(GraphError::UnknownNode(id).into());
        };
        info!(id:% = id; "Deleting");
        self.apply(mutation)
    }

    /// Confirms the group `target` resolves to and closes the settings panel.
    pub fn confirm(&mut self, target: Id, settings: Settings) -> Result<ConfirmOutcome, StitchflowError> {
        let outcome = self.machine.confirm(&mut self.store, target, settings)?;
        if matches!(outcome, ConfirmOutcome::Confirmed { .. }) {
            self.panel = None;
        }
        self.sync_panel();
        Ok(outcome)
    }

    /// Reopens a confirmed group and opens the settings panel with its
    /// saved settings.
    pub fn edit(&mut self, target: Id) -> Result<EditOutcome, StitchflowError> {
        let outcome = self.machine.edit(&mut self.store, target)?;
        self.panel = Some(SettingsPanel {
            target: outcome.target,
            settings: outcome.settings.clone(),
            added_parts_ids: outcome.added_parts_ids.clone(),
        });
        Ok(outcome)
    }

    /// Opens the settings panel for an unconfirmed group or part.
    ///
    /// The step value is prefilled from the label edge when one was typed.
    pub fn open_settings(&mut self, target: Id) -> Result<&SettingsPanel, StitchflowError> {
        let graph = self.graph();
        if !graph.contains_id(target) {
            return Err(TransitionError::UnknownTarget(target).into());
        }
        let pending = graph
            .connector(target)
            .map(|c| c.edge_ids())
            .unwrap_or_default()
            .iter()
            .chain(Some(&target).filter(|id| graph.contains_edge(**id)))
            .filter_map(|id| graph.edge(*id))
            .find(|e| e.show_label())
            .and_then(Edge::pending_step);

        let panel = SettingsPanel {
            target,
            settings: Settings::default().or_step_value(pending),
            added_parts_ids: Vec::new(),
        };
        debug!(target:% = target; "Settings panel opened");
        Ok(self.panel.insert(panel))
    }

    pub fn close_settings(&mut self) {
        self.panel = None;
    }

    pub fn settings_panel(&self) -> Option<&SettingsPanel> {
        self.panel.as_ref()
    }

    /// Hands out the pending connector position tickets.
    pub fn take_position_requests(&mut self) -> Vec<PositionTicket> {
        self.store.take_position_requests()
    }

    /// Writes a resolved position; returns `false` for stale tickets.
    pub fn apply_position(&mut self, ticket: PositionTicket, position: Point) -> bool {
        self.store.apply_position(ticket, position)
    }

    /// Resolves every pending position ticket through `provider`.
    ///
    /// Returns the number of connectors moved.
    pub async fn refresh_positions<P: LayoutProvider>(&mut self, provider: &P) -> usize {
        let mut moved = 0;
        for ticket in self.store.take_position_requests() {
            let Some(request) =
                PositionRequest::for_connector(self.graph(), ticket.connector_id(), self.store.layout())
            else {
                continue;
            };
            let position = self.oracle.resolve(provider, &request).await;
            if self.store.apply_position(ticket, position) {
                moved += 1;
            }
        }
        debug!(moved = moved; "Connector positions refreshed");
        moved
    }

    fn next_free_id(&self, prefix: &str, taken: usize) -> Id {
        (taken + 1..)
            .map(|idx| Id::from_sequence(prefix, idx))
            .find(|id| !self.graph().contains_id(*id))
            .unwrap_or_else(|| Id::from_sequence(prefix, taken + 1))
    }

    /// Closes the panel when the entity it edits is gone.
    fn sync_panel(&mut self) {
        let gone = self
            .panel
            .as_ref()
            .is_some_and(|panel| !self.store.graph().contains_id(panel.target));
        if gone {
            debug!("Settings panel target removed");
            self.panel = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use position::HeadlessLayout;

    #[test]
    fn test_generated_ids_skip_taken() {
        let mut engine = Engine::default();
        engine
            .add_node(PartNode::new(Id::new("part-2"), "Taken", Point::default()))
            .unwrap();

        let id = engine.add_part("Next", Point::default()).unwrap();

        assert_eq!(id, "part-3");
    }

    #[test]
    fn test_delete_unknown() {
        let mut engine = Engine::default();

        let err = engine.delete(Id::new("nothing")).unwrap_err();

        assert!(matches!(err, StitchflowError::Graph(GraphError::UnknownNode(_))));
    }

    #[test]
    fn test_panel_follows_confirm_and_edit() {
        let mut engine = Engine::default();
        let a = engine.add_part("A", Point::default()).unwrap();
        let b = engine.add_part("B", Point::new(300.0, 0.0)).unwrap();
        let edge = engine.connect(a, b).unwrap();
        engine.set_pending_step(edge, Some("7".to_string())).unwrap();

        let panel = engine.open_settings(edge).unwrap();
        assert_eq!(panel.settings().step_value(), Some("7"));

        engine
            .confirm(edge, Settings::new("STEP 01", "stitching"))
            .unwrap();
        assert!(engine.settings_panel().is_none());

        engine.edit(edge).unwrap();
        let panel = engine.settings_panel().unwrap();
        assert_eq!(panel.target(), "connector::part-1+part-2");
        assert_eq!(panel.settings().step(), "STEP 01");
        assert_eq!(panel.added_parts_ids(), &[a, b]);
    }

    #[test]
    fn test_panel_closes_when_target_deleted() {
        let mut engine = Engine::default();
        let a = engine.add_part("A", Point::default()).unwrap();

        engine.open_settings(a).unwrap();
        engine.delete(a).unwrap();

        assert!(engine.settings_panel().is_none());
    }

    #[test]
    fn test_refresh_positions_uses_fallback() {
        let mut engine = Engine::default();
        let a = engine.add_part("A", Point::new(0.0, 0.0)).unwrap();
        let b = engine.add_part("B", Point::new(200.0, 100.0)).unwrap();
        let edge = engine.connect(a, b).unwrap();

        let moved = block_on(engine.refresh_positions(&HeadlessLayout));

        assert_eq!(moved, 1);
        let connector = engine.graph().connector_with_edge(edge).unwrap();
        assert_eq!(connector.position(), Point::new(170.0, 40.0));
        assert!(engine.take_position_requests().is_empty());
    }
}
