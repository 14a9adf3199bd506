//! The confirmation state machine.
//!
//! A group moves `Unconfirmed -> Confirming -> Confirmed`, and back to
//! `Unconfirmed` through an edit. Confirming validates the settings payload,
//! freezes the group's membership into a [`SavedSettings`] snapshot and marks
//! the connector, its edges and its parts confirmed. Editing reverses the
//! flags and hands the snapshot back to the settings form.
//!
//! Only one confirmation per target may be in flight at a time; a second
//! request for the same target is skipped.

use std::{cell::RefCell, collections::HashSet, rc::Rc};

use log::{debug, info};

use stitchflow_core::{
    identifier::Id,
    model::Node,
    settings::{SavedSettings, Settings, SettingsField},
};

use crate::{
    config::ValidationConfig,
    error::{StitchflowError, TransitionError, ValidationError},
    graph::Graph,
    store::GraphStore,
};

/// Ids with a confirmation currently running.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    ids: Rc<RefCell<HashSet<Id>>>,
}

impl InFlight {
    /// Marks `id` as in flight, or returns `None` if it already is.
    ///
    /// The mark is removed when the returned guard is dropped.
    pub fn try_enter(&self, id: Id) -> Option<InFlightGuard> {
        if !self.ids.borrow_mut().insert(id) {
            return None;
        }
        Some(InFlightGuard {
            ids: Rc::clone(&self.ids),
            id,
        })
    }

    pub fn contains(&self, id: Id) -> bool {
        self.ids.borrow().contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.borrow().is_empty()
    }
}

/// Removes its id from the [`InFlight`] set on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    ids: Rc<RefCell<HashSet<Id>>>,
    id: Id,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.ids.borrow_mut().remove(&self.id);
    }
}

/// What a confirm request resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    /// An unconfirmed group connector.
    Group(Id),
    /// An isolated, unconfirmed part.
    Part(Id),
}

impl Target {
    fn id(self) -> Id {
        match self {
            Self::Group(id) | Self::Part(id) => id,
        }
    }
}

/// Result of [`ConfirmationMachine::confirm`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmOutcome {
    Confirmed {
        /// The connector or part that was confirmed.
        target: Id,
        /// The connector now standing for the target.
        connector: Option<Id>,
        saved: SavedSettings,
    },
    /// A confirmation for the same target was already running.
    Skipped,
}

/// Settings handed back by [`ConfirmationMachine::edit`].
#[derive(Debug, Clone, PartialEq)]
pub struct EditOutcome {
    /// Id to pass to the next confirm call.
    pub target: Id,
    pub settings: Settings,
    pub added_parts_ids: Vec<Id>,
}

/// Drives confirm and edit transitions against a [`GraphStore`].
#[derive(Debug, Default)]
pub struct ConfirmationMachine {
    in_flight: InFlight,
    validation: ValidationConfig,
}

impl ConfirmationMachine {
    pub fn new(validation: ValidationConfig) -> Self {
        Self {
            in_flight: InFlight::default(),
            validation,
        }
    }

    pub fn in_flight(&self) -> &InFlight {
        &self.in_flight
    }

    /// Confirms the group (or isolated part) that `target_id` resolves to.
    ///
    /// `target_id` may name a connector, one of its edges, or a part.
    ///
    /// # Errors
    ///
    /// - [`TransitionError`] when the target cannot be resolved or is already
    ///   confirmed.
    /// - [`ValidationError`] naming the first field blocking confirmation.
    ///
    /// On error the store is unchanged.
    pub fn confirm(
        &self,
        store: &mut GraphStore,
        target_id: Id,
        settings: Settings,
    ) -> Result<ConfirmOutcome, StitchflowError> {
        let target = resolve_confirm_target(store.graph(), target_id)?;
        let Some(_guard) = self.in_flight.try_enter(target.id()) else {
            debug!(target:% = target.id(); "Confirmation already in flight");
            return Ok(ConfirmOutcome::Skipped);
        };

        let settings = self.validate(store.graph(), target, settings)?;
        let saved = match target {
            Target::Group(connector_id) => {
                let members = store
                    .graph()
                    .connector(connector_id)
                    .map(|c| c.node_ids().to_vec())
                    .unwrap_or_default();
                let saved = SavedSettings::new(settings, members);
                store.transact(|graph| confirm_group(graph, connector_id, &saved))?;
                saved
            }
            Target::Part(part_id) => {
                let saved = SavedSettings::new(settings, vec![part_id]);
                store.transact(|graph| confirm_part(graph, part_id, &saved))?;
                saved
            }
        };

        let connector = match target {
            Target::Group(id) => Some(id),
            Target::Part(part_id) => store
                .graph()
                .connectors()
                .find(|c| !c.is_group_box() && c.node_ids() == [part_id])
                .map(|c| c.id()),
        };
        info!(
            target:% = target.id(),
            step = saved.settings().step(),
            members = saved.added_parts_ids().len();
            "Group confirmed"
        );

        Ok(ConfirmOutcome::Confirmed {
            target: target.id(),
            connector,
            saved,
        })
    }

    /// Reopens a confirmed group or part for editing.
    ///
    /// # Errors
    ///
    /// [`TransitionError::NotConfirmed`] when the target is not confirmed,
    /// [`TransitionError::UnknownTarget`] when it cannot be resolved.
    pub fn edit(&self, store: &mut GraphStore, target_id: Id) -> Result<EditOutcome, StitchflowError> {
        let graph = store.graph();
        let connector_id = resolve_edit_target(graph, target_id)?;

        let (target, saved) = match connector_id {
            EditTarget::Connector(id) => {
                let connector = graph
                    .connector(id)
                    .ok_or(TransitionError::UnknownTarget(id))?;
                let target = if connector.is_group_box() {
                    id
                } else {
                    connector.group_id()
                };
                (target, connector.saved_settings().cloned())
            }
            EditTarget::Part(id) => {
                let saved = graph.part(id).and_then(|p| p.saved_settings()).cloned();
                (id, saved)
            }
        };

        store.transact(|graph| {
            reopen(graph, connector_id);
            Ok::<(), StitchflowError>(())
        })?;
        info!(target:% = target; "Group reopened for editing");

        let (settings, added_parts_ids) = match saved {
            Some(saved) => (saved.settings().clone(), saved.added_parts_ids().to_vec()),
            None => (Settings::default(), Vec::new()),
        };
        Ok(EditOutcome {
            target,
            settings,
            added_parts_ids,
        })
    }

    fn validate(&self, graph: &Graph, target: Target, settings: Settings) -> Result<Settings, ValidationError> {
        if settings.step().trim().is_empty() {
            return Err(ValidationError::new(SettingsField::Step));
        }
        if settings.process().trim().is_empty() {
            return Err(ValidationError::new(SettingsField::Process));
        }

        let (label_step, members) = match target {
            Target::Group(id) => {
                let Some(connector) = graph.connector(id) else {
                    return Ok(settings);
                };
                let label_step = connector
                    .edge_ids()
                    .iter()
                    .filter_map(|e| graph.edge(*e))
                    .find(|e| e.show_label())
                    .and_then(|e| e.pending_step());
                (label_step, connector.node_ids().to_vec())
            }
            Target::Part(id) => (None, vec![id]),
        };

        let settings = settings.or_step_value(label_step);
        let step_value_missing = settings.step_value().is_none_or(|v| v.trim().is_empty());
        if self.validation.require_step_value() && step_value_missing {
            return Err(ValidationError::new(SettingsField::StepValue));
        }

        for part in members.iter().filter_map(|id| graph.part(*id)) {
            if !part.is_text_only() {
                continue;
            }
            let text = settings.part_text(part.id()).or(part.text());
            if text.is_none_or(|t| t.trim().is_empty()) {
                return Err(ValidationError::missing_text(part.id()));
            }
        }

        Ok(settings)
    }
}

fn resolve_confirm_target(graph: &Graph, id: Id) -> Result<Target, TransitionError> {
    if graph.contains_edge(id) {
        let connector = graph
            .connector_with_edge(id)
            .ok_or(TransitionError::UnknownTarget(id))?;
        return group_target(connector.id(), connector.is_confirmed());
    }

    match graph.node(id) {
        Some(Node::Connector(connector)) => group_target(id, connector.is_confirmed()),
        Some(Node::Part(part)) => {
            let open_group = graph
                .connectors()
                .find(|c| c.is_group_box() && !c.is_confirmed() && c.contains_node(id));
            if let Some(connector) = open_group {
                return Ok(Target::Group(connector.id()));
            }
            if part.is_confirmed() {
                return Err(TransitionError::AlreadyConfirmed(id));
            }
            if graph.has_incident_edge(id) {
                return Err(TransitionError::UnknownTarget(id));
            }
            Ok(Target::Part(id))
        }
        None => Err(TransitionError::UnknownTarget(id)),
    }
}

fn group_target(connector_id: Id, confirmed: bool) -> Result<Target, TransitionError> {
    if confirmed {
        Err(TransitionError::AlreadyConfirmed(connector_id))
    } else {
        Ok(Target::Group(connector_id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditTarget {
    Connector(Id),
    /// A confirmed part whose single-node connector does not exist yet.
    Part(Id),
}

fn resolve_edit_target(graph: &Graph, id: Id) -> Result<EditTarget, TransitionError> {
    if graph.contains_edge(id) {
        return match graph.connector_with_edge(id) {
            Some(connector) if connector.is_confirmed() => Ok(EditTarget::Connector(connector.id())),
            _ => Err(TransitionError::NotConfirmed(id)),
        };
    }

    match graph.node(id) {
        Some(Node::Connector(connector)) if connector.is_confirmed() => Ok(EditTarget::Connector(id)),
        Some(Node::Connector(_)) => Err(TransitionError::NotConfirmed(id)),
        Some(Node::Part(part)) => {
            // Prefer the visible group, then the part's own connector
            let owner = graph
                .connectors()
                .filter(|c| c.is_confirmed() && c.contains_node(id))
                .min_by_key(|c| (c.is_hidden(), !c.is_group_box()));
            match owner {
                Some(connector) => Ok(EditTarget::Connector(connector.id())),
                None if part.is_confirmed() => Ok(EditTarget::Part(id)),
                None => Err(TransitionError::NotConfirmed(id)),
            }
        }
        None => Err(TransitionError::UnknownTarget(id)),
    }
}

fn confirm_group(graph: &mut Graph, connector_id: Id, saved: &SavedSettings) -> Result<(), StitchflowError> {
    let (node_ids, edge_ids) = {
        let connector = graph
            .connector(connector_id)
            .ok_or(TransitionError::UnknownTarget(connector_id))?;
        (connector.node_ids().to_vec(), connector.edge_ids().to_vec())
    };
    let settings = saved.settings();

    for part_id in &node_ids {
        let Some(part) = graph.part_mut(*part_id) else {
            continue;
        };
        part.set_confirmed(true);
        part.set_saved_settings(Some(saved.clone()));
        if part.is_text_only() {
            if let Some(text) = settings.part_text(*part_id) {
                part.set_text(Some(text.to_owned()));
            }
        }
    }

    for edge_id in &edge_ids {
        let Some(edge) = graph.edge_mut(*edge_id) else {
            continue;
        };
        edge.set_confirmed(true);
        if edge.show_label() {
            edge.set_saved_settings(Some(saved.clone()));
        }
    }

    if let Some(connector) = graph.connector_mut(connector_id) {
        connector.set_confirmed(true);
        connector.set_hidden(false);
        connector.set_saved_settings(Some(saved.clone()));
    }
    Ok(())
}

fn confirm_part(graph: &mut Graph, part_id: Id, saved: &SavedSettings) -> Result<(), StitchflowError> {
    let part = graph
        .part_mut(part_id)
        .ok_or(TransitionError::UnknownTarget(part_id))?;
    part.set_confirmed(true);
    part.set_saved_settings(Some(saved.clone()));
    if part.is_text_only() {
        if let Some(text) = saved.settings().part_text(part_id) {
            part.set_text(Some(text.to_owned()));
        }
    }
    Ok(())
}

/// Clears the confirmed flags of a connector and its members.
///
/// Parts still held by another confirmed connector stay confirmed. Child
/// connectors are left alone and become visible again on recomputation.
fn reopen(graph: &mut Graph, target: EditTarget) {
    let connector_id = match target {
        EditTarget::Part(part_id) => {
            if let Some(part) = graph.part_mut(part_id) {
                part.set_confirmed(false);
            }
            return;
        }
        EditTarget::Connector(id) => id,
    };

    let Some(connector) = graph.connector_mut(connector_id) else {
        return;
    };
    connector.set_confirmed(false);
    connector.set_hidden(true);
    let node_ids = connector.node_ids().to_vec();
    let edge_ids = connector.edge_ids().to_vec();

    for edge_id in edge_ids {
        if let Some(edge) = graph.edge_mut(edge_id) {
            edge.set_confirmed(false);
        }
    }
    for part_id in node_ids {
        let holder_saved = graph
            .confirmed_holder(part_id, Some(connector_id))
            .map(|holder| holder.saved_settings().cloned());
        let Some(part) = graph.part_mut(part_id) else {
            continue;
        };
        match holder_saved {
            Some(Some(saved)) => part.set_saved_settings(Some(saved)),
            Some(None) => {}
            None => part.set_confirmed(false),
        }
    }
}
