/*!
Snapshot reconciliation.

Every poll tick delivers the complete device and link sets. The reconciler brings the store
in line with that snapshot while keeping what only the user owns: node positions, the camera
and (where it still makes sense) the selection.
*/

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::{
    network::{
        device::{Device, DeviceId},
        link::{Link, LinkId},
        network_graph::{NetworkGraph, StoreError, UpsertOutcome},
    },
    topology::{
        layout::{LayoutKind, LayoutSettings, apply_fit, apply_layout},
        selection::SelectionState,
        source::Snapshot,
    },
};

/// What one reconcile pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub nodes_added: usize,
    pub nodes_removed: usize,
    pub nodes_updated: usize,
    pub edges_added: usize,
    pub edges_removed: usize,
    pub edges_updated: usize,
    /// Links whose endpoints are not part of this snapshot's device set.
    pub edges_skipped: usize,
    /// The cold-start layout ran on this pass.
    pub layout_applied: bool,
    /// The selection had to be dropped back to `Idle`.
    pub selection_reset: bool,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        *self == ReconcileReport::default()
    }
}

pub struct Reconciler {
    settings: LayoutSettings,
    default_layout: LayoutKind,
    layout_invocations: u64,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(LayoutSettings::default())
    }
}

impl Reconciler {
    pub fn new(settings: LayoutSettings) -> Self {
        Self {
            settings,
            default_layout: LayoutKind::Circle,
            layout_invocations: 0,
        }
    }

    pub fn settings(&self) -> &LayoutSettings {
        &self.settings
    }

    /// How many times the cold-start layout has run over this reconciler's lifetime.
    pub fn layout_invocations(&self) -> u64 {
        self.layout_invocations
    }

    pub fn reconcile_snapshot(&mut self, store: &mut NetworkGraph, snapshot: &Snapshot) -> ReconcileReport {
        self.reconcile(store, &snapshot.devices, &snapshot.links)
    }

    pub fn reconcile(&mut self, store: &mut NetworkGraph, devices: &[Device], links: &[Link]) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        // 1) Positions are the only state carried across the pass
        let prior_positions = store.positions();

        // 2) Desired sets
        let mut desired_devices: HashMap<&DeviceId, &Device> = HashMap::with_capacity(devices.len());
        for device in devices {
            if desired_devices.insert(&device.id, device).is_some() {
                warn!(device = %device.id, "duplicate device id in snapshot, keeping the last record");
            }
        }
        let desired_links: HashSet<&LinkId> = links.iter().map(|link| &link.id).collect();

        // 3) Remove what vanished. Node removal also drops the node's edges.
        for id in store.node_ids() {
            if !desired_devices.contains_key(&id) {
                let _ = store.remove_node(&id);
                report.nodes_removed += 1;
            }
        }
        for id in store.edge_ids() {
            if !desired_links.contains(&id) && store.remove_edge(&id).is_ok() {
                report.edges_removed += 1;
            }
        }

        // 4) Add new nodes (restoring any known position) and refresh persisting ones
        for device in devices {
            let is_kept_record = desired_devices
                .get(&device.id)
                .is_some_and(|kept| std::ptr::eq(*kept, device));
            if !is_kept_record {
                continue;
            }
            let position = prior_positions.get(&device.id).copied();
            match store.upsert_node(device.clone(), position) {
                UpsertOutcome::Added => report.nodes_added += 1,
                UpsertOutcome::Updated => report.nodes_updated += 1,
                UpsertOutcome::Unchanged => {}
            }
        }

        // 5) Edges, only between nodes of this generation
        for link in links {
            match store.upsert_edge(link.clone()) {
                Ok(UpsertOutcome::Added) => report.edges_added += 1,
                Ok(UpsertOutcome::Updated) => report.edges_updated += 1,
                Ok(UpsertOutcome::Unchanged) => {}
                Err(StoreError::DanglingEdge(link_id, missing)) => {
                    debug!(link = %link_id, device = %missing, "skipping link with missing endpoint");
                    report.edges_skipped += 1;
                }
                Err(e) => warn!("unexpected store error while adding link: {e}"),
            }
        }

        report.selection_reset = self.settle_selection(store);

        // 6) Cold start: nothing placed yet
        if !store.is_empty() && !store.has_known_positions() {
            let strategy = self.default_layout.strategy();
            apply_layout(store, strategy, &self.settings);
            apply_fit(store, &self.settings);
            self.layout_invocations += 1;
            report.layout_applied = true;
            info!(layout = strategy.name(), nodes = store.node_count(), "cold start layout applied");
        }

        debug!(?report, "snapshot reconciled");
        report
    }

    /// Drops a selection that no longer points at anything.
    /// A connect sequence survives unless its chosen endpoint vanished.
    fn settle_selection(&self, store: &mut NetworkGraph) -> bool {
        let selection = store.selection();
        let dangling = if store.is_empty() {
            *selection != SelectionState::Idle
        } else {
            let missing_node = selection
                .selected_node()
                .or(selection.connect_source())
                .is_some_and(|id| !store.contains_node(id));
            let missing_edge = selection.selected_edge().is_some_and(|id| !store.contains_edge(id));
            missing_node || missing_edge
        };

        if dangling {
            info!(selection = %store.selection(), "selection target disappeared, resetting to idle");
            store.set_selection(SelectionState::Idle);
        }
        dangling
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{device::DeviceState, link::LinkStatus, node::Position};

    fn devices(ids: &[&str]) -> Vec<Device> {
        ids.iter().map(|id| Device::new(*id).with_state(DeviceState::Running)).collect()
    }

    #[test]
    fn test_cold_start_layout_runs_once() {
        let mut store = NetworkGraph::default();
        let mut reconciler = Reconciler::default();

        let report = reconciler.reconcile(&mut store, &[], &[]);
        assert!(!report.layout_applied);
        assert_eq!(reconciler.layout_invocations(), 0);

        let five = devices(&["r1", "r2", "r3", "r4", "r5"]);
        let report = reconciler.reconcile(&mut store, &five, &[]);
        assert!(report.layout_applied);
        assert_eq!(report.nodes_added, 5);
        assert_eq!(reconciler.layout_invocations(), 1);
        assert!(store.nodes().all(|n| n.position.is_some()));

        let report = reconciler.reconcile(&mut store, &five, &[]);
        assert!(!report.layout_applied);
        assert!(report.is_noop());
        assert_eq!(reconciler.layout_invocations(), 1);
    }

    #[test]
    fn test_positions_survive_field_changes() {
        let mut store = NetworkGraph::default();
        let mut reconciler = Reconciler::default();
        reconciler.reconcile(&mut store, &devices(&["r1", "r2"]), &[]);
        store.set_position(&"r1".into(), Position::new(-40.0, 12.5)).unwrap();
        let before = store.positions();

        let changed = vec![
            Device::new("r1").with_state(DeviceState::Stopping).with_resources(8192, 4),
            Device::new("r2").with_state(DeviceState::Stopped),
        ];
        let report = reconciler.reconcile(&mut store, &changed, &[]);
        assert_eq!(report.nodes_updated, 2);
        assert_eq!(store.positions(), before);
        assert_eq!(store.node(&"r1".into()).unwrap().device.memory_mb, 8192);
    }

    #[test]
    fn test_new_node_in_warm_topology_stays_unplaced() {
        let mut store = NetworkGraph::default();
        let mut reconciler = Reconciler::default();
        reconciler.reconcile(&mut store, &devices(&["r1"]), &[]);
        let report = reconciler.reconcile(&mut store, &devices(&["r1", "r2", "r3"]), &[]);
        assert!(!report.layout_applied);
        assert_eq!(store.get_position(&"r2".into()), None);
        assert!(store.get_position(&"r1".into()).is_some());
    }

    #[test]
    fn test_removed_node_position_is_forgotten() {
        let mut store = NetworkGraph::default();
        let mut reconciler = Reconciler::default();
        reconciler.reconcile(&mut store, &devices(&["r1", "r2"]), &[]);
        reconciler.reconcile(&mut store, &devices(&["r1"]), &[]);
        reconciler.reconcile(&mut store, &devices(&["r1", "r2"]), &[]);
        assert_eq!(store.get_position(&"r2".into()), None);
    }

    #[test]
    fn test_edge_to_missing_device_is_not_rendered() {
        let mut store = NetworkGraph::default();
        let mut reconciler = Reconciler::default();
        let links = vec![
            Link::new("l1", "r1", "ge-0/0/0", "r2", "ge-0/0/0", LinkStatus::Up),
            Link::new("l2", "r1", "ge-0/0/1", "r3", "ge-0/0/0", LinkStatus::Up),
        ];
        reconciler.reconcile(&mut store, &devices(&["r1", "r2", "r3"]), &links);
        assert_eq!(store.edge_count(), 2);

        // r3 deleted on the backend before its link was cleaned up
        let report = reconciler.reconcile(&mut store, &devices(&["r1", "r2"]), &links);
        assert_eq!(report.nodes_removed, 1);
        assert_eq!(report.edges_skipped, 1);
        assert_eq!(store.edge_count(), 1);
        assert!(!store.contains_edge(&"l2".into()));
    }

    #[test]
    fn test_link_status_update_in_place() {
        let mut store = NetworkGraph::default();
        let mut reconciler = Reconciler::default();
        let mut link = Link::new("l1", "r1", "ge-0/0/0", "r2", "ge-0/0/0", LinkStatus::Down);
        reconciler.reconcile(&mut store, &devices(&["r1", "r2"]), std::slice::from_ref(&link));
        link.status = LinkStatus::Up;
        let report = reconciler.reconcile(&mut store, &devices(&["r1", "r2"]), &[link]);
        assert_eq!(report.edges_updated, 1);
        assert_eq!(store.edge(&"l1".into()).unwrap().link.status, LinkStatus::Up);
    }

    #[test]
    fn test_selection_of_removed_node_resets() {
        let mut store = NetworkGraph::default();
        let mut reconciler = Reconciler::default();
        reconciler.reconcile(&mut store, &devices(&["r1", "r2"]), &[]);
        store.set_selection(SelectionState::NodeSelected("r2".into()));

        let report = reconciler.reconcile(&mut store, &devices(&["r1"]), &[]);
        assert!(report.selection_reset);
        assert_eq!(*store.selection(), SelectionState::Idle);
    }

    #[test]
    fn test_empty_snapshot_clears_graph_and_selection() {
        let mut store = NetworkGraph::default();
        let mut reconciler = Reconciler::default();
        reconciler.reconcile(&mut store, &devices(&["r1"]), &[]);
        store.set_selection(SelectionState::ConnectPendingFirst);

        reconciler.reconcile(&mut store, &[], &[]);
        assert!(store.is_empty());
        assert_eq!(*store.selection(), SelectionState::Idle);
    }

    #[test]
    fn test_connect_selection_survives_refresh() {
        let mut store = NetworkGraph::default();
        let mut reconciler = Reconciler::default();
        reconciler.reconcile(&mut store, &devices(&["r1", "r2"]), &[]);

        store.set_selection(SelectionState::ConnectPendingFirst);
        reconciler.reconcile(&mut store, &devices(&["r1", "r2", "r3"]), &[]);
        assert_eq!(*store.selection(), SelectionState::ConnectPendingFirst);

        store.set_selection(SelectionState::ConnectPendingSecond("r1".into()));
        reconciler.reconcile(&mut store, &devices(&["r1", "r3"]), &[]);
        assert_eq!(*store.selection(), SelectionState::ConnectPendingSecond("r1".into()));

        reconciler.reconcile(&mut store, &devices(&["r3"]), &[]);
        assert_eq!(*store.selection(), SelectionState::Idle);
        assert!(!store.selection().is_connect_mode());
    }
}
