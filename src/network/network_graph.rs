use std::collections::HashMap;

use petgraph::{
    Directed,
    stable_graph::{EdgeIndex, NodeIndex, StableGraph},
    visit::EdgeRef,
};
use thiserror::Error;
use tracing::debug;

use crate::{
    network::{
        device::{Device, DeviceId},
        link::{Link, LinkId},
        node::{GraphEdge, GraphNode, Position, VisualTag},
    },
    topology::{layout::Viewport, selection::SelectionState},
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("Node not found: {0}")]
    NodeNotFound(DeviceId),
    #[error("Edge not found: {0}")]
    EdgeNotFound(LinkId),
    #[error("Edge {0} references missing node {1}")]
    DanglingEdge(LinkId, DeviceId),
    #[error("Invalid position {1} for node {0}")]
    InvalidPosition(DeviceId, Position),
}

/// One observable mutation of the store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreChange {
    NodeAdded(DeviceId),
    NodeUpdated(DeviceId),
    NodeRemoved(DeviceId),
    NodeMoved(DeviceId),
    EdgeAdded(LinkId),
    EdgeUpdated(LinkId),
    EdgeRemoved(LinkId),
    SelectionChanged,
    ViewportChanged,
}

/// Receives every store mutation as it happens, e.g. to schedule a redraw.
pub trait RenderSink: Send {
    fn on_change(&mut self, change: &StoreChange);
}

impl<F> RenderSink for F
where
    F: FnMut(&StoreChange) + Send,
{
    fn on_change(&mut self, change: &StoreChange) {
        self(change)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Added,
    Updated,
    Unchanged,
}

/// The graph state store: canonical nodes, edges, positions, selection and camera.
///
/// Every mutation is applied synchronously and pushed to the registered render sinks.
/// node_id_to_index_map and edge_id_to_index_map map backend ids to stable graph indices.
#[derive(Default)]
pub struct NetworkGraph {
    graph: StableGraph<GraphNode, GraphEdge, Directed>,
    node_id_to_index_map: HashMap<DeviceId, NodeIndex>,
    edge_id_to_index_map: HashMap<LinkId, EdgeIndex>,
    selection: SelectionState,
    viewport: Viewport,
    revision: u64,
    sinks: Vec<Box<dyn RenderSink>>,
}

impl NetworkGraph {
    pub fn add_render_sink(&mut self, sink: impl RenderSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    /// Incremented on every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn notify(&mut self, change: StoreChange) {
        self.revision += 1;
        debug!(revision = self.revision, ?change, "store mutated");
        for sink in self.sinks.iter_mut() {
            sink.on_change(&change);
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains_node(&self, id: &DeviceId) -> bool {
        self.node_id_to_index_map.contains_key(id)
    }

    pub fn contains_edge(&self, id: &LinkId) -> bool {
        self.edge_id_to_index_map.contains_key(id)
    }

    pub fn node(&self, id: &DeviceId) -> Option<&GraphNode> {
        self.node_id_to_index_map
            .get(id)
            .and_then(|idx| self.graph.node_weight(*idx))
    }

    pub fn edge(&self, id: &LinkId) -> Option<&GraphEdge> {
        self.edge_id_to_index_map
            .get(id)
            .and_then(|idx| self.graph.edge_weight(*idx))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.graph.node_weights()
    }

    pub fn edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.graph.edge_weights()
    }

    /// Node ids in a stable order, for layouts and listings.
    pub fn node_ids(&self) -> Vec<DeviceId> {
        let mut ids: Vec<DeviceId> = self.node_id_to_index_map.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn edge_ids(&self) -> Vec<LinkId> {
        let mut ids: Vec<LinkId> = self.edge_id_to_index_map.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Inserts a node for a newly seen device, or refreshes the mutable fields of an
    /// existing one. `position` is only used on insert; an existing position is never replaced.
    pub fn upsert_node(&mut self, device: Device, position: Option<Position>) -> UpsertOutcome {
        if let Some(&idx) = self.node_id_to_index_map.get(&device.id) {
            let changed = self
                .graph
                .node_weight_mut(idx)
                .map(|node| node.refresh_from(&device))
                .unwrap_or(false);
            if changed {
                self.notify(StoreChange::NodeUpdated(device.id));
                return UpsertOutcome::Updated;
            }
            return UpsertOutcome::Unchanged;
        }

        let id = device.id.clone();
        let idx = self.graph.add_node(GraphNode::new(device, position));
        self.node_id_to_index_map.insert(id.clone(), idx);
        self.notify(StoreChange::NodeAdded(id));
        UpsertOutcome::Added
    }

    /// Removes a node and every edge attached to it.
    pub fn remove_node(&mut self, id: &DeviceId) -> Result<GraphNode, StoreError> {
        let idx = self
            .node_id_to_index_map
            .get(id)
            .copied()
            .ok_or_else(|| StoreError::NodeNotFound(id.clone()))?;

        // Collect first: the graph drops incident edges itself, the id map does not
        let incident: Vec<LinkId> = self
            .graph
            .edges_directed(idx, petgraph::Direction::Outgoing)
            .chain(self.graph.edges_directed(idx, petgraph::Direction::Incoming))
            .map(|edge| edge.weight().id().clone())
            .collect();
        for link_id in incident {
            let _ = self.remove_edge(&link_id);
        }

        self.node_id_to_index_map.remove(id);
        let node = self
            .graph
            .remove_node(idx)
            .ok_or_else(|| StoreError::NodeNotFound(id.clone()))?;
        self.notify(StoreChange::NodeRemoved(id.clone()));
        Ok(node)
    }

    /// Inserts or refreshes an edge. Both endpoints must already be in the store.
    pub fn upsert_edge(&mut self, link: Link) -> Result<UpsertOutcome, StoreError> {
        if let Some(&idx) = self.edge_id_to_index_map.get(&link.id) {
            let changed = self
                .graph
                .edge_weight_mut(idx)
                .map(|edge| edge.refresh_from(&link))
                .unwrap_or(false);
            if changed {
                self.notify(StoreChange::EdgeUpdated(link.id));
                return Ok(UpsertOutcome::Updated);
            }
            return Ok(UpsertOutcome::Unchanged);
        }

        let source = self
            .node_id_to_index_map
            .get(&link.source_device_id)
            .copied()
            .ok_or_else(|| StoreError::DanglingEdge(link.id.clone(), link.source_device_id.clone()))?;
        let target = self
            .node_id_to_index_map
            .get(&link.target_device_id)
            .copied()
            .ok_or_else(|| StoreError::DanglingEdge(link.id.clone(), link.target_device_id.clone()))?;

        let id = link.id.clone();
        let idx = self.graph.add_edge(source, target, GraphEdge::new(link));
        self.edge_id_to_index_map.insert(id.clone(), idx);
        self.notify(StoreChange::EdgeAdded(id));
        Ok(UpsertOutcome::Added)
    }

    pub fn remove_edge(&mut self, id: &LinkId) -> Result<GraphEdge, StoreError> {
        let idx = self
            .edge_id_to_index_map
            .remove(id)
            .ok_or_else(|| StoreError::EdgeNotFound(id.clone()))?;
        let edge = self
            .graph
            .remove_edge(idx)
            .ok_or_else(|| StoreError::EdgeNotFound(id.clone()))?;
        self.notify(StoreChange::EdgeRemoved(id.clone()));
        Ok(edge)
    }

    /// Known position of a node. `None` for unplaced or unknown nodes.
    pub fn get_position(&self, id: &DeviceId) -> Option<Position> {
        self.node(id).and_then(|node| node.position)
    }

    /// Places a node. Non-finite coordinates are rejected and leave the node where it was.
    pub fn set_position(&mut self, id: &DeviceId, position: Position) -> Result<(), StoreError> {
        if !position.is_finite() {
            return Err(StoreError::InvalidPosition(id.clone(), position));
        }
        let idx = self
            .node_id_to_index_map
            .get(id)
            .copied()
            .ok_or_else(|| StoreError::NodeNotFound(id.clone()))?;
        if let Some(node) = self.graph.node_weight_mut(idx) {
            node.position = Some(position);
        }
        self.notify(StoreChange::NodeMoved(id.clone()));
        Ok(())
    }

    /// Every known position, keyed by node id.
    pub fn positions(&self) -> HashMap<DeviceId, Position> {
        self.graph
            .node_weights()
            .filter_map(|node| node.position.map(|p| (node.id().clone(), p)))
            .collect()
    }

    pub fn has_known_positions(&self) -> bool {
        self.graph.node_weights().any(|node| node.position.is_some())
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Replaces the selection and re-derives every visual tag from it.
    pub fn set_selection(&mut self, state: SelectionState) {
        if self.selection == state {
            return;
        }

        for node in self.graph.node_weights_mut() {
            node.tag = match &state {
                SelectionState::NodeSelected(id) if id == node.id() => VisualTag::Selected,
                SelectionState::ConnectPendingSecond(id) if id == node.id() => VisualTag::ConnectSource,
                _ => VisualTag::None,
            };
        }
        for edge in self.graph.edge_weights_mut() {
            edge.selected = matches!(&state, SelectionState::EdgeSelected(id) if id == edge.id());
        }

        self.selection = state;
        self.notify(StoreChange::SelectionChanged);
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.notify(StoreChange::ViewportChanged);
    }

    /// Endpoint ids of an edge as wired in the graph.
    pub fn edge_endpoints(&self, id: &LinkId) -> Option<(&DeviceId, &DeviceId)> {
        let idx = self.edge_id_to_index_map.get(id)?;
        let (source, target) = self.graph.edge_endpoints(*idx)?;
        Some((self.graph[source].id(), self.graph[target].id()))
    }
}

impl std::fmt::Display for NetworkGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let routers = self.node_count();
        let links = self.edge_count();
        write!(
            f,
            "{} router{} • {} link{}",
            routers,
            if routers == 1 { "" } else { "s" },
            links,
            if links == 1 { "" } else { "s" }
        )
    }
}

impl std::fmt::Debug for NetworkGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkGraph")
            .field("nodes", &self.node_ids())
            .field("edges", &self.edge_ids())
            .field("selection", &self.selection)
            .field("viewport", &self.viewport)
            .field("revision", &self.revision)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::network::{device::DeviceState, link::LinkStatus};

    fn two_router_store() -> NetworkGraph {
        let mut store = NetworkGraph::default();
        store.upsert_node(Device::new("r1"), Some(Position::new(1.0, 2.0)));
        store.upsert_node(Device::new("r2"), None);
        store
            .upsert_edge(Link::new("l1", "r1", "ge-0/0/0", "r2", "ge-0/0/0", LinkStatus::Up))
            .unwrap();
        store
    }

    #[test]
    fn test_upsert_never_replaces_position() {
        let mut store = two_router_store();
        let outcome = store.upsert_node(
            Device::new("r1").with_state(DeviceState::Running),
            Some(Position::new(99.0, 99.0)),
        );
        assert_eq!(outcome, UpsertOutcome::Updated);
        assert_eq!(store.get_position(&"r1".into()), Some(Position::new(1.0, 2.0)));

        let outcome = store.upsert_node(Device::new("r1").with_state(DeviceState::Running), None);
        assert_eq!(outcome, UpsertOutcome::Unchanged);
    }

    #[test]
    fn test_remove_node_drops_incident_edges() {
        let mut store = two_router_store();
        assert_eq!(store.edge_count(), 1);
        store.remove_node(&"r2".into()).unwrap();
        assert_eq!(store.edge_count(), 0);
        assert!(!store.contains_edge(&"l1".into()));
        assert!(store.edge(&"l1".into()).is_none());
        assert_eq!(store.remove_node(&"r2".into()), Err(StoreError::NodeNotFound("r2".into())));
    }

    #[test]
    fn test_edge_requires_both_endpoints() {
        let mut store = two_router_store();
        let err = store
            .upsert_edge(Link::new("l2", "r1", "ge-0/0/1", "r9", "ge-0/0/0", LinkStatus::Down))
            .unwrap_err();
        assert_eq!(err, StoreError::DanglingEdge("l2".into(), "r9".into()));
        let (src, dst) = store.edge_endpoints(&"l1".into()).unwrap();
        assert_eq!((src.as_str(), dst.as_str()), ("r1", "r2"));
    }

    #[test]
    fn test_selection_drives_visual_tags() {
        let mut store = two_router_store();
        store.set_selection(SelectionState::NodeSelected("r1".into()));
        assert_eq!(store.node(&"r1".into()).unwrap().tag, VisualTag::Selected);

        store.set_selection(SelectionState::ConnectPendingSecond("r2".into()));
        assert_eq!(store.node(&"r1".into()).unwrap().tag, VisualTag::None);
        assert_eq!(store.node(&"r2".into()).unwrap().tag, VisualTag::ConnectSource);

        store.set_selection(SelectionState::EdgeSelected("l1".into()));
        assert!(store.edge(&"l1".into()).unwrap().selected);
        assert!(store.nodes().all(|n| n.tag == VisualTag::None));

        store.set_selection(SelectionState::Idle);
        assert!(!store.edge(&"l1".into()).unwrap().selected);
    }

    #[test]
    fn test_every_mutation_is_pushed_to_sinks() {
        let seen: Arc<Mutex<Vec<StoreChange>>> = Arc::default();
        let sink_seen = seen.clone();
        let mut store = NetworkGraph::default();
        store.add_render_sink(move |change: &StoreChange| {
            sink_seen.lock().unwrap().push(change.clone());
        });

        store.upsert_node(Device::new("r1"), None);
        store.set_position(&"r1".into(), Position::new(5.0, 5.0)).unwrap();
        store.set_selection(SelectionState::NodeSelected("r1".into()));
        store.remove_node(&"r1".into()).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                StoreChange::NodeAdded("r1".into()),
                StoreChange::NodeMoved("r1".into()),
                StoreChange::SelectionChanged,
                StoreChange::NodeRemoved("r1".into()),
            ]
        );
        assert_eq!(store.revision(), 4);
    }

    #[test]
    fn test_set_position_on_missing_node() {
        let mut store = NetworkGraph::default();
        assert_eq!(
            store.set_position(&"ghost".into(), Position::ORIGIN),
            Err(StoreError::NodeNotFound("ghost".into()))
        );
    }

    #[test]
    fn test_non_finite_position_is_rejected() {
        let mut store = two_router_store();
        let revision = store.revision();
        for bad in [Position::new(f32::INFINITY, 0.0), Position::new(0.0, f32::NAN)] {
            assert!(matches!(
                store.set_position(&"r1".into(), bad),
                Err(StoreError::InvalidPosition(id, _)) if id.as_str() == "r1"
            ));
        }
        assert_eq!(store.get_position(&"r1".into()), Some(Position::new(1.0, 2.0)));
        assert_eq!(store.revision(), revision);

        // Framing after a rejected drag still yields a finite camera
        let viewport = crate::topology::layout::fit_to_view(
            store.positions().values(),
            &crate::topology::layout::LayoutSettings::default(),
        )
        .unwrap();
        assert!(viewport.zoom.is_finite() && viewport.pan.is_finite());
    }

    #[test]
    fn test_summary_line() {
        let store = two_router_store();
        assert_eq!(store.to_string(), "2 routers • 1 link");
    }
}
