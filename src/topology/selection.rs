/*!
Selection state of the topology view.

This module defines:
- `SelectionState`: the single active selection, covering both browse mode (a node or an edge
  with its detail panel) and the two steps of connect mode.
- `DetailPanel`: what the browse-mode detail panel shows for the current selection.
*/

use std::fmt::Display;

use serde::Serialize;

use crate::network::{
    device::{DeviceId, DeviceKind, DeviceState},
    link::{LinkId, LinkStatus},
    network_graph::NetworkGraph,
};

/// Exactly one of these is active at any time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub enum SelectionState {
    #[default]
    Idle,
    NodeSelected(DeviceId),
    EdgeSelected(LinkId),
    ConnectPendingFirst,
    ConnectPendingSecond(DeviceId),
}

impl SelectionState {
    /// Connect mode is on exactly while one of the connect variants is active.
    pub fn is_connect_mode(&self) -> bool {
        matches!(
            self,
            SelectionState::ConnectPendingFirst | SelectionState::ConnectPendingSecond(_)
        )
    }

    pub fn connect_source(&self) -> Option<&DeviceId> {
        match self {
            SelectionState::ConnectPendingSecond(first) => Some(first),
            _ => None,
        }
    }

    pub fn selected_node(&self) -> Option<&DeviceId> {
        match self {
            SelectionState::NodeSelected(id) => Some(id),
            _ => None,
        }
    }

    pub fn selected_edge(&self) -> Option<&LinkId> {
        match self {
            SelectionState::EdgeSelected(id) => Some(id),
            _ => None,
        }
    }

    /// Instruction line shown while connect mode is active.
    pub fn guidance(&self) -> Option<String> {
        match self {
            SelectionState::ConnectPendingFirst => {
                Some("1. Select source router: click a router to start creating a connection".to_string())
            }
            SelectionState::ConnectPendingSecond(first) => Some(format!(
                "Selected: {first} → click target router to create link"
            )),
            _ => None,
        }
    }
}

impl Display for SelectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionState::Idle => write!(f, "idle"),
            SelectionState::NodeSelected(id) => write!(f, "node {id} selected"),
            SelectionState::EdgeSelected(id) => write!(f, "link {id} selected"),
            SelectionState::ConnectPendingFirst => write!(f, "connect: pick source"),
            SelectionState::ConnectPendingSecond(id) => write!(f, "connect: {id} → pick target"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeDetails {
    pub id: DeviceId,
    pub label: String,
    pub state: DeviceState,
    pub kind: DeviceKind,
    pub memory_mb: u64,
    pub vcpus: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkDetails {
    pub id: LinkId,
    pub status: LinkStatus,
    pub source: DeviceId,
    pub source_interface: String,
    pub target: DeviceId,
    pub target_interface: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DetailPanel {
    Node(NodeDetails),
    Link(LinkDetails),
}

impl DetailPanel {
    /// Projects the browse-mode panel for the store's current selection, if any.
    pub fn project(store: &NetworkGraph) -> Option<Self> {
        match store.selection() {
            SelectionState::NodeSelected(id) => {
                let device = &store.node(id)?.device;
                Some(DetailPanel::Node(NodeDetails {
                    id: device.id.clone(),
                    label: device.display_label.clone(),
                    state: device.state,
                    kind: device.kind.clone(),
                    memory_mb: device.memory_mb,
                    vcpus: device.vcpus,
                }))
            }
            SelectionState::EdgeSelected(id) => {
                let link = &store.edge(id)?.link;
                Some(DetailPanel::Link(LinkDetails {
                    id: link.id.clone(),
                    status: link.status,
                    source: link.source_device_id.clone(),
                    source_interface: link.source_interface_name.clone(),
                    target: link.target_device_id.clone(),
                    target_interface: link.target_interface_name.clone(),
                }))
            }
            _ => None,
        }
    }
}

impl Display for DetailPanel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetailPanel::Node(node) => {
                writeln!(f, "{}", node.label)?;
                writeln!(f, "  State:  {}", node.state)?;
                writeln!(f, "  Type:   {}", node.kind)?;
                writeln!(f, "  Memory: {} MB", node.memory_mb)?;
                write!(f, "  vCPUs:  {}", node.vcpus)
            }
            DetailPanel::Link(link) => {
                writeln!(f, "Link Details")?;
                writeln!(f, "  Status: {}", link.status)?;
                writeln!(f, "  Source: {} ({})", link.source, link.source_interface)?;
                writeln!(f, "  Target: {} ({})", link.target, link.target_interface)?;
                write!(f, "  Link ID: {}", link.id)
            }
        }
    }
}
