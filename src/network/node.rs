use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::network::{
    device::{Device, DeviceId},
    link::{Link, LinkId},
};

/// Screen-space coordinate of a node.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const ORIGIN: Position = Position { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Transient highlight applied to a node by the interaction layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VisualTag {
    #[default]
    None,
    ConnectSource,
    Selected,
}

/// A device as placed in the topology view.
///
/// `position` is `None` until a layout strategy or a drag places the node. The reconciler
/// never invents one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub device: Device,
    pub position: Option<Position>,
    pub tag: VisualTag,
}

impl GraphNode {
    pub fn new(device: Device, position: Option<Position>) -> Self {
        Self {
            device,
            position,
            tag: VisualTag::None,
        }
    }

    pub fn id(&self) -> &DeviceId {
        &self.device.id
    }

    /// Where a renderer should draw the node. Unplaced nodes sit at the origin.
    pub fn render_position(&self) -> Position {
        self.position.unwrap_or(Position::ORIGIN)
    }

    /// Copies the fields that may change between snapshots. Position and tag are left alone.
    /// Returns whether anything changed.
    pub fn refresh_from(&mut self, device: &Device) -> bool {
        let changed = self.device.state != device.state
            || self.device.memory_mb != device.memory_mb
            || self.device.vcpus != device.vcpus;
        self.device.state = device.state;
        self.device.memory_mb = device.memory_mb;
        self.device.vcpus = device.vcpus;
        changed
    }
}

/// A link as drawn between two placed nodes. Has no position of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub link: Link,
    pub selected: bool,
}

impl GraphEdge {
    pub fn new(link: Link) -> Self {
        Self {
            link,
            selected: false,
        }
    }

    pub fn id(&self) -> &LinkId {
        &self.link.id
    }

    pub fn label(&self) -> String {
        self.link.label()
    }

    pub fn refresh_from(&mut self, link: &Link) -> bool {
        let changed = self.link.status != link.status;
        self.link.status = link.status;
        changed
    }
}
