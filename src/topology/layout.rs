/*!
Layout strategies and camera framing.

Strategies are pure: they map a set of node ids to positions and never look at the store.
They only run on explicit request or on the one-time cold start of an empty topology.
`fit_to_view` is not a placement at all, it computes the camera that frames the current
positions.
*/

use std::{collections::HashMap, f32::consts::{FRAC_PI_2, TAU}, fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::network::{device::DeviceId, network_graph::NetworkGraph, node::Position};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: f32,
    pub height: f32,
}

impl Canvas {
    pub fn center(&self) -> Position {
        Position::new(self.width / 2.0, self.height / 2.0)
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
        }
    }
}

/// Geometry knobs shared by every strategy and by camera framing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutSettings {
    pub canvas: Canvas,
    /// Target distance between neighbouring nodes.
    pub node_spacing: f32,
    /// Margin kept around the framed contents, in screen pixels.
    pub fit_padding: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            canvas: Canvas::default(),
            node_spacing: 90.0,
            fit_padding: 50.0,
            min_zoom: 0.1,
            max_zoom: 2.0,
        }
    }
}

/// Camera transform: `screen = model * zoom + pan`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub zoom: f32,
    pub pan: Position,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Position::ORIGIN,
        }
    }
}

impl Viewport {
    pub fn to_screen(&self, position: Position) -> Position {
        Position::new(
            position.x * self.zoom + self.pan.x,
            position.y * self.zoom + self.pan.y,
        )
    }
}

/// A pluggable placement algorithm.
pub trait LayoutStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn assign(&self, nodes: &[DeviceId], settings: &LayoutSettings) -> HashMap<DeviceId, Position>;
}

/// Evenly spaced on a circle around the canvas center, starting at the top.
pub struct CircleLayout;

impl LayoutStrategy for CircleLayout {
    fn name(&self) -> &'static str {
        "circle"
    }

    fn assign(&self, nodes: &[DeviceId], settings: &LayoutSettings) -> HashMap<DeviceId, Position> {
        let center = settings.canvas.center();
        let n = nodes.len();
        if n == 1 {
            return HashMap::from([(nodes[0].clone(), center)]);
        }

        // Circumference grows with node count so neighbours stay `node_spacing` apart
        let radius = (settings.node_spacing * n as f32 / TAU).max(settings.node_spacing);
        let step = TAU / n as f32;

        nodes
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let angle = -FRAC_PI_2 + step * i as f32;
                let position = Position::new(
                    center.x + radius * angle.cos(),
                    center.y + radius * angle.sin(),
                );
                (id.clone(), position)
            })
            .collect()
    }
}

/// Row-major grid centered on the canvas, `ceil(sqrt(n))` rows.
pub struct GridLayout;

impl GridLayout {
    pub fn dimensions(n: usize) -> (usize, usize) {
        if n == 0 {
            return (0, 0);
        }
        let rows = (n as f32).sqrt().ceil() as usize;
        let cols = n.div_ceil(rows);
        (rows, cols)
    }
}

impl LayoutStrategy for GridLayout {
    fn name(&self) -> &'static str {
        "grid"
    }

    fn assign(&self, nodes: &[DeviceId], settings: &LayoutSettings) -> HashMap<DeviceId, Position> {
        let (rows, cols) = Self::dimensions(nodes.len());
        let center = settings.canvas.center();
        let spacing = settings.node_spacing;
        let x0 = center.x - spacing * (cols.saturating_sub(1)) as f32 / 2.0;
        let y0 = center.y - spacing * (rows.saturating_sub(1)) as f32 / 2.0;

        nodes
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let row = i / cols;
                let col = i % cols;
                let position = Position::new(x0 + spacing * col as f32, y0 + spacing * row as f32);
                (id.clone(), position)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    Circle,
    Grid,
}

impl LayoutKind {
    pub fn strategy(&self) -> &'static dyn LayoutStrategy {
        match self {
            LayoutKind::Circle => &CircleLayout,
            LayoutKind::Grid => &GridLayout,
        }
    }
}

impl Display for LayoutKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.strategy().name())
    }
}

impl FromStr for LayoutKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "circle" => Ok(LayoutKind::Circle),
            "grid" => Ok(LayoutKind::Grid),
            other => Err(format!("unknown layout '{other}' (expected circle or grid)")),
        }
    }
}

/// Camera that frames every given position with `fit_padding` on each side.
/// Returns `None` when there is nothing placed to frame.
pub fn fit_to_view<'a, I>(positions: I, settings: &LayoutSettings) -> Option<Viewport>
where
    I: IntoIterator<Item = &'a Position>,
{
    let mut iter = positions.into_iter();
    let first = iter.next()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in iter {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    let canvas = settings.canvas;
    let avail_w = (canvas.width - 2.0 * settings.fit_padding).max(1.0);
    let avail_h = (canvas.height - 2.0 * settings.fit_padding).max(1.0);
    let (bw, bh) = (max_x - min_x, max_y - min_y);

    let zoom_w = if bw > f32::EPSILON { avail_w / bw } else { f32::INFINITY };
    let zoom_h = if bh > f32::EPSILON { avail_h / bh } else { f32::INFINITY };
    let zoom = zoom_w.min(zoom_h).clamp(settings.min_zoom, settings.max_zoom);

    let (cx, cy) = ((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);
    let pan = Position::new(canvas.width / 2.0 - zoom * cx, canvas.height / 2.0 - zoom * cy);
    Some(Viewport { zoom, pan })
}

/// Runs `strategy` over every node in the store and writes the resulting positions.
/// Returns how many nodes were placed.
pub fn apply_layout(store: &mut NetworkGraph, strategy: &dyn LayoutStrategy, settings: &LayoutSettings) -> usize {
    let ids = store.node_ids();
    let positions = strategy.assign(&ids, settings);
    let mut placed = 0;
    for id in &ids {
        if let Some(position) = positions.get(id) {
            if store.set_position(id, *position).is_ok() {
                placed += 1;
            }
        }
    }
    tracing::debug!(layout = strategy.name(), placed, "layout applied");
    placed
}

/// Frames every placed node. Leaves the camera alone when nothing is placed.
pub fn apply_fit(store: &mut NetworkGraph, settings: &LayoutSettings) -> bool {
    let positions: Vec<Position> = store.positions().into_values().collect();
    match fit_to_view(positions.iter(), settings) {
        Some(viewport) => {
            store.set_viewport(viewport);
            true
        }
        None => false,
    }
}
