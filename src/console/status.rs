use std::fmt::Write;

use crate::{
    network::{device::Device, link::Link},
    topology::{command::SelectionObserver, view::TopologyView},
};

/// Echoes browse-mode selections to the terminal.
pub struct ConsoleObserver;

impl SelectionObserver for ConsoleObserver {
    fn on_node_selected(&self, device: &Device) {
        println!("selected router {device}");
    }

    fn on_edge_selected(&self, link: &Link) {
        println!("selected link {} ({} -- {}, {})", link.id, link.source_device_id, link.target_device_id, link.status);
    }
}

/// Text rendition of the view: header, guidance, detail panel, then every router and link.
pub fn render_status(view: &TopologyView) -> String {
    let store = view.store();
    let mut out = String::new();

    let _ = writeln!(out, "{}", store);
    if view.connect_mode_enabled() {
        let _ = writeln!(out, "[connect mode]");
    }
    if let Some(guidance) = store.selection().guidance() {
        let _ = writeln!(out, "{guidance}");
    }
    if let Some(pending) = view.machine().in_flight() {
        let _ = writeln!(out, "creating link {} → {}", pending.source, pending.target);
    }

    let viewport = store.viewport();
    let _ = writeln!(out, "view: zoom {:.2}, pan {}", viewport.zoom, viewport.pan);

    let mut nodes: Vec<_> = store.nodes().collect();
    nodes.sort_by(|a, b| a.id().cmp(b.id()));
    for node in nodes {
        let unplaced = if node.position.is_none() { " (unplaced)" } else { "" };
        let _ = writeln!(
            out,
            "  {} [{}] at {}{unplaced}",
            node.device.display_label,
            node.device.state,
            node.render_position()
        );
    }

    let mut edges: Vec<_> = store.edges().collect();
    edges.sort_by(|a, b| a.id().cmp(b.id()));
    for edge in edges {
        let marker = if edge.selected { "*" } else { " " };
        let link = &edge.link;
        let _ = writeln!(
            out,
            " {marker}{} -- {}  {}  ({})",
            link.source_device_id,
            link.target_device_id,
            edge.label(),
            link.status
        );
    }

    if let Some(panel) = view.detail_panel() {
        let _ = writeln!(out, "\n{panel}");
    }
    out
}
