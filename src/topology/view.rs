/*!
The topology view: single owner of the graph store, the reconciler and the interaction machine.

Every input (snapshot results, pointer events, layout and device commands) arrives as a
`ViewEvent` and is applied to completion before the next one, so reconcile passes and
interaction transitions never interleave.
*/

use tracing::{debug, info, warn};

use crate::{
    network::{device::DeviceId, network_graph::NetworkGraph, node::Position},
    topology::{
        command::DeviceAction,
        interaction::{Effect, InteractionEvent, InteractionMachine, TapTarget},
        layout::{LayoutKind, LayoutSettings, apply_fit, apply_layout},
        reconcile::{ReconcileReport, Reconciler},
        selection::DetailPanel,
        source::{Snapshot, TopologyResult},
    },
};

#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    /// Result of the poll issued as `generation` (strictly increasing per poll).
    Snapshot {
        generation: u64,
        result: TopologyResult<Snapshot>,
    },
    Interaction(InteractionEvent),
    Drag {
        node: DeviceId,
        position: Position,
    },
    Layout(LayoutKind),
    FitView,
    InterfacesResolved {
        source_interface: Option<String>,
        target_interface: Option<String>,
    },
    DeviceCommand {
        device: DeviceId,
        action: DeviceAction,
    },
}

impl ViewEvent {
    pub fn tap(target: TapTarget) -> Self {
        ViewEvent::Interaction(InteractionEvent::Tap(target))
    }

    pub fn toggle_connect() -> Self {
        ViewEvent::Interaction(InteractionEvent::ToggleConnect)
    }
}

pub struct TopologyView {
    store: NetworkGraph,
    reconciler: Reconciler,
    machine: InteractionMachine,
    discard_stale_ticks: bool,
    last_generation: u64,
    last_report: Option<ReconcileReport>,
}

impl Default for TopologyView {
    fn default() -> Self {
        Self::new(LayoutSettings::default(), true)
    }
}

impl TopologyView {
    pub fn new(settings: LayoutSettings, discard_stale_ticks: bool) -> Self {
        Self {
            store: NetworkGraph::default(),
            reconciler: Reconciler::new(settings),
            machine: InteractionMachine::default(),
            discard_stale_ticks,
            last_generation: 0,
            last_report: None,
        }
    }

    pub fn store(&self) -> &NetworkGraph {
        &self.store
    }

    /// Mutable access for registering render sinks before the view goes live.
    pub fn store_mut(&mut self) -> &mut NetworkGraph {
        &mut self.store
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn machine(&self) -> &InteractionMachine {
        &self.machine
    }

    pub fn connect_mode_enabled(&self) -> bool {
        self.machine.connect_mode_enabled(&self.store)
    }

    pub fn detail_panel(&self) -> Option<DetailPanel> {
        if self.connect_mode_enabled() {
            return None;
        }
        DetailPanel::project(&self.store)
    }

    pub fn last_report(&self) -> Option<&ReconcileReport> {
        self.last_report.as_ref()
    }

    pub fn handle(&mut self, event: ViewEvent) -> Vec<Effect> {
        match event {
            ViewEvent::Snapshot { generation, result } => {
                self.apply_snapshot(generation, result);
                Vec::new()
            }
            ViewEvent::Interaction(event) => self.machine.handle(&mut self.store, event),
            ViewEvent::Drag { node, position } => {
                if let Err(e) = self.store.set_position(&node, position) {
                    debug!("drag dropped: {e}");
                }
                Vec::new()
            }
            ViewEvent::Layout(kind) => {
                apply_layout(&mut self.store, kind.strategy(), self.reconciler.settings());
                Vec::new()
            }
            ViewEvent::FitView => {
                apply_fit(&mut self.store, self.reconciler.settings());
                Vec::new()
            }
            ViewEvent::InterfacesResolved {
                source_interface,
                target_interface,
            } => self
                .machine
                .resolve_interfaces(source_interface, target_interface)
                .into_iter()
                .collect(),
            ViewEvent::DeviceCommand { device, action } => {
                info!(%device, %action, "device command requested");
                vec![Effect::DeviceCommand(device, action)]
            }
        }
    }

    fn apply_snapshot(&mut self, generation: u64, result: TopologyResult<Snapshot>) {
        if self.discard_stale_ticks && generation <= self.last_generation {
            debug!(generation, last = self.last_generation, "discarding stale snapshot");
            return;
        }

        match result {
            Ok(snapshot) => {
                let report = self.reconciler.reconcile_snapshot(&mut self.store, &snapshot);
                if !report.is_noop() {
                    info!(generation, summary = %self.store, "snapshot applied");
                }
                self.last_generation = self.last_generation.max(generation);
                self.last_report = Some(report);
            }
            Err(e) => {
                // Keep the last known graph and wait for the next tick
                warn!(generation, "snapshot poll failed: {e}");
            }
        }
    }
}
