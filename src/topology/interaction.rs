/*!
Pointer interaction state machine.

Subscribes once to a generic tap stream and dispatches on the current `SelectionState`.
Connect mode is on exactly while the selection is one of the connect variants, so the
toggle and the selection can never disagree.

Link creation is two-stage: once both endpoints are picked the machine asks for the
interface names through `Effect::PromptInterfaces`, and only a completed pair of answers
turns into `Effect::CreateLink`. While the answers are outstanding every other interaction
is ignored.
*/

use tracing::{debug, info};

use crate::{
    network::{
        device::{Device, DeviceId},
        link::{Link, LinkId, LinkRequest},
        network_graph::NetworkGraph,
    },
    topology::{command::DeviceAction, selection::SelectionState},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TapTarget {
    Node(DeviceId),
    Edge(LinkId),
    Background,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionEvent {
    ToggleConnect,
    Tap(TapTarget),
    /// The detail panel's close button.
    CloseDetails,
}

/// Both endpoints of a link that is waiting for its interface names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLink {
    pub source: DeviceId,
    pub target: DeviceId,
}

/// Work the surrounding runtime has to carry out on behalf of the view.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    NodeSelected(Device),
    EdgeSelected(Link),
    PromptInterfaces(PendingLink),
    CreateLink(LinkRequest),
    DeviceCommand(DeviceId, DeviceAction),
}

#[derive(Debug, Default)]
pub struct InteractionMachine {
    in_flight: Option<PendingLink>,
}

impl InteractionMachine {
    pub fn connect_mode_enabled(&self, store: &NetworkGraph) -> bool {
        store.selection().is_connect_mode()
    }

    /// Endpoints currently waiting on interface names, if any.
    pub fn in_flight(&self) -> Option<&PendingLink> {
        self.in_flight.as_ref()
    }

    pub fn handle(&mut self, store: &mut NetworkGraph, event: InteractionEvent) -> Vec<Effect> {
        if let Some(pending) = &self.in_flight {
            debug!(?event, source = %pending.source, target = %pending.target, "link creation in flight, ignoring interaction");
            return Vec::new();
        }

        match event {
            InteractionEvent::ToggleConnect => {
                self.toggle_connect(store);
                Vec::new()
            }
            InteractionEvent::Tap(target) => self.tap(store, target),
            InteractionEvent::CloseDetails => {
                if matches!(
                    store.selection(),
                    SelectionState::NodeSelected(_) | SelectionState::EdgeSelected(_)
                ) {
                    store.set_selection(SelectionState::Idle);
                }
                Vec::new()
            }
        }
    }

    fn toggle_connect(&mut self, store: &mut NetworkGraph) {
        let next = if store.selection().is_connect_mode() {
            SelectionState::Idle
        } else {
            SelectionState::ConnectPendingFirst
        };
        info!(connect_mode = next.is_connect_mode(), "connect mode toggled");
        store.set_selection(next);
    }

    fn tap(&mut self, store: &mut NetworkGraph, target: TapTarget) -> Vec<Effect> {
        match (store.selection().clone(), target) {
            // Connect mode
            (SelectionState::ConnectPendingFirst, TapTarget::Node(id)) => {
                if store.contains_node(&id) {
                    debug!(source = %id, "connect source picked");
                    store.set_selection(SelectionState::ConnectPendingSecond(id));
                }
                Vec::new()
            }
            (SelectionState::ConnectPendingSecond(first), TapTarget::Node(id)) => {
                if id == first {
                    debug!(device = %id, "cannot connect a router to itself");
                    return Vec::new();
                }
                if !store.contains_node(&id) {
                    return Vec::new();
                }
                info!(source = %first, target = %id, "connect target picked, asking for interfaces");
                store.set_selection(SelectionState::Idle);
                let pending = PendingLink { source: first, target: id };
                self.in_flight = Some(pending.clone());
                vec![Effect::PromptInterfaces(pending)]
            }
            (SelectionState::ConnectPendingFirst | SelectionState::ConnectPendingSecond(_), _) => Vec::new(),

            // Browse mode
            (_, TapTarget::Node(id)) => match store.node(&id) {
                Some(node) => {
                    let device = node.device.clone();
                    store.set_selection(SelectionState::NodeSelected(id));
                    vec![Effect::NodeSelected(device)]
                }
                None => Vec::new(),
            },
            (_, TapTarget::Edge(id)) => match store.edge(&id) {
                Some(edge) => {
                    let link = edge.link.clone();
                    store.set_selection(SelectionState::EdgeSelected(id));
                    vec![Effect::EdgeSelected(link)]
                }
                None => Vec::new(),
            },
            (_, TapTarget::Background) => {
                store.set_selection(SelectionState::Idle);
                Vec::new()
            }
        }
    }

    /// Completes the interface prompts. A missing or blank answer abandons the whole attempt.
    pub fn resolve_interfaces(
        &mut self,
        source_interface: Option<String>,
        target_interface: Option<String>,
    ) -> Option<Effect> {
        let pending = self.in_flight.take()?;
        let answer = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        match (answer(source_interface), answer(target_interface)) {
            (Some(source_interface_name), Some(target_interface_name)) => {
                let request = LinkRequest {
                    source_device_id: pending.source,
                    source_interface_name,
                    target_device_id: pending.target,
                    target_interface_name,
                };
                info!(%request, "link creation requested");
                Some(Effect::CreateLink(request))
            }
            _ => {
                info!(source = %pending.source, target = %pending.target, "link creation cancelled");
                None
            }
        }
    }
}
