mod common;

use common::*;
use lab_topology::{
    network::{device::DeviceState, network_graph::StoreChange, node::VisualTag},
    topology::{
        Snapshot, TopologyView, ViewEvent,
        interaction::{Effect, PendingLink, TapTarget},
        selection::SelectionState,
    },
};

fn apply(view: &mut TopologyView, generation: u64, snapshot: Snapshot) {
    view.handle(ViewEvent::Snapshot { generation, result: Ok(snapshot) });
}

fn tap(view: &mut TopologyView, id: &str) -> Vec<Effect> {
    view.handle(ViewEvent::tap(TapTarget::Node(id.into())))
}

#[test]
fn position_preservation_across_field_changes() {
    let mut view = TopologyView::default();
    apply(&mut view, 1, two_routers());
    let before = view.store().positions();

    let changed = Snapshot::new(
        vec![
            device("r1", DeviceState::Stopping).with_resources(8192, 8),
            device("r2", DeviceState::Starting).with_resources(1024, 1),
        ],
        Vec::new(),
    );
    apply(&mut view, 2, changed);
    assert_eq!(view.store().positions(), before);
    assert_eq!(view.store().node(&"r2".into()).unwrap().device.state, DeviceState::Starting);
}

#[test]
fn removal_cleans_dangling_selection() {
    let mut view = TopologyView::default();
    apply(&mut view, 1, two_routers());
    tap(&mut view, "r2");
    assert_eq!(*view.store().selection(), SelectionState::NodeSelected("r2".into()));

    apply(&mut view, 2, Snapshot::new(vec![device("r1", DeviceState::Running)], Vec::new()));
    assert_eq!(*view.store().selection(), SelectionState::Idle);
    assert!(view.detail_panel().is_none());
}

#[test]
fn no_self_links() {
    let mut view = TopologyView::default();
    apply(&mut view, 1, two_routers());
    view.handle(ViewEvent::toggle_connect());
    tap(&mut view, "r1");

    let effects = tap(&mut view, "r1");
    assert!(effects.is_empty());
    assert_eq!(*view.store().selection(), SelectionState::ConnectPendingSecond("r1".into()));
    assert!(view.machine().in_flight().is_none());
}

#[test]
fn cold_start_layout_idempotence() {
    let five = Snapshot::new(
        ["r1", "r2", "r3", "r4", "r5"]
            .iter()
            .map(|id| device(id, DeviceState::Running))
            .collect(),
        Vec::new(),
    );
    let mut view = TopologyView::default();
    apply(&mut view, 1, Snapshot::default());
    apply(&mut view, 2, five.clone());
    assert_eq!(view.reconciler().layout_invocations(), 1);
    apply(&mut view, 3, five);
    assert_eq!(view.reconciler().layout_invocations(), 1);
}

#[test]
fn connect_mode_cancelled_when_source_disappears() {
    let mut view = TopologyView::default();
    apply(&mut view, 1, two_routers());
    view.handle(ViewEvent::toggle_connect());
    tap(&mut view, "r1");
    assert!(view.connect_mode_enabled());

    apply(&mut view, 2, Snapshot::new(vec![device("r2", DeviceState::Stopped)], Vec::new()));
    assert_eq!(*view.store().selection(), SelectionState::Idle);
    assert!(!view.connect_mode_enabled());
    assert!(view.store().nodes().all(|n| n.tag == VisualTag::None));
}

#[test]
fn second_pick_asks_for_interfaces() {
    let mut view = TopologyView::default();
    apply(&mut view, 1, two_routers());
    view.handle(ViewEvent::toggle_connect());
    tap(&mut view, "r1");
    assert_eq!(view.store().node(&"r1".into()).unwrap().tag, VisualTag::ConnectSource);

    let effects = tap(&mut view, "r2");
    assert_eq!(
        effects,
        vec![Effect::PromptInterfaces(PendingLink { source: "r1".into(), target: "r2".into() })]
    );
    assert!(!view.connect_mode_enabled());

    let effects = view.handle(ViewEvent::InterfacesResolved {
        source_interface: Some("ge-0/0/3".into()),
        target_interface: Some("ge-0/0/4".into()),
    });
    assert!(matches!(effects.as_slice(), [Effect::CreateLink(request)]
        if request.source_interface_name == "ge-0/0/3" && request.target_device_id.as_str() == "r2"));
}

#[test]
fn link_on_next_tick_renders_between_routers() {
    let mut view = TopologyView::default();
    apply(&mut view, 1, two_routers());
    let before = view.store().positions();

    let mut next = two_routers();
    next.links.push(link("l1", "r1", "r2"));
    apply(&mut view, 2, next);

    let store = view.store();
    assert_eq!(store.edge_count(), 1);
    let (source, target) = store.edge_endpoints(&"l1".into()).unwrap();
    assert_eq!((source.as_str(), target.as_str()), ("r1", "r2"));
    assert_eq!(store.positions(), before);
    assert_eq!(store.edge(&"l1".into()).unwrap().label(), "ge-0/0/0 ↔ ge-0/0/1");
}

#[test]
fn render_sinks_see_every_change() {
    use std::sync::{Arc, Mutex};

    let changes = Arc::new(Mutex::new(Vec::new()));
    let mut view = TopologyView::default();
    {
        let changes = changes.clone();
        view.store_mut()
            .add_render_sink(move |change: &StoreChange| changes.lock().unwrap().push(change.clone()));
    }
    apply(&mut view, 1, two_routers());
    let revision = view.store().revision();

    let seen = changes.lock().unwrap();
    assert_eq!(seen.len() as u64, revision);
    assert!(seen.iter().any(|c| matches!(c, StoreChange::NodeAdded(id) if id.as_str() == "r1")));
    assert!(seen.iter().any(|c| matches!(c, StoreChange::ViewportChanged)));
}
