/*!
Topology module

Keeps a live graph of lab devices in sync with the backend and turns pointer input into
selection changes and link-creation requests.

Structure:
- `source`: `SnapshotSource`, the async trait every poll goes through, plus `Snapshot` and
            the feed error type.
- `command`: outbound capabilities (`CommandEmitter`, `InterfacePrompt`, `SelectionObserver`).
- `selection`: the selection state and the detail panels projected from it.
- `reconcile`: folds each snapshot into the graph store.
- `interaction`: the tap/connect state machine.
- `layout`: circle and grid placement, fit-to-view.
- `view`: `TopologyView`, the single owner of all of the above.
- `runtime`: the event loop and poll timer around a `TopologyView`.
*/

pub mod command;
pub mod interaction;
pub mod layout;
pub mod reconcile;
pub mod runtime;
pub mod selection;
pub mod source;
pub mod view;

pub use command::{CommandEmitter, CommandError, DeviceAction, InterfacePrompt, SelectionObserver};
pub use runtime::{Collaborators, RuntimeConfig, ViewHandle};
pub use source::{Snapshot, SnapshotSource, TopologyError, TopologyResult};
pub use view::{TopologyView, ViewEvent};
