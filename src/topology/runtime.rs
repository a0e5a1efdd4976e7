/*!
Event loop for a live topology view.

The view is owned by one task. Snapshot results, pointer events and prompt answers are all
queued onto the same channel and applied one at a time. The poll timer is a scoped task
that is aborted when the loop ends; fetches, prompts and commands already in flight are
allowed to finish, but their results go nowhere once the loop is gone.
*/

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tracing::{debug, info, warn};

use crate::topology::{
    command::{CommandEmitter, InterfacePrompt, SelectionObserver},
    interaction::{Effect, PendingLink},
    source::SnapshotSource,
    view::{TopologyView, ViewEvent},
};

/// External collaborators the loop talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub source: Arc<dyn SnapshotSource>,
    pub emitter: Arc<dyn CommandEmitter>,
    pub prompt: Arc<dyn InterfacePrompt>,
    pub observer: Option<Arc<dyn SelectionObserver>>,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub poll_interval: Duration,
    /// Pre-filled answer for the interface prompts.
    pub default_interface: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            default_interface: "ge-0/0/0".to_string(),
        }
    }
}

type Inspector = Box<dyn FnOnce(&TopologyView) + Send>;

enum Message {
    View(ViewEvent),
    Inspect(Inspector),
    Shutdown,
}

/// Poll timer bound to the loop's lifetime.
struct PollHandle(JoinHandle<()>);

impl PollHandle {
    fn spawn(source: Arc<dyn SnapshotSource>, tx: mpsc::WeakUnboundedSender<Message>, period: Duration) -> Self {
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut generation = 0u64;
            loop {
                // First tick completes immediately: poll on mount
                ticker.tick().await;
                generation += 1;
                let source = source.clone();
                let tx = tx.clone();
                // A slow response must not hold back the next tick
                tokio::spawn(async move {
                    let result = source.fetch_snapshot().await;
                    match tx.upgrade() {
                        Some(tx) => {
                            let _ = tx.send(Message::View(ViewEvent::Snapshot { generation, result }));
                        }
                        None => debug!(generation, "view closed, dropping snapshot"),
                    }
                });
            }
        });
        Self(task)
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Handle to a running view. Dropping it tears the view down.
pub struct ViewHandle {
    tx: mpsc::UnboundedSender<Message>,
    task: JoinHandle<TopologyView>,
}

impl ViewHandle {
    /// Starts the event loop and the poll timer for `view`.
    pub fn spawn(view: TopologyView, collaborators: Collaborators, config: RuntimeConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let weak = tx.downgrade();
        let task = tokio::spawn(run(view, rx, weak, collaborators, config));
        Self { tx, task }
    }

    /// Queues an event. Returns `false` once the loop has stopped.
    pub fn send(&self, event: ViewEvent) -> bool {
        self.tx.send(Message::View(event)).is_ok()
    }

    /// Runs `f` against the view between two events and returns its result.
    pub async fn inspect<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&TopologyView) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply, answer) = oneshot::channel();
        let inspector: Inspector = Box::new(move |view| {
            let _ = reply.send(f(view));
        });
        self.tx.send(Message::Inspect(inspector)).ok()?;
        answer.await.ok()
    }

    /// Stops polling and the loop, handing back the final view state.
    pub async fn shutdown(self) -> Option<TopologyView> {
        let _ = self.tx.send(Message::Shutdown);
        self.task.await.ok()
    }
}

async fn run(
    mut view: TopologyView,
    mut rx: mpsc::UnboundedReceiver<Message>,
    tx: mpsc::WeakUnboundedSender<Message>,
    collaborators: Collaborators,
    config: RuntimeConfig,
) -> TopologyView {
    info!(interval = ?config.poll_interval, "topology view started");
    let poller = PollHandle::spawn(collaborators.source.clone(), tx.clone(), config.poll_interval);

    while let Some(message) = rx.recv().await {
        match message {
            Message::Shutdown => break,
            Message::Inspect(inspector) => inspector(&view),
            Message::View(event) => {
                for effect in view.handle(event) {
                    execute(effect, &collaborators, &config, &tx);
                }
            }
        }
    }

    drop(poller);
    info!("topology view stopped");
    view
}

fn execute(
    effect: Effect,
    collaborators: &Collaborators,
    config: &RuntimeConfig,
    tx: &mpsc::WeakUnboundedSender<Message>,
) {
    match effect {
        Effect::NodeSelected(device) => {
            if let Some(observer) = &collaborators.observer {
                observer.on_node_selected(&device);
            }
        }
        Effect::EdgeSelected(link) => {
            if let Some(observer) = &collaborators.observer {
                observer.on_edge_selected(&link);
            }
        }
        Effect::PromptInterfaces(pending) => {
            let prompt = collaborators.prompt.clone();
            let default = config.default_interface.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let (source_interface, target_interface) = ask_interfaces(prompt.as_ref(), &pending, &default).await;
                if let Some(tx) = tx.upgrade() {
                    let _ = tx.send(Message::View(ViewEvent::InterfacesResolved {
                        source_interface,
                        target_interface,
                    }));
                }
            });
        }
        Effect::CreateLink(request) => {
            let emitter = collaborators.emitter.clone();
            tokio::spawn(async move {
                let description = request.to_string();
                if let Err(e) = emitter.request_link_creation(request).await {
                    warn!(link = %description, "link creation failed: {e}");
                }
            });
        }
        Effect::DeviceCommand(device, action) => {
            let emitter = collaborators.emitter.clone();
            tokio::spawn(async move {
                if let Err(e) = emitter.request_device_action(&device, action).await {
                    warn!(%device, %action, "device command failed: {e}");
                }
            });
        }
    }
}

/// Asks for both interface names. The second question is skipped once the first is abandoned.
async fn ask_interfaces(
    prompt: &dyn InterfacePrompt,
    pending: &PendingLink,
    default: &str,
) -> (Option<String>, Option<String>) {
    let source = prompt
        .ask(&format!("Enter source interface for {}:", pending.source), default)
        .await;
    if source.as_deref().is_none_or(|s| s.trim().is_empty()) {
        return (source, None);
    }
    let target = prompt
        .ask(&format!("Enter target interface for {}:", pending.target), default)
        .await;
    (source, target)
}
