#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use lab_topology::{
    network::{
        device::{Device, DeviceId, DeviceState},
        link::{Link, LinkRequest, LinkStatus},
    },
    topology::{
        Collaborators, CommandEmitter, CommandError, DeviceAction, InterfacePrompt, RuntimeConfig,
        SelectionObserver, Snapshot, SnapshotSource, TopologyError, TopologyResult,
    },
};

pub const POLL: Duration = Duration::from_secs(5);

pub fn device(id: &str, state: DeviceState) -> Device {
    Device::new(id).with_state(state)
}

pub fn link(id: &str, source: &str, target: &str) -> Link {
    Link::new(id, source, "ge-0/0/0", target, "ge-0/0/1", LinkStatus::Up)
}

pub fn two_routers() -> Snapshot {
    Snapshot::new(
        vec![device("r1", DeviceState::Running), device("r2", DeviceState::Stopped)],
        Vec::new(),
    )
}

/// One scripted poll answer, optionally delivered late.
pub struct Reply {
    pub result: TopologyResult<Snapshot>,
    pub delay: Duration,
}

impl From<Snapshot> for Reply {
    fn from(snapshot: Snapshot) -> Self {
        Self { result: Ok(snapshot), delay: Duration::ZERO }
    }
}

impl Reply {
    pub fn failure(message: &str) -> Self {
        Self {
            result: Err(TopologyError::Acquisition(message.to_string())),
            delay: Duration::ZERO,
        }
    }

    pub fn late(snapshot: Snapshot, delay: Duration) -> Self {
        Self { result: Ok(snapshot), delay }
    }
}

/// Answers polls from a script; once the script runs out the last snapshot repeats.
#[derive(Default)]
pub struct ScriptedSource {
    script: Mutex<VecDeque<Reply>>,
    last: Mutex<Snapshot>,
    fetches: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(replies.into_iter().collect()),
            ..Self::default()
        })
    }

    pub fn push(&self, reply: impl Into<Reply>) {
        self.script.lock().unwrap().push_back(reply.into());
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotSource for ScriptedSource {
    async fn fetch_snapshot(&self) -> TopologyResult<Snapshot> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(reply) => {
                if !reply.delay.is_zero() {
                    tokio::time::sleep(reply.delay).await;
                }
                if let Ok(snapshot) = &reply.result {
                    *self.last.lock().unwrap() = snapshot.clone();
                }
                reply.result
            }
            None => Ok(self.last.lock().unwrap().clone()),
        }
    }
}

/// Answers interface questions from a script and records what was asked.
#[derive(Default)]
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<Option<String>>>,
    questions: Mutex<Vec<(String, String)>>,
}

impl ScriptedPrompt {
    pub fn answering(answers: &[Option<&str>]) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers.iter().map(|a| a.map(str::to_string)).collect()),
            ..Self::default()
        })
    }

    pub fn questions(&self) -> Vec<(String, String)> {
        self.questions.lock().unwrap().clone()
    }
}

#[async_trait]
impl InterfacePrompt for ScriptedPrompt {
    async fn ask(&self, question: &str, default: &str) -> Option<String> {
        self.questions
            .lock()
            .unwrap()
            .push((question.to_string(), default.to_string()));
        self.answers.lock().unwrap().pop_front().flatten()
    }
}

#[derive(Default)]
pub struct RecordingEmitter {
    pub links: Mutex<Vec<LinkRequest>>,
    pub actions: Mutex<Vec<(DeviceId, DeviceAction)>>,
    pub fail: bool,
}

impl RecordingEmitter {
    pub fn failing() -> Arc<Self> {
        Arc::new(Self { fail: true, ..Self::default() })
    }

    pub fn links(&self) -> Vec<LinkRequest> {
        self.links.lock().unwrap().clone()
    }

    pub fn actions(&self) -> Vec<(DeviceId, DeviceAction)> {
        self.actions.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandEmitter for RecordingEmitter {
    async fn request_link_creation(&self, request: LinkRequest) -> Result<(), CommandError> {
        self.links.lock().unwrap().push(request);
        if self.fail {
            return Err(CommandError::Transport("connection refused".into()));
        }
        Ok(())
    }

    async fn request_device_action(&self, device: &DeviceId, action: DeviceAction) -> Result<(), CommandError> {
        self.actions.lock().unwrap().push((device.clone(), action));
        if self.fail {
            return Err(CommandError::Rejected { status: 404, detail: "Router not found".into() });
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingObserver {
    pub selections: Mutex<Vec<String>>,
}

impl SelectionObserver for RecordingObserver {
    fn on_node_selected(&self, device: &Device) {
        self.selections.lock().unwrap().push(format!("node:{}", device.id));
    }

    fn on_edge_selected(&self, link: &Link) {
        self.selections.lock().unwrap().push(format!("edge:{}", link.id));
    }
}

pub struct Harness {
    pub source: Arc<ScriptedSource>,
    pub prompt: Arc<ScriptedPrompt>,
    pub emitter: Arc<RecordingEmitter>,
    pub observer: Arc<RecordingObserver>,
}

impl Harness {
    pub fn new(source: Arc<ScriptedSource>, prompt: Arc<ScriptedPrompt>, emitter: Arc<RecordingEmitter>) -> Self {
        Self {
            source,
            prompt,
            emitter,
            observer: Arc::new(RecordingObserver::default()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        let observer: Arc<dyn SelectionObserver> = self.observer.clone();
        Collaborators {
            source: self.source.clone(),
            emitter: self.emitter.clone(),
            prompt: self.prompt.clone(),
            observer: Some(observer),
        }
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            poll_interval: POLL,
            default_interface: "ge-0/0/0".to_string(),
        }
    }
}

/// Lets every ready task run (time is paused in these tests).
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
