/*!
Collaborator boundaries the topology core talks to but does not own.

- `CommandEmitter`: performs link creation and device lifecycle calls. The core fires and
  forgets; a failure only means the next snapshot does not show the change.
- `InterfacePrompt`: asks the user for a line of text with a default, and may be cancelled.
- `SelectionObserver`: optional notifications for the surrounding dashboard.
*/

use std::{fmt::Display, str::FromStr};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::network::{
    device::{Device, DeviceId},
    link::{Link, LinkRequest},
};

#[derive(Debug, Clone, Error)]
pub enum CommandError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("backend rejected command ({status}): {detail}")]
    Rejected { status: u16, detail: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceAction {
    Start,
    Stop,
    Restart,
    Delete,
}

impl DeviceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceAction::Start => "start",
            DeviceAction::Stop => "stop",
            DeviceAction::Restart => "restart",
            DeviceAction::Delete => "delete",
        }
    }
}

impl Display for DeviceAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DeviceAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(DeviceAction::Start),
            "stop" => Ok(DeviceAction::Stop),
            "restart" => Ok(DeviceAction::Restart),
            "delete" => Ok(DeviceAction::Delete),
            other => Err(format!("unknown device action '{other}'")),
        }
    }
}

#[async_trait]
pub trait CommandEmitter: Send + Sync {
    async fn request_link_creation(&self, request: LinkRequest) -> Result<(), CommandError>;
    async fn request_device_action(&self, device: &DeviceId, action: DeviceAction) -> Result<(), CommandError>;
}

/// "Ask the user for text, default provided, cancellable."
/// `None` means the user abandoned the question.
#[async_trait]
pub trait InterfacePrompt: Send + Sync {
    async fn ask(&self, question: &str, default: &str) -> Option<String>;
}

pub trait SelectionObserver: Send + Sync {
    fn on_node_selected(&self, _device: &Device) {}
    fn on_edge_selected(&self, _link: &Link) {}
}
