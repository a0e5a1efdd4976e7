use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::network::device::DeviceId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(String);

impl LinkId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for LinkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LinkId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkStatus {
    Up,
    Down,
}

impl LinkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStatus::Up => "up",
            LinkStatus::Down => "down",
        }
    }
}

impl Display for LinkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for LinkStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LinkStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de> {
        let s = String::deserialize(deserializer)?;
        // Backend default is "down"; treat anything unknown the same way
        if s.eq_ignore_ascii_case("up") {
            Ok(LinkStatus::Up)
        } else {
            Ok(LinkStatus::Down)
        }
    }
}

/// A declared connection between two device interfaces.
/// Endpoints never change over a link's lifetime, only `status` does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    pub source_device_id: DeviceId,
    pub source_interface_name: String,
    pub target_device_id: DeviceId,
    pub target_interface_name: String,
    pub status: LinkStatus,
}

impl Link {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        source_interface: impl Into<String>,
        target: impl Into<String>,
        target_interface: impl Into<String>,
        status: LinkStatus,
    ) -> Self {
        Self {
            id: LinkId::new(id),
            source_device_id: DeviceId::new(source),
            source_interface_name: source_interface.into(),
            target_device_id: DeviceId::new(target),
            target_interface_name: target_interface.into(),
            status,
        }
    }

    /// Label drawn along the edge: both interface names.
    pub fn label(&self) -> String {
        format!("{} ↔ {}", self.source_interface_name, self.target_interface_name)
    }
}

/// Payload handed to the command emitter once both endpoints and interfaces are known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRequest {
    pub source_device_id: DeviceId,
    pub source_interface_name: String,
    pub target_device_id: DeviceId,
    pub target_interface_name: String,
}

impl Display for LinkRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} -> {}:{}",
            self.source_device_id,
            self.source_interface_name,
            self.target_device_id,
            self.target_interface_name
        )
    }
}
