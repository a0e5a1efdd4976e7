use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Stable identity of a managed device. The lab backend uses the router name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Lifecycle state of a device as reported by the hypervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceState {
    Running,
    Starting,
    Stopping,
    Stopped,
}

impl DeviceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceState::Running => "running",
            DeviceState::Starting => "starting",
            DeviceState::Stopping => "stopping",
            DeviceState::Stopped => "stopped",
        }
    }

    /// Maps hypervisor state names onto the four lifecycle states.
    /// Anything not recognisably up or in transition counts as stopped.
    pub fn from_backend(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "running" => DeviceState::Running,
            "starting" => DeviceState::Starting,
            "stopping" | "shutdown" => DeviceState::Stopping,
            _ => DeviceState::Stopped,
        }
    }
}

impl Display for DeviceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// Manual impls: the backend speaks libvirt state names ("shut off", "shutoff", ...),
// which all have to land on one of our four states.

impl Serialize for DeviceState {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DeviceState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de> {
        let s = String::deserialize(deserializer)?;
        Ok(DeviceState::from_backend(&s))
    }
}

/// Opaque device flavour tag (vsrx, vqfx, ...). Only ever displayed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceKind(String);

impl DeviceKind {
    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DeviceKind {
    fn default() -> Self {
        Self::new("juniper")
    }
}

impl Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A managed network-emulation instance, read-only to the topology core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub display_label: String,
    pub state: DeviceState,
    pub memory_mb: u64,
    pub vcpus: u32,
    pub kind: DeviceKind,
}

impl Device {
    /// Creates a stopped device with no resources, labelled by its id.
    pub fn new(id: impl Into<String>) -> Self {
        let id = DeviceId::new(id);
        Self {
            display_label: id.to_string(),
            id,
            state: DeviceState::Stopped,
            memory_mb: 0,
            vcpus: 0,
            kind: DeviceKind::default(),
        }
    }

    pub fn with_state(mut self, state: DeviceState) -> Self {
        self.state = state;
        self
    }

    pub fn with_resources(mut self, memory_mb: u64, vcpus: u32) -> Self {
        self.memory_mb = memory_mb;
        self.vcpus = vcpus;
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = DeviceKind::new(kind);
        self
    }
}

impl Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]", self.display_label, self.state)?;
        write!(f, "\nType: {}", self.kind)?;
        write!(f, "\nMemory: {} MB", self.memory_mb)?;
        write!(f, "\nvCPUs: {}", self.vcpus)
    }
}
