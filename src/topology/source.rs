/*!
Snapshot feed interface.

This module defines:
- `Snapshot`: one complete poll response (every device and every link, never a delta).
- `TopologyError`: minimal error type for snapshot retrieval.
- `SnapshotSource`: an async trait that returns full snapshots for the topology view.

Adapters (e.g. the lab REST backend) implement `SnapshotSource` and encapsulate how they
obtain and shape the data.
*/

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::network::{device::Device, link::Link};

/// Error type for snapshot retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    /// Underlying transport error (HTTP, connection refused, timeout).
    #[error("acquisition error: {0}")]
    Acquisition(String),
    /// The backend answered but the payload could not be understood.
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Convenience result alias for topology operations.
pub type TopologyResult<T> = Result<T, TopologyError>;

/// Full replacement of the backend's device and link sets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub devices: Vec<Device>,
    pub links: Vec<Link>,
}

impl Snapshot {
    pub fn new(devices: Vec<Device>, links: Vec<Link>) -> Self {
        Self { devices, links }
    }
}

/// A small async interface for providing snapshots to the topology view.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch_snapshot(&self) -> TopologyResult<Snapshot>;
}
