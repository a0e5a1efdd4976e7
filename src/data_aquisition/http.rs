/*!
REST client for the lab backend.

Reads routers and links for each poll and forwards link creation and device lifecycle
commands. Wire records are kept private to this module and mapped onto the graph types
before they leave it.
*/

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    network::{
        device::{Device, DeviceId, DeviceState},
        link::{Link, LinkRequest, LinkStatus},
    },
    topology::{
        command::{CommandEmitter, CommandError, DeviceAction},
        source::{Snapshot, SnapshotSource, TopologyError, TopologyResult},
    },
};

/// Router record as listed by `GET /api/routers`.
#[derive(Debug, Clone, Deserialize)]
struct RouterRecord {
    name: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    memory_mb: u64,
    #[serde(default)]
    vcpus: u32,
    #[serde(default)]
    router_type: Option<String>,
}

impl From<RouterRecord> for Device {
    fn from(record: RouterRecord) -> Self {
        let device = Device::new(record.name)
            .with_state(DeviceState::from_backend(&record.state))
            .with_resources(record.memory_mb, record.vcpus);
        match record.router_type {
            Some(kind) if !kind.is_empty() => device.with_kind(kind),
            _ => device,
        }
    }
}

/// Link record as listed by `GET /api/links`.
#[derive(Debug, Clone, Deserialize)]
struct LinkRecord {
    id: String,
    source_router: String,
    source_interface: String,
    target_router: String,
    target_interface: String,
    #[serde(default = "default_link_status")]
    status: LinkStatus,
}

fn default_link_status() -> LinkStatus {
    LinkStatus::Down
}

impl From<LinkRecord> for Link {
    fn from(record: LinkRecord) -> Self {
        Link::new(
            record.id,
            record.source_router,
            record.source_interface,
            record.target_router,
            record.target_interface,
            record.status,
        )
    }
}

/// Both list endpoints answer either with a bare array or an envelope object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Routers { routers: Vec<T> },
    Links { links: Vec<T> },
    Bare(Vec<T>),
}

impl<T> Listing<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Routers { routers } => routers,
            Listing::Links { links } => links,
            Listing::Bare(items) => items,
        }
    }
}

/// Body of `POST /api/links`.
#[derive(Debug, Serialize)]
struct LinkCreateBody<'a> {
    source_router: &'a str,
    source_interface: &'a str,
    target_router: &'a str,
    target_interface: &'a str,
}

impl<'a> From<&'a LinkRequest> for LinkCreateBody<'a> {
    fn from(request: &'a LinkRequest) -> Self {
        Self {
            source_router: request.source_device_id.as_str(),
            source_interface: &request.source_interface_name,
            target_router: request.target_device_id.as_str(),
            target_interface: &request.target_interface_name,
        }
    }
}

/// Command responses may report failure in the body with a 200 status.
#[derive(Debug, Default, Deserialize)]
struct CommandReply {
    success: Option<bool>,
    message: Option<String>,
    detail: Option<String>,
}

pub(crate) fn parse_routers(body: &str) -> TopologyResult<Vec<Device>> {
    let listing: Listing<RouterRecord> =
        serde_json::from_str(body).map_err(|e| TopologyError::Protocol(format!("router list: {e}")))?;
    Ok(listing.into_vec().into_iter().map(Device::from).collect())
}

pub(crate) fn parse_links(body: &str) -> TopologyResult<Vec<Link>> {
    let listing: Listing<LinkRecord> =
        serde_json::from_str(body).map_err(|e| TopologyError::Protocol(format!("link list: {e}")))?;
    Ok(listing.into_vec().into_iter().map(Link::from).collect())
}

fn check_reply(status: StatusCode, body: &str) -> Result<(), CommandError> {
    let reply: CommandReply = serde_json::from_str(body).unwrap_or_default();
    let detail = reply
        .detail
        .or(reply.message)
        .unwrap_or_else(|| body.chars().take(200).collect());

    if !status.is_success() || reply.success == Some(false) {
        return Err(CommandError::Rejected { status: status.as_u16(), detail });
    }
    Ok(())
}

/// HTTP adapter for the lab backend.
pub struct LabApiClient {
    http: Client,
    base_url: String,
}

impl LabApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_text(&self, path: &str) -> TopologyResult<String> {
        let response = self
            .http
            .get(self.url(path))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| TopologyError::Acquisition(format!("GET {path}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TopologyError::Acquisition(format!("GET {path} returned {status}")));
        }
        response
            .text()
            .await
            .map_err(|e| TopologyError::Acquisition(format!("GET {path}: {e}")))
    }

    async fn send_command<B: Serialize + ?Sized>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<(), CommandError> {
        let mut request = self.http.request(method.clone(), self.url(path));
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request
            .send()
            .await
            .map_err(|e| CommandError::Transport(format!("{method} {path}: {e}")))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        check_reply(status, &text)?;
        debug!(%method, path, %status, "command accepted");
        Ok(())
    }
}

#[async_trait]
impl SnapshotSource for LabApiClient {
    async fn fetch_snapshot(&self) -> TopologyResult<Snapshot> {
        let (routers, links) = tokio::try_join!(self.get_text("/api/routers"), self.get_text("/api/links"))?;
        let snapshot = Snapshot::new(parse_routers(&routers)?, parse_links(&links)?);
        debug!(devices = snapshot.devices.len(), links = snapshot.links.len(), "snapshot fetched");
        Ok(snapshot)
    }
}

#[async_trait]
impl CommandEmitter for LabApiClient {
    async fn request_link_creation(&self, request: LinkRequest) -> Result<(), CommandError> {
        info!(%request, "creating link");
        let body = LinkCreateBody::from(&request);
        self.send_command(reqwest::Method::POST, "/api/links", Some(&body)).await
    }

    async fn request_device_action(&self, device: &DeviceId, action: DeviceAction) -> Result<(), CommandError> {
        info!(%device, %action, "sending device command");
        let (method, path) = match action {
            DeviceAction::Delete => (reqwest::Method::DELETE, format!("/api/routers/{device}")),
            other => (reqwest::Method::POST, format!("/api/routers/{device}/{other}")),
        };
        self.send_command::<()>(method, &path, None).await
    }
}
