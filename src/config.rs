/*!
Application configuration.

Defaults, then an optional TOML file, then environment variables and command line flags
(clap resolves those two, flags win).
*/

use std::{path::{Path, PathBuf}, time::Duration};

use clap::Parser;
use serde::Deserialize;
use thiserror::Error;

use crate::topology::{
    layout::{Canvas, LayoutSettings},
    runtime::RuntimeConfig,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid duration for {field} ('{value}'): {reason}")]
    InvalidDuration {
        field: &'static str,
        value: String,
        reason: String,
    },
}

/// Command line for the `lab-topology` binary.
#[derive(Parser, Debug, Default, Clone)]
#[command(name = "lab-topology")]
#[command(about = "Live topology view of a network emulation lab")]
pub struct Args {
    /// TOML config file
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Base URL of the lab backend
    #[arg(long, env = "LAB_TOPOLOGY_API_URL")]
    pub api_url: Option<String>,

    /// Poll interval, e.g. "5s" or "1500ms"
    #[arg(long, env = "LAB_TOPOLOGY_POLL_INTERVAL")]
    pub poll_interval: Option<String>,

    /// Apply every poll response, even ones that arrive out of order
    #[arg(long)]
    pub keep_stale_ticks: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_url: String,
    pub poll_interval: String,
    pub request_timeout: String,
    pub default_interface: String,
    pub canvas: Canvas,
    pub fit_padding: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub node_spacing: f32,
    pub discard_stale_ticks: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let layout = LayoutSettings::default();
        Self {
            api_url: "http://localhost:8000".to_string(),
            poll_interval: "5s".to_string(),
            request_timeout: "10s".to_string(),
            default_interface: "ge-0/0/0".to_string(),
            canvas: layout.canvas,
            fit_padding: layout.fit_padding,
            min_zoom: layout.min_zoom,
            max_zoom: layout.max_zoom,
            node_spacing: layout.node_spacing,
            discard_stale_ticks: true,
        }
    }
}

impl AppConfig {
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_args(args);
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn apply_args(&mut self, args: &Args) {
        if let Some(url) = &args.api_url {
            self.api_url = url.clone();
        }
        if let Some(interval) = &args.poll_interval {
            self.poll_interval = interval.clone();
        }
        if args.keep_stale_ticks {
            self.discard_stale_ticks = false;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.poll_interval()?;
        self.request_timeout()?;
        Ok(())
    }

    pub fn poll_interval(&self) -> Result<Duration, ConfigError> {
        parse_duration("poll_interval", &self.poll_interval)
    }

    pub fn request_timeout(&self) -> Result<Duration, ConfigError> {
        parse_duration("request_timeout", &self.request_timeout)
    }

    pub fn layout_settings(&self) -> LayoutSettings {
        LayoutSettings {
            canvas: self.canvas,
            node_spacing: self.node_spacing,
            fit_padding: self.fit_padding,
            min_zoom: self.min_zoom,
            max_zoom: self.max_zoom,
        }
    }

    pub fn runtime_config(&self) -> Result<RuntimeConfig, ConfigError> {
        Ok(RuntimeConfig {
            poll_interval: self.poll_interval()?,
            default_interface: self.default_interface.clone(),
        })
    }
}

fn parse_duration(field: &'static str, value: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidDuration {
        field,
        value: value.to_string(),
        reason,
    };
    let duration = humantime::parse_duration(value).map_err(|e| invalid(e.to_string()))?;
    if duration.is_zero() {
        return Err(invalid("must be greater than zero".to_string()));
    }
    Ok(duration)
}
