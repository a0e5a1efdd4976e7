use std::{error::Error, sync::Arc};

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use lab_topology::{
    config::{AppConfig, Args},
    console::{ConsoleCommand, ConsoleObserver, ConsolePrompt, command::HELP, render_status},
    data_aquisition::LabApiClient,
    topology::{Collaborators, SelectionObserver, TopologyView, ViewHandle},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lab_topology=info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = AppConfig::load(&args)?;
    info!(api_url = %config.api_url, poll_interval = %config.poll_interval, "starting");

    let client = Arc::new(LabApiClient::new(&config.api_url, config.request_timeout()?)?);
    let prompt = Arc::new(ConsolePrompt::new());
    let observer: Arc<dyn SelectionObserver> = Arc::new(ConsoleObserver);
    let collaborators = Collaborators {
        source: client.clone(),
        emitter: client,
        prompt: prompt.clone(),
        observer: Some(observer),
    };

    let view = TopologyView::new(config.layout_settings(), config.discard_stale_ticks);
    let handle = ViewHandle::spawn(view, collaborators, config.runtime_config()?);
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            prompt.close();
            break;
        };
        let Some(line) = prompt.offer(line) else {
            continue;
        };
        // The link's questions may not have been asked yet; keep the line for them
        if handle.inspect(|view| view.machine().in_flight().is_some()).await == Some(true) {
            prompt.hold(line);
            continue;
        }
        prompt.clear_held();
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<ConsoleCommand>() {
            Ok(ConsoleCommand::View(event)) => {
                if !handle.send(event) {
                    warn!("view is no longer running");
                    break;
                }
            }
            Ok(ConsoleCommand::Show) => {
                if let Some(status) = handle.inspect(render_status).await {
                    print!("{status}");
                }
            }
            Ok(ConsoleCommand::Help) => println!("{HELP}"),
            Ok(ConsoleCommand::Quit) => break,
            Err(e) => println!("{e}"),
        }
    }

    if let Some(view) = handle.shutdown().await {
        info!(summary = %view.store(), "stopped");
    }
    Ok(())
}
