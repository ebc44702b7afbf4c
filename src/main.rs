//! kube-testenv - run a disposable control plane from the command line.
//!
//! Starts etcd and kube-apiserver, prints the API server URL, and tears
//! everything down on Ctrl-C.

use clap::Parser;
use std::path::PathBuf;

use kube_testenv::{Config, ControlPlane};

#[derive(Debug, Parser)]
#[command(name = "kube-testenv", about = "Run an ephemeral etcd + kube-apiserver")]
struct Args {
    /// JSON configuration file.
    #[arg(long, env = "KUBE_TESTENV_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load configuration
    let config = match &args.config {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };

    // Initialize observability
    kube_testenv::observability::init_tracing_with(&config.observability);

    let mut control_plane = ControlPlane::from_config(&config);
    if let Err(e) = control_plane.start().await {
        tracing::error!("control plane failed to start: {}", e);
        // A timed-out start leaves processes behind; reclaim them.
        if let Err(stop_err) = control_plane.stop().await {
            tracing::warn!("cleanup after failed start: {}", stop_err);
        }
        return Err(e.into());
    }

    println!("{}", control_plane.api_server_url()?);
    tracing::info!("control plane ready; press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;

    tracing::info!("shutting down control plane");
    control_plane.stop().await?;
    Ok(())
}
