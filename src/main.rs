//! `fragmux` server binary.
//!
//! Accepts fragment connections over TCP and logs every reassembled frame.

mod cli;

use std::sync::Arc;

use clap::Parser;
use fragmux::{config::EngineConfig, reassembly::Frame, server::FrameServer};
use tracing::info;

fn engine_config(cli: &cli::Cli) -> EngineConfig {
    let defaults = EngineConfig::default();
    EngineConfig {
        workers: cli.workers.unwrap_or(defaults.workers),
        queue_capacity: cli.queue_capacity.unwrap_or(defaults.queue_capacity),
        max_connections: cli.max_connections.unwrap_or(defaults.max_connections),
        max_frame_size: cli.max_frame_size.unwrap_or(defaults.max_frame_size),
        max_fragment_payload: cli
            .max_fragment_payload
            .unwrap_or(defaults.max_fragment_payload),
    }
}

fn log_frame(frame: Frame) {
    info!(
        size = frame.size(),
        pts = ?frame.pts(),
        broken = frame.is_broken(),
        source = %frame.source(),
        content = %frame.content(),
        frame_number = frame.frame_number(),
        "frame received"
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Applications embedding the library should install their own subscriber.
    tracing_subscriber::fmt::init();

    let cli = cli::Cli::parse();

    #[cfg(feature = "metrics")]
    if let Some(addr) = cli.metrics_listen {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()?;
        info!(%addr, "serving metrics");
    }
    #[cfg(not(feature = "metrics"))]
    if cli.metrics_listen.is_some() {
        tracing::warn!("built without the metrics feature; ignoring --metrics-listen");
    }

    let config = engine_config(&cli);
    let server = FrameServer::from_config(&config, Arc::new(log_frame))?.bind(cli.listen)?;
    server.run().await?;
    Ok(())
}
