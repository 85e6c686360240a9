//! Export a before/after pair from the command line.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reveal_export::{ExportConfig, ExportError, ExportOrchestrator, FallbackTransport};
use reveal_models::{ExportEvent, ExportRequest, ExportSession, TransitionKind};
use reveal_render_client::{HttpAnimationEncoder, HttpRenderClient};
use reveal_storage::R2Uploader;

#[derive(Debug, Parser)]
#[command(name = "reveal-export", version, about = "Export a before/after transition")]
struct Cli {
    /// Path to the "before" image
    before: PathBuf,

    /// Path to the "after" image
    after: PathBuf,

    /// Transition style (crossfade, slide, wipe, zoom)
    #[arg(long, default_value = "crossfade")]
    transition: TransitionKind,

    /// Lay a music track under the video
    #[arg(long)]
    music: bool,

    /// Polling budget in milliseconds before falling back to an animation
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// How fallback frames reach the encoder (inline, upload)
    #[arg(long)]
    fallback_transport: Option<FallbackTransport>,

    /// Print UI events as JSON lines instead of progress text
    #[arg(long)]
    json: bool,

    /// Dump Prometheus metrics to stderr when done
    #[arg(long)]
    metrics: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing()?;

    // Install rustls crypto provider (required for TLS/HTTPS)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        warn!("rustls crypto provider already installed");
    }

    let metrics_handle = if cli.metrics {
        Some(
            PrometheusBuilder::new()
                .install_recorder()
                .context("failed to install Prometheus recorder")?,
        )
    } else {
        None
    };

    let mut config = ExportConfig::from_env();
    if let Some(transport) = cli.fallback_transport {
        config.fallback_transport = transport;
    }
    info!("Export config: {:?}", config);

    let uploader = R2Uploader::from_env()
        .await
        .context("failed to create R2 uploader")?;
    let render_client = HttpRenderClient::from_env().context("failed to create render client")?;
    let encoder = HttpAnimationEncoder::from_env().context("failed to create encoder client")?;

    let request = ExportRequest::new(
        cli.before.display().to_string(),
        cli.after.display().to_string(),
    )
    .with_transition(cli.transition)
    .with_music(cli.music)
    .with_timeout_ms(cli.timeout_ms.unwrap_or(config.default_timeout_ms));

    let orchestrator = ExportOrchestrator::new(
        Arc::new(uploader),
        Arc::new(render_client),
        Arc::new(encoder),
        config,
    );

    let mut handle = orchestrator.start(request).await?;
    info!(attempt_id = %handle.attempt_id(), "Export started");

    let token = handle.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received interrupt, cancelling export");
            token.cancel();
        }
    });

    while let Some(snapshot) = handle.next_snapshot().await {
        print_snapshot(&snapshot, cli.json)?;
    }

    let outcome = handle.outcome().await;

    if let Some(handle) = metrics_handle {
        eprintln!("{}", handle.render());
    }

    match outcome {
        Ok(artifact) => {
            info!("Export finished: {}", artifact.url());
            Ok(())
        }
        Err(ExportError::Cancelled) => {
            info!("Export cancelled");
            std::process::exit(130);
        }
        Err(e) => {
            error!("Export failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn init_tracing() -> anyhow::Result<()> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive("reveal=info".parse()?)
        .add_directive("aws_config=warn".parse()?)
        .add_directive("aws_smithy_runtime=warn".parse()?);

    // Events go to stdout; logs stay on stderr.
    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}

fn print_snapshot(snapshot: &ExportSession, json: bool) -> anyhow::Result<()> {
    if json {
        for event in ExportEvent::from_session(snapshot) {
            println!("{}", serde_json::to_string(&event)?);
        }
        return Ok(());
    }

    let percent = (snapshot.progress * 100.0).round() as u8;
    match (&snapshot.result_video_url, &snapshot.result_image_url) {
        (Some(url), _) => println!("[{:>3}%] {}: video {}", percent, snapshot.status, url),
        (_, Some(url)) => println!("[{:>3}%] {}: animation {}", percent, snapshot.status, url),
        _ => println!("[{:>3}%] {}: {}", percent, snapshot.status, snapshot.message),
    }
    Ok(())
}
