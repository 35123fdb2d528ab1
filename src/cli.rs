use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;

use crate::app_state::ServiceContext;
use crate::artifact_loader::{load_artifacts, FsArtifactStore};
use crate::config_loader::{load_config, ServiceConfig};
use crate::logging::init_tracing;
use crate::web::build_router_with_body_limit;

/// Top-level CLI for the sentiment service
#[derive(Parser)]
#[command(
    name = "sentiment_service",
    version,
    about = "Movie review sentiment classifier over HTTP"
)]
pub struct Cli {
    /// TOML config file (defaults to ./sentiment.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Host/IP to bind, overrides the config file
        #[arg(long)]
        host: Option<String>,
        /// Port to bind, overrides the config file
        #[arg(long)]
        port: Option<u16>,
    },

    /// Load the artifacts, print the health report, exit non-zero if degraded
    Check,

    /// Classify a single review and print the result as JSON
    Predict {
        #[arg(short, long)]
        text: String,
    },
}

pub fn dispatch(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = load_config(cli.config.as_deref()).context("Failed to load config")?;
    init_tracing(&config.log_filter);

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            serve(config)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check => {
            let ctx = build_context(&config);
            let report = json!({
                "health": ctx.health(),
                "artifacts": ctx.info(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
            if ctx.health_state().is_healthy() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Commands::Predict { text } => {
            let ctx = build_context(&config);
            match ctx.predict(&json!({ "review": text })) {
                Ok(response) => {
                    println!("{}", serde_json::to_string_pretty(&response)?);
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    eprintln!("{}", serde_json::to_string_pretty(&e.body())?);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}

/// Load artifacts from the filesystem into a fresh service context
pub fn build_context(config: &ServiceConfig) -> ServiceContext {
    let store = FsArtifactStore::new();
    ServiceContext::from_artifacts(load_artifacts(&store, &config.artifact_paths()))
}

fn serve(config: ServiceConfig) -> anyhow::Result<()> {
    let ctx = Arc::new(build_context(&config));
    let app = build_router_with_body_limit(ctx, config.max_body_bytes);
    let addr = config.bind_addr();

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    rt.block_on(async move {
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        info!("HTTP server listening on http://{addr}");
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Server error")
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
