mod routes;

use anyhow::Context;
use cardio_core::{config::Config, pipeline::AppCore, ModelKind};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use routes::{router, AppState};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// TOML config file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "0.0.0.0:5000")]
    addr: SocketAddr,

    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// custom | rf | xgboost
    #[arg(long)]
    default_model: Option<ModelKind>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(p) => Config::from_toml_file(p)?,
        None => Config::default(),
    };
    if let Some(dir) = args.model_dir {
        cfg.model_dir = dir;
    }
    if let Some(kind) = args.default_model {
        cfg.default_model = kind;
    }

    // metrics（进程内全局一次）
    let prom = PrometheusBuilder::new()
        .install_recorder()
        .context("install prometheus recorder")?;

    // 模型在开始服务前装载完毕，之后只读
    let core = Arc::new(AppCore::load(cfg)?);
    let loaded = core.registry.loaded();
    if loaded.is_empty() {
        tracing::warn!(model_dir = %core.cfg.model_dir.display(), "no models loaded; /api/predict will fail");
    } else {
        tracing::info!(models = ?loaded, default = %core.cfg.default_model, "models ready");
    }

    let app = router(AppState { core, prom });

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .with_context(|| format!("bind {}", args.addr))?;
    tracing::info!("cardio-server listening on http://{}", args.addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(err = %e, "ctrl_c handler failed");
    }
    tracing::info!("shutting down");
}
