use anyhow::Context;
use cardio_core::config::Config;
use cardio_core::pipeline::AppCore;
use cardio_core::schema::{PatientRecord, PredictRequest};
use clap::Parser;
use std::path::PathBuf;

/// Load the model directory and run one sample patient through every loaded model.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(long, default_value = "models")]
    model_dir: PathBuf,

    /// TOML config; --model-dir still wins
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut cfg = match &args.config {
        Some(p) => Config::from_toml_file(p)?,
        None => Config::default(),
    };
    cfg.model_dir = args.model_dir;

    let core = AppCore::load(cfg).context("load models")?;
    let loaded = core.registry.loaded();
    anyhow::ensure!(!loaded.is_empty(), "no models found in {}", core.cfg.model_dir.display());

    let patient = PatientRecord {
        age: 52.0,
        gender: 1.0,
        height: 165.0,
        weight: 78.0,
        ap_hi: 140.0,
        ap_lo: 90.0,
        cholesterol: 2.0,
        gluc: 1.0,
        smoke: 0.0,
        alco: 0.0,
        active: 1.0,
    };

    for kind in loaded {
        let req = PredictRequest {
            patient,
            model: Some(kind.key().to_string()),
        };
        let resp = core.predict(&req)?;
        println!(
            "{:<8} prediction={} probability={:>8} {}",
            kind, resp.prediction, resp.probability, resp.message
        );
    }

    match core.insights() {
        Ok(ins) => {
            println!("feature importance:");
            for f in ins.feature_importance {
                println!("  {:<16} {:>6.3}", f.name, f.value);
            }
        }
        Err(e) => println!("insights: {e}"),
    }

    Ok(())
}
