use anyhow::Context;
use cardio_core::features::{assemble, FEATURE_DIM, FEATURE_NAMES};
use cardio_core::model::{LinearModel, TrainParams};
use cardio_core::registry::read_json;
use cardio_core::schema::{ModelKind, PatientRecord};
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// Train the custom logistic model on labelled patient records and write `model.json`.
///
/// Input: JSON array (optionally .gz) of objects with the eleven raw fields plus `cardio` (0/1).
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(long)]
    data: PathBuf,

    #[arg(long, default_value = "models/model.json")]
    out: PathBuf,

    #[arg(long, default_value_t = 0.01)]
    learning_rate: f64,

    #[arg(long, default_value_t = 1000)]
    iterations: usize,
}

#[derive(Debug, Deserialize)]
struct Labelled {
    #[serde(flatten)]
    patient: PatientRecord,
    cardio: u8,
}

/// Scaled feature rows plus labels, in input order.
fn training_set(rows: &[Labelled]) -> anyhow::Result<(Vec<[f64; FEATURE_DIM]>, Vec<u8>)> {
    // 与服务端 custom 路径同一套归一化
    let prep = ModelKind::Custom.preparation();
    let mut x = Vec::with_capacity(rows.len());
    let mut y = Vec::with_capacity(rows.len());
    for (i, r) in rows.iter().enumerate() {
        anyhow::ensure!(r.cardio <= 1, "row {i}: cardio must be 0 or 1, got {}", r.cardio);
        let fv = assemble(&r.patient, prep).with_context(|| format!("row {i}"))?;
        x.push(fv.0);
        y.push(r.cardio);
    }
    Ok((x, y))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let rows: Vec<Labelled> = read_json(&args.data)?;

    let (x, y) = training_set(&rows)?;
    info!(rows = x.len(), "training set assembled");

    let params = TrainParams {
        learning_rate: args.learning_rate,
        n_iterations: args.iterations,
    };
    let t0 = Instant::now();
    let model = LinearModel::fit(&x, &y, params)?;
    info!(elapsed_ms = t0.elapsed().as_millis() as u64, "fit done");

    let preds = model.predict_rows(&x);
    let correct = preds.iter().zip(&y).filter(|(p, t)| p == t).count();
    info!(
        train_accuracy = correct as f64 / x.len() as f64,
        bias = model.bias,
        "training summary"
    );
    for (name, w) in FEATURE_NAMES.iter().zip(&model.weights) {
        info!(feature = name, weight = w, "coefficient");
    }

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create {}", parent.display()))?;
    }
    let json = serde_json::to_vec_pretty(&model)?;
    std::fs::write(&args.out, json).with_context(|| format!("write {}", args.out.display()))?;
    info!(out = %args.out.display(), "model written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(cardio: u8) -> serde_json::Value {
        serde_json::json!({
            "age": 47, "gender": 2, "height": 170, "weight": 70,
            "ap_hi": 120, "ap_lo": 80, "cholesterol": 1, "gluc": 1,
            "smoke": 0, "alco": 0, "active": 1, "cardio": cardio
        })
    }

    #[test]
    fn parses_labelled_record() {
        let r: Labelled = serde_json::from_value(record(1)).unwrap();
        assert_eq!(r.cardio, 1);
        assert_eq!(r.patient.height, 170.0);

        let mut no_label = record(0);
        no_label.as_object_mut().unwrap().remove("cardio");
        assert!(serde_json::from_value::<Labelled>(no_label).is_err());
    }

    #[test]
    fn training_set_is_scaled_and_labelled() {
        let rows: Vec<Labelled> =
            serde_json::from_value(serde_json::json!([record(0), record(1)])).unwrap();
        let (x, y) = training_set(&rows).unwrap();
        assert_eq!(y, vec![0, 1]);
        // age 47 sits at the middle of the scaling range
        assert_eq!(x[0][0], 0.5);
        assert_eq!(x[1][11], x[0][11]);
    }

    #[test]
    fn rejects_non_binary_label() {
        let rows: Vec<Labelled> = serde_json::from_value(serde_json::json!([record(2)])).unwrap();
        let err = training_set(&rows).unwrap_err();
        assert!(err.to_string().contains("cardio"));
    }
}
