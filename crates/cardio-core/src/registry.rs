use crate::config::ArtifactFiles;
use crate::error::PredictError;
use crate::model::{LinearModel, Predictor};
use crate::schema::ModelKind;
use crate::trees::{GradientBoosted, RandomForest};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Display names used when `columns.json` is absent.
pub const FALLBACK_COLUMNS: [&str; 13] = [
    "Age",
    "Gender",
    "Height",
    "Weight",
    "ap_hi",
    "ap_lo",
    "Cholesterol",
    "Gluc",
    "Smoke",
    "Alco",
    "Active",
    "BMI",
    "Pulse Pressure",
];

/// 启动时一次性装载，之后只读。
#[derive(Debug)]
pub struct ModelRegistry {
    models: BTreeMap<ModelKind, Box<dyn Predictor>>,
    column_names: Vec<String>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self {
            models: BTreeMap::new(),
            column_names: FALLBACK_COLUMNS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, kind: ModelKind, predictor: impl Predictor + 'static) -> Self {
        self.models.insert(kind, Box::new(predictor));
        self
    }

    pub fn with_column_names(mut self, names: Vec<String>) -> Self {
        self.column_names = names;
        self
    }

    /// Load every artifact found under `dir`.
    ///
    /// A missing artifact leaves its kind out of the registry. An artifact that
    /// exists but does not parse or validate fails the whole load.
    pub fn load_from_dir(dir: &Path, files: &ArtifactFiles) -> Result<Self> {
        let mut reg = Self::new();

        for kind in ModelKind::ALL {
            let name = files.for_kind(kind);
            let Some(path) = resolve_artifact(dir, name) else {
                warn!(model = %kind, file = %dir.join(name).display(), "model artifact missing");
                continue;
            };
            let predictor = load_predictor(kind, &path)
                .with_context(|| format!("load {kind} model: {}", path.display()))?;
            info!(model = %kind, file = %path.display(), "model loaded");
            reg.models.insert(kind, predictor);
        }

        match resolve_artifact(dir, &files.columns) {
            Some(path) => {
                let names: Vec<String> = read_json(&path)?;
                info!(columns = ?names, "column names loaded");
                reg.column_names = names;
            }
            None => warn!(
                file = %dir.join(&files.columns).display(),
                "column names missing, using fallback list"
            ),
        }

        Ok(reg)
    }

    pub fn get(&self, kind: ModelKind) -> Result<&dyn Predictor, PredictError> {
        self.models
            .get(&kind)
            .map(|b| b.as_ref())
            .ok_or(PredictError::ModelNotLoaded(kind))
    }

    pub fn loaded(&self) -> Vec<ModelKind> {
        self.models.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }
}

fn load_predictor(kind: ModelKind, path: &Path) -> Result<Box<dyn Predictor>> {
    Ok(match kind {
        ModelKind::Custom => {
            let m: LinearModel = read_json(path)?;
            m.check_serving_dim()?;
            Box::new(m)
        }
        ModelKind::RandomForest => {
            let m: RandomForest = read_json(path)?;
            m.validate()?;
            Box::new(m)
        }
        ModelKind::XgBoost => {
            let m: GradientBoosted = read_json(path)?;
            m.validate()?;
            Box::new(m)
        }
    })
}

/// `name` 优先，其次 `name.gz`
fn resolve_artifact(dir: &Path, name: &str) -> Option<PathBuf> {
    let plain = dir.join(name);
    if plain.is_file() {
        return Some(plain);
    }
    let gz = dir.join(format!("{name}.gz"));
    gz.is_file().then_some(gz)
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let f = fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
    let reader: Box<dyn Read> = if path.extension().is_some_and(|e| e == "gz") {
        Box::new(flate2::read::GzDecoder::new(f))
    } else {
        Box::new(f)
    };
    serde_json::from_reader(BufReader::new(reader))
        .with_context(|| format!("parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FEATURE_DIM;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn write_linear(dir: &Path, name: &str) {
        let m = LinearModel::zeros(FEATURE_DIM);
        fs::write(dir.join(name), serde_json::to_vec(&m).unwrap()).unwrap();
    }

    fn forest_json() -> serde_json::Value {
        serde_json::json!({
            "trees": [{"nodes": [
                {"feature": 0, "threshold": 50.0, "left": 1, "right": 2},
                {"value": 0.2},
                {"value": 0.9}
            ]}],
            "feature_importances": [0.3, 0.0, 0.0, 0.0, 0.5, 0.0, 0.1, 0.0, 0.0, 0.0, 0.0, 0.05, 0.05]
        })
    }

    #[test]
    fn missing_artifacts_are_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        write_linear(dir.path(), "model.json");

        let reg = ModelRegistry::load_from_dir(dir.path(), &ArtifactFiles::default()).unwrap();
        assert_eq!(reg.loaded(), vec![ModelKind::Custom]);
        assert!(matches!(
            reg.get(ModelKind::XgBoost),
            Err(PredictError::ModelNotLoaded(ModelKind::XgBoost))
        ));
        assert_eq!(reg.column_names().len(), FALLBACK_COLUMNS.len());
    }

    #[test]
    fn empty_dir_gives_empty_registry() {
        let dir = tempfile::tempdir().unwrap();
        let reg = ModelRegistry::load_from_dir(dir.path(), &ArtifactFiles::default()).unwrap();
        assert!(reg.is_empty());
    }

    #[test]
    fn loads_gzip_artifacts_and_columns() {
        let dir = tempfile::tempdir().unwrap();
        let f = fs::File::create(dir.path().join("best_rf_model.json.gz")).unwrap();
        let mut enc = GzEncoder::new(f, Compression::default());
        enc.write_all(forest_json().to_string().as_bytes()).unwrap();
        enc.finish().unwrap();

        fs::write(dir.path().join("columns.json"), r#"["A","B","C"]"#).unwrap();

        let reg = ModelRegistry::load_from_dir(dir.path(), &ArtifactFiles::default()).unwrap();
        let rf = reg.get(ModelKind::RandomForest).unwrap();
        assert_eq!(rf.feature_importances().map(|v| v.len()), Some(FEATURE_DIM));
        assert_eq!(reg.column_names(), &["A", "B", "C"]);
    }

    #[test]
    fn corrupt_artifact_fails_load() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("xgb_model.json"), "{not json").unwrap();
        assert!(ModelRegistry::load_from_dir(dir.path(), &ArtifactFiles::default()).is_err());

        let dir = tempfile::tempdir().unwrap();
        let short = LinearModel::zeros(4);
        fs::write(dir.path().join("model.json"), serde_json::to_vec(&short).unwrap()).unwrap();
        let err = ModelRegistry::load_from_dir(dir.path(), &ArtifactFiles::default()).unwrap_err();
        assert!(format!("{err:#}").contains("weights"));
    }

    #[test]
    fn custom_file_names_are_respected() {
        let dir = tempfile::tempdir().unwrap();
        write_linear(dir.path(), "lr.json");
        let files = ArtifactFiles {
            custom: "lr.json".into(),
            ..ArtifactFiles::default()
        };
        let reg = ModelRegistry::load_from_dir(dir.path(), &files).unwrap();
        assert!(reg.get(ModelKind::Custom).is_ok());
    }
}
