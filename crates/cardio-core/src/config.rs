use crate::schema::ModelKind;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 运行时配置：默认值可直接跑；也可以从 TOML 文件读取。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the model artifacts.
    pub model_dir: PathBuf,

    /// Model used when a request has no `model` field.
    pub default_model: ModelKind,

    pub artifacts: ArtifactFiles,
}

/// Artifact file names relative to `model_dir`. Each may also exist with a `.gz` suffix.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactFiles {
    pub custom: String,
    pub rf: String,
    pub xgboost: String,
    pub columns: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            default_model: ModelKind::RandomForest,
            artifacts: ArtifactFiles::default(),
        }
    }
}

impl Default for ArtifactFiles {
    fn default() -> Self {
        Self {
            custom: "model.json".into(),
            rf: "best_rf_model.json".into(),
            xgboost: "xgb_model.json".into(),
            columns: "columns.json".into(),
        }
    }
}

impl ArtifactFiles {
    pub fn for_kind(&self, kind: ModelKind) -> &str {
        match kind {
            ModelKind::Custom => &self.custom,
            ModelKind::RandomForest => &self.rf,
            ModelKind::XgBoost => &self.xgboost,
        }
    }
}

impl Config {
    pub fn from_toml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read config: {}", path.display()))?;
        toml::from_str(&s).with_context(|| format!("parse config: {}", path.display()))
    }
}
