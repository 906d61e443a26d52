use crate::features::{FeatureVector, FEATURE_DIM};
use crate::util::{dot, sigmoid};
use anyhow::ensure;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// 所有可服务模型的统一能力接口：
/// - predict 必须实现
/// - predict_proba / feature_importances 可选，默认 None
///
/// 概率只有一种形状：单行、正类（class 1）的概率。
pub trait Predictor: Send + Sync + Debug {
    fn predict(&self, x: &FeatureVector) -> u8;

    fn predict_proba(&self, _x: &FeatureVector) -> Option<f64> {
        None
    }

    fn feature_importances(&self) -> Option<&[f64]> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainParams {
    pub learning_rate: f64,
    pub n_iterations: usize,
}

impl Default for TrainParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            n_iterations: 1000,
        }
    }
}

/// Logistic regression: `sigmoid(x·w + b)`.
///
/// Built once by [`LinearModel::fit`] (or deserialized from an artifact) and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl LinearModel {
    pub fn zeros(n_features: usize) -> Self {
        Self {
            weights: vec![0.0; n_features],
            bias: 0.0,
        }
    }

    /// Full-batch gradient descent on mean binary cross-entropy.
    ///
    /// Runs exactly `params.n_iterations` passes; there is no convergence
    /// check, shuffling or regularization, so the result is a pure function of
    /// the inputs.
    pub fn fit<R: AsRef<[f64]>>(x: &[R], y: &[u8], params: TrainParams) -> anyhow::Result<Self> {
        ensure!(!x.is_empty(), "fit: empty training set");
        let m = x.len();
        let n = x[0].as_ref().len();
        ensure!(n > 0, "fit: rows have no features");
        ensure!(y.len() == m, "fit: {} labels for {} rows", y.len(), m);
        for (i, row) in x.iter().enumerate() {
            let len = row.as_ref().len();
            ensure!(len == n, "fit: row {i} has {len} features, expected {n}");
        }
        ensure!(y.iter().all(|&l| l <= 1), "fit: labels must be 0 or 1");
        ensure!(
            params.learning_rate.is_finite() && params.learning_rate > 0.0,
            "fit: learning_rate must be > 0, got {}",
            params.learning_rate
        );
        ensure!(params.n_iterations >= 1, "fit: n_iterations must be >= 1");

        let mut model = Self::zeros(n);
        let lr = params.learning_rate;
        let inv_m = 1.0 / m as f64;

        // 复用缓冲，避免每轮分配
        let mut residual = vec![0.0; m];
        let mut dw = vec![0.0; n];

        for _ in 0..params.n_iterations {
            for ((r, row), &label) in residual.iter_mut().zip(x).zip(y) {
                *r = model.proba_row(row.as_ref()) - f64::from(label);
            }

            dw.fill(0.0);
            for (row, &r) in x.iter().zip(&residual) {
                for (d, &xi) in dw.iter_mut().zip(row.as_ref()) {
                    *d += xi * r;
                }
            }
            let db = inv_m * residual.iter().sum::<f64>();

            for (w, &d) in model.weights.iter_mut().zip(&dw) {
                *w -= lr * inv_m * d;
            }
            model.bias -= lr * db;
        }

        Ok(model)
    }

    #[inline]
    pub fn proba_row(&self, x: &[f64]) -> f64 {
        sigmoid(dot(x, &self.weights) + self.bias)
    }

    /// Class per row; 0.5 itself is class 0.
    pub fn predict_rows<R: AsRef<[f64]>>(&self, x: &[R]) -> Vec<u8> {
        x.iter()
            .map(|row| u8::from(self.proba_row(row.as_ref()) > 0.5))
            .collect()
    }

    pub fn predict_proba_rows<R: AsRef<[f64]>>(&self, x: &[R]) -> Vec<f64> {
        x.iter().map(|row| self.proba_row(row.as_ref())).collect()
    }

    /// Serving requires one weight per feature vector slot.
    pub fn check_serving_dim(&self) -> anyhow::Result<()> {
        ensure!(
            self.weights.len() == FEATURE_DIM,
            "linear model has {} weights, expected {}",
            self.weights.len(),
            FEATURE_DIM
        );
        ensure!(
            self.bias.is_finite() && self.weights.iter().all(|w| w.is_finite()),
            "linear model has non-finite parameters"
        );
        Ok(())
    }
}

impl Predictor for LinearModel {
    fn predict(&self, x: &FeatureVector) -> u8 {
        u8::from(self.proba_row(x.as_slice()) > 0.5)
    }

    fn predict_proba(&self, x: &FeatureVector) -> Option<f64> {
        Some(self.proba_row(x.as_slice()))
    }
}
