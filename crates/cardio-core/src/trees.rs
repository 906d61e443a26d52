//! Tree ensembles exported to JSON and evaluated natively.
//!
//! Both ensembles share the node layout; they differ in how a split compares
//! and how leaves are combined:
//! - random forest: `x <= threshold` goes left, leaves are class-1 probabilities, averaged
//! - gradient boosting: `x < threshold` goes left, leaves are margins, summed then squashed

use crate::features::{FeatureVector, FEATURE_DIM};
use crate::model::Predictor;
use crate::util::sigmoid;
use anyhow::{bail, ensure, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(default)]
    pub feature: usize,
    #[serde(default)]
    pub threshold: f64,
    #[serde(default)]
    pub left: usize,
    #[serde(default)]
    pub right: usize,
    /// Some => leaf
    #[serde(default)]
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, Copy)]
enum Split {
    LessEq,
    Less,
}

impl Tree {
    /// 载入时校验：子节点下标在范围内、特征下标 < FEATURE_DIM、从根出发每个节点只有一个父节点。
    /// 校验通过后 eval 不会越界也不会死循环。
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.nodes.is_empty(), "tree has no nodes");
        let n = self.nodes.len();
        for (i, node) in self.nodes.iter().enumerate() {
            if node.value.is_some() {
                continue;
            }
            ensure!(
                node.feature < FEATURE_DIM,
                "node {i}: feature {} out of range",
                node.feature
            );
            ensure!(
                node.left < n && node.right < n,
                "node {i}: child index out of range ({}, {}) for {n} nodes",
                node.left,
                node.right
            );
            ensure!(node.threshold.is_finite(), "node {i}: non-finite threshold");
        }

        // 从根出发每个节点只能被到达一次：重复到达即共享子节点或有环
        let mut visited = vec![false; n];
        let mut stack = vec![0usize];
        while let Some(idx) = stack.pop() {
            if visited[idx] {
                bail!("node {idx} reached from more than one parent");
            }
            visited[idx] = true;
            let node = &self.nodes[idx];
            if node.value.is_none() {
                stack.push(node.left);
                stack.push(node.right);
            }
        }
        Ok(())
    }

    fn eval(&self, x: &[f64], split: Split) -> f64 {
        let mut idx = 0usize;
        loop {
            let node = &self.nodes[idx];
            if let Some(v) = node.value {
                return v;
            }
            let go_left = match split {
                Split::LessEq => x[node.feature] <= node.threshold,
                Split::Less => x[node.feature] < node.threshold,
            };
            idx = if go_left { node.left } else { node.right };
        }
    }
}

fn check_importances(imp: &[f64]) -> Result<()> {
    ensure!(
        imp.iter().all(|v| v.is_finite()),
        "feature_importances contains non-finite values"
    );
    if imp.len() != FEATURE_DIM {
        tracing::warn!(
            got = imp.len(),
            expected = FEATURE_DIM,
            "feature_importances length differs from feature vector"
        );
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub trees: Vec<Tree>,
    pub feature_importances: Vec<f64>,
}

impl RandomForest {
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.trees.is_empty(), "random forest has no trees");
        for (i, t) in self.trees.iter().enumerate() {
            t.validate().map_err(|e| e.context(format!("tree {i}")))?;
        }
        check_importances(&self.feature_importances)
    }

    pub fn proba(&self, x: &[f64]) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.eval(x, Split::LessEq)).sum();
        sum / self.trees.len() as f64
    }
}

impl Predictor for RandomForest {
    fn predict(&self, x: &FeatureVector) -> u8 {
        u8::from(self.proba(x.as_slice()) > 0.5)
    }

    fn predict_proba(&self, x: &FeatureVector) -> Option<f64> {
        Some(self.proba(x.as_slice()))
    }

    fn feature_importances(&self) -> Option<&[f64]> {
        Some(&self.feature_importances)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoosted {
    /// 初始 margin（logit 空间）
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<Tree>,
    #[serde(default)]
    pub feature_importances: Option<Vec<f64>>,
}

impl GradientBoosted {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.base_score.is_finite(), "base_score must be finite");
        for (i, t) in self.trees.iter().enumerate() {
            t.validate().map_err(|e| e.context(format!("tree {i}")))?;
        }
        if let Some(imp) = &self.feature_importances {
            check_importances(imp)?;
        }
        Ok(())
    }

    pub fn margin(&self, x: &[f64]) -> f64 {
        self.base_score + self.trees.iter().map(|t| t.eval(x, Split::Less)).sum::<f64>()
    }
}

impl Predictor for GradientBoosted {
    fn predict(&self, x: &FeatureVector) -> u8 {
        u8::from(sigmoid(self.margin(x.as_slice())) > 0.5)
    }

    fn predict_proba(&self, x: &FeatureVector) -> Option<f64> {
        Some(sigmoid(self.margin(x.as_slice())))
    }

    fn feature_importances(&self) -> Option<&[f64]> {
        self.feature_importances.as_deref()
    }
}
