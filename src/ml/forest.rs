//! Bagged ensemble of decision trees for the binary "recommend a Mac" label.
//!
//! Each member is a Gini [`DecisionTree`] grown to full depth (unless
//! limited) on a bootstrap sample of the training rows. Prediction is a
//! majority vote and the probability is the fraction of members voting for
//! the positive class.

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::tree::{DecisionTree, TreeOptions};

/// Positive class index.
pub const POSITIVE: usize = 1;
const N_CLASSES: usize = 2;

/// A binary classifier over encoded rows.
pub trait Classifier {
    /// Hyperparameters accepted by [`Classifier::fit`].
    type Params;

    /// Train on encoded rows and class indices (`0` or `1`).
    fn fit(x: &Array2<f64>, y: &[usize], params: &Self::Params) -> Result<Self, ForestError>
    where
        Self: Sized;

    /// Probability of the positive class per row.
    fn predict_proba(&self, x: &Array2<f64>) -> Array1<f64>;

    /// Class index per row.
    fn predict(&self, x: &Array2<f64>) -> Array1<usize> {
        self.predict_proba(x).mapv(|p| usize::from(p > 0.5))
    }
}

#[derive(Debug, Error)]
pub enum ForestError {
    #[error("cannot fit on an empty dataset")]
    EmptyDataset,
    #[error("mismatched lengths: {rows} rows but {labels} labels")]
    LengthMismatch { rows: usize, labels: usize },
    #[error("ensemble needs at least one tree")]
    NoTrees,
    #[error("label {label} is not a binary class index")]
    InvalidLabel { label: usize },
}

/// Training hyperparameters for the ensemble.
#[derive(Debug, Clone, PartialEq)]
pub struct ForestOptions {
    /// Number of bootstrap members.
    pub n_trees: usize,
    /// Seed for bootstrap sampling.
    pub seed: u64,
    /// Depth limit per tree; unlimited when `None`.
    pub max_depth: Option<usize>,
}

impl Default for ForestOptions {
    fn default() -> Self {
        Self {
            n_trees: 200,
            seed: 42,
            max_depth: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
}

impl RandomForest {
    pub fn n_members(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Number of members voting positive, per row.
    pub fn positive_votes(&self, x: &Array2<f64>) -> Array1<usize> {
        let mut votes = Array1::zeros(x.nrows());
        for tree in &self.trees {
            let predicted = tree.predict(x);
            votes.zip_mut_with(&predicted, |count: &mut usize, &class| {
                if class == POSITIVE {
                    *count += 1;
                }
            });
        }
        votes
    }

    /// Structural checks for forests read from disk.
    pub fn validate(&self) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("Model has no ensemble members".to_string());
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            if tree.n_features() != self.n_features {
                return Err(format!(
                    "tree {idx} expects {} features, forest has {}",
                    tree.n_features(),
                    self.n_features
                ));
            }
            tree.validate().map_err(|err| format!("tree {idx}: {err}"))?;
        }
        Ok(())
    }
}

impl Classifier for RandomForest {
    type Params = ForestOptions;

    fn fit(x: &Array2<f64>, y: &[usize], options: &ForestOptions) -> Result<Self, ForestError> {
        let n = x.nrows();
        if n == 0 {
            return Err(ForestError::EmptyDataset);
        }
        if y.len() != n {
            return Err(ForestError::LengthMismatch {
                rows: n,
                labels: y.len(),
            });
        }
        if options.n_trees == 0 {
            return Err(ForestError::NoTrees);
        }
        if let Some(&label) = y.iter().find(|&&label| label >= N_CLASSES) {
            return Err(ForestError::InvalidLabel { label });
        }

        let tree_options = TreeOptions {
            max_depth: options.max_depth,
            ..TreeOptions::default()
        };
        let mut rng = StdRng::seed_from_u64(options.seed);
        let mut trees = Vec::with_capacity(options.n_trees);
        for tree_idx in 0..options.n_trees {
            let sample: Vec<usize> = (0..n).map(|_| rng.random_range(0..n)).collect();
            let tree = DecisionTree::fit(x, y, sample, N_CLASSES, &tree_options);
            debug!(
                "Tree {tree_idx}: {} nodes, depth {}",
                tree.n_nodes(),
                tree.depth()
            );
            trees.push(tree);
        }
        debug!("Fitted {} ensemble members on {n} rows", trees.len());

        Ok(Self {
            trees,
            n_features: x.ncols(),
        })
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Array1<f64> {
        let total = self.trees.len().max(1) as f64;
        self.positive_votes(x).mapv(|count| count as f64 / total)
    }
}
