//! Permutation feature importance for a fitted pipeline.
//!
//! The report is best-effort: [`explain`] never returns an error, it reports
//! the importances as unavailable instead.

use std::path::Path;

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use super::fitted::FittedPipeline;
use super::forest::Classifier;
use super::metrics::accuracy_of;
use super::pipeline::SchemaMismatch;
use crate::dataset::{DatasetError, load_dataset};

#[derive(Debug, Clone, PartialEq)]
pub struct ExplainOptions {
    /// Rows drawn from the dataset; fewer if the dataset is smaller.
    pub sample_size: usize,
    /// Shuffles per feature.
    pub repeats: usize,
    pub seed: u64,
    /// Entries kept in the report.
    pub top_k: usize,
}

impl Default for ExplainOptions {
    fn default() -> Self {
        Self {
            sample_size: 300,
            repeats: 10,
            seed: 42,
            top_k: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureImportance {
    pub feature: String,
    /// Mean accuracy drop when the feature is shuffled.
    pub importance: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportanceReport {
    /// Sorted by descending importance.
    Available(Vec<FeatureImportance>),
    Unavailable { reason: String },
}

impl ImportanceReport {
    pub fn entries(&self) -> Option<&[FeatureImportance]> {
        match self {
            ImportanceReport::Available(entries) => Some(entries),
            ImportanceReport::Unavailable { .. } => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExplainError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error("dataset does not match the model schema: {0}")]
    Schema(#[from] SchemaMismatch),
    #[error("no rows to sample")]
    EmptySample,
}

/// Compute importances, downgrading any failure to [`ImportanceReport::Unavailable`].
pub fn explain(
    dataset_path: &Path,
    pipeline: &FittedPipeline,
    options: &ExplainOptions,
) -> ImportanceReport {
    match try_explain(dataset_path, pipeline, options) {
        Ok(entries) => ImportanceReport::Available(entries),
        Err(err) => {
            warn!("Feature importances unavailable: {err}");
            ImportanceReport::Unavailable {
                reason: err.to_string(),
            }
        }
    }
}

/// Fallible core of [`explain`].
pub fn try_explain(
    dataset_path: &Path,
    pipeline: &FittedPipeline,
    options: &ExplainOptions,
) -> Result<Vec<FeatureImportance>, ExplainError> {
    let frame = load_dataset(dataset_path)?;
    let amount = options.sample_size.min(frame.len());
    if amount == 0 {
        return Err(ExplainError::EmptySample);
    }
    let mut rng = StdRng::seed_from_u64(options.seed);
    let picked = rand::seq::index::sample(&mut rng, frame.len(), amount).into_vec();
    let sample = frame.select(&picked);
    let x = pipeline.encode(&sample.rows)?;
    debug!("Explaining on {amount} sampled rows, {} features", x.ncols());

    let scores = permutation_importance(
        &pipeline.forest,
        &x,
        &sample.label_indices(),
        options.repeats,
        &mut rng,
    );
    Ok(rank(pipeline.feature_names(), scores, options.top_k))
}

/// Mean accuracy drop per column when that column is shuffled `repeats` times.
pub fn permutation_importance<C, R>(
    classifier: &C,
    x: &Array2<f64>,
    y: &[usize],
    repeats: usize,
    rng: &mut R,
) -> Vec<f64>
where
    C: Classifier + ?Sized,
    R: Rng + ?Sized,
{
    let repeats = repeats.max(1);
    let baseline = accuracy_of(y, &classifier.predict(x).to_vec());
    let mut permuted = x.clone();
    let mut scores = Vec::with_capacity(x.ncols());
    for col in 0..x.ncols() {
        let mut values = x.column(col).to_vec();
        let mut total_drop = 0.0;
        for _ in 0..repeats {
            values.shuffle(rng);
            permuted.column_mut(col).assign(&Array1::from(values.clone()));
            total_drop += baseline - accuracy_of(y, &classifier.predict(&permuted).to_vec());
        }
        permuted.column_mut(col).assign(&x.column(col));
        scores.push(total_drop / repeats as f64);
    }
    scores
}

fn rank(names: Vec<String>, scores: Vec<f64>, top_k: usize) -> Vec<FeatureImportance> {
    let mut entries: Vec<FeatureImportance> = names
        .into_iter()
        .zip(scores)
        .map(|(feature, importance)| FeatureImportance {
            feature,
            importance,
        })
        .collect();
    entries.sort_by(|a, b| {
        b.importance
            .total_cmp(&a.importance)
            .then_with(|| a.feature.cmp(&b.feature))
    });
    entries.truncate(top_k);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::forest::{ForestOptions, RandomForest};
    use ndarray::{Axis, concatenate};

    /// Column 0 decides the label, column 1 is noise, column 2 is constant.
    fn data() -> (Array2<f64>, Vec<usize>) {
        let mut rng = StdRng::seed_from_u64(5);
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for _ in 0..200 {
            let signal: bool = rng.random_bool(0.5);
            let noise: bool = rng.random_bool(0.5);
            rows.extend_from_slice(&[f64::from(u8::from(signal)), f64::from(u8::from(noise))]);
            labels.push(usize::from(signal));
        }
        let x = Array2::from_shape_vec((200, 2), rows).unwrap();
        let constant = Array2::<f64>::ones((200, 1));
        (concatenate(Axis(1), &[x.view(), constant.view()]).unwrap(), labels)
    }

    #[test]
    fn signal_dominates_and_constant_scores_zero() {
        let (x, y) = data();
        let options = ForestOptions {
            n_trees: 10,
            ..ForestOptions::default()
        };
        let forest = RandomForest::fit(&x, &y, &options).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let scores = permutation_importance(&forest, &x, &y, 5, &mut rng);
        assert_eq!(scores.len(), 3);
        assert!(scores[0] > 0.3, "{scores:?}");
        assert!(scores[1].abs() < 0.05, "{scores:?}");
        assert!(scores[2].abs() < 1e-12, "{scores:?}");
    }

    #[test]
    fn rank_sorts_descending_and_truncates() {
        let names = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let ranked = rank(names, vec![0.1, 0.3, 0.1], 2);
        assert_eq!(ranked[0].feature, "b");
        assert_eq!(ranked[1].feature, "a");
        assert_eq!(ranked.len(), 2);
    }
}
