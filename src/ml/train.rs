//! Training run: load, split, fit, evaluate, persist.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use super::fitted::{FORMAT_VERSION, FittedPipeline, PipelineMetadata};
use super::forest::{Classifier, ForestError, ForestOptions, RandomForest};
use super::metrics::{
    ConfusionMatrix, PerClassStats, accuracy, precision_recall_by_class, roc_auc,
};
use super::pipeline::{FeatureSchema, SchemaMismatch};
use super::split::stratified_split;
use super::store::{StoreError, save_pipeline};
use crate::dataset::{DatasetError, Frame, load_dataset};

/// Settings for a training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainOptions {
    /// Share of each class held out for evaluation.
    pub test_fraction: f64,
    /// Seed for the split and bootstrap sampling.
    pub seed: u64,
    pub n_trees: usize,
    pub max_depth: Option<usize>,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
            n_trees: 200,
            max_depth: None,
        }
    }
}

impl TrainOptions {
    fn forest_options(&self) -> ForestOptions {
        ForestOptions {
            n_trees: self.n_trees,
            seed: self.seed,
            max_depth: self.max_depth,
        }
    }
}

#[derive(Debug, Error)]
pub enum TrainError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error("invalid split: {0}")]
    Split(String),
    #[error("split produced {train} train and {test} test rows; both must be non-empty")]
    EmptyPartition { train: usize, test: usize },
    #[error("feature encoding failed: {0}")]
    Schema(#[from] SchemaMismatch),
    #[error(transparent)]
    Forest(#[from] ForestError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Held-out metrics.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub accuracy: f32,
    /// `None` when the test partition holds a single class.
    pub roc_auc: Option<f64>,
    pub confusion: ConfusionMatrix,
    pub per_class: Vec<PerClassStats>,
}

/// Outcome of [`train`].
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub train_rows: usize,
    pub test_rows: usize,
    pub evaluation: Evaluation,
    pub model_path: PathBuf,
}

/// Train on the CSV at `dataset_path` and save the fitted pipeline to `model_path`.
///
/// Column validation happens while loading, before any fitting or writing.
pub fn train(
    dataset_path: &Path,
    model_path: &Path,
    options: &TrainOptions,
) -> Result<TrainingReport, TrainError> {
    let frame = load_dataset(dataset_path)?;
    info!("Loaded {} rows from {}", frame.len(), dataset_path.display());
    let (pipeline, evaluation, test_rows) = fit_frame(&frame, options)?;
    save_pipeline(&pipeline, model_path)?;
    Ok(TrainingReport {
        train_rows: pipeline.metadata.trained_rows,
        test_rows,
        evaluation,
        model_path: model_path.to_path_buf(),
    })
}

/// Split `frame`, fit on the train partition and evaluate on the test one.
///
/// Returns the pipeline, its evaluation and the test partition size.
pub fn fit_frame(
    frame: &Frame,
    options: &TrainOptions,
) -> Result<(FittedPipeline, Evaluation, usize), TrainError> {
    let labels = frame.label_indices();
    let split =
        stratified_split(&labels, options.test_fraction, options.seed).map_err(TrainError::Split)?;
    if split.train.is_empty() || split.test.is_empty() {
        return Err(TrainError::EmptyPartition {
            train: split.train.len(),
            test: split.test.len(),
        });
    }
    let train = frame.select(&split.train);
    let test = frame.select(&split.test);
    info!("Split into {} train and {} test rows", train.len(), test.len());

    let (schema, x_train) = FeatureSchema::fit(&train.rows)?;
    let forest = RandomForest::fit(&x_train, &train.label_indices(), &options.forest_options())?;
    info!(
        "Fitted {} trees on {} encoded features",
        forest.n_members(),
        schema.width()
    );
    let pipeline = FittedPipeline {
        metadata: PipelineMetadata {
            format_version: FORMAT_VERSION,
            trained_rows: train.len(),
            seed: options.seed,
        },
        schema,
        forest,
    };

    let evaluation = evaluate(&pipeline, &test)?;
    Ok((pipeline, evaluation, test.len()))
}

/// Score `pipeline` against a labeled frame.
pub fn evaluate(pipeline: &FittedPipeline, frame: &Frame) -> Result<Evaluation, TrainError> {
    let x = pipeline.encode(&frame.rows)?;
    let truth = frame.label_indices();
    let proba = pipeline.forest.predict_proba(&x);
    let predicted = pipeline.forest.predict(&x);

    let confusion = ConfusionMatrix::from_predictions(2, &truth, &predicted.to_vec());
    let accuracy = accuracy(&confusion);
    let per_class = precision_recall_by_class(&confusion);
    let roc_auc = roc_auc(&frame.labels, &proba.to_vec());
    match roc_auc {
        Some(auc) => info!("Test accuracy {accuracy:.4}, ROC AUC {auc:.4}"),
        None => {
            info!("Test accuracy {accuracy:.4}");
            warn!("Skipping ROC AUC: test partition holds a single class");
        }
    }
    Ok(Evaluation {
        accuracy,
        roc_auc,
        confusion,
        per_class,
    })
}
