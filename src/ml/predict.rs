//! Single-record inference against a fitted pipeline.

use std::sync::Arc;

use ndarray::Axis;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::fitted::FittedPipeline;
use super::forest::{Classifier, POSITIVE};
use super::pipeline::{FeatureSchema, SchemaMismatch};
use super::store::{SharedPipeline, StoreError};
use crate::dataset::RawRecord;

#[derive(Debug, Error)]
pub enum PredictError {
    /// Input does not fit the learned columns; no prediction was made.
    #[error("input does not match the model schema: {0}")]
    Schema(#[from] SchemaMismatch),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Predicted label and positive-class probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionResult {
    /// `1` when a Mac is recommended.
    pub label: u8,
    /// Probability of the positive class in `[0, 1]`.
    pub probability: f64,
}

impl PredictionResult {
    pub fn recommends_mac(&self) -> bool {
        self.label == 1
    }
}

/// Answers prediction requests from one immutable pipeline.
#[derive(Debug, Clone)]
pub struct PredictionService {
    pipeline: Arc<FittedPipeline>,
}

impl PredictionService {
    pub fn new(pipeline: Arc<FittedPipeline>) -> Self {
        Self { pipeline }
    }

    /// Build a service from a lazily loaded shared handle.
    pub fn from_shared(shared: &SharedPipeline) -> Result<Self, PredictError> {
        Ok(Self::new(shared.get()?))
    }

    pub fn pipeline(&self) -> &FittedPipeline {
        &self.pipeline
    }

    pub fn predict(&self, raw: &RawRecord) -> Result<PredictionResult, PredictError> {
        predict_with(&self.pipeline.schema, &self.pipeline.forest, raw)
    }
}

/// Reindex `raw` to `schema`, encode it and score it with `classifier`.
///
/// The classifier is not consulted when the input lacks a schema column.
pub fn predict_with<C: Classifier>(
    schema: &FeatureSchema,
    classifier: &C,
    raw: &RawRecord,
) -> Result<PredictionResult, PredictError> {
    let reindexed = schema.reindex(raw)?;
    let encoded = schema.transform(&reindexed)?.insert_axis(Axis(0));
    let probability = classifier.predict_proba(&encoded)[0];
    let label = classifier.predict(&encoded)[0];
    debug!("Predicted label {label} with probability {probability:.3}");
    Ok(PredictionResult {
        label: u8::from(label == POSITIVE),
        probability,
    })
}
