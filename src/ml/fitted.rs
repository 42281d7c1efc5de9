use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::forest::RandomForest;
use super::pipeline::{FeatureSchema, SchemaMismatch};
use crate::dataset::RawRecord;

/// Artifact layout version written by this build.
pub const FORMAT_VERSION: u32 = 1;

/// Provenance recorded alongside the trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineMetadata {
    pub format_version: u32,
    /// Rows in the training partition.
    pub trained_rows: usize,
    /// Seed used for the split and bootstrap sampling.
    pub seed: u64,
}

/// Feature encoding and trained classifier, persisted as one unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedPipeline {
    pub metadata: PipelineMetadata,
    pub schema: FeatureSchema,
    pub forest: RandomForest,
}

impl FittedPipeline {
    /// Structural checks run after loading.
    pub fn validate(&self) -> Result<(), String> {
        if self.metadata.format_version != FORMAT_VERSION {
            return Err(format!(
                "Unsupported format_version {} (expected {FORMAT_VERSION})",
                self.metadata.format_version
            ));
        }
        self.forest.validate()?;
        if self.forest.n_features() != self.schema.width() {
            return Err(format!(
                "Classifier expects {} features but schema encodes {}",
                self.forest.n_features(),
                self.schema.width()
            ));
        }
        Ok(())
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.schema.feature_names()
    }

    /// Encode raw rows with the learned schema.
    pub fn encode(&self, rows: &[RawRecord]) -> Result<Array2<f64>, SchemaMismatch> {
        self.schema.transform_rows(rows)
    }
}
