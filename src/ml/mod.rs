//! Machine learning pieces for the Mac recommendation model.
//!
//! Data flows from a loaded dataset through [`pipeline`] encoding and the
//! [`forest`] classifier into a [`FittedPipeline`] that [`store`] persists.
//! [`predict`] and [`explain`] consume the stored pipeline read-only.

pub mod explain;
pub mod fitted;
pub mod forest;
pub mod metrics;
pub mod pipeline;
pub mod predict;
pub mod split;
pub mod store;
pub mod train;
pub mod tree;

pub use explain::{ExplainOptions, FeatureImportance, ImportanceReport, explain};
pub use fitted::FittedPipeline;
pub use forest::{Classifier, ForestOptions, RandomForest};
pub use pipeline::{FeatureSchema, SchemaMismatch};
pub use predict::{PredictError, PredictionResult, PredictionService};
pub use store::{SharedPipeline, StoreError, load_pipeline, save_pipeline};
pub use train::{TrainError, TrainOptions, TrainingReport, train};
