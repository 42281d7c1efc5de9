//! Library exports for the command-line tools, benchmarks and tests.
/// Application directory helpers.
pub mod app_dirs;
/// Settings loaded from `macadvisor.toml`.
pub mod config;
/// Workplace records: synthesis, CSV writing and loading.
pub mod dataset;
/// Tracing setup shared by the binaries.
pub mod logging;
/// Feature encoding, classifier, training, persistence and inference.
pub mod ml;
