//! Library exports for the trainer, the prediction service, benchmarks and tests.
/// Evaluation plots and reports.
pub mod artifacts;
/// TOML settings shared by both binaries.
pub mod config;
/// CSV ingest, cleaning, schema and split helpers.
pub mod dataset;
/// Tracing setup.
pub mod logging;
/// Preprocessing, classifiers and metrics.
pub mod ml;
/// HTTP prediction service.
pub mod server;
/// End-to-end training run.
pub mod training;
