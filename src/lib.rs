//! Energy consumption forecasting pipeline and serving API.
//!
//! Offline stages ingest raw meter CSVs, build lag/calendar features,
//! train several forecasting families and persist their artifacts; the
//! serving layer exposes health, model listing, metrics retrieval and
//! prediction endpoints over the same artifacts.

pub mod api;
pub mod config;
pub mod data;
pub mod dataset;
pub mod error;
pub mod experiment;
pub mod features;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod telemetry;
