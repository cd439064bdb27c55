use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use serde::Deserialize;

use crate::error::{PipelineError, Result};

/// Top-level configuration, loaded from a YAML file merged with
/// `GRIDPULSE__`-prefixed environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub paths: PathsConfig,
    pub data: DataConfig,
    pub training: TrainingConfig,
    #[serde(rename = "mlflow", default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub models: ModelsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    pub raw_dir: PathBuf,
    pub processed_dir: PathBuf,
    pub features_file: PathBuf,
    pub models_dir: PathBuf,
    pub artifacts_dir: PathBuf,
    pub reports_dir: PathBuf,
}

impl PathsConfig {
    pub fn clean_data_file(&self) -> PathBuf {
        self.processed_dir.join("clean_data.csv")
    }

    pub fn scaler_file(&self) -> PathBuf {
        self.artifacts_dir.join("scaler.json")
    }

    pub fn metrics_summary_file(&self) -> PathBuf {
        self.reports_dir.join("metrics_summary.json")
    }

    pub fn metrics_summary_csv(&self) -> PathBuf {
        self.reports_dir.join("metrics_summary.csv")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    pub datetime_cols: DatetimeCols,
    pub consumption_col: String,
    #[serde(default = "default_true")]
    pub dayfirst: bool,
    pub resample_freq: String,
    #[serde(default)]
    pub fillna_method: FillMethod,
    #[serde(default)]
    pub threshold_on: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatetimeCols {
    pub date_col: String,
    pub time_col: String,
}

/// Gap-filling policy applied after resampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FillMethod {
    #[default]
    Zero,
    Ffill,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrainingConfig {
    pub target_col: String,
    #[serde(default = "default_test_size_days")]
    pub test_size_days: usize,
    #[serde(default)]
    pub scale_method: ScaleMethod,
    #[serde(default = "default_lags")]
    pub lags: Vec<usize>,
    #[serde(default = "default_roll_windows")]
    pub roll_windows: Vec<usize>,
    #[serde(default = "default_lookback")]
    pub lookback: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScaleMethod {
    None,
    #[default]
    Standard,
    Minmax,
}

/// Experiment tracking settings. The YAML section keeps the `mlflow` key so
/// existing configs and a file-based MLflow tracking layout stay compatible.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackingConfig {
    #[serde(default = "default_tracking_uri")]
    pub tracking_uri: String,
    #[serde(default = "default_experiment_name")]
    pub experiment_name: String,
    #[serde(default)]
    pub experiment_description: String,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            tracking_uri: default_tracking_uri(),
            experiment_name: default_experiment_name(),
            experiment_description: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            enable_cors: true,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| PipelineError::configuration(format!("invalid server address: {e}")))
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ModelsConfig {
    #[serde(default)]
    pub sarima: SarimaConfig,
    #[serde(default)]
    pub forest: ForestConfig,
    #[serde(default)]
    pub recurrent: RecurrentConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SarimaConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// (p, d, q); the moving-average order is accepted but not modelled.
    #[serde(default = "default_sarima_order")]
    pub order: [usize; 3],
    /// (P, D, Q, s)
    #[serde(default = "default_sarima_seasonal")]
    pub seasonal_order: [usize; 4],
}

impl Default for SarimaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            order: default_sarima_order(),
            seasonal_order: default_sarima_seasonal(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForestConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_n_trees")]
    pub n_trees: usize,
    #[serde(default = "default_max_depth")]
    pub max_depth: Option<u16>,
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            n_trees: default_n_trees(),
            max_depth: default_max_depth(),
            min_samples_split: default_min_samples_split(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecurrentConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_epochs")]
    pub epochs: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
}

impl Default for RecurrentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            epochs: default_epochs(),
            learning_rate: default_learning_rate(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file, with environment overrides
    /// (`GRIDPULSE__SERVER__PORT=9000` style).
    pub fn load(path: &Path) -> Result<Self> {
        let figment = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("GRIDPULSE__").split("__"));
        figment
            .extract()
            .map_err(|e| PipelineError::configuration(e.to_string()))
    }
}

fn default_true() -> bool {
    true
}

fn default_test_size_days() -> usize {
    30
}

fn default_lags() -> Vec<usize> {
    vec![1, 2, 3, 4, 96]
}

fn default_roll_windows() -> Vec<usize> {
    vec![4, 8, 96]
}

fn default_lookback() -> usize {
    96
}

fn default_tracking_uri() -> String {
    "file:./mlruns".to_string()
}

fn default_experiment_name() -> String {
    "default".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_sarima_order() -> [usize; 3] {
    [1, 0, 1]
}

fn default_sarima_seasonal() -> [usize; 4] {
    [1, 0, 1, 96]
}

fn default_n_trees() -> usize {
    50
}

fn default_max_depth() -> Option<u16> {
    Some(10)
}

fn default_min_samples_split() -> usize {
    5
}

fn default_epochs() -> usize {
    300
}

fn default_learning_rate() -> f64 {
    0.01
}
