//! Dataset configuration management.
//!
//! This module provides a single configuration struct for the whole
//! log → frames → windows → arrays run, with serialization support for
//! experiment reproducibility.
//!
//! # Features
//!
//! - **Unified Configuration**: timing, windowing, variant and log locations
//! - **Serialization**: Save/load configurations to TOML or JSON
//! - **Validation**: Reject inconsistent settings before any log is read
//!
//! # Example
//!
//! ```ignore
//! use solver_trace_features::config::{DatasetConfig, DatasetVariant};
//!
//! let config = DatasetConfig::default()
//!     .with_variant(DatasetVariant::SwitchingImprovement { switch_interval: 20.0 });
//! config.save_toml("experiment.toml")?;
//!
//! let loaded = DatasetConfig::load_toml("experiment.toml")?;
//! ```

use crate::error::{DatasetError, Result};
use crate::schema::{SolverKind, SOLVER_COUNT};
use crate::sync::SyncPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Tolerance used when checking that the switching interval is a multiple of
/// the checkpoint interval.
const MULTIPLE_TOLERANCE: f64 = 1e-5;

/// Instances the CP model cannot solve in the reference benchmark set.
const DEFAULT_SKIP_LIST: [&str; 3] = ["d1655", "d2103", "fl3795"];

/// Which dataset to build.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DatasetVariant {
    /// "Which solver wins this instance" classification.
    ///
    /// Features: per-frame is-best indicators. Target: whole-instance label.
    BestSolver,

    /// "How much will each solver improve next" regression.
    ///
    /// Features and target: per-frame running-best improvements.
    Improvement,

    /// Improvement over a switching interval `t` (a multiple of the checkpoint
    /// interval), windowed with a dilation of `t / Δt` frames.
    SwitchingImprovement {
        /// Seconds between potential solver switches
        switch_interval: f64,
    },
}

impl DatasetVariant {
    /// Whether targets are integer labels (vs. improvement vectors).
    pub fn is_classification(&self) -> bool {
        matches!(self, DatasetVariant::BestSolver)
    }

    /// Short name used in logs and metadata.
    pub fn name(&self) -> &'static str {
        match self {
            DatasetVariant::BestSolver => "best_solver",
            DatasetVariant::Improvement => "improvement",
            DatasetVariant::SwitchingImprovement { .. } => "switching_improvement",
        }
    }
}

/// Where the checkpoint logs live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogSource {
    /// One log per solver, each recorded by an independent run.
    PerSolver {
        /// MIP log
        mip: PathBuf,
        /// CP log
        cp: PathBuf,
        /// ALNS log
        alns: PathBuf,
    },

    /// One log whose rows cycle MIP, CP, ALNS (shared round-robin run).
    Interleaved {
        /// Log path
        path: PathBuf,
    },
}

impl LogSource {
    /// Per-solver logs using the recorder's file naming
    /// (`rawdata_{MODEL}_t{Δt}_T{T}.csv`) inside `dir`.
    pub fn per_solver_in<P: AsRef<Path>>(dir: P, checkpoint_interval: f64, total_budget: f64) -> Self {
        let dir = dir.as_ref();
        let name = |kind: SolverKind| {
            dir.join(format!(
                "rawdata_{}_t{}_T{}.csv",
                kind.name(),
                checkpoint_interval,
                total_budget
            ))
        };
        LogSource::PerSolver {
            mip: name(SolverKind::Mip),
            cp: name(SolverKind::Cp),
            alns: name(SolverKind::Alns),
        }
    }

    /// Interleaved log using the recorder's file naming
    /// (`rawdata_rnn_t{t}_T{T}.csv`) inside `dir`.
    pub fn interleaved_in<P: AsRef<Path>>(dir: P, time_slice: f64, total_budget: f64) -> Self {
        LogSource::Interleaved {
            path: dir
                .as_ref()
                .join(format!("rawdata_rnn_t{time_slice}_T{total_budget}.csv")),
        }
    }

    /// Synchronization policy matching how the logs were recorded.
    pub fn sync_policy(&self) -> SyncPolicy {
        match self {
            LogSource::PerSolver { .. } => SyncPolicy::independent(),
            LogSource::Interleaved { .. } => SyncPolicy::round_robin(),
        }
    }
}

/// Experiment metadata for tracking and reproducibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentMetadata {
    /// Experiment name
    pub name: String,

    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Custom tags
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// Unified dataset configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Δt: seconds between two checkpoints of the same solver
    pub checkpoint_interval: f64,

    /// T: wall-clock budget per instance (seconds)
    pub total_budget: f64,

    /// H: frames per feature window
    pub time_horizon: usize,

    /// s: keep every s-th frame (classification variant only)
    #[serde(default = "default_stride")]
    pub stride: usize,

    /// Instances excluded from processing (ids, with or without extension)
    #[serde(default = "default_skip_list")]
    pub skip_list: Vec<String>,

    /// Directory the arrays are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Dataset to build
    pub variant: DatasetVariant,

    /// Input logs
    pub source: LogSource,

    /// Experiment metadata (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ExperimentMetadata>,
}

fn default_stride() -> usize {
    1
}

fn default_skip_list() -> Vec<String> {
    DEFAULT_SKIP_LIST.iter().map(|s| s.to_string()).collect()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            checkpoint_interval: 5.0,
            total_budget: 300.0,
            time_horizon: 3,
            stride: default_stride(),
            variant: DatasetVariant::BestSolver,
            skip_list: default_skip_list(),
            source: LogSource::per_solver_in(".", 5.0, 300.0),
            output_dir: default_output_dir(),
            metadata: None,
        }
    }
}

impl DatasetConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the checkpoint interval Δt.
    pub fn with_checkpoint_interval(mut self, seconds: f64) -> Self {
        self.checkpoint_interval = seconds;
        self
    }

    /// Set the per-instance budget T.
    pub fn with_total_budget(mut self, seconds: f64) -> Self {
        self.total_budget = seconds;
        self
    }

    /// Set the window length H.
    pub fn with_time_horizon(mut self, frames: usize) -> Self {
        self.time_horizon = frames;
        self
    }

    /// Set the subsampling stride s.
    pub fn with_stride(mut self, stride: usize) -> Self {
        self.stride = stride;
        self
    }

    /// Set the dataset variant.
    pub fn with_variant(mut self, variant: DatasetVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Set the log source.
    pub fn with_source(mut self, source: LogSource) -> Self {
        self.source = source;
        self
    }

    /// Replace the skip list.
    pub fn with_skip_list<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_list = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Set the output directory.
    pub fn with_output_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.output_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set experiment metadata.
    pub fn with_metadata(mut self, metadata: ExperimentMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Validate the configuration.
    ///
    /// Range problems yield [`DatasetError::InvalidConfig`]; a switching
    /// interval that is not a whole multiple of Δt yields
    /// [`DatasetError::ConfigurationMismatch`].
    pub fn validate(&self) -> Result<()> {
        if !(self.checkpoint_interval.is_finite() && self.checkpoint_interval > 0.0) {
            return Err(DatasetError::InvalidConfig(format!(
                "checkpoint_interval must be > 0 (got {})",
                self.checkpoint_interval
            )));
        }
        if !(self.total_budget.is_finite() && self.total_budget > 0.0) {
            return Err(DatasetError::InvalidConfig(format!(
                "total_budget must be > 0 (got {})",
                self.total_budget
            )));
        }
        if self.time_horizon == 0 {
            return Err(DatasetError::InvalidConfig(
                "time_horizon must be > 0".to_string(),
            ));
        }
        if self.stride == 0 {
            return Err(DatasetError::InvalidConfig("stride must be > 0".to_string()));
        }
        self.switch_step()?;
        Ok(())
    }

    /// Frames per switching interval (`t / Δt`); 1 for the other variants.
    pub fn switch_step(&self) -> Result<usize> {
        match self.variant {
            DatasetVariant::SwitchingImprovement { switch_interval } => {
                let ratio = switch_interval / self.checkpoint_interval;
                if !ratio.is_finite() || ratio < 1.0 - MULTIPLE_TOLERANCE {
                    return Err(DatasetError::ConfigurationMismatch(format!(
                        "switch_interval ({switch_interval}) must be a positive multiple of \
                         checkpoint_interval ({})",
                        self.checkpoint_interval
                    )));
                }
                if (ratio - ratio.round()).abs() >= MULTIPLE_TOLERANCE {
                    return Err(DatasetError::ConfigurationMismatch(format!(
                        "switch_interval ({switch_interval}) is not a multiple of \
                         checkpoint_interval ({})",
                        self.checkpoint_interval
                    )));
                }
                Ok(ratio.round() as usize)
            }
            _ => Ok(1),
        }
    }

    /// Elapsed time beyond which an instance is considered out of budget
    /// (`T − Δt`).
    pub fn cutoff(&self) -> f64 {
        self.total_budget - self.checkpoint_interval
    }

    /// Entries per feature window (`H × 3`).
    pub fn feature_width(&self) -> usize {
        self.time_horizon * SOLVER_COUNT
    }

    /// Whether `instance_id` is on the skip list.
    pub fn is_skipped(&self, instance_id: &str) -> bool {
        let id = strip_extension(instance_id);
        self.skip_list.iter().any(|s| strip_extension(s) == id)
    }

    /// File stem encoding the configuration, shared by the feature and target
    /// arrays (without the `X_` / `y_` prefix).
    pub fn file_stem(&self) -> String {
        let dt = self.checkpoint_interval;
        let total = self.total_budget;
        let h = self.time_horizon;
        match self.variant {
            DatasetVariant::BestSolver => {
                format!("t{}_T{total}_h{h}", dt * self.stride as f64)
            }
            DatasetVariant::Improvement => format!("rnn_t{dt}_T{total}_h{h}"),
            DatasetVariant::SwitchingImprovement { switch_interval } => {
                format!("rnn_delta{dt}_t{switch_interval}_T{total}_h{h}")
            }
        }
    }

    /// Save configuration to TOML file.
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        fs::write(path, toml_string)?;
        Ok(())
    }

    /// Load configuration from TOML file (validated).
    pub fn load_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: DatasetConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json_string = serde_json::to_string_pretty(self)?;
        fs::write(path, json_string)?;
        Ok(())
    }

    /// Load configuration from JSON file (validated).
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: DatasetConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }
}

/// Drop the last `.ext`, if any.
fn strip_extension(id: &str) -> &str {
    id.rsplit_once('.').map_or(id, |(stem, _)| stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = DatasetConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.feature_width(), 9);
        assert_eq!(config.cutoff(), 295.0);
    }

    #[test]
    fn test_rejects_zero_horizon_and_stride() {
        let config = DatasetConfig::default().with_time_horizon(0);
        assert!(matches!(config.validate(), Err(DatasetError::InvalidConfig(_))));

        let config = DatasetConfig::default().with_stride(0);
        assert!(matches!(config.validate(), Err(DatasetError::InvalidConfig(_))));

        let config = DatasetConfig::default().with_checkpoint_interval(0.0);
        assert!(matches!(config.validate(), Err(DatasetError::InvalidConfig(_))));
    }

    #[test]
    fn test_switch_step_multiple() {
        let config = DatasetConfig::default()
            .with_variant(DatasetVariant::SwitchingImprovement { switch_interval: 20.0 });
        assert_eq!(config.switch_step().unwrap(), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_switch_step_not_multiple_is_mismatch() {
        let config = DatasetConfig::default()
            .with_variant(DatasetVariant::SwitchingImprovement { switch_interval: 12.0 });
        assert!(matches!(
            config.validate(),
            Err(DatasetError::ConfigurationMismatch(_))
        ));

        let config = DatasetConfig::default()
            .with_variant(DatasetVariant::SwitchingImprovement { switch_interval: 2.5 });
        assert!(matches!(
            config.switch_step(),
            Err(DatasetError::ConfigurationMismatch(_))
        ));
    }

    #[test]
    fn test_skip_list_ignores_extension() {
        let config = DatasetConfig::default();
        assert!(config.is_skipped("d1655"));
        assert!(config.is_skipped("d1655.tsp"));
        assert!(!config.is_skipped("berlin52"));

        let config = config.with_skip_list(["berlin52.tsp"]);
        assert!(config.is_skipped("berlin52"));
        assert!(!config.is_skipped("d1655"));
    }

    #[test]
    fn test_skip_list_strips_only_last_extension() {
        let config = DatasetConfig::default().with_skip_list(["fl3795"]);
        assert!(config.is_skipped("fl3795.tsp"));
        assert!(!config.is_skipped("fl3795.v2.tsp"));

        let config = config.with_skip_list(["fl3795.v2.tsp"]);
        assert!(config.is_skipped("fl3795.v2.tsp"));
        assert!(!config.is_skipped("fl3795.v3.tsp"));
        assert!(!config.is_skipped("fl3795.tsp"));
    }

    #[test]
    fn test_file_stems() {
        let config = DatasetConfig::default().with_stride(2);
        assert_eq!(config.file_stem(), "t10_T300_h3");

        let config = DatasetConfig::default()
            .with_checkpoint_interval(20.0)
            .with_variant(DatasetVariant::Improvement);
        assert_eq!(config.file_stem(), "rnn_t20_T300_h3");

        let config = DatasetConfig::default()
            .with_variant(DatasetVariant::SwitchingImprovement { switch_interval: 20.0 });
        assert_eq!(config.file_stem(), "rnn_delta5_t20_T300_h3");
    }

    #[test]
    fn test_source_file_naming() {
        let source = LogSource::per_solver_in("logs", 5.0, 300.0);
        match source {
            LogSource::PerSolver { mip, cp, alns } => {
                assert_eq!(mip, Path::new("logs/rawdata_MIP_t5_T300.csv"));
                assert_eq!(cp, Path::new("logs/rawdata_CP_t5_T300.csv"));
                assert_eq!(alns, Path::new("logs/rawdata_ALNS_t5_T300.csv"));
            }
            other => panic!("unexpected source {other:?}"),
        }
        assert_eq!(
            LogSource::interleaved_in("logs", 20.0, 300.0),
            LogSource::Interleaved {
                path: PathBuf::from("logs/rawdata_rnn_t20_T300.csv")
            }
        );
    }

    #[test]
    fn test_toml_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dataset.toml");

        let config = DatasetConfig::default()
            .with_variant(DatasetVariant::SwitchingImprovement { switch_interval: 20.0 })
            .with_source(LogSource::interleaved_in("logs", 20.0, 300.0))
            .with_metadata(ExperimentMetadata {
                name: "tsp-switching".to_string(),
                description: None,
                tags: Some(vec!["tsp".to_string()]),
            });
        config.save_toml(&path).unwrap();

        let loaded = DatasetConfig::load_toml(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_json_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dataset.json");

        let config = DatasetConfig::default().with_variant(DatasetVariant::Improvement);
        config.save_json(&path).unwrap();
        assert_eq!(DatasetConfig::load_json(&path).unwrap(), config);
    }

    #[test]
    fn test_toml_defaults_applied() {
        let toml_str = r#"
checkpoint_interval = 5.0
total_budget = 300.0
time_horizon = 3

[variant]
kind = "best_solver"

[source]
kind = "interleaved"
path = "rawdata_rnn_t20_T300.csv"
"#;
        let config: DatasetConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.stride, 1);
        assert_eq!(config.skip_list.len(), 3);
        assert_eq!(config.output_dir, PathBuf::from("."));
    }
}
