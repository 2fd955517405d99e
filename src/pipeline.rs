//! Unified Pipeline for Solver-Trace Datasets
//!
//! Connects all components for one dataset build:
//! - Log ingestion and per-instance grouping
//! - Stream synchronization (one [`InstanceTrace`] per instance)
//! - Label / target extraction
//! - Window building
//! - NumPy export
//!
//! # Architecture
//!
//! ```text
//! checkpoint logs → load_streams → StreamSet ─┐
//!                                              ↓ (one instance at a time)
//!                               StreamSynchronizer::synchronize
//!                                              ↓
//!                                       InstanceTrace
//!                                              ↓
//!                          finalize_instance (labels + windows)
//!                                              ↓
//!                              Vec<TrainingExample> (appended)
//!                                              ↓
//!                                NumpyExporter::export
//! ```
//!
//! Each instance is finalized by a pure function whose result is appended to
//! the run's accumulator, so no state carries over from one instance to the
//! next. Instances are processed in the order they first appear in the logs,
//! which makes the output deterministic.
//!
//! # Error Policy
//!
//! | Problem | Effect |
//! |---------|--------|
//! | invalid configuration, malformed log | run aborts before any output |
//! | truncated trace | instance skipped, run continues |
//! | too few frames for one window | instance contributes nothing, run continues |
//! | skip-listed instance | excluded before synchronization |
//!
//! # Example
//!
//! ```ignore
//! use solver_trace_features::prelude::*;
//!
//! let config = DatasetConfig::load_toml("experiment.toml")?;
//! let pipeline = DatasetPipeline::from_config(config)?;
//! let (output, files) = pipeline.run_and_export()?;
//!
//! println!("{} examples in {}", output.examples.len(), files.features.display());
//! ```

use crate::config::{DatasetConfig, DatasetVariant};
use crate::error::{DatasetError, Result};
use crate::export::{ExportedFiles, NumpyExporter};
use crate::ingest::{load_streams, GroupedStreams};
use crate::labeling::{
    improvement_series, indicator_series, instance_label, switching_improvements, LabelStats,
};
use crate::schema::SolverKind;
use crate::sequence_builder::{
    classification_windows, dilated_windows, regression_windows, SequenceConfig, TrainingExample,
};
use crate::sync::{InstanceTrace, StreamSynchronizer};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Why an instance contributed no examples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Listed in the configuration's skip list
    SkipList,

    /// A solver's stream ended before the instance finished
    TruncatedTrace {
        /// Solver whose queue ran dry
        solver: SolverKind,
        /// Frames emitted before the underflow
        frames: usize,
    },

    /// Fewer frames than one window needs
    InsufficientHistory {
        /// Frames the instance produced
        frames: usize,
        /// Frames needed for one example
        required: usize,
    },
}

impl SkipReason {
    /// Short name used in summaries.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SkipList => "skip list",
            Self::TruncatedTrace { .. } => "truncated trace",
            Self::InsufficientHistory { .. } => "insufficient history",
        }
    }
}

/// One instance that contributed no examples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedInstance {
    /// Instance identifier
    pub instance_id: String,

    /// Why
    pub reason: SkipReason,
}

/// Skipped instances counted by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SkipCounts {
    /// Skip-listed
    pub skip_list: usize,
    /// Truncated traces
    pub truncated: usize,
    /// Too short for one window
    pub insufficient_history: usize,
}

/// End-of-run report.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Instances that contributed at least one example
    pub instances_processed: usize,

    /// Instances that contributed nothing, with the reason
    pub skipped: Vec<SkippedInstance>,

    /// Frames produced by the synchronizer across all instances
    pub frames: usize,

    /// Records left over in queues after their instance finished
    pub unconsumed_records: usize,

    /// Training examples emitted
    pub examples: usize,

    /// Instance labels (classification variant only)
    pub label_stats: Option<LabelStats>,
}

impl RunSummary {
    /// Processed plus skipped.
    pub fn instances_total(&self) -> usize {
        self.instances_processed + self.skipped.len()
    }

    /// Skipped instances grouped by reason.
    pub fn skip_counts(&self) -> SkipCounts {
        let mut counts = SkipCounts::default();
        for s in &self.skipped {
            match s.reason {
                SkipReason::SkipList => counts.skip_list += 1,
                SkipReason::TruncatedTrace { .. } => counts.truncated += 1,
                SkipReason::InsufficientHistory { .. } => counts.insufficient_history += 1,
            }
        }
        counts
    }

    fn skip(&mut self, instance_id: impl Into<String>, reason: SkipReason) {
        self.skipped.push(SkippedInstance {
            instance_id: instance_id.into(),
            reason,
        });
    }
}

/// Output from pipeline processing
#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
    /// Examples in instance order, then window order
    pub examples: Vec<TrainingExample>,

    /// Counts and skipped instances
    pub summary: RunSummary,
}

/// What one finished instance contributes.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceOutcome {
    /// Whole-instance label (classification variant only)
    pub label: Option<SolverKind>,

    /// Windows of this instance
    pub examples: Vec<TrainingExample>,
}

/// Frames one instance needs to yield a single example.
pub fn required_frames(config: &DatasetConfig, switch_step: usize) -> usize {
    let h = config.time_horizon;
    match config.variant {
        DatasetVariant::BestSolver => (h + 1) * config.stride,
        DatasetVariant::Improvement => h + 1,
        DatasetVariant::SwitchingImprovement { .. } => switch_step * (h + 1) + 1,
    }
}

/// Turn a synchronized instance into training examples.
///
/// Pure: the result depends only on `trace` and the configuration.
pub fn finalize_instance(
    trace: &InstanceTrace,
    config: &DatasetConfig,
    switch_step: usize,
) -> Result<InstanceOutcome> {
    let h = config.time_horizon;
    match config.variant {
        DatasetVariant::BestSolver => {
            let label = instance_label(trace);
            let windows = SequenceConfig::new(h, config.stride);
            let examples = classification_windows(&indicator_series(trace), label, &windows)
                .map_err(|e| DatasetError::InvalidConfig(e.to_string()))?;
            Ok(InstanceOutcome {
                label: Some(label),
                examples,
            })
        }
        DatasetVariant::Improvement => Ok(InstanceOutcome {
            label: None,
            examples: regression_windows(&improvement_series(trace), h),
        }),
        DatasetVariant::SwitchingImprovement { .. } => {
            let series = switching_improvements(trace, switch_step);
            Ok(InstanceOutcome {
                label: None,
                examples: dilated_windows(&series, h, switch_step),
            })
        }
    }
}

/// Dataset build for one configuration.
#[derive(Debug, Clone)]
pub struct DatasetPipeline {
    config: DatasetConfig,
    synchronizer: StreamSynchronizer,
    switch_step: usize,
}

impl DatasetPipeline {
    /// Validate `config` and set up the synchronizer.
    ///
    /// # Errors
    ///
    /// [`DatasetError::InvalidConfig`] or [`DatasetError::ConfigurationMismatch`].
    pub fn from_config(config: DatasetConfig) -> Result<Self> {
        config.validate()?;
        let switch_step = config.switch_step()?;
        let synchronizer = StreamSynchronizer::from_config(&config);
        Ok(Self {
            config,
            synchronizer,
            switch_step,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    /// Synchronizer used for every instance.
    pub fn synchronizer(&self) -> &StreamSynchronizer {
        &self.synchronizer
    }

    /// Read the configured logs and build all examples.
    pub fn run(&self) -> Result<PipelineOutput> {
        info!(
            variant = self.config.variant.name(),
            interval = self.config.checkpoint_interval,
            budget = self.config.total_budget,
            horizon = self.config.time_horizon,
            "loading checkpoint logs"
        );
        let grouped = load_streams(&self.config.source, |id| self.config.is_skipped(id))?;
        self.process(grouped)
    }

    /// Build all examples from already grouped streams.
    pub fn process(&self, grouped: GroupedStreams) -> Result<PipelineOutput> {
        let GroupedStreams { sets, excluded } = grouped;
        let mut output = PipelineOutput::default();
        let mut labels = LabelStats::default();
        let required = required_frames(&self.config, self.switch_step);

        for id in excluded {
            debug!(instance = %id, "instance on skip list");
            output.summary.skip(id, SkipReason::SkipList);
        }

        info!(instances = sets.len(), "synchronizing instances");

        for set in sets {
            let instance_id = set.instance_id.clone();
            let trace = match self.synchronizer.synchronize(set) {
                Ok(trace) => trace,
                Err(e) if e.is_instance_local() => {
                    warn!(instance = %instance_id, error = %e, "skipping instance");
                    if let DatasetError::TruncatedTrace { solver, frames, .. } = e {
                        output
                            .summary
                            .skip(instance_id, SkipReason::TruncatedTrace { solver, frames });
                    }
                    continue;
                }
                Err(e) => return Err(e),
            };

            output.summary.frames += trace.len();
            output.summary.unconsumed_records += trace.unconsumed_records;

            let outcome = finalize_instance(&trace, &self.config, self.switch_step)?;
            if let Some(label) = outcome.label {
                labels.record(label);
            }

            if outcome.examples.is_empty() {
                debug!(
                    instance = %instance_id,
                    frames = trace.len(),
                    required,
                    "instance too short for one window"
                );
                output.summary.skip(
                    instance_id,
                    SkipReason::InsufficientHistory {
                        frames: trace.len(),
                        required,
                    },
                );
                continue;
            }

            debug!(
                instance = %instance_id,
                frames = trace.len(),
                examples = outcome.examples.len(),
                label = ?outcome.label,
                "finalized instance"
            );
            output.summary.instances_processed += 1;
            output.examples.extend(outcome.examples);
        }

        output.summary.examples = output.examples.len();
        if self.config.variant.is_classification() {
            if labels.has_minority_class() {
                warn!(
                    balance = ?labels.class_balance(),
                    "a solver wins fewer than 10% of the instances"
                );
            }
            output.summary.label_stats = Some(labels);
        }

        let counts = output.summary.skip_counts();
        info!(
            processed = output.summary.instances_processed,
            skipped = output.summary.skipped.len(),
            truncated = counts.truncated,
            examples = output.summary.examples,
            "dataset built"
        );

        Ok(output)
    }

    /// Run, then write the arrays to the configured output directory.
    pub fn run_and_export(&self) -> Result<(PipelineOutput, ExportedFiles)> {
        let output = self.run()?;
        let files = NumpyExporter::new(&self.config.output_dir).export(&self.config, &output.examples)?;
        Ok((output, files))
    }
}
