//! Solver Trace Features
//!
//! Turns the checkpoint logs of three racing optimization solvers into
//! windowed training datasets for solver-selection models.
//!
//! # Overview
//!
//! A mixed-integer solver (MIP), a constraint-programming solver (CP) and an
//! adaptive large neighbourhood search (ALNS) are run on the same instances.
//! Each logs its best objective and status at irregular checkpoints. This
//! library synchronizes the three streams per instance and builds one of
//! three datasets:
//!
//! - **BestSolver**: per-frame "is best" indicators → whole-instance label
//! - **Improvement**: per-frame running-best improvements → next frame
//! - **SwitchingImprovement**: improvement over a switching interval → dilated windows
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Solver Trace Features                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  schema/          - Checkpoint records, objectives, statuses    │
//! │  ingest/          - Log parsing, per-instance grouping, writer  │
//! │  sync/            - Stream synchronizer → aligned frames        │
//! │  labeling/        - Labels, indicators, improvement targets     │
//! │  sequence_builder/- Fixed-width windows                         │
//! │  export/          - NumPy export + metadata                     │
//! │  pipeline         - End-to-end run and summary                  │
//! │  recorder         - Drives solvers to produce logs              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use solver_trace_features::prelude::*;
//!
//! let config = DatasetConfig::default()
//!     .with_source(LogSource::per_solver_in("logs", 5.0, 300.0))
//!     .with_output_dir("datasets");
//!
//! let pipeline = DatasetPipeline::from_config(config)?;
//! let (output, files) = pipeline.run_and_export()?;
//! println!("{} examples → {}", output.examples.len(), files.features.display());
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod ingest;
pub mod labeling;
pub mod pipeline;
pub mod prelude;
pub mod recorder;
pub mod schema;
pub mod sequence_builder;
pub mod sync;

// Re-exports - Schema
pub use schema::{CheckpointRecord, Objective, SolverKind, SolverStatus};

// Re-exports - Config
pub use config::{DatasetConfig, DatasetVariant, ExperimentMetadata, LogSource};

// Re-exports - Errors
pub use error::{DatasetError, Result};

// Re-exports - Ingest
pub use ingest::{load_streams, CheckpointLogWriter, GroupedStreams, StreamSet};

// Re-exports - Synchronization
pub use sync::{AlignedFrame, InstanceTrace, StreamSynchronizer, SyncPolicy};

// Re-exports - Labeling
pub use labeling::{
    best_indicator, improvement_series, indicator_series, instance_label, switching_improvements,
    ImprovementTracker, LabelStats,
};

// Re-exports - Sequence Building
pub use sequence_builder::{SequenceBuilder, SequenceConfig, Target, TrainingExample};

// Re-exports - Export
pub use export::{load_dataset, DatasetArrays, ExportMetadata, NumpyExporter, Targets};

// Re-exports - Pipeline
pub use pipeline::{DatasetPipeline, PipelineOutput, RunSummary, SkipReason};

// Re-exports - Recording
pub use recorder::{SolveResult, SolveStatistics, Solver, TraceRecorder};
