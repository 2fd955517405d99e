//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types for building a dataset
//! end to end.
//!
//! # Usage
//!
//! ```ignore
//! use solver_trace_features::prelude::*;
//!
//! let config = DatasetConfig::load_toml("experiment.toml")?;
//! let pipeline = DatasetPipeline::from_config(config)?;
//! let output = pipeline.run()?;
//! ```
//!
//! # What's Included
//!
//! ## Core Pipeline
//! - [`DatasetPipeline`] - Main processing pipeline
//! - [`DatasetConfig`] - Run configuration
//! - [`PipelineOutput`] - Examples plus [`RunSummary`]
//!
//! ## Records and Frames
//! - [`CheckpointRecord`], [`Objective`], [`SolverKind`], [`SolverStatus`]
//! - [`StreamSynchronizer`], [`AlignedFrame`], [`InstanceTrace`]
//!
//! ## Windows and Export
//! - [`SequenceBuilder`], [`TrainingExample`], [`Target`]
//! - [`NumpyExporter`], [`load_dataset`]

// ============================================================================
// Core Pipeline
// ============================================================================

pub use crate::config::{DatasetConfig, DatasetVariant, ExperimentMetadata, LogSource};
pub use crate::error::{DatasetError, Result};
pub use crate::pipeline::{
    finalize_instance, DatasetPipeline, PipelineOutput, RunSummary, SkipReason, SkippedInstance,
};

// ============================================================================
// Records, Ingestion and Synchronization
// ============================================================================

pub use crate::ingest::{load_streams, CheckpointLogWriter, GroupedStreams, StreamSet};
pub use crate::schema::{CheckpointRecord, Objective, SolverKind, SolverStatus, SOLVER_COUNT};
pub use crate::sync::{AlignedFrame, InstanceTrace, StreamSynchronizer, SyncPolicy};

// ============================================================================
// Labeling and Windows
// ============================================================================

pub use crate::labeling::{
    improvement_series, indicator_series, instance_label, switching_improvements, FrameVector,
    LabelStats,
};
pub use crate::sequence_builder::{
    classification_windows, dilated_windows, regression_windows, SequenceBuilder, SequenceConfig,
    Target, TrainingExample,
};

// ============================================================================
// Export
// ============================================================================

pub use crate::export::{load_dataset, DatasetArrays, ExportedFiles, NumpyExporter, Targets};

// ============================================================================
// Recording
// ============================================================================

pub use crate::recorder::{SolveResult, SolveStatistics, Solver, TraceRecorder};
