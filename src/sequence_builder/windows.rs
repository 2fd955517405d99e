//! Training examples and the batch window rules.

use super::{SequenceBuilder, SequenceConfig, SequenceError};
use crate::labeling::FrameVector;
use crate::schema::SolverKind;

/// Supervised target of one example.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target {
    /// Whole-instance best solver
    Label(SolverKind),

    /// Per-solver continuous target
    Vector(FrameVector),
}

impl Target {
    /// Label, if this is a classification target.
    pub fn label(&self) -> Option<SolverKind> {
        match self {
            Self::Label(kind) => Some(*kind),
            Self::Vector(_) => None,
        }
    }

    /// Vector, if this is a regression target.
    pub fn vector(&self) -> Option<&FrameVector> {
        match self {
            Self::Label(_) => None,
            Self::Vector(v) => Some(v),
        }
    }
}

/// One flattened feature window and its target.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExample {
    /// `time_horizon × 3` entries, oldest frame first
    pub features: Vec<f64>,

    /// Target
    pub target: Target,
}

impl TrainingExample {
    /// Window paired with the instance label.
    pub fn classification(features: Vec<f64>, label: SolverKind) -> Self {
        Self {
            features,
            target: Target::Label(label),
        }
    }

    /// Window paired with the following frame's vector.
    pub fn regression(features: Vec<f64>, next: FrameVector) -> Self {
        Self {
            features,
            target: Target::Vector(next),
        }
    }
}

/// Streaming classification windows over one instance's indicator series.
///
/// Every window carries the same instance `label`.
pub fn classification_windows(
    series: &[FrameVector],
    label: SolverKind,
    config: &SequenceConfig,
) -> Result<Vec<TrainingExample>, SequenceError> {
    let mut builder = SequenceBuilder::with_config(config.clone())?;
    let mut examples = Vec::new();
    for frame in series {
        if let Some(window) = builder.push(frame)? {
            examples.push(TrainingExample::classification(window, label));
        }
    }
    Ok(examples)
}

/// Sequence-to-one regression windows.
///
/// For every start `i` in `0..len − H`, the features are frames `i..i+H` and
/// the target is frame `i+H`. Fewer than `H + 1` frames yield nothing.
pub fn regression_windows(series: &[FrameVector], time_horizon: usize) -> Vec<TrainingExample> {
    dilated_windows(series, time_horizon, 1)
}

/// Regression windows whose frames are `dilation` apart.
///
/// Features are `series[i + d·j]` for `j in 0..H`, the target is
/// `series[i + d·H]`, for every `i` in `0..len − d·H`.
pub fn dilated_windows(
    series: &[FrameVector],
    time_horizon: usize,
    dilation: usize,
) -> Vec<TrainingExample> {
    let dilation = dilation.max(1);
    let span = dilation * time_horizon;
    if time_horizon == 0 || series.len() <= span {
        return Vec::new();
    }

    (0..series.len() - span)
        .map(|i| {
            let features = (0..time_horizon)
                .flat_map(|j| series[i + dilation * j])
                .collect();
            TrainingExample::regression(features, series[i + span])
        })
        .collect()
}
