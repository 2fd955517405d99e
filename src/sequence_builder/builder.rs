//! Streaming window builder.
//!
//! Frames are pushed one at a time. Only frames `s−1, 2s−1, 3s−1, …` (every
//! `stride`-th frame, counted from one) are sampled into a bounded buffer of
//! `time_horizon` frames, so with checkpoint interval Δt the sampled frames
//! sit at elapsed times `sΔt, 2sΔt, …`. When a sampled frame
//! arrives and the buffer is already full, the buffer is emitted as one
//! flattened window, the oldest frame is evicted and the new frame appended.
//! Windows therefore overlap by `time_horizon − 1` frames and a window is
//! only ever produced once a later sampled frame exists.
//!
//! # Example
//!
//! ```ignore
//! use solver_trace_features::sequence_builder::{SequenceBuilder, SequenceConfig};
//!
//! let config = SequenceConfig::new(3, 1); // 3 frames per window, every frame
//! let mut builder = SequenceBuilder::with_config(config)?;
//!
//! for indicator in indicators {
//!     if let Some(window) = builder.push(&indicator)? {
//!         examples.push(TrainingExample::classification(window, label));
//!     }
//! }
//! ```

use crate::schema::SOLVER_COUNT;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;

/// Error type for window building operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    /// Feature vector length doesn't match configured feature_count.
    #[error("Feature vector length ({actual}) doesn't match configured count ({expected})")]
    FeatureCountMismatch {
        /// Expected number of features
        expected: usize,
        /// Actual number of features received
        actual: usize,
    },

    /// Configuration rejected by [`SequenceConfig::validate`].
    #[error("Invalid window configuration: {0}")]
    InvalidConfig(String),
}

/// Configuration for window building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceConfig {
    /// Frames per window (H)
    pub time_horizon: usize,

    /// Sampling factor: only every `stride`-th frame enters the buffer
    ///
    /// - Stride 1: every frame, one window per frame beyond the first H
    /// - Stride s: frames s−1, 2s−1, 3s−1, ... of each instance
    pub stride: usize,

    /// Entries per frame (one per solver)
    pub feature_count: usize,
}

impl SequenceConfig {
    /// Create a configuration with one feature per solver.
    pub fn new(time_horizon: usize, stride: usize) -> Self {
        Self {
            time_horizon,
            stride,
            feature_count: SOLVER_COUNT,
        }
    }

    /// Set the per-frame feature count.
    pub fn with_feature_count(mut self, count: usize) -> Self {
        self.feature_count = count;
        self
    }

    /// Length of one flattened window.
    #[inline]
    pub fn window_len(&self) -> usize {
        self.time_horizon * self.feature_count
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.time_horizon == 0 {
            return Err("time_horizon must be > 0".to_string());
        }

        if self.stride == 0 {
            return Err("stride must be > 0".to_string());
        }

        if self.feature_count == 0 {
            return Err("feature_count must be > 0".to_string());
        }

        Ok(())
    }
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self::new(3, 1)
    }
}

/// Sliding-window builder over the frames of one instance.
///
/// Call [`Self::reset`] (or build a new one) between instances; windows never
/// span two instances.
#[derive(Debug, Clone)]
pub struct SequenceBuilder {
    config: SequenceConfig,

    /// Sampled frames, oldest at the front
    buffer: VecDeque<Vec<f64>>,

    /// Frames offered since the last reset (sampled or not)
    frames_seen: usize,
}

impl SequenceBuilder {
    /// Create a builder after validating the configuration.
    pub fn with_config(config: SequenceConfig) -> Result<Self, SequenceError> {
        config.validate().map_err(SequenceError::InvalidConfig)?;

        Ok(Self {
            buffer: VecDeque::with_capacity(config.time_horizon),
            config,
            frames_seen: 0,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &SequenceConfig {
        &self.config
    }

    /// Offer the next frame.
    ///
    /// Returns the flattened window (`time_horizon × feature_count` entries)
    /// that this frame completes, or `None` if the frame was not sampled or
    /// the buffer is still filling.
    pub fn push(&mut self, features: &[f64]) -> Result<Option<Vec<f64>>, SequenceError> {
        if features.len() != self.config.feature_count {
            return Err(SequenceError::FeatureCountMismatch {
                expected: self.config.feature_count,
                actual: features.len(),
            });
        }

        self.frames_seen += 1;
        if self.frames_seen % self.config.stride != 0 {
            return Ok(None);
        }

        let window = if self.buffer.len() == self.config.time_horizon {
            let flat = self.flatten();
            self.buffer.pop_front();
            Some(flat)
        } else {
            None
        };

        self.buffer.push_back(features.to_vec());
        Ok(window)
    }

    fn flatten(&self) -> Vec<f64> {
        let mut flat = Vec::with_capacity(self.config.window_len());
        for frame in &self.buffer {
            flat.extend_from_slice(frame);
        }
        flat
    }

    /// Clear the buffer for the next instance.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.frames_seen = 0;
    }

    /// Sampled frames currently buffered.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(v: f64) -> [f64; 3] {
        [v, v + 0.1, v + 0.2]
    }

    #[test]
    fn test_sequence_config_default() {
        let config = SequenceConfig::default();
        assert_eq!(config.time_horizon, 3);
        assert_eq!(config.stride, 1);
        assert_eq!(config.feature_count, 3);
        assert_eq!(config.window_len(), 9);
    }

    #[test]
    fn test_sequence_config_validation() {
        assert!(SequenceConfig::new(3, 1).validate().is_ok());
        assert!(SequenceConfig::new(0, 1).validate().is_err());
        assert!(SequenceConfig::new(3, 0).validate().is_err());
        assert!(SequenceConfig::new(3, 1)
            .with_feature_count(0)
            .validate()
            .is_err());

        let err = SequenceBuilder::with_config(SequenceConfig::new(3, 0)).unwrap_err();
        assert!(matches!(err, SequenceError::InvalidConfig(_)));
    }

    #[test]
    fn test_emit_then_slide() {
        let mut builder = SequenceBuilder::with_config(SequenceConfig::new(2, 1)).unwrap();

        assert_eq!(builder.push(&frame(1.0)).unwrap(), None);
        assert_eq!(builder.push(&frame(2.0)).unwrap(), None);
        assert_eq!(builder.buffered(), 2);

        let w = builder.push(&frame(3.0)).unwrap().unwrap();
        assert_eq!(w, vec![1.0, 1.1, 1.2, 2.0, 2.1, 2.2]);

        let w = builder.push(&frame(4.0)).unwrap().unwrap();
        assert_eq!(w, vec![2.0, 2.1, 2.2, 3.0, 3.1, 3.2]);
    }

    #[test]
    fn test_insufficient_frames_emit_nothing() {
        let mut builder = SequenceBuilder::with_config(SequenceConfig::new(3, 1)).unwrap();
        for v in [1.0, 2.0, 3.0] {
            assert!(builder.push(&frame(v)).unwrap().is_none());
        }
        assert_eq!(builder.buffered(), 3);
    }

    #[test]
    fn test_stride_samples_every_sth_frame() {
        let mut builder = SequenceBuilder::with_config(SequenceConfig::new(2, 2)).unwrap();
        let mut windows = Vec::new();
        for v in 0..8 {
            if let Some(w) = builder.push(&frame(v as f64)).unwrap() {
                windows.push(w);
            }
        }
        // Sampled frames 1, 3, 5, 7: windows at 5 and 7.
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0][0], 1.0);
        assert_eq!(windows[0][3], 3.0);
        assert_eq!(windows[1][0], 3.0);
        assert_eq!(windows[1][3], 5.0);
    }

    #[test]
    fn test_stride_samples_on_the_interval_grid() {
        // Frame k is the checkpoint at (k+1)·Δt; stride 2 keeps 2Δt, 4Δt, 6Δt.
        let mut builder = SequenceBuilder::with_config(SequenceConfig::new(1, 2)).unwrap();
        let pushed: Vec<Option<Vec<f64>>> = (0..6)
            .map(|v| builder.push(&frame(v as f64)).unwrap())
            .collect();

        let first: Vec<f64> = pushed.iter().flatten().map(|w| w[0]).collect();
        assert_eq!(first, vec![1.0, 3.0]);
        // Frame 0 is never sampled, frame 5 is still buffered.
        assert!(pushed[..3].iter().all(Option::is_none));
        assert_eq!(builder.buffered(), 1);
    }

    #[test]
    fn test_reset_restarts_the_stride_phase() {
        let mut builder = SequenceBuilder::with_config(SequenceConfig::new(1, 2)).unwrap();
        for v in 0..3 {
            builder.push(&frame(v as f64)).unwrap();
        }
        builder.reset();
        assert!(builder.push(&frame(10.0)).unwrap().is_none());
        assert_eq!(builder.buffered(), 0);
        assert!(builder.push(&frame(11.0)).unwrap().is_none());
        assert_eq!(builder.buffered(), 1);
    }

    #[test]
    fn test_reset_isolates_instances() {
        let mut builder = SequenceBuilder::with_config(SequenceConfig::new(1, 1)).unwrap();
        builder.push(&frame(1.0)).unwrap();
        builder.reset();
        assert_eq!(builder.buffered(), 0);
        assert!(builder.push(&frame(5.0)).unwrap().is_none());
        let w = builder.push(&frame(6.0)).unwrap().unwrap();
        assert_eq!(w, frame(5.0).to_vec());
    }

    #[test]
    fn test_wrong_feature_count() {
        let mut builder = SequenceBuilder::with_config(SequenceConfig::new(2, 1)).unwrap();
        let err = builder.push(&[1.0, 2.0]).unwrap_err();
        assert_eq!(
            err,
            SequenceError::FeatureCountMismatch {
                expected: 3,
                actual: 2
            }
        );
        assert!(err.to_string().contains("doesn't match"));
    }
}
