//! Label and Target Generation for Solver-Selection Models
//!
//! Converts a synchronized [`crate::sync::InstanceTrace`] into per-frame feature vectors and
//! supervised targets.
//!
//! # Available Encodings
//!
//! | Encoding | Output | Used by |
//! |----------|--------|---------|
//! | [`instance_label`] | one [`SolverKind`] per instance | best-solver classification target |
//! | [`indicator_series`] | `[0/1; 3]` per frame | best-solver classification features |
//! | [`improvement_series`] | `[f64; 3]` per frame | improvement regression (features + target) |
//! | [`switching_improvements`] | `[f64; 3]` per frame after the first `k` | switching regression |
//!
//! # Sentinel Handling
//!
//! Solvers without a feasible solution are [`crate::schema::Objective::Unsolved`].
//! Indicators never mark them as best. Improvement encodings substitute them
//! with a finite reference before subtracting, so an unsolved solver
//! contributes zero instead of an infinite jump.
//!
//! # Example
//!
//! ```ignore
//! use solver_trace_features::labeling::{indicator_series, instance_label};
//!
//! let trace = synchronizer.synchronize(streams)?;
//! let label = instance_label(&trace);         // e.g. SolverKind::Mip
//! let frames = indicator_series(&trace);      // e.g. [[1,0,0], [1,0,1], ...]
//! ```

mod best_solver;
mod improvement;

pub use best_solver::{best_indicator, indicator_series, instance_label};
pub use improvement::{improvement_series, switching_improvements, ImprovementTracker};

use crate::schema::{SolverKind, SOLVER_COUNT};
use serde::{Deserialize, Serialize};

/// Per-frame vector, one entry per solver in column order.
pub type FrameVector = [f64; SOLVER_COUNT];

/// Distribution of whole-instance labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelStats {
    /// Number of labels
    pub total: usize,

    /// Labels per solver, in column order
    pub counts: [usize; SOLVER_COUNT],
}

impl LabelStats {
    /// Count labels.
    pub fn from_labels<I: IntoIterator<Item = SolverKind>>(labels: I) -> Self {
        let mut stats = Self::default();
        for label in labels {
            stats.record(label);
        }
        stats
    }

    /// Add one label.
    pub fn record(&mut self, label: SolverKind) {
        self.total += 1;
        self.counts[label.index()] += 1;
    }

    /// Share of each solver in [0.0, 1.0].
    pub fn class_balance(&self) -> FrameVector {
        if self.total == 0 {
            return [0.0; SOLVER_COUNT];
        }
        let total = self.total as f64;
        self.counts.map(|c| c as f64 / total)
    }

    /// Check if any solver wins less than 10% of the instances.
    pub fn has_minority_class(&self) -> bool {
        self.total == 0 || self.class_balance().iter().any(|&p| p < 0.1)
    }
}
