//! Continuous improvement targets.
//!
//! Two encodings:
//!
//! - **Running best** ([`ImprovementTracker`]): solvers are applied in column
//!   order to a running "best so far across all solvers"; each solver's entry
//!   is how much it lowered that running best. The running best persists across
//!   the frames of one instance.
//! - **Switching** ([`switching_improvements`]): how much each solver's own
//!   objective dropped over the last `k` frames, where `k` frames span one
//!   switching interval.

use super::FrameVector;
use crate::schema::{max_finite, Objective, SOLVER_COUNT};
use crate::sync::{AlignedFrame, InstanceTrace};

/// Running-best improvement state for one instance.
///
/// Create one per instance; the tracker is consumed frame by frame.
#[derive(Debug, Clone)]
pub struct ImprovementTracker {
    best: Objective,
}

impl Default for ImprovementTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ImprovementTracker {
    /// Fresh tracker with no solution seen.
    pub fn new() -> Self {
        Self {
            best: Objective::Unsolved,
        }
    }

    /// Running best so far.
    pub fn best(&self) -> Objective {
        self.best
    }

    /// Apply one frame and return each solver's marginal improvement.
    ///
    /// Both the before and after snapshots substitute unsolved entries with
    /// their own largest finite entry. A snapshot with no finite entry borrows
    /// the other snapshot's reference; if neither has one the improvement is
    /// zero.
    pub fn step(&mut self, objectives: [Objective; SOLVER_COUNT]) -> FrameVector {
        let mut before = [Objective::Unsolved; SOLVER_COUNT];
        let mut after = [Objective::Unsolved; SOLVER_COUNT];
        for (i, objective) in objectives.into_iter().enumerate() {
            before[i] = self.best;
            self.best = self.best.min(objective);
            after[i] = self.best;
        }

        let Some(after_ref) = max_finite(&after) else {
            return [0.0; SOLVER_COUNT];
        };
        let before_ref = max_finite(&before).unwrap_or(after_ref);

        [0, 1, 2].map(|i| before[i].resolve(before_ref) - after[i].resolve(after_ref))
    }
}

/// Running-best improvement vector for every frame of the trace.
pub fn improvement_series(trace: &InstanceTrace) -> Vec<FrameVector> {
    let mut tracker = ImprovementTracker::new();
    trace
        .frames
        .iter()
        .map(|frame| tracker.step(frame.objectives))
        .collect()
}

/// Improvement of each solver's objective over `step` frames.
///
/// Element `j` is `objective[j] − objective[j + step]` (one entry per frame
/// from index `step` on). Unsolved objectives are replaced by a single
/// per-instance reference: the largest finite objective of the first frame
/// that has one. A solver that stays unsolved therefore shows zero
/// improvement. Traces with no finite objective at all yield zeros.
pub fn switching_improvements(trace: &InstanceTrace, step: usize) -> Vec<FrameVector> {
    let step = step.max(1);
    if trace.frames.len() <= step {
        return Vec::new();
    }

    let reference = trace
        .frames
        .iter()
        .find_map(AlignedFrame::max_finite)
        .unwrap_or(0.0);
    let resolved: Vec<FrameVector> = trace
        .frames
        .iter()
        .map(|f| f.objectives.map(|o| o.resolve(reference)))
        .collect();

    resolved
        .windows(step + 1)
        .map(|w| {
            let (first, last) = (w[0], w[step]);
            [0, 1, 2].map(|i| first[i] - last[i])
        })
        .collect()
}
