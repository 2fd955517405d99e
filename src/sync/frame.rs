//! Synchronizer output types.

use crate::schema::{
    max_finite, resolve_triple, CheckpointRecord, Objective, SolverKind, SolverStatus,
    SOLVER_COUNT,
};

/// Current state of all three solvers at one synchronization step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignedFrame {
    /// Current best objective per solver
    pub objectives: [Objective; SOLVER_COUNT],

    /// Current status per solver
    pub statuses: [SolverStatus; SOLVER_COUNT],

    /// Elapsed time of each solver's current record
    pub elapsed: [f64; SOLVER_COUNT],
}

impl AlignedFrame {
    /// Build a frame from the three current records.
    pub fn from_records(records: [&CheckpointRecord; SOLVER_COUNT]) -> Self {
        Self {
            objectives: records.map(|r| r.objective),
            statuses: records.map(|r| r.status),
            elapsed: records.map(|r| r.elapsed_time),
        }
    }

    /// Objective of one solver.
    #[inline]
    pub fn objective(&self, kind: SolverKind) -> Objective {
        self.objectives[kind.index()]
    }

    /// Objectives with unsolved entries replaced by the largest finite one.
    ///
    /// `None` when no solver has a feasible solution.
    pub fn resolved(&self) -> Option<[f64; SOLVER_COUNT]> {
        resolve_triple(self.objectives)
    }

    /// Largest finite objective in the frame.
    pub fn max_finite(&self) -> Option<f64> {
        max_finite(&self.objectives)
    }

    /// Largest elapsed time among the three solvers.
    pub fn max_elapsed(&self) -> f64 {
        self.elapsed.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Whether every solver is optimal.
    pub fn all_optimal(&self) -> bool {
        self.statuses.iter().all(|s| s.is_optimal())
    }

    /// Whether at least one solver is optimal.
    pub fn any_optimal(&self) -> bool {
        self.statuses.iter().any(|s| s.is_optimal())
    }

    /// Which solvers hold the best finite objective (exact ties all marked).
    ///
    /// Unsolved solvers are never marked; if nobody is solved, nobody is best.
    pub fn best_mask(&self) -> [bool; SOLVER_COUNT] {
        let best = self
            .objectives
            .iter()
            .filter_map(|o| o.value())
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.min(v))));
        match best {
            Some(best) => self.objectives.map(|o| o.value() == Some(best)),
            None => [false; SOLVER_COUNT],
        }
    }
}

/// Ordered frames of one finished instance.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceTrace {
    /// Instance identifier
    pub instance_id: String,

    /// Frames in synchronization order (never empty)
    pub frames: Vec<AlignedFrame>,

    /// Elapsed time at which each solver first reported optimality
    pub optimal_arrival: [Option<f64>; SOLVER_COUNT],

    /// Records left in the queues when the instance finished
    pub unconsumed_records: usize,
}

impl InstanceTrace {
    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the trace has no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frame at which the instance finished.
    pub fn final_frame(&self) -> Option<&AlignedFrame> {
        self.frames.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(objs: [Objective; 3]) -> AlignedFrame {
        AlignedFrame {
            objectives: objs,
            statuses: [SolverStatus::Running; 3],
            elapsed: [5.0, 10.0, 7.5],
        }
    }

    #[test]
    fn test_best_mask_marks_ties() {
        let f = frame([Objective::Value(90.0), Objective::Value(95.0), Objective::Value(90.0)]);
        assert_eq!(f.best_mask(), [true, false, true]);
    }

    #[test]
    fn test_best_mask_never_marks_unsolved() {
        let f = frame([Objective::Value(50.0), Objective::Unsolved, Objective::Value(50.0)]);
        assert_eq!(f.best_mask(), [true, false, true]);
        // Substitution makes CP look tied, the mask does not.
        assert_eq!(f.resolved(), Some([50.0, 50.0, 50.0]));

        let f = frame([Objective::Unsolved; 3]);
        assert_eq!(f.best_mask(), [false; 3]);
        assert_eq!(f.resolved(), None);
    }

    #[test]
    fn test_max_elapsed_and_status_helpers() {
        let mut f = frame([Objective::Unsolved; 3]);
        assert_eq!(f.max_elapsed(), 10.0);
        assert!(!f.any_optimal());

        f.statuses[1] = SolverStatus::Optimal;
        assert!(f.any_optimal());
        assert!(!f.all_optimal());

        f.statuses = [SolverStatus::Optimal; 3];
        assert!(f.all_optimal());
    }
}
