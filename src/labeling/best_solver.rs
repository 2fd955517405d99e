//! Best-solver label and per-frame "is best" indicators.

use super::FrameVector;
use crate::schema::{SolverKind, SOLVER_COUNT};
use crate::sync::{AlignedFrame, InstanceTrace};
use std::cmp::Ordering;

/// `1.0` for every solver holding the frame's best finite objective, else `0.0`.
///
/// Exact ties all get `1.0`. Unsolved solvers always get `0.0`.
pub fn best_indicator(frame: &AlignedFrame) -> FrameVector {
    frame.best_mask().map(|best| if best { 1.0 } else { 0.0 })
}

/// Indicator vector for every frame of the trace.
pub fn indicator_series(trace: &InstanceTrace) -> Vec<FrameVector> {
    trace.frames.iter().map(best_indicator).collect()
}

/// Solver that wins the instance.
///
/// The winner holds the lowest objective in the final frame. Among tied
/// solvers the one that proved optimality first wins; solvers that never did
/// rank after those that did, and remaining ties go to the lowest column
/// (MIP, then CP, then ALNS). If nobody found a feasible solution, all three
/// are considered tied.
pub fn instance_label(trace: &InstanceTrace) -> SolverKind {
    let Some(last) = trace.final_frame() else {
        return SolverKind::Mip;
    };

    let mask = last.best_mask();
    let tied: Vec<SolverKind> = if mask.iter().any(|&b| b) {
        SolverKind::ALL
            .into_iter()
            .filter(|k| mask[k.index()])
            .collect()
    } else {
        SolverKind::ALL.to_vec()
    };

    tied.into_iter()
        .min_by(|a, b| compare_arrival(trace.optimal_arrival, *a, *b))
        .unwrap_or(SolverKind::Mip)
}

fn compare_arrival(
    arrival: [Option<f64>; SOLVER_COUNT],
    a: SolverKind,
    b: SolverKind,
) -> Ordering {
    let by_time = match (arrival[a.index()], arrival[b.index()]) {
        (Some(ta), Some(tb)) => ta.total_cmp(&tb),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_time.then(a.index().cmp(&b.index()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Objective, SolverStatus};

    fn trace(finals: [Objective; 3], arrival: [Option<f64>; 3]) -> InstanceTrace {
        InstanceTrace {
            instance_id: "X".to_string(),
            frames: vec![AlignedFrame {
                objectives: finals,
                statuses: [SolverStatus::Running; 3],
                elapsed: [20.0; 3],
            }],
            optimal_arrival: arrival,
            unconsumed_records: 0,
        }
    }

    #[test]
    fn test_strict_minimum_wins() {
        let t = trace(
            [Objective::Value(90.0), Objective::Value(92.0), Objective::Value(100.0)],
            [Some(10.0), None, None],
        );
        assert_eq!(instance_label(&t), SolverKind::Mip);

        let t = trace(
            [Objective::Value(90.0), Objective::Value(92.0), Objective::Value(80.0)],
            [Some(10.0), None, None],
        );
        assert_eq!(instance_label(&t), SolverKind::Alns);
    }

    #[test]
    fn test_tie_broken_by_earliest_optimal() {
        let t = trace(
            [Objective::Value(50.0), Objective::Value(50.0), Objective::Value(60.0)],
            [Some(15.0), Some(20.0), None],
        );
        assert_eq!(instance_label(&t), SolverKind::Mip);

        let t = trace(
            [Objective::Value(50.0), Objective::Value(50.0), Objective::Value(60.0)],
            [Some(25.0), Some(20.0), None],
        );
        assert_eq!(instance_label(&t), SolverKind::Cp);
    }

    #[test]
    fn test_tie_break_ignores_untied_solvers() {
        // ALNS is not tied for the best, its arrival time must not matter.
        let t = trace(
            [Objective::Value(50.0), Objective::Value(50.0), Objective::Value(60.0)],
            [None, Some(20.0), Some(1.0)],
        );
        assert_eq!(instance_label(&t), SolverKind::Cp);
    }

    #[test]
    fn test_tie_without_optimality_goes_to_lowest_column() {
        let t = trace(
            [Objective::Value(70.0), Objective::Value(75.0), Objective::Value(70.0)],
            [None, None, None],
        );
        assert_eq!(instance_label(&t), SolverKind::Mip);

        let t = trace(
            [Objective::Value(80.0), Objective::Value(70.0), Objective::Value(70.0)],
            [None, None, None],
        );
        assert_eq!(instance_label(&t), SolverKind::Cp);
    }

    #[test]
    fn test_unsolved_never_wins_label() {
        let t = trace(
            [Objective::Unsolved, Objective::Value(70.0), Objective::Unsolved],
            [None, None, None],
        );
        assert_eq!(instance_label(&t), SolverKind::Cp);
        assert_eq!(best_indicator(&t.frames[0]), [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_nobody_solved() {
        let t = trace([Objective::Unsolved; 3], [None, None, None]);
        assert_eq!(instance_label(&t), SolverKind::Mip);
        assert_eq!(best_indicator(&t.frames[0]), [0.0; 3]);
    }

    #[test]
    fn test_indicator_keeps_ties() {
        let t = trace(
            [Objective::Value(50.0), Objective::Value(50.0), Objective::Value(60.0)],
            [None, None, None],
        );
        assert_eq!(indicator_series(&t), vec![[1.0, 1.0, 0.0]]);
    }
}
