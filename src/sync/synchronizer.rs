//! Per-instance stream synchronizer.

use super::{AdvancePolicy, AlignedFrame, InstanceTrace, SyncPolicy, Termination};
use crate::config::DatasetConfig;
use crate::error::{DatasetError, Result};
use crate::ingest::StreamSet;
use crate::schema::{CheckpointRecord, SolverKind, SOLVER_COUNT};
use std::collections::VecDeque;
use tracing::debug;

/// Whether `frame` finishes its instance.
///
/// True when the status condition of `termination` holds, or when the largest
/// elapsed time exceeds `cutoff` (`T − Δt`).
pub fn is_terminal(frame: &AlignedFrame, termination: Termination, cutoff: f64) -> bool {
    let status_done = match termination {
        Termination::AllOptimal => frame.all_optimal(),
        Termination::AnyOptimal => frame.any_optimal(),
    };
    status_done || frame.max_elapsed() > cutoff
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SlotState {
    Running,
    Optimal { since: f64 },
}

/// Current record of one solver plus its optimality state.
#[derive(Debug)]
struct Slot {
    current: CheckpointRecord,
    state: SlotState,
}

impl Slot {
    fn new(record: CheckpointRecord) -> Self {
        let state = if record.is_optimal() {
            SlotState::Optimal {
                since: record.elapsed_time,
            }
        } else {
            SlotState::Running
        };
        Self {
            current: record,
            state,
        }
    }

    /// Move to the next record. The first optimal arrival is kept even if a
    /// later record stops reporting optimality.
    fn replace(&mut self, record: CheckpointRecord) {
        if record.is_optimal() {
            let since = match self.state {
                SlotState::Optimal { since } => since.min(record.elapsed_time),
                SlotState::Running => record.elapsed_time,
            };
            self.state = SlotState::Optimal { since };
        }
        self.current = record;
    }

    fn is_frozen(&self, advance: AdvancePolicy) -> bool {
        advance == AdvancePolicy::FreezeOptimal && matches!(self.state, SlotState::Optimal { .. })
    }

    fn optimal_since(&self) -> Option<f64> {
        match self.state {
            SlotState::Optimal { since } => Some(since),
            SlotState::Running => None,
        }
    }
}

/// Turns one instance's [`StreamSet`] into an [`InstanceTrace`].
///
/// Holds no per-instance state: every call to [`Self::synchronize`] starts from
/// fresh slots, so nothing leaks from one instance into the next.
#[derive(Debug, Clone, Copy)]
pub struct StreamSynchronizer {
    policy: SyncPolicy,
    cutoff: f64,
}

impl StreamSynchronizer {
    /// Create a synchronizer with an explicit policy and cutoff (`T − Δt`).
    pub fn new(policy: SyncPolicy, cutoff: f64) -> Self {
        Self { policy, cutoff }
    }

    /// Policy derived from the configured log source, cutoff from Δt and T.
    pub fn from_config(config: &DatasetConfig) -> Self {
        Self::new(config.source.sync_policy(), config.cutoff())
    }

    /// Active policy.
    pub fn policy(&self) -> SyncPolicy {
        self.policy
    }

    /// Elapsed-time cutoff.
    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Synchronize the three queues of one instance.
    ///
    /// # Errors
    ///
    /// [`DatasetError::TruncatedTrace`] if a solver that has to advance has no
    /// records left (including an empty queue at start).
    pub fn synchronize(&self, streams: StreamSet) -> Result<InstanceTrace> {
        let StreamSet {
            instance_id,
            mut queues,
        } = streams;

        let truncated = |kind: SolverKind, frames: usize| DatasetError::TruncatedTrace {
            instance_id: instance_id.clone(),
            solver: kind,
            frames,
        };

        let mut slots: Vec<Slot> = Vec::with_capacity(SOLVER_COUNT);
        for kind in SolverKind::ALL {
            let record = queues[kind.index()]
                .pop_front()
                .ok_or_else(|| truncated(kind, 0))?;
            slots.push(Slot::new(record));
        }

        let mut frames = Vec::new();
        loop {
            let frame = AlignedFrame::from_records([
                &slots[0].current,
                &slots[1].current,
                &slots[2].current,
            ]);
            frames.push(frame);

            if is_terminal(&frame, self.policy.termination, self.cutoff) {
                break;
            }

            for kind in SolverKind::ALL {
                let slot = &mut slots[kind.index()];
                if slot.is_frozen(self.policy.advance) {
                    continue;
                }
                let record = queues[kind.index()]
                    .pop_front()
                    .ok_or_else(|| truncated(kind, frames.len()))?;
                slot.replace(record);
            }
        }

        let unconsumed_records: usize = queues.iter().map(VecDeque::len).sum();
        let optimal_arrival = [0, 1, 2].map(|i| slots[i].optimal_since());

        debug!(
            instance = %instance_id,
            frames = frames.len(),
            unconsumed_records,
            "synchronized instance"
        );

        Ok(InstanceTrace {
            instance_id,
            frames,
            optimal_arrival,
            unconsumed_records,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Objective, SolverStatus};

    fn rec(t: f64, obj: f64, code: i32) -> CheckpointRecord {
        let objective = if obj.is_infinite() {
            Objective::Unsolved
        } else {
            Objective::Value(obj)
        };
        CheckpointRecord::new("X", t, objective, code)
    }

    fn independent(cutoff: f64) -> StreamSynchronizer {
        StreamSynchronizer::new(SyncPolicy::independent(), cutoff)
    }

    #[test]
    fn test_terminal_predicate() {
        let mut frame = AlignedFrame {
            objectives: [Objective::Value(1.0); 3],
            statuses: [SolverStatus::Running; 3],
            elapsed: [5.0, 5.0, 5.0],
        };
        assert!(!is_terminal(&frame, Termination::AllOptimal, 295.0));

        frame.elapsed[2] = 300.0;
        assert!(is_terminal(&frame, Termination::AllOptimal, 295.0));

        frame.elapsed[2] = 295.0;
        assert!(!is_terminal(&frame, Termination::AllOptimal, 295.0));

        frame.statuses[0] = SolverStatus::Optimal;
        assert!(!is_terminal(&frame, Termination::AllOptimal, 295.0));
        assert!(is_terminal(&frame, Termination::AnyOptimal, 295.0));
    }

    #[test]
    fn test_frozen_solver_keeps_objective() {
        // MIP optimal at t=10, the others run to the budget.
        let streams = StreamSet::new(
            "X",
            [
                vec![rec(5.0, 100.0, 9), rec(10.0, 90.0, 2)],
                vec![rec(5.0, 120.0, 9), rec(10.0, 95.0, 9), rec(15.0, 80.0, 9)],
                vec![rec(5.0, 110.0, 9), rec(10.0, 105.0, 9), rec(15.0, 100.0, 9)],
            ],
        );
        let trace = independent(10.0).synchronize(streams).unwrap();

        assert_eq!(trace.len(), 3);
        let last = trace.final_frame().unwrap();
        assert_eq!(last.objective(SolverKind::Mip), Objective::Value(90.0));
        assert_eq!(last.elapsed, [10.0, 15.0, 15.0]);
        assert_eq!(trace.optimal_arrival, [Some(10.0), None, None]);
        assert_eq!(trace.unconsumed_records, 0);
    }

    #[test]
    fn test_all_optimal_finishes_early() {
        let streams = StreamSet::new(
            "X",
            [
                vec![rec(5.0, 60.0, 9), rec(10.0, 50.0, 2)],
                vec![rec(5.0, 55.0, 9), rec(10.0, 52.0, 9), rec(15.0, 50.0, 2)],
                vec![rec(5.0, 70.0, 2), rec(10.0, 70.0, 2)],
            ],
        );
        let trace = independent(295.0).synchronize(streams).unwrap();

        assert_eq!(trace.len(), 3);
        assert!(trace.final_frame().unwrap().all_optimal());
        assert_eq!(trace.optimal_arrival, [Some(10.0), Some(15.0), Some(5.0)]);
        // ALNS was frozen from the start, its second row is never read.
        assert_eq!(trace.unconsumed_records, 1);
    }

    #[test]
    fn test_underflow_is_truncated_trace() {
        let streams = StreamSet::new(
            "X",
            [
                vec![rec(5.0, 60.0, 9), rec(10.0, 55.0, 9)],
                vec![rec(5.0, 55.0, 9)],
                vec![rec(5.0, 70.0, 9), rec(10.0, 65.0, 9)],
            ],
        );
        let err = independent(295.0).synchronize(streams).unwrap_err();
        match err {
            DatasetError::TruncatedTrace {
                instance_id,
                solver,
                frames,
            } => {
                assert_eq!(instance_id, "X");
                assert_eq!(solver, SolverKind::Cp);
                assert_eq!(frames, 1);
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_empty_queue_is_truncated_at_start() {
        let streams = StreamSet::new("X", [vec![rec(5.0, 1.0, 9)], vec![], vec![rec(5.0, 1.0, 9)]]);
        let err = independent(295.0).synchronize(streams).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::TruncatedTrace {
                solver: SolverKind::Cp,
                frames: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_lockstep_any_optimal() {
        let sync = StreamSynchronizer::new(SyncPolicy::round_robin(), 280.0);
        let streams = StreamSet::new(
            "X",
            [
                vec![rec(20.0, 100.0, 9), rec(80.0, 85.0, 9), rec(140.0, 80.0, 9)],
                vec![rec(40.0, 90.0, 9), rec(100.0, 85.0, 2), rec(160.0, 80.0, 2)],
                vec![rec(60.0, 90.0, 9), rec(120.0, 85.0, 2), rec(180.0, 80.0, 2)],
            ],
        );
        let trace = sync.synchronize(streams).unwrap();
        assert_eq!(trace.len(), 2);
        assert_eq!(trace.optimal_arrival, [None, Some(100.0), Some(120.0)]);
        assert_eq!(trace.unconsumed_records, 3);
    }

    #[test]
    fn test_budget_cutoff_with_uneven_timestamps() {
        // CP proves optimality between checkpoints (t=37.2); ALNS runs to T.
        let alns: Vec<_> = (1..=12).map(|k| rec(5.0 * k as f64, 200.0 - k as f64, 9)).collect();
        let streams = StreamSet::new(
            "X",
            [
                (1..=12).map(|k| rec(5.0 * k as f64, 150.0, 9)).collect(),
                vec![rec(5.0, 190.0, 9), rec(37.2, 140.0, 2)],
                alns,
            ],
        );
        let trace = independent(55.0).synchronize(streams).unwrap();
        assert_eq!(trace.len(), 12);
        assert_eq!(trace.final_frame().unwrap().max_elapsed(), 60.0);
        assert_eq!(trace.optimal_arrival[SolverKind::Cp.index()], Some(37.2));
        for frame in &trace.frames[1..] {
            assert_eq!(frame.objective(SolverKind::Cp), Objective::Value(140.0));
        }
    }
}
