//! Checkpoint trace recording.
//!
//! Drives solvers through repeated time-limited runs and records one
//! [`CheckpointRecord`] per run, producing the logs the pipeline consumes.
//!
//! # Modes
//!
//! | Method | Log shape | Solvers |
//! |--------|-----------|---------|
//! | [`TraceRecorder::record_instance`] | one file per solver | one solver, run alone |
//! | [`TraceRecorder::record_round_robin`] | one interleaved file | MIP, CP, ALNS taking turns on a shared incumbent |
//!
//! # Example
//!
//! ```ignore
//! use solver_trace_features::recorder::TraceRecorder;
//! use solver_trace_features::ingest::CheckpointLogWriter;
//!
//! let recorder = TraceRecorder::new(5.0, 300.0);
//! let mut log = CheckpointLogWriter::create("rawdata_MIP_t5_T300.csv")?;
//! for (id, mut solver) in instances {
//!     let records = recorder.record_instance(&id, &mut solver)?;
//!     log.write_all(SolverKind::Mip, &records)?;
//! }
//! log.flush()?;
//! ```

use crate::error::{DatasetError, Result};
use crate::schema::{CheckpointRecord, Objective, SolverKind, STATUS_NO_FORMAL, STATUS_OPTIMAL};
use tracing::debug;

/// Opaque solution handed between solvers as a warm start.
pub type Tour = Vec<usize>;

/// Solver bookkeeping returned with every result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveStatistics {
    /// Raw status code (2 = proven optimal, 9 = no formal status)
    pub status: i32,

    /// Seconds the solver actually used
    pub solve_time: f64,
}

/// Outcome of one time-limited run.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveResult {
    /// Best objective found so far
    pub objective: Objective,

    /// Best solution found so far
    pub tour: Option<Tour>,

    /// Status and timing
    pub statistics: SolveStatistics,
}

/// Upstream solver contract.
///
/// `build` prepares the model, `solve` runs it from scratch, `resume`
/// continues from the previous state. Both runs may be seeded with a tour.
pub trait Solver {
    /// Which solver this is.
    fn kind(&self) -> SolverKind;

    /// Build the model.
    fn build(&mut self) -> Result<()>;

    /// Run from scratch for at most `time_limit` seconds.
    fn solve(&mut self, time_limit: f64, warm_start: Option<&Tour>) -> Result<SolveResult>;

    /// Continue for at most `time_limit` more seconds.
    fn resume(&mut self, time_limit: f64, warm_start: Option<&Tour>) -> Result<SolveResult>;
}

/// Status code a solver of `kind` is recorded with.
///
/// The metaheuristic never proves optimality and is always logged as
/// "no formal status".
fn recorded_status(kind: SolverKind, result: &SolveResult) -> i32 {
    if kind.proves_optimality() {
        result.statistics.status
    } else {
        STATUS_NO_FORMAL
    }
}

/// One row of an interleaved log.
#[derive(Debug, Clone, PartialEq)]
pub struct InterleavedRow {
    /// Solver that ran the slice
    pub kind: SolverKind,

    /// Shared incumbent after the slice
    pub record: CheckpointRecord,
}

/// Records checkpoint traces at a fixed interval until optimality or budget.
#[derive(Debug, Clone, Copy)]
pub struct TraceRecorder {
    checkpoint_interval: f64,
    total_budget: f64,
}

impl TraceRecorder {
    /// Create a recorder (interval Δt, or the time slice in round-robin mode).
    pub fn new(checkpoint_interval: f64, total_budget: f64) -> Self {
        Self {
            checkpoint_interval,
            total_budget,
        }
    }

    /// Checkpoint interval.
    pub fn checkpoint_interval(&self) -> f64 {
        self.checkpoint_interval
    }

    /// Budget per instance.
    pub fn total_budget(&self) -> f64 {
        self.total_budget
    }

    fn check(&self) -> Result<()> {
        if !(self.checkpoint_interval.is_finite() && self.checkpoint_interval > 0.0) {
            return Err(DatasetError::InvalidConfig(format!(
                "checkpoint_interval must be > 0 (got {})",
                self.checkpoint_interval
            )));
        }
        if !(self.total_budget.is_finite() && self.total_budget > 0.0) {
            return Err(DatasetError::InvalidConfig(format!(
                "total_budget must be > 0 (got {})",
                self.total_budget
            )));
        }
        Ok(())
    }

    /// Run one solver alone on one instance.
    ///
    /// Builds and solves for Δt, then resumes for Δt at a time (warm-started
    /// with its own last tour) until the solver proves optimality or the
    /// elapsed time reaches the budget. Elapsed time advances by Δt per run,
    /// or by the reported solve time on the run that proves optimality.
    pub fn record_instance<S: Solver + ?Sized>(
        &self,
        instance_id: &str,
        solver: &mut S,
    ) -> Result<Vec<CheckpointRecord>> {
        self.check()?;
        let kind = solver.kind();
        let dt = self.checkpoint_interval;

        let mut records = Vec::new();
        let mut elapsed = 0.0;
        let mut status = STATUS_NO_FORMAL;
        let mut last_tour: Option<Tour> = None;

        while status != STATUS_OPTIMAL && elapsed < self.total_budget {
            let result = if records.is_empty() {
                solver.build()?;
                solver.solve(dt, None)?
            } else {
                solver.resume(dt, last_tour.as_ref())?
            };

            status = recorded_status(kind, &result);
            elapsed += if status == STATUS_OPTIMAL {
                result.statistics.solve_time
            } else {
                dt
            };

            records.push(CheckpointRecord::new(
                instance_id,
                elapsed,
                result.objective,
                status,
            ));
            last_tour = result.tour;
        }

        debug!(
            instance = instance_id,
            solver = %kind,
            checkpoints = records.len(),
            "recorded solver trace"
        );
        Ok(records)
    }

    /// Let MIP, CP and ALNS take turns on one instance.
    ///
    /// Each slice lasts Δt. The first round builds and solves, later rounds
    /// resume; every slice is warm-started with the best tour found by any
    /// solver. Rows carry the shared best objective, and the status sticks
    /// once any solver proved optimality. Rounds always complete, so the
    /// row count is a multiple of three.
    ///
    /// # Errors
    ///
    /// [`DatasetError::InvalidConfig`] if `solvers` is not ordered MIP, CP, ALNS.
    pub fn record_round_robin(
        &self,
        instance_id: &str,
        mut solvers: [&mut dyn Solver; 3],
    ) -> Result<Vec<InterleavedRow>> {
        self.check()?;
        for (slot, solver) in solvers.iter().enumerate() {
            if solver.kind().index() != slot {
                return Err(DatasetError::InvalidConfig(format!(
                    "round-robin solvers must be ordered MIP, CP, ALNS (got {} at position {slot})",
                    solver.kind()
                )));
            }
        }

        let dt = self.checkpoint_interval;
        let first_round = dt * solvers.len() as f64;
        let mut rows = Vec::new();
        let mut elapsed = 0.0;
        let mut status = STATUS_NO_FORMAL;
        let mut best = Objective::Unsolved;
        let mut best_tour: Option<Tour> = None;

        while status != STATUS_OPTIMAL && elapsed < self.total_budget {
            for solver in solvers.iter_mut() {
                let kind = solver.kind();
                let result = if elapsed < first_round {
                    solver.build()?;
                    solver.solve(dt, best_tour.as_ref())?
                } else {
                    solver.resume(dt, best_tour.as_ref())?
                };

                if result.objective.improves_on(best) {
                    best = result.objective;
                    best_tour = result.tour.clone();
                }
                if status != STATUS_OPTIMAL {
                    status = recorded_status(kind, &result);
                }
                elapsed += dt;

                rows.push(InterleavedRow {
                    kind,
                    record: CheckpointRecord::new(instance_id, elapsed, best, status),
                });
            }
        }

        debug!(
            instance = instance_id,
            rows = rows.len(),
            best = %best,
            "recorded round-robin trace"
        );
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SolverStatus;
    use std::collections::VecDeque;

    /// Replays scripted (objective, status, solve_time) results.
    struct ScriptedSolver {
        kind: SolverKind,
        script: VecDeque<(f64, i32, f64)>,
        builds: usize,
        warm_starts: Vec<Option<Tour>>,
    }

    impl ScriptedSolver {
        fn new(kind: SolverKind, script: &[(f64, i32, f64)]) -> Self {
            Self {
                kind,
                script: script.iter().copied().collect(),
                builds: 0,
                warm_starts: Vec::new(),
            }
        }

        fn next(&mut self, warm_start: Option<&Tour>) -> Result<SolveResult> {
            self.warm_starts.push(warm_start.cloned());
            let (obj, status, solve_time) = self
                .script
                .pop_front()
                .ok_or_else(|| DatasetError::InvalidConfig("script exhausted".into()))?;
            Ok(SolveResult {
                objective: Objective::from_f64(obj).unwrap(),
                tour: Some(vec![self.kind.index(), obj as usize]),
                statistics: SolveStatistics { status, solve_time },
            })
        }
    }

    impl Solver for ScriptedSolver {
        fn kind(&self) -> SolverKind {
            self.kind
        }

        fn build(&mut self) -> Result<()> {
            self.builds += 1;
            Ok(())
        }

        fn solve(&mut self, _time_limit: f64, warm_start: Option<&Tour>) -> Result<SolveResult> {
            self.next(warm_start)
        }

        fn resume(&mut self, _time_limit: f64, warm_start: Option<&Tour>) -> Result<SolveResult> {
            self.next(warm_start)
        }
    }

    #[test]
    fn test_record_instance_until_optimal() {
        let mut mip = ScriptedSolver::new(
            SolverKind::Mip,
            &[(f64::INFINITY, 9, 5.0), (100.0, 9, 5.0), (90.0, 2, 2.5)],
        );
        let records = TraceRecorder::new(5.0, 300.0)
            .record_instance("X", &mut mip)
            .unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].objective, Objective::Unsolved);
        let times: Vec<f64> = records.iter().map(|r| r.elapsed_time).collect();
        assert_eq!(times, vec![5.0, 10.0, 12.5]);
        assert_eq!(records[2].status, SolverStatus::Optimal);
        assert_eq!(mip.builds, 1);
        assert_eq!(mip.warm_starts[0], None);
        assert_eq!(mip.warm_starts[1], Some(vec![0, usize::MAX]));
    }

    #[test]
    fn test_record_instance_until_budget() {
        let mut alns = ScriptedSolver::new(SolverKind::Alns, &[(50.0, 2, 1.0); 4]);
        let records = TraceRecorder::new(5.0, 15.0)
            .record_instance("X", &mut alns)
            .unwrap();

        // ALNS is logged as "no formal status" even if it claims optimality.
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.status_code == STATUS_NO_FORMAL));
        assert_eq!(records[2].elapsed_time, 15.0);
    }

    #[test]
    fn test_round_robin_shares_best_and_sticks_optimal() {
        let mut mip = ScriptedSolver::new(SolverKind::Mip, &[(100.0, 9, 5.0), (80.0, 2, 5.0)]);
        let mut cp = ScriptedSolver::new(SolverKind::Cp, &[(90.0, 9, 5.0), (85.0, 1, 5.0)]);
        let mut alns = ScriptedSolver::new(SolverKind::Alns, &[(95.0, 9, 5.0), (70.0, 9, 5.0)]);

        let rows = TraceRecorder::new(20.0, 300.0)
            .record_round_robin("X", [&mut mip, &mut cp, &mut alns])
            .unwrap();

        assert_eq!(rows.len(), 6);
        let kinds: Vec<SolverKind> = rows.iter().map(|r| r.kind).collect();
        assert_eq!(kinds[..3], SolverKind::ALL);
        let best: Vec<Objective> = rows.iter().map(|r| r.record.objective).collect();
        assert_eq!(
            best,
            [100.0, 90.0, 90.0, 80.0, 80.0, 70.0].map(Objective::Value).to_vec()
        );
        // MIP proves optimality at row 4; CP's later status 1 does not undo it.
        assert!(!rows[2].record.is_optimal());
        assert!(rows[3..].iter().all(|r| r.record.is_optimal()));
        assert_eq!(rows[5].record.elapsed_time, 120.0);

        // Warm starts carry the shared incumbent.
        assert_eq!(cp.warm_starts[0], Some(vec![0, 100]));
        assert_eq!(mip.warm_starts[1], Some(vec![1, 90]));
        assert_eq!(mip.builds, 1);
    }

    #[test]
    fn test_round_robin_rejects_wrong_order() {
        let mut mip = ScriptedSolver::new(SolverKind::Mip, &[]);
        let mut cp = ScriptedSolver::new(SolverKind::Cp, &[]);
        let mut alns = ScriptedSolver::new(SolverKind::Alns, &[]);
        let err = TraceRecorder::new(20.0, 300.0)
            .record_round_robin("X", [&mut cp, &mut mip, &mut alns])
            .unwrap_err();
        assert!(matches!(err, DatasetError::InvalidConfig(_)));
    }

    #[test]
    fn test_invalid_interval() {
        let mut mip = ScriptedSolver::new(SolverKind::Mip, &[]);
        assert!(TraceRecorder::new(0.0, 300.0)
            .record_instance("X", &mut mip)
            .is_err());
    }
}
