//! Solver identities, statuses and the checkpoint record itself.

use super::{Objective, STATUS_OPTIMAL};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the three solvers whose traces are synchronized.
///
/// The discriminant is the column index used in every frame triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SolverKind {
    /// Mixed-integer programming solver
    #[serde(rename = "MIP")]
    Mip = 0,

    /// Constraint-programming solver
    #[serde(rename = "CP")]
    Cp = 1,

    /// Adaptive large neighbourhood search (never proves optimality)
    #[serde(rename = "ALNS")]
    Alns = 2,
}

impl SolverKind {
    /// All solvers in column order.
    pub const ALL: [SolverKind; 3] = [SolverKind::Mip, SolverKind::Cp, SolverKind::Alns];

    /// Column index in frame triples.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Solver for a column index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Model name as written in the first log column.
    pub fn name(self) -> &'static str {
        match self {
            SolverKind::Mip => "MIP",
            SolverKind::Cp => "CP",
            SolverKind::Alns => "ALNS",
        }
    }

    /// Parse the model name column (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Whether the solver can ever report a proven optimum.
    pub fn proves_optimality(self) -> bool {
        !matches!(self, SolverKind::Alns)
    }
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decoded solver status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolverStatus {
    /// Still searching (codes 0, 1 and 9)
    Running,

    /// Stopped for a reason other than optimality (infeasible, error, ...)
    OtherTerminal,

    /// Proven optimal (code 2); sticky for the rest of the trace
    Optimal,
}

impl SolverStatus {
    /// Decode a raw status code.
    pub fn from_code(code: i32) -> Self {
        match code {
            STATUS_OPTIMAL => SolverStatus::Optimal,
            0 | 1 | 9 => SolverStatus::Running,
            _ => SolverStatus::OtherTerminal,
        }
    }

    /// Whether the status is a proven optimum.
    #[inline]
    pub fn is_optimal(self) -> bool {
        matches!(self, SolverStatus::Optimal)
    }
}

/// One row of a checkpoint log: the best objective a solver had found on one
/// instance after `elapsed_time` seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointRecord {
    /// Instance identifier (file stem of the problem instance)
    pub instance_id: String,

    /// Seconds since the solver started on this instance (>= 0)
    pub elapsed_time: f64,

    /// Best objective so far
    pub objective: Objective,

    /// Decoded status
    pub status: SolverStatus,

    /// Raw status code as logged
    pub status_code: i32,
}

impl CheckpointRecord {
    /// Create a record, decoding `status_code`.
    pub fn new(
        instance_id: impl Into<String>,
        elapsed_time: f64,
        objective: Objective,
        status_code: i32,
    ) -> Self {
        Self {
            instance_id: instance_id.into(),
            elapsed_time,
            objective,
            status: SolverStatus::from_code(status_code),
            status_code,
        }
    }

    /// Whether this record reports a proven optimum.
    #[inline]
    pub fn is_optimal(&self) -> bool {
        self.status.is_optimal()
    }
}
