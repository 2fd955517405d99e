//! Checkpoint Schema Module
//!
//! Typed representation of the rows the three solvers write while they run.
//!
//! # Design Philosophy
//!
//! - **Explicit sentinels**: "no feasible solution yet" is [`Objective::Unsolved`],
//!   never a bare `f64::INFINITY` flowing through comparisons
//! - **Fixed solver order**: MIP, CP, ALNS. Every triple in the crate is indexed
//!   by [`SolverKind::index`]
//! - **Lossless**: the raw status code is kept next to the decoded status so
//!   logs can be written back unchanged
//!
//! # Example
//!
//! ```
//! use solver_trace_features::schema::{CheckpointRecord, Objective, SolverKind, SolverStatus};
//!
//! let record = CheckpointRecord::new("berlin52", 10.0, Objective::Value(7542.0), 2);
//! assert_eq!(record.status, SolverStatus::Optimal);
//! assert_eq!(SolverKind::Cp.index(), 1);
//! ```

mod objective;
mod record;

pub use objective::{max_finite, resolve_triple, Objective};
pub use record::{CheckpointRecord, SolverKind, SolverStatus};

/// Number of solvers raced against each other.
pub const SOLVER_COUNT: usize = 3;

/// Status code the solvers report for a proven optimum.
pub const STATUS_OPTIMAL: i32 = 2;

/// Status code used when a solver has no formal status (the metaheuristic).
pub const STATUS_NO_FORMAL: i32 = 9;

/// Header row of a checkpoint log.
pub const LOG_HEADER: [&str; 5] = ["Model", "Instance", "t", "objVal", "Status"];
