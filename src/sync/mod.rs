//! Multi-stream synchronization.
//!
//! Three solvers checkpoint the same instance at their own pace. The
//! synchronizer advances their queues in lockstep and emits one
//! [`AlignedFrame`] per step: the current objective, status and elapsed time of
//! every solver.
//!
//! # State Machine
//!
//! ```text
//!             pop                         status == OPTIMAL
//!   queue ──────────► slot: Running ─────────────────────────► slot: Optimal { since }
//!                        │  ▲                                       │
//!                        └──┘ pop next record                       └── frozen (no pop)
//! ```
//!
//! Each step:
//! 1. emit a frame from the three slots
//! 2. evaluate the termination predicate ([`is_terminal`]) once
//! 3. if not terminal, advance every slot the [`AdvancePolicy`] allows
//!
//! A slot that must advance but whose queue is empty means the log stopped
//! before the instance finished: [`crate::DatasetError::TruncatedTrace`].
//!
//! # Policies
//!
//! | Logs | Advance | Termination |
//! |------|---------|-------------|
//! | One file per solver | [`AdvancePolicy::FreezeOptimal`] | [`Termination::AllOptimal`] |
//! | Interleaved round-robin | [`AdvancePolicy::Lockstep`] | [`Termination::AnyOptimal`] |
//!
//! In both cases an instance also finishes once the largest elapsed time of the
//! frame exceeds `T − Δt`.

mod frame;
mod synchronizer;

pub use frame::{AlignedFrame, InstanceTrace};
pub use synchronizer::{is_terminal, StreamSynchronizer};

use serde::{Deserialize, Serialize};

/// Which slots advance after a non-terminal frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdvancePolicy {
    /// Solvers that proved optimality keep their record; the others pop.
    FreezeOptimal,

    /// Every solver pops one record per step.
    Lockstep,
}

/// Status condition that finishes an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// All three solvers are optimal.
    AllOptimal,

    /// At least one solver is optimal.
    AnyOptimal,
}

/// Advance and termination rules for one synchronization pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPolicy {
    /// Slot advance rule
    pub advance: AdvancePolicy,

    /// Status-based termination rule
    pub termination: Termination,
}

impl SyncPolicy {
    /// Policy for logs recorded by three independent runs.
    pub fn independent() -> Self {
        Self {
            advance: AdvancePolicy::FreezeOptimal,
            termination: Termination::AllOptimal,
        }
    }

    /// Policy for an interleaved log recorded by one round-robin run.
    pub fn round_robin() -> Self {
        Self {
            advance: AdvancePolicy::Lockstep,
            termination: Termination::AnyOptimal,
        }
    }
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self::independent()
    }
}
