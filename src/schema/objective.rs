//! Objective values with an explicit "unsolved" sentinel.
//!
//! Solvers log `inf` until they find a first feasible solution. Comparing raw
//! infinities against real costs makes every relative metric unbounded, so the
//! crate substitutes unsolved entries with a finite *reference*: by default the
//! largest finite objective among the solvers being compared. An unsolved
//! solver therefore ties with the worst solved one and never wins.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Best objective value reported by a solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Objective {
    /// No feasible solution found yet (logged as `inf`)
    Unsolved,

    /// Finite objective value
    Value(f64),
}

impl Objective {
    /// Convert a raw float; `+∞` becomes [`Objective::Unsolved`].
    ///
    /// Returns `None` for NaN and `−∞`, which have no meaning in a
    /// checkpoint log.
    pub fn from_f64(value: f64) -> Option<Self> {
        if value == f64::INFINITY {
            Some(Objective::Unsolved)
        } else if value.is_finite() {
            Some(Objective::Value(value))
        } else {
            None
        }
    }

    /// Parse a log field (`inf`, `Infinity`, `1234.5`, ...).
    pub fn parse(field: &str) -> Option<Self> {
        let trimmed = field.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "inf" | "+inf" | "infinity" | "+infinity" => Some(Objective::Unsolved),
            _ => trimmed.parse::<f64>().ok().and_then(Self::from_f64),
        }
    }

    /// Finite value, if any.
    #[inline]
    pub fn value(self) -> Option<f64> {
        match self {
            Objective::Unsolved => None,
            Objective::Value(v) => Some(v),
        }
    }

    /// Whether a feasible solution exists.
    #[inline]
    pub fn is_solved(self) -> bool {
        matches!(self, Objective::Value(_))
    }

    /// Finite value, or `reference` when unsolved.
    #[inline]
    pub fn resolve(self, reference: f64) -> f64 {
        self.value().unwrap_or(reference)
    }

    /// Raw float with the unsolved sentinel mapped back to `+inf`.
    #[inline]
    pub fn to_f64(self) -> f64 {
        self.value().unwrap_or(f64::INFINITY)
    }

    /// The better (lower) of two objectives; any value beats unsolved.
    pub fn min(self, other: Objective) -> Objective {
        match (self, other) {
            (Objective::Value(a), Objective::Value(b)) => Objective::Value(a.min(b)),
            (Objective::Value(a), Objective::Unsolved) => Objective::Value(a),
            (Objective::Unsolved, other) => other,
        }
    }

    /// Strictly better (lower) than `other`.
    pub fn improves_on(self, other: Objective) -> bool {
        match (self, other) {
            (Objective::Value(a), Objective::Value(b)) => a < b,
            (Objective::Value(_), Objective::Unsolved) => true,
            (Objective::Unsolved, _) => false,
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Objective::Unsolved => f.write_str("inf"),
            Objective::Value(v) => write!(f, "{v}"),
        }
    }
}

/// Largest finite objective in `objectives`, or `None` if all are unsolved.
pub fn max_finite(objectives: &[Objective]) -> Option<f64> {
    objectives
        .iter()
        .filter_map(|o| o.value())
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))))
}

/// Substitute unsolved entries with the largest finite entry of the same
/// triple.
///
/// Returns `None` when no solver has a finite objective.
pub fn resolve_triple(objectives: [Objective; 3]) -> Option<[f64; 3]> {
    let reference = max_finite(&objectives)?;
    Some(objectives.map(|o| o.resolve(reference)))
}
