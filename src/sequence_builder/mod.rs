//! Fixed-width windows over per-frame vectors.
//!
//! Turns one instance's per-frame vectors (indicators or improvements) into
//! flattened training examples.
//!
//! # Architecture
//!
//! - **SequenceBuilder**: streaming builder with a bounded buffer (classification)
//! - **SequenceConfig**: horizon, stride and per-frame width
//! - **regression_windows / dilated_windows**: batch sequence-to-one rules
//! - **TrainingExample**: output unit (features + [`Target`])
//!
//! | Rule | Features | Target | Examples per instance |
//! |------|----------|--------|-----------------------|
//! | classification | H sampled frames | instance label | sampled frames − H |
//! | regression | frames `i..i+H` | frame `i+H` | `len − H` |
//! | dilated | frames `i, i+k, .., i+(H−1)k` | frame `i+kH` | `len − kH` |
//!
//! Every emitted feature vector has exactly `H × feature_count` entries.
//!
//! # Example
//!
//! ```ignore
//! use solver_trace_features::sequence_builder::regression_windows;
//!
//! let series = improvement_series(&trace);
//! let examples = regression_windows(&series, 3);
//! ```

mod builder;
mod windows;

pub use builder::{SequenceBuilder, SequenceConfig, SequenceError};
pub use windows::{
    classification_windows, dilated_windows, regression_windows, Target, TrainingExample,
};
