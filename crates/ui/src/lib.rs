//! Render-ready projections of assessment session snapshots.

#![forbid(unsafe_code)]

pub mod vm;

pub use vm::{AssessmentView, QuestionView, ResultView};
