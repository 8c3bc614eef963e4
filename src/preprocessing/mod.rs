//! Image preprocessing applied before recognition
//!
//! Every upload goes through exactly one per-pixel filter: a contrast stretch
//! or a hard binarization.

pub mod pipeline;
pub mod steps;

pub use pipeline::{Filter, Pipeline, ProcessedImage, StepTiming};
