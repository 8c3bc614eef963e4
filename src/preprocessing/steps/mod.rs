//! Individual preprocessing steps

pub mod contrast;
pub mod luminance;
pub mod threshold;
