//! Analysis service — cache lookup, image loading, and backend calls.

pub mod analyzer;

pub use analyzer::{Analysis, AnalysisService, ImageSource};
