//! Learning-path prerequisite evaluation, layout views, and course administration.

pub mod config;
pub mod error;
pub mod gradebook;
pub mod learning_paths;
pub mod telemetry;
