mod builder;
pub mod views;

pub use builder::{arrange, build_layout};
pub use views::{CourseEntryView, PathLayout, PathProgressSummary, SectionLayoutView};
