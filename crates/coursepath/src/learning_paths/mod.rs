//! Learning path structure, prerequisite evaluation, and the admin surface around them.

pub mod domain;
pub mod guard;
pub mod layout;
pub mod repository;
pub mod router;
pub mod service;
pub mod unlock;

#[cfg(test)]
mod tests;

pub use domain::{
    progress_map, CourseDefinition, CourseId, CourseMembership, LearnerProgressSnapshot,
    LearningPath, LearningPathId, MembershipId, PathDefinition, ProgressMap, Section, SectionId,
    UnlockRule, UnlockSettings, UnlockType,
};
pub use guard::{find_cycle, PathGuard, PathViolation};
pub use layout::{build_layout, CourseEntryView, PathLayout, PathProgressSummary};
pub use repository::{LearningPathRepository, RepositoryError};
pub use router::learning_path_router;
pub use service::{
    CoursePlacement, LearningPathService, NewCourseMembership, NewSection, PathServiceError,
    SectionUpdate,
};
pub use unlock::{AvailabilityMap, AvailabilityResult, LockReason, PrerequisiteEngine};
