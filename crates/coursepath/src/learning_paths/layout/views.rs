use super::super::domain::{CourseId, MembershipId, SectionId};
use super::super::unlock::{AvailabilityResult, LockReason};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseEntryView {
    pub membership_id: MembershipId,
    pub course_id: CourseId,
    pub title: String,
    pub order: i32,
    pub locked: bool,
    pub reason: LockReason,
    pub reason_label: &'static str,
    pub hint: String,
    pub availability: AvailabilityResult,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionLayoutView {
    pub section_id: SectionId,
    pub name: String,
    pub order: i32,
    pub courses: Vec<CourseEntryView>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PathProgressSummary {
    pub total: usize,
    pub unlocked: usize,
    pub locked: usize,
    pub completed: usize,
}

impl PathProgressSummary {
    pub fn completion_pct(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        self.completed as f32 / self.total as f32 * 100.0
    }
}

/// Learner-facing structure of a path: ordered sections followed by ungrouped courses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathLayout {
    pub sections: Vec<SectionLayoutView>,
    pub ungrouped: Vec<CourseEntryView>,
    pub summary: PathProgressSummary,
}

impl PathLayout {
    /// Entries in display order, sections first.
    pub fn entries(&self) -> impl Iterator<Item = &CourseEntryView> {
        self.sections
            .iter()
            .flat_map(|section| section.courses.iter())
            .chain(self.ungrouped.iter())
    }

    pub fn entry(&self, membership_id: &MembershipId) -> Option<&CourseEntryView> {
        self.entries()
            .find(|entry| &entry.membership_id == membership_id)
    }
}
