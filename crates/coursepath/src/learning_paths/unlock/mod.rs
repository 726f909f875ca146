mod policy;
mod rules;

pub use policy::{AvailabilityResult, LockReason};

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use super::domain::{CourseId, CourseMembership, MembershipId, ProgressMap};

/// Per-membership availability keyed by membership id.
pub type AvailabilityMap = BTreeMap<MembershipId, AvailabilityResult>;

/// Stateless evaluator deciding which courses of a path a learner may open.
///
/// Each membership is checked against its immediate dependency only, so the pass is linear
/// in the number of memberships and terminates even on cyclic data.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrerequisiteEngine;

impl PrerequisiteEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(
        &self,
        memberships: &[CourseMembership],
        progress: &ProgressMap,
    ) -> AvailabilityMap {
        let by_course = index_by_course(memberships);

        let results: AvailabilityMap = memberships
            .iter()
            .map(|membership| {
                let dependency = membership
                    .unlock
                    .dependency()
                    .and_then(|course_id| by_course.get(course_id).copied());
                let result = rules::availability_for(membership, dependency, progress);

                if result.reason == LockReason::LockedMissingDependency {
                    warn!(
                        membership_id = %membership.id,
                        course_id = %membership.course_id,
                        dependency = ?membership.unlock.dependency(),
                        "unlock rule references a course outside the path"
                    );
                }

                (membership.id.clone(), result)
            })
            .collect();

        debug!(
            memberships = memberships.len(),
            locked = results.values().filter(|result| result.locked).count(),
            "evaluated learning path availability"
        );

        results
    }
}

/// First membership per course, in input order.
fn index_by_course(memberships: &[CourseMembership]) -> HashMap<&CourseId, &CourseMembership> {
    let mut index = HashMap::with_capacity(memberships.len());
    for membership in memberships {
        index.entry(&membership.course_id).or_insert(membership);
    }
    index
}
