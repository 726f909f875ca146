use super::super::domain::{CourseMembership, LearnerProgressSnapshot, ProgressMap, UnlockRule};
use super::policy::{AvailabilityResult, LockReason};

/// Result of checking one rule against the dependency's progress.
pub(crate) enum RuleCheck {
    Open,
    Unmet(LockReason),
}

/// Apply `rule` once the dependency membership has been located.
///
/// Missing progress counts as not started.
pub(crate) fn check_rule(
    rule: &UnlockRule,
    progress: Option<&LearnerProgressSnapshot>,
) -> RuleCheck {
    let completed = progress.map(|snapshot| snapshot.completed).unwrap_or(false);

    match rule {
        UnlockRule::None => RuleCheck::Open,
        UnlockRule::AfterCourse { .. } => {
            if completed {
                RuleCheck::Open
            } else {
                RuleCheck::Unmet(LockReason::LockedAwaitingCompletion)
            }
        }
        UnlockRule::AfterScore { min_score, .. } => {
            let meets_score = progress
                .and_then(|snapshot| snapshot.score)
                .map(|score| score >= f32::from(*min_score))
                .unwrap_or(false);

            if completed && meets_score {
                RuleCheck::Open
            } else {
                RuleCheck::Unmet(LockReason::LockedAwaitingScore)
            }
        }
    }
}

pub(crate) fn availability_for(
    membership: &CourseMembership,
    dependency: Option<&CourseMembership>,
    progress: &ProgressMap,
) -> AvailabilityResult {
    let rule = &membership.unlock;
    let Some(required) = rule.dependency() else {
        return AvailabilityResult::unlocked();
    };

    let reason = match dependency {
        None => LockReason::LockedMissingDependency,
        Some(found) => match check_rule(rule, progress.get(&found.course_id)) {
            RuleCheck::Open => LockReason::None,
            RuleCheck::Unmet(reason) => reason,
        },
    };

    AvailabilityResult::with_reason(reason, Some(required.clone()), rule.min_score())
}
