use serde::{Deserialize, Serialize};

use super::super::domain::CourseId;

/// Why a course is (or is not) available to the learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockReason {
    None,
    LockedAwaitingCompletion,
    LockedAwaitingScore,
    LockedMissingDependency,
}

impl LockReason {
    pub const fn is_locked(self) -> bool {
        !matches!(self, Self::None)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "Available",
            Self::LockedAwaitingCompletion => "Awaiting completion",
            Self::LockedAwaitingScore => "Awaiting score",
            Self::LockedMissingDependency => "Missing prerequisite",
        }
    }
}

/// Per-membership verdict produced by the prerequisite engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityResult {
    pub locked: bool,
    pub reason: LockReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency: Option<CourseId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_score: Option<u8>,
}

impl AvailabilityResult {
    pub fn unlocked() -> Self {
        Self::with_reason(LockReason::None, None, None)
    }

    pub(crate) fn with_reason(
        reason: LockReason,
        dependency: Option<CourseId>,
        min_score: Option<u8>,
    ) -> Self {
        Self {
            locked: reason.is_locked(),
            reason,
            dependency,
            min_score,
        }
    }

    /// Tooltip text naming the dependency and threshold.
    ///
    /// `dependency_title` is the display name of the prerequisite course when the caller
    /// could resolve it; the course identifier is used otherwise.
    pub fn summary(&self, dependency_title: Option<&str>) -> String {
        let dependency = dependency_title
            .map(str::to_string)
            .or_else(|| self.dependency.as_ref().map(ToString::to_string))
            .unwrap_or_else(|| "the prerequisite course".to_string());

        match self.reason {
            LockReason::None => match (&self.dependency, self.min_score) {
                (Some(_), Some(min_score)) => {
                    format!("Unlocked by scoring at least {min_score}% in {dependency}")
                }
                (Some(_), None) => format!("Unlocked by completing {dependency}"),
                _ => "Available".to_string(),
            },
            LockReason::LockedAwaitingCompletion => {
                format!("Unlocks after completing {dependency}")
            }
            LockReason::LockedAwaitingScore => format!(
                "Unlocks after scoring at least {}% in {dependency}",
                self.min_score.unwrap_or_default()
            ),
            LockReason::LockedMissingDependency => {
                format!("Prerequisite course {dependency} is not part of this path")
            }
        }
    }
}
