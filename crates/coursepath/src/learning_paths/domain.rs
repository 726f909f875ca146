use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

define_id!(
    /// Identifier of a learning path.
    LearningPathId
);
define_id!(
    /// Identifier of a course's membership row inside one path.
    MembershipId
);
define_id!(
    /// Identifier of a course in the catalog.
    CourseId
);
define_id!(
    /// Identifier of a named grouping of memberships.
    SectionId
);

/// Condition controlling when a course becomes available to a learner.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UnlockRule {
    #[default]
    None,
    AfterCourse {
        course_id: CourseId,
    },
    AfterScore {
        course_id: CourseId,
        min_score: u8,
    },
}

impl UnlockRule {
    /// Course the rule waits on, if any.
    pub fn dependency(&self) -> Option<&CourseId> {
        match self {
            UnlockRule::None => None,
            UnlockRule::AfterCourse { course_id } | UnlockRule::AfterScore { course_id, .. } => {
                Some(course_id)
            }
        }
    }

    pub fn min_score(&self) -> Option<u8> {
        match self {
            UnlockRule::AfterScore { min_score, .. } => Some(*min_score),
            _ => None,
        }
    }

    pub fn unlock_type(&self) -> UnlockType {
        match self {
            UnlockRule::None => UnlockType::None,
            UnlockRule::AfterCourse { .. } => UnlockType::AfterCourse,
            UnlockRule::AfterScore { .. } => UnlockType::AfterScore,
        }
    }
}

/// Discriminant used by admin forms before a rule is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlockType {
    #[default]
    None,
    AfterCourse,
    AfterScore,
}

impl UnlockType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "Always available",
            Self::AfterCourse => "After course",
            Self::AfterScore => "After score",
        }
    }
}

/// Loosely-typed unlock configuration as submitted by the admin editor.
///
/// Fields are only meaningful for some `unlock_type` values; the guard turns this into an
/// [`UnlockRule`] and rejects combinations that cannot be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UnlockSettings {
    #[serde(default)]
    pub unlock_type: UnlockType,
    #[serde(default)]
    pub unlock_course_id: Option<CourseId>,
    #[serde(default)]
    pub min_score: Option<i64>,
}

impl UnlockSettings {
    pub fn after_course(course_id: impl Into<String>) -> Self {
        Self {
            unlock_type: UnlockType::AfterCourse,
            unlock_course_id: Some(CourseId::new(course_id)),
            min_score: None,
        }
    }

    pub fn after_score(course_id: impl Into<String>, min_score: i64) -> Self {
        Self {
            unlock_type: UnlockType::AfterScore,
            unlock_course_id: Some(CourseId::new(course_id)),
            min_score: Some(min_score),
        }
    }
}

impl From<&UnlockRule> for UnlockSettings {
    fn from(rule: &UnlockRule) -> Self {
        Self {
            unlock_type: rule.unlock_type(),
            unlock_course_id: rule.dependency().cloned(),
            min_score: rule.min_score().map(i64::from),
        }
    }
}

/// One course's inclusion in a learning path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseMembership {
    pub id: MembershipId,
    pub course_id: CourseId,
    pub title: String,
    #[serde(default)]
    pub section_id: Option<SectionId>,
    pub order: i32,
    #[serde(default)]
    pub unlock: UnlockRule,
}

/// Named, ordered grouping of memberships within a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub name: String,
    pub order: i32,
}

/// A learner's state for one course at evaluation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerProgressSnapshot {
    pub course_id: CourseId,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub score: Option<f32>,
    #[serde(default)]
    pub completed_on: Option<NaiveDate>,
}

impl LearnerProgressSnapshot {
    pub fn not_started(course_id: CourseId) -> Self {
        Self {
            course_id,
            completed: false,
            score: None,
            completed_on: None,
        }
    }
}

/// Progress lookup keyed by course; absent courses are not started.
pub type ProgressMap = HashMap<CourseId, LearnerProgressSnapshot>;

/// Index a list of snapshots by course. Later entries replace earlier ones.
pub fn progress_map<I>(snapshots: I) -> ProgressMap
where
    I: IntoIterator<Item = LearnerProgressSnapshot>,
{
    snapshots
        .into_iter()
        .map(|snapshot| (snapshot.course_id.clone(), snapshot))
        .collect()
}

/// Curriculum aggregate as persisted by the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningPath {
    pub id: LearningPathId,
    pub name: String,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub memberships: Vec<CourseMembership>,
}

impl LearningPath {
    pub fn membership(&self, id: &MembershipId) -> Option<&CourseMembership> {
        self.memberships.iter().find(|membership| &membership.id == id)
    }

    pub fn section(&self, id: &SectionId) -> Option<&Section> {
        self.sections.iter().find(|section| &section.id == id)
    }
}

/// File or API supplied description of a whole path, validated by the guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathDefinition {
    #[serde(default)]
    pub id: Option<LearningPathId>,
    pub name: String,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub courses: Vec<CourseDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseDefinition {
    pub id: MembershipId,
    pub course_id: CourseId,
    pub title: String,
    #[serde(default)]
    pub section_id: Option<SectionId>,
    pub order: i32,
    #[serde(default)]
    pub unlock: UnlockSettings,
}
