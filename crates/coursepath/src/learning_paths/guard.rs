use std::collections::{HashMap, HashSet};

use super::domain::{
    CourseId, CourseMembership, LearningPath, LearningPathId, MembershipId, PathDefinition,
    SectionId, UnlockRule, UnlockSettings, UnlockType,
};
use crate::config::PathPolicyConfig;

/// Write-time validation errors for learning path edits.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathViolation {
    #[error("name must not be blank")]
    BlankName,
    #[error("{} rules require an unlock course", .0.label())]
    MissingDependencyCourse(UnlockType),
    #[error("score-gated unlock rule requires a minimum score")]
    MissingMinScore,
    #[error("minimum score must be between 0 and 100 (found {0})")]
    ScoreOutOfRange(i64),
    #[error("course {0} cannot unlock after itself")]
    SelfReference(CourseId),
    #[error("course {course_id} depends on {dependency}, which is not part of this path")]
    UnknownDependency {
        course_id: CourseId,
        dependency: CourseId,
    },
    #[error("course {0} is already part of this path")]
    DuplicateCourse(CourseId),
    #[error("membership id {0} is used more than once")]
    DuplicateMembership(MembershipId),
    #[error("unlock rules form a cycle: {}", format_cycle(.0))]
    Cycle(Vec<CourseId>),
    #[error("course {course_id} is a prerequisite of {}", format_cycle(.dependents))]
    DependentCourses {
        course_id: CourseId,
        dependents: Vec<CourseId>,
    },
    #[error("section id {0} is used more than once")]
    DuplicateSection(SectionId),
    #[error("section {0} does not exist in this path")]
    UnknownSection(SectionId),
    #[error("path already holds the maximum of {max} courses")]
    CapacityExceeded { max: usize },
}

fn format_cycle(courses: &[CourseId]) -> String {
    courses
        .iter()
        .map(CourseId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Guard applied to every administrative write before it reaches the repository.
#[derive(Debug, Clone, Default)]
pub struct PathGuard {
    policy: PathPolicyConfig,
}

impl PathGuard {
    pub fn new(policy: PathPolicyConfig) -> Self {
        Self { policy }
    }

    pub fn check_name(&self, name: &str) -> Result<String, PathViolation> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(PathViolation::BlankName);
        }
        Ok(trimmed.to_string())
    }

    /// Convert admin settings into a typed rule for the course `course_id`.
    pub fn rule_from_settings(
        &self,
        course_id: &CourseId,
        settings: &UnlockSettings,
    ) -> Result<UnlockRule, PathViolation> {
        let rule = match settings.unlock_type {
            UnlockType::None => UnlockRule::None,
            UnlockType::AfterCourse => UnlockRule::AfterCourse {
                course_id: required_course(settings)?,
            },
            UnlockType::AfterScore => {
                let dependency = required_course(settings)?;
                let raw = settings.min_score.ok_or(PathViolation::MissingMinScore)?;
                let min_score = u8::try_from(raw)
                    .ok()
                    .filter(|score| *score <= 100)
                    .ok_or(PathViolation::ScoreOutOfRange(raw))?;
                UnlockRule::AfterScore {
                    course_id: dependency,
                    min_score,
                }
            }
        };

        if rule.dependency() == Some(course_id) {
            return Err(PathViolation::SelfReference(course_id.clone()));
        }

        Ok(rule)
    }

    pub fn check_capacity(&self, memberships: &[CourseMembership]) -> Result<(), PathViolation> {
        if memberships.len() >= self.policy.max_courses_per_path {
            return Err(PathViolation::CapacityExceeded {
                max: self.policy.max_courses_per_path,
            });
        }
        Ok(())
    }

    /// Validate the full set of memberships as it would look after a write.
    pub fn check_memberships(
        &self,
        path: &LearningPath,
        memberships: &[CourseMembership],
    ) -> Result<(), PathViolation> {
        if memberships.len() > self.policy.max_courses_per_path {
            return Err(PathViolation::CapacityExceeded {
                max: self.policy.max_courses_per_path,
            });
        }

        let mut section_ids = HashSet::new();
        for section in &path.sections {
            if !section_ids.insert(&section.id) {
                return Err(PathViolation::DuplicateSection(section.id.clone()));
            }
        }

        let mut courses = HashSet::new();
        let mut ids = HashSet::new();
        for membership in memberships {
            if !courses.insert(&membership.course_id) {
                return Err(PathViolation::DuplicateCourse(membership.course_id.clone()));
            }
            if !ids.insert(&membership.id) {
                return Err(PathViolation::DuplicateMembership(membership.id.clone()));
            }
            if let Some(section_id) = &membership.section_id {
                if path.section(section_id).is_none() {
                    return Err(PathViolation::UnknownSection(section_id.clone()));
                }
            }
        }

        for membership in memberships {
            if let Some(dependency) = membership.unlock.dependency() {
                if dependency == &membership.course_id {
                    return Err(PathViolation::SelfReference(dependency.clone()));
                }
                if !courses.contains(dependency) {
                    return Err(PathViolation::UnknownDependency {
                        course_id: membership.course_id.clone(),
                        dependency: dependency.clone(),
                    });
                }
            }
        }

        match find_cycle(memberships) {
            Some(cycle) => Err(PathViolation::Cycle(cycle)),
            None => Ok(()),
        }
    }

    /// Reject removing a course that other memberships unlock after.
    pub fn check_removal(
        &self,
        memberships: &[CourseMembership],
        membership_id: &MembershipId,
    ) -> Result<(), PathViolation> {
        let Some(removed) = memberships
            .iter()
            .find(|membership| &membership.id == membership_id)
        else {
            return Ok(());
        };

        let dependents: Vec<CourseId> = memberships
            .iter()
            .filter(|membership| membership.id != removed.id)
            .filter(|membership| membership.unlock.dependency() == Some(&removed.course_id))
            .map(|membership| membership.course_id.clone())
            .collect();

        if dependents.is_empty() {
            Ok(())
        } else {
            Err(PathViolation::DependentCourses {
                course_id: removed.course_id.clone(),
                dependents,
            })
        }
    }

    /// Build a validated path from a definition file.
    pub fn path_from_definition(
        &self,
        definition: PathDefinition,
    ) -> Result<LearningPath, PathViolation> {
        let name = self.check_name(&definition.name)?;
        let mut sections = definition.sections;
        for section in &mut sections {
            section.name = self.check_name(&section.name)?;
        }

        let memberships = definition
            .courses
            .into_iter()
            .map(|course| {
                let unlock = self.rule_from_settings(&course.course_id, &course.unlock)?;
                Ok(CourseMembership {
                    id: course.id,
                    course_id: course.course_id,
                    title: course.title,
                    section_id: course.section_id,
                    order: course.order,
                    unlock,
                })
            })
            .collect::<Result<Vec<_>, PathViolation>>()?;

        let path = LearningPath {
            id: definition
                .id
                .unwrap_or_else(|| LearningPathId::new("path-definition")),
            name,
            sections,
            memberships: Vec::new(),
        };
        self.check_memberships(&path, &memberships)?;

        Ok(LearningPath {
            memberships,
            ..path
        })
    }
}

fn required_course(settings: &UnlockSettings) -> Result<CourseId, PathViolation> {
    settings
        .unlock_course_id
        .clone()
        .filter(|course_id| !course_id.as_str().trim().is_empty())
        .ok_or(PathViolation::MissingDependencyCourse(settings.unlock_type))
}

/// Find a prerequisite cycle, returning the courses on it in dependency order.
///
/// Each course has at most one outgoing edge, so following edges from every unvisited course
/// in input order finds the first cycle deterministically without recursion.
pub fn find_cycle(memberships: &[CourseMembership]) -> Option<Vec<CourseId>> {
    let mut edges: HashMap<&CourseId, &CourseId> = HashMap::new();
    for membership in memberships {
        if let Some(dependency) = membership.unlock.dependency() {
            edges.entry(&membership.course_id).or_insert(dependency);
        }
    }

    let mut finished: HashSet<&CourseId> = HashSet::new();
    for membership in memberships {
        let start = &membership.course_id;
        if finished.contains(start) {
            continue;
        }

        let mut trail: Vec<&CourseId> = Vec::new();
        let mut on_trail: HashMap<&CourseId, usize> = HashMap::new();
        let mut current = Some(start);

        while let Some(course) = current {
            if finished.contains(course) {
                break;
            }
            if let Some(&position) = on_trail.get(course) {
                return Some(trail[position..].iter().map(|id| (*id).clone()).collect());
            }
            on_trail.insert(course, trail.len());
            trail.push(course);
            current = edges.get(course).copied();
        }

        finished.extend(trail);
    }

    None
}
