use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{
    CourseId, CourseMembership, LearningPath, LearningPathId, MembershipId, PathDefinition,
    ProgressMap, Section, SectionId, UnlockSettings,
};
use super::guard::{PathGuard, PathViolation};
use super::layout::{self, PathLayout};
use super::repository::{LearningPathRepository, RepositoryError};
use super::unlock::{AvailabilityMap, PrerequisiteEngine};
use crate::config::PathPolicyConfig;

/// Request to place a course into a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCourseMembership {
    pub course_id: CourseId,
    pub title: String,
    #[serde(default)]
    pub section_id: Option<SectionId>,
    #[serde(default)]
    pub order: Option<i32>,
    #[serde(default)]
    pub unlock: UnlockSettings,
}

/// Target position for a course; a missing order appends to the target collection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CoursePlacement {
    #[serde(default)]
    pub section_id: Option<SectionId>,
    #[serde(default)]
    pub order: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSection {
    pub name: String,
    #[serde(default)]
    pub order: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SectionUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub order: Option<i32>,
}

/// Service composing the write guard, repository, and prerequisite engine.
///
/// Edits to existing paths hold one write lock from fetch through validation to update.
pub struct LearningPathService<R> {
    guard: Arc<PathGuard>,
    repository: Arc<R>,
    engine: PrerequisiteEngine,
    writes: Mutex<()>,
}

static PATH_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static MEMBERSHIP_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static SECTION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_path_id() -> LearningPathId {
    let id = PATH_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    LearningPathId(format!("path-{id:06}"))
}

fn next_membership_id() -> MembershipId {
    let id = MEMBERSHIP_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    MembershipId(format!("membership-{id:06}"))
}

fn next_section_id() -> SectionId {
    let id = SECTION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SectionId(format!("section-{id:06}"))
}

fn next_order(orders: impl Iterator<Item = i32>) -> i32 {
    orders.max().map(|max| max.saturating_add(1)).unwrap_or(0)
}

fn orders_in(memberships: &[CourseMembership], section_id: Option<&SectionId>) -> Vec<i32> {
    memberships
        .iter()
        .filter(|membership| membership.section_id.as_ref() == section_id)
        .map(|membership| membership.order)
        .collect()
}

impl<R> LearningPathService<R>
where
    R: LearningPathRepository + 'static,
{
    pub fn new(repository: Arc<R>, policy: PathPolicyConfig) -> Self {
        Self::with_guard(PathGuard::new(policy), repository)
    }

    pub fn with_guard(guard: PathGuard, repository: Arc<R>) -> Self {
        Self {
            guard: Arc::new(guard),
            repository,
            engine: PrerequisiteEngine::new(),
            writes: Mutex::new(()),
        }
    }

    fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.writes.lock().expect("write mutex poisoned")
    }

    pub fn create_path(&self, name: &str) -> Result<LearningPath, PathServiceError> {
        let name = self.guard.check_name(name)?;
        let path = LearningPath {
            id: next_path_id(),
            name,
            sections: Vec::new(),
            memberships: Vec::new(),
        };

        let stored = self.repository.insert(path)?;
        info!(path_id = %stored.id, "created learning path");
        Ok(stored)
    }

    /// Validate a whole path definition and store it, assigning an id when none is given.
    pub fn import_path(
        &self,
        mut definition: PathDefinition,
    ) -> Result<LearningPath, PathServiceError> {
        let id = definition.id.take().unwrap_or_else(next_path_id);
        let path = LearningPath {
            id,
            ..self.guard.path_from_definition(definition)?
        };

        let stored = self.repository.insert(path)?;
        info!(
            path_id = %stored.id,
            courses = stored.memberships.len(),
            sections = stored.sections.len(),
            "imported learning path"
        );
        Ok(stored)
    }

    pub fn get(&self, path_id: &LearningPathId) -> Result<LearningPath, PathServiceError> {
        let path = self
            .repository
            .fetch(path_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(path)
    }

    pub fn list(&self) -> Result<Vec<LearningPath>, PathServiceError> {
        Ok(self.repository.list()?)
    }

    pub fn add_course(
        &self,
        path_id: &LearningPathId,
        request: NewCourseMembership,
    ) -> Result<CourseMembership, PathServiceError> {
        let _writes = self.lock_writes();
        let mut path = self.get(path_id)?;
        self.guard.check_capacity(&path.memberships)?;

        let course_id = CourseId(self.guard.check_name(request.course_id.as_str())?);
        let title = self.guard.check_name(&request.title)?;
        let unlock = self.guard.rule_from_settings(&course_id, &request.unlock)?;
        let order = request.order.unwrap_or_else(|| {
            next_order(
                orders_in(&path.memberships, request.section_id.as_ref()).into_iter(),
            )
        });

        let membership = CourseMembership {
            id: next_membership_id(),
            course_id,
            title,
            section_id: request.section_id,
            order,
            unlock,
        };

        let mut candidate = path.memberships.clone();
        candidate.push(membership.clone());
        self.guard.check_memberships(&path, &candidate)?;

        path.memberships = candidate;
        self.repository.update(path)?;
        info!(
            path_id = %path_id,
            membership_id = %membership.id,
            course_id = %membership.course_id,
            "added course to learning path"
        );
        Ok(membership)
    }

    pub fn remove_course(
        &self,
        path_id: &LearningPathId,
        membership_id: &MembershipId,
    ) -> Result<CourseMembership, PathServiceError> {
        let _writes = self.lock_writes();
        let mut path = self.get(path_id)?;
        let position = membership_position(&path, membership_id)?;
        self.guard.check_removal(&path.memberships, membership_id)?;

        let removed = path.memberships.remove(position);
        self.repository.update(path)?;
        info!(
            path_id = %path_id,
            membership_id = %membership_id,
            "removed course from learning path"
        );
        Ok(removed)
    }

    pub fn set_unlock_rule(
        &self,
        path_id: &LearningPathId,
        membership_id: &MembershipId,
        settings: &UnlockSettings,
    ) -> Result<CourseMembership, PathServiceError> {
        let _writes = self.lock_writes();
        self.update_membership(path_id, membership_id, |guard, membership| {
            membership.unlock = guard.rule_from_settings(&membership.course_id, settings)?;
            Ok(())
        })
        .inspect(|membership| {
            info!(
                path_id = %path_id,
                membership_id = %membership.id,
                unlock = ?membership.unlock,
                "updated unlock rule"
            );
        })
    }

    pub fn move_course(
        &self,
        path_id: &LearningPathId,
        membership_id: &MembershipId,
        placement: CoursePlacement,
    ) -> Result<CourseMembership, PathServiceError> {
        let _writes = self.lock_writes();
        let path = self.get(path_id)?;
        let order = placement.order.unwrap_or_else(|| {
            let siblings: Vec<i32> = path
                .memberships
                .iter()
                .filter(|membership| &membership.id != membership_id)
                .filter(|membership| membership.section_id == placement.section_id)
                .map(|membership| membership.order)
                .collect();
            next_order(siblings.into_iter())
        });

        self.update_membership(path_id, membership_id, |_, membership| {
            membership.section_id = placement.section_id.clone();
            membership.order = order;
            Ok(())
        })
        .inspect(|membership| {
            info!(
                path_id = %path_id,
                membership_id = %membership.id,
                section_id = ?membership.section_id,
                order = membership.order,
                "moved course"
            );
        })
    }

    pub fn create_section(
        &self,
        path_id: &LearningPathId,
        request: NewSection,
    ) -> Result<Section, PathServiceError> {
        let _writes = self.lock_writes();
        let mut path = self.get(path_id)?;
        let name = self.guard.check_name(&request.name)?;
        let order = request
            .order
            .unwrap_or_else(|| next_order(path.sections.iter().map(|section| section.order)));

        let section = Section {
            id: next_section_id(),
            name,
            order,
        };
        path.sections.push(section.clone());
        self.repository.update(path)?;
        info!(path_id = %path_id, section_id = %section.id, "created section");
        Ok(section)
    }

    /// Rename and/or reorder a section.
    pub fn update_section(
        &self,
        path_id: &LearningPathId,
        section_id: &SectionId,
        update: SectionUpdate,
    ) -> Result<Section, PathServiceError> {
        let _writes = self.lock_writes();
        let mut path = self.get(path_id)?;
        let name = update
            .name
            .as_deref()
            .map(|name| self.guard.check_name(name))
            .transpose()?;

        let section = path
            .sections
            .iter_mut()
            .find(|section| &section.id == section_id)
            .ok_or_else(|| PathServiceError::SectionNotFound(section_id.clone()))?;
        if let Some(name) = name {
            section.name = name;
        }
        if let Some(order) = update.order {
            section.order = order;
        }
        let updated = section.clone();

        self.repository.update(path)?;
        info!(path_id = %path_id, section_id = %section_id, "updated section");
        Ok(updated)
    }

    /// Delete a section; its courses keep their relative order and move after the
    /// ungrouped courses.
    pub fn delete_section(
        &self,
        path_id: &LearningPathId,
        section_id: &SectionId,
    ) -> Result<Section, PathServiceError> {
        let _writes = self.lock_writes();
        let mut path = self.get(path_id)?;
        let position = path
            .sections
            .iter()
            .position(|section| &section.id == section_id)
            .ok_or_else(|| PathServiceError::SectionNotFound(section_id.clone()))?;
        let removed = path.sections.remove(position);

        let mut base = next_order(orders_in(&path.memberships, None).into_iter());
        let mut released: Vec<&mut CourseMembership> = path
            .memberships
            .iter_mut()
            .filter(|membership| membership.section_id.as_ref() == Some(section_id))
            .collect();
        released.sort_by_key(|membership| membership.order);
        let released_count = released.len();
        for membership in released {
            membership.section_id = None;
            membership.order = base;
            base = base.saturating_add(1);
        }

        self.repository.update(path)?;
        info!(
            path_id = %path_id,
            section_id = %section_id,
            released = released_count,
            "deleted section"
        );
        Ok(removed)
    }

    pub fn availability(
        &self,
        path_id: &LearningPathId,
        progress: &ProgressMap,
    ) -> Result<AvailabilityMap, PathServiceError> {
        let path = self.get(path_id)?;
        Ok(self.engine.evaluate(&path.memberships, progress))
    }

    pub fn layout(
        &self,
        path_id: &LearningPathId,
        progress: &ProgressMap,
    ) -> Result<PathLayout, PathServiceError> {
        let path = self.get(path_id)?;
        let availability = self.engine.evaluate(&path.memberships, progress);
        Ok(layout::arrange(
            &path.sections,
            &path.memberships,
            progress,
            &availability,
        ))
    }

    /// Callers hold the write lock.
    fn update_membership<F>(
        &self,
        path_id: &LearningPathId,
        membership_id: &MembershipId,
        apply: F,
    ) -> Result<CourseMembership, PathServiceError>
    where
        F: FnOnce(&PathGuard, &mut CourseMembership) -> Result<(), PathViolation>,
    {
        let mut path = self.get(path_id)?;
        let position = membership_position(&path, membership_id)?;

        let mut candidate = path.memberships.clone();
        apply(self.guard.as_ref(), &mut candidate[position])?;
        self.guard.check_memberships(&path, &candidate)?;

        let updated = candidate[position].clone();
        path.memberships = candidate;
        self.repository.update(path)?;
        Ok(updated)
    }
}

fn membership_position(
    path: &LearningPath,
    membership_id: &MembershipId,
) -> Result<usize, PathServiceError> {
    path.memberships
        .iter()
        .position(|membership| &membership.id == membership_id)
        .ok_or_else(|| PathServiceError::MembershipNotFound(membership_id.clone()))
}

/// Error raised by the learning path service.
#[derive(Debug, thiserror::Error)]
pub enum PathServiceError {
    #[error(transparent)]
    Validation(#[from] PathViolation),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("membership {0} not found in path")]
    MembershipNotFound(MembershipId),
    #[error("section {0} not found in path")]
    SectionNotFound(SectionId),
}
