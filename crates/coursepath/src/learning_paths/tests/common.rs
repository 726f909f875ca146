use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::config::PathPolicyConfig;
use crate::learning_paths::domain::{
    progress_map, CourseId, CourseMembership, LearnerProgressSnapshot, LearningPath,
    LearningPathId, MembershipId, ProgressMap, Section, SectionId, UnlockRule,
};
use crate::learning_paths::repository::{LearningPathRepository, RepositoryError};
use crate::learning_paths::{learning_path_router, LearningPathService};

pub(super) fn membership(
    id: &str,
    course: &str,
    order: i32,
    unlock: UnlockRule,
) -> CourseMembership {
    CourseMembership {
        id: MembershipId::from(id),
        course_id: CourseId::from(course),
        title: format!("Course {}", course.to_uppercase()),
        section_id: None,
        order,
        unlock,
    }
}

pub(super) fn in_section(mut membership: CourseMembership, section: &str) -> CourseMembership {
    membership.section_id = Some(SectionId::from(section));
    membership
}

pub(super) fn after_course(course: &str) -> UnlockRule {
    UnlockRule::AfterCourse {
        course_id: CourseId::from(course),
    }
}

pub(super) fn after_score(course: &str, min_score: u8) -> UnlockRule {
    UnlockRule::AfterScore {
        course_id: CourseId::from(course),
        min_score,
    }
}

pub(super) fn section(id: &str, name: &str, order: i32) -> Section {
    Section {
        id: SectionId::from(id),
        name: name.to_string(),
        order,
    }
}

pub(super) fn completed(course: &str, score: Option<f32>) -> LearnerProgressSnapshot {
    LearnerProgressSnapshot {
        course_id: CourseId::from(course),
        completed: true,
        score,
        completed_on: None,
    }
}

pub(super) fn in_progress(course: &str, score: Option<f32>) -> LearnerProgressSnapshot {
    LearnerProgressSnapshot {
        completed: false,
        ..completed(course, score)
    }
}

pub(super) fn progress(snapshots: Vec<LearnerProgressSnapshot>) -> ProgressMap {
    progress_map(snapshots)
}

/// Path with A (open), B (after A), C (after A with 70%).
pub(super) fn chained_memberships() -> Vec<CourseMembership> {
    vec![
        membership("m-a", "a", 1, UnlockRule::None),
        membership("m-b", "b", 2, after_course("a")),
        membership("m-c", "c", 3, after_score("a", 70)),
    ]
}

pub(super) fn policy() -> PathPolicyConfig {
    PathPolicyConfig {
        max_courses_per_path: 4,
    }
}

pub(super) fn build_service() -> (LearningPathService<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    let service = LearningPathService::new(repository.clone(), policy());
    (service, repository)
}

pub(super) fn router_with_service(
    service: LearningPathService<MemoryRepository>,
) -> axum::Router {
    learning_path_router(Arc::new(service))
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) paths: Arc<Mutex<HashMap<LearningPathId, LearningPath>>>,
}

impl LearningPathRepository for MemoryRepository {
    fn insert(&self, path: LearningPath) -> Result<LearningPath, RepositoryError> {
        let mut guard = self.paths.lock().expect("repository mutex poisoned");
        if guard.contains_key(&path.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(path.id.clone(), path.clone());
        Ok(path)
    }

    fn update(&self, path: LearningPath) -> Result<(), RepositoryError> {
        let mut guard = self.paths.lock().expect("repository mutex poisoned");
        guard.insert(path.id.clone(), path);
        Ok(())
    }

    fn fetch(&self, id: &LearningPathId) -> Result<Option<LearningPath>, RepositoryError> {
        let guard = self.paths.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<LearningPath>, RepositoryError> {
        let guard = self.paths.lock().expect("repository mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

/// In-memory repository whose reads stall, widening the window between fetch and update.
#[derive(Default)]
pub(super) struct SlowRepository {
    inner: MemoryRepository,
}

const SLOW_FETCH: Duration = Duration::from_millis(25);

impl LearningPathRepository for SlowRepository {
    fn insert(&self, path: LearningPath) -> Result<LearningPath, RepositoryError> {
        self.inner.insert(path)
    }

    fn update(&self, path: LearningPath) -> Result<(), RepositoryError> {
        self.inner.update(path)
    }

    fn fetch(&self, id: &LearningPathId) -> Result<Option<LearningPath>, RepositoryError> {
        thread::sleep(SLOW_FETCH);
        self.inner.fetch(id)
    }

    fn list(&self) -> Result<Vec<LearningPath>, RepositoryError> {
        self.inner.list()
    }
}

pub(super) struct UnavailableRepository;

impl LearningPathRepository for UnavailableRepository {
    fn insert(&self, _path: LearningPath) -> Result<LearningPath, RepositoryError> {
        Err(RepositoryError::Unavailable("maintenance".to_string()))
    }

    fn update(&self, _path: LearningPath) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("maintenance".to_string()))
    }

    fn fetch(&self, _id: &LearningPathId) -> Result<Option<LearningPath>, RepositoryError> {
        Err(RepositoryError::Unavailable("maintenance".to_string()))
    }

    fn list(&self) -> Result<Vec<LearningPath>, RepositoryError> {
        Err(RepositoryError::Unavailable("maintenance".to_string()))
    }
}
