use coursepath::config::PathPolicyConfig;
use coursepath::error::AppError;
use coursepath::learning_paths::{
    LearningPath, LearningPathId, LearningPathRepository, PathDefinition, PathGuard,
    RepositoryError,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) policy: PathPolicyConfig,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryLearningPathRepository {
    paths: Arc<Mutex<BTreeMap<LearningPathId, LearningPath>>>,
}

impl LearningPathRepository for InMemoryLearningPathRepository {
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
        if guard.contains_key(&path.id) {
            guard.insert(path.id.clone(), path);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
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

/// Read and validate a JSON path definition file.
pub(crate) fn load_path_definition(
    path: &Path,
    policy: PathPolicyConfig,
) -> Result<LearningPath, AppError> {
    let raw = std::fs::read_to_string(path)?;
    let definition: PathDefinition = serde_json::from_str(&raw)?;
    let learning_path = PathGuard::new(policy).path_from_definition(definition)?;
    Ok(learning_path)
}
