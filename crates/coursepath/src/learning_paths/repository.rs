use super::domain::{LearningPath, LearningPathId};

/// Storage abstraction so the service module can be exercised in isolation.
pub trait LearningPathRepository: Send + Sync {
    fn insert(&self, path: LearningPath) -> Result<LearningPath, RepositoryError>;
    fn update(&self, path: LearningPath) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &LearningPathId) -> Result<Option<LearningPath>, RepositoryError>;
    fn list(&self) -> Result<Vec<LearningPath>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
