use super::domain::{ApplicationId, ApplicationRecord, InterviewId, InterviewRecord, OwnerId};

/// Storage for tracked applications. Every lookup is scoped to the owning user.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError>;
    /// Replace an existing record; `NotFound` when the owner has no record with that id.
    fn update(&self, record: ApplicationRecord) -> Result<(), RepositoryError>;
    fn fetch(
        &self,
        owner: &OwnerId,
        id: &ApplicationId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError>;
    fn list(&self, owner: &OwnerId) -> Result<Vec<ApplicationRecord>, RepositoryError>;
    fn delete(&self, owner: &OwnerId, id: &ApplicationId) -> Result<(), RepositoryError>;
}

/// Storage for scheduled interviews.
pub trait InterviewRepository: Send + Sync {
    fn insert(&self, record: InterviewRecord) -> Result<InterviewRecord, RepositoryError>;
    fn update(&self, record: InterviewRecord) -> Result<(), RepositoryError>;
    fn fetch(
        &self,
        owner: &OwnerId,
        id: &InterviewId,
    ) -> Result<Option<InterviewRecord>, RepositoryError>;
    fn list(&self, owner: &OwnerId) -> Result<Vec<InterviewRecord>, RepositoryError>;
    fn list_for_application(
        &self,
        owner: &OwnerId,
        application_id: &ApplicationId,
    ) -> Result<Vec<InterviewRecord>, RepositoryError>;
    fn delete(&self, owner: &OwnerId, id: &InterviewId) -> Result<(), RepositoryError>;
    /// Remove every interview of one application, returning how many were removed.
    fn delete_for_application(
        &self,
        owner: &OwnerId,
        application_id: &ApplicationId,
    ) -> Result<usize, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
