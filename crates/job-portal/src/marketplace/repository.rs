use super::domain::{
    Account, AccountId, Application, ApplicationId, ApplicationStatus, JobId, JobPosting, Profile,
    ProfileFields, Role,
};

/// Account row prior to id assignment.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct NewJobPosting {
    pub employer_id: AccountId,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct NewApplication {
    pub job_id: JobId,
    pub seeker_id: AccountId,
    pub resume_text: String,
}

/// Storage abstraction so the marketplace service can be exercised in isolation.
///
/// Every method is a single statement against the backing store; the service never
/// composes them into multi-step transactions.
pub trait MarketplaceStore: Send + Sync {
    /// Fails with [`RepositoryError::Conflict`] when the username is taken.
    fn insert_account(&self, account: NewAccount) -> Result<Account, RepositoryError>;
    fn account(&self, id: AccountId) -> Result<Option<Account>, RepositoryError>;
    fn account_by_username(&self, username: &str) -> Result<Option<Account>, RepositoryError>;
    fn accounts(&self) -> Result<Vec<Account>, RepositoryError>;

    fn insert_job(&self, job: NewJobPosting) -> Result<JobPosting, RepositoryError>;
    fn job(&self, id: JobId) -> Result<Option<JobPosting>, RepositoryError>;
    fn jobs(&self) -> Result<Vec<JobPosting>, RepositoryError>;

    fn insert_application(
        &self,
        application: NewApplication,
    ) -> Result<Application, RepositoryError>;
    fn application(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError>;
    fn applications(&self) -> Result<Vec<Application>, RepositoryError>;

    /// Move a `pending` application to `status`.
    ///
    /// Returns [`RepositoryError::NotFound`] for unknown ids and
    /// [`RepositoryError::Conflict`] when the application is no longer pending.
    fn decide_application(
        &self,
        id: ApplicationId,
        status: ApplicationStatus,
    ) -> Result<Application, RepositoryError>;

    fn upsert_profile(
        &self,
        user_id: AccountId,
        fields: ProfileFields,
    ) -> Result<Profile, RepositoryError>;
    fn profile(&self, user_id: AccountId) -> Result<Option<Profile>, RepositoryError>;
    fn profiles(&self) -> Result<Vec<Profile>, RepositoryError>;
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
