use std::borrow::Cow;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use validator::{Validate, ValidateEmail, ValidationError, ValidationErrors};

use super::domain::{
    AccountId, AccountSummary, Application, ApplicationDecision, ApplicationId, ApplicationStatus,
    JobId, JobPosting, Profile, ProfileFields, Role,
};
use super::identity::{
    AssertionIssuer, AssertionRejection, Caller, CredentialError, PasswordHasher,
};
use super::policy::{authorize, Decision, Operation};
use super::report::{
    self, AdminActivityRow, EmployerReportRow, JobApplicationEntry, JobFilter, JobListing,
    SeekerApplicationEntry,
};
use super::repository::{
    MarketplaceStore, NewAccount, NewApplication, NewJobPosting, RepositoryError,
};
use crate::config::AuthConfig;

/// Account creation request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Registration {
    #[validate(length(min = 3, max = 64, message = "username must be 3 to 64 characters"))]
    pub username: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct JobDraft {
    #[validate(length(min = 1, max = 200, message = "title must be 1 to 200 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 10000, message = "description must be at most 10000 characters"))]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDraft {
    pub job_id: JobId,
    #[validate(length(min = 1, message = "application content is required"))]
    pub resume_text: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StatusUpdate {
    pub status: ApplicationDecision,
}

/// Empty strings are how clients clear a field, so only non-blank addresses are checked.
impl Validate for ProfileFields {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(email) = self.contact_email.as_ref() {
            if !email.trim().is_empty() && !email.validate_email() {
                let mut error = ValidationError::new("email");
                error.message = Some(Cow::Borrowed(
                    "contact_email must be a valid e-mail address",
                ));
                errors.add("contact_email", error);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Whose profile to read: the caller (`me`) or an explicit account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileTarget {
    Me,
    Account(AccountId),
}

impl ProfileTarget {
    fn resolve(self, caller: &Caller) -> AccountId {
        match self {
            ProfileTarget::Me => caller.account_id,
            ProfileTarget::Account(id) => id,
        }
    }
}

impl FromStr for ProfileTarget {
    type Err = MarketplaceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value == "me" {
            return Ok(ProfileTarget::Me);
        }
        value
            .parse::<u64>()
            .map(|id| ProfileTarget::Account(AccountId(id)))
            .map_err(|_| {
                MarketplaceError::Validation(format!("'{value}' is neither 'me' nor an account id"))
            })
    }
}

/// Signed assertion handed back by register and login.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub auth: bool,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: AccountSummary,
}

/// Outcome of a status transition.
#[derive(Debug, Clone, Serialize)]
pub struct StatusChange {
    pub success: bool,
    pub application_id: ApplicationId,
    pub status: ApplicationStatus,
}

/// Marketplace facade: every protected operation takes a verified [`Caller`] and is
/// authorized before any storage mutation happens.
pub struct MarketplaceService<R> {
    store: Arc<R>,
    hasher: PasswordHasher,
    assertions: AssertionIssuer,
}

impl<R> MarketplaceService<R>
where
    R: MarketplaceStore + 'static,
{
    pub fn new(store: Arc<R>, config: &AuthConfig) -> Self {
        Self::with_parts(
            store,
            PasswordHasher::new(config.bcrypt_cost),
            AssertionIssuer::from_config(config),
        )
    }

    pub fn with_parts(store: Arc<R>, hasher: PasswordHasher, assertions: AssertionIssuer) -> Self {
        Self {
            store,
            hasher,
            assertions,
        }
    }

    pub fn register(&self, registration: Registration) -> Result<AuthSession, MarketplaceError> {
        registration.validate()?;

        let password_hash = self.hasher.hash(&registration.password)?;
        let account = self
            .store
            .insert_account(NewAccount {
                username: registration.username,
                password_hash,
                role: registration.role,
            })
            .map_err(|err| match err {
                RepositoryError::Conflict => {
                    warn!("registration rejected: username already taken");
                    MarketplaceError::Conflict("username already taken".to_string())
                }
                other => storage_failure(other),
            })?;

        info!(account_id = %account.id, role = %account.role, "account registered");
        self.session_for(account.summary())
    }

    pub fn authenticate(&self, login: LoginRequest) -> Result<AuthSession, MarketplaceError> {
        login.validate()?;

        let account = self
            .store
            .account_by_username(&login.username)
            .map_err(storage_failure)?
            .ok_or_else(|| MarketplaceError::NotFound("user not found".to_string()))?;

        if !self.hasher.verify(&login.password, &account.password_hash)? {
            warn!(account_id = %account.id, "login rejected: password mismatch");
            return Err(MarketplaceError::InvalidCredential);
        }

        info!(account_id = %account.id, "account authenticated");
        self.session_for(account.summary())
    }

    /// Check a presented assertion. Runs on every protected request; nothing is cached.
    pub fn verify(&self, token: &str) -> Result<Caller, MarketplaceError> {
        self.assertions.verify(token).map_err(|rejection| {
            warn!(%rejection, "assertion rejected");
            match rejection {
                AssertionRejection::Expired => {
                    MarketplaceError::Unauthorized("token expired".to_string())
                }
                AssertionRejection::Invalid(_) => {
                    MarketplaceError::Unauthorized("invalid token".to_string())
                }
            }
        })
    }

    pub fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<JobListing>, MarketplaceError> {
        let jobs = self.store.jobs().map_err(storage_failure)?;
        let accounts = self.store.accounts().map_err(storage_failure)?;
        Ok(report::job_listings(&jobs, &accounts, filter))
    }

    pub fn create_job(
        &self,
        caller: &Caller,
        draft: JobDraft,
    ) -> Result<JobPosting, MarketplaceError> {
        guard(caller, Operation::CreateJob)?;
        draft.validate()?;

        let job = self
            .store
            .insert_job(NewJobPosting {
                employer_id: caller.account_id,
                title: draft.title,
                description: draft.description,
            })
            .map_err(storage_failure)?;

        info!(job_id = %job.id, employer_id = %caller.account_id, "job posted");
        Ok(job)
    }

    pub fn list_job_applications(
        &self,
        caller: &Caller,
        job_id: JobId,
    ) -> Result<Vec<JobApplicationEntry>, MarketplaceError> {
        let job = self.require_job(job_id)?;
        guard(
            caller,
            Operation::ViewJobApplications {
                owner: job.employer_id,
            },
        )?;

        let applications = self.store.applications().map_err(storage_failure)?;
        let accounts = self.store.accounts().map_err(storage_failure)?;
        Ok(report::job_applications(job.id, &applications, &accounts))
    }

    pub fn submit_application(
        &self,
        caller: &Caller,
        draft: ApplicationDraft,
    ) -> Result<Application, MarketplaceError> {
        guard(caller, Operation::SubmitApplication)?;
        draft.validate()?;
        let job = self.require_job(draft.job_id)?;

        let application = self
            .store
            .insert_application(NewApplication {
                job_id: job.id,
                seeker_id: caller.account_id,
                resume_text: draft.resume_text,
            })
            .map_err(storage_failure)?;

        info!(
            application_id = %application.id,
            job_id = %job.id,
            seeker_id = %caller.account_id,
            "application submitted"
        );
        Ok(application)
    }

    pub fn list_my_applications(
        &self,
        caller: &Caller,
    ) -> Result<Vec<SeekerApplicationEntry>, MarketplaceError> {
        guard(caller, Operation::ListOwnApplications)?;

        let applications = self.store.applications().map_err(storage_failure)?;
        let jobs = self.store.jobs().map_err(storage_failure)?;
        Ok(report::seeker_applications(
            caller.account_id,
            &applications,
            &jobs,
        ))
    }

    /// Record the employer's decision on a pending application.
    ///
    /// Ownership is resolved through the parent posting. Decided applications are terminal
    /// and a second decision fails with [`MarketplaceError::Conflict`].
    pub fn set_application_status(
        &self,
        caller: &Caller,
        application_id: ApplicationId,
        update: StatusUpdate,
    ) -> Result<StatusChange, MarketplaceError> {
        let not_found = || MarketplaceError::NotFound("application not found".to_string());

        let application = self
            .store
            .application(application_id)
            .map_err(storage_failure)?
            .ok_or_else(not_found)?;
        let job = self
            .store
            .job(application.job_id)
            .map_err(storage_failure)?
            .ok_or_else(not_found)?;

        guard(
            caller,
            Operation::DecideApplication {
                job_owner: job.employer_id,
            },
        )?;

        let target = application
            .status
            .decide(update.status)
            .ok_or_else(already_decided)?;

        let stored = self
            .store
            .decide_application(application.id, target)
            .map_err(|err| match err {
                RepositoryError::Conflict => already_decided(),
                RepositoryError::NotFound => not_found(),
                other => storage_failure(other),
            })?;

        info!(
            application_id = %stored.id,
            status = %stored.status,
            employer_id = %caller.account_id,
            "application decided"
        );
        Ok(StatusChange {
            success: true,
            application_id: stored.id,
            status: stored.status,
        })
    }

    pub fn get_profile(
        &self,
        caller: &Caller,
        target: ProfileTarget,
    ) -> Result<Option<Profile>, MarketplaceError> {
        let subject = target.resolve(caller);
        guard(caller, Operation::ReadProfile { subject })?;
        self.store.profile(subject).map_err(storage_failure)
    }

    pub fn upsert_profile(
        &self,
        caller: &Caller,
        fields: ProfileFields,
    ) -> Result<Profile, MarketplaceError> {
        guard(
            caller,
            Operation::WriteProfile {
                subject: caller.account_id,
            },
        )?;
        fields.validate()?;

        let profile = self
            .store
            .upsert_profile(caller.account_id, fields)
            .map_err(storage_failure)?;

        info!(account_id = %caller.account_id, "profile saved");
        Ok(profile)
    }

    pub fn employer_report(
        &self,
        caller: &Caller,
    ) -> Result<Vec<EmployerReportRow>, MarketplaceError> {
        guard(caller, Operation::EmployerReport)?;

        let jobs = self.store.jobs().map_err(storage_failure)?;
        let applications = self.store.applications().map_err(storage_failure)?;
        let accounts = self.store.accounts().map_err(storage_failure)?;
        let profiles = self.store.profiles().map_err(storage_failure)?;
        Ok(report::employer_report(
            caller.account_id,
            &jobs,
            &applications,
            &accounts,
            &profiles,
        ))
    }

    pub fn admin_activity(
        &self,
        caller: &Caller,
    ) -> Result<Vec<AdminActivityRow>, MarketplaceError> {
        guard(caller, Operation::AdminActivity)?;

        let applications = self.store.applications().map_err(storage_failure)?;
        let jobs = self.store.jobs().map_err(storage_failure)?;
        let accounts = self.store.accounts().map_err(storage_failure)?;
        Ok(report::admin_activity(&applications, &jobs, &accounts))
    }

    fn require_job(&self, job_id: JobId) -> Result<JobPosting, MarketplaceError> {
        self.store
            .job(job_id)
            .map_err(storage_failure)?
            .ok_or_else(|| MarketplaceError::NotFound("job not found".to_string()))
    }

    fn session_for(&self, user: AccountSummary) -> Result<AuthSession, MarketplaceError> {
        let issued = self.assertions.issue(Caller::new(user.id, user.role))?;
        Ok(AuthSession {
            auth: true,
            token: issued.token,
            expires_at: issued.expires_at,
            user,
        })
    }
}

fn guard(caller: &Caller, operation: Operation) -> Result<(), MarketplaceError> {
    match authorize(caller, &operation) {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => {
            warn!(
                account_id = %caller.account_id,
                role = %caller.role,
                operation = operation.label(),
                %reason,
                "operation denied"
            );
            Err(MarketplaceError::Forbidden(reason.to_string()))
        }
    }
}

fn already_decided() -> MarketplaceError {
    MarketplaceError::Conflict("application already decided".to_string())
}

fn storage_failure(err: RepositoryError) -> MarketplaceError {
    error!(error = %err, "storage operation failed");
    MarketplaceError::Repository(err)
}

/// Error raised by the marketplace service.
#[derive(Debug, thiserror::Error)]
pub enum MarketplaceError {
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
    #[error("invalid credentials")]
    InvalidCredential,
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Repository(RepositoryError),
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error("{0}")]
    Internal(String),
}

impl From<ValidationErrors> for MarketplaceError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| {
                    error
                        .message
                        .as_ref()
                        .map(|message| message.to_string())
                        .unwrap_or_else(|| format!("invalid value for {field}"))
                })
            })
            .collect();
        messages.sort();
        MarketplaceError::Validation(messages.join("; "))
    }
}
