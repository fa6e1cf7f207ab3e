use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use chrono::Duration;
use serde_json::Value;

use crate::marketplace::domain::{
    Account, AccountId, Application, ApplicationId, ApplicationStatus, JobId, JobPosting, Profile,
    ProfileFields, Role,
};
use crate::marketplace::identity::{AssertionIssuer, Caller, PasswordHasher};
use crate::marketplace::memory::InMemoryMarketplaceStore;
use crate::marketplace::repository::{
    MarketplaceStore, NewAccount, NewApplication, NewJobPosting, RepositoryError,
};
use crate::marketplace::service::{
    ApplicationDraft, JobDraft, MarketplaceService, Registration,
};
use crate::marketplace::marketplace_router;

pub(super) const TEST_SECRET: &str = "marketplace-test-secret";

pub(super) fn service_with<R>(store: Arc<R>) -> MarketplaceService<R>
where
    R: MarketplaceStore + 'static,
{
    MarketplaceService::with_parts(
        store,
        PasswordHasher::new(4),
        AssertionIssuer::new(TEST_SECRET, Duration::hours(24)),
    )
}

pub(super) fn build_service() -> (
    MarketplaceService<InMemoryMarketplaceStore>,
    Arc<InMemoryMarketplaceStore>,
) {
    let store = Arc::new(InMemoryMarketplaceStore::new());
    (service_with(store.clone()), store)
}

pub(super) fn registration(username: &str, role: Role) -> Registration {
    Registration {
        username: username.to_string(),
        password: "password123".to_string(),
        role,
    }
}

/// Register an account and return the caller its assertion verifies to, plus the token.
pub(super) fn enroll<R>(
    service: &MarketplaceService<R>,
    username: &str,
    role: Role,
) -> (Caller, String)
where
    R: MarketplaceStore + 'static,
{
    let session = service
        .register(registration(username, role))
        .expect("registration succeeds");
    let caller = service.verify(&session.token).expect("token verifies");
    (caller, session.token)
}

pub(super) fn post_job<R>(service: &MarketplaceService<R>, employer: &Caller, title: &str) -> JobId
where
    R: MarketplaceStore + 'static,
{
    service
        .create_job(
            employer,
            JobDraft {
                title: title.to_string(),
                description: format!("{title} role"),
            },
        )
        .expect("job created")
        .id
}

pub(super) fn apply<R>(service: &MarketplaceService<R>, seeker: &Caller, job_id: JobId) -> ApplicationId
where
    R: MarketplaceStore + 'static,
{
    service
        .submit_application(
            seeker,
            ApplicationDraft {
                job_id,
                resume_text: "I know Rust".to_string(),
            },
        )
        .expect("application submitted")
        .id
}

pub(super) fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(serde_json::to_vec(&body).expect("serialize body")))
        .expect("request builds")
}

pub(super) fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("request builds")
}

pub(super) async fn read_body(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body")
        .to_vec()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    serde_json::from_slice(&read_body(response).await).expect("json payload")
}

pub(super) fn router_with_service(
    service: MarketplaceService<InMemoryMarketplaceStore>,
) -> axum::Router {
    marketplace_router(Arc::new(service))
}

/// Store double whose backing engine is offline for every statement.
pub(super) struct UnavailableStore;

fn offline<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

impl MarketplaceStore for UnavailableStore {
    fn insert_account(&self, _account: NewAccount) -> Result<Account, RepositoryError> {
        offline()
    }

    fn account(&self, _id: AccountId) -> Result<Option<Account>, RepositoryError> {
        offline()
    }

    fn account_by_username(&self, _username: &str) -> Result<Option<Account>, RepositoryError> {
        offline()
    }

    fn accounts(&self) -> Result<Vec<Account>, RepositoryError> {
        offline()
    }

    fn insert_job(&self, _job: NewJobPosting) -> Result<JobPosting, RepositoryError> {
        offline()
    }

    fn job(&self, _id: JobId) -> Result<Option<JobPosting>, RepositoryError> {
        offline()
    }

    fn jobs(&self) -> Result<Vec<JobPosting>, RepositoryError> {
        offline()
    }

    fn insert_application(
        &self,
        _application: NewApplication,
    ) -> Result<Application, RepositoryError> {
        offline()
    }

    fn application(&self, _id: ApplicationId) -> Result<Option<Application>, RepositoryError> {
        offline()
    }

    fn applications(&self) -> Result<Vec<Application>, RepositoryError> {
        offline()
    }

    fn decide_application(
        &self,
        _id: ApplicationId,
        _status: ApplicationStatus,
    ) -> Result<Application, RepositoryError> {
        offline()
    }

    fn upsert_profile(
        &self,
        _user_id: AccountId,
        _fields: ProfileFields,
    ) -> Result<Profile, RepositoryError> {
        offline()
    }

    fn profile(&self, _user_id: AccountId) -> Result<Option<Profile>, RepositoryError> {
        offline()
    }

    fn profiles(&self) -> Result<Vec<Profile>, RepositoryError> {
        offline()
    }
}
