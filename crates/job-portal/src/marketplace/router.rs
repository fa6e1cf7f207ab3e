use std::sync::Arc;

use axum::{
    async_trait,
    extract::{
        rejection::QueryRejection, FromRequest, FromRequestParts, Path, Query, Request, State,
    },
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use super::domain::{ApplicationId, JobId, ProfileFields};
use super::identity::Caller;
use super::report::{write_csv, CsvRow, JobFilter};
use super::repository::MarketplaceStore;
use super::service::{
    ApplicationDraft, JobDraft, LoginRequest, MarketplaceError, MarketplaceService,
    ProfileTarget, Registration, StatusUpdate,
};

type ServiceState<R> = State<Arc<MarketplaceService<R>>>;

/// Router exposing the marketplace operations under `/api`.
pub fn marketplace_router<R>(service: Arc<MarketplaceService<R>>) -> Router
where
    R: MarketplaceStore + 'static,
{
    Router::new()
        .route("/api/auth/register", post(register_handler::<R>))
        .route("/api/auth/login", post(login_handler::<R>))
        .route(
            "/api/jobs",
            get(list_jobs_handler::<R>).post(create_job_handler::<R>),
        )
        .route(
            "/api/jobs/:job_id/applications",
            get(job_applications_handler::<R>),
        )
        .route("/api/applications", post(submit_application_handler::<R>))
        .route("/api/my-applications", get(my_applications_handler::<R>))
        .route(
            "/api/applications/:application_id/status",
            put(decide_application_handler::<R>),
        )
        .route("/api/profile", post(save_profile_handler::<R>))
        .route("/api/profile/:user_id", get(profile_handler::<R>))
        .route("/api/employer/reports", get(employer_report_handler::<R>))
        .route("/api/admin/activity", get(admin_activity_handler::<R>))
        .with_state(service)
}

impl IntoResponse for MarketplaceError {
    fn into_response(self) -> Response {
        let status = match &self {
            MarketplaceError::Conflict(_) => StatusCode::CONFLICT,
            MarketplaceError::NotFound(_) => StatusCode::NOT_FOUND,
            MarketplaceError::InvalidCredential | MarketplaceError::Unauthorized(_) => {
                StatusCode::UNAUTHORIZED
            }
            MarketplaceError::Forbidden(_) => StatusCode::FORBIDDEN,
            MarketplaceError::Validation(_) => StatusCode::BAD_REQUEST,
            MarketplaceError::Repository(_)
            | MarketplaceError::Credential(_)
            | MarketplaceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

/// JSON body decoded into `T`. Field rules are checked by the service once the caller is
/// authorized, so a forbidden caller never learns about validation failures.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = MarketplaceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| MarketplaceError::Validation(rejection.body_text()))?;
        Ok(JsonBody(value))
    }
}

#[async_trait]
impl<R> FromRequestParts<Arc<MarketplaceService<R>>> for Caller
where
    R: MarketplaceStore + 'static,
{
    type Rejection = MarketplaceError;

    async fn from_request_parts(
        parts: &mut Parts,
        service: &Arc<MarketplaceService<R>>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| MarketplaceError::Unauthorized("missing bearer token".to_string()))?;

        service.verify(token)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Json,
    Csv,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    #[serde(default)]
    pub format: ReportFormat,
}

fn parse_id(raw: &str, what: &str) -> Result<u64, MarketplaceError> {
    raw.parse::<u64>()
        .map_err(|_| MarketplaceError::Validation(format!("'{raw}' is not a valid {what}")))
}

fn query_or_reject<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, MarketplaceError> {
    query
        .map(|Query(value)| value)
        .map_err(|rejection| MarketplaceError::Validation(rejection.body_text()))
}

fn respond<T: Serialize>(status: StatusCode, result: Result<T, MarketplaceError>) -> Response {
    match result {
        Ok(value) => (status, Json(value)).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Runs bcrypt-bound work off the async worker threads.
async fn run_blocking<T, F>(task: F) -> Result<T, MarketplaceError>
where
    F: FnOnce() -> Result<T, MarketplaceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task).await.unwrap_or_else(|err| {
        error!(error = %err, "credential task did not complete");
        Err(MarketplaceError::Internal(
            "credential processing failed".to_string(),
        ))
    })
}

fn report_response<T: CsvRow>(
    rows: Result<Vec<T>, MarketplaceError>,
    format: ReportFormat,
    filename: &str,
) -> Response {
    let rows = match rows {
        Ok(rows) => rows,
        Err(err) => return err.into_response(),
    };

    match format {
        ReportFormat::Json => (StatusCode::OK, Json(rows)).into_response(),
        ReportFormat::Csv => {
            let mut buffer = Vec::new();
            if let Err(err) = write_csv(&rows, &mut buffer) {
                error!(error = %err, "csv export failed");
                let payload = json!({ "error": "report export failed" });
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response();
            }
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{filename}\""),
                    ),
                ],
                buffer,
            )
                .into_response()
        }
    }
}

pub(crate) async fn register_handler<R>(
    State(service): ServiceState<R>,
    JsonBody(registration): JsonBody<Registration>,
) -> Response
where
    R: MarketplaceStore + 'static,
{
    let result = run_blocking(move || service.register(registration)).await;
    respond(StatusCode::CREATED, result)
}

pub(crate) async fn login_handler<R>(
    State(service): ServiceState<R>,
    JsonBody(login): JsonBody<LoginRequest>,
) -> Response
where
    R: MarketplaceStore + 'static,
{
    let result = run_blocking(move || service.authenticate(login)).await;
    respond(StatusCode::OK, result)
}

pub(crate) async fn list_jobs_handler<R>(
    State(service): ServiceState<R>,
    query: Result<Query<JobFilter>, QueryRejection>,
) -> Response
where
    R: MarketplaceStore + 'static,
{
    let result = query_or_reject(query).and_then(|filter| service.list_jobs(&filter));
    respond(StatusCode::OK, result)
}

pub(crate) async fn create_job_handler<R>(
    State(service): ServiceState<R>,
    caller: Caller,
    JsonBody(draft): JsonBody<JobDraft>,
) -> Response
where
    R: MarketplaceStore + 'static,
{
    respond(StatusCode::CREATED, service.create_job(&caller, draft))
}

pub(crate) async fn job_applications_handler<R>(
    State(service): ServiceState<R>,
    caller: Caller,
    Path(job_id): Path<String>,
) -> Response
where
    R: MarketplaceStore + 'static,
{
    let result = parse_id(&job_id, "job id")
        .and_then(|id| service.list_job_applications(&caller, JobId(id)));
    respond(StatusCode::OK, result)
}

pub(crate) async fn submit_application_handler<R>(
    State(service): ServiceState<R>,
    caller: Caller,
    JsonBody(draft): JsonBody<ApplicationDraft>,
) -> Response
where
    R: MarketplaceStore + 'static,
{
    respond(
        StatusCode::CREATED,
        service.submit_application(&caller, draft),
    )
}

pub(crate) async fn my_applications_handler<R>(
    State(service): ServiceState<R>,
    caller: Caller,
) -> Response
where
    R: MarketplaceStore + 'static,
{
    respond(StatusCode::OK, service.list_my_applications(&caller))
}

pub(crate) async fn decide_application_handler<R>(
    State(service): ServiceState<R>,
    caller: Caller,
    Path(application_id): Path<String>,
    JsonBody(update): JsonBody<StatusUpdate>,
) -> Response
where
    R: MarketplaceStore + 'static,
{
    let result = parse_id(&application_id, "application id").and_then(|id| {
        service.set_application_status(&caller, ApplicationId(id), update)
    });
    respond(StatusCode::OK, result)
}

pub(crate) async fn profile_handler<R>(
    State(service): ServiceState<R>,
    caller: Caller,
    Path(user_id): Path<String>,
) -> Response
where
    R: MarketplaceStore + 'static,
{
    let result = user_id
        .parse::<ProfileTarget>()
        .and_then(|target| service.get_profile(&caller, target));

    match result {
        Ok(Some(profile)) => (StatusCode::OK, Json(json!(profile))).into_response(),
        // A missing profile reads as an empty object rather than an error.
        Ok(None) => (StatusCode::OK, Json(json!({}))).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn save_profile_handler<R>(
    State(service): ServiceState<R>,
    caller: Caller,
    JsonBody(fields): JsonBody<ProfileFields>,
) -> Response
where
    R: MarketplaceStore + 'static,
{
    match service.upsert_profile(&caller, fields) {
        Ok(profile) => {
            let payload = json!({ "success": true, "profile": profile });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn employer_report_handler<R>(
    State(service): ServiceState<R>,
    caller: Caller,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Response
where
    R: MarketplaceStore + 'static,
{
    match query_or_reject(query) {
        Ok(query) => report_response(
            service.employer_report(&caller),
            query.format,
            "employer-report.csv",
        ),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn admin_activity_handler<R>(
    State(service): ServiceState<R>,
    caller: Caller,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Response
where
    R: MarketplaceStore + 'static,
{
    match query_or_reject(query) {
        Ok(query) => report_response(
            service.admin_activity(&caller),
            query.format,
            "admin-activity.csv",
        ),
        Err(err) => err.into_response(),
    }
}
