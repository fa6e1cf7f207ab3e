use chrono::{DateTime, Utc};
use serde::Serialize;

use super::super::domain::{
    AccountId, Application, ApplicationId, ApplicationStatus, JobPosting, JobStatus,
};

/// Posting joined with its employer's username.
#[derive(Debug, Clone, Serialize)]
pub struct JobListing {
    #[serde(flatten)]
    pub job: JobPosting,
    pub employer_name: String,
}

/// Application to a single posting joined with the applicant's username.
#[derive(Debug, Clone, Serialize)]
pub struct JobApplicationEntry {
    #[serde(flatten)]
    pub application: Application,
    pub seeker_name: String,
}

/// A seeker's own application joined with the posting it targets.
#[derive(Debug, Clone, Serialize)]
pub struct SeekerApplicationEntry {
    #[serde(flatten)]
    pub application: Application,
    pub job_title: String,
    pub job_status: JobStatus,
}

/// Row of the employer report. Profile columns are empty when the seeker has no profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmployerReportRow {
    pub application_id: ApplicationId,
    pub job_title: String,
    pub applicant_id: AccountId,
    pub applicant_username: String,
    pub full_name: Option<String>,
    pub skills: Option<String>,
    pub contact_email: Option<String>,
    pub application_status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
}

/// Row of the global admin activity log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminActivityRow {
    pub application_id: ApplicationId,
    pub seeker_name: String,
    pub job_title: String,
    pub employer_name: String,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
}
