//! Role and ownership rules deciding whether a caller may perform an operation.
//!
//! The decision is a pure function of the verified caller and the operation, with any
//! ownership facts resolved beforehand by the service. Nothing here touches storage.

use std::fmt;

use super::domain::{AccountId, Role};
use super::identity::Caller;

/// Operation requested by a caller, carrying the ownership facts the rules need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateJob,
    ListJobs,
    /// `owner` is the employer referenced by the posting.
    ViewJobApplications { owner: AccountId },
    SubmitApplication,
    ListOwnApplications,
    /// `job_owner` is resolved through the application's parent posting.
    DecideApplication { job_owner: AccountId },
    ReadProfile { subject: AccountId },
    WriteProfile { subject: AccountId },
    EmployerReport,
    AdminActivity,
}

impl Operation {
    pub const fn label(&self) -> &'static str {
        match self {
            Operation::CreateJob => "create_job",
            Operation::ListJobs => "list_jobs",
            Operation::ViewJobApplications { .. } => "view_job_applications",
            Operation::SubmitApplication => "submit_application",
            Operation::ListOwnApplications => "list_own_applications",
            Operation::DecideApplication { .. } => "decide_application",
            Operation::ReadProfile { .. } => "read_profile",
            Operation::WriteProfile { .. } => "write_profile",
            Operation::EmployerReport => "employer_report",
            Operation::AdminActivity => "admin_activity",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    RoleRequired(Role),
    NotOwner,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::RoleRequired(role) => write!(f, "requires {} role", role),
            DenyReason::NotOwner => f.write_str("caller does not own this resource"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub const fn is_allowed(self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Evaluate the access rules for `operation` on behalf of `caller`.
pub fn authorize(caller: &Caller, operation: &Operation) -> Decision {
    use Decision::{Allow, Deny};

    match (caller.role, *operation) {
        (Role::Employer, Operation::CreateJob) => Allow,
        (_, Operation::CreateJob) => Deny(DenyReason::RoleRequired(Role::Employer)),

        (_, Operation::ListJobs) => Allow,

        (Role::Employer, Operation::ViewJobApplications { owner })
            if owner == caller.account_id =>
        {
            Allow
        }
        (Role::Employer, Operation::ViewJobApplications { .. }) => Deny(DenyReason::NotOwner),
        (_, Operation::ViewJobApplications { .. }) => {
            Deny(DenyReason::RoleRequired(Role::Employer))
        }

        (Role::Jobseeker, Operation::SubmitApplication) => Allow,
        (_, Operation::SubmitApplication) => Deny(DenyReason::RoleRequired(Role::Jobseeker)),

        (_, Operation::ListOwnApplications) => Allow,

        (Role::Employer, Operation::DecideApplication { job_owner })
            if job_owner == caller.account_id =>
        {
            Allow
        }
        (Role::Employer, Operation::DecideApplication { .. }) => Deny(DenyReason::NotOwner),
        (_, Operation::DecideApplication { .. }) => Deny(DenyReason::RoleRequired(Role::Employer)),

        // Any authenticated caller may read any profile.
        (_, Operation::ReadProfile { .. }) => Allow,

        (_, Operation::WriteProfile { subject }) if subject == caller.account_id => Allow,
        (_, Operation::WriteProfile { .. }) => Deny(DenyReason::NotOwner),

        (Role::Employer, Operation::EmployerReport) => Allow,
        (_, Operation::EmployerReport) => Deny(DenyReason::RoleRequired(Role::Employer)),

        (Role::Admin, Operation::AdminActivity) => Allow,
        (_, Operation::AdminActivity) => Deny(DenyReason::RoleRequired(Role::Admin)),
    }
}
