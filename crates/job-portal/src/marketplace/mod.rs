//! Job marketplace: accounts, postings, applications, profiles, and their reporting views.
//!
//! Requests flow through [`MarketplaceService`], which verifies the caller's assertion,
//! consults the [`policy`] rules, and only then reaches the [`MarketplaceStore`].

pub mod domain;
pub mod identity;
pub mod memory;
pub mod policy;
pub mod report;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Account, AccountId, AccountSummary, Application, ApplicationDecision, ApplicationId,
    ApplicationStatus, JobId, JobPosting, JobStatus, Profile, ProfileFields, Role,
};
pub use identity::{
    AssertionIssuer, AssertionRejection, Caller, CredentialError, IssuedAssertion, PasswordHasher,
};
pub use memory::InMemoryMarketplaceStore;
pub use policy::{authorize, Decision, DenyReason, Operation};
pub use report::{
    AdminActivityRow, EmployerReportRow, JobApplicationEntry, JobFilter, JobListing,
    SeekerApplicationEntry,
};
pub use repository::{
    MarketplaceStore, NewAccount, NewApplication, NewJobPosting, RepositoryError,
};
pub use router::{marketplace_router, JsonBody, ReportFormat};
pub use service::{
    ApplicationDraft, AuthSession, JobDraft, LoginRequest, MarketplaceError, MarketplaceService,
    ProfileTarget, Registration, StatusChange, StatusUpdate,
};
