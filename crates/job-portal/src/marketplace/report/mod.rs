//! Read-models joining postings, applications, accounts, and profiles.
//!
//! Every builder is a pure function over full table scans; nothing here mutates state.

mod export;
mod joins;
pub mod views;

pub use export::{write_csv, CsvRow};
pub use joins::{
    admin_activity, employer_report, job_applications, job_listings, seeker_applications,
    JobFilter,
};
pub use views::{
    AdminActivityRow, EmployerReportRow, JobApplicationEntry, JobListing, SeekerApplicationEntry,
};
