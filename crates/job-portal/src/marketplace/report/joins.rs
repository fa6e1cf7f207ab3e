use std::cmp::Reverse;
use std::collections::HashMap;

use serde::Deserialize;

use super::super::domain::{
    Account, AccountId, Application, JobId, JobPosting, Profile, ProfileFields,
};
use super::views::{
    AdminActivityRow, EmployerReportRow, JobApplicationEntry, JobListing, SeekerApplicationEntry,
};

/// Optional narrowing applied to the public job listing after the full scan.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobFilter {
    /// Case-insensitive substring matched against title or description.
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub employer_id: Option<AccountId>,
}

impl JobFilter {
    fn matches(&self, job: &JobPosting) -> bool {
        if let Some(employer) = self.employer_id {
            if job.employer_id != employer {
                return false;
            }
        }

        match self.q.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                job.title.to_lowercase().contains(&needle)
                    || job.description.to_lowercase().contains(&needle)
            }
            _ => true,
        }
    }
}

fn index_accounts(accounts: &[Account]) -> HashMap<AccountId, &Account> {
    accounts.iter().map(|account| (account.id, account)).collect()
}

fn index_jobs(jobs: &[JobPosting]) -> HashMap<JobId, &JobPosting> {
    jobs.iter().map(|job| (job.id, job)).collect()
}

pub fn job_listings(jobs: &[JobPosting], accounts: &[Account], filter: &JobFilter) -> Vec<JobListing> {
    let accounts = index_accounts(accounts);
    let mut listings: Vec<JobListing> = jobs
        .iter()
        .filter(|job| filter.matches(job))
        .filter_map(|job| {
            accounts.get(&job.employer_id).map(|employer| JobListing {
                job: job.clone(),
                employer_name: employer.username.clone(),
            })
        })
        .collect();
    listings.sort_by_key(|listing| listing.job.id);
    listings
}

pub fn job_applications(
    job_id: JobId,
    applications: &[Application],
    accounts: &[Account],
) -> Vec<JobApplicationEntry> {
    let accounts = index_accounts(accounts);
    let mut entries: Vec<JobApplicationEntry> = applications
        .iter()
        .filter(|application| application.job_id == job_id)
        .filter_map(|application| {
            accounts
                .get(&application.seeker_id)
                .map(|seeker| JobApplicationEntry {
                    application: application.clone(),
                    seeker_name: seeker.username.clone(),
                })
        })
        .collect();
    entries.sort_by_key(|entry| entry.application.id);
    entries
}

pub fn seeker_applications(
    seeker_id: AccountId,
    applications: &[Application],
    jobs: &[JobPosting],
) -> Vec<SeekerApplicationEntry> {
    let jobs = index_jobs(jobs);
    let mut entries: Vec<SeekerApplicationEntry> = applications
        .iter()
        .filter(|application| application.seeker_id == seeker_id)
        .filter_map(|application| {
            jobs.get(&application.job_id).map(|job| SeekerApplicationEntry {
                application: application.clone(),
                job_title: job.title.clone(),
                job_status: job.status,
            })
        })
        .collect();
    entries.sort_by_key(|entry| entry.application.id);
    entries
}

/// Applications to `employer_id`'s postings, ordered by job title then newest first.
pub fn employer_report(
    employer_id: AccountId,
    jobs: &[JobPosting],
    applications: &[Application],
    accounts: &[Account],
    profiles: &[Profile],
) -> Vec<EmployerReportRow> {
    let owned: HashMap<JobId, &JobPosting> = jobs
        .iter()
        .filter(|job| job.employer_id == employer_id)
        .map(|job| (job.id, job))
        .collect();
    let accounts = index_accounts(accounts);
    let profiles: HashMap<AccountId, &ProfileFields> = profiles
        .iter()
        .map(|profile| (profile.user_id, &profile.fields))
        .collect();

    let mut rows: Vec<EmployerReportRow> = applications
        .iter()
        .filter_map(|application| {
            let job = owned.get(&application.job_id)?;
            let seeker = accounts.get(&application.seeker_id)?;
            let profile = profiles.get(&seeker.id);

            Some(EmployerReportRow {
                application_id: application.id,
                job_title: job.title.clone(),
                applicant_id: seeker.id,
                applicant_username: seeker.username.clone(),
                full_name: profile.and_then(|fields| fields.full_name.clone()),
                skills: profile.and_then(|fields| fields.skills.clone()),
                contact_email: profile.and_then(|fields| fields.contact_email.clone()),
                application_status: application.status,
                applied_at: application.created_at,
            })
        })
        .collect();

    rows.sort_by(|left, right| {
        left.job_title
            .cmp(&right.job_title)
            .then_with(|| right.applied_at.cmp(&left.applied_at))
            .then_with(|| right.application_id.cmp(&left.application_id))
    });
    rows
}

/// Every application with both parties' usernames, newest first.
pub fn admin_activity(
    applications: &[Application],
    jobs: &[JobPosting],
    accounts: &[Account],
) -> Vec<AdminActivityRow> {
    let jobs = index_jobs(jobs);
    let accounts = index_accounts(accounts);

    let mut rows: Vec<AdminActivityRow> = applications
        .iter()
        .filter_map(|application| {
            let seeker = accounts.get(&application.seeker_id)?;
            let job = jobs.get(&application.job_id)?;
            let employer = accounts.get(&job.employer_id)?;

            Some(AdminActivityRow {
                application_id: application.id,
                seeker_name: seeker.username.clone(),
                job_title: job.title.clone(),
                employer_name: employer.username.clone(),
                status: application.status,
                created_at: application.created_at,
            })
        })
        .collect();

    rows.sort_by_key(|row| Reverse((row.created_at, row.application_id)));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marketplace::domain::{
        ApplicationId, ApplicationStatus, JobStatus, Role,
    };
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).single().expect("valid") + Duration::minutes(minutes)
    }

    fn account(id: u64, username: &str, role: Role) -> Account {
        Account {
            id: AccountId(id),
            username: username.to_string(),
            password_hash: String::new(),
            role,
        }
    }

    fn job(id: u64, employer: u64, title: &str) -> JobPosting {
        JobPosting {
            id: JobId(id),
            employer_id: AccountId(employer),
            title: title.to_string(),
            description: format!("{title} description"),
            status: JobStatus::Open,
            created_at: at(0),
        }
    }

    fn application(id: u64, job: u64, seeker: u64, minute: i64) -> Application {
        Application {
            id: ApplicationId(id),
            job_id: JobId(job),
            seeker_id: AccountId(seeker),
            resume_text: "resume".to_string(),
            status: ApplicationStatus::Pending,
            created_at: at(minute),
        }
    }

    fn fixture() -> (Vec<Account>, Vec<JobPosting>, Vec<Application>, Vec<Profile>) {
        let accounts = vec![
            account(1, "emp1", Role::Employer),
            account(2, "emp2", Role::Employer),
            account(3, "sk1", Role::Jobseeker),
            account(4, "sk2", Role::Jobseeker),
        ];
        let jobs = vec![
            job(1, 1, "Frontend Dev"),
            job(2, 1, "Backend Dev"),
            job(3, 2, "Data Engineer"),
        ];
        let applications = vec![
            application(1, 1, 3, 10),
            application(2, 2, 3, 20),
            application(3, 2, 4, 30),
            application(4, 3, 4, 40),
        ];
        let profiles = vec![Profile {
            id: 1,
            user_id: AccountId(3),
            fields: ProfileFields {
                full_name: Some("Sam One".to_string()),
                skills: Some("rust, sql".to_string()),
                contact_email: Some("sam@example.com".to_string()),
                ..ProfileFields::default()
            },
        }];
        (accounts, jobs, applications, profiles)
    }

    #[test]
    fn employer_report_is_scoped_and_ordered() {
        let (accounts, jobs, applications, profiles) = fixture();
        let rows = employer_report(AccountId(1), &jobs, &applications, &accounts, &profiles);

        let order: Vec<(String, u64)> = rows
            .iter()
            .map(|row| (row.job_title.clone(), row.application_id.0))
            .collect();
        assert_eq!(
            order,
            vec![
                ("Backend Dev".to_string(), 3),
                ("Backend Dev".to_string(), 2),
                ("Frontend Dev".to_string(), 1),
            ]
        );
        assert!(rows.iter().all(|row| row.job_title != "Data Engineer"));
    }

    #[test]
    fn employer_report_includes_profile_fields_only_when_present() {
        let (accounts, jobs, applications, profiles) = fixture();
        let rows = employer_report(AccountId(1), &jobs, &applications, &accounts, &profiles);

        let with_profile = rows
            .iter()
            .find(|row| row.applicant_username == "sk1")
            .expect("sk1 row");
        assert_eq!(with_profile.full_name.as_deref(), Some("Sam One"));
        assert_eq!(with_profile.contact_email.as_deref(), Some("sam@example.com"));

        let without_profile = rows
            .iter()
            .find(|row| row.applicant_username == "sk2")
            .expect("sk2 row");
        assert_eq!(without_profile.full_name, None);
        assert_eq!(without_profile.skills, None);
    }

    #[test]
    fn admin_activity_lists_everything_newest_first() {
        let (accounts, jobs, applications, _) = fixture();
        let rows = admin_activity(&applications, &jobs, &accounts);

        let ids: Vec<u64> = rows.iter().map(|row| row.application_id.0).collect();
        assert_eq!(ids, vec![4, 3, 2, 1]);
        assert_eq!(rows[0].employer_name, "emp2");
        assert_eq!(rows[0].seeker_name, "sk2");
    }

    #[test]
    fn admin_activity_breaks_timestamp_ties_by_id() {
        let (accounts, jobs, mut applications, _) = fixture();
        for application in &mut applications {
            application.created_at = at(0);
        }
        let ids: Vec<u64> = admin_activity(&applications, &jobs, &accounts)
            .iter()
            .map(|row| row.application_id.0)
            .collect();
        assert_eq!(ids, vec![4, 3, 2, 1]);
    }

    #[test]
    fn job_listing_filters_by_text_and_employer() {
        let (accounts, jobs, _, _) = fixture();

        let all = job_listings(&jobs, &accounts, &JobFilter::default());
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].employer_name, "emp1");

        let backend = JobFilter {
            q: Some("  BACKEND ".to_string()),
            employer_id: None,
        };
        let titles: Vec<String> = job_listings(&jobs, &accounts, &backend)
            .into_iter()
            .map(|listing| listing.job.title)
            .collect();
        assert_eq!(titles, vec!["Backend Dev".to_string()]);

        let by_employer = JobFilter {
            q: None,
            employer_id: Some(AccountId(2)),
        };
        assert_eq!(job_listings(&jobs, &accounts, &by_employer).len(), 1);
    }

    #[test]
    fn seeker_applications_return_only_the_callers_rows() {
        let (_, jobs, applications, _) = fixture();
        let entries = seeker_applications(AccountId(4), &applications, &jobs);

        let titles: Vec<&str> = entries.iter().map(|entry| entry.job_title.as_str()).collect();
        assert_eq!(titles, vec!["Backend Dev", "Data Engineer"]);
    }

    #[test]
    fn job_applications_carry_seeker_names() {
        let (accounts, _, applications, _) = fixture();
        let entries = job_applications(JobId(2), &applications, &accounts);

        let names: Vec<&str> = entries.iter().map(|entry| entry.seeker_name.as_str()).collect();
        assert_eq!(names, vec!["sk1", "sk2"]);
    }
}
