use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;

use super::domain::{
    Account, AccountId, Application, ApplicationId, ApplicationStatus, JobId, JobPosting,
    JobStatus, Profile, ProfileFields,
};
use super::repository::{
    MarketplaceStore, NewAccount, NewApplication, NewJobPosting, RepositoryError,
};

#[derive(Default)]
struct Tables {
    accounts: BTreeMap<AccountId, Account>,
    jobs: BTreeMap<JobId, JobPosting>,
    applications: BTreeMap<ApplicationId, Application>,
    profiles: BTreeMap<AccountId, Profile>,
    next_account: u64,
    next_job: u64,
    next_application: u64,
    next_profile: u64,
}

fn next(counter: &mut u64) -> u64 {
    *counter += 1;
    *counter
}

/// Mutex-guarded tables with autoincrement ids, one lock acquisition per operation.
#[derive(Default, Clone)]
pub struct InMemoryMarketplaceStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryMarketplaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }
}

impl MarketplaceStore for InMemoryMarketplaceStore {
    fn insert_account(&self, account: NewAccount) -> Result<Account, RepositoryError> {
        let mut tables = self.lock()?;
        if tables
            .accounts
            .values()
            .any(|existing| existing.username == account.username)
        {
            return Err(RepositoryError::Conflict);
        }

        let record = Account {
            id: AccountId(next(&mut tables.next_account)),
            username: account.username,
            password_hash: account.password_hash,
            role: account.role,
        };
        tables.accounts.insert(record.id, record.clone());
        Ok(record)
    }

    fn account(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
        Ok(self.lock()?.accounts.get(&id).cloned())
    }

    fn account_by_username(&self, username: &str) -> Result<Option<Account>, RepositoryError> {
        Ok(self
            .lock()?
            .accounts
            .values()
            .find(|account| account.username == username)
            .cloned())
    }

    fn accounts(&self) -> Result<Vec<Account>, RepositoryError> {
        Ok(self.lock()?.accounts.values().cloned().collect())
    }

    fn insert_job(&self, job: NewJobPosting) -> Result<JobPosting, RepositoryError> {
        let mut tables = self.lock()?;
        let record = JobPosting {
            id: JobId(next(&mut tables.next_job)),
            employer_id: job.employer_id,
            title: job.title,
            description: job.description,
            status: JobStatus::Open,
            created_at: Utc::now(),
        };
        tables.jobs.insert(record.id, record.clone());
        Ok(record)
    }

    fn job(&self, id: JobId) -> Result<Option<JobPosting>, RepositoryError> {
        Ok(self.lock()?.jobs.get(&id).cloned())
    }

    fn jobs(&self) -> Result<Vec<JobPosting>, RepositoryError> {
        Ok(self.lock()?.jobs.values().cloned().collect())
    }

    fn insert_application(
        &self,
        application: NewApplication,
    ) -> Result<Application, RepositoryError> {
        let mut tables = self.lock()?;
        let record = Application {
            id: ApplicationId(next(&mut tables.next_application)),
            job_id: application.job_id,
            seeker_id: application.seeker_id,
            resume_text: application.resume_text,
            status: ApplicationStatus::Pending,
            created_at: Utc::now(),
        };
        tables.applications.insert(record.id, record.clone());
        Ok(record)
    }

    fn application(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Ok(self.lock()?.applications.get(&id).cloned())
    }

    fn applications(&self) -> Result<Vec<Application>, RepositoryError> {
        Ok(self.lock()?.applications.values().cloned().collect())
    }

    fn decide_application(
        &self,
        id: ApplicationId,
        status: ApplicationStatus,
    ) -> Result<Application, RepositoryError> {
        let mut tables = self.lock()?;
        let record = tables
            .applications
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        if record.status != ApplicationStatus::Pending {
            return Err(RepositoryError::Conflict);
        }
        record.status = status;
        Ok(record.clone())
    }

    fn upsert_profile(
        &self,
        user_id: AccountId,
        fields: ProfileFields,
    ) -> Result<Profile, RepositoryError> {
        let mut tables = self.lock()?;
        let existing = tables.profiles.get(&user_id).map(|profile| profile.id);
        let id = match existing {
            Some(id) => id,
            None => next(&mut tables.next_profile),
        };
        let record = Profile {
            id,
            user_id,
            fields,
        };
        tables.profiles.insert(user_id, record.clone());
        Ok(record)
    }

    fn profile(&self, user_id: AccountId) -> Result<Option<Profile>, RepositoryError> {
        Ok(self.lock()?.profiles.get(&user_id).cloned())
    }

    fn profiles(&self) -> Result<Vec<Profile>, RepositoryError> {
        Ok(self.lock()?.profiles.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marketplace::domain::Role;

    fn account(username: &str) -> NewAccount {
        NewAccount {
            username: username.to_string(),
            password_hash: "$2b$04$hash".to_string(),
            role: Role::Jobseeker,
        }
    }

    #[test]
    fn usernames_are_unique() {
        let store = InMemoryMarketplaceStore::new();
        let first = store.insert_account(account("sk1")).expect("first insert");
        assert_eq!(first.id, AccountId(1));
        assert!(matches!(
            store.insert_account(account("sk1")),
            Err(RepositoryError::Conflict)
        ));
        assert_eq!(store.accounts().expect("scan").len(), 1);
    }

    #[test]
    fn decide_only_moves_pending_applications() {
        let store = InMemoryMarketplaceStore::new();
        let application = store
            .insert_application(NewApplication {
                job_id: JobId(1),
                seeker_id: AccountId(2),
                resume_text: "resume".to_string(),
            })
            .expect("insert");

        let decided = store
            .decide_application(application.id, ApplicationStatus::Rejected)
            .expect("first decision");
        assert_eq!(decided.status, ApplicationStatus::Rejected);

        assert!(matches!(
            store.decide_application(application.id, ApplicationStatus::Accepted),
            Err(RepositoryError::Conflict)
        ));
        assert!(matches!(
            store.decide_application(ApplicationId(99), ApplicationStatus::Accepted),
            Err(RepositoryError::NotFound)
        ));
        let stored = store
            .application(application.id)
            .expect("fetch")
            .expect("present");
        assert_eq!(stored.status, ApplicationStatus::Rejected);
    }

    #[test]
    fn upsert_keeps_one_profile_per_account() {
        let store = InMemoryMarketplaceStore::new();
        let first = store
            .upsert_profile(
                AccountId(7),
                ProfileFields {
                    full_name: Some("Sam Seeker".to_string()),
                    ..ProfileFields::default()
                },
            )
            .expect("create");
        let second = store
            .upsert_profile(
                AccountId(7),
                ProfileFields {
                    skills: Some("rust, sql".to_string()),
                    ..ProfileFields::default()
                },
            )
            .expect("update");

        assert_eq!(first.id, second.id);
        assert_eq!(store.profiles().expect("scan").len(), 1);
        assert_eq!(second.fields.full_name, None);
        assert_eq!(second.fields.skills.as_deref(), Some("rust, sql"));
    }
}
