use clap::Args;
use job_portal::config::AuthConfig;
use job_portal::error::AppError;
use job_portal::marketplace::report::write_csv;
use job_portal::marketplace::{
    ApplicationDecision, ApplicationDraft, Caller, InMemoryMarketplaceStore, JobDraft,
    MarketplaceService, ProfileFields, Registration, Role, StatusUpdate,
};
use std::sync::Arc;

const DEMO_SECRET: &str = "job-portal-demo-secret";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Print the employer report and admin activity log as CSV as well
    #[arg(long)]
    pub(crate) csv: bool,
    /// Skip the rejected second decision at the end of the walkthrough
    #[arg(long)]
    pub(crate) skip_conflict: bool,
}

type DemoService = MarketplaceService<InMemoryMarketplaceStore>;

fn enroll(service: &DemoService, username: &str, role: Role) -> Result<Caller, AppError> {
    let session = service.register(Registration {
        username: username.to_string(),
        password: format!("{username}-password"),
        role,
    })?;
    println!(
        "  Registered {} as {} (id {})",
        session.user.username, session.user.role, session.user.id
    );
    Ok(service.verify(&session.token)?)
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let auth = AuthConfig {
        jwt_secret: DEMO_SECRET.to_string(),
        token_ttl_hours: AuthConfig::DEFAULT_TOKEN_TTL_HOURS,
        bcrypt_cost: AuthConfig::DEFAULT_BCRYPT_COST,
    };
    let service = MarketplaceService::new(Arc::new(InMemoryMarketplaceStore::new()), &auth);

    println!("Job portal demo");
    println!("\nAccounts");
    let emp1 = enroll(&service, "emp1", Role::Employer)?;
    let emp2 = enroll(&service, "emp2", Role::Employer)?;
    let sk1 = enroll(&service, "sk1", Role::Jobseeker)?;
    let admin = enroll(&service, "admin", Role::Admin)?;

    service.upsert_profile(
        &sk1,
        ProfileFields {
            full_name: Some("Sam Kim".to_string()),
            skills: Some("rust, sql".to_string()),
            contact_email: Some("sam@example.com".to_string()),
            ..ProfileFields::default()
        },
    )?;

    println!("\nPosting and applying");
    let job = service.create_job(
        &emp1,
        JobDraft {
            title: "Backend Dev".to_string(),
            description: "Build and operate Rust services".to_string(),
        },
    )?;
    println!("  emp1 posted job {} \"{}\"", job.id, job.title);

    let application = service.submit_application(
        &sk1,
        ApplicationDraft {
            job_id: job.id,
            resume_text: "my resume".to_string(),
        },
    )?;
    println!(
        "  sk1 applied to job {} (application {}, {})",
        job.id, application.id, application.status
    );

    for entry in service.list_job_applications(&emp1, job.id)? {
        println!(
            "  emp1 sees application {} from {} [{}]",
            entry.application.id, entry.seeker_name, entry.application.status
        );
    }

    println!("\nDeciding");
    let accept = StatusUpdate {
        status: ApplicationDecision::Accepted,
    };
    match service.set_application_status(&emp2, application.id, accept) {
        Ok(_) => println!("  emp2 unexpectedly decided application {}", application.id),
        Err(err) => println!("  emp2 denied: {err}"),
    }
    let change = service.set_application_status(&emp1, application.id, accept)?;
    println!(
        "  emp1 moved application {} to {}",
        change.application_id, change.status
    );

    if !args.skip_conflict {
        let reject = StatusUpdate {
            status: ApplicationDecision::Rejected,
        };
        match service.set_application_status(&emp1, application.id, reject) {
            Ok(_) => println!("  second decision unexpectedly succeeded"),
            Err(err) => println!("  second decision refused: {err}"),
        }
    }

    println!("\nSeeker view");
    for entry in service.list_my_applications(&sk1)? {
        println!(
            "  {} -> {} ({})",
            entry.application.id, entry.job_title, entry.application.status
        );
    }

    println!("\nEmployer report for emp1");
    let report = service.employer_report(&emp1)?;
    for row in &report {
        println!(
            "  {} | {} | {} | skills: {} | {}",
            row.job_title,
            row.applicant_username,
            row.full_name.as_deref().unwrap_or("-"),
            row.skills.as_deref().unwrap_or("-"),
            row.application_status
        );
    }

    println!("\nAdmin activity");
    let activity = service.admin_activity(&admin)?;
    for row in &activity {
        println!(
            "  {} applied to \"{}\" ({}) -> {} at {}",
            row.seeker_name,
            row.job_title,
            row.employer_name,
            row.status,
            row.created_at.to_rfc3339()
        );
    }

    if args.csv {
        println!("\nEmployer report (CSV)");
        write_csv(&report, std::io::stdout()).map_err(std::io::Error::from)?;
        println!("\nAdmin activity (CSV)");
        write_csv(&activity, std::io::stdout()).map_err(std::io::Error::from)?;
    }

    Ok(())
}
