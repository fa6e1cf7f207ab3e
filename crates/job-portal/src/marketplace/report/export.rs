use std::io::Write;

use serde::Serialize;

use super::views::{AdminActivityRow, EmployerReportRow};

/// Flat report row with a fixed column order.
///
/// `HEADERS` must list the serialized field names in declaration order.
pub trait CsvRow: Serialize {
    const HEADERS: &'static [&'static str];
}

impl CsvRow for EmployerReportRow {
    const HEADERS: &'static [&'static str] = &[
        "application_id",
        "job_title",
        "applicant_id",
        "applicant_username",
        "full_name",
        "skills",
        "contact_email",
        "application_status",
        "applied_at",
    ];
}

impl CsvRow for AdminActivityRow {
    const HEADERS: &'static [&'static str] = &[
        "application_id",
        "seeker_name",
        "job_title",
        "employer_name",
        "status",
        "created_at",
    ];
}

/// Render report rows as CSV. The header row is written even when there are no rows.
pub fn write_csv<T, W>(rows: &[T], writer: W) -> Result<(), csv::Error>
where
    T: CsvRow,
    W: Write,
{
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(T::HEADERS)?;
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marketplace::domain::{AccountId, ApplicationId, ApplicationStatus};
    use crate::marketplace::report::{AdminActivityRow, EmployerReportRow};
    use chrono::{TimeZone, Utc};

    #[test]
    fn employer_rows_render_with_headers_and_blank_profile_columns() {
        let rows = vec![EmployerReportRow {
            application_id: ApplicationId(7),
            job_title: "Backend Dev".to_string(),
            applicant_id: AccountId(3),
            applicant_username: "sk1".to_string(),
            full_name: None,
            skills: Some("rust, sql".to_string()),
            contact_email: None,
            application_status: ApplicationStatus::Accepted,
            applied_at: Utc
                .with_ymd_and_hms(2025, 3, 1, 9, 30, 0)
                .single()
                .expect("valid"),
        }];

        let mut buffer = Vec::new();
        write_csv(&rows, &mut buffer).expect("csv renders");
        let rendered = String::from_utf8(buffer).expect("utf8");
        let mut lines = rendered.lines();

        assert_eq!(
            lines.next(),
            Some("application_id,job_title,applicant_id,applicant_username,full_name,skills,contact_email,application_status,applied_at")
        );
        assert_eq!(
            lines.next(),
            Some("7,Backend Dev,3,sk1,,\"rust, sql\",,accepted,2025-03-01T09:30:00Z")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn empty_reports_still_render_the_header_row() {
        let mut buffer = Vec::new();
        write_csv::<EmployerReportRow, _>(&[], &mut buffer).expect("csv renders");
        assert_eq!(
            String::from_utf8(buffer).expect("utf8"),
            "application_id,job_title,applicant_id,applicant_username,full_name,skills,contact_email,application_status,applied_at\n"
        );

        let mut buffer = Vec::new();
        write_csv::<AdminActivityRow, _>(&[], &mut buffer).expect("csv renders");
        assert_eq!(
            String::from_utf8(buffer).expect("utf8"),
            "application_id,seeker_name,job_title,employer_name,status,created_at\n"
        );
    }

    #[test]
    fn admin_rows_follow_the_declared_header_order() {
        let rows = vec![AdminActivityRow {
            application_id: ApplicationId(2),
            seeker_name: "sk1".to_string(),
            job_title: "Data Eng".to_string(),
            employer_name: "emp2".to_string(),
            status: ApplicationStatus::Pending,
            created_at: Utc
                .with_ymd_and_hms(2025, 3, 2, 8, 0, 0)
                .single()
                .expect("valid"),
        }];

        let mut buffer = Vec::new();
        write_csv(&rows, &mut buffer).expect("csv renders");
        let rendered = String::from_utf8(buffer).expect("utf8");

        assert_eq!(
            rendered.lines().collect::<Vec<_>>(),
            vec![
                "application_id,seeker_name,job_title,employer_name,status,created_at",
                "2,sk1,Data Eng,emp2,pending,2025-03-02T08:00:00Z",
            ]
        );
    }
}
