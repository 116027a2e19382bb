//! Lenient loader for JSON exports of a user's applications.
//!
//! Exports come from the hosted backend and may carry timestamps in whatever shape the form
//! layer stored. A timestamp that cannot be parsed is dropped from its record (and logged) so
//! the rest of the export still feeds the dashboard.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::{DateTime, FixedOffset, Utc};
use serde::Deserialize;
use tracing::warn;

use super::calendar::parse_timestamp;
use super::domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, ApplicationWithInterviews, InterviewId,
    InterviewRecord, OwnerId,
};

/// Identifiers arrive as database integers or strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ExportId {
    Number(u64),
    Text(String),
}

impl ExportId {
    fn into_string(self) -> String {
        match self {
            ExportId::Number(value) => value.to_string(),
            ExportId::Text(value) => value,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationExport {
    #[serde(default)]
    pub id: Option<ExportId>,
    pub status: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub interest: Option<u8>,
    #[serde(default)]
    pub alignment: Option<u8>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub found_at: Option<String>,
    #[serde(default)]
    pub applied_at: Option<String>,
    #[serde(default)]
    pub rejected_at: Option<String>,
    #[serde(default)]
    pub interviews: Vec<InterviewExport>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InterviewExport {
    #[serde(default)]
    pub id: Option<ExportId>,
    #[serde(default)]
    pub scheduled_at: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub interviewers: Option<Vec<String>>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Outcome of an import: usable records plus how much was discarded along the way.
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub applications: Vec<ApplicationWithInterviews>,
    pub dropped_timestamps: usize,
    pub skipped_records: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("unable to read export: {0}")]
    Io(#[from] std::io::Error),
    #[error("export is not a JSON array of applications: {0}")]
    Json(#[from] serde_json::Error),
}

/// Converts raw export rows into owned records for a single owner.
pub struct ExportImporter {
    owner: OwnerId,
    offset: FixedOffset,
}

impl ExportImporter {
    pub fn new(owner: OwnerId, offset: FixedOffset) -> Self {
        Self { owner, offset }
    }

    pub fn from_path(&self, path: impl AsRef<Path>) -> Result<ImportReport, ImportError> {
        let file = File::open(path)?;
        self.from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(&self, reader: R) -> Result<ImportReport, ImportError> {
        let rows: Vec<ApplicationExport> = serde_json::from_reader(reader)?;
        Ok(self.convert(rows))
    }

    pub fn convert(&self, rows: Vec<ApplicationExport>) -> ImportReport {
        let mut report = ImportReport::default();

        for (position, row) in rows.into_iter().enumerate() {
            let status = match row.status.parse::<ApplicationStatus>() {
                Ok(status) => status,
                Err(err) => {
                    warn!(row = position, error = %err, "skipping exported application");
                    report.skipped_records += 1;
                    continue;
                }
            };

            let id = ApplicationId(
                row.id
                    .map(ExportId::into_string)
                    .unwrap_or_else(|| format!("import-{:06}", position + 1)),
            );

            let mut timestamp = |field: &'static str, raw: Option<String>| {
                self.lenient_timestamp(&id.0, field, raw, &mut report.dropped_timestamps)
            };
            let found_at = timestamp("found_at", row.found_at);
            let applied_at = timestamp("applied_at", row.applied_at);
            let rejected_at = timestamp("rejected_at", row.rejected_at);
            let created_at = timestamp("created_at", row.created_at)
                .or(found_at)
                .or(applied_at)
                .or(rejected_at)
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

            let interviews = row
                .interviews
                .into_iter()
                .enumerate()
                .map(|(round, interview)| InterviewRecord {
                    id: InterviewId(
                        interview
                            .id
                            .map(ExportId::into_string)
                            .unwrap_or_else(|| format!("{}-interview-{}", id.0, round + 1)),
                    ),
                    owner: self.owner.clone(),
                    application_id: id.clone(),
                    scheduled_at: timestamp("scheduled_at", interview.scheduled_at),
                    location: interview.location,
                    interviewers: interview.interviewers.unwrap_or_default(),
                    notes: interview.notes,
                })
                .collect();

            let application = ApplicationRecord {
                id: id.clone(),
                owner: self.owner.clone(),
                status,
                title: row.title.unwrap_or_default(),
                company: row.company.unwrap_or_default(),
                url: row.url,
                notes: row.notes,
                interest: row.interest,
                alignment: row.alignment,
                created_at,
                found_at,
                applied_at,
                rejected_at,
            };

            report
                .applications
                .push(ApplicationWithInterviews::new(application, interviews));
        }

        report
    }

    fn lenient_timestamp(
        &self,
        record: &str,
        field: &'static str,
        raw: Option<String>,
        dropped: &mut usize,
    ) -> Option<DateTime<Utc>> {
        let raw = raw?;
        if raw.trim().is_empty() {
            return None;
        }

        match parse_timestamp(&raw, self.offset) {
            Ok(instant) => Some(instant),
            Err(err) => {
                warn!(record, field, error = %err, "dropping malformed timestamp");
                *dropped += 1;
                None
            }
        }
    }
}
