use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for tracked applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Identifier wrapper for scheduled interviews.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InterviewId(pub String);

/// User a record belongs to, as asserted by the upstream session layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for InterviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle stage of a tracked application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Found,
    Applied,
    Interviewing,
    Rejected,
    Offer,
    Archived,
    Expired,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 7] = [
        ApplicationStatus::Found,
        ApplicationStatus::Applied,
        ApplicationStatus::Interviewing,
        ApplicationStatus::Rejected,
        ApplicationStatus::Offer,
        ApplicationStatus::Archived,
        ApplicationStatus::Expired,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Found => "FOUND",
            ApplicationStatus::Applied => "APPLIED",
            ApplicationStatus::Interviewing => "INTERVIEWING",
            ApplicationStatus::Rejected => "REJECTED",
            ApplicationStatus::Offer => "OFFER",
            ApplicationStatus::Archived => "ARCHIVED",
            ApplicationStatus::Expired => "EXPIRED",
        }
    }

    /// Applications still waiting on the employer.
    pub const fn is_active(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Applied | ApplicationStatus::Interviewing
        )
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ApplicationStatus {
    type Err = UnknownStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_uppercase();
        ApplicationStatus::ALL
            .into_iter()
            .find(|status| status.label() == normalized)
            .ok_or_else(|| UnknownStatus(raw.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown application status '{0}'")]
pub struct UnknownStatus(pub String);

/// A tracked job listing and where it sits in the search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    pub owner: OwnerId,
    pub status: ApplicationStatus,
    pub title: String,
    pub company: String,
    pub url: Option<String>,
    pub notes: Option<String>,
    pub interest: Option<u8>,
    pub alignment: Option<u8>,
    pub created_at: DateTime<Utc>,
    pub found_at: Option<DateTime<Utc>>,
    pub applied_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
}

/// An interview scheduled against one application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewRecord {
    pub id: InterviewId,
    pub owner: OwnerId,
    pub application_id: ApplicationId,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub interviewers: Vec<String>,
    pub notes: Option<String>,
}

impl InterviewRecord {
    /// Orders interviews soonest first with unscheduled ones last.
    pub fn schedule_key(&self) -> (bool, Option<DateTime<Utc>>) {
        (self.scheduled_at.is_none(), self.scheduled_at)
    }
}

/// Application joined with its interviews, earliest first, unscheduled last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationWithInterviews {
    #[serde(flatten)]
    pub application: ApplicationRecord,
    #[serde(default)]
    pub interviews: Vec<InterviewRecord>,
}

impl ApplicationWithInterviews {
    pub fn new(application: ApplicationRecord, mut interviews: Vec<InterviewRecord>) -> Self {
        interviews.sort_by_key(InterviewRecord::schedule_key);
        Self {
            application,
            interviews,
        }
    }
}

/// Interview joined with the headline fields of its application.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterviewView {
    #[serde(flatten)]
    pub interview: InterviewRecord,
    pub application_title: String,
    pub application_company: String,
}

/// User-editable fields of an application.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApplicationDraft {
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub interest: Option<u8>,
    #[serde(default)]
    pub alignment: Option<u8>,
}

pub const MAX_SCORE: u8 = 5;

impl ApplicationDraft {
    /// Trim the free-text fields and reject drafts missing a title or company.
    pub fn normalized(self) -> Result<Self, ValidationError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(ValidationError::MissingField("title"));
        }

        let company = self.company.trim().to_string();
        if company.is_empty() {
            return Err(ValidationError::MissingField("company"));
        }

        for (field, value) in [("interest", self.interest), ("alignment", self.alignment)] {
            if let Some(value) = value {
                if value > MAX_SCORE {
                    return Err(ValidationError::ScoreOutOfRange { field, value });
                }
            }
        }

        Ok(Self {
            title,
            company,
            url: non_blank(self.url),
            notes: non_blank(self.notes),
            interest: self.interest,
            alignment: self.alignment,
        })
    }
}

/// Fields captured when an interview is scheduled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterviewDraft {
    pub scheduled_at: DateTime<Utc>,
    pub location: Option<String>,
    pub interviewers: Vec<String>,
    pub notes: Option<String>,
}

impl InterviewDraft {
    pub fn normalized(self) -> Self {
        Self {
            scheduled_at: self.scheduled_at,
            location: non_blank(self.location),
            interviewers: self
                .interviewers
                .into_iter()
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect(),
            notes: non_blank(self.notes),
        }
    }
}

/// Split a comma separated interviewer list as typed into a form.
pub fn split_interviewers(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Timestamps a user may correct by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampField {
    FoundAt,
    AppliedAt,
    RejectedAt,
}

impl TimestampField {
    pub const fn label(self) -> &'static str {
        match self {
            TimestampField::FoundAt => "found_at",
            TimestampField::AppliedAt => "applied_at",
            TimestampField::RejectedAt => "rejected_at",
        }
    }
}

/// Narrowing applied to application listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationFilter {
    pub status: Option<ApplicationStatus>,
    pub search: Option<String>,
}

impl ApplicationFilter {
    pub fn matches(&self, record: &ApplicationRecord) -> bool {
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }

        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                record.company.to_lowercase().contains(&needle)
                    || record.title.to_lowercase().contains(&needle)
            }
            _ => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("{field} must be between 0 and 5 (got {value})")]
    ScoreOutOfRange { field: &'static str, value: u8 },
    #[error(transparent)]
    Status(#[from] UnknownStatus),
    #[error("{field}: {message}")]
    Timestamp { field: &'static str, message: String },
    #[error("window_days must be between 1 and {max} (got {value})")]
    WindowDays { value: u32, max: u32 },
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn status_parsing_is_case_insensitive() {
        assert_eq!(
            "interviewing".parse::<ApplicationStatus>(),
            Ok(ApplicationStatus::Interviewing)
        );
        assert_eq!(
            " Offer ".parse::<ApplicationStatus>(),
            Ok(ApplicationStatus::Offer)
        );
        let err = "GHOSTED".parse::<ApplicationStatus>().unwrap_err();
        assert!(err.to_string().contains("GHOSTED"));
    }

    #[test]
    fn status_serializes_as_screaming_labels() {
        let json = serde_json::to_string(&ApplicationStatus::Interviewing).unwrap();
        assert_eq!(json, "\"INTERVIEWING\"");
        for status in ApplicationStatus::ALL {
            let encoded = serde_json::to_value(status).unwrap();
            assert_eq!(encoded.as_str(), Some(status.label()));
        }
    }

    #[test]
    fn draft_normalization_trims_and_nulls_blanks() {
        let draft = ApplicationDraft {
            title: "  Backend Engineer ".to_string(),
            company: "Acme".to_string(),
            url: Some("   ".to_string()),
            notes: Some(" referral from Sam ".to_string()),
            interest: Some(4),
            alignment: None,
        }
        .normalized()
        .expect("valid draft");

        assert_eq!(draft.title, "Backend Engineer");
        assert_eq!(draft.url, None);
        assert_eq!(draft.notes.as_deref(), Some("referral from Sam"));
    }

    #[test]
    fn draft_requires_title_and_company() {
        let missing_company = ApplicationDraft {
            title: "SRE".to_string(),
            company: " ".to_string(),
            ..ApplicationDraft::default()
        };
        assert_eq!(
            missing_company.normalized(),
            Err(ValidationError::MissingField("company"))
        );

        let missing_title = ApplicationDraft::default();
        assert_eq!(
            missing_title.normalized(),
            Err(ValidationError::MissingField("title"))
        );
    }

    #[test]
    fn scores_above_five_are_rejected() {
        let draft = ApplicationDraft {
            title: "SRE".to_string(),
            company: "Acme".to_string(),
            alignment: Some(9),
            ..ApplicationDraft::default()
        };
        assert_eq!(
            draft.normalized(),
            Err(ValidationError::ScoreOutOfRange {
                field: "alignment",
                value: 9
            })
        );
    }

    #[test]
    fn interviewer_lists_drop_blank_names() {
        assert_eq!(
            split_interviewers("Ada Lovelace, , Grace Hopper ,"),
            vec!["Ada Lovelace".to_string(), "Grace Hopper".to_string()]
        );
    }

    #[test]
    fn joined_interviews_put_unscheduled_last() {
        let at = |hour| Utc.with_ymd_and_hms(2025, 5, 20, hour, 0, 0).unwrap();
        let interview = |id: &str, scheduled_at| InterviewRecord {
            id: InterviewId(id.to_string()),
            owner: OwnerId("user-1".to_string()),
            application_id: ApplicationId("app-1".to_string()),
            scheduled_at,
            location: None,
            interviewers: Vec::new(),
            notes: None,
        };
        let application = ApplicationRecord {
            id: ApplicationId("app-1".to_string()),
            owner: OwnerId("user-1".to_string()),
            status: ApplicationStatus::Interviewing,
            title: "SRE".to_string(),
            company: "Acme".to_string(),
            url: None,
            notes: None,
            interest: None,
            alignment: None,
            created_at: at(9),
            found_at: Some(at(9)),
            applied_at: Some(at(9)),
            rejected_at: None,
        };

        let joined = ApplicationWithInterviews::new(
            application,
            vec![
                interview("late", Some(at(16))),
                interview("open", None),
                interview("early", Some(at(10))),
            ],
        );

        let order: Vec<&str> = joined
            .interviews
            .iter()
            .map(|interview| interview.id.0.as_str())
            .collect();
        assert_eq!(order, ["early", "late", "open"]);
    }
}
