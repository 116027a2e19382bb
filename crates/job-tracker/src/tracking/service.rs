use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rand::Rng;
use serde::Serialize;
use tracing::{info, warn};

use super::analytics::{analyze, DashboardAnalytics, MessagePools};
use super::calendar::{parse_timestamp, Clock, ReportingCalendar, SystemClock};
use super::domain::{
    ApplicationDraft, ApplicationFilter, ApplicationId, ApplicationRecord, ApplicationStatus,
    ApplicationWithInterviews, InterviewDraft, InterviewId, InterviewRecord, InterviewView,
    OwnerId, TimestampField, ValidationError,
};
use super::lifecycle::compute_status_update;
use super::repository::{ApplicationRepository, InterviewRepository, RepositoryError};
use crate::config::TrackerConfig;

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static INTERVIEW_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

fn next_interview_id() -> InterviewId {
    let id = INTERVIEW_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    InterviewId(format!("int-{id:06}"))
}

/// Everything the dashboard page renders for one user.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub generated_at: DateTime<Utc>,
    pub today: NaiveDate,
    #[serde(flatten)]
    pub analytics: DashboardAnalytics,
    pub upcoming_interviews: Vec<InterviewView>,
    pub found_listings: Vec<ApplicationRecord>,
    pub active_applications: Vec<ApplicationRecord>,
}

/// Service composing the application and interview stores with the status policy and the
/// dashboard analytics.
pub struct JobTrackerService<A, I> {
    applications: Arc<A>,
    interviews: Arc<I>,
    clock: Arc<dyn Clock>,
    config: TrackerConfig,
    pools: MessagePools,
}

impl<A, I> JobTrackerService<A, I>
where
    A: ApplicationRepository + 'static,
    I: InterviewRepository + 'static,
{
    pub fn new(applications: Arc<A>, interviews: Arc<I>, config: TrackerConfig) -> Self {
        Self::with_clock(applications, interviews, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        applications: Arc<A>,
        interviews: Arc<I>,
        config: TrackerConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            applications,
            interviews,
            clock,
            config,
            pools: MessagePools::default(),
        }
    }

    pub fn with_message_pools(mut self, pools: MessagePools) -> Self {
        self.pools = pools;
        self
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Reporting calendar for the current instant.
    pub fn calendar(&self) -> ReportingCalendar {
        ReportingCalendar::at(self.clock.now(), self.config.utc_offset)
    }

    /// Parse a user supplied timestamp in the configured reporting offset.
    pub fn parse_timestamp(
        &self,
        field: &'static str,
        raw: &str,
    ) -> Result<DateTime<Utc>, ValidationError> {
        parse_timestamp(raw, self.config.utc_offset).map_err(|err| ValidationError::Timestamp {
            field,
            message: err.to_string(),
        })
    }

    /// Start tracking a listing. New records begin as `FOUND`.
    pub fn create_application(
        &self,
        owner: &OwnerId,
        draft: ApplicationDraft,
    ) -> Result<ApplicationRecord, TrackerServiceError> {
        let draft = draft.normalized()?;
        let now = self.clock.now();

        let record = ApplicationRecord {
            id: next_application_id(),
            owner: owner.clone(),
            status: ApplicationStatus::Found,
            title: draft.title,
            company: draft.company,
            url: draft.url,
            notes: draft.notes,
            interest: draft.interest,
            alignment: draft.alignment,
            created_at: now,
            found_at: Some(now),
            applied_at: None,
            rejected_at: None,
        };

        let stored = self.applications.insert(record)?;
        info!(application_id = %stored.id, company = %stored.company, "application created");
        Ok(stored)
    }

    /// Applications newest first, narrowed by `filter`.
    pub fn list_applications(
        &self,
        owner: &OwnerId,
        filter: &ApplicationFilter,
    ) -> Result<Vec<ApplicationRecord>, TrackerServiceError> {
        let mut records: Vec<ApplicationRecord> = self
            .applications
            .list(owner)?
            .into_iter()
            .filter(|record| filter.matches(record))
            .collect();
        records.sort_by_key(|record| Reverse(record.created_at));
        Ok(records)
    }

    pub fn get_application(
        &self,
        owner: &OwnerId,
        id: &ApplicationId,
    ) -> Result<ApplicationWithInterviews, TrackerServiceError> {
        let application = self.fetch_application(owner, id)?;
        let interviews = self.interviews.list_for_application(owner, id)?;
        Ok(ApplicationWithInterviews::new(application, interviews))
    }

    pub fn update_application(
        &self,
        owner: &OwnerId,
        id: &ApplicationId,
        draft: ApplicationDraft,
    ) -> Result<ApplicationRecord, TrackerServiceError> {
        let draft = draft.normalized()?;
        let mut record = self.fetch_application(owner, id)?;

        record.title = draft.title;
        record.company = draft.company;
        record.url = draft.url;
        record.notes = draft.notes;
        record.interest = draft.interest;
        record.alignment = draft.alignment;

        self.applications.update(record.clone())?;
        info!(application_id = %id, "application details updated");
        Ok(record)
    }

    /// Move an application to `status`, stamping the timestamps the status policy asks for.
    pub fn update_status(
        &self,
        owner: &OwnerId,
        id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<ApplicationRecord, TrackerServiceError> {
        let mut record = self.fetch_application(owner, id)?;
        let previous = record.status;

        let patch = compute_status_update(&record, status, self.clock.now());
        patch.apply_to(&mut record);
        self.applications.update(record.clone())?;

        info!(
            application_id = %id,
            from = %previous,
            to = %status,
            fields = ?patch.touched_fields(),
            "application status changed"
        );
        Ok(record)
    }

    /// Overwrite one of the hand-editable timestamps with a corrected value.
    pub fn update_date(
        &self,
        owner: &OwnerId,
        id: &ApplicationId,
        field: TimestampField,
        value: DateTime<Utc>,
    ) -> Result<ApplicationRecord, TrackerServiceError> {
        let mut record = self.fetch_application(owner, id)?;
        let value = Some(value);

        match field {
            TimestampField::FoundAt => record.found_at = value,
            TimestampField::AppliedAt => record.applied_at = value,
            TimestampField::RejectedAt => record.rejected_at = value,
        }

        self.applications.update(record.clone())?;
        info!(application_id = %id, field = field.label(), "application date corrected");
        Ok(record)
    }

    /// Remove an application together with its interviews.
    pub fn delete_application(
        &self,
        owner: &OwnerId,
        id: &ApplicationId,
    ) -> Result<(), TrackerServiceError> {
        self.fetch_application(owner, id)?;

        let removed_interviews = self.interviews.delete_for_application(owner, id)?;
        self.applications.delete(owner, id)?;

        info!(application_id = %id, removed_interviews, "application deleted");
        Ok(())
    }

    /// Book an interview and move the application to `INTERVIEWING`.
    pub fn schedule_interview(
        &self,
        owner: &OwnerId,
        application_id: &ApplicationId,
        draft: InterviewDraft,
    ) -> Result<InterviewRecord, TrackerServiceError> {
        self.fetch_application(owner, application_id)?;
        let draft = draft.normalized();

        let interview = self.interviews.insert(InterviewRecord {
            id: next_interview_id(),
            owner: owner.clone(),
            application_id: application_id.clone(),
            scheduled_at: Some(draft.scheduled_at),
            location: draft.location,
            interviewers: draft.interviewers,
            notes: draft.notes,
        })?;

        let moved = self.update_status(owner, application_id, ApplicationStatus::Interviewing);
        if let Err(err) = moved {
            if let Err(rollback) = self.interviews.delete(owner, &interview.id) {
                warn!(
                    interview_id = %interview.id,
                    error = %rollback,
                    "failed to remove interview after status update failed"
                );
            }
            return Err(err);
        }

        info!(
            interview_id = %interview.id,
            application_id = %application_id,
            "interview scheduled"
        );
        Ok(interview)
    }

    /// Every interview of the owner, soonest first, with its application's headline.
    pub fn list_interviews(
        &self,
        owner: &OwnerId,
    ) -> Result<Vec<InterviewView>, TrackerServiceError> {
        let applications: HashMap<ApplicationId, ApplicationRecord> = self
            .applications
            .list(owner)?
            .into_iter()
            .map(|record| (record.id.clone(), record))
            .collect();

        let mut views: Vec<InterviewView> = self
            .interviews
            .list(owner)?
            .into_iter()
            .filter_map(|interview| {
                let application = applications.get(&interview.application_id)?;
                Some(InterviewView {
                    application_title: application.title.clone(),
                    application_company: application.company.clone(),
                    interview,
                })
            })
            .collect();
        views.sort_by_key(|view| view.interview.schedule_key());
        Ok(views)
    }

    pub fn reschedule_interview(
        &self,
        owner: &OwnerId,
        id: &InterviewId,
        scheduled_at: DateTime<Utc>,
    ) -> Result<InterviewRecord, TrackerServiceError> {
        let mut interview = self.fetch_interview(owner, id)?;
        interview.scheduled_at = Some(scheduled_at);
        self.interviews.update(interview.clone())?;

        info!(interview_id = %id, %scheduled_at, "interview rescheduled");
        Ok(interview)
    }

    pub fn update_interview_notes(
        &self,
        owner: &OwnerId,
        id: &InterviewId,
        notes: Option<String>,
    ) -> Result<InterviewRecord, TrackerServiceError> {
        let mut interview = self.fetch_interview(owner, id)?;
        interview.notes = notes
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        self.interviews.update(interview.clone())?;
        Ok(interview)
    }

    pub fn cancel_interview(
        &self,
        owner: &OwnerId,
        id: &InterviewId,
    ) -> Result<(), TrackerServiceError> {
        self.fetch_interview(owner, id)?;
        self.interviews.delete(owner, id)?;

        info!(interview_id = %id, "interview cancelled");
        Ok(())
    }

    /// All applications of the owner joined with their interviews.
    pub fn applications_with_interviews(
        &self,
        owner: &OwnerId,
    ) -> Result<Vec<ApplicationWithInterviews>, TrackerServiceError> {
        let mut by_application: HashMap<ApplicationId, Vec<InterviewRecord>> = HashMap::new();
        for interview in self.interviews.list(owner)? {
            by_application
                .entry(interview.application_id.clone())
                .or_default()
                .push(interview);
        }

        let mut joined: Vec<ApplicationWithInterviews> = self
            .applications
            .list(owner)?
            .into_iter()
            .map(|application| {
                let interviews = by_application.remove(&application.id).unwrap_or_default();
                ApplicationWithInterviews::new(application, interviews)
            })
            .collect();
        joined.sort_by_key(|entry| Reverse(entry.application.created_at));
        Ok(joined)
    }

    pub fn dashboard(&self, owner: &OwnerId) -> Result<DashboardView, TrackerServiceError> {
        self.dashboard_with_rng(owner, &mut rand::thread_rng())
    }

    /// Dashboard with a caller supplied source of randomness for the encouragement pick.
    pub fn dashboard_with_rng<R>(
        &self,
        owner: &OwnerId,
        rng: &mut R,
    ) -> Result<DashboardView, TrackerServiceError>
    where
        R: Rng + ?Sized,
    {
        let now = self.clock.now();
        let calendar = ReportingCalendar::at(now, self.config.utc_offset);
        let entries = self.applications_with_interviews(owner)?;

        let analytics = analyze(
            &entries,
            self.config.activity_window_days,
            &calendar,
            &self.pools,
            rng,
        );

        // A horizon past the representable range means no upper bound.
        let horizon =
            now.checked_add_signed(Duration::days(i64::from(self.config.upcoming_days)));
        let upcoming_interviews = self
            .list_interviews(owner)?
            .into_iter()
            .filter(|view| {
                view.interview
                    .scheduled_at
                    .is_some_and(|at| at >= now && horizon.map_or(true, |end| at <= end))
            })
            .collect();

        let mut found_listings: Vec<ApplicationRecord> = entries
            .iter()
            .map(|entry| &entry.application)
            .filter(|application| application.status == ApplicationStatus::Found)
            .cloned()
            .collect();
        found_listings.sort_by_key(|application| Reverse(application.found_at));
        found_listings.truncate(self.config.list_limit);

        let mut active_applications: Vec<ApplicationRecord> = entries
            .iter()
            .map(|entry| &entry.application)
            .filter(|application| application.status.is_active())
            .cloned()
            .collect();
        active_applications.sort_by_key(|application| Reverse(application.applied_at));
        active_applications.truncate(self.config.list_limit);

        Ok(DashboardView {
            generated_at: now,
            today: calendar.today(),
            analytics,
            upcoming_interviews,
            found_listings,
            active_applications,
        })
    }

    fn fetch_application(
        &self,
        owner: &OwnerId,
        id: &ApplicationId,
    ) -> Result<ApplicationRecord, TrackerServiceError> {
        let record = self
            .applications
            .fetch(owner, id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    fn fetch_interview(
        &self,
        owner: &OwnerId,
        id: &InterviewId,
    ) -> Result<InterviewRecord, TrackerServiceError> {
        let record = self
            .interviews
            .fetch(owner, id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }
}

/// Error raised by the tracker service.
#[derive(Debug, thiserror::Error)]
pub enum TrackerServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
