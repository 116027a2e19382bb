use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::config::TrackerConfig;
use crate::tracking::calendar::{FixedClock, ReportingCalendar};
use crate::tracking::domain::{
    ApplicationDraft, ApplicationId, ApplicationRecord, ApplicationStatus,
    ApplicationWithInterviews, InterviewId, InterviewRecord, OwnerId,
};
use crate::tracking::repository::{ApplicationRepository, InterviewRepository, RepositoryError};
use crate::tracking::{tracker_router, JobTrackerService};

pub(super) type MemoryService = JobTrackerService<MemoryApplications, MemoryInterviews>;

/// Tuesday afternoon, UTC.
pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 20, 15, 0, 0).unwrap()
}

pub(super) fn day(year: i32, month: u32, date: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, date).expect("valid date")
}

pub(super) fn at(year: i32, month: u32, date: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, date, hour, 0, 0).unwrap()
}

pub(super) fn calendar() -> ReportingCalendar {
    ReportingCalendar::at(now(), TrackerConfig::default().utc_offset)
}

pub(super) fn owner() -> OwnerId {
    OwnerId("user-1".to_string())
}

pub(super) fn other_owner() -> OwnerId {
    OwnerId("user-2".to_string())
}

pub(super) fn draft(title: &str, company: &str) -> ApplicationDraft {
    ApplicationDraft {
        title: title.to_string(),
        company: company.to_string(),
        url: Some(format!(
            "https://jobs.example.com/{}",
            company.to_lowercase()
        )),
        notes: None,
        interest: Some(4),
        alignment: Some(3),
    }
}

/// Bare record for analytics fixtures; callers fill in the timestamps they care about.
pub(super) fn record(id: &str, status: ApplicationStatus) -> ApplicationRecord {
    ApplicationRecord {
        id: ApplicationId(id.to_string()),
        owner: owner(),
        status,
        title: format!("Engineer {id}"),
        company: format!("Company {id}"),
        url: None,
        notes: None,
        interest: None,
        alignment: None,
        created_at: now() - Duration::days(30),
        found_at: None,
        applied_at: None,
        rejected_at: None,
    }
}

pub(super) fn interview_on(
    application: &ApplicationRecord,
    scheduled_at: DateTime<Utc>,
) -> InterviewRecord {
    InterviewRecord {
        id: InterviewId(format!("{}-{}", application.id, scheduled_at.timestamp())),
        owner: application.owner.clone(),
        application_id: application.id.clone(),
        scheduled_at: Some(scheduled_at),
        location: None,
        interviewers: Vec::new(),
        notes: None,
    }
}

pub(super) fn entry(application: ApplicationRecord) -> ApplicationWithInterviews {
    ApplicationWithInterviews::new(application, Vec::new())
}

pub(super) fn entry_with_interviews(
    application: ApplicationRecord,
    scheduled: &[DateTime<Utc>],
) -> ApplicationWithInterviews {
    let interviews = scheduled
        .iter()
        .map(|instant| interview_on(&application, *instant))
        .collect();
    ApplicationWithInterviews::new(application, interviews)
}

pub(super) fn build_service() -> (
    MemoryService,
    Arc<MemoryApplications>,
    Arc<MemoryInterviews>,
) {
    build_service_with(TrackerConfig::default())
}

pub(super) fn build_service_with(
    config: TrackerConfig,
) -> (
    MemoryService,
    Arc<MemoryApplications>,
    Arc<MemoryInterviews>,
) {
    let applications = Arc::new(MemoryApplications::default());
    let interviews = Arc::new(MemoryInterviews::default());
    let service = JobTrackerService::with_clock(
        applications.clone(),
        interviews.clone(),
        config,
        Arc::new(FixedClock(now())),
    );
    (service, applications, interviews)
}

pub(super) fn tracker_router_with_service(service: MemoryService) -> axum::Router {
    tracker_router(Arc::new(service))
}

#[derive(Default, Clone)]
pub(super) struct MemoryApplications {
    pub(super) records: Arc<Mutex<HashMap<ApplicationId, ApplicationRecord>>>,
}

impl MemoryApplications {
    pub(super) fn len(&self) -> usize {
        self.records.lock().expect("repository mutex poisoned").len()
    }
}

impl ApplicationRepository for MemoryApplications {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: ApplicationRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        match guard.get_mut(&record.id) {
            Some(existing) if existing.owner == record.owner => {
                *existing = record;
                Ok(())
            }
            _ => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(
        &self,
        owner: &OwnerId,
        id: &ApplicationId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).filter(|record| &record.owner == owner).cloned())
    }

    fn list(&self, owner: &OwnerId) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| &record.owner == owner)
            .cloned()
            .collect())
    }

    fn delete(&self, owner: &OwnerId, id: &ApplicationId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        match guard.get(id) {
            Some(record) if &record.owner == owner => {
                guard.remove(id);
                Ok(())
            }
            _ => Err(RepositoryError::NotFound),
        }
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryInterviews {
    pub(super) records: Arc<Mutex<HashMap<InterviewId, InterviewRecord>>>,
}

impl MemoryInterviews {
    pub(super) fn len(&self) -> usize {
        self.records.lock().expect("repository mutex poisoned").len()
    }
}

impl InterviewRepository for MemoryInterviews {
    fn insert(&self, record: InterviewRecord) -> Result<InterviewRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: InterviewRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        match guard.get_mut(&record.id) {
            Some(existing) if existing.owner == record.owner => {
                *existing = record;
                Ok(())
            }
            _ => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(
        &self,
        owner: &OwnerId,
        id: &InterviewId,
    ) -> Result<Option<InterviewRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).filter(|record| &record.owner == owner).cloned())
    }

    fn list(&self, owner: &OwnerId) -> Result<Vec<InterviewRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| &record.owner == owner)
            .cloned()
            .collect())
    }

    fn list_for_application(
        &self,
        owner: &OwnerId,
        application_id: &ApplicationId,
    ) -> Result<Vec<InterviewRecord>, RepositoryError> {
        Ok(self
            .list(owner)?
            .into_iter()
            .filter(|record| &record.application_id == application_id)
            .collect())
    }

    fn delete(&self, owner: &OwnerId, id: &InterviewId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        match guard.get(id) {
            Some(record) if &record.owner == owner => {
                guard.remove(id);
                Ok(())
            }
            _ => Err(RepositoryError::NotFound),
        }
    }

    fn delete_for_application(
        &self,
        owner: &OwnerId,
        application_id: &ApplicationId,
    ) -> Result<usize, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let before = guard.len();
        guard.retain(|_, record| {
            !(&record.owner == owner && &record.application_id == application_id)
        });
        Ok(before - guard.len())
    }
}

/// Stores records but refuses every update.
#[derive(Default)]
pub(super) struct FrozenApplications(pub(super) MemoryApplications);

impl ApplicationRepository for FrozenApplications {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        self.0.insert(record)
    }

    fn update(&self, _record: ApplicationRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("read-only replica".to_string()))
    }

    fn fetch(
        &self,
        owner: &OwnerId,
        id: &ApplicationId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        self.0.fetch(owner, id)
    }

    fn list(&self, owner: &OwnerId) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        self.0.list(owner)
    }

    fn delete(&self, owner: &OwnerId, id: &ApplicationId) -> Result<(), RepositoryError> {
        self.0.delete(owner, id)
    }
}

pub(super) struct UnavailableApplications;

impl ApplicationRepository for UnavailableApplications {
    fn insert(&self, _record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: ApplicationRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(
        &self,
        _owner: &OwnerId,
        _id: &ApplicationId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self, _owner: &OwnerId) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _owner: &OwnerId, _id: &ApplicationId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
