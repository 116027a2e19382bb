use chrono::NaiveDate;
use job_tracker::config::TrackerConfig;
use job_tracker::tracking::{
    ApplicationId, ApplicationRecord, ApplicationRepository, InterviewId, InterviewRecord,
    InterviewRepository, OwnerId, RepositoryError,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) tracker: TrackerConfig,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationRepository {
    records: Arc<Mutex<HashMap<ApplicationId, ApplicationRecord>>>,
}

impl ApplicationRepository for InMemoryApplicationRepository {
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
pub(crate) struct InMemoryInterviewRepository {
    records: Arc<Mutex<HashMap<InterviewId, InterviewRecord>>>,
}

impl InterviewRepository for InMemoryInterviewRepository {
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
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| &record.owner == owner && &record.application_id == application_id)
            .cloned()
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

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn deserialize_optional_date<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.map(|value| parse_date(&value).map_err(serde::de::Error::custom))
        .transpose()
}
