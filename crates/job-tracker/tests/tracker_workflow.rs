//! End-to-end scenarios through the public service facade, the HTTP router, and the export
//! importer, without reaching into private modules.

mod common {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use chrono::{DateTime, TimeZone, Utc};

    use job_tracker::config::TrackerConfig;
    use job_tracker::tracking::{
        ApplicationId, ApplicationRecord, ApplicationRepository, FixedClock, InterviewId,
        InterviewRecord, InterviewRepository, JobTrackerService, OwnerId, RepositoryError,
    };

    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 20, 15, 0, 0).unwrap()
    }

    pub fn owner() -> OwnerId {
        OwnerId("user-42".to_string())
    }

    #[derive(Default)]
    pub struct Applications(Mutex<HashMap<ApplicationId, ApplicationRecord>>);

    impl ApplicationRepository for Applications {
        fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
            let mut guard = self.0.lock().unwrap();
            if guard.contains_key(&record.id) {
                return Err(RepositoryError::Conflict);
            }
            guard.insert(record.id.clone(), record.clone());
            Ok(record)
        }

        fn update(&self, record: ApplicationRecord) -> Result<(), RepositoryError> {
            let mut guard = self.0.lock().unwrap();
            if !guard.contains_key(&record.id) {
                return Err(RepositoryError::NotFound);
            }
            guard.insert(record.id.clone(), record);
            Ok(())
        }

        fn fetch(
            &self,
            owner: &OwnerId,
            id: &ApplicationId,
        ) -> Result<Option<ApplicationRecord>, RepositoryError> {
            let guard = self.0.lock().unwrap();
            Ok(guard.get(id).filter(|record| &record.owner == owner).cloned())
        }

        fn list(&self, owner: &OwnerId) -> Result<Vec<ApplicationRecord>, RepositoryError> {
            let guard = self.0.lock().unwrap();
            Ok(guard
                .values()
                .filter(|record| &record.owner == owner)
                .cloned()
                .collect())
        }

        fn delete(&self, _owner: &OwnerId, id: &ApplicationId) -> Result<(), RepositoryError> {
            self.0
                .lock()
                .unwrap()
                .remove(id)
                .map(|_| ())
                .ok_or(RepositoryError::NotFound)
        }
    }

    #[derive(Default)]
    pub struct Interviews(Mutex<HashMap<InterviewId, InterviewRecord>>);

    impl InterviewRepository for Interviews {
        fn insert(&self, record: InterviewRecord) -> Result<InterviewRecord, RepositoryError> {
            self.0
                .lock()
                .unwrap()
                .insert(record.id.clone(), record.clone());
            Ok(record)
        }

        fn update(&self, record: InterviewRecord) -> Result<(), RepositoryError> {
            self.0.lock().unwrap().insert(record.id.clone(), record);
            Ok(())
        }

        fn fetch(
            &self,
            owner: &OwnerId,
            id: &InterviewId,
        ) -> Result<Option<InterviewRecord>, RepositoryError> {
            let guard = self.0.lock().unwrap();
            Ok(guard.get(id).filter(|record| &record.owner == owner).cloned())
        }

        fn list(&self, owner: &OwnerId) -> Result<Vec<InterviewRecord>, RepositoryError> {
            let guard = self.0.lock().unwrap();
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

        fn delete(&self, _owner: &OwnerId, id: &InterviewId) -> Result<(), RepositoryError> {
            self.0
                .lock()
                .unwrap()
                .remove(id)
                .map(|_| ())
                .ok_or(RepositoryError::NotFound)
        }

        fn delete_for_application(
            &self,
            _owner: &OwnerId,
            application_id: &ApplicationId,
        ) -> Result<usize, RepositoryError> {
            let mut guard = self.0.lock().unwrap();
            let before = guard.len();
            guard.retain(|_, record| &record.application_id != application_id);
            Ok(before - guard.len())
        }
    }

    pub fn service() -> Arc<JobTrackerService<Applications, Interviews>> {
        Arc::new(JobTrackerService::with_clock(
            Arc::new(Applications::default()),
            Arc::new(Interviews::default()),
            TrackerConfig::default(),
            Arc::new(FixedClock(now())),
        ))
    }
}

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, FixedOffset};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tower::ServiceExt;

use common::{now, owner, service};
use job_tracker::tracking::analytics::{analyze, FlowNodeKind, MessagePools};
use job_tracker::tracking::{
    tracker_router, ApplicationDraft, ApplicationStatus, ExportImporter, InterviewDraft,
    ReportingCalendar, OWNER_HEADER,
};

#[test]
fn a_full_search_shows_up_on_the_dashboard() {
    let service = service();
    let owner = owner();

    let listing = service
        .create_application(
            &owner,
            ApplicationDraft {
                title: "Staff Engineer".to_string(),
                company: "Globex".to_string(),
                url: Some("https://careers.globex.com/roles/7".to_string()),
                ..ApplicationDraft::default()
            },
        )
        .expect("create");
    service
        .update_status(&owner, &listing.id, ApplicationStatus::Applied)
        .expect("apply");
    for days in [1, 3] {
        service
            .schedule_interview(
                &owner,
                &listing.id,
                InterviewDraft {
                    scheduled_at: now() + Duration::days(days),
                    location: None,
                    interviewers: Vec::new(),
                    notes: None,
                },
            )
            .expect("schedule");
    }
    service
        .update_status(&owner, &listing.id, ApplicationStatus::Offer)
        .expect("offer");

    let dashboard = service
        .dashboard_with_rng(&owner, &mut StdRng::seed_from_u64(11))
        .expect("dashboard");

    let flow = &dashboard.analytics.flow;
    assert_eq!(
        flow.edge_count(
            FlowNodeKind::Status(ApplicationStatus::Found),
            FlowNodeKind::Status(ApplicationStatus::Applied)
        ),
        1
    );
    assert_eq!(
        flow.edge_count(
            FlowNodeKind::Interview(2),
            FlowNodeKind::Status(ApplicationStatus::Offer)
        ),
        1
    );
    assert_eq!(dashboard.upcoming_interviews.len(), 2);
    assert!(dashboard.active_applications.is_empty());
    assert_eq!(dashboard.analytics.sources[0].host, "careers.globex.com");
}

#[test]
fn exported_history_feeds_the_same_analytics() {
    let export = r#"[
        {"id": 1, "status": "EXPIRED", "title": "QA", "company": "Initech",
         "found_at": "2025-04-02T08:00:00Z"},
        {"id": 2, "status": "APPLIED", "title": "SRE", "company": "Hooli",
         "found_at": "2025-05-10", "applied_at": "2025-05-19T17:45"},
        {"id": 3, "status": "APPLIED", "title": "SRE II", "company": "Hooli",
         "applied_at": "2025-05-20T08:00:00+02:00"}
    ]"#;
    let offset = FixedOffset::east_opt(0).unwrap();
    let report = ExportImporter::new(owner(), offset)
        .from_reader(export.as_bytes())
        .expect("import");
    assert_eq!(report.applications.len(), 3);

    let calendar = ReportingCalendar::at(now(), offset);
    let analytics = analyze(
        &report.applications,
        30,
        &calendar,
        &MessagePools::default(),
        &mut StdRng::seed_from_u64(5),
    );

    assert_eq!(analytics.activity.buckets.len(), 30);
    assert_eq!(analytics.activity.total_applications(), 2);
    assert_eq!(analytics.encouragement_stats.streak_length, 2);
    assert_eq!(
        analytics.flow.edge_count(
            FlowNodeKind::Status(ApplicationStatus::Found),
            FlowNodeKind::Status(ApplicationStatus::Expired)
        ),
        1
    );
}

#[tokio::test]
async fn router_serves_owner_scoped_listings() {
    let service = service();
    service
        .create_application(
            &owner(),
            ApplicationDraft {
                title: "Platform Engineer".to_string(),
                company: "Acme".to_string(),
                ..ApplicationDraft::default()
            },
        )
        .expect("create");
    let router = tracker_router(service);

    let mine = router
        .clone()
        .oneshot(
            Request::get("/api/v1/applications")
                .header(OWNER_HEADER, owner().0)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(mine.status(), StatusCode::OK);
    let body = axum::body::to_bytes(mine.into_body(), 1 << 16).await.unwrap();
    let listed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    let theirs = router
        .oneshot(
            Request::get("/api/v1/applications")
                .header(OWNER_HEADER, "someone-else")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = axum::body::to_bytes(theirs.into_body(), 1 << 16).await.unwrap();
    let listed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(listed, serde_json::json!([]));
}
