//! Job search tracking: applications, interviews, the status lifecycle, and the dashboard
//! analytics derived from them.

pub mod analytics;
pub mod calendar;
pub mod domain;
pub mod import;
pub mod lifecycle;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use calendar::{Clock, FixedClock, ReportingCalendar, SystemClock};
pub use domain::{
    ApplicationDraft, ApplicationFilter, ApplicationId, ApplicationRecord, ApplicationStatus,
    ApplicationWithInterviews, InterviewDraft, InterviewId, InterviewRecord, InterviewView,
    OwnerId, TimestampField, UnknownStatus, ValidationError,
};
pub use import::{ExportImporter, ImportError, ImportReport};
pub use lifecycle::{compute_status_update, StatusPatch};
pub use repository::{ApplicationRepository, InterviewRepository, RepositoryError};
pub use router::{status_for, tracker_router, OWNER_HEADER};
pub use service::{DashboardView, JobTrackerService, TrackerServiceError};
