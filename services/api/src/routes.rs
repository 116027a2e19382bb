use crate::infra::{deserialize_optional_date, AppState};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use chrono::{NaiveDate, Utc};
use job_tracker::error::AppError;
use job_tracker::tracking::analytics::{
    analyze, validate_window_days, DashboardAnalytics, MessagePools,
};
use job_tracker::tracking::{
    tracker_router, ApplicationRepository, ExportImporter, InterviewRepository,
    JobTrackerService, OwnerId, ReportingCalendar, TrackerServiceError,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub(crate) struct DashboardReportRequest {
    /// Contents of a JSON export, as uploaded.
    pub(crate) export: String,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) today: Option<NaiveDate>,
    #[serde(default)]
    pub(crate) window_days: Option<u32>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DashboardReportResponse {
    pub(crate) today: NaiveDate,
    pub(crate) imported: usize,
    pub(crate) skipped_records: usize,
    pub(crate) dropped_timestamps: usize,
    #[serde(flatten)]
    pub(crate) analytics: DashboardAnalytics,
}

pub(crate) fn with_tracker_routes<A, I>(service: Arc<JobTrackerService<A, I>>) -> axum::Router
where
    A: ApplicationRepository + 'static,
    I: InterviewRepository + 'static,
{
    tracker_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/analytics/dashboard",
            axum::routing::post(dashboard_report_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Dashboard analytics over an uploaded export, without touching stored records.
pub(crate) async fn dashboard_report_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<DashboardReportRequest>,
) -> Result<Json<DashboardReportResponse>, AppError> {
    let DashboardReportRequest {
        export,
        today,
        window_days,
    } = payload;

    let window_days = match window_days {
        Some(days) => validate_window_days(days).map_err(TrackerServiceError::from)?,
        None => state.tracker.activity_window_days,
    };

    let offset = state.tracker.utc_offset;
    let importer = ExportImporter::new(OwnerId("export".to_string()), offset);
    let report = importer.from_reader(Cursor::new(export.into_bytes()))?;

    let calendar = match today {
        Some(today) => ReportingCalendar::new(today, offset),
        None => ReportingCalendar::at(Utc::now(), offset),
    };
    let analytics = analyze(
        &report.applications,
        window_days,
        &calendar,
        &MessagePools::default(),
        &mut rand::thread_rng(),
    );

    Ok(Json(DashboardReportResponse {
        today: calendar.today(),
        imported: report.applications.len(),
        skipped_records: report.skipped_records,
        dropped_timestamps: report.dropped_timestamps,
        analytics,
    }))
}
