use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{
    split_interviewers, ApplicationDraft, ApplicationFilter, ApplicationId, ApplicationStatus,
    InterviewDraft, InterviewId, OwnerId, TimestampField, ValidationError,
};
use super::repository::{ApplicationRepository, InterviewRepository, RepositoryError};
use super::service::{JobTrackerService, TrackerServiceError};

/// Header carrying the signed-in user, set by the upstream session layer.
pub const OWNER_HEADER: &str = "x-user-id";

type SharedService<A, I> = Arc<JobTrackerService<A, I>>;

/// Router exposing the tracker's application, interview, and dashboard endpoints.
pub fn tracker_router<A, I>(service: SharedService<A, I>) -> Router
where
    A: ApplicationRepository + 'static,
    I: InterviewRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/applications",
            post(create_application_handler::<A, I>).get(list_applications_handler::<A, I>),
        )
        .route(
            "/api/v1/applications/:application_id",
            get(get_application_handler::<A, I>)
                .patch(update_application_handler::<A, I>)
                .delete(delete_application_handler::<A, I>),
        )
        .route(
            "/api/v1/applications/:application_id/status",
            put(update_status_handler::<A, I>),
        )
        .route(
            "/api/v1/applications/:application_id/dates",
            put(update_date_handler::<A, I>),
        )
        .route(
            "/api/v1/applications/:application_id/interviews",
            post(schedule_interview_handler::<A, I>),
        )
        .route("/api/v1/interviews", get(list_interviews_handler::<A, I>))
        .route(
            "/api/v1/interviews/:interview_id",
            axum::routing::delete(cancel_interview_handler::<A, I>),
        )
        .route(
            "/api/v1/interviews/:interview_id/schedule",
            put(reschedule_interview_handler::<A, I>),
        )
        .route(
            "/api/v1/interviews/:interview_id/notes",
            put(interview_notes_handler::<A, I>),
        )
        .route("/api/v1/dashboard", get(dashboard_handler::<A, I>))
        .with_state(service)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for OwnerId
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| OwnerId(value.to_string()))
            .ok_or_else(|| {
                let payload = json!({ "error": format!("missing {OWNER_HEADER} header") });
                (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
            })
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListQuery {
    #[serde(default)]
    pub(crate) status: Option<String>,
    #[serde(default)]
    pub(crate) search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusRequest {
    pub(crate) status: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DateRequest {
    pub(crate) field: TimestampField,
    pub(crate) value: String,
}

/// Interviewers as a list, or as the comma separated text a form submits.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum InterviewerInput {
    Names(Vec<String>),
    Text(String),
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScheduleRequest {
    pub(crate) scheduled_at: String,
    #[serde(default)]
    pub(crate) location: Option<String>,
    #[serde(default)]
    pub(crate) interviewers: Option<InterviewerInput>,
    #[serde(default)]
    pub(crate) notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RescheduleRequest {
    pub(crate) scheduled_at: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NotesRequest {
    #[serde(default)]
    pub(crate) notes: Option<String>,
}

pub(crate) async fn create_application_handler<A, I>(
    State(service): State<SharedService<A, I>>,
    owner: OwnerId,
    Json(draft): Json<ApplicationDraft>,
) -> Response
where
    A: ApplicationRepository + 'static,
    I: InterviewRepository + 'static,
{
    respond(service.create_application(&owner, draft), StatusCode::CREATED)
}

pub(crate) async fn list_applications_handler<A, I>(
    State(service): State<SharedService<A, I>>,
    owner: OwnerId,
    Query(query): Query<ListQuery>,
) -> Response
where
    A: ApplicationRepository + 'static,
    I: InterviewRepository + 'static,
{
    let status = match query.status.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => match raw.parse::<ApplicationStatus>() {
            Ok(status) => Some(status),
            Err(err) => return error_response(ValidationError::from(err).into()),
        },
        _ => None,
    };

    let filter = ApplicationFilter {
        status,
        search: query.search,
    };
    respond(service.list_applications(&owner, &filter), StatusCode::OK)
}

pub(crate) async fn get_application_handler<A, I>(
    State(service): State<SharedService<A, I>>,
    owner: OwnerId,
    Path(application_id): Path<String>,
) -> Response
where
    A: ApplicationRepository + 'static,
    I: InterviewRepository + 'static,
{
    let id = ApplicationId(application_id);
    respond(service.get_application(&owner, &id), StatusCode::OK)
}

pub(crate) async fn update_application_handler<A, I>(
    State(service): State<SharedService<A, I>>,
    owner: OwnerId,
    Path(application_id): Path<String>,
    Json(draft): Json<ApplicationDraft>,
) -> Response
where
    A: ApplicationRepository + 'static,
    I: InterviewRepository + 'static,
{
    let id = ApplicationId(application_id);
    respond(service.update_application(&owner, &id, draft), StatusCode::OK)
}

pub(crate) async fn delete_application_handler<A, I>(
    State(service): State<SharedService<A, I>>,
    owner: OwnerId,
    Path(application_id): Path<String>,
) -> Response
where
    A: ApplicationRepository + 'static,
    I: InterviewRepository + 'static,
{
    let id = ApplicationId(application_id);
    match service.delete_application(&owner, &id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_status_handler<A, I>(
    State(service): State<SharedService<A, I>>,
    owner: OwnerId,
    Path(application_id): Path<String>,
    Json(request): Json<StatusRequest>,
) -> Response
where
    A: ApplicationRepository + 'static,
    I: InterviewRepository + 'static,
{
    let status = match request.status.parse::<ApplicationStatus>() {
        Ok(status) => status,
        Err(err) => return error_response(ValidationError::from(err).into()),
    };

    let id = ApplicationId(application_id);
    respond(service.update_status(&owner, &id, status), StatusCode::OK)
}

pub(crate) async fn update_date_handler<A, I>(
    State(service): State<SharedService<A, I>>,
    owner: OwnerId,
    Path(application_id): Path<String>,
    Json(request): Json<DateRequest>,
) -> Response
where
    A: ApplicationRepository + 'static,
    I: InterviewRepository + 'static,
{
    let raw = request.value.trim();
    if raw.is_empty() {
        return error_response(ValidationError::MissingField(request.field.label()).into());
    }
    let value = match service.parse_timestamp(request.field.label(), raw) {
        Ok(value) => value,
        Err(err) => return error_response(err.into()),
    };

    let id = ApplicationId(application_id);
    respond(
        service.update_date(&owner, &id, request.field, value),
        StatusCode::OK,
    )
}

pub(crate) async fn schedule_interview_handler<A, I>(
    State(service): State<SharedService<A, I>>,
    owner: OwnerId,
    Path(application_id): Path<String>,
    Json(request): Json<ScheduleRequest>,
) -> Response
where
    A: ApplicationRepository + 'static,
    I: InterviewRepository + 'static,
{
    let scheduled_at = match service.parse_timestamp("scheduled_at", &request.scheduled_at) {
        Ok(value) => value,
        Err(err) => return error_response(err.into()),
    };

    let interviewers = match request.interviewers {
        Some(InterviewerInput::Names(names)) => names,
        Some(InterviewerInput::Text(text)) => split_interviewers(&text),
        None => Vec::new(),
    };

    let draft = InterviewDraft {
        scheduled_at,
        location: request.location,
        interviewers,
        notes: request.notes,
    };

    let id = ApplicationId(application_id);
    respond(
        service.schedule_interview(&owner, &id, draft),
        StatusCode::CREATED,
    )
}

pub(crate) async fn list_interviews_handler<A, I>(
    State(service): State<SharedService<A, I>>,
    owner: OwnerId,
) -> Response
where
    A: ApplicationRepository + 'static,
    I: InterviewRepository + 'static,
{
    respond(service.list_interviews(&owner), StatusCode::OK)
}

pub(crate) async fn reschedule_interview_handler<A, I>(
    State(service): State<SharedService<A, I>>,
    owner: OwnerId,
    Path(interview_id): Path<String>,
    Json(request): Json<RescheduleRequest>,
) -> Response
where
    A: ApplicationRepository + 'static,
    I: InterviewRepository + 'static,
{
    let scheduled_at = match service.parse_timestamp("scheduled_at", &request.scheduled_at) {
        Ok(value) => value,
        Err(err) => return error_response(err.into()),
    };

    let id = InterviewId(interview_id);
    respond(
        service.reschedule_interview(&owner, &id, scheduled_at),
        StatusCode::OK,
    )
}

pub(crate) async fn interview_notes_handler<A, I>(
    State(service): State<SharedService<A, I>>,
    owner: OwnerId,
    Path(interview_id): Path<String>,
    Json(request): Json<NotesRequest>,
) -> Response
where
    A: ApplicationRepository + 'static,
    I: InterviewRepository + 'static,
{
    let id = InterviewId(interview_id);
    respond(
        service.update_interview_notes(&owner, &id, request.notes),
        StatusCode::OK,
    )
}

pub(crate) async fn cancel_interview_handler<A, I>(
    State(service): State<SharedService<A, I>>,
    owner: OwnerId,
    Path(interview_id): Path<String>,
) -> Response
where
    A: ApplicationRepository + 'static,
    I: InterviewRepository + 'static,
{
    let id = InterviewId(interview_id);
    match service.cancel_interview(&owner, &id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn dashboard_handler<A, I>(
    State(service): State<SharedService<A, I>>,
    owner: OwnerId,
) -> Response
where
    A: ApplicationRepository + 'static,
    I: InterviewRepository + 'static,
{
    respond(service.dashboard(&owner), StatusCode::OK)
}

/// HTTP status for a service failure.
pub fn status_for(error: &TrackerServiceError) -> StatusCode {
    match error {
        TrackerServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        TrackerServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        TrackerServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        TrackerServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn respond<T: Serialize>(result: Result<T, TrackerServiceError>, success: StatusCode) -> Response {
    match result {
        Ok(body) => (success, Json(body)).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(error: TrackerServiceError) -> Response {
    let payload = json!({
        "error": error.to_string(),
    });
    (status_for(&error), Json(payload)).into_response()
}
