use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::agents::{OutreachSender, PitchWriter, SourcingAgent};
use super::domain::{CandidateId, JobDraft, JobId, PitchRef, ReviewStatus};
use super::review::ReviewStep;
use super::service::{ErrorKind, RecruitingError, RecruitingService};
use super::stats::PipelineStats;

type SharedService<S, P, O> = Arc<RecruitingService<S, P, O>>;

/// Router builder exposing the reviewer workflow over HTTP.
pub fn recruiting_router<S, P, O>(service: SharedService<S, P, O>) -> Router
where
    S: SourcingAgent + 'static,
    P: PitchWriter + 'static,
    O: OutreachSender + 'static,
{
    Router::new()
        .route(
            "/api/v1/jobs",
            post(create_job_handler::<S, P, O>).get(list_jobs_handler::<S, P, O>),
        )
        .route("/api/v1/jobs/:job_id", get(get_job_handler::<S, P, O>))
        .route(
            "/api/v1/jobs/:job_id/advance",
            post(advance_handler::<S, P, O>),
        )
        .route(
            "/api/v1/jobs/:job_id/session",
            get(session_handler::<S, P, O>),
        )
        .route(
            "/api/v1/jobs/:job_id/candidates",
            get(candidates_handler::<S, P, O>),
        )
        .route(
            "/api/v1/jobs/:job_id/candidates/:candidate_id/accept",
            post(accept_handler::<S, P, O>),
        )
        .route(
            "/api/v1/jobs/:job_id/candidates/:candidate_id/reject",
            post(reject_handler::<S, P, O>),
        )
        .route(
            "/api/v1/jobs/:job_id/candidates/:candidate_id/pitch",
            put(edit_pitch_handler::<S, P, O>)
                .get(pitch_handler::<S, P, O>)
                .delete(dismiss_pitch_handler::<S, P, O>),
        )
        .route(
            "/api/v1/jobs/:job_id/candidates/:candidate_id/pitch/send",
            post(send_pitch_handler::<S, P, O>),
        )
        .route(
            "/api/v1/jobs/:job_id/source-more",
            post(source_more_handler::<S, P, O>),
        )
        .route(
            "/api/v1/jobs/:job_id/sourcing",
            get(sourcing_status_handler::<S, P, O>),
        )
        .route("/api/v1/jobs/:job_id/stats", get(stats_handler::<S, P, O>))
        .with_state(service)
}

/// HTTP status used for each class of recruiting failure.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::InvalidTransition | ErrorKind::AlreadyInProgress => StatusCode::CONFLICT,
        ErrorKind::Agent => StatusCode::BAD_GATEWAY,
    }
}

pub(crate) fn error_response(error: RecruitingError) -> Response {
    let payload = json!({
        "error": error.to_string(),
    });
    (status_for(error.kind()), axum::Json(payload)).into_response()
}

fn step_payload(step: ReviewStep, stats: PipelineStats) -> Value {
    match step {
        ReviewStep::Ready(view) => json!({
            "status": "ready",
            "candidate": view.candidate,
            "match": view.assessment,
            "stats": stats,
        }),
        ReviewStep::Empty => json!({
            "status": "empty",
            "stats": stats,
        }),
    }
}

fn ok_json<T: serde::Serialize>(value: T) -> Response {
    (StatusCode::OK, axum::Json(value)).into_response()
}

pub(crate) async fn create_job_handler<S, P, O>(
    State(service): State<SharedService<S, P, O>>,
    axum::Json(draft): axum::Json<JobDraft>,
) -> Response
where
    S: SourcingAgent + 'static,
    P: PitchWriter + 'static,
    O: OutreachSender + 'static,
{
    let job = match service.open_job(draft) {
        Ok((job, _ticket)) => job,
        Err(error) => return error_response(error),
    };

    match service.sourcing_status(&job.id) {
        Ok(sourcing) => {
            let payload = json!({
                "job_id": job.id,
                "job": job.as_ref(),
                "sourcing": sourcing,
            });
            (StatusCode::CREATED, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_jobs_handler<S, P, O>(
    State(service): State<SharedService<S, P, O>>,
) -> Response
where
    S: SourcingAgent + 'static,
    P: PitchWriter + 'static,
    O: OutreachSender + 'static,
{
    let jobs: Vec<Value> = service
        .list_jobs()
        .into_iter()
        .map(|job| {
            let stats = service.stats(&job.id).unwrap_or_default();
            json!({ "job": job.as_ref(), "stats": stats })
        })
        .collect();
    ok_json(json!({ "jobs": jobs }))
}

pub(crate) async fn get_job_handler<S, P, O>(
    State(service): State<SharedService<S, P, O>>,
    Path(job_id): Path<String>,
) -> Response
where
    S: SourcingAgent + 'static,
    P: PitchWriter + 'static,
    O: OutreachSender + 'static,
{
    let job_id = JobId(job_id);
    let result = service.get_job(&job_id).and_then(|job| {
        let stats = service.stats(&job_id)?;
        let sourcing = service.sourcing_status(&job_id)?;
        Ok(json!({ "job": job.as_ref(), "stats": stats, "sourcing": sourcing }))
    });
    match result {
        Ok(payload) => ok_json(payload),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn advance_handler<S, P, O>(
    State(service): State<SharedService<S, P, O>>,
    Path(job_id): Path<String>,
) -> Response
where
    S: SourcingAgent + 'static,
    P: PitchWriter + 'static,
    O: OutreachSender + 'static,
{
    let job_id = JobId(job_id);
    let result = service.advance(&job_id).and_then(|step| {
        let stats = service.stats(&job_id)?;
        Ok(step_payload(step, stats))
    });
    match result {
        Ok(payload) => ok_json(payload),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn session_handler<S, P, O>(
    State(service): State<SharedService<S, P, O>>,
    Path(job_id): Path<String>,
) -> Response
where
    S: SourcingAgent + 'static,
    P: PitchWriter + 'static,
    O: OutreachSender + 'static,
{
    match service.snapshot(&JobId(job_id)) {
        Ok(snapshot) => ok_json(snapshot),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CandidateFilter {
    status: Option<String>,
}

pub(crate) async fn candidates_handler<S, P, O>(
    State(service): State<SharedService<S, P, O>>,
    Path(job_id): Path<String>,
    Query(filter): Query<CandidateFilter>,
) -> Response
where
    S: SourcingAgent + 'static,
    P: PitchWriter + 'static,
    O: OutreachSender + 'static,
{
    let raw = filter.status.unwrap_or_default();
    let Some(status) = ReviewStatus::parse(&raw) else {
        let payload = json!({
            "error": format!(
                "status must be one of pending, viewed, accepted, rejected, contacted (found '{raw}')"
            ),
        });
        return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
    };

    match service.list_by_status(&JobId(job_id), status) {
        Ok(candidates) => ok_json(json!({
            "status": status,
            "count": candidates.len(),
            "candidates": candidates,
        })),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn accept_handler<S, P, O>(
    State(service): State<SharedService<S, P, O>>,
    Path((job_id, candidate_id)): Path<(String, String)>,
) -> Response
where
    S: SourcingAgent + 'static,
    P: PitchWriter + 'static,
    O: OutreachSender + 'static,
{
    let job_id = JobId(job_id);
    match service.accept(&job_id, &CandidateId(candidate_id)).await {
        Ok(outcome) => {
            let stats = service.stats(&job_id).unwrap_or_default();
            ok_json(json!({
                "candidate": outcome.candidate,
                "pitch": outcome.pitch,
                "stats": stats,
            }))
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn reject_handler<S, P, O>(
    State(service): State<SharedService<S, P, O>>,
    Path((job_id, candidate_id)): Path<(String, String)>,
) -> Response
where
    S: SourcingAgent + 'static,
    P: PitchWriter + 'static,
    O: OutreachSender + 'static,
{
    let job_id = JobId(job_id);
    let result = service
        .reject(&job_id, &CandidateId(candidate_id))
        .and_then(|step| {
            let stats = service.stats(&job_id)?;
            Ok(step_payload(step, stats))
        });
    match result {
        Ok(payload) => ok_json(payload),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn pitch_handler<S, P, O>(
    State(service): State<SharedService<S, P, O>>,
    Path((job_id, candidate_id)): Path<(String, String)>,
) -> Response
where
    S: SourcingAgent + 'static,
    P: PitchWriter + 'static,
    O: OutreachSender + 'static,
{
    match service.pitch(&JobId(job_id), &CandidateId(candidate_id)) {
        Ok(view) => ok_json(view),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PitchEdit {
    subject: String,
    body: String,
}

pub(crate) async fn edit_pitch_handler<S, P, O>(
    State(service): State<SharedService<S, P, O>>,
    Path((job_id, candidate_id)): Path<(String, String)>,
    axum::Json(edit): axum::Json<PitchEdit>,
) -> Response
where
    S: SourcingAgent + 'static,
    P: PitchWriter + 'static,
    O: OutreachSender + 'static,
{
    match service.edit_pitch(
        &JobId(job_id),
        &CandidateId(candidate_id),
        edit.subject,
        edit.body,
    ) {
        Ok(view) => ok_json(view),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SendRequest {
    reference: PitchRef,
}

pub(crate) async fn send_pitch_handler<S, P, O>(
    State(service): State<SharedService<S, P, O>>,
    Path((job_id, candidate_id)): Path<(String, String)>,
    axum::Json(request): axum::Json<SendRequest>,
) -> Response
where
    S: SourcingAgent + 'static,
    P: PitchWriter + 'static,
    O: OutreachSender + 'static,
{
    let job_id = JobId(job_id);
    match service
        .send_pitch(&job_id, &CandidateId(candidate_id), &request.reference)
        .await
    {
        Ok(view) => {
            let stats = service.stats(&job_id).unwrap_or_default();
            ok_json(json!({ "pitch": view, "stats": stats }))
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn dismiss_pitch_handler<S, P, O>(
    State(service): State<SharedService<S, P, O>>,
    Path((job_id, candidate_id)): Path<(String, String)>,
) -> Response
where
    S: SourcingAgent + 'static,
    P: PitchWriter + 'static,
    O: OutreachSender + 'static,
{
    match service.dismiss_pitch(&JobId(job_id), &CandidateId(candidate_id)) {
        Ok(view) => ok_json(view),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn source_more_handler<S, P, O>(
    State(service): State<SharedService<S, P, O>>,
    Path(job_id): Path<String>,
) -> Response
where
    S: SourcingAgent + 'static,
    P: PitchWriter + 'static,
    O: OutreachSender + 'static,
{
    let job_id = JobId(job_id);
    match service.source_more(&job_id) {
        Ok(ticket) => {
            let payload = json!({
                "job_id": ticket.job_id,
                "batch_size": ticket.batch_size,
                "status": "in_progress",
            });
            (StatusCode::ACCEPTED, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn sourcing_status_handler<S, P, O>(
    State(service): State<SharedService<S, P, O>>,
    Path(job_id): Path<String>,
) -> Response
where
    S: SourcingAgent + 'static,
    P: PitchWriter + 'static,
    O: OutreachSender + 'static,
{
    match service.sourcing_status(&JobId(job_id)) {
        Ok(view) => ok_json(view),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn stats_handler<S, P, O>(
    State(service): State<SharedService<S, P, O>>,
    Path(job_id): Path<String>,
) -> Response
where
    S: SourcingAgent + 'static,
    P: PitchWriter + 'static,
    O: OutreachSender + 'static,
{
    match service.stats(&JobId(job_id)) {
        Ok(stats) => ok_json(stats),
        Err(error) => error_response(error),
    }
}
