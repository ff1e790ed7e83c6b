use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use super::domain::{ApplicationId, ApplicationStatus, ApplicationView, UserIdentity};
use super::identity::{RecordKey, RecordRef};
use super::repository::AdmissionStore;
use super::service::{ApplicationServiceError, ApplicationUpsertService, SubmissionRejection};

/// Inbound submission payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitApplicationRequest {
    pub user: UserIdentity,
    pub offering: RecordRef,
    #[serde(default)]
    pub status: Option<ApplicationStatus>,
}

/// Reviewer decision payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub status: ApplicationStatus,
}

#[derive(Debug, Serialize)]
struct SubmissionResponse {
    created: bool,
    #[serde(flatten)]
    application: ApplicationView,
}

/// Router builder exposing the admission endpoints.
pub fn admission_router<S>(service: Arc<ApplicationUpsertService<S>>) -> Router
where
    S: AdmissionStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/admissions/applications",
            post(submit_handler::<S>),
        )
        .route(
            "/api/v1/admissions/applications/:application_id",
            get(application_handler::<S>),
        )
        .route(
            "/api/v1/admissions/applications/:application_id/review",
            post(review_handler::<S>),
        )
        .route("/api/v1/admissions/offerings", get(offerings_handler::<S>))
        .route(
            "/api/v1/admissions/offerings/:offering/capacity",
            get(capacity_handler::<S>),
        )
        .route(
            "/api/v1/admissions/profiles/resolve",
            post(profile_handler::<S>),
        )
        .with_state(service)
}

/// Run a store-bound service call off the async executor. Per-offering locks and store I/O
/// block, and the write completes even if the client goes away.
async fn run_blocking<S, T, F>(
    service: Arc<ApplicationUpsertService<S>>,
    call: F,
) -> Result<T, Response>
where
    S: AdmissionStore + 'static,
    T: Send + 'static,
    F: FnOnce(&ApplicationUpsertService<S>) -> Result<T, ApplicationServiceError>
        + Send
        + 'static,
{
    match tokio::task::spawn_blocking(move || call(&service)).await {
        Ok(result) => result.map_err(error_response),
        Err(join_error) => {
            error!(%join_error, "admission task failed");
            let payload = json!({ "error": "internal error" });
            Err((StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response())
        }
    }
}

pub(crate) async fn submit_handler<S>(
    State(service): State<Arc<ApplicationUpsertService<S>>>,
    Json(request): Json<SubmitApplicationRequest>,
) -> Response
where
    S: AdmissionStore + 'static,
{
    let SubmitApplicationRequest {
        user,
        offering,
        status,
    } = request;

    let outcome = run_blocking(service, move |service| {
        service.submit_for_user(&user, &offering, status)
    })
    .await;

    match outcome {
        Ok(outcome) => {
            let status = if outcome.created {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            let body = SubmissionResponse {
                created: outcome.created,
                application: outcome.application.view(),
            };
            (status, Json(body)).into_response()
        }
        Err(response) => response,
    }
}

pub(crate) async fn application_handler<S>(
    State(service): State<Arc<ApplicationUpsertService<S>>>,
    Path(application_id): Path<String>,
) -> Response
where
    S: AdmissionStore + 'static,
{
    let id = ApplicationId(application_id);
    match run_blocking(service, move |service| service.application(&id)).await {
        Ok(application) => (StatusCode::OK, Json(application.view())).into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn review_handler<S>(
    State(service): State<Arc<ApplicationUpsertService<S>>>,
    Path(application_id): Path<String>,
    Json(request): Json<ReviewRequest>,
) -> Response
where
    S: AdmissionStore + 'static,
{
    let id = ApplicationId(application_id);
    match run_blocking(service, move |service| service.review(&id, request.status)).await {
        Ok(application) => (StatusCode::OK, Json(application.view())).into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn offerings_handler<S>(
    State(service): State<Arc<ApplicationUpsertService<S>>>,
) -> Response
where
    S: AdmissionStore + 'static,
{
    match run_blocking(service, |service| service.open_offerings()).await {
        Ok(offerings) => (StatusCode::OK, Json(json!({ "offerings": offerings }))).into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn capacity_handler<S>(
    State(service): State<Arc<ApplicationUpsertService<S>>>,
    Path(offering): Path<String>,
) -> Response
where
    S: AdmissionStore + 'static,
{
    let key = match RecordKey::parse(&offering) {
        Ok(key) => key,
        Err(invalid) => return error_response(invalid.into()),
    };
    match run_blocking(service, move |service| service.availability(&key)).await {
        Ok(availability) => (StatusCode::OK, Json(availability)).into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn profile_handler<S>(
    State(service): State<Arc<ApplicationUpsertService<S>>>,
    Json(user): Json<UserIdentity>,
) -> Response
where
    S: AdmissionStore + 'static,
{
    match run_blocking(service, move |service| service.resolve_profile(&user)).await {
        Ok(resolved) => {
            let payload = json!({
                "profile": resolved.profile,
                "linkage": resolved.linkage,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(response) => response,
    }
}

fn error_response(error: ApplicationServiceError) -> Response {
    let (status, reason) = match &error {
        ApplicationServiceError::Rejected(rejection) => {
            let status = match rejection {
                SubmissionRejection::ProfileRequired | SubmissionRejection::OfferingNotFound => {
                    StatusCode::NOT_FOUND
                }
                SubmissionRejection::NotOpen | SubmissionRejection::CapacityExceeded => {
                    StatusCode::CONFLICT
                }
                SubmissionRejection::ReviewOnlyStatus(_)
                | SubmissionRejection::InvalidTransition(_) => StatusCode::UNPROCESSABLE_ENTITY,
            };
            (status, rejection.reason())
        }
        ApplicationServiceError::InvalidReference(_) => {
            (StatusCode::BAD_REQUEST, "invalid_reference")
        }
        ApplicationServiceError::ApplicationNotFound => {
            (StatusCode::NOT_FOUND, "application_not_found")
        }
        ApplicationServiceError::StoreUnavailable(_) => {
            (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable")
        }
    };

    let payload = json!({
        "error": error.to_string(),
        "reason": reason,
    });
    (status, Json(payload)).into_response()
}
