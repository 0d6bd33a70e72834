//! REST API handlers

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use gpuslot_core::{
    AvailabilityReport, CreateReservation, Reservation, ReservationQuery, ResourceId,
    ResourceStatus, SlotError,
};
use gpuslot_scheduler::Scheduler;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// Application state shared across handlers
pub struct AppState {
    pub scheduler: Arc<Scheduler>,
}

/// Create the API router with routes relative to the mount point
pub fn create_router(scheduler: Arc<Scheduler>) -> Router {
    let state = Arc::new(AppState { scheduler });

    Router::new()
        .route("/health", get(health))
        .route("/gpus", get(list_gpus))
        .route("/gpus/:id", get(get_gpu))
        .route("/gpus/:id/reservations", get(list_gpu_reservations))
        .route(
            "/reservations",
            get(list_reservations).post(create_reservation),
        )
        .route(
            "/reservations/:id",
            get(get_reservation).delete(cancel_reservation),
        )
        .route("/availability", get(availability))
        .with_state(state)
}

/// Error body returned for every failed request
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub kind: String,
    pub message: String,
}

/// Scheduler error mapped onto an HTTP status
#[derive(Debug)]
pub struct ApiError(pub SlotError);

impl From<SlotError> for ApiError {
    fn from(err: SlotError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            SlotError::Validation(_) => StatusCode::BAD_REQUEST,
            SlotError::ResourceNotFound(_)
            | SlotError::ReservationNotFound(_)
            | SlotError::NotFound(_) => StatusCode::NOT_FOUND,
            SlotError::Conflict { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self.0, "Request failed");
        }

        let body = ErrorResponse {
            kind: self.0.kind().to_string(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(SlotError::Validation(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError(SlotError::Validation(rejection.body_text()))
    }
}

// A path id that does not parse names nothing that could exist
impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            PathRejection::FailedToDeserializePathParams(e) => {
                ApiError(SlotError::NotFound(e.body_text()))
            }
            other => ApiError(SlotError::Internal(other.body_text())),
        }
    }
}

/// `Json` body extractor that rejects with an `ErrorResponse`
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Query` extractor that rejects with an `ErrorResponse`
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// `Path` extractor that rejects with an `ErrorResponse`
#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Liveness response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub resources: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        resources: state.scheduler.registry().len(),
    })
}

/// List every GPU with its current occupancy
async fn list_gpus(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<ResourceStatus>>> {
    Ok(Json(state.scheduler.list_resources().await?))
}

/// Get one GPU with its current occupancy
async fn get_gpu(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<ResourceId>,
) -> ApiResult<Json<ResourceStatus>> {
    Ok(Json(state.scheduler.get_resource(id).await?))
}

/// Time bounds accepted on listing and availability routes
#[derive(Debug, Default, Deserialize)]
pub struct WindowParams {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// List reservations of one GPU
async fn list_gpu_reservations(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<ResourceId>,
    ApiQuery(params): ApiQuery<WindowParams>,
) -> ApiResult<Json<Vec<Reservation>>> {
    let query = ReservationQuery {
        resource_id: Some(id),
        start: params.start,
        end: params.end,
    };
    Ok(Json(state.scheduler.list_reservations(&query).await?))
}

/// List reservations, optionally narrowed by GPU and time window
async fn list_reservations(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<ReservationQuery>,
) -> ApiResult<Json<Vec<Reservation>>> {
    Ok(Json(state.scheduler.list_reservations(&query).await?))
}

/// Get a single reservation
async fn get_reservation(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Reservation>> {
    Ok(Json(state.scheduler.get_reservation(id).await?))
}

/// Create a reservation
async fn create_reservation(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateReservation>,
) -> ApiResult<(StatusCode, Json<Reservation>)> {
    info!(
        resource_id = req.resource_id,
        requester = %req.requester,
        start = %req.start_time,
        end = %req.end_time,
        "Creating reservation"
    );

    let reservation = state.scheduler.create_reservation(req).await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

/// Cancel a reservation and return it
async fn cancel_reservation(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Reservation>> {
    info!(reservation_id = %id, "Cancelling reservation");
    Ok(Json(state.scheduler.cancel_reservation(id).await?))
}

/// Free/busy state of every GPU over a window
async fn availability(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<WindowParams>,
) -> ApiResult<Json<AvailabilityReport>> {
    let report = state
        .scheduler
        .query_availability(params.start.as_deref(), params.end.as_deref())
        .await?;
    Ok(Json(report))
}
