//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::domain::Point;
use crate::engine::PlanError;

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/stops/nearest", get(nearest_stop))
        .route("/journey/plan", post(plan_journey))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Errors surfaced to HTTP clients.
#[derive(Debug)]
enum AppError {
    BadRequest(String),
    Plan(PlanError),
}

impl From<PlanError> for AppError {
    fn from(err: PlanError) -> Self {
        AppError::Plan(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            AppError::Plan(err) => {
                let status = match err {
                    // Not built yet: the caller should retry, not give up.
                    PlanError::GraphNotBuilt => StatusCode::SERVICE_UNAVAILABLE,
                    PlanError::NoValidStopNear(_) | PlanError::NoPathFound { .. } => {
                        StatusCode::NOT_FOUND
                    }
                };
                (status, err.to_string())
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

fn parse_point(lat: f64, lon: f64) -> Result<Point, AppError> {
    Point::new(lat, lon).map_err(|err| AppError::BadRequest(err.to_string()))
}

/// Find the valid stop nearest to a coordinate.
async fn nearest_stop(
    State(state): State<AppState>,
    Query(query): Query<NearestStopQuery>,
) -> Result<Json<NearestStopResponse>, AppError> {
    let point = parse_point(query.lat, query.lon)?;
    let graph = state
        .engine
        .snapshot()
        .ok_or(AppError::Plan(PlanError::GraphNotBuilt))?;
    let (node, distance_m) = graph
        .nearest_stop(point)
        .ok_or(AppError::Plan(PlanError::NoValidStopNear(point)))?;

    Ok(Json(NearestStopResponse {
        stop_id: graph.stop(node).id.as_str().to_string(),
        distance_m,
    }))
}

/// Plan a journey between two coordinates.
async fn plan_journey(
    State(state): State<AppState>,
    Json(request): Json<PlanRequest>,
) -> Result<Json<ItineraryResponse>, AppError> {
    let origin = parse_point(request.origin.lat, request.origin.lon)?;
    let destination = parse_point(request.destination.lat, request.destination.lon)?;

    if let Some(mode) = request.mode {
        state.engine.set_mode(mode);
    }

    let itinerary = state.engine.plan(origin, destination)?;
    Ok(Json(ItineraryResponse::from(&itinerary)))
}
