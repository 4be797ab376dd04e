use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use fleetsim_core::{
    api::{AdvanceRequest, AdvanceResponse, ErrorResponse, FleetEntry, MissionQuery, SetStatusRequest},
    model::{GpsPosition, Mission, NewMission},
    validation::ValidationError,
    AdvanceError,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::service::FleetService;

#[derive(Clone)]
pub struct AppState {
    svc: Arc<FleetService>,
}

pub fn router(svc: Arc<FleetService>) -> Router {
    let state = AppState { svc };
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/simulate-gps", post(simulate_gps))
        .route("/v1/missions", post(create_mission).get(list_missions))
        .route("/v1/missions/{id}", get(get_mission))
        .route("/v1/missions/{id}/status", post(set_status))
        .route("/v1/missions/{id}/position", get(current_position))
        .route("/v1/fleet", get(fleet))
        .route("/v1/demo/mission", post(demo_mission))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn simulate_gps(
    State(st): State<AppState>,
    payload: Result<Json<AdvanceRequest>, JsonRejection>,
) -> Result<Json<AdvanceResponse>, AppError> {
    let Json(req) = payload.map_err(|e| BadRequest(e.body_text()))?;
    let outcome = st.svc.simulate_gps(req.mission_id).await?;
    Ok(Json(outcome.into()))
}

async fn create_mission(
    State(st): State<AppState>,
    payload: Result<Json<NewMission>, JsonRejection>,
) -> Result<(StatusCode, Json<Mission>), AppError> {
    let Json(req) = payload.map_err(|e| BadRequest(e.body_text()))?;
    let mission = st.svc.create_mission(req).await?;
    Ok((StatusCode::CREATED, Json(mission)))
}

async fn list_missions(
    State(st): State<AppState>,
    query: Result<Query<MissionQuery>, QueryRejection>,
) -> Result<Json<Vec<Mission>>, AppError> {
    let Query(q) = query.map_err(|e| BadRequest(e.body_text()))?;
    Ok(Json(st.svc.list_missions(q.status).await?))
}

async fn get_mission(
    State(st): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Mission>, AppError> {
    let mission = st
        .svc
        .mission(&id)
        .await?
        .ok_or_else(|| NotFound(format!("mission '{id}' not found")))?;
    Ok(Json(mission))
}

async fn set_status(
    State(st): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<SetStatusRequest>, JsonRejection>,
) -> Result<Json<Mission>, AppError> {
    let Json(req) = payload.map_err(|e| BadRequest(e.body_text()))?;
    let mission = st
        .svc
        .set_status(&id, req.status)
        .await?
        .ok_or_else(|| NotFound(format!("mission '{id}' not found")))?;
    Ok(Json(mission))
}

async fn current_position(
    State(st): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GpsPosition>, AppError> {
    if st.svc.mission(&id).await?.is_none() {
        return Err(NotFound(format!("mission '{id}' not found")).into());
    }
    let position = st
        .svc
        .current_position(&id)
        .await?
        .ok_or_else(|| NotFound(format!("no position recorded for mission '{id}'")))?;
    Ok(Json(position))
}

async fn fleet(State(st): State<AppState>) -> Result<Json<Vec<FleetEntry>>, AppError> {
    Ok(Json(st.svc.fleet().await?))
}

async fn demo_mission(State(st): State<AppState>) -> Result<(StatusCode, Json<Mission>), AppError> {
    let mission = st.svc.demo_mission().await?;
    Ok((StatusCode::CREATED, Json(mission)))
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct NotFound(String);

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct BadRequest(String);

#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(value: E) -> Self {
        Self(value.into())
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        if let Some(e) = self.0.downcast_ref::<AdvanceError>() {
            return match e {
                AdvanceError::MissingInput => StatusCode::BAD_REQUEST,
                AdvanceError::NotFound(_) => StatusCode::NOT_FOUND,
                AdvanceError::InvalidState { .. } => StatusCode::CONFLICT,
                AdvanceError::StoreRead(_) | AdvanceError::StoreWrite(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
        }
        if self.0.is::<ValidationError>() || self.0.is::<BadRequest>() {
            return StatusCode::BAD_REQUEST;
        }
        if self.0.is::<NotFound>() {
            return StatusCode::NOT_FOUND;
        }
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %format!("{:#}", self.0), "request failed");
        } else {
            tracing::warn!(status = %status, error = %self.0, "request rejected");
        }
        let body = Json(ErrorResponse {
            error: self.0.to_string(),
        });
        (status, body).into_response()
    }
}
