use axum::{extract::State, routing::get, routing::post, Json, Router};
use serde_json::{json, Value};
use std::sync::{Arc, RwLock};

/// Snapshot of the engine published to HTTP clients each frame.
#[derive(Debug, Clone, serde::Serialize, Default)]
pub struct TrackerStatus {
    pub calibrated: bool,
    pub calibrating: bool,
    pub active_point: Option<usize>,
    pub ear_baseline: Option<f64>,
    pub frames_processed: u64,
}

/// Commands from HTTP clients, consumed by the frame loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlRequest {
    StartCalibration,
    AbortCalibration,
    Resize { width: f64, height: f64 },
}

#[derive(Clone)]
struct ControlState {
    status: Arc<RwLock<TrackerStatus>>,
    request: Arc<RwLock<Option<ControlRequest>>>,
}

pub fn get_router(
    status: Arc<RwLock<TrackerStatus>>,
    request: Arc<RwLock<Option<ControlRequest>>>,
) -> Router {
    let state = ControlState { status, request };

    Router::new()
        .route("/status", get(status_handler))
        .route("/calibration/start", post(start_calibration_handler))
        .route("/calibration/abort", post(abort_calibration_handler))
        .route("/screen", post(screen_handler))
        .with_state(state)
}

async fn status_handler(State(state): State<ControlState>) -> Json<Value> {
    let status = state.status.read().unwrap().clone();
    Json(json!({
        "status": "ok",
        "tracker": status
    }))
}

async fn start_calibration_handler(State(state): State<ControlState>) -> Json<Value> {
    let status = state.status.read().unwrap().clone();
    if status.calibrating {
        return Json(json!({
            "status": "already_calibrating",
            "active_point": status.active_point
        }));
    }

    if let Ok(mut req) = state.request.write() {
        *req = Some(ControlRequest::StartCalibration);
    }
    Json(json!({ "status": "starting" }))
}

async fn abort_calibration_handler(State(state): State<ControlState>) -> Json<Value> {
    if let Ok(mut req) = state.request.write() {
        *req = Some(ControlRequest::AbortCalibration);
    }
    Json(json!({ "status": "aborting" }))
}

#[derive(Debug, serde::Deserialize)]
struct ScreenPayload {
    width: f64,
    height: f64,
}

async fn screen_handler(
    State(state): State<ControlState>,
    Json(payload): Json<ScreenPayload>,
) -> Json<Value> {
    if payload.width <= 0.0 || payload.height <= 0.0 {
        return Json(json!({
            "status": "invalid",
            "message": "width and height must be positive"
        }));
    }

    if let Ok(mut req) = state.request.write() {
        *req = Some(ControlRequest::Resize {
            width: payload.width,
            height: payload.height,
        });
    }
    Json(json!({
        "status": "ok",
        "width": payload.width,
        "height": payload.height
    }))
}
