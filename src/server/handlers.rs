use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Response};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::app::{AppClosed, RequestId, StatusView, Submission};
use crate::location::LocationSource;

use super::state::AppState;
use super::static_files;

// ─── Error response ──────────────────────────────────────────────

/// JSON error body: `{"error": "...", "code": 404}`.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: u16,
}

pub struct ApiError(StatusCode, String);

impl ApiError {
    fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self(status, msg.into())
    }
}

/// The app loop is gone (shutdown in progress): 503.
impl From<AppClosed> for ApiError {
    fn from(e: AppClosed) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let ApiError(status, error) = self;
        (status, Json(ErrorBody { error, code: status.as_u16() })).into_response()
    }
}

// ─── Page ────────────────────────────────────────────────────────

pub async fn index() -> Html<&'static str> {
    Html(static_files::INDEX_HTML)
}

// ─── GET /api/status ─────────────────────────────────────────────

pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusView> {
    Json(state.app.status())
}

// ─── POST /api/locate/{source} ───────────────────────────────────

pub async fn locate(
    State(state): State<Arc<AppState>>,
    Path(source): Path<String>,
) -> Result<(StatusCode, Json<Submission>), ApiError> {
    let start = Instant::now();
    let source: LocationSource = source
        .parse()
        .map_err(|e: String| ApiError::new(StatusCode::BAD_REQUEST, e))?;

    let submission = state.app.locate(source).await?;
    info!(%source, ?submission, elapsed_ms = start.elapsed().as_secs_f64() * 1000.0, "POST /api/locate");

    let code = match submission {
        Submission::Dispatched(_) => StatusCode::ACCEPTED,
        Submission::Denied => StatusCode::FORBIDDEN,
    };
    Ok((code, Json(submission)))
}

// ─── DELETE /api/requests/{id} ───────────────────────────────────

pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    let id = RequestId(id);
    if state.app.cancel(id).await? {
        info!(%id, "DELETE /api/requests");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::new(StatusCode::NOT_FOUND, format!("No running request {}", id)))
    }
}
