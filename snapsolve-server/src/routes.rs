//! HTTP route handlers for the solve API.

use axum::Router;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde::Serialize;
use tracing::{info, warn};

use snapsolve::error::SolveError;
use snapsolve::io::submit::{SubmitRequest, SubmitResponse};

use crate::state::AppState;

/// Build the API router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/submitImage", post(submit_image))
}

async fn health() -> &'static str {
    "ok"
}

/// POST /api/submitImage - solve one image.
async fn submit_image(
    State(state): State<AppState>,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let Json(request) =
        payload.map_err(|rejection| SolveError::InvalidInput(rejection.body_text()))?;
    let outcome = state.service.solve(&request.imageb64).await?;
    let response = SubmitResponse::from(&outcome);
    info!(
        steps = response.steps.len(),
        degraded = response.degraded,
        "submitImage answered"
    );
    Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    retryable: bool,
}

/// Solve failure rendered as a status code plus JSON body.
#[derive(Debug)]
pub struct ApiError(SolveError);

impl From<SolveError> for ApiError {
    fn from(err: SolveError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            SolveError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            SolveError::ModelRequest(_) | SolveError::ModelOutput(_) => StatusCode::BAD_GATEWAY,
            SolveError::ModelTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(status = status.as_u16(), error = %self.0, "submitImage failed");
        let body = ErrorBody {
            error: self.0.kind(),
            message: self.0.to_string(),
            retryable: self.0.is_retryable(),
        };
        (status, Json(body)).into_response()
    }
}
