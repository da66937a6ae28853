//! HTTP surface for the rendering pipeline

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info};
use serde::Serialize;

use crate::spec::ChartRequest;
use crate::{pipeline, Error, RenderConfig};

/// Shared state: the render configuration applied to every request.
#[derive(Clone, Default)]
pub struct AppState {
    pub config: RenderConfig,
}

/// Build the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/render-chart", post(render_chart))
        .with_state(state)
}

#[derive(Serialize)]
struct RenderResponse {
    image_base64: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

async fn liveness() -> &'static str {
    "Chart service is running"
}

async fn render_chart(
    State(state): State<AppState>,
    body: Result<Json<ChartRequest>, JsonRejection>,
) -> Response {
    // A body that does not even deserialize is the same class of failure as
    // one that fails normalization, so it gets the same status and shape.
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            error!("malformed request body: {rejection}");
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid chart request: {rejection}"),
            );
        }
    };

    match pipeline::render_chart(&request, &state.config).await {
        Ok(rendered) => {
            info!("rendered chart ({} PNG bytes)", rendered.png.len());
            Json(RenderResponse {
                image_base64: rendered.image_base64,
            })
            .into_response()
        }
        Err(err) => {
            error!("render failed: {err}");
            error_response(status_for(&err), err.to_string())
        }
    }
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

fn status_for(err: &Error) -> StatusCode {
    if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}
