//! HTTP surface for chat clients.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::info;

use crate::error::RelayError;
use crate::orchestrator::RunOrchestrator;
use crate::types::{ErrorResponse, TurnRequest};

const USER_ID_HEADER: &str = "x-user-id";

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

/// Routes:
/// - `POST /api/turn` and `POST /api/tool_call_handler`: run one turn
/// - `GET /api/health`
pub fn router(orchestrator: Arc<RunOrchestrator>) -> Router {
    Router::new()
        .route("/api/turn", post(turn))
        .route("/api/tool_call_handler", post(turn))
        .route("/api/health", get(health))
        .with_state(orchestrator)
}

async fn turn(
    State(orchestrator): State<Arc<RunOrchestrator>>,
    headers: HeaderMap,
    payload: Result<Json<TurnRequest>, JsonRejection>,
) -> Response {
    let mut request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return RelayError::Validation(format!("invalid request body: {}", rejection.body_text()))
                .into_response()
        }
    };

    if request.user_id.as_deref().map_or(true, |id| id.trim().is_empty()) {
        request.user_id = headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);
    }

    match orchestrator.handle_turn(&request).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome.to_response())).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Bind `bind_addr` and serve until Ctrl-C.
pub async fn serve(bind_addr: &str, orchestrator: Arc<RunOrchestrator>) -> Result<(), RelayError> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(addr = %listener.local_addr()?, "relay listening");
    axum::serve(listener, router(orchestrator))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
