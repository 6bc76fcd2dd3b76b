//! REST endpoints for the chat turn and the field catalog.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::error::DialogueError;

use super::controller::{DialogueController, TurnRequest};
use super::schema::FieldRegistry;

/// Shared state for chat routes.
#[derive(Clone)]
pub struct ChatRouteState {
    pub controller: Arc<DialogueController>,
    pub registry: Arc<FieldRegistry>,
}

/// POST /api/chats/turn
///
/// Runs one dialogue turn. Oracle faults map to 5xx/429 with a retryable
/// flag; oracle text is never echoed back.
async fn post_turn(
    State(state): State<ChatRouteState>,
    Json(request): Json<TurnRequest>,
) -> Response {
    match state.controller.handle_turn(&request).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => error_response(&e),
    }
}

/// GET /api/chats/fields
async fn get_fields(State(state): State<ChatRouteState>) -> impl IntoResponse {
    Json(state.registry.fields().to_vec())
}

fn error_response(err: &DialogueError) -> Response {
    let status = match err {
        DialogueError::OracleRateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        DialogueError::ValidationMalformed { .. } => StatusCode::BAD_GATEWAY,
        DialogueError::OracleUnavailable { .. } | DialogueError::OracleTimeout { .. } => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    };

    let body = serde_json::json!({
        "error": err.label(),
        "retryable": err.is_retryable(),
    });
    let mut response = (status, Json(body)).into_response();

    if let DialogueError::OracleRateLimited {
        retry_after: Some(after),
    } = err
    {
        let secs = after.as_secs().max(1);
        if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
    }
    response
}

/// Build the chat REST routes.
pub fn chat_routes(state: ChatRouteState) -> Router {
    Router::new()
        .route("/api/chats/turn", post(post_turn))
        .route("/api/chats/fields", get(get_fields))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn rate_limit_sets_retry_after() {
        let response = error_response(&DialogueError::OracleRateLimited {
            retry_after: Some(Duration::from_secs(12)),
        });
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "12");
    }

    #[test]
    fn rate_limit_without_hint_has_no_header() {
        let response = error_response(&DialogueError::OracleRateLimited { retry_after: None });
        assert!(response.headers().get(header::RETRY_AFTER).is_none());
    }

    #[test]
    fn status_per_fault() {
        let malformed = error_response(&DialogueError::ValidationMalformed {
            reason: "bad".into(),
            raw: "raw".into(),
        });
        assert_eq!(malformed.status(), StatusCode::BAD_GATEWAY);

        let timeout = error_response(&DialogueError::OracleTimeout {
            after: Duration::from_secs(30),
        });
        assert_eq!(timeout.status(), StatusCode::SERVICE_UNAVAILABLE);

        let unavailable = error_response(&DialogueError::OracleUnavailable {
            reason: "down".into(),
        });
        assert_eq!(unavailable.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
