use axum::extract::{Path, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get};
use axum::{Json, Router};
use uuid::Uuid;

use crate::covers::{CoverError, CoverService};
use crate::proxy::error::ErrorResponse;
use crate::proxy::health::HealthStatus;

/// Header naming the candidate index that served a cover.
pub const CANDIDATE_HEADER: &str = "x-cover-candidate";

pub fn build_router(service: CoverService) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/cover/{book_id}", get(cover_handler))
        .route("/cover/{book_id}/hint", delete(clear_hint_handler))
        .with_state(service)
}

async fn health_handler(State(service): State<CoverService>) -> Json<HealthStatus> {
    Json(HealthStatus::collect(&service))
}

async fn cover_handler(
    State(service): State<CoverService>,
    Path(book_id): Path<String>,
) -> Response {
    let request_id = Uuid::new_v4().to_string();

    match service.get_cover(&book_id).await {
        Ok(image) => (
            StatusCode::OK,
            [
                (CONTENT_TYPE, image.content_type),
                (CACHE_CONTROL, "private, max-age=86400".to_string()),
            ],
            [(CANDIDATE_HEADER, image.candidate.to_string())],
            image.bytes,
        )
            .into_response(),
        Err(err) => {
            log_failure(&err, &book_id, &request_id);
            ErrorResponse::from_error(&err, &request_id)
        }
    }
}

async fn clear_hint_handler(
    State(service): State<CoverService>,
    Path(book_id): Path<String>,
) -> Response {
    match service.clear_hint(&book_id) {
        Ok(removed) => {
            tracing::debug!(book_id = %book_id, removed, "Cover hint cleared");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(err) => ErrorResponse::from_error(&err, &Uuid::new_v4().to_string()),
    }
}

fn log_failure(err: &CoverError, book_id: &str, request_id: &str) {
    match err {
        CoverError::NotFound { .. } | CoverError::InvalidRequest(_) => {
            tracing::debug!(book_id = %book_id, request_id = %request_id, error = %err, "Cover unavailable");
        }
        _ => {
            tracing::error!(book_id = %book_id, request_id = %request_id, error = %err, "Cover request failed");
        }
    }
}

