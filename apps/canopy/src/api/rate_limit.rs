//! Global request rate limit.

use super::error::ApiError;
use super::state::AppState;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

/// Reject the request with 429 once the shared quota is exhausted.
pub async fn limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if state.limiter.check().is_err() {
        tracing::debug!(path = %request.uri().path(), "rate limited");
        return ApiError::RateLimited.into_response();
    }
    next.run(request).await
}
