use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request, header::AUTHORIZATION};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::application::auth::AuthError;

use super::error::ApiError;
use super::state::ApiState;

const API_KEY_HEADER: &str = "x-api-key";

pub async fn api_auth(
    State(state): State<ApiState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = extract_token(request.headers()) else {
        return ApiError::unauthorized().into_response();
    };

    let principal = match state.authenticator.authenticate(&token) {
        Ok(principal) => principal,
        Err(AuthError::Missing) => return ApiError::unauthorized().into_response(),
        Err(AuthError::Invalid) => return ApiError::invalid_token().into_response(),
    };

    request.extensions_mut().insert(principal.clone());
    let mut response = next.run(request).await;
    response.extensions_mut().insert(principal);
    response
}

fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| raw.strip_prefix("Bearer "));
    let api_key = || {
        headers
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
    };

    bearer
        .or_else(api_key)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}
