pub mod api;
mod middleware;

pub use api::{ApiState, Repositories, build_api_router};
pub use middleware::RequestContext;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router, middleware as axum_middleware};
use sqlx::Error as SqlxError;

use crate::application::error::ErrorReport;

use api::models::HealthResponse;

/// Full application router: `/health` plus the authenticated `/api` routes.
pub fn build_router(state: ApiState) -> Router {
    let health = Router::new()
        .route("/health", get(health))
        .with_state(state.clone());

    health
        .merge(build_api_router(state))
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
}

async fn health(State(state): State<ApiState>) -> Response {
    match &state.db {
        Some(db) => db_health_response(db.health_check().await),
        None => Json(HealthResponse {
            status: "ok",
            storage: "memory",
        })
        .into_response(),
    }
}

fn db_health_response(result: Result<(), SqlxError>) -> Response {
    match result {
        Ok(()) => Json(HealthResponse {
            status: "ok",
            storage: "postgres",
        })
        .into_response(),
        Err(err) => {
            let mut response = (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable",
                    storage: "postgres",
                }),
            )
                .into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_probe_is_unavailable_with_report() {
        let response = db_health_response(Err(SqlxError::PoolTimedOut));
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(response.extensions().get::<ErrorReport>().is_some());
    }

    #[test]
    fn healthy_probe_is_ok() {
        let response = db_health_response(Ok(()));
        assert_eq!(response.status(), StatusCode::OK);
    }
}
