//! Client handlers

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::auth::Principal;

use super::{client_to_api, json_body, list_to_api, page_params, path_params, require_reader};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

pub async fn list_clients(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    require_reader(&principal)?;
    let (page, limit) = page_params(query, &state.pagination)?;

    let result = state.clients.list(page, limit).await.map_err(list_to_api)?;

    Ok(Json(result))
}

pub async fn get_client(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    require_reader(&principal)?;
    let id = path_params(id)?;

    let client = state.clients.get(id).await.map_err(client_to_api)?;

    Ok(Json(client))
}

pub async fn create_client(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    body: Result<Json<ClientCreateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = json_body(body)?;

    let client = state
        .clients
        .create(&principal, &payload.name)
        .await
        .map_err(client_to_api)?;

    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn delete_client(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = path_params(id)?;

    state
        .clients
        .delete(&principal, id)
        .await
        .map_err(client_to_api)?;

    Ok(StatusCode::NO_CONTENT)
}
