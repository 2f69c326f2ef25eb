//! Phone handlers

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::auth::Principal;

use super::{json_body, list_to_api, page_params, path_params, phone_to_api, require_reader};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

pub async fn list_phones(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    require_reader(&principal)?;
    let (page, limit) = page_params(query, &state.pagination)?;

    let result = state.phones.list(page, limit).await.map_err(list_to_api)?;

    Ok(Json(result))
}

pub async fn get_phone(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    require_reader(&principal)?;
    let id = path_params(id)?;

    let phone = state.phones.get(id).await.map_err(phone_to_api)?;

    Ok(Json(phone))
}

pub async fn create_phone(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    body: Result<Json<PhoneRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = json_body(body)?;

    let phone = state
        .phones
        .create(&principal, payload.into())
        .await
        .map_err(phone_to_api)?;

    Ok((StatusCode::CREATED, Json(phone)))
}

pub async fn update_phone(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<PhoneRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = path_params(id)?;
    let payload = json_body(body)?;

    let phone = state
        .phones
        .update(&principal, id, payload.into())
        .await
        .map_err(phone_to_api)?;

    Ok(Json(phone))
}

pub async fn delete_phone(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = path_params(id)?;

    state
        .phones
        .delete(&principal, id)
        .await
        .map_err(phone_to_api)?;

    Ok(StatusCode::NO_CONTENT)
}
