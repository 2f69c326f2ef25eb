//! Customer handlers

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::auth::Principal;

use super::{customer_to_api, json_body, list_to_api, page_params, path_params, require_reader};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

pub async fn list_customers(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    require_reader(&principal)?;
    let (page, limit) = page_params(query, &state.pagination)?;

    let result = state
        .customers
        .list(page, limit)
        .await
        .map_err(list_to_api)?;

    Ok(Json(result))
}

pub async fn get_customer(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    require_reader(&principal)?;
    let id = path_params(id)?;

    let customer = state.customers.get(id).await.map_err(customer_to_api)?;

    Ok(Json(customer))
}

pub async fn list_client_customers(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    client_id: Result<Path<i64>, PathRejection>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    require_reader(&principal)?;
    let client_id = path_params(client_id)?;
    let (page, limit) = page_params(query, &state.pagination)?;

    let result = state
        .customers
        .list_for_client(client_id, page, limit)
        .await
        .map_err(list_to_api)?;

    Ok(Json(result))
}

pub async fn get_client_customer(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    ids: Result<Path<(i64, i64)>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    require_reader(&principal)?;
    let (client_id, customer_id) = path_params(ids)?;

    let customer = state
        .customers
        .get_for_client(client_id, customer_id)
        .await
        .map_err(customer_to_api)?;

    Ok(Json(customer))
}

pub async fn create_client_customer(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    client_id: Result<Path<i64>, PathRejection>,
    body: Result<Json<CustomerCreateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let client_id = path_params(client_id)?;
    let payload = json_body(body)?;

    let customer = state
        .customers
        .create(&principal, client_id, payload.into())
        .await
        .map_err(customer_to_api)?;

    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn delete_client_customer(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    ids: Result<Path<(i64, i64)>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let (client_id, customer_id) = path_params(ids)?;

    state
        .customers
        .delete(&principal, client_id, customer_id)
        .await
        .map_err(customer_to_api)?;

    Ok(StatusCode::NO_CONTENT)
}
