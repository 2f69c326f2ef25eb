//! API handlers organized by resource type.
//!
//! Helper functions for extraction and error conversion are defined here
//! and shared across modules.

mod clients;
mod customers;
mod phones;

pub use clients::*;
pub use customers::*;
pub use phones::*;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query};
use axum::http::StatusCode;

use crate::application::auth::{AuthorizationDenied, Principal};
use crate::application::clients::ClientError;
use crate::application::customers::CustomerError;
use crate::application::listing::ListError;
use crate::application::pagination::PaginationError;
use crate::application::phones::PhoneError;
use crate::application::repos::RepoError;
use crate::config::PaginationSettings;
use crate::domain::error::DomainError;
use crate::domain::roles::Role;

use super::error::{ApiError, codes};
use super::models::ListQuery;

/// Resolve `page`/`limit`, applying defaults. Non-numeric values are a 400.
pub(crate) fn page_params(
    query: Result<Query<ListQuery>, QueryRejection>,
    defaults: &PaginationSettings,
) -> Result<(i64, i64), ApiError> {
    let Query(query) = query.map_err(|rejection| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_PARAMETERS,
            "Invalid pagination parameters",
            Some("page and limit must be positive integers".to_string()),
        )
        .with_source(&rejection)
    })?;

    Ok((
        query.page.unwrap_or_else(|| i64::from(defaults.default_page.get())),
        query
            .limit
            .unwrap_or_else(|| i64::from(defaults.default_limit.get())),
    ))
}

pub(crate) fn path_params<T>(path: Result<Path<T>, PathRejection>) -> Result<T, ApiError> {
    path.map(|Path(value)| value).map_err(|rejection| {
        ApiError::bad_request("Invalid path parameter", Some(rejection.body_text()))
            .with_source(&rejection)
    })
}

pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        ApiError::bad_request("Malformed request body", Some(rejection.body_text()))
            .with_source(&rejection)
    })
}

/// Every read route needs at least `Role::User`.
pub(crate) fn require_reader(principal: &Principal) -> Result<(), ApiError> {
    principal.requires(Role::User).map_err(denied_to_api)
}

pub(crate) fn list_to_api(err: ListError) -> ApiError {
    match err {
        ListError::Pagination(PaginationError::InvalidParameters { page, limit }) => {
            ApiError::new(
                StatusCode::BAD_REQUEST,
                codes::INVALID_PARAMETERS,
                "Invalid pagination parameters",
                Some(format!(
                    "page and limit must be positive integers (got page={page}, limit={limit})"
                )),
            )
        }
        ListError::Pagination(PaginationError::PageNotFound { page, total_pages }) => {
            ApiError::new(
                StatusCode::NOT_FOUND,
                codes::PAGE_NOT_FOUND,
                "Page not found",
                Some(format!("page {page} is beyond the last page {total_pages}")),
            )
        }
        ListError::Domain(err) => domain_to_api(err),
        ListError::Repo(err) => repo_to_api(err),
        ListError::Serialization(ref source) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::CACHE,
            "Listing could not be served",
            None,
        )
        .with_source(source),
    }
}

pub(crate) fn domain_to_api(err: DomainError) -> ApiError {
    match err {
        DomainError::NotFound { entity } => ApiError::new(
            StatusCode::NOT_FOUND,
            codes::NOT_FOUND,
            "Resource not found",
            Some(format!("{entity} not found")),
        ),
        DomainError::Validation { field, message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Validation failed",
            Some(format!("{field}: {message}")),
        ),
    }
}

pub(crate) fn denied_to_api(err: AuthorizationDenied) -> ApiError {
    ApiError::forbidden(Some(err.to_string()))
}

pub(crate) fn client_to_api(err: ClientError) -> ApiError {
    match err {
        ClientError::Domain(err) => domain_to_api(err),
        ClientError::Denied(err) => denied_to_api(err),
        ClientError::Repo(err) => repo_to_api(err),
    }
}

pub(crate) fn customer_to_api(err: CustomerError) -> ApiError {
    match err {
        CustomerError::Domain(err) => domain_to_api(err),
        CustomerError::Denied(err) => denied_to_api(err),
        CustomerError::Repo(err) => repo_to_api(err),
    }
}

pub(crate) fn phone_to_api(err: PhoneError) -> ApiError {
    match err {
        PhoneError::Domain(err) => domain_to_api(err),
        PhoneError::Denied(err) => denied_to_api(err),
        PhoneError::Repo(err) => repo_to_api(err),
    }
}

pub(crate) fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::Duplicate { ref constraint } => ApiError::new(
            StatusCode::CONFLICT,
            codes::DUPLICATE,
            "Duplicate record",
            Some(constraint.clone()),
        ),
        RepoError::NotFound => ApiError::not_found("Resource not found"),
        RepoError::Integrity { ref message } => ApiError::new(
            StatusCode::CONFLICT,
            codes::INTEGRITY,
            "Integrity constraint violated",
            Some(message.clone()),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        RepoError::Persistence(_) => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_UNAVAILABLE,
            "Database unavailable",
            None,
        )
        .with_source(&err),
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use super::*;

    fn defaults() -> PaginationSettings {
        PaginationSettings {
            default_page: NonZeroU32::MIN,
            default_limit: NonZeroU32::new(3).unwrap(),
        }
    }

    #[test]
    fn missing_parameters_take_defaults() {
        let params = page_params(Ok(Query(ListQuery::default())), &defaults()).unwrap();
        assert_eq!(params, (1, 3));

        let query = ListQuery {
            page: Some(4),
            limit: None,
        };
        assert_eq!(page_params(Ok(Query(query)), &defaults()).unwrap(), (4, 3));
    }

    #[test]
    fn pagination_errors_map_to_status() {
        let invalid = list_to_api(ListError::Pagination(PaginationError::InvalidParameters {
            page: 0,
            limit: 3,
        }));
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
        assert_eq!(invalid.code(), codes::INVALID_PARAMETERS);

        let missing = list_to_api(ListError::Pagination(PaginationError::PageNotFound {
            page: 9,
            total_pages: 2,
        }));
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(missing.code(), codes::PAGE_NOT_FOUND);
    }

    #[test]
    fn repo_errors_map_to_status() {
        let duplicate = repo_to_api(RepoError::Duplicate {
            constraint: "customers_email_key".into(),
        });
        assert_eq!(duplicate.status(), StatusCode::CONFLICT);
        assert_eq!(
            repo_to_api(RepoError::Persistence("down".into())).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
