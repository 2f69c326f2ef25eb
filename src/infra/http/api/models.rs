use serde::{Deserialize, Serialize};

use crate::application::customers::NewCustomer;
use crate::application::phones::PhoneInput;

/// `page` and `limit` query parameters. Missing values take the configured
/// defaults.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ClientCreateRequest {
    pub name: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerCreateRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<CustomerCreateRequest> for NewCustomer {
    fn from(request: CustomerCreateRequest) -> Self {
        Self {
            email: request.email,
            first_name: request.first_name,
            last_name: request.last_name,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneRequest {
    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default)]
    pub screen_size: Option<String>,
}

impl From<PhoneRequest> for PhoneInput {
    fn from(request: PhoneRequest) -> Self {
        Self {
            name: request.name,
            brand: request.brand,
            os: request.os,
            screen_size: request.screen_size,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub storage: &'static str,
}
