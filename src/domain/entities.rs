//! Domain entities mirrored from persistent storage.

use serde::{Deserialize, Serialize};

use super::error::DomainError;

const CLIENT_NAME_MAX: usize = 100;
const PERSON_NAME_MAX: usize = 100;
const EMAIL_MAX: usize = 180;
const PHONE_NAME_MAX: usize = 100;
const PHONE_BRAND_MAX: usize = 100;
const PHONE_OS_MAX: usize = 50;
const PHONE_SCREEN_SIZE_MAX: usize = 25;

/// Role granted to every customer created through the API.
pub const DEFAULT_CUSTOMER_ROLE: &str = "ROLE_USER";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRecord {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRecord {
    pub id: i64,
    pub client_id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneRecord {
    pub id: i64,
    pub name: String,
    pub brand: Option<String>,
    pub os: Option<String>,
    pub screen_size: Option<String>,
}

/// Validated input for a new client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientDraft {
    pub name: String,
}

impl ClientDraft {
    pub fn new(name: &str) -> Result<Self, DomainError> {
        Ok(Self {
            name: required(name, "name", CLIENT_NAME_MAX)?,
        })
    }
}

/// Validated input for a new customer attached to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerDraft {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl CustomerDraft {
    pub fn new(email: &str, first_name: &str, last_name: &str) -> Result<Self, DomainError> {
        let email = required(email, "email", EMAIL_MAX)?;
        let well_formed = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !well_formed || email.chars().any(char::is_whitespace) {
            return Err(DomainError::validation("email", "not a valid address"));
        }

        Ok(Self {
            email: email.to_lowercase(),
            first_name: required(first_name, "firstName", PERSON_NAME_MAX)?,
            last_name: required(last_name, "lastName", PERSON_NAME_MAX)?,
        })
    }
}

/// Validated input for creating or replacing a phone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneDraft {
    pub name: String,
    pub brand: Option<String>,
    pub os: Option<String>,
    pub screen_size: Option<String>,
}

impl PhoneDraft {
    pub fn new(
        name: &str,
        brand: Option<&str>,
        os: Option<&str>,
        screen_size: Option<&str>,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            name: required(name, "name", PHONE_NAME_MAX)?,
            brand: optional(brand, "brand", PHONE_BRAND_MAX)?,
            os: optional(os, "os", PHONE_OS_MAX)?,
            screen_size: optional(screen_size, "screenSize", PHONE_SCREEN_SIZE_MAX)?,
        })
    }
}

fn required(value: &str, field: &'static str, max: usize) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(field, "must not be blank"));
    }
    if trimmed.chars().count() > max {
        return Err(DomainError::validation(
            field,
            format!("must be at most {max} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

fn optional(
    value: Option<&str>,
    field: &'static str,
    max: usize,
) -> Result<Option<String>, DomainError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(trimmed) => required(trimmed, field, max).map(Some),
    }
}
