//! API token authentication and role checks.

use sha2::{Digest, Sha256};
use subtle::{Choice, ConstantTimeEq};
use thiserror::Error;

use crate::config::{AuthSettings, TokenSettings};
use crate::domain::roles::Role;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing api token")]
    Missing,
    #[error("invalid api token")]
    Invalid,
}

/// The principal lacks the role, or the client ownership, an action needs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("`{principal}` is not allowed to {action}")]
pub struct AuthorizationDenied {
    pub principal: String,
    pub action: String,
}

/// Authenticated caller of the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub name: String,
    pub role: Role,
    /// Client account a `Client` principal acts for.
    pub client_id: Option<i64>,
}

impl Principal {
    pub fn requires(&self, needed: Role) -> Result<(), AuthorizationDenied> {
        if self.role.grants(needed) {
            Ok(())
        } else {
            Err(self.denied(format!("act without {needed}")))
        }
    }

    /// Admins manage every client; client principals only their own.
    pub fn requires_client_access(&self, client_id: i64) -> Result<(), AuthorizationDenied> {
        match self.role {
            Role::Admin => Ok(()),
            Role::Client if self.client_id == Some(client_id) => Ok(()),
            _ => Err(self.denied(format!("manage customers of client {client_id}"))),
        }
    }

    fn denied(&self, action: String) -> AuthorizationDenied {
        AuthorizationDenied {
            principal: self.name.clone(),
            action,
        }
    }
}

struct KnownToken {
    digest: [u8; 32],
    principal: Principal,
}

/// Resolves bearer tokens against configured SHA-256 digests.
pub struct TokenAuthenticator {
    tokens: Vec<KnownToken>,
}

impl TokenAuthenticator {
    pub fn new(tokens: &[TokenSettings]) -> Self {
        let tokens = tokens
            .iter()
            .map(|token| KnownToken {
                digest: token.sha256,
                principal: Principal {
                    name: token.name.clone(),
                    role: token.role,
                    client_id: token.client_id,
                },
            })
            .collect();
        Self { tokens }
    }

    pub fn from_settings(settings: &AuthSettings) -> Self {
        Self::new(&settings.tokens)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Every configured digest is compared, in constant time, before the
    /// match is resolved.
    pub fn authenticate(&self, token: &str) -> Result<Principal, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::Missing);
        }

        let digest = hash_secret(token);
        let mut matched = None;
        for known in &self.tokens {
            let equal: Choice = known.digest[..].ct_eq(&digest[..]);
            if bool::from(equal) && matched.is_none() {
                matched = Some(&known.principal);
            }
        }

        matched.cloned().ok_or(AuthError::Invalid)
    }
}

pub fn hash_secret(secret: &str) -> [u8; 32] {
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&Sha256::digest(secret.as_bytes()));
    digest
}
