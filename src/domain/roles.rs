//! Roles granted to API principals.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Access role. Roles are hierarchical: `Admin` implies `Client`, which
/// implies `User`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Client,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "ROLE_USER",
            Self::Client => "ROLE_CLIENT",
            Self::Admin => "ROLE_ADMIN",
        }
    }

    /// Whether a principal holding `self` may act where `needed` is required.
    pub fn grants(self, needed: Role) -> bool {
        self >= needed
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" | "role_user" => Ok(Self::User),
            "client" | "role_client" => Ok(Self::Client),
            "admin" | "role_admin" => Ok(Self::Admin),
            _ => Err(()),
        }
    }
}
