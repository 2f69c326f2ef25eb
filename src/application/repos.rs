//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::application::pagination::PageWindow;
use crate::domain::entities::{
    ClientDraft, ClientRecord, CustomerDraft, CustomerRecord, PhoneDraft, PhoneRecord,
};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[async_trait]
pub trait ClientsRepo: Send + Sync {
    async fn count_clients(&self) -> Result<u64, RepoError>;

    /// Clients ordered by id, restricted to `window`.
    async fn list_clients(&self, window: PageWindow) -> Result<Vec<ClientRecord>, RepoError>;

    async fn find_client(&self, id: i64) -> Result<Option<ClientRecord>, RepoError>;
}

#[async_trait]
pub trait ClientsWriteRepo: Send + Sync {
    async fn create_client(&self, draft: ClientDraft) -> Result<ClientRecord, RepoError>;

    /// Delete a client together with its customers.
    async fn delete_client(&self, id: i64) -> Result<(), RepoError>;
}

#[async_trait]
pub trait CustomersRepo: Send + Sync {
    async fn count_customers(&self) -> Result<u64, RepoError>;

    async fn list_customers(&self, window: PageWindow) -> Result<Vec<CustomerRecord>, RepoError>;

    async fn count_client_customers(&self, client_id: i64) -> Result<u64, RepoError>;

    async fn list_client_customers(
        &self,
        client_id: i64,
        window: PageWindow,
    ) -> Result<Vec<CustomerRecord>, RepoError>;

    async fn find_customer(&self, id: i64) -> Result<Option<CustomerRecord>, RepoError>;
}

#[async_trait]
pub trait CustomersWriteRepo: Send + Sync {
    async fn create_customer(
        &self,
        client_id: i64,
        draft: CustomerDraft,
        roles: Vec<String>,
    ) -> Result<CustomerRecord, RepoError>;

    async fn delete_customer(&self, id: i64) -> Result<(), RepoError>;
}

#[async_trait]
pub trait PhonesRepo: Send + Sync {
    async fn count_phones(&self) -> Result<u64, RepoError>;

    async fn list_phones(&self, window: PageWindow) -> Result<Vec<PhoneRecord>, RepoError>;

    async fn find_phone(&self, id: i64) -> Result<Option<PhoneRecord>, RepoError>;
}

#[async_trait]
pub trait PhonesWriteRepo: Send + Sync {
    async fn create_phone(&self, draft: PhoneDraft) -> Result<PhoneRecord, RepoError>;

    /// Replace every field of an existing phone.
    async fn update_phone(&self, id: i64, draft: PhoneDraft) -> Result<PhoneRecord, RepoError>;

    async fn delete_phone(&self, id: i64) -> Result<(), RepoError>;
}
