//! Client accounts.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument};

use crate::application::auth::{AuthorizationDenied, Principal};
use crate::application::listing::{ListError, Listing};
use crate::application::pagination::PageResult;
use crate::application::repos::{ClientsRepo, ClientsWriteRepo, RepoError};
use crate::cache::{ReadThroughCache, Tag, TagInvalidator};
use crate::domain::entities::{ClientDraft, ClientRecord};
use crate::domain::error::DomainError;
use crate::domain::roles::Role;

pub const CLIENT_LIST_OPERATION: &str = "getClientList";

const CLIENT_LISTING: Listing<'static> = Listing {
    operation: CLIENT_LIST_OPERATION,
    tags: &[Tag::CLIENTS],
};

/// Client writes also drop customer listings: a delete cascades to the
/// client's customers, and customer pages are keyed under their client.
const CLIENT_WRITE_TAGS: &[Tag] = &[Tag::CLIENTS, Tag::CUSTOMERS, Tag::CLIENT_CUSTOMERS];

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Denied(#[from] AuthorizationDenied),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct ClientService {
    reader: Arc<dyn ClientsRepo>,
    writer: Arc<dyn ClientsWriteRepo>,
    cache: ReadThroughCache,
    invalidator: TagInvalidator,
}

impl ClientService {
    pub fn new(
        reader: Arc<dyn ClientsRepo>,
        writer: Arc<dyn ClientsWriteRepo>,
        cache: ReadThroughCache,
        invalidator: TagInvalidator,
    ) -> Self {
        Self {
            reader,
            writer,
            cache,
            invalidator,
        }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, page: i64, limit: i64) -> Result<PageResult<ClientRecord>, ListError> {
        let reader = &self.reader;
        CLIENT_LISTING
            .page(
                &self.cache,
                page,
                limit,
                || async move { Ok::<_, ListError>(reader.count_clients().await?) },
                |window| async move { reader.list_clients(window).await },
            )
            .await
    }

    pub async fn get(&self, id: i64) -> Result<ClientRecord, ClientError> {
        self.reader
            .find_client(id)
            .await?
            .ok_or_else(|| DomainError::not_found("client").into())
    }

    #[instrument(skip(self, principal), fields(principal = %principal.name))]
    pub async fn create(&self, principal: &Principal, name: &str) -> Result<ClientRecord, ClientError> {
        principal.requires(Role::Admin)?;
        let draft = ClientDraft::new(name)?;

        let client = self.writer.create_client(draft).await?;
        self.invalidator.invalidate(CLIENT_WRITE_TAGS);
        info!(client_id = client.id, "Client created");
        Ok(client)
    }

    #[instrument(skip(self, principal), fields(principal = %principal.name))]
    pub async fn delete(&self, principal: &Principal, id: i64) -> Result<(), ClientError> {
        principal.requires(Role::Admin)?;

        self.writer.delete_client(id).await.map_err(not_found_as_domain)?;
        self.invalidator.invalidate(CLIENT_WRITE_TAGS);
        info!(client_id = id, "Client deleted");
        Ok(())
    }
}

fn not_found_as_domain(error: RepoError) -> ClientError {
    match error {
        RepoError::NotFound => DomainError::not_found("client").into(),
        other => other.into(),
    }
}
