//! Customers belonging to client accounts.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument};

use crate::application::auth::{AuthorizationDenied, Principal};
use crate::application::listing::{ListError, Listing};
use crate::application::pagination::PageResult;
use crate::application::repos::{ClientsRepo, CustomersRepo, CustomersWriteRepo, RepoError};
use crate::cache::{ReadThroughCache, Tag, TagInvalidator, scoped_operation};
use crate::domain::entities::{CustomerDraft, CustomerRecord, DEFAULT_CUSTOMER_ROLE};
use crate::domain::error::DomainError;

pub const CUSTOMER_LIST_OPERATION: &str = "getCustomerList";
pub const CLIENT_CUSTOMER_LIST_OPERATION: &str = "getClientCustomersList";

const CUSTOMER_LISTING: Listing<'static> = Listing {
    operation: CUSTOMER_LIST_OPERATION,
    tags: &[Tag::CUSTOMERS],
};

const CLIENT_CUSTOMER_TAGS: &[Tag] = &[Tag::CLIENT_CUSTOMERS];
const CUSTOMER_WRITE_TAGS: &[Tag] = &[Tag::CUSTOMERS, Tag::CLIENT_CUSTOMERS];

#[derive(Debug, Error)]
pub enum CustomerError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Denied(#[from] AuthorizationDenied),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Input for a new customer, before validation.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Clone)]
pub struct CustomerService {
    clients: Arc<dyn ClientsRepo>,
    reader: Arc<dyn CustomersRepo>,
    writer: Arc<dyn CustomersWriteRepo>,
    cache: ReadThroughCache,
    invalidator: TagInvalidator,
}

impl CustomerService {
    pub fn new(
        clients: Arc<dyn ClientsRepo>,
        reader: Arc<dyn CustomersRepo>,
        writer: Arc<dyn CustomersWriteRepo>,
        cache: ReadThroughCache,
        invalidator: TagInvalidator,
    ) -> Self {
        Self {
            clients,
            reader,
            writer,
            cache,
            invalidator,
        }
    }

    /// Every customer across all clients.
    #[instrument(skip(self))]
    pub async fn list(&self, page: i64, limit: i64) -> Result<PageResult<CustomerRecord>, ListError> {
        let reader = &self.reader;
        CUSTOMER_LISTING
            .page(
                &self.cache,
                page,
                limit,
                || async move { Ok::<_, ListError>(reader.count_customers().await?) },
                |window| async move { reader.list_customers(window).await },
            )
            .await
    }

    /// Customers of one client. An unknown client is a `NotFound`, never
    /// cached.
    #[instrument(skip(self))]
    pub async fn list_for_client(
        &self,
        client_id: i64,
        page: i64,
        limit: i64,
    ) -> Result<PageResult<CustomerRecord>, ListError> {
        let operation = scoped_operation(CLIENT_CUSTOMER_LIST_OPERATION, client_id);
        let listing = Listing {
            operation: &operation,
            tags: CLIENT_CUSTOMER_TAGS,
        };
        let clients = &self.clients;
        let reader = &self.reader;
        listing
            .page(
                &self.cache,
                page,
                limit,
                || async move {
                    if clients.find_client(client_id).await?.is_none() {
                        return Err(DomainError::not_found("client").into());
                    }
                    Ok::<_, ListError>(reader.count_client_customers(client_id).await?)
                },
                |window| async move { reader.list_client_customers(client_id, window).await },
            )
            .await
    }

    pub async fn get(&self, id: i64) -> Result<CustomerRecord, CustomerError> {
        self.reader
            .find_customer(id)
            .await?
            .ok_or_else(|| DomainError::not_found("customer").into())
    }

    /// A customer that belongs to another client is reported as missing.
    pub async fn get_for_client(
        &self,
        client_id: i64,
        id: i64,
    ) -> Result<CustomerRecord, CustomerError> {
        let customer = self.get(id).await?;
        if customer.client_id != client_id {
            return Err(DomainError::not_found("customer").into());
        }
        Ok(customer)
    }

    #[instrument(skip(self, principal, input), fields(principal = %principal.name))]
    pub async fn create(
        &self,
        principal: &Principal,
        client_id: i64,
        input: NewCustomer,
    ) -> Result<CustomerRecord, CustomerError> {
        principal.requires_client_access(client_id)?;
        let draft = CustomerDraft::new(&input.email, &input.first_name, &input.last_name)?;

        if self.clients.find_client(client_id).await?.is_none() {
            return Err(DomainError::not_found("client").into());
        }

        let customer = self
            .writer
            .create_customer(client_id, draft, vec![DEFAULT_CUSTOMER_ROLE.to_string()])
            .await?;
        self.invalidator.invalidate(CUSTOMER_WRITE_TAGS);
        info!(client_id, customer_id = customer.id, "Customer created");
        Ok(customer)
    }

    #[instrument(skip(self, principal), fields(principal = %principal.name))]
    pub async fn delete(
        &self,
        principal: &Principal,
        client_id: i64,
        id: i64,
    ) -> Result<(), CustomerError> {
        principal.requires_client_access(client_id)?;
        self.get_for_client(client_id, id).await?;

        self.writer.delete_customer(id).await.map_err(|error| match error {
            RepoError::NotFound => DomainError::not_found("customer").into(),
            other => CustomerError::from(other),
        })?;
        self.invalidator.invalidate(CUSTOMER_WRITE_TAGS);
        info!(client_id, customer_id = id, "Customer deleted");
        Ok(())
    }
}
