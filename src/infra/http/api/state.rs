use std::sync::Arc;

use crate::application::auth::TokenAuthenticator;
use crate::application::clients::ClientService;
use crate::application::customers::CustomerService;
use crate::application::phones::PhoneService;
use crate::application::repos::{
    ClientsRepo, ClientsWriteRepo, CustomersRepo, CustomersWriteRepo, PhonesRepo, PhonesWriteRepo,
};
use crate::cache::{ReadThroughCache, TagInvalidator};
use crate::config::PaginationSettings;
use crate::infra::db::PostgresRepositories;

/// Repository handles the services are built from.
#[derive(Clone)]
pub struct Repositories {
    pub clients: Arc<dyn ClientsRepo>,
    pub clients_write: Arc<dyn ClientsWriteRepo>,
    pub customers: Arc<dyn CustomersRepo>,
    pub customers_write: Arc<dyn CustomersWriteRepo>,
    pub phones: Arc<dyn PhonesRepo>,
    pub phones_write: Arc<dyn PhonesWriteRepo>,
}

impl Repositories {
    /// Use one backend for every repository role.
    pub fn shared<R>(backend: Arc<R>) -> Self
    where
        R: ClientsRepo
            + ClientsWriteRepo
            + CustomersRepo
            + CustomersWriteRepo
            + PhonesRepo
            + PhonesWriteRepo
            + 'static,
    {
        Self {
            clients: backend.clone(),
            clients_write: backend.clone(),
            customers: backend.clone(),
            customers_write: backend.clone(),
            phones: backend.clone(),
            phones_write: backend,
        }
    }
}

#[derive(Clone)]
pub struct ApiState {
    pub clients: Arc<ClientService>,
    pub customers: Arc<CustomerService>,
    pub phones: Arc<PhoneService>,
    pub authenticator: Arc<TokenAuthenticator>,
    pub pagination: PaginationSettings,
    /// Present when running on Postgres; probed by `/health`.
    pub db: Option<Arc<PostgresRepositories>>,
}

impl ApiState {
    pub fn new(
        repos: Repositories,
        cache: ReadThroughCache,
        invalidator: TagInvalidator,
        authenticator: TokenAuthenticator,
        pagination: PaginationSettings,
        db: Option<Arc<PostgresRepositories>>,
    ) -> Self {
        let clients = ClientService::new(
            repos.clients.clone(),
            repos.clients_write,
            cache.clone(),
            invalidator.clone(),
        );
        let customers = CustomerService::new(
            repos.clients,
            repos.customers,
            repos.customers_write,
            cache.clone(),
            invalidator.clone(),
        );
        let phones = PhoneService::new(repos.phones, repos.phones_write, cache, invalidator);

        Self {
            clients: Arc::new(clients),
            customers: Arc::new(customers),
            phones: Arc::new(phones),
            authenticator: Arc::new(authenticator),
            pagination,
            db,
        }
    }
}
